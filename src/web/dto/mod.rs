pub mod admin;
pub mod courses;
pub mod exam;
