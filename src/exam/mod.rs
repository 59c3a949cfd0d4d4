//! Exam grading, free of any data access.
//!

mod answers;
pub use answers::{ANSWER_FIELD_PREFIX, selected_choice_ids};

mod grading;
pub use grading::{ChoiceKey, ExamGrade, QuestionGrade, QuestionKey, grade_exam, is_get_score};
