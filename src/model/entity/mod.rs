mod user;
pub use user::{UserEntity, UserEntityCreateUpdate};

mod instructor;
pub use instructor::{Instructor, InstructorCreate, InstructorProfileRow};

mod learner;
pub use learner::{Learner, LearnerCreate, Occupation};

mod course;
pub use course::{Course, CourseCreate, CourseFilter, CourseWithEnrollmentRow};

mod lesson;
pub use lesson::{Lesson, LessonCreate};

mod enrollment;
pub use enrollment::{Enrollment, EnrollmentCreate, EnrollmentMode};

mod question;
pub use question::{Question, QuestionCreate};

mod choice;
pub use choice::{Choice, ChoiceCreate, ChoiceDraft};

mod submission;
pub use submission::{Submission, SubmissionCreate};
