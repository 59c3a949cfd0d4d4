use std::collections::HashMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::exam::ANSWER_FIELD_PREFIX;
use crate::model::entity::{
    Choice, Course, CourseWithEnrollmentRow, InstructorProfileRow, Lesson, Question,
};

#[derive(Debug, Serialize, Deserialize, utoipa::ToSchema)]
pub struct CourseListItem {
    pub id: Uuid,
    pub name: String,
    pub image: String,
    pub description: String,
    pub pub_date: Option<NaiveDate>,
    pub total_enrollment: i32,
    pub is_enrolled: bool,
}

impl From<CourseWithEnrollmentRow> for CourseListItem {
    fn from(row: CourseWithEnrollmentRow) -> Self {
        Self {
            id: row.id,
            name: row.name,
            image: row.image,
            description: row.description,
            pub_date: row.pub_date,
            total_enrollment: row.total_enrollment,
            is_enrolled: row.is_enrolled,
        }
    }
}

/// A choice as shown to a learner, without its correctness.
#[derive(Debug, Serialize, Deserialize, utoipa::ToSchema)]
pub struct ExamChoice {
    pub id: Uuid,
    pub choice_text: String,
}

#[derive(Debug, Serialize, Deserialize, utoipa::ToSchema)]
pub struct ExamQuestion {
    pub id: Uuid,
    pub question_text: String,
    pub grade_point: i32,
    /// Form key to post this question's choice ids under
    pub field_name: String,
    pub choices: Vec<ExamChoice>,
}

impl ExamQuestion {
    /// Attaches every choice to its question, keeping the order of both lists.
    pub fn from_entities(questions: Vec<Question>, choices: Vec<Choice>) -> Vec<Self> {
        let mut by_question: HashMap<Uuid, Vec<ExamChoice>> = HashMap::new();
        for choice in choices {
            by_question
                .entry(choice.question_id())
                .or_default()
                .push(ExamChoice {
                    id: choice.id(),
                    choice_text: choice.choice_text().to_string(),
                });
        }

        questions
            .into_iter()
            .map(|q| Self {
                id: q.id(),
                question_text: q.question_text().to_string(),
                grade_point: q.grade_point(),
                field_name: format!("{ANSWER_FIELD_PREFIX}{}", q.id()),
                choices: by_question.remove(&q.id()).unwrap_or_default(),
            })
            .collect()
    }
}

#[derive(Debug, Serialize, Deserialize, utoipa::ToSchema)]
pub struct CourseDetailResponse {
    pub course: Course,
    pub is_enrolled: bool,
    pub lessons: Vec<Lesson>,
    pub instructors: Vec<InstructorProfileRow>,
    pub questions: Vec<ExamQuestion>,
}
