use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::model::entity::{
    Choice, ChoiceDraft, Course, CourseFilter, InstructorProfileRow, Lesson, Question,
};
use crate::web::routes::PaginationQuery;

#[derive(Debug, Clone, Deserialize, utoipa::IntoParams)]
#[into_params(parameter_in = Query)]
pub struct CourseListQuery {
    /// Matches name or description, case-insensitive
    pub search: Option<String>,
    pub pub_date_from: Option<NaiveDate>,
    pub pub_date_to: Option<NaiveDate>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

impl CourseListQuery {
    pub fn split(self) -> (CourseFilter, PaginationQuery) {
        let page = PaginationQuery::new(self.limit, self.offset);
        let filter = CourseFilter {
            search: self.search,
            pub_date_from: self.pub_date_from,
            pub_date_to: self.pub_date_to,
        };
        (filter, page)
    }
}

#[derive(Debug, Deserialize, utoipa::ToSchema)]
pub struct LessonInline {
    pub title: String,
    #[serde(default)]
    pub content: String,
    pub order_index: Option<i32>,
}

#[derive(Debug, Deserialize, utoipa::ToSchema)]
pub struct QuestionInline {
    pub question_text: String,
    pub grade_point: Option<i32>,
    #[serde(default)]
    pub choices: Vec<ChoiceDraft>,
}

#[derive(Debug, Serialize, Deserialize, utoipa::ToSchema)]
pub struct QuestionWithChoices {
    pub question: Question,
    pub choices: Vec<Choice>,
}

impl QuestionWithChoices {
    pub fn group(questions: Vec<Question>, choices: Vec<Choice>) -> Vec<Self> {
        let mut choices = choices;
        questions
            .into_iter()
            .map(|question| {
                let (own, rest): (Vec<Choice>, Vec<Choice>) = choices
                    .drain(..)
                    .partition(|c| c.question_id() == question.id());
                choices = rest;
                Self { question, choices: own }
            })
            .collect()
    }
}

#[derive(Debug, Serialize, Deserialize, utoipa::ToSchema)]
pub struct CourseAdminDetail {
    pub course: Course,
    pub lessons: Vec<Lesson>,
    pub instructors: Vec<InstructorProfileRow>,
    pub questions: Vec<QuestionWithChoices>,
}
