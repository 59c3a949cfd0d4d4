use std::collections::{HashMap, HashSet};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::exam::{ChoiceKey, QuestionKey, grade_exam};
use crate::model::entity::{Choice, Course, Question, Submission};

#[derive(Debug, Serialize, Deserialize, utoipa::ToSchema)]
pub struct ChoiceResult {
    pub id: Uuid,
    pub choice_text: String,
    pub is_correct: bool,
    pub selected: bool,
}

#[derive(Debug, Serialize, Deserialize, utoipa::ToSchema)]
pub struct QuestionResult {
    pub id: Uuid,
    pub question_text: String,
    pub grade_point: i32,
    pub is_correct: bool,
    pub choices: Vec<ChoiceResult>,
}

#[derive(Debug, Serialize, Deserialize, utoipa::ToSchema)]
pub struct ExamResultResponse {
    pub course_id: Uuid,
    pub course_name: String,
    pub submission_id: Uuid,
    pub submitted_at: DateTime<Utc>,
    pub total_score: i64,
    pub total_points: i64,
    pub selected_choices: Vec<Uuid>,
    pub questions: Vec<QuestionResult>,
}

impl ExamResultResponse {
    /// Grades `submission` against the course's questions and lays out the breakdown.
    pub fn grade(
        course: &Course,
        submission: &Submission,
        questions: Vec<Question>,
        choices: Vec<Choice>,
        selected_choices: Vec<Uuid>,
    ) -> Self {
        let selected: HashSet<Uuid> = selected_choices.iter().copied().collect();

        let mut by_question: HashMap<Uuid, Vec<Choice>> = HashMap::new();
        for choice in choices {
            by_question.entry(choice.question_id()).or_default().push(choice);
        }

        let keys: Vec<QuestionKey> = questions
            .iter()
            .map(|q| QuestionKey {
                question_id: q.id(),
                grade_point: q.grade_point(),
                choices: by_question
                    .get(&q.id())
                    .map(|cs| {
                        cs.iter()
                            .map(|c| ChoiceKey {
                                id: c.id(),
                                is_correct: c.is_correct(),
                            })
                            .collect()
                    })
                    .unwrap_or_default(),
            })
            .collect();

        let grade = grade_exam(&keys, &selected);

        let questions = questions
            .into_iter()
            .zip(grade.questions.iter())
            .map(|(q, graded)| QuestionResult {
                id: q.id(),
                question_text: q.question_text().to_string(),
                grade_point: q.grade_point(),
                is_correct: graded.is_correct,
                choices: by_question
                    .remove(&q.id())
                    .unwrap_or_default()
                    .into_iter()
                    .map(|c| ChoiceResult {
                        id: c.id(),
                        choice_text: c.choice_text().to_string(),
                        is_correct: c.is_correct(),
                        selected: selected.contains(&c.id()),
                    })
                    .collect(),
            })
            .collect();

        Self {
            course_id: course.id(),
            course_name: course.name().to_string(),
            submission_id: submission.id(),
            submitted_at: submission.submitted_at(),
            total_score: grade.total_score,
            total_points: grade.total_points,
            selected_choices,
            questions,
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use serde_json::json;

    fn question(course_id: Uuid, text: &str, grade_point: i32) -> Question {
        serde_json::from_value(json!({
            "id": Uuid::new_v4(),
            "course_id": course_id,
            "question_text": text,
            "grade_point": grade_point,
        }))
        .unwrap()
    }

    fn choice(question: &Question, text: &str, is_correct: bool) -> Choice {
        serde_json::from_value(json!({
            "id": Uuid::new_v4(),
            "question_id": question.id(),
            "choice_text": text,
            "is_correct": is_correct,
        }))
        .unwrap()
    }

    #[test]
    fn breakdown_follows_question_order_and_marks_selection() {
        let course: Course = serde_json::from_value(json!({
            "id": Uuid::new_v4(),
            "name": "C1",
            "image": "",
            "description": "",
            "pub_date": null,
            "total_enrollment": 1,
        }))
        .unwrap();
        let submission: Submission = serde_json::from_value(json!({
            "id": Uuid::new_v4(),
            "enrollment_id": Uuid::new_v4(),
            "submitted_at": "2024-01-01T00:00:00Z",
        }))
        .unwrap();

        let q1 = question(course.id(), "Q1", 10);
        let q2 = question(course.id(), "Q2", 5);
        let a = choice(&q1, "A", true);
        let b = choice(&q1, "B", false);
        let c = choice(&q2, "C", true);
        let selected = vec![a.id(), c.id()];
        let (q1_id, q2_id, b_id) = (q1.id(), q2.id(), b.id());

        let result = ExamResultResponse::grade(
            &course,
            &submission,
            vec![q1, q2],
            vec![c, b, a],
            selected,
        );

        assert_eq!(result.total_score, 15);
        assert_eq!(result.total_points, 15);
        assert_eq!(result.questions[0].id, q1_id);
        assert_eq!(result.questions[1].id, q2_id);
        let b_result = result.questions[0]
            .choices
            .iter()
            .find(|c| c.id == b_id)
            .unwrap();
        assert!(!b_result.selected);
        assert!(!b_result.is_correct);
        assert_eq!(result.questions[1].choices.len(), 1);
    }
}
