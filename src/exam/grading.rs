use std::collections::HashSet;

use serde::Serialize;
use uuid::Uuid;

/// A question is scored iff the selected choices are exactly its correct choices.
///
/// No partial credit: one extra or one missing choice scores zero. A question without
/// correct choices is scored when nothing was selected for it.
pub fn is_get_score(selected: &HashSet<Uuid>, correct: &HashSet<Uuid>) -> bool {
    selected == correct
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChoiceKey {
    pub id: Uuid,
    pub is_correct: bool,
}

/// Answer key of one question.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuestionKey {
    pub question_id: Uuid,
    pub grade_point: i32,
    pub choices: Vec<ChoiceKey>,
}

impl QuestionKey {
    fn correct_ids(&self) -> HashSet<Uuid> {
        self.choices
            .iter()
            .filter(|c| c.is_correct)
            .map(|c| c.id)
            .collect()
    }

    /// The part of `selected` that belongs to this question.
    fn selected_ids(&self, selected: &HashSet<Uuid>) -> HashSet<Uuid> {
        self.choices
            .iter()
            .map(|c| c.id)
            .filter(|id| selected.contains(id))
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct QuestionGrade {
    pub question_id: Uuid,
    pub grade_point: i32,
    pub is_correct: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExamGrade {
    pub total_score: i64,
    pub total_points: i64,
    pub questions: Vec<QuestionGrade>,
}

impl ExamGrade {
    pub fn is_correct(&self, question_id: Uuid) -> Option<bool> {
        self.questions
            .iter()
            .find(|q| q.question_id == question_id)
            .map(|q| q.is_correct)
    }
}

/// Scores one submission against the answer keys of a course, in key order.
///
/// Selected ids that belong to no question are ignored.
pub fn grade_exam(questions: &[QuestionKey], selected: &HashSet<Uuid>) -> ExamGrade {
    let mut total_score = 0i64;
    let mut total_points = 0i64;
    let mut graded = Vec::with_capacity(questions.len());

    for question in questions {
        total_points += i64::from(question.grade_point);

        let is_correct = is_get_score(&question.selected_ids(selected), &question.correct_ids());
        if is_correct {
            total_score += i64::from(question.grade_point);
        }

        graded.push(QuestionGrade {
            question_id: question.question_id,
            grade_point: question.grade_point,
            is_correct,
        });
    }

    ExamGrade {
        total_score,
        total_points,
        questions: graded,
    }
}
