use crate::impl_paginatable_for;
use crate::model::entity::{Choice, ChoiceDraft};
use crate::model::repo::ResourceTyped;
use crate::model::{ModelManager, error::DatabaseResult, repo::CrudRepository};
use crate::web::AuthenticatedUser;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use sqlx::prelude::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, utoipa::ToSchema)]
pub struct Question {
    id: Uuid,
    course_id: Uuid,
    question_text: String,
    grade_point: i32,
}

#[derive(Debug, Deserialize, Serialize, utoipa::ToSchema)]
pub struct QuestionCreate {
    pub course_id: Uuid,
    pub question_text: String,
    pub grade_point: Option<i32>,
}

impl ResourceTyped for Question {
    fn get_resource_type() -> crate::model::ResourceType {
        crate::model::ResourceType::Question
    }
}

impl Question {
    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn course_id(&self) -> Uuid {
        self.course_id
    }

    pub fn question_text(&self) -> &str {
        &self.question_text
    }

    pub fn grade_point(&self) -> i32 {
        self.grade_point
    }
}

#[async_trait]
impl CrudRepository<Question, QuestionCreate, Uuid> for Question {
    async fn create(
        mm: &ModelManager,
        _actor: &AuthenticatedUser,
        data: QuestionCreate,
    ) -> DatabaseResult<Self> {
        let row = sqlx::query_as(
            r#"
            INSERT INTO questions (id, course_id, question_text, grade_point)
            VALUES ($1,$2,$3,$4)
            RETURNING id, course_id, question_text, grade_point
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(data.course_id)
        .bind(&data.question_text)
        .bind(data.grade_point.unwrap_or(1))
        .fetch_one(mm.executor())
        .await?;

        Ok(row)
    }

    async fn update(
        mut self,
        mm: &ModelManager,
        _actor: &AuthenticatedUser,
        data: QuestionCreate,
    ) -> DatabaseResult<Self> {
        let grade_point = data.grade_point.unwrap_or(self.grade_point);
        sqlx::query(
            "UPDATE questions SET course_id = $1, question_text = $2, grade_point = $3 WHERE id = $4",
        )
        .bind(data.course_id)
        .bind(&data.question_text)
        .bind(grade_point)
        .bind(self.id)
        .execute(mm.executor())
        .await?;

        self.course_id = data.course_id;
        self.question_text = data.question_text;
        self.grade_point = grade_point;
        Ok(self)
    }

    async fn delete(self, mm: &ModelManager, _actor: &AuthenticatedUser) -> DatabaseResult<()> {
        sqlx::query("DELETE FROM questions WHERE id = $1")
            .bind(self.id)
            .execute(mm.executor())
            .await?;
        Ok(())
    }

    async fn find_by_id(
        mm: &ModelManager,
        _actor: &AuthenticatedUser,
        id: Uuid,
    ) -> DatabaseResult<Option<Self>> {
        let result = sqlx::query_as("SELECT * FROM questions WHERE id = $1")
            .bind(id)
            .fetch_optional(mm.executor())
            .await?;
        Ok(result)
    }

    async fn list(
        mm: &ModelManager,
        _actor: &AuthenticatedUser,
        limit: i64,
        offset: i64,
    ) -> DatabaseResult<Vec<Self>> {
        let result = sqlx::query_as("SELECT * FROM questions ORDER BY created_at, id LIMIT $1 OFFSET $2")
            .bind(limit)
            .bind(offset)
            .fetch_all(mm.executor())
            .await?;
        Ok(result)
    }

    async fn count(mm: &ModelManager, _actor: &AuthenticatedUser) -> DatabaseResult<i64> {
        let result: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM questions")
            .fetch_one(mm.executor())
            .await?;

        Ok(result)
    }
}

impl_paginatable_for!(Question, QuestionCreate, Uuid);

impl Question {
    pub async fn all_by_course(
        mm: &ModelManager,
        _actor: &AuthenticatedUser,
        course_id: Uuid,
    ) -> DatabaseResult<Vec<Self>> {
        let rows = sqlx::query_as("SELECT * FROM questions WHERE course_id = $1 ORDER BY created_at, id")
            .bind(course_id)
            .fetch_all(mm.executor())
            .await?;
        Ok(rows)
    }

    pub async fn find_by_text(
        mm: &ModelManager,
        _actor: &AuthenticatedUser,
        question_text: &str,
    ) -> DatabaseResult<Option<Self>> {
        let row = sqlx::query_as(
            "SELECT * FROM questions WHERE question_text = $1 ORDER BY created_at LIMIT 1",
        )
        .bind(question_text)
        .fetch_optional(mm.executor())
        .await?;
        Ok(row)
    }

    /// Inserts a question and its choices atomically.
    pub async fn create_with_choices(
        mm: &ModelManager,
        _actor: &AuthenticatedUser,
        data: QuestionCreate,
        choices: Vec<ChoiceDraft>,
    ) -> DatabaseResult<(Self, Vec<Choice>)> {
        let mut tx = mm.executor().begin().await?;

        let question: Self = sqlx::query_as(
            r#"
            INSERT INTO questions (id, course_id, question_text, grade_point)
            VALUES ($1,$2,$3,$4)
            RETURNING id, course_id, question_text, grade_point
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(data.course_id)
        .bind(&data.question_text)
        .bind(data.grade_point.unwrap_or(1))
        .fetch_one(&mut *tx)
        .await?;

        let mut created = Vec::with_capacity(choices.len());
        for draft in choices {
            let choice: Choice = sqlx::query_as(
                r#"
                INSERT INTO choices (id, question_id, choice_text, is_correct)
                VALUES ($1,$2,$3,$4)
                RETURNING id, question_id, choice_text, is_correct
                "#,
            )
            .bind(Uuid::new_v4())
            .bind(question.id)
            .bind(&draft.choice_text)
            .bind(draft.is_correct)
            .fetch_one(&mut *tx)
            .await?;
            created.push(choice);
        }

        tx.commit().await?;
        Ok((question, created))
    }
}
