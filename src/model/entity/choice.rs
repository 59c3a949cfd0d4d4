use crate::impl_paginatable_for;
use crate::model::repo::ResourceTyped;
use crate::model::{ModelManager, error::DatabaseResult, repo::CrudRepository};
use crate::web::AuthenticatedUser;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use sqlx::prelude::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, utoipa::ToSchema)]
pub struct Choice {
    id: Uuid,
    question_id: Uuid,
    choice_text: String,
    is_correct: bool,
}

#[derive(Debug, Deserialize, Serialize, utoipa::ToSchema)]
pub struct ChoiceCreate {
    pub question_id: Uuid,
    pub choice_text: String,
    pub is_correct: Option<bool>,
}

/// A choice authored inline, before its question exists.
#[derive(Debug, Clone, Deserialize, Serialize, utoipa::ToSchema)]
pub struct ChoiceDraft {
    pub choice_text: String,
    #[serde(default)]
    pub is_correct: bool,
}

impl ResourceTyped for Choice {
    fn get_resource_type() -> crate::model::ResourceType {
        crate::model::ResourceType::Choice
    }
}

impl Choice {
    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn question_id(&self) -> Uuid {
        self.question_id
    }

    pub fn choice_text(&self) -> &str {
        &self.choice_text
    }

    pub fn is_correct(&self) -> bool {
        self.is_correct
    }
}

#[async_trait]
impl CrudRepository<Choice, ChoiceCreate, Uuid> for Choice {
    async fn create(
        mm: &ModelManager,
        _actor: &AuthenticatedUser,
        data: ChoiceCreate,
    ) -> DatabaseResult<Self> {
        let row = sqlx::query_as(
            r#"
            INSERT INTO choices (id, question_id, choice_text, is_correct)
            VALUES ($1,$2,$3,$4)
            RETURNING id, question_id, choice_text, is_correct
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(data.question_id)
        .bind(&data.choice_text)
        .bind(data.is_correct.unwrap_or(false))
        .fetch_one(mm.executor())
        .await?;

        Ok(row)
    }

    async fn update(
        mut self,
        mm: &ModelManager,
        _actor: &AuthenticatedUser,
        data: ChoiceCreate,
    ) -> DatabaseResult<Self> {
        let is_correct = data.is_correct.unwrap_or(self.is_correct);
        sqlx::query(
            "UPDATE choices SET question_id = $1, choice_text = $2, is_correct = $3 WHERE id = $4",
        )
        .bind(data.question_id)
        .bind(&data.choice_text)
        .bind(is_correct)
        .bind(self.id)
        .execute(mm.executor())
        .await?;

        self.question_id = data.question_id;
        self.choice_text = data.choice_text;
        self.is_correct = is_correct;
        Ok(self)
    }

    async fn delete(self, mm: &ModelManager, _actor: &AuthenticatedUser) -> DatabaseResult<()> {
        sqlx::query("DELETE FROM choices WHERE id = $1")
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
        let result = sqlx::query_as("SELECT * FROM choices WHERE id = $1")
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
        let result = sqlx::query_as("SELECT * FROM choices ORDER BY question_id, created_at LIMIT $1 OFFSET $2")
            .bind(limit)
            .bind(offset)
            .fetch_all(mm.executor())
            .await?;
        Ok(result)
    }

    async fn count(mm: &ModelManager, _actor: &AuthenticatedUser) -> DatabaseResult<i64> {
        let result: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM choices")
            .fetch_one(mm.executor())
            .await?;

        Ok(result)
    }
}

impl_paginatable_for!(Choice, ChoiceCreate, Uuid);

impl Choice {
    /// Every choice of every question of `course_id`.
    pub async fn all_by_course(
        mm: &ModelManager,
        _actor: &AuthenticatedUser,
        course_id: Uuid,
    ) -> DatabaseResult<Vec<Self>> {
        let rows = sqlx::query_as(
            r#"
            SELECT c.id, c.question_id, c.choice_text, c.is_correct
            FROM choices c
            JOIN questions q ON q.id = c.question_id
            WHERE q.course_id = $1
            ORDER BY c.created_at, c.id
            "#,
        )
        .bind(course_id)
        .fetch_all(mm.executor())
        .await?;
        Ok(rows)
    }
}
