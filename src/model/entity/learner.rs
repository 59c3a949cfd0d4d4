use crate::impl_paginatable_for;
use crate::model::repo::ResourceTyped;
use crate::model::{ModelManager, error::DatabaseResult, repo::CrudRepository};
use crate::web::AuthenticatedUser;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use sqlx::prelude::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum Occupation {
    #[default]
    Student,
    Developer,
    DataScientist,
    Dba,
}

impl From<&str> for Occupation {
    fn from(value: &str) -> Self {
        match value {
            "developer" => Self::Developer,
            "data_scientist" => Self::DataScientist,
            "dba" => Self::Dba,
            _ => Self::Student,
        }
    }
}

impl std::fmt::Display for Occupation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Student => write!(f, "student"),
            Self::Developer => write!(f, "developer"),
            Self::DataScientist => write!(f, "data_scientist"),
            Self::Dba => write!(f, "dba"),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, FromRow, utoipa::ToSchema)]
pub struct Learner {
    id: Uuid,
    user_id: Uuid,
    occupation: String,
    social_link: String,
}

#[derive(Debug, Deserialize, Serialize, utoipa::ToSchema)]
pub struct LearnerCreate {
    pub user_id: Uuid,
    #[serde(default)]
    pub occupation: Occupation,
    #[serde(default)]
    pub social_link: String,
}

impl ResourceTyped for Learner {
    fn get_resource_type() -> crate::model::ResourceType {
        crate::model::ResourceType::Learner
    }
}

impl Learner {
    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn user_id(&self) -> Uuid {
        self.user_id
    }

    pub fn occupation(&self) -> Occupation {
        Occupation::from(self.occupation.as_str())
    }

    pub fn social_link(&self) -> &str {
        &self.social_link
    }
}

#[async_trait]
impl CrudRepository<Learner, LearnerCreate, Uuid> for Learner {
    async fn create(
        mm: &ModelManager,
        _actor: &AuthenticatedUser,
        data: LearnerCreate,
    ) -> DatabaseResult<Self> {
        let row = sqlx::query_as(
            r#"
            INSERT INTO learners (id, user_id, occupation, social_link)
            VALUES ($1,$2,$3,$4)
            RETURNING id, user_id, occupation, social_link
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(data.user_id)
        .bind(data.occupation.to_string())
        .bind(&data.social_link)
        .fetch_one(mm.executor())
        .await?;

        Ok(row)
    }

    async fn update(
        mut self,
        mm: &ModelManager,
        _actor: &AuthenticatedUser,
        data: LearnerCreate,
    ) -> DatabaseResult<Self> {
        let occupation = data.occupation.to_string();
        sqlx::query("UPDATE learners SET user_id = $1, occupation = $2, social_link = $3 WHERE id = $4")
            .bind(data.user_id)
            .bind(&occupation)
            .bind(&data.social_link)
            .bind(self.id)
            .execute(mm.executor())
            .await?;

        self.user_id = data.user_id;
        self.occupation = occupation;
        self.social_link = data.social_link;
        Ok(self)
    }

    async fn delete(self, mm: &ModelManager, _actor: &AuthenticatedUser) -> DatabaseResult<()> {
        sqlx::query("DELETE FROM learners WHERE id = $1")
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
        let result = sqlx::query_as("SELECT * FROM learners WHERE id = $1")
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
        let result = sqlx::query_as("SELECT * FROM learners ORDER BY id LIMIT $1 OFFSET $2")
            .bind(limit)
            .bind(offset)
            .fetch_all(mm.executor())
            .await?;
        Ok(result)
    }

    async fn count(mm: &ModelManager, _actor: &AuthenticatedUser) -> DatabaseResult<i64> {
        let result: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM learners")
            .fetch_one(mm.executor())
            .await?;

        Ok(result)
    }
}

impl_paginatable_for!(Learner, LearnerCreate, Uuid);
