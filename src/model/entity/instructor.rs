use crate::impl_paginatable_for;
use crate::model::repo::ResourceTyped;
use crate::model::{ModelManager, error::DatabaseResult, repo::CrudRepository};
use crate::web::AuthenticatedUser;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use sqlx::prelude::FromRow;
use uuid::Uuid;

#[derive(Debug, Serialize, Deserialize, FromRow, utoipa::ToSchema)]
pub struct Instructor {
    id: Uuid,
    user_id: Uuid,
    full_time: bool,
    total_learners: i32,
}

#[derive(Debug, Deserialize, Serialize, utoipa::ToSchema)]
pub struct InstructorCreate {
    pub user_id: Uuid,
    pub full_time: Option<bool>,
    pub total_learners: Option<i32>,
}

impl ResourceTyped for Instructor {
    fn get_resource_type() -> crate::model::ResourceType {
        crate::model::ResourceType::Instructor
    }
}

impl Instructor {
    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn user_id(&self) -> Uuid {
        self.user_id
    }

    pub fn full_time(&self) -> bool {
        self.full_time
    }

    pub fn total_learners(&self) -> i32 {
        self.total_learners
    }
}

#[async_trait]
impl CrudRepository<Instructor, InstructorCreate, Uuid> for Instructor {
    async fn create(
        mm: &ModelManager,
        _actor: &AuthenticatedUser,
        data: InstructorCreate,
    ) -> DatabaseResult<Self> {
        let row = sqlx::query_as(
            r#"
            INSERT INTO instructors (id, user_id, full_time, total_learners)
            VALUES ($1,$2,$3,$4)
            RETURNING id, user_id, full_time, total_learners
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(data.user_id)
        .bind(data.full_time.unwrap_or(true))
        .bind(data.total_learners.unwrap_or(0))
        .fetch_one(mm.executor())
        .await?;

        Ok(row)
    }

    async fn update(
        mut self,
        mm: &ModelManager,
        _actor: &AuthenticatedUser,
        data: InstructorCreate,
    ) -> DatabaseResult<Self> {
        let full_time = data.full_time.unwrap_or(self.full_time);
        let total_learners = data.total_learners.unwrap_or(self.total_learners);

        sqlx::query(
            "UPDATE instructors SET user_id = $1, full_time = $2, total_learners = $3 WHERE id = $4",
        )
        .bind(data.user_id)
        .bind(full_time)
        .bind(total_learners)
        .bind(self.id)
        .execute(mm.executor())
        .await?;

        self.user_id = data.user_id;
        self.full_time = full_time;
        self.total_learners = total_learners;
        Ok(self)
    }

    async fn delete(self, mm: &ModelManager, _actor: &AuthenticatedUser) -> DatabaseResult<()> {
        sqlx::query("DELETE FROM instructors WHERE id = $1")
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
        let result = sqlx::query_as("SELECT * FROM instructors WHERE id = $1")
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
        let result = sqlx::query_as("SELECT * FROM instructors ORDER BY id LIMIT $1 OFFSET $2")
            .bind(limit)
            .bind(offset)
            .fetch_all(mm.executor())
            .await?;
        Ok(result)
    }

    async fn count(mm: &ModelManager, _actor: &AuthenticatedUser) -> DatabaseResult<i64> {
        let result: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM instructors")
            .fetch_one(mm.executor())
            .await?;

        Ok(result)
    }
}

impl_paginatable_for!(Instructor, InstructorCreate, Uuid);

/// Instructor joined with the user it extends, for course pages.
#[derive(Debug, Serialize, Deserialize, sqlx::FromRow, utoipa::ToSchema)]
pub struct InstructorProfileRow {
    pub id: Uuid,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub full_time: bool,
}

impl InstructorProfileRow {
    pub async fn all_by_course(
        mm: &ModelManager,
        _actor: &AuthenticatedUser,
        course_id: Uuid,
    ) -> DatabaseResult<Vec<Self>> {
        let rows = sqlx::query_as(
            r#"
            SELECT i.id, u.username, u.first_name, u.last_name, i.full_time
            FROM course_instructors ci
            JOIN instructors i ON i.id = ci.instructor_id
            JOIN users u ON u.id = i.user_id
            WHERE ci.course_id = $1
            ORDER BY u.last_name, u.first_name
            "#,
        )
        .bind(course_id)
        .fetch_all(mm.executor())
        .await?;

        Ok(rows)
    }
}
