use crate::impl_paginatable_for;
use crate::model::access::HasOwner;
use crate::model::repo::ResourceTyped;
use crate::model::{ModelManager, error::DatabaseResult, repo::CrudRepository};
use crate::web::AuthenticatedUser;
use async_trait::async_trait;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use sqlx::prelude::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, utoipa::ToSchema)]
pub enum EnrollmentMode {
    #[default]
    #[serde(rename = "audit")]
    Audit,
    #[serde(rename = "honor")]
    Honor,
    #[serde(rename = "BETA")]
    Beta,
}

impl From<&str> for EnrollmentMode {
    fn from(value: &str) -> Self {
        match value {
            "honor" => Self::Honor,
            "BETA" => Self::Beta,
            _ => Self::Audit,
        }
    }
}

impl std::fmt::Display for EnrollmentMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Audit => write!(f, "audit"),
            Self::Honor => write!(f, "honor"),
            Self::Beta => write!(f, "BETA"),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, FromRow, utoipa::ToSchema)]
pub struct Enrollment {
    id: Uuid,
    user_id: Uuid,
    course_id: Uuid,
    date_enrolled: NaiveDate,
    mode: String,
    rating: f64,
}

/// `user_id` and `course_id` are only read on create; updates touch mode and rating.
#[derive(Debug, Deserialize, Serialize, utoipa::ToSchema)]
pub struct EnrollmentCreate {
    pub user_id: Uuid,
    pub course_id: Uuid,
    pub mode: Option<EnrollmentMode>,
    pub rating: Option<f64>,
}

impl ResourceTyped for Enrollment {
    fn get_resource_type() -> crate::model::ResourceType {
        crate::model::ResourceType::Enrollment
    }
}

impl Enrollment {
    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn user_id(&self) -> Uuid {
        self.user_id
    }

    pub fn course_id(&self) -> Uuid {
        self.course_id
    }

    pub fn date_enrolled(&self) -> NaiveDate {
        self.date_enrolled
    }

    pub fn mode(&self) -> EnrollmentMode {
        EnrollmentMode::from(self.mode.as_str())
    }

    pub fn rating(&self) -> f64 {
        self.rating
    }
}

#[async_trait]
impl CrudRepository<Enrollment, EnrollmentCreate, Uuid> for Enrollment {
    async fn create(
        mm: &ModelManager,
        actor: &AuthenticatedUser,
        data: EnrollmentCreate,
    ) -> DatabaseResult<Self> {
        let (enrollment, _) = Self::enroll(
            mm,
            actor,
            data.user_id,
            data.course_id,
            data.mode.unwrap_or_default(),
            data.rating,
        )
        .await?;
        Ok(enrollment)
    }

    async fn update(
        mut self,
        mm: &ModelManager,
        _actor: &AuthenticatedUser,
        data: EnrollmentCreate,
    ) -> DatabaseResult<Self> {
        let mode = data.mode.unwrap_or_else(|| self.mode()).to_string();
        let rating = data.rating.unwrap_or(self.rating);

        sqlx::query("UPDATE enrollments SET mode = $1, rating = $2 WHERE id = $3")
            .bind(&mode)
            .bind(rating)
            .bind(self.id)
            .execute(mm.executor())
            .await?;

        self.mode = mode;
        self.rating = rating;
        Ok(self)
    }

    async fn delete(self, mm: &ModelManager, _actor: &AuthenticatedUser) -> DatabaseResult<()> {
        let mut tx = mm.executor().begin().await?;

        let deleted = sqlx::query("DELETE FROM enrollments WHERE id = $1")
            .bind(self.id)
            .execute(&mut *tx)
            .await?
            .rows_affected();

        if deleted > 0 {
            sqlx::query(
                "UPDATE courses SET total_enrollment = GREATEST(total_enrollment - 1, 0) WHERE id = $1",
            )
            .bind(self.course_id)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(())
    }

    async fn find_by_id(
        mm: &ModelManager,
        _actor: &AuthenticatedUser,
        id: Uuid,
    ) -> DatabaseResult<Option<Self>> {
        let result = sqlx::query_as("SELECT * FROM enrollments WHERE id = $1")
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
        let result = sqlx::query_as(
            "SELECT * FROM enrollments ORDER BY date_enrolled DESC, id LIMIT $1 OFFSET $2",
        )
        .bind(limit)
        .bind(offset)
        .fetch_all(mm.executor())
        .await?;
        Ok(result)
    }

    async fn count(mm: &ModelManager, _actor: &AuthenticatedUser) -> DatabaseResult<i64> {
        let result: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM enrollments")
            .fetch_one(mm.executor())
            .await?;

        Ok(result)
    }
}

impl_paginatable_for!(Enrollment, EnrollmentCreate, Uuid);

#[async_trait]
impl HasOwner for Enrollment {
    type OwnerId = Uuid;

    async fn get_owner_id(
        &self,
        _mm: &ModelManager,
        _actor: &AuthenticatedUser,
    ) -> DatabaseResult<Self::OwnerId> {
        Ok(self.user_id)
    }
}

impl Enrollment {
    /// Enrolls `user_id` in `course_id` unless already enrolled.
    ///
    /// The insert and the `total_enrollment` bump share one transaction, and the
    /// `(user_id, course_id)` unique constraint turns concurrent duplicates into no-ops.
    /// Returns the enrollment and whether this call created it.
    #[tracing::instrument(skip(mm, _actor))]
    pub async fn enroll(
        mm: &ModelManager,
        _actor: &AuthenticatedUser,
        user_id: Uuid,
        course_id: Uuid,
        mode: EnrollmentMode,
        rating: Option<f64>,
    ) -> DatabaseResult<(Self, bool)> {
        let mut tx = mm.executor().begin().await?;

        let inserted: Option<Self> = sqlx::query_as(
            r#"
            INSERT INTO enrollments (id, user_id, course_id, mode, rating)
            VALUES ($1,$2,$3,$4,$5)
            ON CONFLICT (user_id, course_id) DO NOTHING
            RETURNING id, user_id, course_id, date_enrolled, mode, rating
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(user_id)
        .bind(course_id)
        .bind(mode.to_string())
        .bind(rating.unwrap_or(5.0))
        .fetch_optional(&mut *tx)
        .await?;

        let result = match inserted {
            Some(enrollment) => {
                sqlx::query("UPDATE courses SET total_enrollment = total_enrollment + 1 WHERE id = $1")
                    .bind(course_id)
                    .execute(&mut *tx)
                    .await?;
                (enrollment, true)
            }
            None => {
                let existing = sqlx::query_as(
                    "SELECT * FROM enrollments WHERE user_id = $1 AND course_id = $2",
                )
                .bind(user_id)
                .bind(course_id)
                .fetch_one(&mut *tx)
                .await?;
                (existing, false)
            }
        };

        tx.commit().await?;
        Ok(result)
    }

    pub async fn find_by_user_and_course(
        mm: &ModelManager,
        _actor: &AuthenticatedUser,
        user_id: Uuid,
        course_id: Uuid,
    ) -> DatabaseResult<Option<Self>> {
        let row = sqlx::query_as("SELECT * FROM enrollments WHERE user_id = $1 AND course_id = $2")
            .bind(user_id)
            .bind(course_id)
            .fetch_optional(mm.executor())
            .await?;
        Ok(row)
    }

    pub async fn count_by_course(
        mm: &ModelManager,
        _actor: &AuthenticatedUser,
        course_id: Uuid,
    ) -> DatabaseResult<i64> {
        let count = sqlx::query_scalar("SELECT COUNT(*) FROM enrollments WHERE course_id = $1")
            .bind(course_id)
            .fetch_one(mm.executor())
            .await?;
        Ok(count)
    }
}
