use crate::impl_paginatable_for;
use crate::model::access::HasOwner;
use crate::model::repo::ResourceTyped;
use crate::model::{ModelManager, error::DatabaseResult, repo::CrudRepository};
use crate::web::AuthenticatedUser;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{Postgres, Transaction, prelude::FromRow};
use uuid::Uuid;

#[derive(Debug, Serialize, Deserialize, FromRow, utoipa::ToSchema)]
pub struct Submission {
    id: Uuid,
    enrollment_id: Uuid,
    submitted_at: DateTime<Utc>,
}

#[derive(Debug, Default, Deserialize, Serialize, utoipa::ToSchema)]
pub struct SubmissionCreate {
    pub enrollment_id: Uuid,
    /// Ids without a matching choice are dropped.
    #[serde(default)]
    pub choice_ids: Vec<Uuid>,
}

impl ResourceTyped for Submission {
    fn get_resource_type() -> crate::model::ResourceType {
        crate::model::ResourceType::Submission
    }
}

impl Submission {
    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn enrollment_id(&self) -> Uuid {
        self.enrollment_id
    }

    pub fn submitted_at(&self) -> DateTime<Utc> {
        self.submitted_at
    }
}

async fn attach_choices(
    tx: &mut Transaction<'_, Postgres>,
    submission_id: Uuid,
    choice_ids: &[Uuid],
) -> DatabaseResult<u64> {
    if choice_ids.is_empty() {
        return Ok(0);
    }

    let attached = sqlx::query(
        r#"
        INSERT INTO submission_choices (submission_id, choice_id)
        SELECT $1, c.id FROM choices c WHERE c.id = ANY($2)
        ON CONFLICT DO NOTHING
        "#,
    )
    .bind(submission_id)
    .bind(choice_ids)
    .execute(&mut **tx)
    .await?
    .rows_affected();

    Ok(attached)
}

#[async_trait]
impl CrudRepository<Submission, SubmissionCreate, Uuid> for Submission {
    #[tracing::instrument(skip(mm, _actor, data), fields(enrollment_id = %data.enrollment_id))]
    async fn create(
        mm: &ModelManager,
        _actor: &AuthenticatedUser,
        data: SubmissionCreate,
    ) -> DatabaseResult<Self> {
        let mut tx = mm.executor().begin().await?;

        let submission: Self = sqlx::query_as(
            r#"
            INSERT INTO submissions (id, enrollment_id)
            VALUES ($1,$2)
            RETURNING id, enrollment_id, submitted_at
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(data.enrollment_id)
        .fetch_one(&mut *tx)
        .await?;

        let attached = attach_choices(&mut tx, submission.id, &data.choice_ids).await?;
        tx.commit().await?;

        tracing::debug!(
            submitted = data.choice_ids.len(),
            attached,
            "submission {} recorded",
            submission.id
        );
        Ok(submission)
    }

    /// Moves the submission and replaces its whole choice set.
    async fn update(
        mut self,
        mm: &ModelManager,
        _actor: &AuthenticatedUser,
        data: SubmissionCreate,
    ) -> DatabaseResult<Self> {
        let mut tx = mm.executor().begin().await?;

        sqlx::query("UPDATE submissions SET enrollment_id = $1 WHERE id = $2")
            .bind(data.enrollment_id)
            .bind(self.id)
            .execute(&mut *tx)
            .await?;

        sqlx::query("DELETE FROM submission_choices WHERE submission_id = $1")
            .bind(self.id)
            .execute(&mut *tx)
            .await?;

        attach_choices(&mut tx, self.id, &data.choice_ids).await?;
        tx.commit().await?;

        self.enrollment_id = data.enrollment_id;
        Ok(self)
    }

    async fn delete(self, mm: &ModelManager, _actor: &AuthenticatedUser) -> DatabaseResult<()> {
        sqlx::query("DELETE FROM submissions WHERE id = $1")
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
        let result = sqlx::query_as("SELECT * FROM submissions WHERE id = $1")
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
            "SELECT * FROM submissions ORDER BY submitted_at DESC, id LIMIT $1 OFFSET $2",
        )
        .bind(limit)
        .bind(offset)
        .fetch_all(mm.executor())
        .await?;
        Ok(result)
    }

    async fn count(mm: &ModelManager, _actor: &AuthenticatedUser) -> DatabaseResult<i64> {
        let result: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM submissions")
            .fetch_one(mm.executor())
            .await?;

        Ok(result)
    }
}

impl_paginatable_for!(Submission, SubmissionCreate, Uuid);

#[async_trait]
impl HasOwner for Submission {
    type OwnerId = Uuid;

    async fn get_owner_id(
        &self,
        mm: &ModelManager,
        _actor: &AuthenticatedUser,
    ) -> DatabaseResult<Self::OwnerId> {
        let owner = sqlx::query_scalar("SELECT user_id FROM enrollments WHERE id = $1")
            .bind(self.enrollment_id)
            .fetch_one(mm.executor())
            .await?;
        Ok(owner)
    }
}

impl Submission {
    pub async fn selected_choice_ids(
        &self,
        mm: &ModelManager,
        _actor: &AuthenticatedUser,
    ) -> DatabaseResult<Vec<Uuid>> {
        let ids = sqlx::query_scalar(
            "SELECT choice_id FROM submission_choices WHERE submission_id = $1",
        )
        .bind(self.id)
        .fetch_all(mm.executor())
        .await?;
        Ok(ids)
    }

    /// Course the submission was made for, through its enrollment.
    pub async fn course_id(
        &self,
        mm: &ModelManager,
        _actor: &AuthenticatedUser,
    ) -> DatabaseResult<Uuid> {
        let course_id = sqlx::query_scalar("SELECT course_id FROM enrollments WHERE id = $1")
            .bind(self.enrollment_id)
            .fetch_one(mm.executor())
            .await?;
        Ok(course_id)
    }
}
