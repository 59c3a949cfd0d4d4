use crate::impl_paginatable_for;
use crate::model::repo::ResourceTyped;
use crate::model::{ModelManager, error::DatabaseResult, repo::CrudRepository};
use crate::web::AuthenticatedUser;
use async_trait::async_trait;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use sqlx::prelude::FromRow;
use uuid::Uuid;

#[derive(Debug, Serialize, Deserialize, FromRow, utoipa::ToSchema)]
pub struct Course {
    id: Uuid,
    name: String,
    image: String,
    description: String,
    pub_date: Option<NaiveDate>,
    total_enrollment: i32,
}

/// Admin payload. `total_enrollment` is owned by the enrollment workflow and cannot be set.
#[derive(Debug, Deserialize, Serialize, utoipa::ToSchema)]
pub struct CourseCreate {
    pub name: String,
    #[serde(default)]
    pub image: String,
    #[serde(default)]
    pub description: String,
    pub pub_date: Option<NaiveDate>,
}

impl ResourceTyped for Course {
    fn get_resource_type() -> crate::model::ResourceType {
        crate::model::ResourceType::Course
    }
}

impl Course {
    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn image(&self) -> &str {
        &self.image
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn pub_date(&self) -> Option<NaiveDate> {
        self.pub_date
    }

    pub fn total_enrollment(&self) -> i32 {
        self.total_enrollment
    }
}

#[async_trait]
impl CrudRepository<Course, CourseCreate, Uuid> for Course {
    async fn create(
        mm: &ModelManager,
        _actor: &AuthenticatedUser,
        data: CourseCreate,
    ) -> DatabaseResult<Self> {
        let row = sqlx::query_as(
            r#"
            INSERT INTO courses (id, name, image, description, pub_date)
            VALUES ($1,$2,$3,$4,$5)
            RETURNING id, name, image, description, pub_date, total_enrollment
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(&data.name)
        .bind(&data.image)
        .bind(&data.description)
        .bind(data.pub_date)
        .fetch_one(mm.executor())
        .await?;

        Ok(row)
    }

    async fn update(
        mut self,
        mm: &ModelManager,
        _actor: &AuthenticatedUser,
        data: CourseCreate,
    ) -> DatabaseResult<Self> {
        sqlx::query(
            "UPDATE courses SET name = $1, image = $2, description = $3, pub_date = $4 WHERE id = $5",
        )
        .bind(&data.name)
        .bind(&data.image)
        .bind(&data.description)
        .bind(data.pub_date)
        .bind(self.id)
        .execute(mm.executor())
        .await?;

        self.name = data.name;
        self.image = data.image;
        self.description = data.description;
        self.pub_date = data.pub_date;
        Ok(self)
    }

    async fn delete(self, mm: &ModelManager, _actor: &AuthenticatedUser) -> DatabaseResult<()> {
        sqlx::query("DELETE FROM courses WHERE id = $1")
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
        let result = sqlx::query_as("SELECT * FROM courses WHERE id = $1")
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
        let result = sqlx::query_as("SELECT * FROM courses ORDER BY created_at, id LIMIT $1 OFFSET $2")
            .bind(limit)
            .bind(offset)
            .fetch_all(mm.executor())
            .await?;
        Ok(result)
    }

    async fn count(mm: &ModelManager, _actor: &AuthenticatedUser) -> DatabaseResult<i64> {
        let result: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM courses")
            .fetch_one(mm.executor())
            .await?;

        Ok(result)
    }
}

impl_paginatable_for!(Course, CourseCreate, Uuid);

/// Admin list filters. Every field narrows the result when set.
#[derive(Debug, Default, Clone)]
pub struct CourseFilter {
    /// Case-insensitive substring of the name or the description.
    pub search: Option<String>,
    pub pub_date_from: Option<NaiveDate>,
    pub pub_date_to: Option<NaiveDate>,
}

impl CourseFilter {
    fn pattern(&self) -> Option<String> {
        self.search
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(|s| format!("%{}%", s.replace('\\', "\\\\").replace('%', "\\%").replace('_', "\\_")))
    }
}

static FILTER_CLAUSE: &str = r#"
    ($1::TEXT IS NULL OR name ILIKE $1 OR description ILIKE $1)
    AND ($2::DATE IS NULL OR pub_date >= $2)
    AND ($3::DATE IS NULL OR pub_date <= $3)
"#;

// Utils

impl Course {
    pub async fn filtered(
        mm: &ModelManager,
        _actor: &AuthenticatedUser,
        filter: &CourseFilter,
        limit: i64,
        offset: i64,
    ) -> DatabaseResult<Vec<Self>> {
        let sql = format!(
            "SELECT * FROM courses WHERE {FILTER_CLAUSE} ORDER BY pub_date DESC NULLS LAST, name LIMIT $4 OFFSET $5"
        );
        let rows = sqlx::query_as(&sql)
            .bind(filter.pattern())
            .bind(filter.pub_date_from)
            .bind(filter.pub_date_to)
            .bind(limit)
            .bind(offset)
            .fetch_all(mm.executor())
            .await?;
        Ok(rows)
    }

    pub async fn count_filtered(
        mm: &ModelManager,
        _actor: &AuthenticatedUser,
        filter: &CourseFilter,
    ) -> DatabaseResult<i64> {
        let sql = format!("SELECT COUNT(*) FROM courses WHERE {FILTER_CLAUSE}");
        let count = sqlx::query_scalar(&sql)
            .bind(filter.pattern())
            .bind(filter.pub_date_from)
            .bind(filter.pub_date_to)
            .fetch_one(mm.executor())
            .await?;
        Ok(count)
    }

    pub async fn find_by_name(
        mm: &ModelManager,
        _actor: &AuthenticatedUser,
        name: &str,
    ) -> DatabaseResult<Option<Self>> {
        let row = sqlx::query_as("SELECT * FROM courses WHERE name = $1 ORDER BY created_at LIMIT 1")
            .bind(name)
            .fetch_optional(mm.executor())
            .await?;
        Ok(row)
    }

    pub async fn add_instructor(
        &self,
        mm: &ModelManager,
        _actor: &AuthenticatedUser,
        instructor_id: Uuid,
    ) -> DatabaseResult<()> {
        sqlx::query(
            "INSERT INTO course_instructors (course_id, instructor_id) VALUES ($1,$2) ON CONFLICT DO NOTHING",
        )
        .bind(self.id)
        .bind(instructor_id)
        .execute(mm.executor())
        .await?;
        Ok(())
    }

    pub async fn remove_instructor(
        &self,
        mm: &ModelManager,
        _actor: &AuthenticatedUser,
        instructor_id: Uuid,
    ) -> DatabaseResult<()> {
        sqlx::query("DELETE FROM course_instructors WHERE course_id = $1 AND instructor_id = $2")
            .bind(self.id)
            .bind(instructor_id)
            .execute(mm.executor())
            .await?;
        Ok(())
    }
}

/// Course row annotated with the viewer's enrollment status.
#[derive(Debug, Serialize, Deserialize, sqlx::FromRow)]
pub struct CourseWithEnrollmentRow {
    pub id: Uuid,
    pub name: String,
    pub image: String,
    pub description: String,
    pub pub_date: Option<NaiveDate>,
    pub total_enrollment: i32,
    pub is_enrolled: bool,
}

impl CourseWithEnrollmentRow {
    /// `actor` may be anonymous (nil id), in which case nothing is enrolled.
    pub async fn top_by_enrollment(
        mm: &ModelManager,
        actor: Option<&AuthenticatedUser>,
        limit: i64,
    ) -> DatabaseResult<Vec<Self>> {
        let viewer = actor.map(|a| a.user_id()).unwrap_or(Uuid::nil());
        let rows = sqlx::query_as(
            r#"
            SELECT
                c.id,
                c.name,
                c.image,
                c.description,
                c.pub_date,
                c.total_enrollment,
                EXISTS (
                    SELECT 1 FROM enrollments e
                    WHERE e.course_id = c.id AND e.user_id = $1
                ) AS is_enrolled
            FROM courses c
            ORDER BY c.total_enrollment DESC, c.created_at, c.id
            LIMIT $2
            "#,
        )
        .bind(viewer)
        .bind(limit)
        .fetch_all(mm.executor())
        .await?;

        Ok(rows)
    }
}
