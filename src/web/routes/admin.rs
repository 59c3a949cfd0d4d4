//! Admin API: CRUD over every entity plus inline authoring of course content.
//!
//! Every route requires an admin session.

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    middleware,
    response::IntoResponse,
    routing::{get, post, put},
};
use serde::{Serialize, de::DeserializeOwned};
use uuid::Uuid;

use crate::{
    model::{
        CrudRepository, Page, PaginatableRepository, ResourceTyped,
        entity::{
            Choice, ChoiceCreate, ChoiceDraft, Course, CourseCreate, Enrollment, EnrollmentCreate,
            Instructor, InstructorCreate, InstructorProfileRow, Learner, LearnerCreate, Lesson,
            LessonCreate, Question, QuestionCreate, Submission, SubmissionCreate, UserEntity,
            UserEntityCreateUpdate,
        },
    },
    web::{
        AppState, RequestContext, WebError, WebResult,
        dto::admin::{CourseAdminDetail, CourseListQuery, LessonInline, QuestionInline, QuestionWithChoices},
        error::ErrorResponse,
        middlewares,
        routes::{PaginationQuery, courses::find_course},
    },
};

pub fn routes<S>(state: AppState) -> Router<S> {
    Router::new()
        .route("/courses", get(course_list_handler).post(course_create_handler))
        .route(
            "/courses/{id}",
            get(course_get_handler)
                .put(course_update_handler)
                .delete(course_delete_handler),
        )
        .route("/courses/{id}/lessons", post(course_add_lesson_handler))
        .route("/courses/{id}/questions", post(course_add_question_handler))
        .route(
            "/courses/{id}/instructors/{instructor_id}",
            put(course_attach_instructor_handler).delete(course_detach_instructor_handler),
        )
        .route("/questions/{id}/choices", post(question_add_choice_handler))
        .merge(crud_routes::<Lesson, LessonCreate>("/lessons"))
        .merge(crud_routes::<Question, QuestionCreate>("/questions"))
        .merge(crud_routes::<Choice, ChoiceCreate>("/choices"))
        .merge(crud_routes::<Instructor, InstructorCreate>("/instructors"))
        .merge(crud_routes::<Learner, LearnerCreate>("/learners"))
        .merge(crud_routes::<Enrollment, EnrollmentCreate>("/enrollments"))
        .merge(crud_routes::<Submission, SubmissionCreate>("/submissions"))
        .route("/users", get(list_handler::<UserEntity, UserEntityCreateUpdate>))
        .route(
            "/users/{id}",
            get(get_handler::<UserEntity, UserEntityCreateUpdate>).delete(delete_handler::<UserEntity, UserEntityCreateUpdate>),
        )
        .layer(middleware::from_fn(middlewares::require_admin_fn))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            middlewares::extract_context_fn,
        ))
        .with_state(state)
}

/// List, create, fetch, update and delete routes for one entity under `prefix`.
fn crud_routes<T, C>(prefix: &str) -> Router<AppState>
where
    T: CrudRepository<T, C, Uuid>
        + PaginatableRepository<T, C, Uuid>
        + ResourceTyped
        + Serialize
        + Send
        + Sync
        + 'static,
    C: DeserializeOwned + Send + 'static,
{
    Router::new()
        .route(prefix, get(list_handler::<T, C>).post(create_handler::<T, C>))
        .route(
            &format!("{prefix}/{{id}}"),
            get(get_handler::<T, C>)
                .put(update_handler::<T, C>)
                .delete(delete_handler::<T, C>),
        )
}

async fn fetch_one<T, C>(state: &AppState, ctx: &RequestContext, id: Uuid) -> WebResult<T>
where
    T: CrudRepository<T, C, Uuid> + ResourceTyped + Send + Sync,
{
    let user = ctx.admin_user()?;
    T::find_by_id(state.pool(), user, id)
        .await
        .map_err(|e| WebError::resource_fetch_error(T::get_resource_type(), e))?
        .ok_or_else(|| WebError::resource_not_found(T::get_resource_type()))
}

async fn list_handler<T, C>(
    ctx: RequestContext,
    State(state): State<AppState>,
    Query(page): Query<PaginationQuery>,
) -> WebResult<Json<Page<T>>>
where
    T: CrudRepository<T, C, Uuid> + PaginatableRepository<T, C, Uuid> + ResourceTyped + Serialize + Send + Sync,
{
    let user = ctx.admin_user()?;
    let items = T::page(state.pool(), user, page.limit(), page.offset())
        .await
        .map_err(|e| WebError::resource_fetch_error(T::get_resource_type(), e))?;
    Ok(Json(items))
}

async fn get_handler<T, C>(
    ctx: RequestContext,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> WebResult<Json<T>>
where
    T: CrudRepository<T, C, Uuid> + ResourceTyped + Serialize + Send + Sync,
    C: Send,
{
    let found = fetch_one::<T, C>(&state, &ctx, id).await?;
    Ok(Json(found))
}

async fn create_handler<T, C>(
    ctx: RequestContext,
    State(state): State<AppState>,
    Json(payload): Json<C>,
) -> WebResult<impl IntoResponse>
where
    T: CrudRepository<T, C, Uuid> + ResourceTyped + Serialize + Send + Sync,
    C: Send,
{
    let user = ctx.admin_user()?;
    let created = T::create(state.pool(), user, payload)
        .await
        .map_err(|e| WebError::from_database(T::get_resource_type(), e))?;
    Ok((StatusCode::CREATED, Json(created)))
}

async fn update_handler<T, C>(
    ctx: RequestContext,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<C>,
) -> WebResult<Json<T>>
where
    T: CrudRepository<T, C, Uuid> + ResourceTyped + Serialize + Send + Sync,
    C: Send,
{
    let user = ctx.admin_user()?;
    let found = fetch_one::<T, C>(&state, &ctx, id).await?;
    let updated = found
        .update(state.pool(), user, payload)
        .await
        .map_err(|e| WebError::from_database(T::get_resource_type(), e))?;
    Ok(Json(updated))
}

async fn delete_handler<T, C>(
    ctx: RequestContext,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> WebResult<StatusCode>
where
    T: CrudRepository<T, C, Uuid> + ResourceTyped + Send + Sync,
{
    let user = ctx.admin_user()?;
    let found = fetch_one::<T, C>(&state, &ctx, id).await?;
    found
        .delete(state.pool(), user)
        .await
        .map_err(|e| WebError::from_database(T::get_resource_type(), e))?;
    Ok(StatusCode::NO_CONTENT)
}

// Courses

#[utoipa::path(
    get,
    path = "/admin/courses",
    description = "Paginated course list. `search` matches name or description; the date range filters publication date",
    params(CourseListQuery),
    responses(
        (status = 200, description = "Requested page", body = crate::model::Page<Course>),
        (status = 401, description = "You had to be authorized to do this", body = ErrorResponse),
        (status = 403, description = "You're not an admin", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse),
    ),
    tag = "admin",
    security(
        ("cookie" = [])
    )
)]
pub(crate) async fn course_list_handler(
    ctx: RequestContext,
    State(state): State<AppState>,
    Query(query): Query<CourseListQuery>,
) -> WebResult<impl IntoResponse> {
    let user = ctx.admin_user()?;
    let (filter, page) = query.split();

    let items = Course::filtered(state.pool(), user, &filter, page.limit(), page.offset())
        .await
        .map_err(|e| WebError::resource_fetch_error(Course::get_resource_type(), e))?;
    let total = Course::count_filtered(state.pool(), user, &filter)
        .await
        .map_err(|e| WebError::resource_fetch_error(Course::get_resource_type(), e))?;

    Ok((
        StatusCode::OK,
        Json(Page::new(items, total, page.limit(), page.offset())),
    ))
}

#[utoipa::path(
    post,
    path = "/admin/courses",
    request_body = CourseCreate,
    responses(
        (status = 201, description = "Course created", body = Course),
        (status = 403, description = "You're not an admin", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse),
    ),
    tag = "admin",
    security(
        ("cookie" = [])
    )
)]
pub(crate) async fn course_create_handler(
    ctx: RequestContext,
    State(state): State<AppState>,
    Json(payload): Json<CourseCreate>,
) -> WebResult<impl IntoResponse> {
    let user = ctx.admin_user()?;
    if payload.name.trim().is_empty() {
        return Err(WebError::resource_bad_request(Course::get_resource_type()));
    }

    let created = Course::create(state.pool(), user, payload)
        .await
        .map_err(|e| WebError::from_database(Course::get_resource_type(), e))?;
    tracing::info!("course `{}` created", created.name());

    Ok((StatusCode::CREATED, Json(created)))
}

#[utoipa::path(
    get,
    path = "/admin/courses/{id}",
    description = "Course with its lessons, instructors, and questions including the correct choices",
    params(("id" = Uuid, Path, description = "Course id")),
    responses(
        (status = 200, description = "Course found", body = CourseAdminDetail),
        (status = 403, description = "You're not an admin", body = ErrorResponse),
        (status = 404, description = "No such course", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse),
    ),
    tag = "admin",
    security(
        ("cookie" = [])
    )
)]
pub(crate) async fn course_get_handler(
    ctx: RequestContext,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> WebResult<impl IntoResponse> {
    let user = ctx.admin_user()?;
    let course = find_course(&state, user, id).await?;

    let lessons = Lesson::all_by_course(state.pool(), user, id)
        .await
        .map_err(|e| WebError::resource_fetch_error(Lesson::get_resource_type(), e))?;
    let instructors = InstructorProfileRow::all_by_course(state.pool(), user, id)
        .await
        .map_err(|e| WebError::resource_fetch_error(Instructor::get_resource_type(), e))?;
    let questions = Question::all_by_course(state.pool(), user, id)
        .await
        .map_err(|e| WebError::resource_fetch_error(Question::get_resource_type(), e))?;
    let choices = Choice::all_by_course(state.pool(), user, id)
        .await
        .map_err(|e| WebError::resource_fetch_error(Choice::get_resource_type(), e))?;

    let body = CourseAdminDetail {
        course,
        lessons,
        instructors,
        questions: QuestionWithChoices::group(questions, choices),
    };

    Ok((StatusCode::OK, Json(body)))
}

#[utoipa::path(
    put,
    path = "/admin/courses/{id}",
    params(("id" = Uuid, Path, description = "Course id")),
    request_body = CourseCreate,
    responses(
        (status = 200, description = "Course updated", body = Course),
        (status = 403, description = "You're not an admin", body = ErrorResponse),
        (status = 404, description = "No such course", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse),
    ),
    tag = "admin",
    security(
        ("cookie" = [])
    )
)]
pub(crate) async fn course_update_handler(
    ctx: RequestContext,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<CourseCreate>,
) -> WebResult<impl IntoResponse> {
    let user = ctx.admin_user()?;
    let course = find_course(&state, user, id).await?;

    let updated = course
        .update(state.pool(), user, payload)
        .await
        .map_err(|e| WebError::from_database(Course::get_resource_type(), e))?;

    Ok((StatusCode::OK, Json(updated)))
}

#[utoipa::path(
    delete,
    path = "/admin/courses/{id}",
    description = "Deletes the course with its lessons, questions, enrollments and submissions",
    params(("id" = Uuid, Path, description = "Course id")),
    responses(
        (status = 204, description = "Course deleted"),
        (status = 403, description = "You're not an admin", body = ErrorResponse),
        (status = 404, description = "No such course", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse),
    ),
    tag = "admin",
    security(
        ("cookie" = [])
    )
)]
pub(crate) async fn course_delete_handler(
    ctx: RequestContext,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> WebResult<impl IntoResponse> {
    let user = ctx.admin_user()?;
    let course = find_course(&state, user, id).await?;

    course
        .delete(state.pool(), user)
        .await
        .map_err(|e| WebError::from_database(Course::get_resource_type(), e))?;

    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    post,
    path = "/admin/courses/{id}/lessons",
    params(("id" = Uuid, Path, description = "Course id")),
    request_body = LessonInline,
    responses(
        (status = 201, description = "Lesson added to the course", body = Lesson),
        (status = 403, description = "You're not an admin", body = ErrorResponse),
        (status = 404, description = "No such course", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse),
    ),
    tag = "admin",
    security(
        ("cookie" = [])
    )
)]
pub(crate) async fn course_add_lesson_handler(
    ctx: RequestContext,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<LessonInline>,
) -> WebResult<impl IntoResponse> {
    let user = ctx.admin_user()?;
    let course = find_course(&state, user, id).await?;

    let lesson = Lesson::create(
        state.pool(),
        user,
        LessonCreate {
            course_id: course.id(),
            title: payload.title,
            content: payload.content,
            order_index: payload.order_index,
        },
    )
    .await
    .map_err(|e| WebError::from_database(Lesson::get_resource_type(), e))?;

    Ok((StatusCode::CREATED, Json(lesson)))
}

#[utoipa::path(
    post,
    path = "/admin/courses/{id}/questions",
    description = "Adds a question together with its choices",
    params(("id" = Uuid, Path, description = "Course id")),
    request_body = QuestionInline,
    responses(
        (status = 201, description = "Question added to the course", body = QuestionWithChoices),
        (status = 403, description = "You're not an admin", body = ErrorResponse),
        (status = 404, description = "No such course", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse),
    ),
    tag = "admin",
    security(
        ("cookie" = [])
    )
)]
pub(crate) async fn course_add_question_handler(
    ctx: RequestContext,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<QuestionInline>,
) -> WebResult<impl IntoResponse> {
    let user = ctx.admin_user()?;
    let course = find_course(&state, user, id).await?;

    let (question, choices) = Question::create_with_choices(
        state.pool(),
        user,
        QuestionCreate {
            course_id: course.id(),
            question_text: payload.question_text,
            grade_point: payload.grade_point,
        },
        payload.choices,
    )
    .await
    .map_err(|e| WebError::from_database(Question::get_resource_type(), e))?;

    Ok((StatusCode::CREATED, Json(QuestionWithChoices { question, choices })))
}

#[utoipa::path(
    post,
    path = "/admin/questions/{id}/choices",
    params(("id" = Uuid, Path, description = "Question id")),
    request_body = ChoiceDraft,
    responses(
        (status = 201, description = "Choice added to the question", body = Choice),
        (status = 403, description = "You're not an admin", body = ErrorResponse),
        (status = 404, description = "No such question", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse),
    ),
    tag = "admin",
    security(
        ("cookie" = [])
    )
)]
pub(crate) async fn question_add_choice_handler(
    ctx: RequestContext,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<ChoiceDraft>,
) -> WebResult<impl IntoResponse> {
    let user = ctx.admin_user()?;
    let question = fetch_one::<Question, QuestionCreate>(&state, &ctx, id).await?;

    let choice = Choice::create(
        state.pool(),
        user,
        ChoiceCreate {
            question_id: question.id(),
            choice_text: payload.choice_text,
            is_correct: Some(payload.is_correct),
        },
    )
    .await
    .map_err(|e| WebError::from_database(Choice::get_resource_type(), e))?;

    Ok((StatusCode::CREATED, Json(choice)))
}

#[utoipa::path(
    put,
    path = "/admin/courses/{id}/instructors/{instructor_id}",
    params(
        ("id" = Uuid, Path, description = "Course id"),
        ("instructor_id" = Uuid, Path, description = "Instructor id"),
    ),
    responses(
        (status = 204, description = "Instructor teaches the course"),
        (status = 403, description = "You're not an admin", body = ErrorResponse),
        (status = 404, description = "No such course or instructor", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse),
    ),
    tag = "admin",
    security(
        ("cookie" = [])
    )
)]
pub(crate) async fn course_attach_instructor_handler(
    ctx: RequestContext,
    State(state): State<AppState>,
    Path((id, instructor_id)): Path<(Uuid, Uuid)>,
) -> WebResult<impl IntoResponse> {
    let user = ctx.admin_user()?;
    let course = find_course(&state, user, id).await?;
    let instructor = fetch_one::<Instructor, InstructorCreate>(&state, &ctx, instructor_id).await?;

    course
        .add_instructor(state.pool(), user, instructor.id())
        .await
        .map_err(|e| WebError::from_database(Course::get_resource_type(), e))?;

    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    delete,
    path = "/admin/courses/{id}/instructors/{instructor_id}",
    params(
        ("id" = Uuid, Path, description = "Course id"),
        ("instructor_id" = Uuid, Path, description = "Instructor id"),
    ),
    responses(
        (status = 204, description = "Instructor no longer teaches the course"),
        (status = 403, description = "You're not an admin", body = ErrorResponse),
        (status = 404, description = "No such course", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse),
    ),
    tag = "admin",
    security(
        ("cookie" = [])
    )
)]
pub(crate) async fn course_detach_instructor_handler(
    ctx: RequestContext,
    State(state): State<AppState>,
    Path((id, instructor_id)): Path<(Uuid, Uuid)>,
) -> WebResult<impl IntoResponse> {
    let user = ctx.admin_user()?;
    let course = find_course(&state, user, id).await?;

    course
        .remove_instructor(state.pool(), user, instructor_id)
        .await
        .map_err(|e| WebError::from_database(Course::get_resource_type(), e))?;

    Ok(StatusCode::NO_CONTENT)
}
