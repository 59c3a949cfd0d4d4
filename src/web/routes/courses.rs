use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    middleware,
    response::{IntoResponse, Redirect},
    routing::get,
};
use uuid::Uuid;

use crate::{
    model::{
        CrudRepository, ResourceTyped,
        entity::{
            Choice, Course, CourseWithEnrollmentRow, Enrollment, EnrollmentMode,
            InstructorProfileRow, Lesson, Question,
        },
    },
    web::{
        AppState, AuthenticatedUser, RequestContext, WebError, WebResult,
        dto::courses::{CourseDetailResponse, CourseListItem, ExamQuestion},
        error::ErrorResponse,
        middlewares,
    },
};

/// How many courses the landing list shows.
pub const TOP_COURSES: i64 = 10;

pub fn routes<S>(state: AppState) -> Router<S> {
    Router::new()
        .route("/", get(course_list_handler))
        .route("/{course_id}/", get(course_detail_handler))
        .route("/{course_id}/enroll/", get(course_enroll_handler))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            middlewares::extract_context_fn,
        ))
        .with_state(state)
}

pub(crate) async fn find_course(state: &AppState, actor: &AuthenticatedUser, id: Uuid) -> WebResult<Course> {
    Course::find_by_id(state.pool(), actor, id)
        .await
        .map_err(|e| WebError::resource_fetch_error(Course::get_resource_type(), e))?
        .ok_or_else(|| WebError::resource_not_found(Course::get_resource_type()))
}

#[utoipa::path(
    get,
    path = "/",
    description = "Most popular courses, with the caller's enrollment status",
    responses(
        (status = 200, description = "Courses ordered by enrollment count", body = Vec<CourseListItem>),
        (status = 500, description = "Internal server error", body = ErrorResponse),
    ),
    tag = "courses",
)]
pub(crate) async fn course_list_handler(
    ctx: RequestContext,
    State(state): State<AppState>,
) -> WebResult<impl IntoResponse> {
    let rows = CourseWithEnrollmentRow::top_by_enrollment(state.pool(), ctx.maybe_user(), TOP_COURSES)
        .await
        .map_err(|e| WebError::resource_fetch_error(Course::get_resource_type(), e))?;

    let courses: Vec<CourseListItem> = rows.into_iter().map(CourseListItem::from).collect();
    Ok((StatusCode::OK, Json(courses)))
}

#[utoipa::path(
    get,
    path = "/{course_id}/",
    description = "Course page: lessons, instructors and the exam without its answers",
    params(("course_id" = Uuid, Path, description = "Course id")),
    responses(
        (status = 200, description = "Course found", body = CourseDetailResponse),
        (status = 404, description = "No such course", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse),
    ),
    tag = "courses",
)]
pub(crate) async fn course_detail_handler(
    ctx: RequestContext,
    State(state): State<AppState>,
    Path(course_id): Path<Uuid>,
) -> WebResult<impl IntoResponse> {
    let system = AuthenticatedUser::admin();
    let course = find_course(&state, &system, course_id).await?;

    let is_enrolled = match ctx.maybe_user() {
        Some(user) => Enrollment::find_by_user_and_course(state.pool(), user, user.user_id(), course_id)
            .await
            .map_err(|e| WebError::resource_fetch_error(Enrollment::get_resource_type(), e))?
            .is_some(),
        None => false,
    };

    let lessons = Lesson::all_by_course(state.pool(), &system, course_id)
        .await
        .map_err(|e| WebError::resource_fetch_error(Lesson::get_resource_type(), e))?;
    let instructors = InstructorProfileRow::all_by_course(state.pool(), &system, course_id)
        .await
        .map_err(|e| WebError::resource_fetch_error(crate::model::ResourceType::Instructor, e))?;
    let questions = Question::all_by_course(state.pool(), &system, course_id)
        .await
        .map_err(|e| WebError::resource_fetch_error(Question::get_resource_type(), e))?;
    let choices = Choice::all_by_course(state.pool(), &system, course_id)
        .await
        .map_err(|e| WebError::resource_fetch_error(Choice::get_resource_type(), e))?;

    let body = CourseDetailResponse {
        course,
        is_enrolled,
        lessons,
        instructors,
        questions: ExamQuestion::from_entities(questions, choices),
    };

    Ok((StatusCode::OK, Json(body)))
}

#[utoipa::path(
    get,
    path = "/{course_id}/enroll/",
    description = "Enrolls the caller in honor mode. Repeating it, or calling it signed out, changes nothing",
    params(("course_id" = Uuid, Path, description = "Course id")),
    responses(
        (status = 303, description = "Redirect to the course page"),
        (status = 404, description = "No such course", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse),
    ),
    tag = "courses",
    security(
        ("cookie" = [])
    )
)]
pub(crate) async fn course_enroll_handler(
    ctx: RequestContext,
    State(state): State<AppState>,
    Path(course_id): Path<Uuid>,
) -> WebResult<impl IntoResponse> {
    let course = find_course(&state, &AuthenticatedUser::admin(), course_id).await?;
    let detail = format!("/{}/", course.id());

    let Some(user) = ctx.maybe_user() else {
        return Ok(Redirect::to(&detail));
    };

    let (enrollment, created) = Enrollment::enroll(
        state.pool(),
        user,
        user.user_id(),
        course.id(),
        EnrollmentMode::Honor,
        None,
    )
    .await
    .map_err(|e| WebError::from_database(Enrollment::get_resource_type(), e))?;

    if created {
        tracing::info!("user {} enrolled in course {}", user.user_id(), course.id());
    } else {
        tracing::debug!("user {} already enrolled as {}", user.user_id(), enrollment.id());
    }

    Ok(Redirect::to(&detail))
}
