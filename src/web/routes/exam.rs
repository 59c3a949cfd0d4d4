use axum::{
    Form, Json, Router,
    extract::{Path, State},
    http::StatusCode,
    middleware,
    response::{IntoResponse, Redirect},
    routing::{get, post},
};
use uuid::Uuid;

use crate::{
    exam,
    model::{
        CrudRepository, ResourceTyped, check_access,
        entity::{Choice, Enrollment, Question, Submission, SubmissionCreate},
    },
    web::{
        AppState, AuthenticatedUser, RequestContext, WebError, WebResult,
        dto::exam::ExamResultResponse, error::ErrorResponse, middlewares,
        routes::courses::find_course,
    },
};

pub fn routes<S>(state: AppState) -> Router<S> {
    Router::new()
        .route("/{course_id}/submit/", post(exam_submit_handler))
        .route(
            "/course/{course_id}/submission/{submission_id}/result/",
            get(exam_result_handler),
        )
        .layer(middleware::from_fn_with_state(
            state.clone(),
            middlewares::extract_context_fn,
        ))
        .with_state(state)
}

#[utoipa::path(
    post,
    path = "/{course_id}/submit/",
    description = "Records an exam attempt. Form fields named `choice_<question_id>` carry the selected choice ids; \
                   ids that match no choice are ignored",
    params(("course_id" = Uuid, Path, description = "Course id")),
    request_body(content = String, content_type = "application/x-www-form-urlencoded"),
    responses(
        (status = 303, description = "Redirect to the result of this attempt"),
        (status = 401, description = "You had to be authorized to do this", body = ErrorResponse),
        (status = 404, description = "No such course, or you're not enrolled in it", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse),
    ),
    tag = "exam",
    security(
        ("cookie" = [])
    )
)]
pub(crate) async fn exam_submit_handler(
    ctx: RequestContext,
    State(state): State<AppState>,
    Path(course_id): Path<Uuid>,
    Form(fields): Form<Vec<(String, String)>>,
) -> WebResult<impl IntoResponse> {
    let user = ctx.user()?;
    let course = find_course(&state, user, course_id).await?;

    let enrollment = Enrollment::find_by_user_and_course(state.pool(), user, user.user_id(), course.id())
        .await
        .map_err(|e| WebError::resource_fetch_error(Enrollment::get_resource_type(), e))?
        .ok_or_else(|| WebError::resource_not_found(Enrollment::get_resource_type()))?;

    let choice_ids = exam::selected_choice_ids(fields.iter().map(|(k, v)| (k.as_str(), v.as_str())));

    let submission = Submission::create(
        state.pool(),
        user,
        SubmissionCreate {
            enrollment_id: enrollment.id(),
            choice_ids,
        },
    )
    .await
    .map_err(|e| WebError::from_database(Submission::get_resource_type(), e))?;

    Ok(Redirect::to(&format!(
        "/course/{}/submission/{}/result/",
        course.id(),
        submission.id()
    )))
}

#[utoipa::path(
    get,
    path = "/course/{course_id}/submission/{submission_id}/result/",
    description = "Scores an attempt: total score, total points and a per-question breakdown",
    params(
        ("course_id" = Uuid, Path, description = "Course id"),
        ("submission_id" = Uuid, Path, description = "Submission id"),
    ),
    responses(
        (status = 200, description = "Graded attempt", body = ExamResultResponse),
        (status = 401, description = "You had to be authorized to do this", body = ErrorResponse),
        (status = 403, description = "The attempt belongs to someone else", body = ErrorResponse),
        (status = 404, description = "No such course or attempt", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse),
    ),
    tag = "exam",
    security(
        ("cookie" = [])
    )
)]
pub(crate) async fn exam_result_handler(
    ctx: RequestContext,
    State(state): State<AppState>,
    Path((course_id, submission_id)): Path<(Uuid, Uuid)>,
) -> WebResult<impl IntoResponse> {
    let user = ctx.user()?;
    let course = find_course(&state, user, course_id).await?;

    let submission = Submission::find_by_id(state.pool(), user, submission_id)
        .await
        .map_err(|e| WebError::resource_fetch_error(Submission::get_resource_type(), e))?
        .ok_or_else(|| WebError::resource_not_found(Submission::get_resource_type()))?;

    let submitted_for = submission
        .course_id(state.pool(), user)
        .await
        .map_err(|e| WebError::resource_fetch_error(Submission::get_resource_type(), e))?;
    if submitted_for != course.id() {
        return Err(WebError::resource_not_found(Submission::get_resource_type()));
    }

    check_access(state.pool(), user, &submission, user.user_id())
        .await
        .map_err(|e| WebError::from_database(Submission::get_resource_type(), e))?;

    let system = AuthenticatedUser::admin();
    let selected = submission
        .selected_choice_ids(state.pool(), &system)
        .await
        .map_err(|e| WebError::resource_fetch_error(Submission::get_resource_type(), e))?;
    let questions = Question::all_by_course(state.pool(), &system, course.id())
        .await
        .map_err(|e| WebError::resource_fetch_error(Question::get_resource_type(), e))?;
    let choices = Choice::all_by_course(state.pool(), &system, course.id())
        .await
        .map_err(|e| WebError::resource_fetch_error(Choice::get_resource_type(), e))?;

    let result = ExamResultResponse::grade(&course, &submission, questions, choices, selected);
    tracing::debug!(
        total_score = result.total_score,
        total_points = result.total_points,
        "graded submission {}",
        submission.id()
    );

    Ok((StatusCode::OK, Json(result)))
}
