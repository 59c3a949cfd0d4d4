use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Redirect},
    routing::{get, post},
};
use serde::Deserialize;
use tower_cookies::{
    Cookie, Cookies,
    cookie::{SameSite, time::Duration},
};
use uuid::Uuid;

use crate::{
    Config,
    auth::{self, UserClaims, hash_password, verify_password},
    model::{
        CrudRepository, ResourceTyped,
        entity::{UserEntity, UserEntityCreateUpdate},
    },
    web::{AppState, AuthenticatedUser, WebError, WebResult, error::ErrorResponse, middlewares::AUTH_TOKEN},
};

#[derive(Debug, Deserialize, utoipa::ToSchema)]
pub struct RegistrationBody {
    pub username: String,
    pub password: String,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
}

#[derive(Debug, Deserialize, utoipa::ToSchema)]
pub struct LoginBody {
    pub username: String,
    pub password: String,
}

pub fn routes<S>(state: AppState) -> Router<S> {
    Router::new()
        .route("/registration/", post(registration_handler))
        .route("/login/", post(login_handler))
        .route("/logout/", get(logout_handler))
        .with_state(state)
}

async fn set_session_cookie(cookies: &Cookies, user_id: Uuid) -> WebResult<()> {
    let jwt_key = Config::get_or_init(false).await.app().jwt();
    let token = auth::generate_token(UserClaims::session(user_id), jwt_key)
        .map_err(|e| WebError::server_crypt_error(e.into()))?;

    let mut cookie = Cookie::new(AUTH_TOKEN, token);
    cookie.set_same_site(SameSite::Lax);
    cookie.set_http_only(true);
    cookie.set_path("/");
    cookie.set_max_age(Duration::days(1));
    cookies.add(cookie);
    Ok(())
}

#[utoipa::path(
    post,
    path = "/registration/",
    request_body = RegistrationBody,
    description = "Creates a user account and signs it in",
    responses(
        (status = 200, description = "User created successfully", body = UserEntity),
        (status = 400, description = "Username or password is empty", body = ErrorResponse),
        (status = 409, description = "User already exists", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse),
    ),
    tag = "account"
)]
pub(crate) async fn registration_handler(
    State(state): State<AppState>,
    cookies: Cookies,
    Json(payload): Json<RegistrationBody>,
) -> WebResult<impl IntoResponse> {
    if payload.username.trim().is_empty() || payload.password.is_empty() {
        return Err(WebError::user_bad_request("username and password are required"));
    }

    let admin = AuthenticatedUser::admin();
    let found = UserEntity::find_by_username(state.pool(), &admin, &payload.username)
        .await
        .map_err(|e| WebError::resource_fetch_error(UserEntity::get_resource_type(), e))?;

    if found.is_some() {
        tracing::info!("registration for existing user `{}` refused", payload.username);
        return Err(WebError::registration_conflict());
    }

    let hash = hash_password(&payload.password).map_err(WebError::server_crypt_error)?;
    let payload = UserEntityCreateUpdate {
        username: payload.username,
        password_hash: hash,
        first_name: payload.first_name,
        last_name: payload.last_name,
    };

    // a concurrent registration can still win the race to the unique index
    let created = UserEntity::create(state.pool(), &admin, payload)
        .await
        .map_err(|e| {
            if e.is_unique_violation() {
                WebError::registration_conflict()
            } else {
                WebError::resource_fetch_error(UserEntity::get_resource_type(), e)
            }
        })?;

    set_session_cookie(&cookies, created.id()).await?;
    tracing::info!("user `{}` registered", created.username());

    Ok((StatusCode::OK, Json(created)))
}

#[utoipa::path(
    post,
    path = "/login/",
    description = "Authorizes user in the system",
    request_body = LoginBody,
    responses(
        (status = 200, description = "User signed in", body = UserEntity),
        (status = 401, description = "Invalid username or password", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse),
    ),
    tag = "account",
)]
pub(crate) async fn login_handler(
    State(state): State<AppState>,
    cookies: Cookies,
    Json(payload): Json<LoginBody>,
) -> WebResult<impl IntoResponse> {
    let admin = AuthenticatedUser::admin();
    let found = UserEntity::find_by_username(state.pool(), &admin, &payload.username)
        .await
        .map_err(|e| WebError::resource_fetch_error(UserEntity::get_resource_type(), e))?;

    let Some(found) = found else {
        return Err(WebError::auth_invalid_credentials());
    };

    let is_verified = verify_password(found.hash(), &payload.password)
        .map_err(WebError::server_crypt_error)?;

    if !is_verified {
        return Err(WebError::auth_invalid_credentials());
    }

    set_session_cookie(&cookies, found.id()).await?;

    Ok((StatusCode::OK, Json(found)))
}

#[utoipa::path(
    get,
    path = "/logout/",
    description = "Drops the session cookie and redirects to the course list",
    responses(
        (status = 303, description = "Signed out"),
    ),
    tag = "account",
)]
pub(crate) async fn logout_handler(cookies: Cookies) -> impl IntoResponse {
    let mut cookie = Cookie::from(AUTH_TOKEN);
    cookie.set_path("/");
    cookies.remove(cookie);

    Redirect::to("/")
}
