use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use tower_cookies::{Cookie, Cookies};

use crate::{
    Config, auth,
    model::{CrudRepository, ResourceTyped, entity::UserEntity},
    web::{AppState, RequestContext, context::AuthenticatedUser, error::WebError},
};

pub static AUTH_TOKEN: &str = "SID";

/// Resolves the session cookie into a [`RequestContext`]. Missing cookies, unknown users,
/// malformed subjects and tokens that fail verification all yield an anonymous context.
/// A token that fails verification is also dropped from the browser.
pub async fn extract_context_fn(
    State(state): State<AppState>,
    cookies: Cookies,
    mut req: Request,
    next: Next,
) -> Result<Response, WebError> {
    let token = match cookies.get(AUTH_TOKEN) {
        Some(token) => token,
        None => {
            req.extensions_mut().insert(RequestContext::new(None));
            return Ok(next.run(req).await);
        }
    };

    let claims = match auth::process_token(token.value(), Config::get_or_init(false).await.app().jwt()) {
        Ok(claims) => claims,
        Err(e) => {
            tracing::debug!("dropping session cookie: {e}");
            let mut stale = Cookie::from(AUTH_TOKEN);
            stale.set_path("/");
            cookies.remove(stale);
            req.extensions_mut().insert(RequestContext::new(None));
            return Ok(next.run(req).await);
        }
    };

    let Ok(id) = claims.claims.sub.parse::<uuid::Uuid>() else {
        tracing::warn!("session subject `{}` is not a user id", claims.claims.sub);
        req.extensions_mut().insert(RequestContext::new(None));
        return Ok(next.run(req).await);
    };

    let user = UserEntity::find_by_id(state.pool(), &AuthenticatedUser::admin(), id)
        .await
        .map_err(|e| WebError::resource_fetch_error(UserEntity::get_resource_type(), e))?;

    let ctx = match user {
        Some(user) => RequestContext::new(Some(AuthenticatedUser::new(id, user.role()))),
        None => RequestContext::new(None),
    };
    req.extensions_mut().insert(ctx);

    Ok(next.run(req).await)
}

/// Lets only admins through. Must run after [`extract_context_fn`].
pub async fn require_admin_fn(
    ctx: RequestContext,
    req: Request,
    next: Next,
) -> Result<Response, WebError> {
    ctx.admin_user()?;
    Ok(next.run(req).await)
}
