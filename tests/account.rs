mod common;
use axum::http::StatusCode;
use chrono::Utc;
use onlinecourse::Config;
use onlinecourse::auth::{UserClaims, generate_token};
use onlinecourse::model::entity::UserEntity;
use onlinecourse::web::middlewares::AUTH_TOKEN;
use tower_cookies::Cookie;
use tower_cookies::cookie::{SameSite, time::Duration};
use uuid::Uuid;

use crate::common::{
    Action, Flow, create_course_action, enroll_action, login_action, login_admin_action,
    registration_action, setup_server, setup_test_db,
};

#[tokio::test]
async fn route_registration_test() {
    let pool = setup_test_db().await;
    let mut server = setup_server(&pool).await;

    Flow::new()
        .step(
            registration_action("foobar", "foobaz")
                .assert_cookie(AUTH_TOKEN, |cookie| {
                    assert_eq!(cookie.same_site(), Some(SameSite::Lax));
                    assert_eq!(cookie.path(), Some("/"));
                    assert_eq!(cookie.http_only(), Some(true));
                    assert_eq!(cookie.max_age(), Some(Duration::days(1)));
                })
                .assert_body(|body| {
                    let ent: UserEntity = serde_json::from_str(body).expect("Invalid body format");
                    assert_eq!(ent.username(), "foobar");
                    assert_eq!(ent.last_name(), "foobar");
                    assert!(!body.contains("password"));
                })
                .with_expect(StatusCode::OK),
        )
        // try to register twice
        .step(
            registration_action("foobar", "other")
                .with_expect(StatusCode::CONFLICT)
                .assert_body(|body| assert!(body.contains("User already exists."))),
        )
        .step(registration_action("", "x").with_expect(StatusCode::BAD_REQUEST))
        .run(&mut server, pool)
        .await;
}

#[tokio::test]
async fn route_login_test() {
    let pool = setup_test_db().await;
    let mut server = setup_server(&pool).await;

    Flow::new()
        .step(registration_action("LOGINTEST", "LOGINTEST").with_save_cookies(false))
        .step(
            login_action("LOGINTEST", "LOGINTEST")
                .assert_cookie(AUTH_TOKEN, |cookie| {
                    assert_eq!(cookie.same_site(), Some(SameSite::Lax));
                    assert_eq!(cookie.path(), Some("/"));
                    assert_eq!(cookie.http_only(), Some(true));
                })
                .assert_body(|body| {
                    let ent: UserEntity = serde_json::from_str(body).expect("Invalid JSON format");
                    assert_eq!(ent.username(), "LOGINTEST");
                })
                .with_expect(StatusCode::OK)
                .with_clear_cookies(true),
        )
        // wrong credentials
        .step(
            login_action("LOGINTEST", "WRONGPASSWORD")
                .with_save_cookies(false)
                .with_clear_cookies(true)
                .assert_body(|body| {
                    assert!(body.contains("Invalid username or password."));
                })
                .with_expect(StatusCode::UNAUTHORIZED),
        )
        // non-existing account
        .step(
            login_action("nonexisting", "nvm")
                .with_expect(StatusCode::UNAUTHORIZED)
                .assert_body(|body| assert!(body.contains("Invalid username or password."))),
        )
        .run(&mut server, pool)
        .await;
}

#[tokio::test]
async fn route_logout_test() {
    let pool = setup_test_db().await;
    let mut server = setup_server(&pool).await;

    Flow::new()
        .step(registration_action("leaving", "leaving"))
        .step(
            Action::new("logout", "GET", "/logout/")
                .with_expect(StatusCode::SEE_OTHER)
                .assert_location(|location, _| assert_eq!(location, "/"))
                .assert_cookie(AUTH_TOKEN, |cookie| {
                    assert_eq!(cookie.value(), "");
                    assert_eq!(cookie.path(), Some("/"));
                }),
        )
        .run(&mut server, pool)
        .await;
}

/// Admin publishes one course, then every public route is hit with `stale` in the jar.
/// The caller must come out anonymous, with the cookie cleared and nothing written.
fn stale_session_flow(stale: Cookie<'static>) -> Flow {
    Flow::new()
        .step(login_admin_action())
        .step(create_course_action("course", "Networks", None))
        .step(
            Action::new("landing_with_stale_cookie", "GET", "/")
                .with_clear_cookies(true)
                .with_cookie(stale.clone())
                .assert_cookie(AUTH_TOKEN, |cookie| assert_eq!(cookie.value(), ""))
                .assert_json(|body, _| {
                    let courses = body.as_array().expect("course list is not an array");
                    assert_eq!(courses.len(), 1);
                    assert_eq!(courses[0]["is_enrolled"], false);
                }),
        )
        .step(
            Action::new("detail_with_stale_cookie", "GET", "")
                .with_dyn_path(|ctx| format!("/{}/", ctx.field("course", "id")))
                .with_cookie(stale.clone())
                .assert_json(|body, _| assert_eq!(body["is_enrolled"], false)),
        )
        .step(enroll_action("course").with_cookie(stale))
        .step(
            Action::new("detail_after_enroll", "GET", "")
                .with_dyn_path(|ctx| format!("/{}/", ctx.field("course", "id")))
                .assert_json(|body, _| {
                    assert_eq!(body["is_enrolled"], false);
                    assert_eq!(body["course"]["total_enrollment"], 0);
                }),
        )
        // signing in again still works
        .step(registration_action("returning", "returning"))
        .step(
            Action::new("detail_signed_in", "GET", "")
                .with_dyn_path(|ctx| format!("/{}/", ctx.field("course", "id")))
                .assert_json(|body, _| assert_eq!(body["is_enrolled"], false)),
        )
}

#[tokio::test]
async fn forged_session_is_anonymous() {
    let pool = setup_test_db().await;
    let mut server = setup_server(&pool).await;

    stale_session_flow(Cookie::new(AUTH_TOKEN, "not-a-jwt"))
        .run(&mut server, pool)
        .await;
}

#[tokio::test]
async fn expired_session_is_anonymous() {
    let pool = setup_test_db().await;
    let mut server = setup_server(&pool).await;

    let claims = UserClaims {
        sub: Uuid::new_v4().to_string(),
        exp: (Utc::now() - chrono::Duration::hours(1)).timestamp(),
    };
    let jwt_key = Config::get_or_init(false).await.app().jwt();
    let token = generate_token(claims, jwt_key).unwrap();

    stale_session_flow(Cookie::new(AUTH_TOKEN, token))
        .run(&mut server, pool)
        .await;
}

#[tokio::test]
async fn session_signed_with_other_secret_is_anonymous() {
    let pool = setup_test_db().await;
    let mut server = setup_server(&pool).await;

    let token = generate_token(UserClaims::session(Uuid::new_v4()), "rotated-away").unwrap();

    stale_session_flow(Cookie::new(AUTH_TOKEN, token))
        .run(&mut server, pool)
        .await;
}
