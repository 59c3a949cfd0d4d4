use crate::auth::hash_password;
use crate::model::entity::{UserEntity, UserEntityCreateUpdate};
use crate::model::{DbConnection, ModelManager};
use crate::utils::signal::shutdown_signal;
use crate::web::{AuthenticatedUser, UserRole};
use crate::{error::AppResult, web::AppState};
use axum::Router;
use tokio::net::TcpListener;

pub mod config;
pub use config::{Config, ConfigError, ConfigResult};

pub mod auth;
pub mod error;
pub mod exam;
pub mod model;
pub mod utils;
pub mod web;

pub static APPLICATION_NAME: &str = "onlinecourse";

pub async fn build_server() -> AppResult<(AppState, Router)> {
    let use_local = cfg!(debug_assertions);
    let config = config::Config::get_or_init(use_local).await;
    let db = DbConnection::connect(config.app().database_uri())?;

    tracing::debug!("applying migrations...");
    db.migrate().await?;

    let uploads = utils::uploads::ensure_uploads_dir(&std::env::current_dir()?)?;
    tracing::debug!("serving static files from {}", uploads.display());

    let mm = ModelManager::new(db);
    if let Some(admin) = config.admin() {
        seed_admin_user(&mm, admin.username(), admin.password()).await?;
    }

    let state = AppState::new(mm);
    let app = web::routes::build_app(state.clone(), config);
    Ok((state, app))
}

pub async fn build_server_with_pool(db: DbConnection) -> AppResult<(AppState, Router)> {
    let config = config::Config::get_or_init(true).await;

    let mm = ModelManager::new(db);
    let state = AppState::new(mm);
    let app = web::routes::build_app(state.clone(), config);
    Ok((state, app))
}

/// Creates an admin account named `username` unless a user by that name exists.
/// Returns whether a user was created.
#[tracing::instrument(skip(mm, password))]
pub async fn seed_admin_user(mm: &ModelManager, username: &str, password: &str) -> AppResult<bool> {
    let system = AuthenticatedUser::admin();
    if UserEntity::find_by_username(mm, &system, username).await?.is_some() {
        tracing::debug!("admin `{username}` already present");
        return Ok(false);
    }

    let password_hash = hash_password(password)?;
    let data = UserEntityCreateUpdate {
        username: username.to_string(),
        password_hash,
        first_name: String::new(),
        last_name: String::new(),
    };
    UserEntity::create_with_role(mm, &system, data, UserRole::Admin).await?;

    tracing::info!("admin `{username}` created");
    Ok(true)
}

#[tracing::instrument]
pub async fn setup_workers() -> AppResult<()> {
    let (_, app) = build_server().await?;
    let config = Config::get_or_init(false).await;
    let listener = TcpListener::bind(config.host().bindto()).await?;

    tracing::info!("{APPLICATION_NAME} is starting at: {}", config.host().bindto());
    let axum_handle = axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal());

    axum_handle.await?;
    Ok(())
}

fn setup_trace() {
    use tracing_error::ErrorLayer;
    use tracing_subscriber::{filter::EnvFilter, fmt, prelude::*};

    // load .env file for RUST_LOG etc.
    let _ = dotenvy::dotenv();

    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(EnvFilter::from_default_env())
        .with(ErrorLayer::default())
        .init();

    tracing::debug!("tracing initialized.");
}

#[tracing::instrument]
pub async fn run() -> AppResult<()> {
    setup_trace();
    setup_workers().await?;
    Ok(())
}
