use std::{sync::Arc, time::Duration};

use crate::grading::{DisabledGradingService, GradingService, HttpGradingService};
use crate::model::{DbConnection, ModelManager, entity::Session};
use crate::utils::signal::shutdown_signal;
use crate::{
    error::{AppResult, log_error},
    web::{AppState, AuthenticatedUser},
};
use axum::Router;
use tokio::net::TcpListener;

pub mod config;
pub use config::{Config, ConfigError, ConfigResult};

pub mod auth;
pub mod certificate;
pub mod error;
pub mod grading;
pub mod model;
pub mod payment;
pub mod study;
pub mod utils;
pub mod web;

static APPLICATION_NAME: &str = "studyhub";
const SESSION_SWEEP_INTERVAL: Duration = Duration::from_secs(60 * 60);

pub fn grader_from_config(config: &'static Config) -> AppResult<Arc<dyn GradingService>> {
    if !config.grading().use_ai() {
        return Ok(Arc::new(DisabledGradingService));
    }
    Ok(Arc::new(HttpGradingService::from_config(config.grading())?))
}

pub async fn build_server() -> AppResult<(AppState, Router)> {
    let use_local = cfg!(debug_assertions);
    let config = Config::get_or_init(use_local).await;

    let db = DbConnection::connect(config.app().database_uri())?;
    db.migrate().await?;

    let grader = grader_from_config(config)?;
    build_server_with(db, grader).await
}

pub async fn build_server_with_pool(db: DbConnection) -> AppResult<(AppState, Router)> {
    let config = Config::get_or_init(true).await;
    let grader = grader_from_config(config)?;
    build_server_with(db, grader).await
}

pub async fn build_server_with(
    db: DbConnection,
    grader: Arc<dyn GradingService>,
) -> AppResult<(AppState, Router)> {
    let config = Config::get_or_init(true).await;

    let mm = ModelManager::new(db);
    let state = AppState::new(mm, grader);
    let app = web::routes::build_app(state.clone(), config);
    Ok((state, app))
}

fn spawn_session_sweeper(state: AppState, every: Duration) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let actor = AuthenticatedUser::admin();
        let mut interval = tokio::time::interval(every);
        loop {
            interval.tick().await;
            match Session::cleanup_expired(state.pool(), &actor).await {
                Ok(0) => {}
                Ok(removed) => tracing::info!(removed, "expired sessions removed"),
                Err(e) => log_error(&e),
            }
        }
    })
}

#[tracing::instrument]
pub async fn setup_workers() -> AppResult<()> {
    let (state, app) = build_server().await?;
    let sweeper = spawn_session_sweeper(state, SESSION_SWEEP_INTERVAL);
    let config = Config::get_or_init(false).await;
    let listener = TcpListener::bind(config.host().bindto()).await?;

    tracing::info!("axum is starting at: {}", config.host().bindto());
    let axum_handle = axum::serve(listener, app).with_graceful_shutdown(shutdown_signal());

    axum_handle.await?;
    sweeper.abort();
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
