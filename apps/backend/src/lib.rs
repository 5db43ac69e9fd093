pub mod config;
pub mod db;
pub mod error;
pub mod models;
pub mod routes;
pub mod services;

use std::sync::{Arc, Mutex, MutexGuard};

use axum::{
    routing::{get, post, put},
    Router,
};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::Config;
use crate::db::SqliteRepository;
use crate::error::ApiError;
use crate::services::StudyService;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub repository: Arc<Mutex<SqliteRepository>>,
    pub study: Arc<StudyService>,
    pub queue_limit: i64,
}

impl AppState {
    pub fn new(repository: SqliteRepository, study: StudyService, queue_limit: i64) -> Self {
        Self {
            repository: Arc::new(Mutex::new(repository)),
            study: Arc::new(study),
            queue_limit,
        }
    }

    pub fn from_config(config: &Config, repository: SqliteRepository) -> Self {
        let study = StudyService::new(
            Box::new(config.scheduler.clone()),
            config.daily_goal,
            config.daily_reset_hour,
        );
        Self::new(repository, study, config.queue_limit)
    }

    /// Exclusive access to the progress store.
    pub fn repository(&self) -> Result<MutexGuard<'_, SqliteRepository>, ApiError> {
        self.repository
            .lock()
            .map_err(|e| ApiError::Internal(format!("repository lock poisoned: {}", e)))
    }
}

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_check))
        // Study routes
        .route("/api/study/queue", get(routes::study::queue))
        .route("/api/study/review", post(routes::study::review))
        // Stats routes
        .route("/api/stats/daily", get(routes::stats::daily))
        .route("/api/stats/goal", get(routes::stats::goal))
        // Concept routes
        .route("/api/concepts", post(routes::concepts::create))
        .route("/api/concepts/:id", get(routes::concepts::get))
        .route(
            "/api/concepts/:id/selection",
            post(routes::concepts::select).delete(routes::concepts::deselect),
        )
        // Progress routes
        .route(
            "/api/progress/:concept_id/:direction",
            get(routes::progress::get),
        )
        .route(
            "/api/progress/:concept_id/:direction/mastered",
            put(routes::progress::set_mastered),
        )
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

pub async fn run() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env()?;

    if let Some(parent) = config.database_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    tracing::info!(path = %config.database_path.display(), "Opening progress database...");
    let repository = SqliteRepository::open(&config.database_path)?;

    let state = AppState::from_config(&config, repository);
    let app = build_router(state);

    let addr = config.bind_address();
    tracing::info!("Starting server on {}", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

async fn health_check() -> &'static str {
    "OK"
}
