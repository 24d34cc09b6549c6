//! Security Control Selection Optimizer - HTTP Server
//!
//! Exposes the optimizer over JSON. Data lives in PostgreSQL; the solver
//! backend is probed once at startup.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                      SECOPT SERVER                          │
//! ├─────────────────────────────────────────────────────────────┤
//! │  ┌───────────┐  ┌────────────────────┐  ┌────────────────┐ │
//! │  │  API      │  │  SecurityOptimizer │  │ SolverAdapter  │ │
//! │  │  (Axum)   │─►│  (secopt-core)     │─►│ glpk/cbc/micro │ │
//! │  └───────────┘  └─────────┬──────────┘  └────────────────┘ │
//! │                           ▼                                 │
//! │                 ┌───────────────────┐                       │
//! │                 │ PgStore (sqlx)    │                       │
//! │                 └───────────────────┘                       │
//! └─────────────────────────────────────────────────────────────┘
//! ```

mod config;
mod db;
mod error;
mod handlers;
mod models;
mod store;

use anyhow::Context;
use axum::{
    Router,
    routing::{get, post},
};
use tower_http::{
    cors::{CorsLayer, Any},
    trace::TraceLayer,
    compression::CompressionLayer,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use std::net::SocketAddr;
use std::sync::Arc;

use secopt_core::{OptimizerConfig, SecurityOptimizer, SecurityStore, SolverAdapter, SolverConfig};

pub use error::{AppError, AppResult};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load configuration
    dotenvy::dotenv().ok();
    let config = config::Config::from_env();

    // Initialize logging
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "secopt_server=debug,secopt_core=info,tower_http=debug".into());
    let registry = tracing_subscriber::registry().with(filter);
    if config.is_production() {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }

    tracing::info!("SecOpt server starting ({})...", config.environment);
    tracing::info!("Database: {}", config.database_url.split('@').last().unwrap_or("***"));

    // Initialize database pool
    let pool = db::create_pool(&config.database_url, config.database_max_connections)
        .await
        .context("Failed to create database pool")?;

    tracing::info!("Running database migrations...");
    db::run_migrations(&pool).await.context("Failed to run migrations")?;

    // Probe solver backends once; the adapter is shared read-only afterwards
    let solver_config = SolverConfig::from_env();
    let solver = tokio::task::spawn_blocking(move || SolverAdapter::from_config(&solver_config))
        .await
        .context("Solver probe task failed")?;
    match solver.backend_name() {
        Some(name) => tracing::info!("Optimization backend: {}", name),
        None => tracing::warn!("Starting without an optimization backend"),
    }

    let store: Arc<dyn SecurityStore> = Arc::new(store::PgStore::new(pool));
    let optimizer = SecurityOptimizer::new(store, Arc::new(solver), OptimizerConfig::from_env());

    let state = AppState {
        optimizer: Arc::new(optimizer),
    };

    let app = create_router(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    tracing::info!("Server listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    axum::serve(listener, app).await.context("Server error")?;
    Ok(())
}

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub optimizer: Arc<SecurityOptimizer>,
}

/// Create the main router with all routes
fn create_router(state: AppState) -> Router {
    let optimization_routes = Router::new()
        .route("/api/v1/optimization/solver", get(handlers::optimization::solver_status))
        .route("/api/v1/optimization/attributes/:id", post(handlers::optimization::optimize_attribute))
        .route("/api/v1/optimization/architectures/:id", post(handlers::optimization::optimize_architecture))
        .route("/api/v1/optimization/architectures/:id/plan", post(handlers::optimization::create_plan));

    Router::new()
        .route("/health", get(handlers::health::check))
        .merge(optimization_routes)
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any)
        )
        .with_state(state)
}
