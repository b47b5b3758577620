//! RiskGate - Login Risk Scoring Gateway
//!
//! Scores login events from weighted contextual rules and maps the score to
//! an action through a configurable range table.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                         RISKGATE                             │
//! ├──────────────────────────────────────────────────────────────┤
//! │  ┌───────────┐  ┌──────────────┐  ┌───────────────────────┐  │
//! │  │  Scoring  │  │  Dashboard / │  │  Reputation Adapter   │  │
//! │  │  Endpoint │  │  Admin API   │  │  (AbuseIPDB, reqwest) │  │
//! │  │  (Axum)   │  │  (Axum)      │  │                       │  │
//! │  └─────┬─────┘  └──────┬───────┘  └───────────┬───────────┘  │
//! │        └───────────────┼──────────────────────┘              │
//! │                        ▼                                     │
//! │                 ┌─────────────┐                              │
//! │                 │ PostgreSQL  │                              │
//! │                 └─────────────┘                              │
//! └──────────────────────────────────────────────────────────────┘
//! ```

mod config;
mod db;
mod error;
mod handlers;
mod models;
mod reputation;
mod scoring;

use axum::{
    routing::{get, post, put},
    Router,
};
use std::net::SocketAddr;
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

pub use error::{AppError, AppResult};
use reputation::ReputationClient;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load configuration
    dotenvy::dotenv().ok();
    let config = config::Config::from_env();

    // Initialize logging (structured JSON in production)
    let registry = tracing_subscriber::registry().with(
        tracing_subscriber::EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| "riskgate=debug,tower_http=debug".into()),
    );
    if config.is_production() {
        registry
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }

    tracing::info!("RiskGate starting...");
    tracing::info!(
        "Database: {}",
        config.database_url.split('@').last().unwrap_or("***")
    );

    // Initialize database pool
    let pool = db::create_pool(&config.database_url).await?;

    // Run migrations and seed defaults
    tracing::info!("Running database migrations...");
    db::run_migrations(&pool).await?;

    // Background retention sweep for expired events
    db::spawn_expiry_sweep(pool.clone());

    let reputation = ReputationClient::new(&config);
    if !reputation.is_configured() {
        tracing::warn!("ABUSEIPDB_API_KEY not set, reputation lookups disabled");
    }

    // Build application state
    let state = AppState {
        pool,
        config: config.clone(),
        reputation,
    };

    // Build router
    let app = create_router(state);

    // Start server
    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    tracing::info!("🚀 Server listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub pool: sqlx::PgPool,
    pub config: config::Config,
    pub reputation: ReputationClient,
}

/// Create the main router with all routes
fn create_router(state: AppState) -> Router {
    // Scoring surface, called by the login SDK
    let scoring_routes = Router::new()
        .route("/health", get(handlers::health::check))
        .route("/api/v1/evaluate", post(handlers::evaluate::evaluate));

    // Dashboard/admin surface. Ships unauthenticated; deployments must
    // front these routes with their own access control.
    let admin_routes = Router::new()
        .route("/api/v1/events", get(handlers::events::list))
        .route("/api/v1/rules", get(handlers::rules::list_rules))
        .route("/api/v1/rules/:id", put(handlers::rules::update_rule))
        .route("/api/v1/weights", get(handlers::rules::list_weights))
        .route("/api/v1/weights/:rule_id", put(handlers::rules::update_weight));

    // Combine all routes
    Router::new()
        .merge(scoring_routes)
        .merge(admin_routes)
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state)
}
