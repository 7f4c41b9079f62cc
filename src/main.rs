use anyhow::Context;
use sqlx::postgres::PgPoolOptions;
use std::time::Duration;
use tracing::info;
use tracing_subscriber::EnvFilter;

mod auth;
mod config;
mod errors;
mod handlers;
mod models;
mod openapi;
mod routes;
mod services;
mod state;

use config::Config;
use state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // ─── Logging ──────────────────────────────────────────────────────────────
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("payroll_dashboard=debug,tower_http=info")),
        )
        .init();

    // ─── Config ───────────────────────────────────────────────────────────────
    let config = Config::from_env()?;
    let addr = config.server_addr();

    // ─── Database ─────────────────────────────────────────────────────────────
    let db = PgPoolOptions::new()
        .max_connections(config.db_max_connections)
        .acquire_timeout(Duration::from_secs(5))
        .connect(&config.database_url)
        .await
        .context("Failed to connect to Postgres")?;

    sqlx::migrate!("./migrations")
        .run(&db)
        .await
        .context("Failed to run database migrations")?;

    info!("Database connected and migrations applied");

    // ─── Router ───────────────────────────────────────────────────────────────
    let app = routes::app(AppState::new(db, config));

    // ─── Start Server ─────────────────────────────────────────────────────────
    info!("Payroll Dashboard API listening on http://{}", addr);
    info!("Swagger UI: http://{}/docs", addr);
    info!("Health:     http://{}/health", addr);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;

    axum::serve(listener, app).await.context("Server failed")?;
    Ok(())
}
