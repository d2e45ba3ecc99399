use std::sync::Arc;

use anyhow::Result;
use tracing::{error, info, warn};

use tutorhub_api::config::config;
use tutorhub_api::database::manager::DatabaseManager;
use tutorhub_api::mail::LogMailer;
use tutorhub_api::{app, AppState};

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt::init();

    let cfg = config();
    info!("Starting TutorHub API in {:?} mode", cfg.environment);

    let pool = DatabaseManager::pool().await?;

    if let Err(e) = DatabaseManager::migrate().await {
        // A failed migration on boot is survivable when the schema already
        // matches; the health endpoint reports anything worse.
        warn!("Database migration failed: {}", e);
    }

    let state = AppState::new(pool, Arc::new(LogMailer));

    let addr = format!("0.0.0.0:{}", cfg.server.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("Listening on {}", addr);

    if let Err(e) = axum::serve(listener, app(state)).await {
        error!("Server error: {}", e);
        return Err(e.into());
    }

    Ok(())
}
