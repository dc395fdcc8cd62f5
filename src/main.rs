//! Sport event ingestion service.
//!
//! Polls the upstream odds and mappings endpoints, keeps the event state store
//! current and serves the live view over HTTP.

use anyhow::{Context, Result};
use tracing::{error, info};

use sport_events_ingestion::server;
use sport_events_ingestion::service::{shared_store, HealthState, IngestionService};
use sport_events_ingestion::Config;

#[tokio::main]
async fn main() -> Result<()> {
    // Optional .env for local runs
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("sport_events_ingestion=info".parse()?),
        )
        .init();

    info!("Sport event ingestion service v{}", env!("CARGO_PKG_VERSION"));

    let config = Config::from_env().context("Invalid configuration")?;
    let server_port = config.server_port;
    let run_once = config.run_once;

    let store = shared_store();
    let health = HealthState::new();
    let mut service = IngestionService::new(config, store.clone(), health.clone())?;

    if run_once {
        info!("Running in one-shot mode (RUN_ONCE=true)");
        let count = service.poll_once().await?;
        info!("One-shot cycle completed: {} live events", count);
        return Ok(());
    }

    let app = server::router(store, health);
    let addr = format!("0.0.0.0:{}", server_port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    info!("HTTP server listening on {}", addr);

    tokio::spawn(async move {
        if let Err(e) = axum::serve(listener, app).await {
            error!("HTTP server error: {:?}", e);
        }
    });

    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);

    tokio::select! {
        result = service.run() => {
            if let Err(e) = result {
                error!("Service error: {:?}", e);
            }
        }
        _ = ctrl_c => {
            info!("Shutting down...");
        }
    }

    Ok(())
}
