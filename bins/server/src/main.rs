//! Koperasi API Server
//!
//! Main entry point for the koperasi back office service. Optionally runs the
//! auto-sweep on a timer alongside the HTTP API.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, anyhow};
use tokio::net::TcpListener;
use tokio::time::MissedTickBehavior;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use koperasi_api::{AppState, create_router};
use koperasi_core::{Actor, SystemClock};
use koperasi_db::connect_with_pool;
use koperasi_shared::jwt::JwtConfig;
use koperasi_shared::types::StaffId;
use koperasi_shared::{AppConfig, JwtService};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "koperasi=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let config = AppConfig::load().context("Failed to load configuration")?;
    let tz = config.clock.tz().map_err(|e| anyhow!(e))?;

    // Connect to database
    let db = connect_with_pool(
        &config.database.url,
        config.database.max_connections,
        config.database.min_connections,
    )
    .await?;
    info!(
        max_connections = config.database.max_connections,
        "Connected to database"
    );

    let state = AppState {
        db: Arc::new(db),
        jwt_service: Arc::new(JwtService::new(JwtConfig::from(&config.jwt))),
        clock: Arc::new(SystemClock::new(tz)),
    };
    info!(timezone = %tz, today = %state.clock.today(), "Business clock configured");

    if config.sweep.enabled {
        match config.sweep.operator_id {
            Some(operator_id) => {
                let actor = sweep_operator(&state, StaffId::from_uuid(operator_id)).await?;
                let every = Duration::from_secs(config.sweep.interval_secs.max(1));
                info!(
                    operator = %actor.staff_id,
                    interval_secs = every.as_secs(),
                    "Periodic sweep enabled"
                );
                spawn_sweep(state.clone(), actor, every);
            }
            None => warn!("sweep.enabled is set without sweep.operator_id; periodic sweep disabled"),
        }
    }

    // Create router
    let app = create_router(state);

    // Start server
    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = TcpListener::bind(&addr).await?;
    info!("Server listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

/// Resolves the configured operator into the actor the sweep runs as.
async fn sweep_operator(state: &AppState, id: StaffId) -> anyhow::Result<Actor> {
    let staff = state
        .staff()
        .find_by_id(id)
        .await?
        .ok_or_else(|| anyhow!("sweep operator {id} does not exist"))?;
    Ok(Actor::from_claims(id, &staff.role)?)
}

/// Runs `sweep_all` every `every`, starting one interval after boot.
fn spawn_sweep(state: AppState, actor: Actor, every: Duration) {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(every);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        // The first tick completes immediately.
        ticker.tick().await;

        loop {
            ticker.tick().await;
            match state.sweeps().sweep_all(&actor).await {
                Ok(report) if !report.failed.is_empty() => {
                    warn!(failed = report.failed.len(), "Sweep run finished with failures");
                }
                Ok(_) => {}
                Err(e) => error!(error = %e, "Sweep run aborted"),
            }
        }
    });
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("Shutting down");
}
