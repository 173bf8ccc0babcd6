//! Gate node binary.

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{Context, Result};
use chat_gate::{sweep_task, AuthorizationPipeline};
use chat_telemetry::{init_telemetry, TelemetryConfig};
use gate_node::{build_router, load_config, AppState};
use tracing::{info, warn};

#[tokio::main]
async fn main() -> Result<()> {
    let _telemetry =
        init_telemetry(TelemetryConfig::from_env()).context("Failed to initialize logging")?;

    let config = load_config()?;

    let pipeline = Arc::new(
        AuthorizationPipeline::from_config(&config.gate)
            .context("Failed to build authorization pipeline")?,
    );
    info!(guards = ?pipeline.guard_names(), "Authorization pipeline ready");

    if let Some(store) = pipeline.rate_limit_store() {
        let limits = &config.gate.rate_limit;
        tokio::spawn(sweep_task(
            store,
            pipeline.clock(),
            limits.sweep_interval,
            limits.idle_ttl,
        ));
    }

    if !config.gate.access_window.enabled {
        warn!("Access window disabled, traffic is admitted at any hour");
    }

    let router = build_router(AppState::new(pipeline), &config.gate.security);

    let listener = tokio::net::TcpListener::bind(config.listen_addr)
        .await
        .with_context(|| format!("Failed to bind {}", config.listen_addr))?;
    info!(addr = %config.listen_addr, "Gate node listening. Press Ctrl+C to stop.");

    axum::serve(
        listener,
        router.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await
    .context("Server error")?;

    info!("Gate node stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "Failed to listen for Ctrl+C");
        std::future::pending::<()>().await;
    }
}
