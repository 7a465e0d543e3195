//! HTTP gateway in front of the MLflow model registry.
//!
//! Requests name a model *variant* (champion / latest / backup); the gateway maps it to the
//! configured model URI, memoizes the resolved model and answers with a placeholder prediction.

pub mod api;
pub mod cache;
pub mod error;
pub mod loader;
pub mod predict;
pub mod resolver;
pub mod state;

use anyhow::Result;
use tokio::signal;
use tracing::{info, warn};

pub use error::{ErrorKind, GatewayError};
pub use state::AppState;

pub const SERVICE_NAME: &str = "model-gateway";

/// Load configuration, install telemetry and serve until Ctrl-C / SIGTERM.
pub async fn run() -> Result<()> {
    let config = gateway_core::load_config(SERVICE_NAME).await?;
    let (level, port) = {
        let cfg = config.read();
        (cfg.log_level.clone().unwrap_or_else(|| "info".into()), cfg.backend_port)
    };
    gateway_core::init_tracing(SERVICE_NAME, &level)?;
    gateway_core::init_metrics()?;

    if config.read().tracking_uri().is_none() {
        warn!("MLFLOW_TRACKING_URI is not set; every model resolution will fail until it is configured");
    }

    let app = api::create_router(AppState::from_config(config));
    let listener = tokio::net::TcpListener::bind(("0.0.0.0", port)).await?;
    info!(addr=%listener.local_addr()?, "model gateway listening");
    gateway_core::mark_ready();

    axum::serve(listener, app).with_graceful_shutdown(shutdown_signal()).await?;

    gateway_core::clear_ready();
    gateway_core::shutdown_tracer();
    info!("model gateway stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await { warn!(error=%e, "ctrl-c handler unavailable"); std::future::pending::<()>().await; }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => { sig.recv().await; }
            Err(e) => { warn!(error=%e, "SIGTERM handler unavailable"); std::future::pending::<()>().await; }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    info!("shutdown signal received");
}
