//! Core shared utilities for the model gateway services.

use anyhow::Result;
use axum::{http::StatusCode, response::IntoResponse, routing::get, Json, Router};
use once_cell::sync::{Lazy, OnceCell};
use opentelemetry::trace::TracerProvider as _;
use opentelemetry_otlp::WithExportConfig;
use opentelemetry_sdk::trace::SdkTracerProvider;
use prometheus::{Encoder, TextEncoder};
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

pub mod config;
pub mod metrics;
pub mod model_registry;
pub mod model_uri;
pub mod variant;

pub use config::{build_config, load_config, GatewayConfig, LoaderKind, SharedConfig};
pub use metrics::{GatewayMetrics, GATEWAY_METRICS};
pub use model_registry::{lookup_run_id, resolve_alias_to_version_uri, select_version, MlflowRegistry, ModelRegistry, ModelVersion, RegistryError};
pub use model_uri::{clean_uri, is_alias_uri, parse_alias_uri, run_id_from_uri, versioned_uri, AliasRef};
pub use variant::{ModelFamily, UnknownVariant, Variant};

static TRACING_INIT: OnceCell<()> = OnceCell::new();
static TRACER_PROVIDER: OnceCell<SdkTracerProvider> = OnceCell::new();
static PROM_INIT: OnceCell<()> = OnceCell::new();

static NODE_LIVENESS: AtomicBool = AtomicBool::new(true);
static NODE_READINESS: AtomicBool = AtomicBool::new(false);
pub fn mark_ready() { NODE_READINESS.store(true, Ordering::SeqCst); }
pub fn clear_ready() { NODE_READINESS.store(false, Ordering::SeqCst); }
pub fn mark_not_live() { NODE_LIVENESS.store(false, Ordering::SeqCst); }

/// Install the global subscriber: env filter, plain or JSON fmt output (`GATEWAY_JSON_LOG=1`),
/// and an OTLP exporter when `OTEL_EXPORTER_OTLP_ENDPOINT` is set. Safe to call twice.
pub fn init_tracing(service: &str, default_level: &str) -> Result<()> {
    TRACING_INIT.get_or_try_init(|| -> Result<()> {
        let tracer = match std::env::var("OTEL_EXPORTER_OTLP_ENDPOINT") {
            Ok(endpoint) if !endpoint.trim().is_empty() => {
                let exporter = opentelemetry_otlp::SpanExporter::builder()
                    .with_tonic()
                    .with_endpoint(endpoint)
                    .build()?;
                let provider = SdkTracerProvider::builder()
                    .with_batch_exporter(exporter)
                    .with_resource(opentelemetry_sdk::Resource::builder().with_service_name(service.to_string()).build())
                    .build();
                let tracer = provider.tracer(service.to_string());
                opentelemetry::global::set_tracer_provider(provider.clone());
                let _ = TRACER_PROVIDER.set(provider);
                Some(tracer)
            }
            _ => None,
        };
        let json = std::env::var("GATEWAY_JSON_LOG").ok().map(|v| v == "1" || v.eq_ignore_ascii_case("true")).unwrap_or(false);
        let json_layer = json.then(|| {
            tracing_subscriber::fmt::layer()
                .json()
                .flatten_event(true)
                .with_current_span(true)
                .with_span_list(false)
        });
        let plain_layer = (!json).then(|| {
            tracing_subscriber::fmt::layer()
                .with_target(true)
                .with_thread_ids(false)
                .with_line_number(true)
        });
        let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
        tracing_subscriber::registry()
            .with(tracer.map(|t| tracing_opentelemetry::layer().with_tracer(t)))
            .with(env_filter)
            .with(json_layer)
            .with(plain_layer)
            .try_init()?;
        Ok(())
    })?;
    info!(target: "gateway_core", service, "tracing initialized");
    Ok(())
}

/// Flush and stop the OTLP exporter, if one was installed.
pub fn shutdown_tracer() {
    if let Some(provider) = TRACER_PROVIDER.get() {
        if let Err(e) = provider.shutdown() { tracing::warn!(error=?e, "tracer shutdown failed"); }
    }
}

/// Register the gateway metric families so `/metrics` can serve them.
pub fn init_metrics() -> Result<()> {
    PROM_INIT.get_or_init(|| { Lazy::force(&GATEWAY_METRICS); });
    Ok(())
}

/// Liveness, readiness, status and metrics routes, mergeable into any router state.
pub fn health_router<S>() -> Router<S>
where S: Clone + Send + Sync + 'static {
    Router::new()
        .route("/health", get(|| async { Json(serde_json::json!({"status": "ok"})) }))
        .route("/live", get(|| async { Json(serde_json::json!({"live": NODE_LIVENESS.load(Ordering::SeqCst)})) }))
        .route("/ready", get(ready_handler))
        .route("/status", get(|| async {
            Json(serde_json::json!({
                "live": NODE_LIVENESS.load(Ordering::SeqCst),
                "ready": NODE_READINESS.load(Ordering::SeqCst),
                "config_version": config::ACTIVE_CONFIG.get().and_then(|c| c.read().config_version.clone()),
            }))
        }))
        .route("/metrics", get(metrics_handler))
}

async fn ready_handler() -> impl IntoResponse {
    let ready = NODE_READINESS.load(Ordering::SeqCst);
    let status = if ready { StatusCode::OK } else { StatusCode::SERVICE_UNAVAILABLE };
    (status, Json(serde_json::json!({"ready": ready})))
}

async fn metrics_handler() -> axum::response::Response {
    if PROM_INIT.get().is_none() {
        return (StatusCode::SERVICE_UNAVAILABLE, "metrics not initialized").into_response();
    }
    let metric_families = prometheus::gather();
    let mut buf = Vec::new();
    if let Err(e) = TextEncoder::new().encode(&metric_families, &mut buf) {
        return (StatusCode::INTERNAL_SERVER_ERROR, format!("encode error: {e}")).into_response();
    }
    ([(axum::http::header::CONTENT_TYPE, "text/plain; version=0.0.4")], buf).into_response()
}
