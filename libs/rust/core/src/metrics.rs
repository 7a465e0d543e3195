//! Prometheus metrics for model resolution, registry traffic and predictions.

use once_cell::sync::Lazy;
use prometheus::{register_histogram_vec, register_int_counter_vec, HistogramVec, IntCounterVec};

pub struct GatewayMetrics {
    /// labels: family, outcome (`resolved` | `unconfigured` | `error`)
    pub resolutions_total: IntCounterVec,
    /// labels: family, result (`hit` | `miss`)
    pub cache_lookups_total: IntCounterVec,
    /// labels: operation, outcome
    pub registry_requests_total: IntCounterVec,
    /// labels: family
    pub alias_fallbacks_total: IntCounterVec,
    /// labels: family, outcome (`ok` | `client_error` | `server_error`)
    pub predictions_total: IntCounterVec,
    /// labels: route
    pub request_latency_ms: HistogramVec,
}

pub static GATEWAY_METRICS: Lazy<GatewayMetrics> = Lazy::new(|| GatewayMetrics {
    resolutions_total: register_int_counter_vec!("gateway_resolutions_total", "Variant resolutions by family and outcome", &["family", "outcome"])
        .expect("register gateway_resolutions_total"),
    cache_lookups_total: register_int_counter_vec!("gateway_model_cache_lookups_total", "Model cache lookups", &["family", "result"])
        .expect("register gateway_model_cache_lookups_total"),
    registry_requests_total: register_int_counter_vec!("gateway_registry_requests_total", "Registry REST calls", &["operation", "outcome"])
        .expect("register gateway_registry_requests_total"),
    alias_fallbacks_total: register_int_counter_vec!("gateway_alias_fallbacks_total", "Alias URIs rewritten to versioned URIs", &["family"])
        .expect("register gateway_alias_fallbacks_total"),
    predictions_total: register_int_counter_vec!("gateway_predictions_total", "Prediction requests by family and outcome", &["family", "outcome"])
        .expect("register gateway_predictions_total"),
    request_latency_ms: register_histogram_vec!(
        "gateway_request_latency_ms",
        "Handler latency in milliseconds",
        &["route"],
        vec![1.0, 5.0, 10.0, 25.0, 50.0, 100.0, 250.0, 500.0, 1000.0, 5000.0]
    )
    .expect("register gateway_request_latency_ms"),
});
