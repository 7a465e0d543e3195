//! REST surface of the gateway.

pub mod admin;
pub mod error;
pub mod extract;
pub mod model_info;
pub mod predict;

use axum::{
    http::{header, HeaderValue, Method},
    routing::{get, post},
    Json, Router,
};
use serde_json::{json, Value};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::state::AppState;

/// Build the full application router.
pub fn create_router(state: AppState) -> Router {
    let frontend_port = state.config.read().frontend_port;

    let v1_routes = Router::new()
        .route("/predict/:variant", post(predict::predict))
        .route("/weakest-link/:variant", post(predict::weakest_link))
        .route("/model-info/:variant", get(model_info::primary))
        .route("/model-info/weakest-link/:variant", get(model_info::weakest_link))
        .route("/admin/cache/clear", post(admin::clear_cache));

    Router::new()
        .route("/", get(index))
        .route("/api/v2/status", get(v2_status))
        .nest("/api/v1", v1_routes)
        .merge(gateway_core::health_router::<AppState>())
        .layer(TraceLayer::new_for_http())
        .layer(cors_layer(frontend_port))
        .with_state(state)
}

fn cors_layer(frontend_port: u16) -> CorsLayer {
    let mut ports = vec![frontend_port, 3000, 5173];
    ports.sort_unstable();
    ports.dedup();
    let origins: Vec<HeaderValue> = ports
        .into_iter()
        .filter_map(|port| HeaderValue::from_str(&format!("http://localhost:{port}")).ok())
        .collect();
    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([header::CONTENT_TYPE])
}

async fn index() -> Json<Value> {
    Json(json!({
        "message": "Backend is running",
        "health": "/health",
        "model_info": "/api/v1/model-info/champion",
        "predict": "/api/v1/predict/champion",
    }))
}

async fn v2_status() -> Json<Value> {
    Json(json!({ "version": "v2", "status": "ok" }))
}
