use axum::{extract::State, Json};
use serde_json::{json, Value};

use crate::state::AppState;

/// Forget every resolved model so the next request re-resolves against current configuration.
pub async fn clear_cache(State(state): State<AppState>) -> Json<Value> {
    let cleared = state.predictions.clear_caches();
    Json(json!({ "cleared": cleared }))
}
