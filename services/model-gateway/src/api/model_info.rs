use axum::{
    extract::{Path, State},
    Json,
};
use gateway_core::ModelFamily;

use super::error::ApiError;
use crate::predict::ModelInfo;
use crate::state::AppState;

pub async fn primary(State(state): State<AppState>, Path(variant): Path<String>) -> Result<Json<ModelInfo>, ApiError> {
    lookup(&state, ModelFamily::Primary, &variant).await
}

pub async fn weakest_link(State(state): State<AppState>, Path(variant): Path<String>) -> Result<Json<ModelInfo>, ApiError> {
    lookup(&state, ModelFamily::WeakestLink, &variant).await
}

async fn lookup(state: &AppState, family: ModelFamily, variant: &str) -> Result<Json<ModelInfo>, ApiError> {
    state.predictions.model_info(family, variant).await.map(Json).map_err(ApiError::from_lookup)
}
