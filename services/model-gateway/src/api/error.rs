//! HTTP error bodies. Every error is rendered as `{"detail": ...}`.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use tracing::{error, warn};

use crate::error::{ErrorKind, GatewayError};

#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub detail: String,
}

impl ApiError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self { status: StatusCode::UNPROCESSABLE_ENTITY, detail: msg.into() }
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        Self { status: StatusCode::NOT_FOUND, detail: msg.into() }
    }

    pub fn unavailable(msg: impl Into<String>) -> Self {
        Self { status: StatusCode::SERVICE_UNAVAILABLE, detail: msg.into() }
    }

    /// Prediction routes prefix server-side failures with the error kind.
    pub fn from_prediction(err: GatewayError) -> Self {
        match err.kind() {
            ErrorKind::Validation => {
                warn!(error=%err, "prediction rejected");
                Self::validation(err.to_string())
            }
            _ => {
                error!(error=%err, kind=err.kind_name(), "prediction failed");
                Self::unavailable(format!("{}: {}", err.kind_name(), err))
            }
        }
    }

    pub fn from_lookup(err: GatewayError) -> Self {
        match err.kind() {
            ErrorKind::Validation => {
                warn!(error=%err, "model lookup rejected");
                Self::validation(err.to_string())
            }
            _ => {
                error!(error=%err, kind=err.kind_name(), "model lookup failed");
                Self::unavailable(err.to_string())
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(json!({ "detail": self.detail }))).into_response()
    }
}
