use axum::{
    async_trait,
    extract::{FromRequest, FromRequestParts, Path, Request},
    http::request::Parts,
    Json,
};
use gateway_core::Variant;
use serde::de::DeserializeOwned;

use super::error::ApiError;

/// JSON body extractor that answers every rejection (syntax, shape, content type) with 422.
#[derive(Debug, Clone)]
pub struct ValidatedJson<T>(pub T);

#[async_trait]
impl<T, S> FromRequest<S> for ValidatedJson<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        match Json::<T>::from_request(req, state).await {
            Ok(Json(value)) => Ok(Self(value)),
            Err(rejection) => {
                tracing::warn!(reason=%rejection.body_text(), "request body rejected");
                Err(ApiError::validation(rejection.body_text()))
            }
        }
    }
}

/// `:variant` path segment of a prediction route. Only champion and latest (and their
/// spellings) are served; anything else is a 404 before the body is read.
#[derive(Debug, Clone)]
pub struct ServedVariant(pub String);

#[async_trait]
impl<S> FromRequestParts<S> for ServedVariant
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Path(variant) = Path::<String>::from_request_parts(parts, state)
            .await
            .map_err(|rejection| ApiError::not_found(rejection.body_text()))?;
        match variant.parse::<Variant>() {
            Ok(Variant::Champion | Variant::Latest) => Ok(Self(variant)),
            _ => {
                tracing::debug!(%variant, "prediction route not served");
                Err(ApiError::not_found(format!("No prediction route for variant: {variant}")))
            }
        }
    }
}
