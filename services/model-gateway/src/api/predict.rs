use std::time::Instant;

use axum::{extract::State, Json};
use gateway_core::{ModelFamily, GATEWAY_METRICS};
use serde::{de, Deserialize, Deserializer};

use super::error::ApiError;
use super::extract::{ServedVariant, ValidatedJson};
use crate::error::ErrorKind;
use crate::predict::PredictionOutcome;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct PredictRequest {
    #[serde(deserialize_with = "lenient_features")]
    pub features: Vec<f64>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum Feature {
    Number(f64),
    Text(String),
}

/// Numbers, or strings holding a number (`"1.5"`).
fn lenient_features<'de, D>(deserializer: D) -> Result<Vec<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    Vec::<Feature>::deserialize(deserializer)?
        .into_iter()
        .enumerate()
        .map(|(i, f)| match f {
            Feature::Number(n) => Ok(n),
            Feature::Text(s) => s.trim().parse::<f64>()
                .map_err(|_| de::Error::custom(format!("features[{i}]: '{s}' is not a valid number"))),
        })
        .collect()
}

pub async fn predict(
    State(state): State<AppState>,
    ServedVariant(variant): ServedVariant,
    ValidatedJson(req): ValidatedJson<PredictRequest>,
) -> Result<Json<PredictionOutcome>, ApiError> {
    run(&state, ModelFamily::Primary, &variant, &req.features, "predict").await
}

pub async fn weakest_link(
    State(state): State<AppState>,
    ServedVariant(variant): ServedVariant,
    ValidatedJson(req): ValidatedJson<PredictRequest>,
) -> Result<Json<PredictionOutcome>, ApiError> {
    run(&state, ModelFamily::WeakestLink, &variant, &req.features, "weakest_link").await
}

async fn run(state: &AppState, family: ModelFamily, variant: &str, features: &[f64], route: &str) -> Result<Json<PredictionOutcome>, ApiError> {
    let started = Instant::now();
    let res = state.predictions.predict(family, features, variant).await;
    let outcome = match &res {
        Ok(_) => "ok",
        Err(e) if e.kind() == ErrorKind::Validation => "client_error",
        Err(_) => "server_error",
    };
    GATEWAY_METRICS.predictions_total.with_label_values(&[family.name(), outcome]).inc();
    GATEWAY_METRICS.request_latency_ms.with_label_values(&[route]).observe(started.elapsed().as_secs_f64() * 1000.0);
    res.map(Json).map_err(ApiError::from_prediction)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn parse(body: serde_json::Value) -> Result<PredictRequest, serde_json::Error> { serde_json::from_value(body) }

    #[test]
    fn numeric_strings_are_accepted_as_features() {
        let req = parse(json!({"features": [1, "2.5", " -3 ", 4.25]})).unwrap();
        assert_eq!(req.features, vec![1.0, 2.5, -3.0, 4.25]);
        assert!(parse(json!({"features": []})).unwrap().features.is_empty());
    }

    #[test]
    fn non_numeric_features_are_rejected() {
        let err = parse(json!({"features": [1, "abc"]})).unwrap_err();
        assert!(err.to_string().contains("features[1]"), "{err}");
        assert!(parse(json!({"features": [true]})).is_err());
        assert!(parse(json!({"features": [null]})).is_err());
        assert!(parse(json!({"features": "1"})).is_err());
    }
}
