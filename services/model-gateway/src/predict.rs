//! Prediction stub and model metadata over both model families.

use std::sync::Arc;

use gateway_core::{ModelFamily, ModelRegistry, SharedConfig};
use serde::Serialize;
use tracing::debug;

use crate::error::GatewayError;
use crate::loader::ModelLoader;
use crate::resolver::ModelResolver;

/// Placeholder output: a score for the primary family, a class label for weakest-link.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(untagged)]
pub enum Prediction {
    Score(f64),
    Label(String),
}

impl Prediction {
    pub fn placeholder(family: ModelFamily) -> Self {
        match family {
            ModelFamily::Primary => Prediction::Score(0.5),
            ModelFamily::WeakestLink => Prediction::Label("class_A".into()),
        }
    }
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct PredictionOutcome {
    pub prediction: Prediction,
    pub model_uri: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub run_id: Option<String>,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ModelInfo {
    pub variant: String,
    pub model_uri: String,
    pub expected_features: Option<usize>,
}

pub struct PredictionService {
    primary: ModelResolver,
    weakest_link: ModelResolver,
}

impl PredictionService {
    pub fn new(config: SharedConfig, registry: Arc<dyn ModelRegistry>, loader: Arc<dyn ModelLoader>) -> Self {
        Self {
            primary: ModelResolver::new(ModelFamily::Primary, config.clone(), registry.clone(), loader.clone()),
            weakest_link: ModelResolver::new(ModelFamily::WeakestLink, config, registry, loader),
        }
    }

    pub fn resolver(&self, family: ModelFamily) -> &ModelResolver {
        match family {
            ModelFamily::Primary => &self.primary,
            ModelFamily::WeakestLink => &self.weakest_link,
        }
    }

    pub async fn predict(&self, family: ModelFamily, features: &[f64], variant: &str) -> Result<PredictionOutcome, GatewayError> {
        let entry = self.resolver(family).resolve(variant).await?
            .ok_or_else(|| GatewayError::ModelNotFound(variant.to_string()))?;
        if let Some(expected) = entry.model.expected_features {
            if features.len() != expected {
                return Err(GatewayError::FeatureCountMismatch { expected, actual: features.len() });
            }
        }
        debug!(%family, %variant, features=features.len(), uri=%entry.uri, "placeholder prediction");
        Ok(PredictionOutcome {
            prediction: Prediction::placeholder(family),
            model_uri: entry.uri.clone(),
            run_id: entry.run_id.clone(),
        })
    }

    pub async fn model_info(&self, family: ModelFamily, variant: &str) -> Result<ModelInfo, GatewayError> {
        let entry = self.resolver(family).resolve(variant).await?
            .ok_or_else(|| GatewayError::ModelNotFound(variant.to_string()))?;
        Ok(ModelInfo {
            variant: variant.to_string(),
            model_uri: entry.uri.clone(),
            expected_features: entry.model.expected_features,
        })
    }

    /// Drop every cached model of both families; returns how many entries were removed.
    pub fn clear_caches(&self) -> usize { self.primary.clear_cache() + self.weakest_link.clear_cache() }
}
