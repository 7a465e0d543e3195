//! Shared handler state.

use std::sync::Arc;

use gateway_core::{LoaderKind, MlflowRegistry, ModelRegistry, SharedConfig};

use crate::loader::{ModelLoader, RegistryLoader, StubLoader};
use crate::predict::PredictionService;

#[derive(Clone)]
pub struct AppState {
    pub predictions: Arc<PredictionService>,
    pub config: SharedConfig,
}

impl AppState {
    pub fn new(config: SharedConfig, registry: Arc<dyn ModelRegistry>, loader: Arc<dyn ModelLoader>) -> Self {
        Self { predictions: Arc::new(PredictionService::new(config.clone(), registry, loader)), config }
    }

    /// MLflow-backed state; the loader follows `model_loader` in the configuration.
    pub fn from_config(config: SharedConfig) -> Self {
        let registry: Arc<dyn ModelRegistry> = Arc::new(MlflowRegistry::new(config.clone()));
        let kind = config.read().model_loader;
        let loader: Arc<dyn ModelLoader> = match kind {
            LoaderKind::Stub => Arc::new(StubLoader),
            LoaderKind::Registry => Arc::new(RegistryLoader::new(registry.clone())),
        };
        tracing::info!(loader=?kind, "prediction service configured");
        Self::new(config, registry, loader)
    }
}
