//! Turning a configured URI into a [`ModelRecord`].
//!
//! The gateway does not run inference, so "loading" only establishes that a URI is usable.
//! A loader that fails with [`LoadError::InvalidParameter`] on an alias URI triggers the alias
//! fallback in the resolver; no other error does.

use std::sync::Arc;

use async_trait::async_trait;
use gateway_core::{is_alias_uri, parse_alias_uri, ModelRegistry, RegistryError};
use thiserror::Error;
use tracing::debug;

use crate::cache::ModelRecord;

#[derive(Debug, Error)]
pub enum LoadError {
    /// The registry refused the reference as given (MLflow `INVALID_PARAMETER_VALUE`).
    #[error("INVALID_PARAMETER_VALUE: {0}")]
    InvalidParameter(String),
    #[error(transparent)]
    Registry(#[from] RegistryError),
}

#[async_trait]
pub trait ModelLoader: Send + Sync {
    async fn load(&self, uri: &str) -> Result<ModelRecord, LoadError>;
}

/// Records the URI without contacting a serving layer. Never fails.
#[derive(Debug, Default, Clone)]
pub struct StubLoader;

#[async_trait]
impl ModelLoader for StubLoader {
    async fn load(&self, uri: &str) -> Result<ModelRecord, LoadError> {
        Ok(ModelRecord { uri: uri.to_string(), loaded: true, expected_features: None })
    }
}

/// Checks alias URIs against the registry's alias endpoint; other URIs are accepted as-is.
pub struct RegistryLoader {
    registry: Arc<dyn ModelRegistry>,
}

impl RegistryLoader {
    pub fn new(registry: Arc<dyn ModelRegistry>) -> Self { Self { registry } }
}

#[async_trait]
impl ModelLoader for RegistryLoader {
    async fn load(&self, uri: &str) -> Result<ModelRecord, LoadError> {
        if is_alias_uri(uri) {
            let alias_ref = parse_alias_uri(uri)?;
            match self.registry.get_model_version_by_alias(&alias_ref.name, &alias_ref.alias).await {
                Ok(mv) => debug!(%uri, version=%mv.version, "alias accepted by registry"),
                Err(e) if e.is_invalid_parameter() => return Err(LoadError::InvalidParameter(e.to_string())),
                Err(e) => return Err(e.into()),
            }
        }
        Ok(ModelRecord { uri: uri.to_string(), loaded: true, expected_features: None })
    }
}
