//! Gateway error taxonomy.

use gateway_core::RegistryError;
use thiserror::Error;

use crate::loader::LoadError;

/// Coarse classification the HTTP layer maps to a status code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Caller sent unusable input (422).
    Validation,
    /// No model resolves for the request.
    NotFound,
    /// Registry or loading failure.
    Upstream,
    /// Gateway is missing required settings.
    Configuration,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::Validation => "ValidationError",
            ErrorKind::NotFound => "NotFoundError",
            ErrorKind::Upstream => "UpstreamError",
            ErrorKind::Configuration => "ConfigurationError",
        }
    }
}

#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("{0}")]
    Configuration(String),
    #[error("Model not found for variant: {0}")]
    ModelNotFound(String),
    #[error("Weaklink model URI is not set for variant: {0}")]
    UriNotConfigured(String),
    #[error("Model expects {expected} features, got {actual}")]
    FeatureCountMismatch { expected: usize, actual: usize },
    #[error(transparent)]
    Registry(#[from] RegistryError),
    #[error("failed to load model from {uri}: {source}")]
    Load { uri: String, source: LoadError },
}

impl GatewayError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            GatewayError::Configuration(_) => ErrorKind::Configuration,
            GatewayError::ModelNotFound(_) | GatewayError::UriNotConfigured(_) => ErrorKind::NotFound,
            GatewayError::FeatureCountMismatch { .. } => ErrorKind::Validation,
            GatewayError::Registry(RegistryError::NotConfigured | RegistryError::InvalidAliasUri(_)) => ErrorKind::Configuration,
            GatewayError::Registry(_) | GatewayError::Load { .. } => ErrorKind::Upstream,
        }
    }

    pub fn kind_name(&self) -> &'static str { self.kind().as_str() }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn feature_mismatch_is_validation_and_names_both_counts() {
        let err = GatewayError::FeatureCountMismatch { expected: 4, actual: 3 };
        assert_eq!(err.kind(), ErrorKind::Validation);
        assert_eq!(err.to_string(), "Model expects 4 features, got 3");
    }

    #[test]
    fn registry_errors_split_between_config_and_upstream() {
        assert_eq!(GatewayError::from(RegistryError::NotConfigured).kind(), ErrorKind::Configuration);
        assert_eq!(GatewayError::from(RegistryError::InvalidAliasUri("models:/@x".into())).kind(), ErrorKind::Configuration);
        assert_eq!(GatewayError::from(RegistryError::NoVersions("M".into())).kind(), ErrorKind::Upstream);
    }

    #[test]
    fn missing_model_keeps_variant_text() {
        let err = GatewayError::ModelNotFound("staging".into());
        assert_eq!(err.kind(), ErrorKind::NotFound);
        assert!(err.to_string().contains("staging"));
    }
}
