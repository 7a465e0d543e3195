//! Variant → model resolution for one model family.
//!
//! Resolution reads the live configuration, looks the configured URI up in the family's cache
//! and otherwise loads it, rewriting alias URIs to versioned ones when the loader rejects them
//! as invalid parameters.

use std::sync::Arc;

use gateway_core::{
    is_alias_uri, lookup_run_id, parse_alias_uri, resolve_alias_to_version_uri, ModelFamily, ModelRegistry, SharedConfig, Variant,
    GATEWAY_METRICS,
};
use tracing::{debug, info, instrument, warn};

use crate::cache::{CacheEntry, ModelCache, ModelRecord};
use crate::error::GatewayError;
use crate::loader::{LoadError, ModelLoader};

pub struct ModelResolver {
    family: ModelFamily,
    config: SharedConfig,
    registry: Arc<dyn ModelRegistry>,
    loader: Arc<dyn ModelLoader>,
    cache: ModelCache,
}

impl ModelResolver {
    pub fn new(family: ModelFamily, config: SharedConfig, registry: Arc<dyn ModelRegistry>, loader: Arc<dyn ModelLoader>) -> Self {
        Self { family, config, registry, loader, cache: ModelCache::new() }
    }

    /// Configured URI for `variant`, or `None` when the variant is unknown or its setting is blank.
    pub fn direct_uri(&self, variant: &str) -> Option<String> {
        let variant: Variant = variant.parse().ok()?;
        self.config.read().family_uri(self.family, variant)
    }

    /// Resolve `variant` to a cached model entry.
    ///
    /// `Ok(None)` means "no model" and is only produced for families that tolerate a missing URI;
    /// the weakest-link family reports it as [`GatewayError::UriNotConfigured`].
    #[instrument(skip(self), fields(family = %self.family))]
    pub async fn resolve(&self, variant: &str) -> Result<Option<Arc<CacheEntry>>, GatewayError> {
        let family = self.family.name();
        if self.config.read().tracking_uri().is_none() {
            GATEWAY_METRICS.resolutions_total.with_label_values(&[family, "error"]).inc();
            return Err(GatewayError::Configuration("MLFLOW_TRACKING_URI is not set".into()));
        }
        let Some(uri) = self.direct_uri(variant) else {
            GATEWAY_METRICS.resolutions_total.with_label_values(&[family, "unconfigured"]).inc();
            if self.family.requires_uri() {
                return Err(GatewayError::UriNotConfigured(variant.to_string()));
            }
            debug!(%variant, "no model uri configured");
            return Ok(None);
        };

        if let Some(hit) = self.cache.get(&uri) {
            GATEWAY_METRICS.cache_lookups_total.with_label_values(&[family, "hit"]).inc();
            GATEWAY_METRICS.resolutions_total.with_label_values(&[family, "resolved"]).inc();
            return Ok(Some(hit));
        }
        GATEWAY_METRICS.cache_lookups_total.with_label_values(&[family, "miss"]).inc();

        match self.load_with_alias_fallback(&uri).await {
            Ok(entry) => {
                GATEWAY_METRICS.resolutions_total.with_label_values(&[family, "resolved"]).inc();
                info!(%variant, configured=%uri, resolved=%entry.uri, "model resolved");
                Ok(Some(self.cache.insert(uri, entry)))
            }
            Err(e) => {
                GATEWAY_METRICS.resolutions_total.with_label_values(&[family, "error"]).inc();
                Err(e)
            }
        }
    }

    async fn load_with_alias_fallback(&self, uri: &str) -> Result<CacheEntry, GatewayError> {
        let (model, uri_used) = self.load_model(uri).await?;
        let run_id = match lookup_run_id(self.registry.as_ref(), &uri_used).await {
            Ok(run_id) => run_id,
            Err(e) => {
                warn!(uri=%uri_used, error=%e, "run id lookup failed");
                None
            }
        };
        Ok(CacheEntry { model, uri: uri_used, run_id })
    }

    async fn load_model(&self, uri: &str) -> Result<(ModelRecord, String), GatewayError> {
        match self.loader.load(uri).await {
            Ok(model) => Ok((model, uri.to_string())),
            Err(LoadError::InvalidParameter(reason)) if is_alias_uri(uri) => {
                warn!(%uri, %reason, "alias rejected by loader, resolving through version search");
                let alias_ref = parse_alias_uri(uri)?;
                let versioned = resolve_alias_to_version_uri(self.registry.as_ref(), &alias_ref.name, &alias_ref.alias).await?;
                GATEWAY_METRICS.alias_fallbacks_total.with_label_values(&[self.family.name()]).inc();
                let model = self.loader.load(&versioned).await
                    .map_err(|source| GatewayError::Load { uri: versioned.clone(), source })?;
                Ok((model, versioned))
            }
            Err(source) => Err(GatewayError::Load { uri: uri.to_string(), source }),
        }
    }

    /// Feature count advertised by the resolved model, when known.
    pub async fn expected_feature_count(&self, variant: &str) -> Result<Option<usize>, GatewayError> {
        Ok(self.resolve(variant).await?.and_then(|entry| entry.model.expected_features))
    }

    pub fn clear_cache(&self) -> usize {
        let removed = self.cache.clear();
        info!(family=%self.family, removed, "model cache cleared");
        removed
    }

    pub fn cached_models(&self) -> usize { self.cache.len() }
}
