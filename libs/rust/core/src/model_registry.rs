//! Model registry access (MLflow REST API) and the alias → version selection policy.
//!
//! The gateway only needs a narrow slice of the registry: listing the versions of a registered
//! model and reading / moving aliases. [`ModelRegistry`] is the seam; [`MlflowRegistry`] is the
//! HTTP implementation. Calls are made once, without retries.

use async_trait::async_trait;
use reqwest::{Response, StatusCode};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::config::SharedConfig;
use crate::metrics::GATEWAY_METRICS;
use crate::model_uri::{is_alias_uri, parse_alias_uri, run_id_from_uri, versioned_uri, MODELS_SCHEME};

const SEARCH_PATH: &str = "/api/2.0/mlflow/model-versions/search";
const GET_VERSION_PATH: &str = "/api/2.0/mlflow/model-versions/get";
const ALIAS_PATH: &str = "/api/2.0/mlflow/registered-models/alias";

/// Registry error code returned when the registry rejects an argument (e.g. alias lookups on
/// registries without alias support).
pub const INVALID_PARAMETER_VALUE: &str = "INVALID_PARAMETER_VALUE";

#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("MLFLOW_TRACKING_URI is not set")]
    NotConfigured,
    #[error("registry request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("{error_code}: {message}")]
    Api { status: u16, error_code: String, message: String },
    #[error("No versions found for model '{0}'")]
    NoVersions(String),
    #[error("model version '{0}' is not a number")]
    InvalidVersion(String),
    #[error("Invalid models alias uri: {0}")]
    InvalidAliasUri(String),
    #[error("Failed to resolve alias for model {model}: {source}")]
    AliasResolution { model: String, source: Box<RegistryError> },
}

impl RegistryError {
    pub fn is_invalid_parameter(&self) -> bool {
        matches!(self, RegistryError::Api { error_code, .. } if error_code == INVALID_PARAMETER_VALUE)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct ModelVersion {
    #[serde(default)]
    pub name: String,
    pub version: String,
    #[serde(default)]
    pub current_stage: Option<String>,
    #[serde(default)]
    pub source: Option<String>,
    #[serde(default)]
    pub run_id: Option<String>,
    #[serde(default)]
    pub aliases: Vec<String>,
}

impl ModelVersion {
    pub fn version_number(&self) -> Result<u64, RegistryError> {
        self.version.trim().parse().map_err(|_| RegistryError::InvalidVersion(self.version.clone()))
    }

    pub fn is_production(&self) -> bool {
        self.current_stage.as_deref().map(|s| s.eq_ignore_ascii_case("production")).unwrap_or(false)
    }
}

#[async_trait]
pub trait ModelRegistry: Send + Sync {
    /// All versions registered under exactly `name`.
    async fn search_model_versions(&self, name: &str) -> Result<Vec<ModelVersion>, RegistryError>;

    /// One version of `name`. Registries without a direct lookup can rely on the search.
    async fn get_model_version(&self, name: &str, version: &str) -> Result<ModelVersion, RegistryError> {
        self.search_model_versions(name).await?
            .into_iter()
            .find(|mv| mv.version.trim() == version.trim())
            .ok_or_else(|| RegistryError::Api {
                status: 404,
                error_code: "RESOURCE_DOES_NOT_EXIST".into(),
                message: format!("Model version (name={name}, version={version}) not found"),
            })
    }

    async fn get_model_version_by_alias(&self, name: &str, alias: &str) -> Result<ModelVersion, RegistryError>;
    async fn set_registered_model_alias(&self, name: &str, alias: &str, version: &str) -> Result<(), RegistryError>;
    async fn delete_registered_model_alias(&self, name: &str, alias: &str) -> Result<(), RegistryError>;
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    model_versions: Vec<ModelVersion>,
    #[serde(default)]
    next_page_token: Option<String>,
}

/// Body of both the alias lookup and the version lookup.
#[derive(Debug, Deserialize)]
struct ModelVersionResponse { model_version: ModelVersion }

#[derive(Debug, Serialize)]
struct SetAliasRequest<'a> { name: &'a str, alias: &'a str, version: &'a str }

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    error_code: Option<String>,
    message: Option<String>,
}

/// MLflow REST client. The tracking URI is read from the live configuration on every call.
#[derive(Clone)]
pub struct MlflowRegistry {
    http: reqwest::Client,
    config: SharedConfig,
}

impl MlflowRegistry {
    pub fn new(config: SharedConfig) -> Self { Self::with_client(reqwest::Client::new(), config) }

    pub fn with_client(http: reqwest::Client, config: SharedConfig) -> Self { Self { http, config } }

    fn url(&self, path: &str) -> Result<String, RegistryError> {
        let base = self.config.read().tracking_uri().ok_or(RegistryError::NotConfigured)?;
        Ok(format!("{base}{path}"))
    }

    async fn check(resp: Response) -> Result<Response, RegistryError> {
        let status = resp.status();
        if status.is_success() { return Ok(resp); }
        let text = resp.text().await.unwrap_or_default();
        let body: Option<ApiErrorBody> = serde_json::from_str(&text).ok();
        let (error_code, message) = match body {
            Some(b) => (b.error_code, b.message),
            None => (None, None),
        };
        Err(RegistryError::Api {
            status: status.as_u16(),
            error_code: error_code.unwrap_or_else(|| canonical(status)),
            message: message.unwrap_or(text),
        })
    }
}

fn canonical(status: StatusCode) -> String {
    status.canonical_reason().map(|r| r.to_uppercase().replace(' ', "_")).unwrap_or_else(|| status.as_str().to_string())
}

fn observe<T>(operation: &str, res: &Result<T, RegistryError>) {
    let outcome = if res.is_ok() { "ok" } else { "error" };
    GATEWAY_METRICS.registry_requests_total.with_label_values(&[operation, outcome]).inc();
}

#[async_trait]
impl ModelRegistry for MlflowRegistry {
    async fn search_model_versions(&self, name: &str) -> Result<Vec<ModelVersion>, RegistryError> {
        let url = self.url(SEARCH_PATH)?;
        let filter = format!("name='{name}'");
        let mut versions = Vec::new();
        let mut page_token: Option<String> = None;
        let res: Result<(), RegistryError> = loop {
            let mut query = vec![("filter", filter.as_str())];
            if let Some(token) = page_token.as_deref() { query.push(("page_token", token)); }
            let resp = match self.http.get(&url).query(&query).send().await {
                Ok(r) => r,
                Err(e) => break Err(e.into()),
            };
            let page: SearchResponse = match Self::check(resp).await {
                Ok(r) => match r.json().await { Ok(p) => p, Err(e) => break Err(e.into()) },
                Err(e) => break Err(e),
            };
            versions.extend(page.model_versions);
            match page.next_page_token.filter(|t| !t.is_empty()) {
                Some(token) => page_token = Some(token),
                None => break Ok(()),
            }
        };
        observe("search_model_versions", &res);
        res?;
        debug!(model=%name, count=versions.len(), "model versions listed");
        Ok(versions)
    }

    async fn get_model_version(&self, name: &str, version: &str) -> Result<ModelVersion, RegistryError> {
        let url = self.url(GET_VERSION_PATH)?;
        let res: Result<ModelVersion, RegistryError> = async {
            let resp = self.http.get(&url).query(&[("name", name), ("version", version)]).send().await?;
            let body: ModelVersionResponse = Self::check(resp).await?.json().await?;
            Ok::<_, RegistryError>(body.model_version)
        }.await;
        observe("get_model_version", &res);
        res
    }

    async fn get_model_version_by_alias(&self, name: &str, alias: &str) -> Result<ModelVersion, RegistryError> {
        let url = self.url(ALIAS_PATH)?;
        let res: Result<ModelVersion, RegistryError> = async {
            let resp = self.http.get(&url).query(&[("name", name), ("alias", alias)]).send().await?;
            let body: ModelVersionResponse = Self::check(resp).await?.json().await?;
            Ok::<_, RegistryError>(body.model_version)
        }.await;
        observe("get_model_version_by_alias", &res);
        res
    }

    async fn set_registered_model_alias(&self, name: &str, alias: &str, version: &str) -> Result<(), RegistryError> {
        let url = self.url(ALIAS_PATH)?;
        let res: Result<(), RegistryError> = async {
            let resp = self.http.post(&url).json(&SetAliasRequest { name, alias, version }).send().await?;
            Self::check(resp).await?;
            Ok::<_, RegistryError>(())
        }.await;
        observe("set_registered_model_alias", &res);
        res
    }

    async fn delete_registered_model_alias(&self, name: &str, alias: &str) -> Result<(), RegistryError> {
        let url = self.url(ALIAS_PATH)?;
        let res: Result<(), RegistryError> = async {
            let resp = self.http.delete(&url).query(&[("name", name), ("alias", alias)]).send().await?;
            Self::check(resp).await?;
            Ok::<_, RegistryError>(())
        }.await;
        observe("delete_registered_model_alias", &res);
        res
    }
}

/// Pick the version an alias should point at.
///
/// Versions are ranked by numeric version, highest first:
/// - `prod` / `production`: highest version whose stage is `Production`, else the highest version
/// - `dev` / `latest`: highest version
/// - `backup`: second-highest version (the highest when only one exists)
/// - anything else: highest version
pub fn select_version<'a>(name: &str, versions: &'a [ModelVersion], alias: &str) -> Result<&'a ModelVersion, RegistryError> {
    let mut ranked = versions.iter()
        .map(|mv| mv.version_number().map(|n| (n, mv)))
        .collect::<Result<Vec<_>, _>>()?;
    ranked.sort_by(|a, b| b.0.cmp(&a.0));
    let Some(&(_, latest)) = ranked.first() else { return Err(RegistryError::NoVersions(name.to_string())); };
    let second_latest = ranked.get(1).map(|(_, mv)| *mv).unwrap_or(latest);

    let chosen = match alias.trim().to_lowercase().as_str() {
        "prod" | "production" => ranked.iter().map(|(_, mv)| *mv).find(|mv| mv.is_production()).unwrap_or(latest),
        "dev" | "latest" => latest,
        "backup" => second_latest,
        other => {
            warn!(model=%name, alias=%other, version=%latest.version, "unknown alias, using latest version");
            latest
        }
    };
    Ok(chosen)
}

/// Resolve `name@alias` to `models:/<name>/<version>` by listing the registry's versions.
pub async fn resolve_alias_to_version_uri(registry: &dyn ModelRegistry, name: &str, alias: &str) -> Result<String, RegistryError> {
    let wrap = |source: RegistryError| RegistryError::AliasResolution { model: name.to_string(), source: Box::new(source) };
    let versions = registry.search_model_versions(name).await.map_err(wrap)?;
    let chosen = select_version(name, &versions, alias).map_err(wrap)?;
    info!(model=%name, alias=%alias, version=%chosen.version, "alias resolved");
    Ok(versioned_uri(name, &chosen.version))
}

/// Training run that produced the model behind `uri`.
///
/// `runs:/` URIs carry the id directly. Alias URIs ask the alias endpoint first and fall back to
/// the version-search policy when the registry refuses. `models:/<name>/<version>` reads that
/// version; `models:/<name>/<stage>` takes the highest version in the stage.
pub async fn lookup_run_id(registry: &dyn ModelRegistry, uri: &str) -> Result<Option<String>, RegistryError> {
    if let Some(run_id) = run_id_from_uri(uri) { return Ok(Some(run_id)); }

    let target = if is_alias_uri(uri) {
        let alias_ref = parse_alias_uri(uri)?;
        match registry.get_model_version_by_alias(&alias_ref.name, &alias_ref.alias).await {
            Ok(mv) => return Ok(non_empty(mv.run_id)),
            Err(e) => {
                debug!(%uri, error=%e, "alias lookup failed, using version search");
                resolve_alias_to_version_uri(registry, &alias_ref.name, &alias_ref.alias).await?
            }
        }
    } else {
        uri.to_string()
    };

    let Some(tail) = target.strip_prefix(MODELS_SCHEME) else { return Ok(None) };
    let mut parts = tail.splitn(3, '/').map(str::trim);
    let (Some(name), Some(selector)) = (parts.next(), parts.next()) else { return Ok(None) };
    if name.is_empty() || selector.is_empty() { return Ok(None); }

    if selector.chars().all(|c| c.is_ascii_digit()) {
        return Ok(non_empty(registry.get_model_version(name, selector).await?.run_id));
    }
    let versions = registry.search_model_versions(name).await?;
    let in_stage = versions.into_iter()
        .filter(|mv| mv.current_stage.as_deref().is_some_and(|s| s.eq_ignore_ascii_case(selector)))
        .filter_map(|mv| mv.version_number().ok().map(|n| (n, mv)))
        .max_by_key(|(n, _)| *n);
    Ok(in_stage.and_then(|(_, mv)| non_empty(mv.run_id)))
}

fn non_empty(run_id: Option<String>) -> Option<String> { run_id.filter(|r| !r.trim().is_empty()) }
