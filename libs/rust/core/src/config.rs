//! Gateway configuration.
//!
//! Values come from (lowest precedence first) built-in defaults, an optional file named by
//! `GATEWAY_CONFIG_FILE`, and the process environment under the variable names the deployment
//! already uses (`MLFLOW_TRACKING_URI`, `MODEL_URI_PROD`, ...). When a file is configured it is
//! watched and re-read on modification, so lookups always see the current values.

use anyhow::Result;
use notify::{EventKind, RecommendedWatcher, Watcher};
use once_cell::sync::OnceCell;
use parking_lot::RwLock;
use serde::Deserialize;
use std::path::PathBuf;
use std::sync::Arc;

use crate::model_uri::clean_uri;
use crate::variant::{ModelFamily, Variant};

pub type SharedConfig = Arc<RwLock<GatewayConfig>>;

pub(crate) static ACTIVE_CONFIG: OnceCell<SharedConfig> = OnceCell::new();

/// Environment variables read into the configuration, in their deployment spelling.
const ENV_KEYS: &[&str] = &[
    "SERVICE_NAME",
    "LOG_LEVEL",
    "MLFLOW_TRACKING_URI",
    "MODEL_URI_PROD",
    "MODEL_URI_DEV",
    "MODEL_URI_BACKUP",
    "WEAKLINK_MODEL_URI_PROD",
    "WEAKLINK_MODEL_URI_DEV",
    "WEAKLINK_MODEL_URI_BACKUP",
    "BACKEND_PORT",
    "FRONTEND_PORT",
    "BACKEND_URL",
    "MODEL_LOADER",
    "CONFIG_VERSION",
];

#[derive(Debug, Deserialize, Clone)]
pub struct GatewayConfig {
    pub service_name: Option<String>,
    pub log_level: Option<String>,
    pub mlflow_tracking_uri: Option<String>,
    pub model_uri_prod: Option<String>,
    pub model_uri_dev: Option<String>,
    pub model_uri_backup: Option<String>,
    pub weaklink_model_uri_prod: Option<String>,
    pub weaklink_model_uri_dev: Option<String>,
    pub weaklink_model_uri_backup: Option<String>,
    #[serde(default = "default_backend_port")]
    pub backend_port: u16,
    #[serde(default = "default_frontend_port")]
    pub frontend_port: u16,
    pub backend_url: Option<String>,
    #[serde(default)]
    pub model_loader: LoaderKind,
    pub config_version: Option<String>,
}

/// How the gateway "loads" a configured model URI.
#[derive(Debug, Deserialize, Clone, Copy, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LoaderKind {
    /// Record the URI without contacting any serving layer.
    #[default]
    Stub,
    /// Check alias URIs against the registry alias endpoint.
    Registry,
}

fn default_backend_port() -> u16 { 8080 }
fn default_frontend_port() -> u16 { 3030 }

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            service_name: None,
            log_level: Some("info".into()),
            mlflow_tracking_uri: None,
            model_uri_prod: None,
            model_uri_dev: None,
            model_uri_backup: None,
            weaklink_model_uri_prod: None,
            weaklink_model_uri_dev: None,
            weaklink_model_uri_backup: None,
            backend_port: default_backend_port(),
            frontend_port: default_frontend_port(),
            backend_url: None,
            model_loader: LoaderKind::Stub,
            config_version: Some("0".into()),
        }
    }
}

impl GatewayConfig {
    /// Registry base address without a trailing slash.
    pub fn tracking_uri(&self) -> Option<String> {
        clean_uri(self.mlflow_tracking_uri.as_deref()).map(|u| u.trim_end_matches('/').to_string())
    }

    /// Cleaned URI configured for `family` / `variant`, if any.
    pub fn family_uri(&self, family: ModelFamily, variant: Variant) -> Option<String> {
        let raw = match (family, variant) {
            (ModelFamily::Primary, Variant::Champion) => &self.model_uri_prod,
            (ModelFamily::Primary, Variant::Latest) => &self.model_uri_dev,
            (ModelFamily::Primary, Variant::Backup) => &self.model_uri_backup,
            (ModelFamily::WeakestLink, Variant::Champion) => &self.weaklink_model_uri_prod,
            (ModelFamily::WeakestLink, Variant::Latest) => &self.weaklink_model_uri_dev,
            (ModelFamily::WeakestLink, Variant::Backup) => &self.weaklink_model_uri_backup,
        };
        clean_uri(raw.as_deref())
    }

    pub fn into_shared(self) -> SharedConfig { Arc::new(RwLock::new(self)) }
}

/// Build a configuration snapshot from defaults, the optional file and the environment.
pub fn build_config(service: &str) -> Result<GatewayConfig> {
    let mut builder = config::Config::builder()
        .set_default("service_name", service)?
        .set_default("log_level", "info")?
        .set_default("backend_port", 8080_i64)?
        .set_default("frontend_port", 3030_i64)?
        .set_default("model_loader", "stub")?;
    if let Some(file) = config_file() {
        builder = builder.add_source(config::File::from(file).required(false));
    }
    for key in ENV_KEYS {
        let value = std::env::var(key).ok().filter(|v| !v.trim().is_empty());
        builder = builder.set_override_option(key.to_ascii_lowercase(), value)?;
    }
    Ok(builder.build()?.try_deserialize()?)
}

/// Load the configuration once and keep it current. Must be called inside a tokio runtime
/// when `GATEWAY_CONFIG_FILE` is set (the file watcher is a spawned task).
pub async fn load_config(service: &str) -> Result<SharedConfig> {
    let cfg = build_config(service)?;
    let shared = ACTIVE_CONFIG.get_or_init(|| cfg.clone().into_shared()).clone();
    *shared.write() = cfg;
    if let Some(file) = config_file() { spawn_file_watcher(file, service.to_string(), shared.clone()); }
    Ok(shared)
}

fn config_file() -> Option<PathBuf> {
    std::env::var("GATEWAY_CONFIG_FILE").ok().filter(|f| !f.trim().is_empty()).map(PathBuf::from)
}

fn spawn_file_watcher(path: PathBuf, service: String, shared: SharedConfig) {
    tokio::spawn(async move {
        if let Err(e) = watch_loop(path, service, shared).await { tracing::warn!(error=?e, "config watch loop exited"); }
    });
}

async fn watch_loop(path: PathBuf, service: String, shared: SharedConfig) -> Result<()> {
    use tokio::sync::mpsc;
    let (tx, mut rx) = mpsc::channel(8);
    let mut watcher = RecommendedWatcher::new(move |res| { let _ = tx.blocking_send(res); }, notify::Config::default())?;
    watcher.watch(&path, notify::RecursiveMode::NonRecursive)?;
    while let Some(evt) = rx.recv().await {
        if let Ok(ev) = evt {
            if matches!(ev.kind, EventKind::Modify(_)) { refresh(&service, &shared); }
        }
    }
    Ok(())
}

fn refresh(service: &str, shared: &SharedConfig) {
    match build_config(service) {
        Ok(cfg) => {
            tracing::info!(config_version=?cfg.config_version, "config reloaded");
            *shared.write() = cfg;
        }
        Err(e) => tracing::warn!(error=%e, "config reload failed, keeping previous values"),
    }
}
