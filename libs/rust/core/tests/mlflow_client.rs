//! Exercises the MLflow REST client against an in-process stand-in of the registry endpoints.

use std::collections::HashMap;
use std::sync::Arc;

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use gateway_core::{lookup_run_id, resolve_alias_to_version_uri, GatewayConfig, MlflowRegistry, ModelRegistry, RegistryError};
use parking_lot::Mutex;
use serde_json::{json, Value};

#[derive(Clone, Default)]
struct FakeMlflow {
    aliases: Arc<Mutex<HashMap<String, String>>>,
    search_calls: Arc<Mutex<Vec<HashMap<String, String>>>>,
    alias_support: bool,
}

async fn search(State(st): State<FakeMlflow>, Query(q): Query<HashMap<String, String>>) -> impl IntoResponse {
    st.search_calls.lock().push(q.clone());
    match q.get("filter").map(String::as_str) {
        Some("name='Project_Model'") => {
            if q.get("page_token").map(String::as_str) == Some("page-2") {
                Json(json!({"model_versions": [{"name": "Project_Model", "version": "1", "current_stage": "None"}]}))
            } else {
                Json(json!({
                    "model_versions": [
                        {"name": "Project_Model", "version": "3", "current_stage": "None", "run_id": "r3"},
                        {"name": "Project_Model", "version": "5", "current_stage": "Production", "run_id": "r5"}
                    ],
                    "next_page_token": "page-2"
                }))
            }
        }
        _ => Json(json!({})),
    }
}

async fn get_version(Query(q): Query<HashMap<String, String>>) -> axum::response::Response {
    match (q.get("name").map(String::as_str), q.get("version").map(String::as_str)) {
        (Some("Project_Model"), Some(v)) if v == "3" || v == "5" => {
            Json(json!({"model_version": {"name": "Project_Model", "version": v, "run_id": format!("r{v}")}})).into_response()
        }
        _ => (StatusCode::NOT_FOUND, Json(json!({"error_code": "RESOURCE_DOES_NOT_EXIST", "message": "no such version"}))).into_response(),
    }
}

async fn get_alias(State(st): State<FakeMlflow>, Query(q): Query<HashMap<String, String>>) -> axum::response::Response {
    if !st.alias_support {
        return (StatusCode::BAD_REQUEST, Json(json!({"error_code": "INVALID_PARAMETER_VALUE", "message": "aliases are not supported"}))).into_response();
    }
    let alias = q.get("alias").cloned().unwrap_or_default();
    match st.aliases.lock().get(&alias) {
        Some(v) => Json(json!({"model_version": {"name": q.get("name"), "version": v, "aliases": [alias]}})).into_response(),
        None => (StatusCode::NOT_FOUND, Json(json!({"error_code": "RESOURCE_DOES_NOT_EXIST", "message": "no such alias"}))).into_response(),
    }
}

async fn set_alias(State(st): State<FakeMlflow>, Json(body): Json<Value>) -> impl IntoResponse {
    let alias = body["alias"].as_str().unwrap_or_default().to_string();
    let version = body["version"].as_str().unwrap_or_default().to_string();
    st.aliases.lock().insert(alias, version);
    Json(json!({}))
}

async fn delete_alias(State(st): State<FakeMlflow>, Query(q): Query<HashMap<String, String>>) -> impl IntoResponse {
    st.aliases.lock().remove(q.get("alias").map(String::as_str).unwrap_or_default());
    Json(json!({}))
}

async fn start(fake: FakeMlflow) -> String {
    let app = Router::new()
        .route("/api/2.0/mlflow/model-versions/search", get(search))
        .route("/api/2.0/mlflow/model-versions/get", get(get_version))
        .route("/api/2.0/mlflow/registered-models/alias", get(get_alias).post(set_alias).delete(delete_alias))
        .with_state(fake);
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move { axum::serve(listener, app).await.unwrap(); });
    format!("http://{addr}/")
}

fn registry_for(base: Option<String>) -> MlflowRegistry {
    let cfg = GatewayConfig { mlflow_tracking_uri: base, ..Default::default() };
    MlflowRegistry::new(cfg.into_shared())
}

#[tokio::test]
async fn search_follows_page_tokens() {
    let fake = FakeMlflow::default();
    let base = start(fake.clone()).await;
    let registry = registry_for(Some(base));
    let versions = registry.search_model_versions("Project_Model").await.unwrap();
    let mut numbers: Vec<_> = versions.iter().map(|v| v.version.clone()).collect();
    numbers.sort();
    assert_eq!(numbers, vec!["1", "3", "5"]);
    assert_eq!(fake.search_calls.lock().len(), 2);
}

#[tokio::test]
async fn alias_resolution_over_http() {
    let base = start(FakeMlflow::default()).await;
    let registry = registry_for(Some(base));
    assert_eq!(resolve_alias_to_version_uri(&registry, "Project_Model", "prod").await.unwrap(), "models:/Project_Model/5");
    assert_eq!(resolve_alias_to_version_uri(&registry, "Project_Model", "backup").await.unwrap(), "models:/Project_Model/3");
}

#[tokio::test]
async fn empty_search_names_the_model() {
    let base = start(FakeMlflow::default()).await;
    let registry = registry_for(Some(base));
    let err = resolve_alias_to_version_uri(&registry, "Unknown_Model", "dev").await.unwrap_err();
    assert!(matches!(err, RegistryError::AliasResolution { .. }));
    assert!(err.to_string().contains("Unknown_Model"), "{err}");
}

#[tokio::test]
async fn alias_rejection_is_invalid_parameter() {
    let base = start(FakeMlflow { alias_support: false, ..Default::default() }).await;
    let registry = registry_for(Some(base));
    let err = registry.get_model_version_by_alias("Project_Model", "dev").await.unwrap_err();
    assert!(err.is_invalid_parameter(), "{err}");
}

#[tokio::test]
async fn set_then_get_alias() {
    let fake = FakeMlflow { alias_support: true, ..Default::default() };
    let base = start(fake.clone()).await;
    let registry = registry_for(Some(base));
    registry.set_registered_model_alias("Project_Model", "prod", "5").await.unwrap();
    let mv = registry.get_model_version_by_alias("Project_Model", "prod").await.unwrap();
    assert_eq!(mv.version, "5");
    let missing = registry.get_model_version_by_alias("Project_Model", "backup").await.unwrap_err();
    assert!(matches!(missing, RegistryError::Api { status: 404, .. }));

    registry.delete_registered_model_alias("Project_Model", "prod").await.unwrap();
    assert!(fake.aliases.lock().is_empty());
}

#[tokio::test]
async fn unset_tracking_uri_fails_before_any_request() {
    let registry = registry_for(None);
    let err = registry.search_model_versions("Project_Model").await.unwrap_err();
    assert!(matches!(err, RegistryError::NotConfigured));
}

#[tokio::test]
async fn run_id_comes_from_version_lookup() {
    let base = start(FakeMlflow::default()).await;
    let registry = registry_for(Some(base));
    let mv = registry.get_model_version("Project_Model", "5").await.unwrap();
    assert_eq!(mv.run_id.as_deref(), Some("r5"));
    assert_eq!(lookup_run_id(&registry, "models:/Project_Model/3").await.unwrap().as_deref(), Some("r3"));
    // alias endpoint refuses, so the search policy picks version 5 for prod
    assert_eq!(lookup_run_id(&registry, "models:/Project_Model@prod").await.unwrap().as_deref(), Some("r5"));
    let missing = registry.get_model_version("Project_Model", "9").await.unwrap_err();
    assert!(matches!(missing, RegistryError::Api { status: 404, .. }));
}
