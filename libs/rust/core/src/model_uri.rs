//! Model URI helpers: cleaning configured values and recognising registry alias references.

use crate::model_registry::RegistryError;

pub(crate) const MODELS_SCHEME: &str = "models:/";
const RUNS_SCHEME: &str = "runs:/";

/// `models:/<name>@<alias>` split into its parts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AliasRef { pub name: String, pub alias: String }

/// Trim a configured URI and strip one layer of enclosing quotes. Blank values are `None`.
pub fn clean_uri(value: Option<&str>) -> Option<String> {
    let trimmed = value?.trim();
    let trimmed = trimmed.strip_prefix(['"', '\'']).unwrap_or(trimmed);
    let trimmed = trimmed.strip_suffix(['"', '\'']).unwrap_or(trimmed);
    if trimmed.trim().is_empty() { None } else { Some(trimmed.to_string()) }
}

/// True for `models:/Name@alias` where `Name` has no `/` before the `@`.
pub fn is_alias_uri(uri: &str) -> bool {
    match uri.strip_prefix(MODELS_SCHEME) {
        Some(tail) => match tail.split_once('@') {
            Some((name, _)) => !name.contains('/'),
            None => false,
        },
        None => false,
    }
}

pub fn parse_alias_uri(uri: &str) -> Result<AliasRef, RegistryError> {
    let tail = uri.strip_prefix(MODELS_SCHEME).unwrap_or(uri);
    let (name, alias) = tail.split_once('@').ok_or_else(|| RegistryError::InvalidAliasUri(uri.to_string()))?;
    let (name, alias) = (name.trim(), alias.trim());
    if name.is_empty() || alias.is_empty() {
        return Err(RegistryError::InvalidAliasUri(uri.to_string()));
    }
    Ok(AliasRef { name: name.to_string(), alias: alias.to_string() })
}

pub fn versioned_uri(name: &str, version: &str) -> String { format!("{MODELS_SCHEME}{name}/{version}") }

/// Run id embedded in a `runs:/<run_id>/<path>` URI.
pub fn run_id_from_uri(uri: &str) -> Option<String> {
    let tail = uri.strip_prefix(RUNS_SCHEME)?;
    let run_id = tail.split('/').next().unwrap_or_default();
    if run_id.is_empty() { None } else { Some(run_id.to_string()) }
}
