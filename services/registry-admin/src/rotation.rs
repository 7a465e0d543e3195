//! Alias rotation between the `dev`, `prod` and `backup` slots of a registered model.
//!
//! All source aliases are read before any write, so a missing alias aborts the rotation with
//! the registry untouched.

use std::fmt;

use gateway_core::{ModelRegistry, RegistryError};
use tracing::info;

pub const DEV: &str = "dev";
pub const PROD: &str = "prod";
pub const BACKUP: &str = "backup";

/// One alias reassignment performed by a rotation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AliasMove {
    pub from: &'static str,
    pub to: &'static str,
    pub version: String,
}

impl fmt::Display for AliasMove {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "@{} -> @{} (version {})", self.from, self.to, self.version)
    }
}

async fn version_of(registry: &dyn ModelRegistry, model: &str, alias: &str) -> Result<String, RegistryError> {
    Ok(registry.get_model_version_by_alias(model, alias).await?.version)
}

async fn apply(registry: &dyn ModelRegistry, model: &str, moves: &[AliasMove]) -> Result<(), RegistryError> {
    for mv in moves {
        registry.set_registered_model_alias(model, mv.to, &mv.version).await?;
        info!(%model, from=mv.from, to=mv.to, version=%mv.version, "alias moved");
    }
    Ok(())
}

/// `@dev` becomes `@prod`, the old `@prod` becomes `@backup` and the old `@backup` takes `@dev`.
pub async fn promote(registry: &dyn ModelRegistry, model: &str) -> Result<Vec<AliasMove>, RegistryError> {
    let dev = version_of(registry, model, DEV).await?;
    let prod = version_of(registry, model, PROD).await?;
    let backup = version_of(registry, model, BACKUP).await?;
    let moves = vec![
        AliasMove { from: PROD, to: BACKUP, version: prod },
        AliasMove { from: DEV, to: PROD, version: dev },
        AliasMove { from: BACKUP, to: DEV, version: backup },
    ];
    apply(registry, model, &moves).await?;
    Ok(moves)
}

/// Swap `@prod` and `@backup`.
pub async fn revert(registry: &dyn ModelRegistry, model: &str) -> Result<Vec<AliasMove>, RegistryError> {
    let backup = version_of(registry, model, BACKUP).await?;
    let prod = version_of(registry, model, PROD).await?;
    let moves = vec![
        AliasMove { from: BACKUP, to: PROD, version: backup },
        AliasMove { from: PROD, to: BACKUP, version: prod },
    ];
    apply(registry, model, &moves).await?;
    Ok(moves)
}

/// Remove `alias` from `model`, returning the version it pointed at.
pub async fn unset(registry: &dyn ModelRegistry, model: &str, alias: &str) -> Result<String, RegistryError> {
    let version = version_of(registry, model, alias).await?;
    registry.delete_registered_model_alias(model, alias).await?;
    info!(%model, %alias, %version, "alias removed");
    Ok(version)
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use gateway_core::ModelVersion;
    use parking_lot::Mutex;
    use std::collections::HashMap;

    #[derive(Default)]
    struct MemoryRegistry {
        aliases: Mutex<HashMap<String, String>>,
        writes: Mutex<usize>,
    }

    impl MemoryRegistry {
        fn with(aliases: &[(&str, &str)]) -> Self {
            let reg = Self::default();
            reg.aliases.lock().extend(aliases.iter().map(|(a, v)| (a.to_string(), v.to_string())));
            reg
        }
        fn alias(&self, alias: &str) -> Option<String> { self.aliases.lock().get(alias).cloned() }
    }

    #[async_trait]
    impl ModelRegistry for MemoryRegistry {
        async fn search_model_versions(&self, _name: &str) -> Result<Vec<ModelVersion>, RegistryError> { Ok(vec![]) }
        async fn get_model_version_by_alias(&self, name: &str, alias: &str) -> Result<ModelVersion, RegistryError> {
            match self.alias(alias) {
                Some(version) => Ok(ModelVersion { name: name.into(), version, aliases: vec![alias.into()], ..Default::default() }),
                None => Err(RegistryError::Api { status: 404, error_code: "RESOURCE_DOES_NOT_EXIST".into(), message: format!("no alias {alias}") }),
            }
        }
        async fn set_registered_model_alias(&self, _name: &str, alias: &str, version: &str) -> Result<(), RegistryError> {
            *self.writes.lock() += 1;
            self.aliases.lock().insert(alias.into(), version.into());
            Ok(())
        }
        async fn delete_registered_model_alias(&self, _name: &str, alias: &str) -> Result<(), RegistryError> {
            *self.writes.lock() += 1;
            self.aliases.lock().remove(alias);
            Ok(())
        }
    }

    #[tokio::test]
    async fn promote_rotates_all_three_slots() {
        let reg = MemoryRegistry::with(&[("dev", "7"), ("prod", "5"), ("backup", "3")]);
        let moves = promote(&reg, "Project_Model").await.unwrap();
        assert_eq!(moves.len(), 3);
        assert_eq!(reg.alias("prod").as_deref(), Some("7"));
        assert_eq!(reg.alias("backup").as_deref(), Some("5"));
        assert_eq!(reg.alias("dev").as_deref(), Some("3"));
    }

    #[tokio::test]
    async fn promote_without_backup_changes_nothing() {
        let reg = MemoryRegistry::with(&[("dev", "7"), ("prod", "5")]);
        assert!(promote(&reg, "Project_Model").await.is_err());
        assert_eq!(*reg.writes.lock(), 0);
        assert_eq!(reg.alias("prod").as_deref(), Some("5"));
    }

    #[tokio::test]
    async fn revert_swaps_prod_and_backup() {
        let reg = MemoryRegistry::with(&[("dev", "7"), ("prod", "5"), ("backup", "3")]);
        let moves = revert(&reg, "Project_Model").await.unwrap();
        assert_eq!(moves[0].to_string(), "@backup -> @prod (version 3)");
        assert_eq!(reg.alias("prod").as_deref(), Some("3"));
        assert_eq!(reg.alias("backup").as_deref(), Some("5"));
        assert_eq!(reg.alias("dev").as_deref(), Some("7"));
    }

    #[tokio::test]
    async fn unset_removes_only_the_named_alias() {
        let reg = MemoryRegistry::with(&[("prod", "5"), ("backup", "3")]);
        assert_eq!(unset(&reg, "Project_Model", "backup").await.unwrap(), "3");
        assert_eq!(reg.alias("backup"), None);
        assert_eq!(reg.alias("prod").as_deref(), Some("5"));

        let err = unset(&reg, "Project_Model", "backup").await.unwrap_err();
        assert!(matches!(err, RegistryError::Api { status: 404, .. }));
        assert_eq!(*reg.writes.lock(), 1);
    }
}
