//! Logical model roles and the model families served by the gateway.
//!
//! A variant names a role (champion / latest / backup) independently of the concrete
//! registry version behind it. Parsing is case-insensitive and ignores surrounding whitespace.

use std::fmt;
use std::str::FromStr;
use serde::{Serialize, Deserialize};
use thiserror::Error;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Variant { Champion, Latest, Backup }

#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("unrecognized variant '{0}'")]
pub struct UnknownVariant(pub String);

impl Variant {
    pub fn as_str(&self) -> &'static str {
        match self { Variant::Champion => "champion", Variant::Latest => "latest", Variant::Backup => "backup" }
    }
}

impl FromStr for Variant {
    type Err = UnknownVariant;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "champion" | "best" | "prod" | "production" => Ok(Variant::Champion),
            "latest" | "dev" | "development" => Ok(Variant::Latest),
            "backup" => Ok(Variant::Backup),
            _ => Err(UnknownVariant(s.to_string())),
        }
    }
}

impl fmt::Display for Variant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(self.as_str()) }
}

/// Independent model families. Each has its own set of configured URIs but shares the
/// resolution logic.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum ModelFamily {
    /// Numeric prediction models (`MODEL_URI_*`).
    Primary,
    /// "Weakest-link" classification models (`WEAKLINK_MODEL_URI_*`).
    WeakestLink,
}

impl ModelFamily {
    pub fn name(&self) -> &'static str {
        match self { ModelFamily::Primary => "primary", ModelFamily::WeakestLink => "weakest-link" }
    }

    /// Whether a variant without a configured URI is an error rather than "no model".
    pub fn requires_uri(&self) -> bool { matches!(self, ModelFamily::WeakestLink) }
}

impl fmt::Display for ModelFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(self.name()) }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn champion_family_spellings() {
        for raw in ["champion", "best", "prod", "production", "  PROD ", "Champion"] {
            assert_eq!(raw.parse::<Variant>().unwrap(), Variant::Champion, "{raw}");
        }
    }

    #[test]
    fn latest_and_backup() {
        assert_eq!("dev".parse::<Variant>().unwrap(), Variant::Latest);
        assert_eq!("Development".parse::<Variant>().unwrap(), Variant::Latest);
        assert_eq!(" backup\n".parse::<Variant>().unwrap(), Variant::Backup);
    }

    #[test]
    fn unknown_keeps_input() {
        let err = "staging".parse::<Variant>().unwrap_err();
        assert_eq!(err.0, "staging");
        assert!(err.to_string().contains("staging"));
    }
}
