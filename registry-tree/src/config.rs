//! Application configuration: app id, vault environment and custom groups.

use crate::error::{RegistryError, Result};
use crate::types::GroupDefinition;
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VaultEnv {
    #[default]
    Prod,
    Dev,
    /// Any other environment name. Treated like production.
    #[serde(other)]
    Other,
}

/// Client configuration as written by the application.
///
/// Field names follow the JSON the client library consumes; fields this crate has no use
/// for are ignored.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppConfig {
    pub app_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vault_env: Option<VaultEnv>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub custom_groups: Option<Vec<GroupDefinition>>,
}

impl AppConfig {
    pub fn from_json(raw: &str) -> Result<Self> {
        serde_json::from_str(raw).map_err(|e| RegistryError::malformed(format!("invalid app config: {e}")))
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .map_err(|e| RegistryError::malformed(format!("cannot read {}: {e}", path.display())))?;
        Self::from_json(&raw)
    }

    /// Inline JSON when `source` starts with `{`, a file path otherwise.
    pub fn load(source: &str) -> Result<Self> {
        if source.trim_start().starts_with('{') {
            Self::from_json(source)
        } else {
            Self::from_file(Path::new(source))
        }
    }

    pub fn dev_mode(&self) -> bool {
        self.vault_env == Some(VaultEnv::Dev)
    }

    pub fn groups(&self) -> &[GroupDefinition] {
        self.custom_groups.as_deref().unwrap_or_default()
    }
}
