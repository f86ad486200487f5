//! Project-local configuration file.

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::warn;

use super::{ConfigError, ConfigResult};

/// Name of the configuration file looked up in the working directory.
pub const CONFIG_FILENAME: &str = ".ghostImports.json";

/// Configuration file schema. Every field is optional; missing fields fall
/// back to command-line flags and then to defaults.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfigFile {
    pub include_files: Option<Vec<String>>,
    pub exclude_files: Option<Vec<String>>,
    pub dev_files: Option<Vec<String>>,
    pub exclude_packages: Option<Vec<String>>,
    pub always_peer_dependencies: Option<Vec<String>>,
    pub fix: Option<bool>,
    pub skip_root: Option<bool>,
    pub registry_url: Option<String>,
    /// Captures unknown fields for warnings.
    #[serde(flatten, skip_serializing)]
    pub unknown_fields: BTreeMap<String, serde_json::Value>,
}

/// Load config from an explicit path.
pub fn load_config_from_path(path: &Path) -> ConfigResult<ConfigFile> {
    let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;

    let config: ConfigFile =
        serde_json::from_str(&content).map_err(|source| ConfigError::Json {
            path: path.to_path_buf(),
            source,
        })?;

    for key in config.unknown_fields.keys() {
        warn!(field = %key, path = %path.display(), "unknown config field will be ignored");
    }

    Ok(config)
}

/// Auto-discover config in a directory. Returns `None` if not found.
pub fn discover_config(dir: &Path) -> ConfigResult<Option<ConfigFile>> {
    let config_path = dir.join(CONFIG_FILENAME);

    if !config_path.is_file() {
        return Ok(None);
    }

    load_config_from_path(&config_path).map(Some)
}
