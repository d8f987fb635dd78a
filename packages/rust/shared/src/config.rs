//! Application configuration for CheckIO.
//!
//! User config lives at `~/.checkio/checkio.toml`.
//! CLI flags override config file values, which override defaults.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::{CheckIoError, Result};
use crate::types::DisplayPropertySpec;

/// Default configuration file name.
const CONFIG_FILE_NAME: &str = "checkio.toml";

/// Default config directory name under the user's home.
const CONFIG_DIR_NAME: &str = ".checkio";

// ---------------------------------------------------------------------------
// Config structs (matching checkio.toml schema)
// ---------------------------------------------------------------------------

/// Top-level application config, deserialized from TOML.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Asset directory connection settings.
    #[serde(default)]
    pub directory: DirectoryConfig,

    /// Local persistence.
    #[serde(default)]
    pub storage: StorageConfig,

    /// Operator access flags.
    #[serde(default)]
    pub access: AccessConfig,

    /// Columns projected from each asset, in display order.
    #[serde(default = "default_display_properties")]
    pub display_properties: Vec<DisplayPropertySpec>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            directory: DirectoryConfig::default(),
            storage: StorageConfig::default(),
            access: AccessConfig::default(),
            display_properties: default_display_properties(),
        }
    }
}

fn default_display_properties() -> Vec<DisplayPropertySpec> {
    vec![
        DisplayPropertySpec::new("Asset Tag", "asset_tag"),
        DisplayPropertySpec::new("Name", "name"),
        DisplayPropertySpec::new("Serial", "serial"),
        DisplayPropertySpec::new("Model", "model.name"),
    ]
}

/// `[directory]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DirectoryConfig {
    /// API root, e.g. `https://snipeit.example.com/api/v1`.
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Name of the env var holding the API token (never store the token itself).
    #[serde(default = "default_api_token_env")]
    pub api_token_env: String,

    /// Per-request timeout.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Page size for hardware listings.
    #[serde(default = "default_page_limit")]
    pub page_limit: u32,
}

impl Default for DirectoryConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            api_token_env: default_api_token_env(),
            timeout_secs: default_timeout_secs(),
            page_limit: default_page_limit(),
        }
    }
}

impl DirectoryConfig {
    /// Parse `base_url`, normalized to end with a slash so relative joins keep the API prefix.
    pub fn parsed_base_url(&self) -> Result<Url> {
        let mut raw = self.base_url.trim().to_string();
        if !raw.ends_with('/') {
            raw.push('/');
        }
        Url::parse(&raw).map_err(|e| {
            CheckIoError::config(format!("invalid directory.base_url '{}': {e}", self.base_url))
        })
    }
}

fn default_base_url() -> String {
    "https://snipeit.example.com/api/v1".into()
}
fn default_api_token_env() -> String {
    "SNIPEIT_API_TOKEN".into()
}
fn default_timeout_secs() -> u64 {
    10
}
fn default_page_limit() -> u32 {
    500
}

/// `[storage]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Database file; a leading `~/` expands to the home directory.
    #[serde(default = "default_db_path")]
    pub db_path: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            db_path: default_db_path(),
        }
    }
}

fn default_db_path() -> String {
    "~/.checkio/checkio.db".into()
}

/// `[access]` section.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AccessConfig {
    /// Grants the featured-category editing commands.
    #[serde(default)]
    pub admin: bool,
}

// ---------------------------------------------------------------------------
// Config loading
// ---------------------------------------------------------------------------

/// Get the path to the config directory (`~/.checkio/`).
pub fn config_dir() -> Result<PathBuf> {
    let home = dirs::home_dir()
        .ok_or_else(|| CheckIoError::config("could not determine home directory"))?;
    Ok(home.join(CONFIG_DIR_NAME))
}

/// Get the path to the config file (`~/.checkio/checkio.toml`).
pub fn config_file_path() -> Result<PathBuf> {
    Ok(config_dir()?.join(CONFIG_FILE_NAME))
}

/// Load the application config from disk. Returns defaults if the file does not exist.
pub fn load_config() -> Result<AppConfig> {
    let path = config_file_path()?;

    if !path.exists() {
        tracing::debug!(?path, "config file not found, using defaults");
        return Ok(AppConfig::default());
    }

    load_config_from(&path)
}

/// Load the application config from a specific file path.
pub fn load_config_from(path: &Path) -> Result<AppConfig> {
    let content = std::fs::read_to_string(path).map_err(|e| CheckIoError::io(path, e))?;

    toml::from_str(&content).map_err(|e| {
        CheckIoError::config(format!("failed to parse {}: {e}", path.display()))
    })
}

/// Create the config directory and write a default config file.
/// Returns the path to the created file.
pub fn init_config() -> Result<PathBuf> {
    let dir = config_dir()?;
    std::fs::create_dir_all(&dir).map_err(|e| CheckIoError::io(&dir, e))?;

    let path = dir.join(CONFIG_FILE_NAME);
    let config = AppConfig::default();
    let content =
        toml::to_string_pretty(&config).map_err(|e| CheckIoError::config(e.to_string()))?;

    std::fs::write(&path, content).map_err(|e| CheckIoError::io(&path, e))?;
    tracing::info!(?path, "created default config file");

    Ok(path)
}

/// Read the API token from the env var named in the config.
pub fn resolve_api_token(config: &DirectoryConfig) -> Result<String> {
    let var_name = &config.api_token_env;
    match std::env::var(var_name) {
        Ok(val) if !val.trim().is_empty() => Ok(val.trim().to_string()),
        _ => Err(CheckIoError::config(format!(
            "asset directory API token not found. Set the {var_name} environment variable."
        ))),
    }
}

/// Expand a leading `~/` to the user's home directory.
pub fn expand_home(raw: &str) -> Result<PathBuf> {
    match raw.strip_prefix("~/") {
        Some(rest) => {
            let home = dirs::home_dir()
                .ok_or_else(|| CheckIoError::config("could not determine home directory"))?;
            Ok(home.join(rest))
        }
        None => Ok(PathBuf::from(raw)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_serializes() {
        let config = AppConfig::default();
        let toml_str = toml::to_string_pretty(&config).expect("serialize default config");
        assert!(toml_str.contains("base_url"));
        assert!(toml_str.contains("SNIPEIT_API_TOKEN"));
        assert!(toml_str.contains("model.name"));
    }

    #[test]
    fn config_roundtrip() {
        let config = AppConfig::default();
        let toml_str = toml::to_string_pretty(&config).expect("serialize");
        let parsed: AppConfig = toml::from_str(&toml_str).expect("deserialize");
        assert_eq!(parsed.directory.timeout_secs, 10);
        assert_eq!(parsed.directory.page_limit, 500);
        assert_eq!(parsed.display_properties.len(), 4);
        assert!(!parsed.access.admin);
    }

    #[test]
    fn config_with_display_properties() {
        let toml_str = r#"
[directory]
base_url = "https://assets.internal/api/v1"

[access]
admin = true

[[display_properties]]
label = "Serial"
path = "serial"

[[display_properties]]
label = "Model"
path = "model.name"
"#;
        let config: AppConfig = toml::from_str(toml_str).expect("parse");
        assert!(config.access.admin);
        assert_eq!(config.directory.api_token_env, "SNIPEIT_API_TOKEN");
        let labels: Vec<&str> = config
            .display_properties
            .iter()
            .map(|p| p.label.as_str())
            .collect();
        assert_eq!(labels, vec!["Serial", "Model"]);
    }

    #[test]
    fn base_url_gains_trailing_slash() {
        let config = DirectoryConfig {
            base_url: "https://assets.internal/api/v1".into(),
            ..DirectoryConfig::default()
        };
        let url = config.parsed_base_url().expect("parse");
        assert_eq!(url.as_str(), "https://assets.internal/api/v1/");
        assert_eq!(
            url.join("hardware").unwrap().as_str(),
            "https://assets.internal/api/v1/hardware"
        );

        let bad = DirectoryConfig {
            base_url: "not a url".into(),
            ..DirectoryConfig::default()
        };
        assert!(bad.parsed_base_url().is_err());
    }

    #[test]
    fn api_token_resolution() {
        let config = DirectoryConfig {
            // Use a unique env var name to avoid interfering with other tests
            api_token_env: "CHECKIO_TEST_NONEXISTENT_TOKEN_12345".into(),
            ..DirectoryConfig::default()
        };
        let result = resolve_api_token(&config);
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("CHECKIO_TEST_NONEXISTENT_TOKEN_12345"));
    }

    #[test]
    fn expand_home_leaves_absolute_paths() {
        assert_eq!(expand_home("/var/lib/checkio.db").unwrap(), PathBuf::from("/var/lib/checkio.db"));
    }
}
