use crate::error::ConfigError;
use crate::generation::gemini::DEFAULT_BASE_URL;
use crate::session::scenario::ScenarioKey;
use serde::Deserialize;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

const APP_DIR: &str = "scenechat";
const CONFIG_FILE: &str = "config.toml";

/// Host-owned settings, read once at startup from
/// `<config dir>/scenechat/config.toml`. Every field is optional in the file.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub default_model: String,
    pub default_scenario: ScenarioKey,
    pub api_base_url: String,
    /// Defaults to `storage.json` next to the config file.
    pub storage_file: Option<PathBuf>,
    pub storage_key: String,
    pub window_width: f32,
    pub window_height: f32,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            default_model: "gemini-2.5-flash".to_string(),
            default_scenario: ScenarioKey::Food,
            api_base_url: DEFAULT_BASE_URL.to_string(),
            storage_file: None,
            storage_key: "scenechat.api_key".to_string(),
            window_width: 720.0,
            window_height: 860.0,
        }
    }
}

impl AppConfig {
    pub fn config_dir() -> Result<PathBuf, ConfigError> {
        dirs::config_dir()
            .map(|dir| dir.join(APP_DIR))
            .ok_or(ConfigError::ConfigDirNotFound)
    }

    /// Loads the user config, falling back to defaults when the file does
    /// not exist.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(&Self::config_dir()?.join(CONFIG_FILE))
    }

    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let raw = match fs::read_to_string(path) {
            Ok(raw) => raw,
            Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(Self::default()),
            Err(source) => {
                return Err(ConfigError::Read {
                    path: path.to_path_buf(),
                    source,
                })
            }
        };
        toml::from_str(&raw).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn storage_path(&self) -> Result<PathBuf, ConfigError> {
        match &self.storage_file {
            Some(path) => Ok(path.clone()),
            None => Ok(Self::config_dir()?.join("storage.json")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::AppConfig;
    use crate::error::ConfigError;
    use crate::session::scenario::ScenarioKey;
    use std::fs;
    use std::path::PathBuf;

    #[test]
    fn missing_file_yields_defaults() {
        let dir = tempfile::tempdir().expect("tempdir should be created");
        let config = AppConfig::load_from(&dir.path().join("config.toml")).expect("load");
        assert_eq!(config, AppConfig::default());
    }

    #[test]
    fn partial_file_overrides_only_named_fields() {
        let dir = tempfile::tempdir().expect("tempdir should be created");
        let path = dir.path().join("config.toml");
        fs::write(
            &path,
            "default_model = \"gemini-2.0-flash\"\ndefault_scenario = \"life\"\nstorage_file = \"/tmp/keys.json\"\n",
        )
        .expect("fixture should write");

        let config = AppConfig::load_from(&path).expect("load");
        assert_eq!(config.default_model, "gemini-2.0-flash");
        assert_eq!(config.default_scenario, ScenarioKey::Life);
        assert_eq!(
            config.storage_path().expect("storage path"),
            PathBuf::from("/tmp/keys.json")
        );
        assert_eq!(config.storage_key, AppConfig::default().storage_key);
    }

    #[test]
    fn unknown_scenario_is_a_parse_error() {
        let dir = tempfile::tempdir().expect("tempdir should be created");
        let path = dir.path().join("config.toml");
        fs::write(&path, "default_scenario = \"travel\"\n").expect("fixture should write");

        let err = AppConfig::load_from(&path).expect_err("unknown scenario should fail");
        assert!(matches!(err, ConfigError::Parse { .. }));
    }
}
