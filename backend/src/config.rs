//! # Configuration
//!
//! Settings are resolved in three layers, later ones winning:
//!
//! 1. Built-in defaults
//! 2. `config.yaml` inside the data directory, if present
//! 3. Environment variables
//!
//! ## Environment
//!
//! - `TCF_TRACKER_DATA_DIR`: data directory (default `~/Documents/TCF Tracker`)
//! - `TCF_TRACKER_DEBOUNCE_MS`: draft autosave delay in milliseconds
//! - `GEMINI_API_KEY` or `API_KEY`: enables report analysis
//!
//! ## YAML Format
//!
//! ```yaml
//! database_file: "tcf_tracker.db"
//! draft_debounce_ms: 500
//! analysis:
//!   api_key: "..."
//!   model: "gemini-2.5-flash"
//! ```

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{info, warn};

pub const CONFIG_FILE_NAME: &str = "config.yaml";
pub const DATA_DIR_ENV: &str = "TCF_TRACKER_DATA_DIR";
pub const DEBOUNCE_ENV: &str = "TCF_TRACKER_DEBOUNCE_MS";
pub const API_KEY_ENVS: [&str; 2] = ["GEMINI_API_KEY", "API_KEY"];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    pub api_key: Option<String>,
    pub model: String,
    pub endpoint: String,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            model: "gemini-2.5-flash".to_string(),
            endpoint: "https://generativelanguage.googleapis.com/v1beta".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Directory holding the database and `config.yaml`; never read from the file
    #[serde(skip)]
    pub data_directory: PathBuf,
    /// Database file name, relative to the data directory
    pub database_file: String,
    pub draft_debounce_ms: u64,
    pub analysis: AnalysisConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            data_directory: PathBuf::from("."),
            database_file: "tcf_tracker.db".to_string(),
            draft_debounce_ms: 500,
            analysis: AnalysisConfig::default(),
        }
    }
}

impl AppConfig {
    /// Resolve configuration from the process environment
    pub fn load() -> Result<Self> {
        Self::load_with(|name| std::env::var(name).ok())
    }

    /// Resolve configuration using `env` to look up variables
    pub fn load_with<F>(env: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let data_directory = match env(DATA_DIR_ENV).filter(|v| !v.trim().is_empty()) {
            Some(dir) => PathBuf::from(dir.trim()),
            None => Self::default_data_directory(&env)?,
        };

        let mut config = Self::from_directory(&data_directory)?;

        if let Some(raw) = env(DEBOUNCE_ENV) {
            match raw.trim().parse::<u64>() {
                Ok(ms) => config.draft_debounce_ms = ms,
                Err(_) => warn!("Ignoring invalid {}: {:?}", DEBOUNCE_ENV, raw),
            }
        }

        if let Some(key) = API_KEY_ENVS
            .iter()
            .filter_map(|&name| env(name))
            .find(|key| !key.trim().is_empty())
        {
            config.analysis.api_key = Some(key);
        }

        Ok(config)
    }

    /// Defaults overlaid with `<dir>/config.yaml` when that file exists
    pub fn from_directory(dir: &Path) -> Result<Self> {
        let path = dir.join(CONFIG_FILE_NAME);

        let mut config = if path.exists() {
            let content = fs::read_to_string(&path)
                .with_context(|| format!("Failed to read config file: {:?}", path))?;
            let parsed: AppConfig = serde_yaml::from_str(&content)
                .with_context(|| format!("Failed to parse config file: {:?}", path))?;
            info!("Loaded configuration from {}", path.display());
            parsed
        } else {
            AppConfig::default()
        };

        config.data_directory = dir.to_path_buf();
        Ok(config)
    }

    fn default_data_directory<F>(env: &F) -> Result<PathBuf>
    where
        F: Fn(&str) -> Option<String>,
    {
        let home = env("HOME")
            .or_else(|| env("USERPROFILE"))
            .ok_or_else(|| anyhow::anyhow!("Could not determine home directory"))?;
        Ok(PathBuf::from(home).join("Documents").join("TCF Tracker"))
    }

    pub fn database_path(&self) -> PathBuf {
        self.data_directory.join(&self.database_file)
    }

    pub fn draft_debounce(&self) -> Duration {
        Duration::from_millis(self.draft_debounce_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use tempfile::tempdir;

    fn env_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name: &str| vars.get(name).cloned()
    }

    #[test]
    fn test_defaults_under_home_documents() {
        let config = AppConfig::load_with(env_from(&[("HOME", "/home/tester")])).unwrap();

        assert_eq!(config.data_directory, PathBuf::from("/home/tester/Documents/TCF Tracker"));
        assert_eq!(
            config.database_path(),
            PathBuf::from("/home/tester/Documents/TCF Tracker/tcf_tracker.db")
        );
        assert_eq!(config.draft_debounce(), Duration::from_millis(500));
        assert_eq!(config.analysis.model, "gemini-2.5-flash");
        assert!(config.analysis.api_key.is_none());
    }

    #[test]
    fn test_missing_home_is_an_error() {
        assert!(AppConfig::load_with(env_from(&[])).is_err());
    }

    #[test]
    fn test_yaml_file_then_environment() {
        let dir = tempdir().unwrap();
        fs::write(
            dir.path().join(CONFIG_FILE_NAME),
            "database_file: custom.db\ndraft_debounce_ms: 250\nanalysis:\n  api_key: from-file\n",
        )
        .unwrap();
        let data_dir = dir.path().to_string_lossy().to_string();
        let data_dir = data_dir.as_str();

        let config = AppConfig::load_with(env_from(&[(DATA_DIR_ENV, data_dir)])).unwrap();
        assert_eq!(config.database_path(), dir.path().join("custom.db"));
        assert_eq!(config.draft_debounce_ms, 250);
        assert_eq!(config.analysis.api_key.as_deref(), Some("from-file"));
        assert_eq!(config.analysis.model, "gemini-2.5-flash");

        let config = AppConfig::load_with(env_from(&[
            (DATA_DIR_ENV, data_dir),
            (DEBOUNCE_ENV, "1000"),
            ("API_KEY", "from-env"),
        ]))
        .unwrap();
        assert_eq!(config.draft_debounce_ms, 1000);
        assert_eq!(config.analysis.api_key.as_deref(), Some("from-env"));
    }

    #[test]
    fn test_invalid_values() {
        let dir = tempdir().unwrap();
        let data_dir = dir.path().to_string_lossy().to_string();
        let data_dir = data_dir.as_str();

        let config =
            AppConfig::load_with(env_from(&[(DATA_DIR_ENV, data_dir), (DEBOUNCE_ENV, "soon")]))
                .unwrap();
        assert_eq!(config.draft_debounce_ms, 500);

        fs::write(dir.path().join(CONFIG_FILE_NAME), "draft_debounce_ms: [1, 2]").unwrap();
        assert!(AppConfig::load_with(env_from(&[(DATA_DIR_ENV, data_dir)])).is_err());
    }
}
