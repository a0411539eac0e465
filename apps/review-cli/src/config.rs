//! Application configuration loaded from `review.toml`
//!
//! Every field has a default, so a missing file is the same as an empty one.
//! Command-line flags override whatever the file says.

use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const DEFAULT_CONFIG_FILE: &str = "review.toml";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub backend: BackendConfig,
    #[serde(default)]
    pub guides: GuidesConfig,
    #[serde(default)]
    pub project: ProjectConfig,
}

impl AppConfig {
    /// Load from an explicit path, or from `review.toml` in the working
    /// directory when it exists
    pub fn load(path: Option<&Path>) -> anyhow::Result<Self> {
        match path {
            Some(path) => Self::from_file(path),
            None if Path::new(DEFAULT_CONFIG_FILE).exists() => Self::from_file(DEFAULT_CONFIG_FILE),
            None => Ok(Self::default()),
        }
    }

    pub fn from_file<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        Self::parse(&content)
    }

    pub fn parse(s: &str) -> anyhow::Result<Self> {
        toml::from_str(s).context("Failed to parse TOML configuration")
    }
}

/// Validation backend connection
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackendConfig {
    #[serde(default = "default_backend_url")]
    pub url: String,
    /// Request timeout in seconds (default: 300, checks of long documents are slow)
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_backend_url() -> String {
    "http://127.0.0.1:8002".to_string()
}

fn default_timeout_secs() -> u64 {
    300
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            url: default_backend_url(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl BackendConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GuidesConfig {
    /// JSON file with `margin_mm` and `indent_rules`
    #[serde(default)]
    pub config_path: Option<PathBuf>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProjectConfig {
    #[serde(default)]
    pub dir: Option<PathBuf>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_empty_config_uses_defaults() {
        let config = AppConfig::parse("").unwrap();
        assert_eq!(config.backend.url, "http://127.0.0.1:8002");
        assert_eq!(config.backend.timeout(), Duration::from_secs(300));
        assert!(config.guides.config_path.is_none());
        assert!(config.project.dir.is_none());
    }

    #[test]
    fn test_partial_config() {
        let config = AppConfig::parse(
            r#"
            [backend]
            url = "http://localhost:9000"

            [project]
            dir = "projects/thesis"
            "#,
        )
        .unwrap();
        assert_eq!(config.backend.url, "http://localhost:9000");
        assert_eq!(config.backend.timeout_secs, 300);
        assert_eq!(config.project.dir, Some(PathBuf::from("projects/thesis")));
    }

    #[test]
    fn test_invalid_toml() {
        assert!(AppConfig::parse("[backend\nurl = 1").is_err());
    }

    #[test]
    fn test_missing_explicit_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(AppConfig::load(Some(dir.path().join("nope.toml").as_path())).is_err());
    }

    #[test]
    fn test_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("review.toml");
        fs::write(&path, "[guides]\nconfig_path = \"config.json\"\n").unwrap();
        let config = AppConfig::from_file(&path).unwrap();
        assert_eq!(config.guides.config_path, Some(PathBuf::from("config.json")));
    }
}
