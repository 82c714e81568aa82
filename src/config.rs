use crate::providers::coingecko::DEFAULT_BASE_URL;
use anyhow::{Context, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::{env, fs, path::PathBuf};
use tracing::debug;

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ApiConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default)]
    pub key: Option<String>,
}

fn default_base_url() -> String {
    DEFAULT_BASE_URL.to_string()
}

impl Default for ApiConfig {
    fn default() -> Self {
        ApiConfig {
            base_url: default_base_url(),
            key: None,
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub api: ApiConfig,
    /// Default quote currency code for commands that take none.
    #[serde(default)]
    pub currency: Option<String>,
}

impl AppConfig {
    /// Loads the default config file if it exists, else defaults.
    /// Environment overrides win either way.
    pub fn load() -> Result<Self> {
        debug!("Loading default config");
        let config_path = Self::default_config_path()?;
        let config = if config_path.exists() {
            Self::read_file(&config_path)?
        } else {
            AppConfig::default()
        };
        Ok(config.with_env_overrides())
    }

    pub fn default_config_path() -> Result<PathBuf> {
        let proj_dirs = ProjectDirs::from("io", "coindeck", "coindeck")
            .context("Could not determine project directories")?;
        Ok(proj_dirs.config_dir().join("config.yaml"))
    }

    pub fn load_from_path<P: AsRef<std::path::Path>>(path: P) -> Result<Self> {
        Ok(Self::read_file(path)?.with_env_overrides())
    }

    fn read_file<P: AsRef<std::path::Path>>(path: P) -> Result<Self> {
        let config_str = fs::read_to_string(path.as_ref())
            .with_context(|| format!("Failed to read config file: {}", path.as_ref().display()))?;

        let config: Self = serde_yaml::from_str(&config_str)
            .with_context(|| format!("Failed to parse config file: {}", path.as_ref().display()))?;
        debug!("Successfully loaded config");
        Ok(config)
    }

    fn with_env_overrides(self) -> Self {
        self.with_overrides(
            env::var("COINDECK_API_BASE_URL").ok(),
            env::var("COINDECK_API_KEY").ok(),
        )
    }

    fn with_overrides(mut self, base_url: Option<String>, key: Option<String>) -> Self {
        if let Some(url) = base_url.filter(|u| !u.trim().is_empty()) {
            self.api.base_url = url.trim().to_string();
        }
        if let Some(key) = key.filter(|k| !k.trim().is_empty()) {
            self.api.key = Some(key.trim().to_string());
        }
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_deserialization() {
        let yaml_str = r#"
api:
  base_url: "https://pro-api.coingecko.com/api/v3"
  key: "CG-abc123"
currency: "eur"
"#;

        let config: AppConfig = serde_yaml::from_str(yaml_str).expect("Failed to deserialize");
        assert_eq!(config.api.base_url, "https://pro-api.coingecko.com/api/v3");
        assert_eq!(config.api.key.as_deref(), Some("CG-abc123"));
        assert_eq!(config.currency.as_deref(), Some("eur"));
    }

    #[test]
    fn missing_sections_fall_back_to_defaults() {
        let config: AppConfig = serde_yaml::from_str("currency: \"usd\"").unwrap();
        assert_eq!(config.api.base_url, DEFAULT_BASE_URL);
        assert!(config.api.key.is_none());

        let empty: AppConfig = serde_yaml::from_str("{}").unwrap();
        assert!(empty.currency.is_none());
    }

    #[test]
    fn overrides_win_over_file_values() {
        let config: AppConfig = serde_yaml::from_str(
            r#"
api:
  base_url: "https://example.com/v3"
  key: "file-key"
"#,
        )
        .unwrap();

        let overridden = config.with_overrides(
            Some("https://override.example.com".to_string()),
            Some(" env-key ".to_string()),
        );
        assert_eq!(overridden.api.base_url, "https://override.example.com");
        assert_eq!(overridden.api.key.as_deref(), Some("env-key"));
    }

    #[test]
    fn blank_overrides_are_ignored() {
        let config = AppConfig::default().with_overrides(Some("  ".to_string()), Some(String::new()));
        assert_eq!(config.api.base_url, DEFAULT_BASE_URL);
        assert!(config.api.key.is_none());
    }
}
