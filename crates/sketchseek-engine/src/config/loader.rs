use super::schema::SketchseekConfig;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;

/// Overrides `api.base_url` when set.
pub const API_URL_ENV: &str = "SKETCHSEEK_API_URL";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to parse config file: {0}")]
    Parse(#[from] serde_yaml::Error),
}

pub struct ConfigLoader;

impl ConfigLoader {
    /// Load from default locations:
    /// 1. ./sketchseek.yaml
    /// 2. ~/.sketchseek/config.yaml
    /// 3. Default configuration
    ///
    /// The API URL environment override is applied in every case.
    pub async fn load_default() -> Result<SketchseekConfig, ConfigError> {
        let config = match Self::default_path() {
            Some(path) => Self::load_from(&path).await?,
            None => SketchseekConfig::default(),
        };
        Ok(Self::apply_env(config, |key| std::env::var(key).ok()))
    }

    pub async fn load_from(path: &Path) -> Result<SketchseekConfig, ConfigError> {
        debug!("Loading config from {}", path.display());
        let content = tokio::fs::read_to_string(path).await?;
        let config: SketchseekConfig = serde_yaml::from_str(&content)?;
        Ok(config)
    }

    fn default_path() -> Option<PathBuf> {
        let local_config = PathBuf::from("./sketchseek.yaml");
        if local_config.exists() {
            return Some(local_config);
        }

        let home_config = dirs::home_dir()?.join(".sketchseek").join("config.yaml");
        home_config.exists().then_some(home_config)
    }

    /// Apply environment overrides using `lookup` to read variables.
    pub fn apply_env<F>(mut config: SketchseekConfig, lookup: F) -> SketchseekConfig
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(url) = lookup(API_URL_ENV).filter(|u| !u.trim().is_empty()) {
            config.api.base_url = url.trim().to_string();
        }
        config
    }
}
