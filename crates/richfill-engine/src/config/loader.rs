use super::schema::RichfillConfig;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to parse config file: {0}")]
    Parse(#[from] serde_yaml::Error),
}

pub struct ConfigLoader;

impl ConfigLoader {
    /// Load from an explicit path if given, otherwise from the default locations.
    pub async fn load(explicit: Option<&Path>) -> Result<RichfillConfig, ConfigError> {
        match explicit {
            Some(path) => Self::load_from(path).await,
            None => Self::load_default().await,
        }
    }

    /// Load from default locations:
    /// 1. ./richfill.yaml
    /// 2. ~/.richfill/config.yaml
    /// 3. Default configuration
    pub async fn load_default() -> Result<RichfillConfig, ConfigError> {
        let local_config = PathBuf::from("./richfill.yaml");
        if local_config.exists() {
            return Self::load_from(&local_config).await;
        }

        if let Some(home) = dirs::home_dir() {
            let home_config = home.join(".richfill").join("config.yaml");
            if home_config.exists() {
                return Self::load_from(&home_config).await;
            }
        }

        Ok(RichfillConfig::default())
    }

    pub async fn load_from(path: &Path) -> Result<RichfillConfig, ConfigError> {
        debug!("Loading config from {}", path.display());
        let content = tokio::fs::read_to_string(path).await?;
        let config: RichfillConfig = serde_yaml::from_str(&content)?;
        Ok(config)
    }
}
