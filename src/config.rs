use color_eyre::eyre::{eyre, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tracing::{info, warn};

const CONFIG_DIR: &str = ".config/iotview";
const CONFIG_FILE: &str = "config.toml";

pub const DEFAULT_API_BASE_URL: &str = "http://127.0.0.1:5001";
pub const DEFAULT_SESSION_MINUTES: u32 = 170;

/// Application configuration loaded from `~/.config/iotview/config.toml`.
///
/// Missing files and missing fields fall back to defaults so the app always
/// starts, even with no configuration present.
#[derive(Deserialize, Serialize, Clone, Debug)]
#[serde(default)]
pub struct AppConfig {
    /// Origin of the REST backend (auth and connection registry).
    pub api_base_url: String,
    /// Session length requested on sign-in, in minutes.
    pub session_minutes: u32,
    /// Override for where exported message files are written.
    pub export_dir: Option<PathBuf>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            session_minutes: DEFAULT_SESSION_MINUTES,
            export_dir: None,
        }
    }
}

impl AppConfig {
    pub fn config_dir() -> PathBuf {
        let mut path = home_dir();
        path.push(CONFIG_DIR);
        path
    }

    /// Loads the config file, writing a default one on first run.
    pub async fn load_or_default() -> Result<Self> {
        let dir = Self::config_dir();
        let mut path = dir.clone();
        path.push(CONFIG_FILE);

        if !tokio::fs::try_exists(&path)
            .await
            .map_err(|e| eyre!("Failed to check for config file: {}", e))?
        {
            info!("No config file found, creating default at {}", path.display());
            tokio::fs::create_dir_all(&dir)
                .await
                .map_err(|e| eyre!("Failed to create config directory: {}", e))?;

            let config = Self::default();
            let content = toml::to_string_pretty(&config)
                .map_err(|e| eyre!("Failed to serialize default config: {}", e))?;
            tokio::fs::write(&path, content)
                .await
                .map_err(|e| eyre!("Failed to write default config: {}", e))?;
            return Ok(config);
        }

        let content = tokio::fs::read_to_string(&path)
            .await
            .map_err(|e| eyre!("Failed to read config file: {}", e))?;
        toml::from_str(&content).map_err(|e| eyre!("Failed to parse config file: {}", e))
    }

    /// Directory exported message files land in: the configured override,
    /// else the platform download directory, else the working directory.
    pub fn export_dir(&self) -> PathBuf {
        if let Some(dir) = &self.export_dir {
            return dir.clone();
        }
        dirs::download_dir().unwrap_or_else(|| PathBuf::from("."))
    }
}

fn home_dir() -> PathBuf {
    dirs::home_dir().unwrap_or_else(|| {
        warn!("Could not determine home directory, using current directory");
        PathBuf::from(".")
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_fields_fall_back_to_defaults() {
        let config: AppConfig = toml::from_str("api_base_url = \"http://10.0.0.2:9000\"")
            .expect("partial config should parse");
        assert_eq!(config.api_base_url, "http://10.0.0.2:9000");
        assert_eq!(config.session_minutes, DEFAULT_SESSION_MINUTES);
        assert!(config.export_dir.is_none());
    }

    #[test]
    fn export_dir_override_wins() {
        let config = AppConfig {
            export_dir: Some(PathBuf::from("/tmp/exports")),
            ..AppConfig::default()
        };
        assert_eq!(config.export_dir(), PathBuf::from("/tmp/exports"));
    }
}
