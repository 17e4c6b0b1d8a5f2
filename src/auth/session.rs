use color_eyre::eyre::{eyre, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tracing::{debug, warn};

use crate::config::AppConfig;

const SESSION_FILE: &str = "session.toml";

#[derive(Deserialize, Serialize, Default)]
struct StoredSession {
    token: Option<String>,
}

/// Persists the opaque bearer token between runs.
///
/// The token is never inspected here; expiry is the backend's problem and a
/// stale token only shows up as a failing request later.
#[derive(Clone)]
pub struct SessionStore {
    path: PathBuf,
}

impl SessionStore {
    pub fn new() -> Self {
        let mut path = AppConfig::config_dir();
        path.push(SESSION_FILE);
        Self::at(path)
    }

    pub fn at(path: PathBuf) -> Self {
        Self { path }
    }

    /// Reads the stored token. Missing or corrupt files count as no session.
    pub async fn load(&self) -> Option<String> {
        let content = match tokio::fs::read_to_string(&self.path).await {
            Ok(content) => content,
            Err(e) => {
                debug!("No stored session ({})", e);
                return None;
            }
        };
        match toml::from_str::<StoredSession>(&content) {
            Ok(session) => session.token.filter(|token| !token.is_empty()),
            Err(e) => {
                warn!("Stored session file is corrupt, ignoring it: {}", e);
                None
            }
        }
    }

    pub async fn store(&self, token: &str) -> Result<()> {
        if let Some(dir) = self.path.parent() {
            tokio::fs::create_dir_all(dir)
                .await
                .map_err(|e| eyre!("Failed to create session directory: {}", e))?;
        }
        let session = StoredSession {
            token: Some(token.to_string()),
        };
        let content = toml::to_string_pretty(&session)
            .map_err(|e| eyre!("Failed to serialize session: {}", e))?;
        tokio::fs::write(&self.path, content)
            .await
            .map_err(|e| eyre!("Failed to write session file: {}", e))
    }

    /// Best-effort removal; logout never fails from the caller's view.
    pub async fn clear(&self) {
        if let Err(e) = tokio::fs::remove_file(&self.path).await {
            debug!("Session file removal skipped: {}", e);
        }
    }
}
