//! The single persisted key-value store: UI language code, auth token,
//! and the serialized current-user record. Survives reloads; nothing else
//! in the library persists state.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::warn;

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct Preferences {
    #[serde(default)]
    pub language: Option<String>,
    #[serde(default)]
    pub auth_token: Option<String>,
    /// Opaque current-user record; the auth layer owns its shape.
    #[serde(default)]
    pub current_user: Option<serde_json::Value>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

impl Preferences {
    pub fn default_path() -> PathBuf {
        crate::config::data_dir().join("prefs.json")
    }

    /// Load from disk. A missing or unreadable file yields defaults.
    pub fn load(path: &Path) -> Self {
        match std::fs::read_to_string(path) {
            Ok(content) => match serde_json::from_str(&content) {
                Ok(prefs) => prefs,
                Err(err) => {
                    warn!("preferences file {:?} is corrupt, using defaults: {}", path, err);
                    Self::default()
                }
            },
            Err(_) => Self::default(),
        }
    }

    /// Persist, stamping `updated_at`.
    pub async fn save(&mut self, path: &Path) -> anyhow::Result<()> {
        self.updated_at = Some(Utc::now());
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        let json = serde_json::to_string_pretty(self)?;
        tokio::fs::write(path, json).await?;
        Ok(())
    }
}
