use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Env var that overrides `youtube_api_key`. The key comes from process
/// configuration, never from the persisted preferences store.
pub const YOUTUBE_API_KEY_ENV: &str = "TELECAST_YOUTUBE_API_KEY";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Base URL of the channel catalog API.
    #[serde(default = "default_api_base")]
    pub api_base: String,
    /// Base URL of the video-platform data API (override for testing).
    #[serde(default = "default_videos_api_base")]
    pub videos_api_base: String,
    /// Platform API key. Absent means liveness checks are skipped entirely.
    #[serde(default)]
    pub youtube_api_key: Option<String>,
    /// Liveness poll period in milliseconds.
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
    #[serde(default = "default_connect_timeout_ms")]
    pub connect_timeout_ms: u64,
    #[serde(default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,
}

fn default_api_base() -> String {
    "https://macicast-backend.onrender.com/api".to_string()
}

fn default_videos_api_base() -> String {
    "https://www.googleapis.com/youtube/v3".to_string()
}

fn default_poll_interval_ms() -> u64 {
    120_000
}

fn default_connect_timeout_ms() -> u64 {
    5_000
}

fn default_request_timeout_ms() -> u64 {
    15_000
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_base: default_api_base(),
            videos_api_base: default_videos_api_base(),
            youtube_api_key: None,
            poll_interval_ms: default_poll_interval_ms(),
            connect_timeout_ms: default_connect_timeout_ms(),
            request_timeout_ms: default_request_timeout_ms(),
        }
    }
}

impl Config {
    /// Load from the config file, writing defaults on first run, then apply
    /// the env-var key override.
    pub fn load() -> anyhow::Result<Self> {
        let config_path = Self::config_path();

        let mut config = if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)?;
            toml::from_str(&content)?
        } else {
            let config = Self::default();
            config.save()?;
            config
        };

        config.apply_env();
        Ok(config)
    }

    pub fn save(&self) -> anyhow::Result<()> {
        let config_path = Self::config_path();
        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)?;
        std::fs::write(&config_path, content)?;
        Ok(())
    }

    pub fn config_path() -> PathBuf {
        config_dir().join("config.toml")
    }

    /// Env override for the platform API key (ignored when empty).
    pub fn apply_env(&mut self) {
        if let Ok(key) = std::env::var(YOUTUBE_API_KEY_ENV) {
            if !key.trim().is_empty() {
                self.youtube_api_key = Some(key);
            }
        }
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.connect_timeout_ms)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }
}

pub fn config_dir() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("telecast")
}

pub fn data_dir() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("telecast")
}
