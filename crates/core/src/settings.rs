//! Bridge settings
//!
//! Loaded from `config.toml` in the platform config directory, with
//! environment variables taking precedence over file values.

use std::path::{Path, PathBuf};

use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::Result;

/// Top-level settings, loaded from config.toml
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct BridgeSettings {
    pub http: HttpSection,
    pub session: SessionSection,
}

/// Endpoints and headers for room resolution
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HttpSection {
    pub user_agent: String,
    /// Live link metadata endpoint; the caster identifier is appended as a path segment
    pub meta_base_url: String,
    pub room_url: String,
    pub timeout_secs: u64,
}

impl Default for HttpSection {
    fn default() -> Self {
        Self {
            user_agent: "KakaoTVLive/1.0.4".into(),
            meta_base_url: "https://tv.kakao.com/api/v1/app/livelinks".into(),
            room_url: "https://play.daum.net/chat/service/api/room".into(),
            timeout_secs: 10,
        }
    }
}

/// Socket session tuning
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionSection {
    /// Upper bound on bytes buffered while waiting for a line boundary
    pub max_line_bytes: usize,
    pub event_capacity: usize,
    pub read_buffer_bytes: usize,
}

impl Default for SessionSection {
    fn default() -> Self {
        Self {
            max_line_bytes: 1024 * 1024,
            event_capacity: 256,
            read_buffer_bytes: 8192,
        }
    }
}

impl BridgeSettings {
    /// Default settings file location, if the platform has a config directory
    pub fn default_path() -> Option<PathBuf> {
        ProjectDirs::from("", "", "kakaotv-chat").map(|dirs| dirs.config_dir().join("config.toml"))
    }

    /// Load settings from a TOML file. Falls back to defaults if the file doesn't exist.
    /// Environment variables override file values.
    pub fn load(path: &Path) -> Result<Self> {
        let mut settings = if path.exists() {
            let contents = std::fs::read_to_string(path)?;
            Self::parse(&contents)?
        } else {
            info!(path = %path.display(), "No settings file found, using defaults");
            Self::default()
        };

        settings.apply_overrides(|key| std::env::var(key).ok());
        Ok(settings)
    }

    /// Load from the default location, or pure defaults when there is none
    pub fn load_default() -> Result<Self> {
        match Self::default_path() {
            Some(path) => Self::load(&path),
            None => {
                let mut settings = Self::default();
                settings.apply_overrides(|key| std::env::var(key).ok());
                Ok(settings)
            }
        }
    }

    /// Parse settings from TOML text
    pub fn parse(contents: &str) -> Result<Self> {
        Ok(toml::from_str(contents)?)
    }

    fn apply_overrides(&mut self, var: impl Fn(&str) -> Option<String>) {
        if let Some(v) = var("KAKAOTV_USER_AGENT") {
            self.http.user_agent = v;
        }
        if let Some(v) = var("KAKAOTV_META_URL") {
            self.http.meta_base_url = v;
        }
        if let Some(v) = var("KAKAOTV_ROOM_URL") {
            self.http.room_url = v;
        }
        if let Some(bytes) = var("KAKAOTV_MAX_LINE_BYTES").and_then(|v| v.parse().ok()) {
            self.session.max_line_bytes = bytes;
        }
    }
}
