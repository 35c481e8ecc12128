//! Session configuration
//!
//! A session is configured from the broadcast's source URL:
//! `https://tv.kakao.com/channel/<username>/livelink/<identify>`.
//! Caller overrides are merged over the values computed from the URL.

use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::{Error, Result};

/// Module name reported in every chat event unless overridden
pub const DEFAULT_MODULE_NAME: &str = "oba:chat:kakaotv";

/// Path segment holding the caster username (leading empty segment included)
const USERNAME_SEGMENT: usize = 2;

/// Path segment holding the live link identifier
const IDENTIFY_SEGMENT: usize = 4;

/// The broadcaster whose chat is being bridged
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Caster {
    pub username: String,
    pub identify: String,
}

/// Immutable configuration snapshot for one session
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionConfig {
    pub name: String,
    pub source: String,
    pub caster: Caster,
}

/// Caller-supplied overrides. Set fields win over computed defaults.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionOptions {
    pub name: Option<String>,
    pub source: Option<String>,
    pub caster: CasterOptions,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CasterOptions {
    pub username: Option<String>,
    pub identify: Option<String>,
}

impl SessionConfig {
    /// Build a config from a source URL, merging `options` over the defaults
    pub fn from_source(source: &str, options: SessionOptions) -> Result<Self> {
        let uri = Url::parse(source)
            .map_err(|e| Error::Config(format!("Invalid source URL '{}': {}", source, e)))?;

        let segments: Vec<&str> = uri.path().split('/').collect();
        let segment = |index: usize| {
            segments
                .get(index)
                .filter(|s| !s.is_empty())
                .map(|s| s.to_string())
        };

        let username = options
            .caster
            .username
            .or_else(|| segment(USERNAME_SEGMENT))
            .ok_or_else(|| {
                Error::Config(format!("Source URL '{}' has no caster username", source))
            })?;
        let identify = options
            .caster
            .identify
            .or_else(|| segment(IDENTIFY_SEGMENT))
            .ok_or_else(|| {
                Error::Config(format!("Source URL '{}' has no live link identifier", source))
            })?;

        if username.trim().is_empty() || identify.trim().is_empty() {
            return Err(Error::Config("Caster fields must not be blank".into()));
        }

        Ok(Self {
            name: options.name.unwrap_or_else(|| DEFAULT_MODULE_NAME.to_string()),
            source: options.source.unwrap_or_else(|| source.to_string()),
            caster: Caster { username, identify },
        })
    }
}
