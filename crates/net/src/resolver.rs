//! Chat room resolution
//!
//! Two HTTP lookups turn a caster into socket coordinates:
//! live link metadata gives the chat group, the room API gives the
//! server address, port and entry token for that group.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{AUTHORIZATION, USER_AGENT};
use serde_json::Value;
use tracing::{debug, info};

use kakaotv_core::{Caster, HttpSection};

use crate::error::{Error, Result};

/// JSON pointer to the chat group inside the live link metadata
const CHAT_GROUP_POINTER: &str = "/live/liveAdditionalData/chattingGroupId";

/// Live link metadata, reduced to what the session needs
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BroadcastMeta {
    pub chatting_group_id: String,
}

impl BroadcastMeta {
    /// Extract the chat group identifier from a metadata response
    pub fn from_value(value: &Value) -> Result<Self> {
        let chatting_group_id = text_at(value, CHAT_GROUP_POINTER).ok_or_else(|| {
            Error::Resolution("Metadata has no live.liveAdditionalData.chattingGroupId".into())
        })?;
        Ok(Self { chatting_group_id })
    }
}

/// Socket coordinates for a chat room
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoomTarget {
    pub host: String,
    pub port: u16,
    /// Opaque token sent with `ENTER`
    pub enter: String,
}

impl RoomTarget {
    /// Extract the room coordinates from a room response
    pub fn from_value(value: &Value) -> Result<Self> {
        let host = text_at(value, "/roomInfo/serverip")
            .ok_or_else(|| Error::Resolution("Room response has no roomInfo.serverip".into()))?;

        let port_text = text_at(value, "/roomInfo/port")
            .ok_or_else(|| Error::Resolution("Room response has no roomInfo.port".into()))?;
        let port = port_text
            .trim()
            .parse::<u16>()
            .ok()
            .filter(|p| *p != 0)
            .ok_or_else(|| {
                Error::Resolution(format!("Room response has invalid port '{}'", port_text))
            })?;

        let enter = value
            .get("enter")
            .and_then(Value::as_str)
            .map(str::to_string)
            .ok_or_else(|| Error::Resolution("Room response has no enter token".into()))?;

        Ok(Self { host, port, enter })
    }
}

/// Read a string or number at `pointer` as text. Empty strings count as missing.
fn text_at(value: &Value, pointer: &str) -> Option<String> {
    match value.pointer(pointer)? {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Resolves a caster to the chat room the session should join
#[async_trait]
pub trait TargetResolver: Send + Sync {
    /// Fetch the broadcast metadata for a caster
    async fn meta(&self, caster: &Caster) -> Result<BroadcastMeta>;

    /// Fetch the room coordinates for a broadcast
    async fn room(&self, meta: &BroadcastMeta) -> Result<RoomTarget>;

    /// Both lookups in sequence
    async fn resolve(&self, caster: &Caster) -> Result<RoomTarget> {
        let meta = self.meta(caster).await?;
        self.room(&meta).await
    }
}

/// Resolver backed by the KakaoTV HTTP APIs
pub struct HttpResolver {
    client: reqwest::Client,
    user_agent: String,
    meta_base_url: String,
    room_url: String,
}

impl HttpResolver {
    pub fn new(settings: &HttpSection) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(settings.timeout_secs))
            .build()?;

        Ok(Self {
            client,
            user_agent: settings.user_agent.clone(),
            meta_base_url: settings.meta_base_url.trim_end_matches('/').to_string(),
            room_url: settings.room_url.clone(),
        })
    }
}

#[async_trait]
impl TargetResolver for HttpResolver {
    async fn meta(&self, caster: &Caster) -> Result<BroadcastMeta> {
        let url = format!("{}/{}", self.meta_base_url, caster.identify);
        info!(caster = %caster.username, identify = %caster.identify, "Fetching live link metadata");

        let body: Value = self
            .client
            .get(&url)
            .query(&[("fields", "*")])
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        BroadcastMeta::from_value(&body)
    }

    async fn room(&self, meta: &BroadcastMeta) -> Result<RoomTarget> {
        debug!(group = %meta.chatting_group_id, "Fetching chat room");

        let body: Value = self
            .client
            .post(&self.room_url)
            .header(USER_AGENT, &self.user_agent)
            .header(AUTHORIZATION, "")
            .form(&[("groupid", meta.chatting_group_id.as_str())])
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        RoomTarget::from_value(&body)
    }
}
