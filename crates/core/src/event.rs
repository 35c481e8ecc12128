//! Chat events published to consumers

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::config::SessionConfig;
use crate::error::{Error, Result};
use crate::matcher::{EventKind, FrameMatch};

/// A chat message received from the room
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatEvent {
    /// Config of the session that captured the message
    pub module: SessionConfig,
    pub username: String,
    pub nickname: String,
    pub message: String,
    /// Capture time, serialized as epoch milliseconds
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub timestamp: DateTime<Utc>,
}

/// JSON tail of a message frame
#[derive(Deserialize)]
struct MessagePayload {
    msg: String,
}

impl ChatEvent {
    /// Build a chat event from a classified `message` frame
    pub fn from_match(module: &SessionConfig, found: &FrameMatch<'_>) -> Result<Self> {
        if found.event != EventKind::Message {
            return Err(Error::Protocol(format!(
                "Cannot build a chat message from '{}' frame",
                found.event
            )));
        }

        let handle = found
            .field(0)
            .filter(|h| !h.is_empty())
            .ok_or_else(|| Error::Protocol("Message frame without sender handle".into()))?;
        let payload = found
            .field(1)
            .ok_or_else(|| Error::Protocol("Message frame without payload".into()))?;
        let payload: MessagePayload = serde_json::from_str(payload)?;

        Ok(Self {
            module: module.clone(),
            username: handle.to_string(),
            nickname: handle.to_string(),
            message: payload.msg,
            timestamp: Utc::now(),
        })
    }
}
