//! Chat socket framing
//!
//! Outbound: a single `ENTER <token>\n` line after connecting.
//! Inbound: newline-delimited text frames, reassembled and classified
//! into chat events.

use std::sync::Arc;

use tokio::io::{AsyncWrite, AsyncWriteExt};
use tracing::{debug, warn};

use kakaotv_core::{ChatEvent, EventKind, FrameMatcher, LineBuffer, SessionConfig};

use crate::error::Result;

/// Format the room entry command
pub fn enter_command(token: &str) -> String {
    format!("ENTER {}\n", token)
}

/// Write the room entry command to a stream
pub async fn write_enter<W: AsyncWrite + Unpin>(writer: &mut W, token: &str) -> Result<()> {
    writer.write_all(enter_command(token).as_bytes()).await?;
    writer.flush().await?;
    Ok(())
}

/// Turns raw socket chunks into chat events for one connection
pub struct FrameDecoder {
    buffer: LineBuffer,
    matcher: Arc<FrameMatcher>,
    config: Arc<SessionConfig>,
}

impl FrameDecoder {
    pub fn new(
        matcher: Arc<FrameMatcher>,
        config: Arc<SessionConfig>,
        max_line_bytes: usize,
    ) -> Self {
        Self {
            buffer: LineBuffer::new(max_line_bytes),
            matcher,
            config,
        }
    }

    /// Decode one chunk. Events come out in arrival order.
    ///
    /// Unmatched lines and malformed message payloads are dropped; only a
    /// reassembly overflow is reported as an error.
    pub fn decode(&mut self, chunk: &[u8]) -> Result<Vec<ChatEvent>> {
        let mut events = Vec::new();

        for line in self.buffer.feed(chunk)? {
            let Some(found) = self.matcher.classify(&line) else {
                if !line.is_empty() {
                    debug!(line = %line, "Dropping unmatched frame");
                }
                continue;
            };

            match found.event {
                EventKind::Message => match ChatEvent::from_match(&self.config, &found) {
                    Ok(event) => events.push(event),
                    Err(e) => warn!(error = %e, "Dropping malformed message frame"),
                },
            }
        }

        Ok(events)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kakaotv_core::SessionOptions;

    fn decoder(max_line_bytes: usize) -> FrameDecoder {
        let config = SessionConfig::from_source(
            "https://tv.kakao.com/channel/2653210/livelink/3001234",
            SessionOptions::default(),
        )
        .unwrap();
        FrameDecoder::new(
            Arc::new(FrameMatcher::kakao().unwrap()),
            Arc::new(config),
            max_line_bytes,
        )
    }

    #[test]
    fn test_enter_command() {
        assert_eq!(enter_command("abc"), "ENTER abc\n");
    }

    #[tokio::test]
    async fn test_write_enter() {
        let mut buf = Vec::new();
        write_enter(&mut buf, "tok-1").await.unwrap();
        assert_eq!(buf, b"ENTER tok-1\n");
    }

    #[test]
    fn test_decode_split_frames() {
        let mut decoder = decoder(4096);
        let first = ":aaaaaaaa-bbbb-cccc-dddd-eeeeeeeeeeee MSG alice ALL NORMAL {\"ms";
        let second = "g\":\"hi\"}\nPING\n:aaaaaaaa-bbbb-cccc-dddd-eeeeeeeeeeee AMSG bob ALL NORMAL {\"msg\":\"yo\"}\n";

        assert!(decoder.decode(first.as_bytes()).unwrap().is_empty());
        let events = decoder.decode(second.as_bytes()).unwrap();

        assert_eq!(events.len(), 2);
        assert_eq!(events[0].username, "alice");
        assert_eq!(events[0].message, "hi");
        assert_eq!(events[1].nickname, "bob");
        assert_eq!(events[1].message, "yo");
    }

    #[test]
    fn test_decode_drops_malformed_payload() {
        let mut decoder = decoder(4096);
        let chunk = ":aaaaaaaa-bbbb-cccc-dddd-eeeeeeeeeeee MSG alice ALL NORMAL oops\n\
                     :aaaaaaaa-bbbb-cccc-dddd-eeeeeeeeeeee MSG carol ALL NORMAL {\"msg\":\"ok\"}\n";

        let events = decoder.decode(chunk.as_bytes()).unwrap();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].username, "carol");
    }

    #[test]
    fn test_decode_overflow() {
        let mut decoder = decoder(8);
        assert!(decoder.decode(b"0123456789").is_err());
        assert!(decoder.decode(b"\n").unwrap().is_empty());
    }
}
