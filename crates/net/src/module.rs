//! Consumer-facing chat module
//!
//! Wraps a [`Session`] and hands its events to the consumer unchanged.

use std::sync::Arc;

use tokio::sync::mpsc;

use kakaotv_core::{BridgeSettings, FrameMatcher, SessionConfig, SessionSection};

use crate::error::Result;
use crate::resolver::{HttpResolver, TargetResolver};
use crate::session::{ConnectionState, Session, SessionEvent};

/// Chat bridge for one broadcast
pub struct ChatModule {
    session: Session,
    event_rx: mpsc::Receiver<SessionEvent>,
}

impl ChatModule {
    /// Module resolving rooms over HTTP with the built-in frame rules
    pub fn new(config: SessionConfig, settings: &BridgeSettings) -> Result<Self> {
        let resolver = Arc::new(HttpResolver::new(&settings.http)?);
        let matcher = FrameMatcher::kakao()?;
        Ok(Self::with_resolver(
            config,
            resolver,
            matcher,
            &settings.session,
        ))
    }

    /// Module with a caller-supplied resolver and rule set
    pub fn with_resolver(
        config: SessionConfig,
        resolver: Arc<dyn TargetResolver>,
        matcher: FrameMatcher,
        settings: &SessionSection,
    ) -> Self {
        let (session, event_rx) = Session::new(config, resolver, matcher, settings);
        Self { session, event_rx }
    }

    pub fn config(&self) -> &SessionConfig {
        self.session.config()
    }

    pub async fn connect(&self) {
        self.session.connect().await;
    }

    pub async fn disconnect(&self) {
        self.session.disconnect().await;
    }

    pub async fn connection_state(&self) -> ConnectionState {
        self.session.connection_state().await
    }

    /// Get the next session event
    pub async fn next_event(&mut self) -> Option<SessionEvent> {
        self.event_rx.recv().await
    }

    /// Get the next session event if one is ready (non-blocking poll)
    pub fn try_next_event(&mut self) -> Option<SessionEvent> {
        self.event_rx.try_recv().ok()
    }
}
