//! Chat socket session
//!
//! One session bridges one broadcast's chat room. `connect()` spawns a
//! connection task that resolves the room, opens the socket, sends the
//! entry command and then decodes frames until the socket closes.
//! `disconnect()` aborts that task, which drops the socket with it.
//! Everything the task observes is reported through a single ordered
//! event channel.

use std::sync::{Arc, Mutex, MutexGuard};

use tokio::io::AsyncReadExt;
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use kakaotv_core::{ChatEvent, FrameMatcher, SessionConfig, SessionSection};

use crate::error::Error;
use crate::frame::{write_enter, FrameDecoder};
use crate::resolver::TargetResolver;

/// Connection state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    /// Never connected
    Idle,
    /// Resolving the room or opening the socket
    Opening,
    /// Entry command sent, receiving frames
    Active,
    /// Connection ended; `connect()` may open a new one
    Closed,
}

/// Event published by a session
#[derive(Debug)]
pub enum SessionEvent {
    /// Socket connected and entry command sent
    Connected,
    /// Resolution, transport or protocol failure
    Error(Error),
    /// Socket closed
    Closed,
    /// A chat message was received
    Message(ChatEvent),
}

/// Never held across an await point
struct SessionState {
    connection: ConnectionState,
    /// Bumped on every accepted connect; tasks only update state for their own generation
    generation: u64,
    /// Connection task of the current generation; owns the socket
    task: Option<JoinHandle<()>>,
}

fn lock_state(state: &Mutex<SessionState>) -> MutexGuard<'_, SessionState> {
    state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Chat session handle
pub struct Session {
    config: Arc<SessionConfig>,
    resolver: Arc<dyn TargetResolver>,
    matcher: Arc<FrameMatcher>,
    settings: SessionSection,
    state: Arc<Mutex<SessionState>>,
    event_tx: mpsc::Sender<SessionEvent>,
}

impl Session {
    /// Create a session. Events are delivered on the returned receiver.
    pub fn new(
        config: SessionConfig,
        resolver: Arc<dyn TargetResolver>,
        matcher: FrameMatcher,
        settings: &SessionSection,
    ) -> (Self, mpsc::Receiver<SessionEvent>) {
        let (event_tx, event_rx) = mpsc::channel(settings.event_capacity.max(1));

        let state = Arc::new(Mutex::new(SessionState {
            connection: ConnectionState::Idle,
            generation: 0,
            task: None,
        }));

        let session = Session {
            config: Arc::new(config),
            resolver,
            matcher: Arc::new(matcher),
            settings: settings.clone(),
            state,
            event_tx,
        };
        (session, event_rx)
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Get current connection state
    pub async fn connection_state(&self) -> ConnectionState {
        lock_state(&self.state).connection
    }

    /// Start connecting. Ignored while a connection is opening or active.
    pub async fn connect(&self) {
        let mut s = lock_state(&self.state);
        if matches!(
            s.connection,
            ConnectionState::Opening | ConnectionState::Active
        ) {
            debug!(state = ?s.connection, "Connect ignored, session already running");
            return;
        }

        s.generation += 1;
        s.connection = ConnectionState::Opening;

        let ctx = ConnectionContext {
            generation: s.generation,
            config: self.config.clone(),
            resolver: self.resolver.clone(),
            matcher: self.matcher.clone(),
            settings: self.settings.clone(),
            state: self.state.clone(),
            event_tx: self.event_tx.clone(),
        };
        s.task = Some(tokio::spawn(connection_task(ctx)));
    }

    /// Destroy the connection without draining. No-op when nothing is running.
    ///
    /// The connection task is aborted, so the socket is gone by the time
    /// this returns even if the consumer has stopped reading events.
    pub async fn disconnect(&self) {
        let task = {
            let mut s = lock_state(&self.state);
            if !matches!(
                s.connection,
                ConnectionState::Opening | ConnectionState::Active
            ) {
                return;
            }
            s.connection = ConnectionState::Closed;
            s.task.take()
        };

        if let Some(task) = task {
            task.abort();
            // Resolves once the task, and the socket it owns, are dropped
            let _ = task.await;
        }
        info!("Chat session disconnected");

        // A full channel must not block the caller
        if let Err(TrySendError::Full(event)) = self.event_tx.try_send(SessionEvent::Closed) {
            let event_tx = self.event_tx.clone();
            tokio::spawn(async move {
                let _ = event_tx.send(event).await;
            });
        }
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        if let Some(task) = lock_state(&self.state).task.take() {
            task.abort();
        }
    }
}

/// Everything a connection task needs, owned by the task
struct ConnectionContext {
    generation: u64,
    config: Arc<SessionConfig>,
    resolver: Arc<dyn TargetResolver>,
    matcher: Arc<FrameMatcher>,
    settings: SessionSection,
    state: Arc<Mutex<SessionState>>,
    event_tx: mpsc::Sender<SessionEvent>,
}

impl ConnectionContext {
    async fn emit(&self, event: SessionEvent) {
        let _ = self.event_tx.send(event).await;
    }

    fn set_active(&self) {
        let mut s = lock_state(&self.state);
        if s.generation == self.generation && s.connection == ConnectionState::Opening {
            s.connection = ConnectionState::Active;
        }
    }

    /// Move to `Closed`. Returns false when a disconnect or a newer
    /// generation already took over, in which case nothing is reported.
    fn mark_closed(&self) -> bool {
        let mut s = lock_state(&self.state);
        if s.generation != self.generation || s.connection == ConnectionState::Closed {
            return false;
        }
        s.connection = ConnectionState::Closed;
        s.task = None;
        true
    }

    /// Close out a connection that had (or was opening) a transport
    async fn close(&self) {
        if self.mark_closed() {
            self.emit(SessionEvent::Closed).await;
            info!(generation = self.generation, "Chat session closed");
        }
    }
}

/// Main connection task
async fn connection_task(ctx: ConnectionContext) {
    let caster = &ctx.config.caster;
    info!(
        generation = ctx.generation,
        caster = %caster.username,
        identify = %caster.identify,
        "Resolving chat room"
    );

    let target = match ctx.resolver.resolve(caster).await {
        Ok(target) => target,
        Err(e) => {
            warn!(error = %e, "Chat room resolution failed");
            if ctx.mark_closed() {
                ctx.emit(SessionEvent::Error(e)).await;
            }
            return;
        }
    };

    info!(host = %target.host, port = target.port, "Connecting to chat server");

    let mut stream = match TcpStream::connect((target.host.as_str(), target.port)).await {
        Ok(stream) => stream,
        Err(e) => {
            warn!(error = %e, "Failed to connect to chat server");
            ctx.emit(SessionEvent::Error(e.into())).await;
            ctx.close().await;
            return;
        }
    };

    if let Err(e) = write_enter(&mut stream, &target.enter).await {
        warn!(error = %e, "Failed to send entry command");
        ctx.emit(SessionEvent::Error(e)).await;
        ctx.close().await;
        return;
    }

    ctx.set_active();
    info!(host = %target.host, port = target.port, "Entered chat room");
    ctx.emit(SessionEvent::Connected).await;

    let mut decoder = FrameDecoder::new(
        ctx.matcher.clone(),
        ctx.config.clone(),
        ctx.settings.max_line_bytes,
    );
    let mut buf = vec![0u8; ctx.settings.read_buffer_bytes.max(1)];

    loop {
        match stream.read(&mut buf).await {
            Ok(0) => {
                debug!("Chat server closed connection");
                break;
            }
            Ok(n) => match decoder.decode(&buf[..n]) {
                Ok(events) => {
                    for event in events {
                        ctx.emit(SessionEvent::Message(event)).await;
                    }
                }
                Err(e) => {
                    warn!(error = %e, "Discarding buffered frames");
                    ctx.emit(SessionEvent::Error(e)).await;
                }
            },
            Err(e) => {
                warn!(error = %e, "Read error");
                ctx.emit(SessionEvent::Error(e.into())).await;
                break;
            }
        }
    }

    drop(stream);
    ctx.close().await;
}
