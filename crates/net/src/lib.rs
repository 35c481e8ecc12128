//! KakaoTV Network Library
//!
//! Bridges a live broadcast's chat room to structured events.
//!
//! # Architecture
//!
//! - **Resolver**: looks up the broadcast's chat group, then the room's
//!   server address and entry token over HTTP
//! - **Session**: owns the chat socket, sends `ENTER <token>` and turns
//!   newline-delimited frames into chat events
//! - **ChatModule**: the consumer-facing handle
//!
//! # Usage
//!
//! ```ignore
//! let settings = BridgeSettings::load_default()?;
//! let config = SessionConfig::from_source(url, SessionOptions::default())?;
//! let mut module = ChatModule::new(config, &settings)?;
//!
//! module.connect().await;
//! while let Some(event) = module.next_event().await {
//!     match event {
//!         SessionEvent::Message(chat) => { /* handle */ }
//!         SessionEvent::Closed => break,
//!         _ => {}
//!     }
//! }
//! ```

pub mod error;
mod frame;
pub mod module;
pub mod resolver;
pub mod session;

pub use error::{Error, Result};
pub use module::ChatModule;
pub use resolver::{BroadcastMeta, HttpResolver, RoomTarget, TargetResolver};
pub use session::{ConnectionState, Session, SessionEvent};
