//! KakaoTV Core Library
//!
//! Session configuration, frame classification, line reassembly and the
//! chat event model shared by the network layer and the CLI.

pub mod config;
pub mod error;
pub mod event;
pub mod matcher;
pub mod reassembler;
pub mod settings;

pub use config::{Caster, CasterOptions, SessionConfig, SessionOptions, DEFAULT_MODULE_NAME};
pub use error::{Error, Result};
pub use event::ChatEvent;
pub use matcher::{EventKind, EventRule, FrameMatch, FrameMatcher};
pub use reassembler::LineBuffer;
pub use settings::{BridgeSettings, HttpSection, SessionSection};
