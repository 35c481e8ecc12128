//! kakaotv-chat - bridge a KakaoTV live broadcast's chat to stdout
//!
//! Resolves the broadcast's chat room, joins it and prints every chat
//! message until the room closes or Ctrl-C is pressed.

use std::path::PathBuf;

use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use kakaotv_core::{BridgeSettings, CasterOptions, SessionConfig, SessionOptions};
use kakaotv_net::{ChatModule, ConnectionState, SessionEvent};

mod output;

/// Bridge a KakaoTV live chat to stdout
#[derive(Parser, Debug)]
#[command(name = "kakaotv-chat", version)]
struct Cli {
    /// Live link URL, e.g. https://tv.kakao.com/channel/<caster>/livelink/<id>
    source: String,

    /// Settings file (defaults to the platform config directory)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Module name reported with each message
    #[arg(long)]
    name: Option<String>,

    /// Override the caster username taken from the URL
    #[arg(long)]
    username: Option<String>,

    /// Override the live link identifier taken from the URL
    #[arg(long)]
    identify: Option<String>,

    /// Print one JSON object per message
    #[arg(long)]
    json: bool,
}

impl Cli {
    fn session_options(&self) -> SessionOptions {
        SessionOptions {
            name: self.name.clone(),
            source: None,
            caster: CasterOptions {
                username: self.username.clone(),
                identify: self.identify.clone(),
            },
        }
    }
}

#[tokio::main]
async fn main() {
    // Initialize logging
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    let settings = match &cli.config {
        Some(path) => BridgeSettings::load(path),
        None => BridgeSettings::load_default(),
    };
    let settings = match settings {
        Ok(settings) => settings,
        Err(e) => {
            tracing::error!("Failed to load settings: {}", e);
            std::process::exit(1);
        }
    };

    let config = match SessionConfig::from_source(&cli.source, cli.session_options()) {
        Ok(config) => config,
        Err(e) => {
            tracing::error!("{}", e);
            std::process::exit(2);
        }
    };

    let mut module = match ChatModule::new(config, &settings) {
        Ok(module) => module,
        Err(e) => {
            tracing::error!("Failed to initialize chat module: {}", e);
            std::process::exit(1);
        }
    };

    tracing::info!(
        caster = %module.config().caster.username,
        identify = %module.config().caster.identify,
        "Starting kakaotv-chat"
    );
    module.connect().await;

    loop {
        tokio::select! {
            event = module.next_event() => {
                let Some(event) = event else { break };
                match event {
                    SessionEvent::Connected => tracing::info!("Joined chat room"),
                    SessionEvent::Message(chat) => output::print_message(&chat, cli.json),
                    SessionEvent::Error(e) => {
                        tracing::error!("{}", e);
                        // Resolution failures end the session without a socket close
                        if module.connection_state().await == ConnectionState::Closed {
                            break;
                        }
                    }
                    SessionEvent::Closed => break,
                }
            }

            _ = tokio::signal::ctrl_c() => {
                tracing::info!("Interrupted, leaving chat room");
                module.disconnect().await;
            }
        }
    }

    tracing::info!("kakaotv-chat stopped");
}
