use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::*;
use duet::client::{
    CallSnapshot, CallState, ClientConfig, MediaConstraints, SyntheticDevices, spawn_call,
};
use duet::model::IceServerConfig;
use duet::server::ServerConfig;
use duet::utils::{DEFAULT_HOST, DEFAULT_PORT, DEFAULT_SIGNALING_URL, DEFAULT_STUN_ADDR};
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "duet")]
#[command(about = "Two-party WebRTC signaling relay and headless peer")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the signaling relay.
    Serve {
        #[arg(long, env = "DUET_HOST", default_value = DEFAULT_HOST)]
        host: String,

        #[arg(short, long, env = "DUET_PORT", default_value_t = DEFAULT_PORT)]
        port: u16,
    },
    /// Join a room as a headless peer with synthetic media.
    Call {
        room: String,

        #[arg(long, env = "DUET_SIGNALING_URL", default_value = DEFAULT_SIGNALING_URL)]
        url: String,

        /// Comma-separated STUN/TURN URLs.
        #[arg(
            long = "ice",
            env = "DUET_ICE_SERVERS",
            value_delimiter = ',',
            default_value = DEFAULT_STUN_ADDR
        )]
        ice_servers: Vec<String>,

        #[arg(long)]
        ice_username: Option<String>,

        #[arg(long)]
        ice_credential: Option<String>,

        #[arg(long)]
        no_audio: bool,

        #[arg(long)]
        no_video: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("duet=info")),
        )
        .init();

    match Cli::parse().command {
        Commands::Serve { host, port } => {
            let config = ServerConfig { host, port };
            println!(
                "{} {}",
                "📡 Relay listening on".green().bold(),
                format!("ws://{}", config.addr()).cyan()
            );
            duet::server::serve(config).await
        }
        Commands::Call {
            room,
            url,
            ice_servers,
            ice_username,
            ice_credential,
            no_audio,
            no_video,
        } => {
            let config = ClientConfig {
                signaling_url: url,
                ice_servers: vec![IceServerConfig {
                    urls: ice_servers,
                    username: ice_username,
                    credential: ice_credential,
                }],
                constraints: MediaConstraints {
                    audio: !no_audio,
                    video: !no_video,
                },
            };
            call(config, room).await
        }
    }
}

async fn call(config: ClientConfig, room: String) -> Result<()> {
    println!("{} {}", "📞 Joining room".green().bold(), room.cyan());

    let (handle, task) = spawn_call(config, Arc::new(SyntheticDevices));
    let mut updates = handle.subscribe();
    handle.join(room.as_str())?;

    loop {
        tokio::select! {
            changed = updates.changed() => {
                if changed.is_err() {
                    break;
                }
                let snapshot = updates.borrow_and_update().clone();
                print_status(&snapshot);
                if snapshot.state == CallState::Failed {
                    break;
                }
            }
            _ = tokio::signal::ctrl_c() => {
                println!("{}", "👋 Leaving...".yellow());
                break;
            }
        }
    }

    handle.shutdown()?;
    task.await.context("Call controller panicked")?;
    Ok(())
}

fn print_status(snapshot: &CallSnapshot) {
    let state = format!("{:?}", snapshot.state);
    let state = match snapshot.state {
        CallState::Connected => state.green().bold(),
        CallState::Failed => state.red().bold(),
        CallState::Closed | CallState::Idle => state.yellow(),
        _ => state.cyan(),
    };
    println!("   [{}] {}", state, snapshot.status);
}
