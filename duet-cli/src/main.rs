use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::*;
use duet_client::{
    CallCommand, CallController, CallEvent, ClientConfig, RtcEngineFactory, SyntheticDevices,
};
use duet_core::{Profile, RoomId};
use duet_server::ServerConfig;
use std::net::SocketAddr;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "duet")]
#[command(about = "Two-party call signaling server and test peer")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the signaling server.
    Serve {
        #[arg(long, env = "DUET_BIND", default_value = "0.0.0.0:8000")]
        bind: SocketAddr,

        #[arg(long, env = "DUET_ROOM_CAPACITY", default_value_t = duet_core::utils::DEFAULT_ROOM_CAPACITY)]
        room_capacity: usize,
    },

    /// Join a room as a peer with synthetic media.
    Peer {
        #[arg(long, env = "DUET_SERVER_URL", default_value = "ws://127.0.0.1:8000/ws")]
        url: String,

        #[arg(short, long)]
        room: String,

        #[arg(short, long)]
        email: String,

        #[arg(short, long)]
        name: String,

        /// Call the other member as soon as there is one.
        #[arg(long)]
        call: bool,

        /// Hold incoming calls until `accept` is typed.
        #[arg(long)]
        manual_accept: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    match Cli::parse().command {
        Commands::Serve {
            bind,
            room_capacity,
        } => {
            println!("{}", "Starting duet signaling server...".green().bold());
            info!("Binding {} with room capacity {}", bind, room_capacity);
            let config = ServerConfig::default()
                .with_bind_addr(bind)
                .with_room_capacity(room_capacity);
            duet_server::serve(config).await?;
            info!("Signaling server shut down");
        }

        Commands::Peer {
            url,
            room,
            email,
            name,
            call,
            manual_accept,
        } => run_peer(url, RoomId::new(room), Profile::new(email, name), call, manual_accept).await?,
    }

    Ok(())
}

async fn run_peer(
    url: String,
    room: RoomId,
    profile: Profile,
    call: bool,
    manual_accept: bool,
) -> Result<()> {
    println!("{} {}", "Connecting to".cyan(), url);
    let (signaling, connection) = duet_client::connect(&url)
        .await
        .with_context(|| format!("Failed to reach signaling server at {}", url))?;

    info!(
        "Peer {} <{}> joining room '{}' (auto accept: {})",
        profile.name, profile.email, room, !manual_accept
    );
    let config = ClientConfig::default().with_auto_accept(!manual_accept);
    let factory = RtcEngineFactory::new(&config);
    let devices = SyntheticDevices::new(profile.name.clone());
    let (controller, mut events) =
        CallController::new(profile, config, signaling, factory, devices);

    let (commands, command_rx) = mpsc::unbounded_channel();
    let controller_task = tokio::spawn(controller.run(command_rx));

    commands.send(CallCommand::Join(room))?;
    print_help();

    let mut stdin = BufReader::new(tokio::io::stdin()).lines();
    let mut called = false;
    let mut stdin_open = true;

    loop {
        tokio::select! {
            event = events.recv() => {
                let Some(event) = event else { break };
                if call && !called && has_peer(&event) {
                    info!("Room has a peer, placing the call");
                    called = true;
                    let _ = commands.send(CallCommand::CallRoomPeer);
                }
                print_event(&event);
            }

            line = stdin.next_line(), if stdin_open => {
                let Some(line) = line? else {
                    debug!("stdin closed, shutting down");
                    stdin_open = false;
                    let _ = commands.send(CallCommand::Shutdown);
                    continue;
                };
                match parse_command(line.trim()) {
                    Some(cmd) => {
                        debug!("Command from stdin: {:?}", cmd);
                        let _ = commands.send(cmd);
                    }
                    None if line.trim().is_empty() => {}
                    None => print_help(),
                }
            }

            _ = tokio::signal::ctrl_c() => {
                warn!("Interrupted, hanging up");
                let _ = commands.send(CallCommand::Shutdown);
            }
        }
    }

    controller_task.await??;
    connection.abort();
    info!("Peer session finished");
    println!("{}", "Bye.".green());
    Ok(())
}

fn has_peer(event: &CallEvent) -> bool {
    match event {
        CallEvent::Joined { peers, .. } => !peers.is_empty(),
        CallEvent::PeerJoined(_) => true,
        _ => false,
    }
}

fn parse_command(line: &str) -> Option<CallCommand> {
    match line {
        "call" => Some(CallCommand::CallRoomPeer),
        "accept" => Some(CallCommand::Accept),
        "send" => Some(CallCommand::SendStreams),
        "hangup" => Some(CallCommand::HangUp),
        "leave" => Some(CallCommand::Leave),
        "quit" | "exit" => Some(CallCommand::Shutdown),
        _ => None,
    }
}

fn print_help() {
    println!(
        "{} call | accept | send | hangup | leave | quit",
        "Commands:".bold()
    );
}

fn print_event(event: &CallEvent) {
    match event {
        CallEvent::Connected { id } => println!("{} {}", "Connected as".green(), id),
        CallEvent::Joined { room, peers } => {
            println!("{} {}", "Joined room".green().bold(), room);
            for peer in peers {
                println!("   {} {} <{}> ({})", "present:".cyan(), peer.name, peer.email, peer.id);
            }
        }
        CallEvent::PeerJoined(peer) => {
            println!("{} {} <{}> ({})", "Joined:".cyan(), peer.name, peer.email, peer.id)
        }
        CallEvent::PeerLeft(id) => println!("{} {}", "Left:".yellow(), id),
        CallEvent::Calling { to } => println!("{} {}", "Calling".cyan(), to),
        CallEvent::IncomingCall { from, name } => {
            println!("{} {} ({})", "Incoming call from".magenta().bold(), name, from)
        }
        CallEvent::CallEstablished { remote } => {
            println!("{} {}", "In call with".green().bold(), remote)
        }
        CallEvent::RemoteStream { remote, stream_id } => {
            println!("{} {} from {}", "Receiving stream".green(), stream_id, remote)
        }
        CallEvent::Renegotiated { remote } => {
            println!("{} {}", "Renegotiated with".cyan(), remote)
        }
        CallEvent::CallFailed { error, .. } => println!("{} {}", "Call failed:".red().bold(), error),
        CallEvent::HungUp { remote, reason } => {
            println!("{} {} ({:?})", "Call ended with".yellow(), remote, reason)
        }
        CallEvent::RelayError { message, .. } => println!("{} {}", "Server:".red(), message),
    }
}
