//! pcmctl - command-line control client for pcmd-ap
//!
//! Sends one command per invocation and prints query replies in seconds.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use pcmd_common::ControlClient;
use std::path::PathBuf;
use std::time::Duration;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser, Debug)]
#[command(name = "pcmctl")]
#[command(about = "Control a running pcmd-ap daemon")]
#[command(version)]
struct Args {
    /// Daemon host
    #[arg(long, default_value = "127.0.0.1", env = "PCMD_HOST")]
    host: String,

    /// Daemon control port
    #[arg(short, long, default_value = "4044", env = "PCMD_PORT")]
    port: u16,

    /// Connect/read timeout in milliseconds (0 disables)
    #[arg(long, default_value = "5000")]
    timeout_ms: u64,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Start playing a file from the beginning
    Play { file: PathBuf },
    /// Pause output
    Pause,
    /// Resume paused output
    Resume,
    /// Jump to a position in seconds
    Seek { seconds: f32 },
    /// Print elapsed playback time
    Elapsed,
    /// Print the length of the loaded file
    Duration,
    /// Print elapsed and total time
    Status,
    /// List the files in the daemon's root folder (run on the daemon host)
    List {
        #[arg(long, env = "PCMD_ROOT_FOLDER")]
        root_folder: PathBuf,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "pcmd_common=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let args = Args::parse();
    let timeout = (args.timeout_ms > 0).then(|| Duration::from_millis(args.timeout_ms));
    let client = ControlClient::new((args.host.as_str(), args.port))
        .with_context(|| format!("Failed to resolve {}:{}", args.host, args.port))?
        .with_timeout(timeout);

    let addr = client.addr();
    match args.command {
        Command::Play { file } => client
            .play(&file)
            .with_context(|| format!("PLAY to {} failed", addr))?,
        Command::Pause => client
            .pause()
            .with_context(|| format!("PAUSE to {} failed", addr))?,
        Command::Resume => client
            .resume()
            .with_context(|| format!("RESUME to {} failed", addr))?,
        Command::Seek { seconds } => client
            .seek(seconds)
            .with_context(|| format!("SEEK to {} failed", addr))?,
        Command::Elapsed => {
            let elapsed = client
                .elapsed()
                .with_context(|| format!("GET_ELAPSED from {} failed", addr))?;
            println!("{:.3}", elapsed);
        }
        Command::Duration => {
            let duration = client
                .duration()
                .with_context(|| format!("GET_DURATION from {} failed", addr))?;
            println!("{:.3}", duration);
        }
        Command::Status => {
            let elapsed = client
                .elapsed()
                .with_context(|| format!("GET_ELAPSED from {} failed", addr))?;
            let duration = client
                .duration()
                .with_context(|| format!("GET_DURATION from {} failed", addr))?;
            println!("{} / {}", format_clock(elapsed), format_clock(duration));
        }
        Command::List { root_folder } => {
            for track in pcmd_ap::library::list_tracks(&root_folder)? {
                println!("{}", track.display());
            }
        }
    }

    Ok(())
}

/// Format seconds as m:ss.t
fn format_clock(seconds: f32) -> String {
    let tenths = (seconds.max(0.0) * 10.0).round() as u64;
    format!("{}:{:02}.{}", tenths / 600, (tenths / 10) % 60, tenths % 10)
}
