//! Opus CLI - encode and decode raw PCM with libopus.

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod commands;
mod config;
mod packets;

use commands::{DecodeCommand, EncodeCommand, InfoCommand};

/// Opus CLI - encode and decode raw PCM with libopus.
///
/// PCM files are headerless interleaved signed 16-bit little-endian.
/// Packet files are a sequence of records, each a 16-bit little-endian
/// length followed by that many bytes. A zero-length record marks a
/// lost packet.
#[derive(Parser)]
#[command(name = "opus")]
#[command(about = "Opus codec CLI tool")]
#[command(version)]
pub struct Cli {
    /// Codec config file (YAML with encoder/decoder sections)
    #[arg(long, global = true)]
    pub config: Option<String>,

    /// Output reports as JSON (for piping)
    #[arg(long, global = true)]
    pub json: bool,

    /// Verbose output
    #[arg(short = 'v', long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Encode raw PCM into a packet file
    Encode(EncodeCommand),
    /// Decode a packet file into raw PCM
    Decode(DecodeCommand),
    /// Show the libopus version and frame sizes
    Info(InfoCommand),
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Setup logging
    if cli.verbose {
        tracing_subscriber::fmt()
            .with_max_level(tracing::Level::DEBUG)
            .with_target(false)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(EnvFilter::from_default_env())
            .with_target(false)
            .init();
    }

    match &cli.command {
        Commands::Encode(cmd) => cmd.run(&cli),
        Commands::Decode(cmd) => cmd.run(&cli),
        Commands::Info(cmd) => cmd.run(&cli),
    }
}
