//! oggcodec - List and repack the packets of an Ogg stream.

use clap::{Parser, Subcommand};

mod commands;

use commands::{ListCommand, RepackCommand};

/// oggcodec - Ogg container tool.
///
/// Demuxes and remuxes a single logical Ogg stream without looking inside
/// the codec packets.
#[derive(Parser)]
#[command(name = "oggcodec")]
#[command(about = "Ogg packet listing and repacking tool")]
#[command(version)]
pub struct Cli {
    /// Output as JSON lines (for piping)
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
    /// List the packets of the first logical stream
    List(ListCommand),
    /// Demux the first logical stream and mux it into a new file
    Repack(RepackCommand),
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Setup logging
    if cli.verbose {
        tracing_subscriber::fmt()
            .with_max_level(tracing::Level::DEBUG)
            .with_target(false)
            .with_writer(std::io::stderr)
            .init();
    }

    match &cli.command {
        Commands::List(cmd) => cmd.run(&cli),
        Commands::Repack(cmd) => cmd.run(&cli),
    }
}
