//! HexTactics CLI - headless driver for the simulation core
//!
//! Commands:
//! - grid: Generate and print a board
//! - path: Shortest path between two hexes
//! - replay: Run a scripted match from JSON files

mod board_cmd;
mod replay;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "hextactics")]
#[command(about = "HexTactics turn-based combat simulator")]
struct Cli {
    /// Random seed, overrides any seed in config files
    #[arg(long, global = true)]
    seed: Option<u64>,

    /// More logging (-v debug, -vv trace)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate a grid and print it
    Grid(board_cmd::GridArgs),
    /// Find the shortest path between two hexes
    Path(board_cmd::PathArgs),
    /// Replay a scripted match
    Replay(replay::ReplayArgs),
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Commands::Grid(args) => board_cmd::run_grid(args, cli.seed),
        Commands::Path(args) => board_cmd::run_path(args, cli.seed),
        Commands::Replay(args) => replay::run(args, cli.seed),
    }
}

/// RUST_LOG wins over -v
fn init_logging(verbose: u8) {
    let default = match verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}
