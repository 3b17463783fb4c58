//! LoreWeave CLI - inspect resolved narrative graphs from the terminal

pub mod commands;

use clap::Parser;
use commands::Commands;

#[derive(Parser)]
#[command(name = "loreweave")]
#[command(about = "LoreWeave: narrative graph inspection for game record stores", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

/// Run the LoreWeave CLI
pub fn run_cli() -> anyhow::Result<()> {
    // Setup logging
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();
    cli.command.execute()?;

    Ok(())
}
