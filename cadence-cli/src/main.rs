//! Cadence CLI - Command-line interface
//!
//! Provides command-line access to Cadence transfers and the web server.

mod commands;

use cadence_core::tracing_setup::{CliLogLevel, init_tracing};
use clap::Parser;

#[derive(Parser)]
#[command(name = "cadence")]
#[command(about = "A music collection transfer engine")]
struct Cli {
    /// Console log verbosity; full debug logs always go to logs/
    #[arg(long, value_enum, default_value_t = CliLogLevel::Warn)]
    log_level: CliLogLevel,

    #[command(subcommand)]
    command: commands::Commands,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    if let Err(error) = init_tracing(cli.log_level, None) {
        eprintln!("Failed to initialize tracing: {error}");
    }

    commands::handle_command(cli.command).await
}
