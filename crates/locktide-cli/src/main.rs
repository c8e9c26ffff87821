//! Locktide CLI - inspect and simulate lock weights, decay and emission.

pub mod commands;
pub mod telemetry;

use clap::Parser;
use colored::Colorize;

fn main() -> anyhow::Result<()> {
    let cli = commands::Cli::parse();
    telemetry::init_telemetry(&cli.log_level, cli.json_logs)?;

    if let Err(e) = commands::execute(cli) {
        eprintln!("{}", format!("Error: {:#}", e).red());
        std::process::exit(1);
    }

    Ok(())
}
