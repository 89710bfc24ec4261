mod api;
mod cli;
mod infrastructure;

use clap::Parser;
use colored::Colorize;

use infrastructure::{build_config, initialize_telemetry, ServiceProvider};

#[tokio::main]
async fn main() {
    let cli = cli::Cli::parse();

    let config = match build_config(&cli.config) {
        Ok(x) => x,
        Err(e) => {
            eprintln!("{}: {e:#}", "Failed to build config".red());
            std::process::exit(1);
        }
    };

    if let Err(e) = initialize_telemetry(config.telemetry()) {
        eprintln!("{}: {e:#}", "Failed to initialize logger".red());
        std::process::exit(1);
    }

    let provider = match ServiceProvider::build(config) {
        Ok(x) => x,
        Err(e) => {
            eprintln!("{}: {e:#}", "Failed to set up services".red());
            std::process::exit(1);
        }
    };

    if let Err(e) = api::run(&provider, cli.command).await {
        tracing::error!("{e:#}");
        eprintln!("{}: {e:#}", "Error".red());
        std::process::exit(1);
    }
}
