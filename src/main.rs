//! soma-forge CLI - Recipe-driven conda package forge
//!
//! Entry point for the soma-forge command-line application.

use clap::Parser;

use soma_forge::cli::output::{display_error, exit_code, OutputConfig};
use soma_forge::cli::Cli;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let output_config = OutputConfig::new(cli.quiet, cli.verbose);
    tracing_subscriber::fmt()
        .with_env_filter(output_config.env_filter())
        .with_writer(std::io::stderr)
        .init();

    // Run the command and handle errors
    if let Err(e) = cli.run().await {
        display_error(&e);
        std::process::exit(exit_code(&e));
    }
}
