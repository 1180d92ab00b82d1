//! lbcheck Entry Point

use clap::Parser;
use lbcheck::cli::{run, Cli};
use lbcheck::logging;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    if let Err(e) = logging::init() {
        eprintln!("Failed to initialize logging: {}", e);
    }

    if let Err(e) = run::execute(cli).await {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
