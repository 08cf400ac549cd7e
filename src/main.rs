use clap::Parser;
use cog::cli::commands::{index, init, mcp, status};
use cog::cli::{Cli, Commands};
use cog::Settings;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let settings = Settings::load().unwrap_or_else(|e| {
        eprintln!("Configuration error: {e}");
        Settings::default()
    });

    cog::logging::init_with_config(&settings.logging);

    match cli.command {
        Commands::Init { force } => init::run_init(force),
        Commands::Index { patterns } => index::run(patterns),
        Commands::Status => status::run(),
        Commands::Mcp => mcp::run(&settings).await,
    }
}
