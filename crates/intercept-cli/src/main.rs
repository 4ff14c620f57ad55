use anyhow::{Context, Result};
use clap::Parser;
use intercept_cli::{
    cli::{Cli, Commands},
    commands, logging,
};
use intercept_config::InterceptConfig;
use tracing::debug;

fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => InterceptConfig::load(path)
            .with_context(|| format!("Failed to load config {}", path.display()))?,
        None => InterceptConfig::default(),
    };

    // Initialize logging
    logging::init(&logging::effective(&config.logging, cli.log_level, cli.verbose));
    debug!(rules = config.rules.len(), "configuration ready");

    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    match &cli.command {
        Commands::Run { query } => commands::run(&config, query, &mut out),
        Commands::Explain { query } => commands::explain(&config, query, &mut out),
    }
}
