//! Runs the playground deploy scripts on a simulated network.
use clap::Parser;
use playground_deploy::Config;
use tracing_subscriber::EnvFilter;

mod cli;
mod commands;

use cli::Cli;

#[tokio::main]
async fn main() -> eyre::Result<()> {
    let Cli { config, network, command } = Cli::parse();

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().pretty().with_env_filter(filter).init();

    let config = Config::load(&config)?;
    let network = config.network(&network)?;

    command.run(&config, network).await
}
