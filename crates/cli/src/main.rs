mod cli;
mod commands;

use anyhow::Result;
use clap::Parser;

use crate::cli::CliArgs;

#[tokio::main]
async fn main() -> Result<()> {
    catbase_core::config::load_dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    let args = CliArgs::parse();

    let mut config = catbase_core::Config::from_env();
    if let Some(path) = args.storage_path {
        config.storage.storage_path = path;
    }

    commands::run(args.command, &config).await
}
