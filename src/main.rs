mod cli;

use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use veo_studio::Config;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Credentials may come from a .env file next to the working directory
    dotenvy::dotenv().ok();

    let cli = cli::Cli::parse();

    // Initialize tracing; stdout is reserved for command output
    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| filter.into()),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr),
        )
        .init();

    let config_path = Config::resolve_path(cli.config.as_deref());
    let config = Config::load(&config_path)?;

    cli::commands::dispatch(&config, &config_path, cli.command, cli.pretty).await
}
