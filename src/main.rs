use clap::Parser;
use tracing_subscriber::EnvFilter;

use ding_dong::{lifecycle, Config};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Logs go to stderr; stdout carries request dumps and the final report
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let config = Config::parse();

    lifecycle::run(config, lifecycle::shutdown_signal()).await?;
    Ok(())
}
