//! BankLink - bank balance signals for home automation
//!
//! Main entry point for the `banklink` binary.

use anyhow::Context as _;
use banklink_app::{AppContext, Command};
use banklink_infra::{config, init_tracing};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env before configuration so its variables are visible
    let dotenv = dotenvy::dotenv();

    let config = config::load().context("failed to load configuration")?;
    init_tracing(&config.logging)?;

    match dotenv {
        Ok(path) => tracing::debug!(path = %path.display(), "loaded .env"),
        Err(e) => tracing::debug!(error = %e, "no .env file loaded"),
    }

    let command = Command::parse(std::env::args().skip(1))?;
    let ctx = AppContext::new(config)?;

    if command == Command::Poll {
        banklink_app::run_poller(&ctx, async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::error!(error = %e, "failed to listen for Ctrl-C");
            }
        })
        .await?;
        return Ok(());
    }

    for line in banklink_app::run(&ctx, &command).await? {
        println!("{line}");
    }
    Ok(())
}
