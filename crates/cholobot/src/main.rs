mod config;
mod discord;
mod embed;
mod publish;
mod schedule;
mod status;
mod twitch;

use anyhow::{Context as _, Result};
use tracing::info;

use crate::config::Config;

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    let config = Config::from_env().context("Failed to load configuration")?;
    info!(
        channel_id = config.discord.channel_id,
        broadcaster = %config.twitch.user_login,
        "Configuration loaded"
    );

    discord::run(config).await
}
