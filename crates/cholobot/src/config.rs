use anyhow::{Context, Result};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub discord: DiscordConfig,
    pub twitch: TwitchConfig,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiscordConfig {
    pub token: String,
    pub channel_id: u64,
    /// Pre-existing status message to adopt instead of posting a new one.
    pub message_id: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TwitchConfig {
    pub client_id: String,
    pub client_secret: String,
    pub user_login: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let required = |key: &str| {
            lookup(key)
                .filter(|value| !value.is_empty())
                .with_context(|| format!("{key} is not set"))
        };

        let token = required("DISCORD_TOKEN")?;
        let channel_id = required("CHANNEL_ID")?
            .parse::<u64>()
            .context("CHANNEL_ID must be a numeric channel id")?;
        let message_id = match lookup("MESSAGE_ID").filter(|value| !value.is_empty()) {
            Some(raw) => Some(
                raw.parse::<u64>()
                    .context("MESSAGE_ID must be a numeric message id")?,
            ),
            None => None,
        };

        Ok(Self {
            discord: DiscordConfig {
                token,
                channel_id,
                message_id,
            },
            twitch: TwitchConfig {
                client_id: required("TWITCH_CLIENT_ID")?,
                client_secret: required("TWITCH_CLIENT_SECRET")?,
                user_login: required("TWITCH_USER")?,
            },
        })
    }
}
