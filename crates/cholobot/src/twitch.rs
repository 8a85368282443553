//! Twitch Helix collaborator: app access token plus the live-status query.

use reqwest::StatusCode;
use serde::Deserialize;
use thiserror::Error;
use tracing::debug;

use crate::config::TwitchConfig;

const TOKEN_URL: &str = "https://id.twitch.tv/oauth2/token";
const STREAMS_URL: &str = "https://api.twitch.tv/helix/streams";

#[derive(Debug, Error)]
pub enum TwitchError {
    /// The token endpoint rejected the client credentials. Propagated as-is;
    /// the next tick retries.
    #[error("Twitch token request rejected: {0}")]
    Auth(StatusCode),
    #[error("Twitch Helix request failed: {0}")]
    Api(StatusCode),
    #[error("Twitch transport error: {0}")]
    Transport(#[from] reqwest::Error),
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
}

#[derive(Debug, Deserialize)]
struct StreamsResponse {
    data: Vec<serde_json::Value>,
}

/// Client-credentials Helix client. The access token is cached and only
/// (re)acquired when missing or rejected.
pub struct TwitchClient {
    http: reqwest::Client,
    client_id: String,
    client_secret: String,
    user_login: String,
    token: Option<String>,
}

impl TwitchClient {
    pub fn new(config: &TwitchConfig) -> Result<Self, TwitchError> {
        let http = reqwest::Client::builder()
            .user_agent("cholobot/0.1")
            .build()?;

        Ok(Self {
            http,
            client_id: config.client_id.clone(),
            client_secret: config.client_secret.clone(),
            user_login: config.user_login.clone(),
            token: None,
        })
    }

    /// Whether the broadcaster currently has a live stream. Fetched fresh on
    /// every call; only the token is cached.
    pub async fn is_live(&mut self) -> Result<bool, TwitchError> {
        let token = match &self.token {
            Some(token) => token.clone(),
            None => self.acquire_token().await?,
        };

        match self.query_streams(&token).await {
            Err(TwitchError::Api(status)) if status == StatusCode::UNAUTHORIZED => {
                // token expired; reacquire once and retry the query
                debug!("Cached Twitch token rejected, reacquiring");
                let token = self.acquire_token().await?;
                self.query_streams(&token).await
            }
            other => other,
        }
    }

    async fn acquire_token(&mut self) -> Result<String, TwitchError> {
        let response = self
            .http
            .post(TOKEN_URL)
            .query(&[
                ("client_id", self.client_id.as_str()),
                ("client_secret", self.client_secret.as_str()),
                ("grant_type", "client_credentials"),
            ])
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(TwitchError::Auth(response.status()));
        }

        let token: TokenResponse = response.json().await?;
        debug!("Acquired Twitch app access token");
        self.token = Some(token.access_token.clone());
        Ok(token.access_token)
    }

    async fn query_streams(&self, token: &str) -> Result<bool, TwitchError> {
        let response = self
            .http
            .get(STREAMS_URL)
            .query(&[("user_login", self.user_login.as_str())])
            .header("Client-ID", &self.client_id)
            .bearer_auth(token)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(TwitchError::Api(response.status()));
        }

        let streams: StreamsResponse = response.json().await?;
        Ok(!streams.data.is_empty())
    }
}
