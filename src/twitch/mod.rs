pub mod auth;
pub mod clips;
pub mod types;

use async_trait::async_trait;

use crate::config::Config;
use crate::state::Credentials;
pub use types::ClipRecord;

/// Source of the most recent clip for the monitored broadcaster.
#[async_trait]
pub trait ClipSource: Send + Sync {
    async fn fetch_latest_clip(&self) -> Option<ClipRecord>;
}

/// Helix client bound to one broadcaster and one set of credentials.
pub struct TwitchClient {
    http: reqwest::Client,
    credentials: Credentials,
    api_url: String,
    token_url: String,
    broadcaster_id: String,
    lookback: std::time::Duration,
}

impl TwitchClient {
    pub fn new(config: &Config, credentials: Credentials, http: reqwest::Client) -> Self {
        Self {
            http,
            credentials,
            api_url: config.api_url.clone(),
            token_url: config.token_url.clone(),
            broadcaster_id: config.broadcaster_id.clone(),
            lookback: config.lookback(),
        }
    }

    #[cfg(test)]
    pub fn credentials(&self) -> &Credentials {
        &self.credentials
    }
}

#[async_trait]
impl ClipSource for TwitchClient {
    async fn fetch_latest_clip(&self) -> Option<ClipRecord> {
        TwitchClient::fetch_latest_clip(self).await
    }
}
