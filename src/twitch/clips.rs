use std::time::Duration;

use chrono::{DateTime, Utc};
use reqwest::StatusCode;
use tracing::{error, info, warn};

use crate::config::REQUEST_TIMEOUT_SECS;
use crate::error::Error;
use crate::twitch::types::{ClipRecord, ClipsResponse};
use crate::twitch::TwitchClient;

/// Token refreshes allowed per fetch after a 401.
const MAX_AUTH_RETRIES: u32 = 1;

/// Start of the clip query window, formatted the way Helix expects.
pub fn window_start(now: DateTime<Utc>, lookback: Duration) -> String {
    let lookback = chrono::Duration::from_std(lookback).unwrap_or(chrono::Duration::zero());
    (now - lookback).format("%Y-%m-%dT%H:%M:%SZ").to_string()
}

impl TwitchClient {
    /// Most recent clip created inside the lookback window, if any.
    ///
    /// A 401 triggers one token refresh and one retry of the same request,
    /// whether or not the refresh succeeded.
    pub async fn fetch_latest_clip(&self) -> Option<ClipRecord> {
        let started_at = window_start(Utc::now(), self.lookback);
        let mut auth_retries = 0;

        loop {
            let resp = match self.request_clips(&started_at).await {
                Ok(resp) => resp,
                Err(e) => {
                    error!(error = %e, "Network error while fetching clips");
                    return None;
                }
            };

            match resp.status() {
                StatusCode::OK => {
                    return match resp.json::<ClipsResponse>().await {
                        Ok(body) => body.data.into_iter().next(),
                        Err(e) => {
                            error!(error = %e, "Could not decode clip listing");
                            None
                        }
                    };
                }
                StatusCode::UNAUTHORIZED if auth_retries < MAX_AUTH_RETRIES => {
                    auth_retries += 1;
                    info!("Token expired, refreshing");
                    if !self.refresh_access_token().await {
                        warn!("Token refresh failed, retrying with current token");
                    }
                }
                StatusCode::UNAUTHORIZED => {
                    warn!("Clip request still unauthorized after token refresh");
                    return None;
                }
                _ => {
                    let err = Error::from_response(resp).await;
                    error!(error = %err, "Twitch API error");
                    return None;
                }
            }
        }
    }

    async fn request_clips(&self, started_at: &str) -> Result<reqwest::Response, Error> {
        let resp = self
            .http
            .get(format!("{}/clips", self.api_url))
            .query(&[
                ("broadcaster_id", self.broadcaster_id.as_str()),
                ("first", "1"),
                ("started_at", started_at),
            ])
            .header(
                "Authorization",
                format!("Bearer {}", self.credentials.access_token()),
            )
            .header("Client-Id", &self.credentials.client_id)
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .send()
            .await?;
        Ok(resp)
    }
}
