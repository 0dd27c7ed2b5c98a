use std::time::Duration;

use reqwest::StatusCode;
use tracing::{error, info};

use crate::config::REQUEST_TIMEOUT_SECS;
use crate::error::Error;
use crate::twitch::types::{RefreshRequest, TokenResponse};
use crate::twitch::TwitchClient;

impl TwitchClient {
    /// Exchanges the refresh token for a new access token.
    ///
    /// Returns `false` on any failure; the reason is logged, never raised.
    pub async fn refresh_access_token(&self) -> bool {
        match self.request_token().await {
            Ok(token) => {
                self.credentials.set_access_token(token.access_token);
                if let Some(refresh) = token.refresh_token {
                    self.credentials.set_refresh_token(refresh);
                }
                info!("Access token refreshed");
                true
            }
            Err(Error::Http(e)) if !e.is_decode() => {
                error!(error = %e, "Network error while refreshing token");
                false
            }
            Err(e) => {
                error!(error = %e, "Could not refresh access token");
                false
            }
        }
    }

    async fn request_token(&self) -> Result<TokenResponse, Error> {
        let refresh_token = self.credentials.refresh_token();
        let form = RefreshRequest {
            client_id: &self.credentials.client_id,
            grant_type: "refresh_token",
            refresh_token: &refresh_token,
        };

        let resp = self
            .http
            .post(&self.token_url)
            .form(&form)
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .send()
            .await?;

        if resp.status() != StatusCode::OK {
            return Err(Error::from_response(resp).await);
        }

        Ok(resp.json().await?)
    }
}
