use std::env;
use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use crate::error::Error;

pub const DEFAULT_API_URL: &str = "https://api.twitch.tv/helix";
pub const DEFAULT_TOKEN_URL: &str = "https://id.twitch.tv/oauth2/token";
pub const DEFAULT_CHECK_INTERVAL_SECS: u64 = 60;
pub const DEFAULT_MESSAGE_TEMPLATE: &str = "🎬 New clip created by: [{creator_name}]({url})";
pub const DEFAULT_LAST_CLIP_FILE: &str = "lastclip.txt";

/// Extra seconds added to the lookback window to cover clock and latency skew.
pub const WINDOW_MARGIN_SECS: u64 = 5;
pub const REQUEST_TIMEOUT_SECS: u64 = 10;

#[derive(Clone)]
pub struct Config {
    pub client_id: String,
    pub access_token: String,
    pub refresh_token: String,
    pub webhook_url: String,
    pub broadcaster_id: String,
    pub check_interval: Duration,
    pub message_template: String,
    pub last_clip_file: PathBuf,
    pub api_url: String,
    pub token_url: String,
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("client_id", &self.client_id)
            .field("access_token", &"[redacted]")
            .field("refresh_token", &"[redacted]")
            .field("webhook_url", &self.webhook_url)
            .field("broadcaster_id", &self.broadcaster_id)
            .field("check_interval", &self.check_interval)
            .field("message_template", &self.message_template)
            .field("last_clip_file", &self.last_clip_file)
            .field("api_url", &self.api_url)
            .field("token_url", &self.token_url)
            .finish()
    }
}

impl Config {
    pub fn from_env() -> Result<Self, Error> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, Error>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |name: &'static str| {
            lookup(name)
                .filter(|v| !v.trim().is_empty())
                .ok_or(Error::MissingEnv(name))
        };
        let optional = |name: &str, default: &str| {
            lookup(name)
                .filter(|v| !v.trim().is_empty())
                .unwrap_or_else(|| default.to_string())
        };

        let check_interval = match lookup("CHECK_INTERVAL_SECS") {
            Some(raw) => match raw.trim().parse::<u64>() {
                Ok(secs) if secs > 0 => Duration::from_secs(secs),
                _ => {
                    return Err(Error::InvalidEnv {
                        name: "CHECK_INTERVAL_SECS",
                        value: raw,
                    })
                }
            },
            None => Duration::from_secs(DEFAULT_CHECK_INTERVAL_SECS),
        };

        Ok(Self {
            client_id: required("TWITCH_CLIENT_ID")?,
            access_token: required("TWITCH_ACCESS_TOKEN")?,
            refresh_token: required("TWITCH_REFRESH_TOKEN")?,
            webhook_url: required("DISCORD_WEBHOOK_URL")?,
            broadcaster_id: required("TWITCH_BROADCASTER_ID")?,
            check_interval,
            message_template: optional("MESSAGE_TEMPLATE", DEFAULT_MESSAGE_TEMPLATE),
            last_clip_file: PathBuf::from(optional("LAST_CLIP_FILE", DEFAULT_LAST_CLIP_FILE)),
            api_url: optional("TWITCH_API_URL", DEFAULT_API_URL)
                .trim_end_matches('/')
                .to_string(),
            token_url: optional("TWITCH_TOKEN_URL", DEFAULT_TOKEN_URL),
        })
    }

    /// How far back each clip query reaches.
    pub fn lookback(&self) -> Duration {
        self.check_interval + Duration::from_secs(WINDOW_MARGIN_SECS)
    }
}
