use std::fmt;

use parking_lot::RwLock;

use crate::config::Config;

/// Twitch app credentials. Tokens are swapped in place on refresh.
pub struct Credentials {
    pub client_id: String,
    access_token: RwLock<String>,
    refresh_token: RwLock<String>,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("client_id", &self.client_id)
            .field("access_token", &"[redacted]")
            .field("refresh_token", &"[redacted]")
            .finish()
    }
}

impl Credentials {
    pub fn new(client_id: String, access_token: String, refresh_token: String) -> Self {
        Self {
            client_id,
            access_token: RwLock::new(access_token),
            refresh_token: RwLock::new(refresh_token),
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(
            config.client_id.clone(),
            config.access_token.clone(),
            config.refresh_token.clone(),
        )
    }

    pub fn access_token(&self) -> String {
        self.access_token.read().clone()
    }

    pub fn refresh_token(&self) -> String {
        self.refresh_token.read().clone()
    }

    pub fn set_access_token(&self, token: String) {
        *self.access_token.write() = token;
    }

    pub fn set_refresh_token(&self, token: String) {
        *self.refresh_token.write() = token;
    }
}
