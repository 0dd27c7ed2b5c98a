mod config;
mod error;
mod notifier;
mod poller;
mod state;
mod store;
mod twitch;

use dotenv::dotenv;
use tracing::info;
use tracing_subscriber::EnvFilter;

use config::Config;
use error::Error;
use notifier::DiscordWebhook;
use poller::Poller;
use state::Credentials;
use store::FileMarkerStore;
use twitch::TwitchClient;

#[tokio::main]
async fn main() -> Result<(), Error> {
    dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = Config::from_env()?;
    info!(
        broadcaster_id = %config.broadcaster_id,
        marker_file = %config.last_clip_file.display(),
        "Loaded configuration"
    );

    let http_client = reqwest::Client::new();
    let credentials = Credentials::from_config(&config);

    let poller = Poller::new(
        TwitchClient::new(&config, credentials, http_client.clone()),
        DiscordWebhook::new(
            config.webhook_url.clone(),
            config.message_template.clone(),
            http_client,
        ),
        FileMarkerStore::new(config.last_clip_file.clone()),
        config.check_interval,
    );

    tokio::select! {
        _ = poller.run() => Ok(()),
        _ = tokio::signal::ctrl_c() => {
            info!("Shutting down...");
            Ok(())
        }
    }
}
