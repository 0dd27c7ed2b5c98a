use async_trait::async_trait;
use reqwest::StatusCode;
use serde::Serialize;
use tracing::info;

use crate::error::Error;
use crate::twitch::ClipRecord;

/// Delivers a clip announcement somewhere.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn notify(&self, clip: &ClipRecord) -> Result<(), Error>;
}

fn placeholder<'a>(name: &str, clip: &'a ClipRecord) -> Option<&'a str> {
    let (value, fallback) = match name {
        "creator_name" => (&clip.creator_name, "Unknown"),
        "url" => (&clip.url, "#"),
        "title" => (&clip.title, "Untitled"),
        "broadcaster_name" => (&clip.broadcaster_name, "Unknown"),
        "id" => (&clip.id, "0"),
        _ => return None,
    };
    Some(value.as_deref().unwrap_or(fallback))
}

/// Fills the template placeholders from `clip`, falling back for absent fields.
///
/// Single pass: substituted values are never rescanned. `{{` and `}}` render as
/// literal braces; unknown placeholders are copied as written.
pub fn render_message(template: &str, clip: &ClipRecord) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(pos) = rest.find(|c: char| c == '{' || c == '}') {
        out.push_str(&rest[..pos]);
        let tail = &rest[pos..];

        if tail.starts_with("{{") || tail.starts_with("}}") {
            out.push_str(&tail[..1]);
            rest = &tail[2..];
            continue;
        }

        if tail.starts_with('{') {
            if let Some(end) = tail.find('}') {
                if let Some(value) = placeholder(&tail[1..end], clip) {
                    out.push_str(value);
                    rest = &tail[end + 1..];
                    continue;
                }
            }
        }

        out.push_str(&tail[..1]);
        rest = &tail[1..];
    }

    out.push_str(rest);
    out
}

#[derive(Debug, Serialize)]
struct WebhookMessage {
    content: String,
}

/// Discord webhook target. Success is a 204.
pub struct DiscordWebhook {
    webhook_url: String,
    template: String,
    client: reqwest::Client,
}

impl DiscordWebhook {
    pub fn new(webhook_url: String, template: String, client: reqwest::Client) -> Self {
        Self {
            webhook_url,
            template,
            client,
        }
    }
}

#[async_trait]
impl Notifier for DiscordWebhook {
    async fn notify(&self, clip: &ClipRecord) -> Result<(), Error> {
        let payload = WebhookMessage {
            content: render_message(&self.template, clip),
        };

        let resp = self
            .client
            .post(&self.webhook_url)
            .json(&payload)
            .send()
            .await?;

        if resp.status() != StatusCode::NO_CONTENT {
            return Err(Error::from_response(resp).await);
        }

        info!("Message sent to Discord");
        Ok(())
    }
}
