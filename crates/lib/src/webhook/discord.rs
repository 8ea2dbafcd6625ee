//! Discord webhook: one embed per chat line, posted with a fixed bridge username.

use super::{OutgoingMessage, PublishError, WebhookPublisher};
use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use serde::Serialize;
use std::time::Duration;

/// Display name the webhook posts under.
pub const BRIDGE_USERNAME: &str = "FFXIV Chat";

const REQUEST_TIMEOUT: Duration = Duration::from_secs(15);

/// Body of an execute-webhook request.
#[derive(Debug, Clone, Serialize)]
pub struct WebhookPayload {
    pub username: String,
    pub embeds: Vec<Embed>,
}

#[derive(Debug, Clone, Serialize)]
pub struct Embed {
    pub author: EmbedAuthor,
    pub description: String,
    pub color: u32,
    pub footer: EmbedFooter,
    /// ISO 8601 send time.
    pub timestamp: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct EmbedAuthor {
    pub name: String,
    pub icon_url: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct EmbedFooter {
    pub text: String,
}

/// Build the webhook body for a message sent at `sent_at`.
pub fn build_payload(message: &OutgoingMessage, sent_at: DateTime<Utc>) -> WebhookPayload {
    WebhookPayload {
        username: BRIDGE_USERNAME.to_string(),
        embeds: vec![Embed {
            author: EmbedAuthor {
                name: message.author(),
                icon_url: message.avatar_url.clone(),
            },
            description: message.body.clone(),
            color: message.style.color,
            footer: EmbedFooter {
                text: message.style.footer(),
            },
            timestamp: sent_at.to_rfc3339_opts(SecondsFormat::Millis, true),
        }],
    }
}

/// Stateless publisher for Discord webhook URLs.
#[derive(Clone, Default)]
pub struct DiscordWebhook {
    client: reqwest::Client,
}

impl DiscordWebhook {
    pub fn new() -> Self {
        Self {
            client: reqwest::Client::new(),
        }
    }
}

#[async_trait]
impl WebhookPublisher for DiscordWebhook {
    async fn publish(&self, destination_url: &str, message: &OutgoingMessage) -> Result<(), PublishError> {
        let body = build_payload(message, Utc::now());
        let res = self
            .client
            .post(destination_url)
            .json(&body)
            .timeout(REQUEST_TIMEOUT)
            .send()
            .await?;
        if !res.status().is_success() {
            let status = res.status();
            let body = res.text().await.unwrap_or_default();
            return Err(PublishError::Status(format!("{} {}", status, body)));
        }
        log::trace!("webhook: delivered message from {}", message.author());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chat::ChatCategory;
    use crate::style::style_for;
    use chrono::TimeZone;

    fn message() -> OutgoingMessage {
        OutgoingMessage {
            sender: "Alice Example".to_string(),
            group: "Gilgamesh".to_string(),
            avatar_url: "https://img.example/alice.jpg".to_string(),
            body: "Hello world".to_string(),
            style: style_for(ChatCategory::PARTY),
        }
    }

    #[test]
    fn payload_json_shape() {
        let sent_at = Utc.with_ymd_and_hms(2024, 5, 1, 12, 30, 0).unwrap();
        let json = serde_json::to_value(build_payload(&message(), sent_at)).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "username": "FFXIV Chat",
                "embeds": [{
                    "author": {
                        "name": "Alice Example @ Gilgamesh",
                        "icon_url": "https://img.example/alice.jpg"
                    },
                    "description": "Hello world",
                    "color": 0x66CCFF,
                    "footer": { "text": "🛡️  Party" },
                    "timestamp": "2024-05-01T12:30:00.000Z"
                }]
            })
        );
    }
}
