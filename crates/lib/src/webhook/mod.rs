//! Outbound delivery of enriched chat messages.
//!
//! [`WebhookPublisher`] is the seam the relay worker calls; [`DiscordWebhook`] posts
//! embeds to a Discord webhook URL.

mod discord;

use async_trait::async_trait;

use crate::style::Style;

pub use discord::{build_payload, DiscordWebhook, Embed, EmbedAuthor, EmbedFooter, WebhookPayload, BRIDGE_USERNAME};

/// Everything needed to render one outgoing message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutgoingMessage {
    pub sender: String,
    pub group: String,
    pub avatar_url: String,
    pub body: String,
    pub style: Style,
}

impl OutgoingMessage {
    /// Author line shown above the message: "{sender} @ {group}".
    pub fn author(&self) -> String {
        format!("{} @ {}", self.sender, self.group)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum PublishError {
    #[error("webhook request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("webhook returned {0}")]
    Status(String),
}

/// Submits one message to a destination. Failures are returned, never retried here.
#[async_trait]
pub trait WebhookPublisher: Send + Sync {
    async fn publish(&self, destination_url: &str, message: &OutgoingMessage) -> Result<(), PublishError>;
}
