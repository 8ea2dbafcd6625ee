//! Sender profile lookup (avatar URL for a character on a world).
//!
//! The relay only depends on the [`ProfileResolver`] trait; the Lodestone scraper is one
//! implementation and can be swapped for a structured API client.

mod lodestone;

use async_trait::async_trait;

pub use lodestone::{LodestoneResolver, DEFAULT_LODESTONE_BASE, USER_AGENT};

/// Resolves a (name, group) pair to an avatar image URL.
#[async_trait]
pub trait ProfileResolver: Send + Sync {
    /// Returns the avatar URL, or an empty string when none could be found. Never fails.
    async fn resolve(&self, name: &str, group: &str) -> String;
}
