//! Bridge between host events and the delivery queue.

use crate::chat::{ChatCategory, ChatMessage};
use crate::config::ConfigSource;
use crate::events::sender::{DefaultSenderParser, SenderParser};
use crate::events::source::{ChatEvent, DutyReadyEvent, EventHandler, EventSource, SubscriptionId};
use crate::relay::RelaySender;
use std::sync::{Arc, RwLock};

pub const DUTY_FINDER_SENDER: &str = "Duty Finder";
pub const DUTY_FINDER_GROUP: &str = "System";

/// Filters host events by the live config and enqueues the ones to relay.
///
/// Subscribes to its event source on [`ChatBridge::attach`] and unsubscribes on
/// [`ChatBridge::detach`] or drop.
pub struct ChatBridge {
    handler: Arc<BridgeHandler>,
    source: Arc<dyn EventSource>,
    subscription: Option<SubscriptionId>,
}

struct BridgeHandler {
    config: Arc<dyn ConfigSource>,
    relay: RelaySender,
    parser: Arc<dyn SenderParser>,
    /// Local player's home world, used when a sender carries no world.
    home_group: RwLock<Option<String>>,
}

impl ChatBridge {
    pub fn new(config: Arc<dyn ConfigSource>, relay: RelaySender, source: Arc<dyn EventSource>) -> Self {
        Self::with_parser(config, relay, source, Arc::new(DefaultSenderParser))
    }

    pub fn with_parser(
        config: Arc<dyn ConfigSource>,
        relay: RelaySender,
        source: Arc<dyn EventSource>,
        parser: Arc<dyn SenderParser>,
    ) -> Self {
        Self {
            handler: Arc::new(BridgeHandler {
                config,
                relay,
                parser,
                home_group: RwLock::new(None),
            }),
            source,
            subscription: None,
        }
    }

    /// Set (or clear) the local player's home world, e.g. on login.
    pub fn set_home_group(&self, group: Option<String>) {
        *self
            .handler
            .home_group
            .write()
            .unwrap_or_else(|e| e.into_inner()) = group.filter(|g| !g.trim().is_empty());
    }

    /// Register with the event source. No-op when already attached.
    pub fn attach(&mut self) {
        if self.subscription.is_some() {
            return;
        }
        let id = self.source.subscribe(self.handler.clone());
        self.subscription = Some(id);
        log::debug!("bridge: attached to event source");
    }

    /// Deregister from the event source. No-op when not attached.
    pub fn detach(&mut self) {
        if let Some(id) = self.subscription.take() {
            self.source.unsubscribe(id);
            log::debug!("bridge: detached from event source");
        }
    }

    pub fn is_attached(&self) -> bool {
        self.subscription.is_some()
    }
}

impl Drop for ChatBridge {
    fn drop(&mut self) {
        self.detach();
    }
}

impl EventHandler for BridgeHandler {
    fn on_chat(&self, event: &ChatEvent) {
        let config = self.config.current();
        if !config.enabled || !config.allows(event.category) {
            return;
        }
        let home_group = self
            .home_group
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .clone();
        let sender = self.parser.parse(&event.sender, home_group.as_deref());
        self.relay.enqueue(ChatMessage::new(
            sender.name,
            sender.group,
            event.text.clone(),
            event.category,
        ));
    }

    fn on_duty_ready(&self, event: &DutyReadyEvent) {
        let config = self.config.current();
        if !config.enabled || !config.duty_finder_notify {
            return;
        }
        self.relay.enqueue(ChatMessage::new(
            DUTY_FINDER_SENDER,
            DUTY_FINDER_GROUP,
            format!("**{}** is ready! Commencing...", event.duty_name),
            ChatCategory::NOTICE,
        ));
    }
}
