//! Event source seam and an in-process bus implementation.

use crate::chat::ChatCategory;
use crate::events::sender::SenderInfo;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock};

/// A chat line as reported by the host.
#[derive(Debug, Clone)]
pub struct ChatEvent {
    pub category: ChatCategory,
    pub sender: SenderInfo,
    pub text: String,
}

/// The duty finder has a match ready.
#[derive(Debug, Clone)]
pub struct DutyReadyEvent {
    pub duty_name: String,
}

/// Receives host events. Called on the host's event thread, so implementations must not block.
pub trait EventHandler: Send + Sync {
    fn on_chat(&self, event: &ChatEvent);
    fn on_duty_ready(&self, event: &DutyReadyEvent);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

/// Where host events come from. Handlers stay registered until unsubscribed.
pub trait EventSource: Send + Sync {
    fn subscribe(&self, handler: Arc<dyn EventHandler>) -> SubscriptionId;
    /// Returns false if the id was not registered.
    fn unsubscribe(&self, id: SubscriptionId) -> bool;
}

/// In-process event source: the host pushes events with `emit_*`, subscribers get them in
/// registration order.
#[derive(Default)]
pub struct EventBus {
    next_id: AtomicU64,
    handlers: RwLock<Vec<(SubscriptionId, Arc<dyn EventHandler>)>>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscriber_count(&self) -> usize {
        self.handlers.read().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn emit_chat(&self, event: &ChatEvent) {
        for handler in self.snapshot() {
            handler.on_chat(event);
        }
    }

    pub fn emit_duty_ready(&self, event: &DutyReadyEvent) {
        for handler in self.snapshot() {
            handler.on_duty_ready(event);
        }
    }

    // Handlers run outside the lock so they may (un)subscribe.
    fn snapshot(&self) -> Vec<Arc<dyn EventHandler>> {
        self.handlers
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .iter()
            .map(|(_, h)| h.clone())
            .collect()
    }
}

impl EventSource for EventBus {
    fn subscribe(&self, handler: Arc<dyn EventHandler>) -> SubscriptionId {
        let id = SubscriptionId(self.next_id.fetch_add(1, Ordering::SeqCst));
        self.handlers
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .push((id, handler));
        id
    }

    fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let mut g = self.handlers.write().unwrap_or_else(|e| e.into_inner());
        let before = g.len();
        g.retain(|(sid, _)| *sid != id);
        g.len() != before
    }
}
