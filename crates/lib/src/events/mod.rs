//! Host events (chat lines, duty finder pops) and the bridge that turns them into
//! queued messages.
//!
//! The host exposes an [`EventSource`]; [`ChatBridge`] subscribes on attach and
//! unsubscribes on detach. Nothing here keeps global subscription state.

mod bridge;
mod sender;
mod source;

pub use bridge::{ChatBridge, DUTY_FINDER_GROUP, DUTY_FINDER_SENDER};
pub use sender::{DefaultSenderParser, ParsedSender, PlayerRef, SenderInfo, SenderParser};
pub use source::{ChatEvent, DutyReadyEvent, EventBus, EventHandler, EventSource, SubscriptionId};
