//! Chatbridge core library: relays game chat to a Discord webhook through a single-worker
//! delivery queue, with avatar lookup, per-channel styling and host event ingestion.

pub mod chat;
pub mod config;
pub mod events;
pub mod init;
pub mod notify;
pub mod profile;
pub mod relay;
pub mod style;
pub mod webhook;
