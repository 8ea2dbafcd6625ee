//! Delivery queue and its background worker.
//!
//! Producers call [`RelaySender::enqueue`], which never blocks and never fails. A single
//! worker task drains the queue in FIFO order: resolve the sender's avatar, pick a style,
//! publish. One delivery is in flight at a time and a failed message is dropped, not
//! retried. While no destination is configured the queue is left alone and the worker
//! idles, re-reading the config on every poll.

use crate::chat::{ChatCategory, ChatMessage};
use crate::config::ConfigSource;
use crate::notify::Notifier;
use crate::profile::ProfileResolver;
use crate::style::style_for;
use crate::webhook::{OutgoingMessage, PublishError, WebhookPublisher};
use futures_util::FutureExt;
use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc::{self, error::TryRecvError};
use tokio::sync::{watch, Notify};
use tokio::task::JoinHandle;

/// Lodestone's silhouette image, used when no avatar could be resolved.
pub const DEFAULT_AVATAR_URL: &str = "https://img2.finalfantasyxiv.com/h/e/erPIM9iFmQ90lD179r_s8f65kM.jpg";

const FAILURE_NOTICE_PREFIX: &str = "[DiscordBridge] Failed to send message";

/// Poll intervals and shutdown bound for the worker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RelayTimings {
    /// Sleep while no destination is configured (or the bridge is disabled).
    pub idle_poll: Duration,
    /// Sleep while the queue is empty.
    pub empty_poll: Duration,
    /// How long `shutdown` waits for the worker before aborting it.
    pub shutdown_timeout: Duration,
}

impl Default for RelayTimings {
    fn default() -> Self {
        Self {
            idle_poll: Duration::from_secs(2),
            empty_poll: Duration::from_millis(500),
            shutdown_timeout: Duration::from_secs(1),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum RelayError {
    #[error(transparent)]
    Publish(#[from] PublishError),
    #[error("unexpected failure: {0}")]
    Panicked(String),
}

/// Collaborators the worker needs.
#[derive(Clone)]
pub struct RelayDeps {
    pub config: Arc<dyn ConfigSource>,
    pub resolver: Arc<dyn ProfileResolver>,
    pub publisher: Arc<dyn WebhookPublisher>,
    pub notifier: Arc<dyn Notifier>,
}

/// Count of messages enqueued and not yet finished. Waiters are woken whenever it drops.
#[derive(Default)]
struct PendingCount {
    count: AtomicUsize,
    idle: Notify,
}

impl PendingCount {
    fn add(&self) {
        self.count.fetch_add(1, Ordering::SeqCst);
    }

    fn done(&self, n: usize) {
        if n == 0 {
            return;
        }
        self.count.fetch_sub(n, Ordering::SeqCst);
        self.idle.notify_waiters();
    }

    fn get(&self) -> usize {
        self.count.load(Ordering::SeqCst)
    }
}

/// Producer handle to the delivery queue. Cheap to clone; usable from any thread.
#[derive(Clone)]
pub struct RelaySender {
    tx: mpsc::UnboundedSender<ChatMessage>,
    pending: Arc<PendingCount>,
}

impl RelaySender {
    /// Append a message to the queue. O(1), no I/O.
    pub fn enqueue(&self, message: ChatMessage) {
        log::trace!("relay: enqueuing message from {}", message.sender);
        self.pending.add();
        if self.tx.send(message).is_err() {
            self.pending.done(1);
            log::debug!("relay: worker gone, message discarded");
        }
    }

    pub fn enqueue_message(
        &self,
        sender: impl Into<String>,
        group: impl Into<String>,
        content: impl Into<String>,
        category: ChatCategory,
    ) {
        self.enqueue(ChatMessage::new(sender, group, content, category));
    }

    /// Messages enqueued and not yet finished (delivered or dropped).
    pub fn pending(&self) -> usize {
        self.pending.get()
    }
}

/// Owner of the delivery queue and its worker task.
///
/// The worker starts with the relay and stops on [`WebhookRelay::shutdown`]. Dropping the
/// relay signals the worker to stop without waiting for it.
pub struct WebhookRelay {
    sender: RelaySender,
    shutdown_tx: watch::Sender<bool>,
    worker: Option<JoinHandle<()>>,
    shutdown_timeout: Duration,
}

impl WebhookRelay {
    /// Spawn the worker on the current tokio runtime with default timings.
    pub fn start(deps: RelayDeps) -> Self {
        Self::start_with_timings(deps, RelayTimings::default())
    }

    pub fn start_with_timings(deps: RelayDeps, timings: RelayTimings) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let pending = Arc::new(PendingCount::default());
        let worker = Worker {
            deps,
            rx,
            pending: pending.clone(),
            shutdown_rx,
            timings,
        };
        let handle = tokio::spawn(worker.run());
        log::debug!("relay: service started");
        Self {
            sender: RelaySender { tx, pending },
            shutdown_tx,
            worker: Some(handle),
            shutdown_timeout: timings.shutdown_timeout,
        }
    }

    /// A producer handle for event callbacks.
    pub fn sender(&self) -> RelaySender {
        self.sender.clone()
    }

    pub fn enqueue(&self, message: ChatMessage) {
        self.sender.enqueue(message);
    }

    pub fn pending(&self) -> usize {
        self.sender.pending()
    }

    /// Wait until every enqueued message has been delivered or dropped. Returns false on timeout.
    pub async fn wait_idle(&self, timeout: Duration) -> bool {
        let wait = async {
            loop {
                // Register before checking so a decrement in between is not missed.
                let idle = self.sender.pending.idle.notified();
                if self.pending() == 0 {
                    return;
                }
                idle.await;
            }
        };
        tokio::time::timeout(timeout, wait).await.is_ok()
    }

    /// Signal the worker to stop and wait (bounded) for it. Messages still queued are
    /// discarded and no longer count as pending.
    pub async fn shutdown(mut self) {
        let _ = self.shutdown_tx.send(true);
        if let Some(mut handle) = self.worker.take() {
            match tokio::time::timeout(self.shutdown_timeout, &mut handle).await {
                Ok(Ok(())) => {}
                Ok(Err(e)) => log::error!("relay: worker task failed: {}", e),
                Err(_) => {
                    log::warn!(
                        "relay: worker did not stop within {:?}, aborting",
                        self.shutdown_timeout
                    );
                    handle.abort();
                }
            }
        }
        log::debug!("relay: disposed");
    }
}

impl Drop for WebhookRelay {
    fn drop(&mut self) {
        let _ = self.shutdown_tx.send(true);
    }
}

struct Worker {
    deps: RelayDeps,
    rx: mpsc::UnboundedReceiver<ChatMessage>,
    pending: Arc<PendingCount>,
    shutdown_rx: watch::Receiver<bool>,
    timings: RelayTimings,
}

impl Worker {
    async fn run(mut self) {
        let mut ready = false;
        while !self.stopping() {
            let config = self.deps.config.current();
            let destination = match config.destination() {
                Some(url) if config.enabled => url.to_string(),
                _ => {
                    if ready {
                        log::debug!("relay: no destination configured, idling");
                        ready = false;
                    }
                    self.pause(self.timings.idle_poll).await;
                    continue;
                }
            };
            if !ready {
                log::debug!("relay: destination configured, draining queue");
                ready = true;
            }

            match self.rx.try_recv() {
                Ok(message) => {
                    self.deliver(&destination, message).await;
                    self.pending.done(1);
                }
                Err(TryRecvError::Empty) => self.pause(self.timings.empty_poll).await,
                Err(TryRecvError::Disconnected) => break,
            }
        }
        log::debug!("relay: worker stopped");
    }

    /// Close the queue and discard what is left. Runs on normal exit and on abort.
    fn discard_queued(&mut self) {
        self.rx.close();
        let mut dropped = 0;
        while self.rx.try_recv().is_ok() {
            dropped += 1;
        }
        if dropped > 0 {
            log::warn!("relay: discarded {} queued message(s) at shutdown", dropped);
        }
        self.pending.done(dropped);
    }

    fn stopping(&self) -> bool {
        *self.shutdown_rx.borrow() || self.shutdown_rx.has_changed().is_err()
    }

    /// Sleep, waking early on shutdown.
    async fn pause(&mut self, duration: Duration) {
        tokio::select! {
            _ = tokio::time::sleep(duration) => {}
            _ = self.shutdown_rx.changed() => {}
        }
    }

    /// Process one message; every failure, including a panic, ends here.
    async fn deliver(&self, destination: &str, message: ChatMessage) {
        log::trace!("relay: processing message: {}", message.content);
        let result = AssertUnwindSafe(process_message(&self.deps, destination, &message))
            .catch_unwind()
            .await
            .unwrap_or_else(|panic| Err(RelayError::Panicked(panic_text(panic.as_ref()))));
        match result {
            Ok(()) => log::trace!("relay: sent successfully"),
            Err(e) => {
                log::error!("relay: failed to send webhook: {}", e);
                self.deps
                    .notifier
                    .notify_error(&format!("{}: {}", FAILURE_NOTICE_PREFIX, e));
            }
        }
    }
}

impl Drop for Worker {
    fn drop(&mut self) {
        self.discard_queued();
    }
}

/// Resolve avatar (with fallback), derive style, publish.
async fn process_message(
    deps: &RelayDeps,
    destination: &str,
    message: &ChatMessage,
) -> Result<(), RelayError> {
    let mut avatar_url = deps.resolver.resolve(&message.sender, &message.group).await;
    if avatar_url.is_empty() {
        avatar_url = DEFAULT_AVATAR_URL.to_string();
    }
    let outgoing = OutgoingMessage {
        sender: message.sender.clone(),
        group: message.group.clone(),
        avatar_url,
        body: message.content.clone(),
        style: style_for(message.category),
    };
    deps.publisher.publish(destination, &outgoing).await?;
    Ok(())
}

fn panic_text(panic: &(dyn Any + Send)) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "panic".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_timings() {
        let t = RelayTimings::default();
        assert_eq!(t.idle_poll, Duration::from_secs(2));
        assert_eq!(t.empty_poll, Duration::from_millis(500));
        assert_eq!(t.shutdown_timeout, Duration::from_secs(1));
    }

    #[test]
    fn panic_payload_text() {
        let boxed: Box<dyn Any + Send> = Box::new("boom");
        assert_eq!(panic_text(boxed.as_ref()), "boom");
        let boxed: Box<dyn Any + Send> = Box::new(String::from("bang"));
        assert_eq!(panic_text(boxed.as_ref()), "bang");
        let boxed: Box<dyn Any + Send> = Box::new(7u8);
        assert_eq!(panic_text(boxed.as_ref()), "panic");
    }
}
