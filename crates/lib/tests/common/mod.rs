//! Test doubles shared by the integration tests.

#![allow(dead_code)]

use async_trait::async_trait;
use lib::config::{Config, SharedConfig};
use lib::notify::Notifier;
use lib::profile::ProfileResolver;
use lib::relay::{RelayDeps, RelayTimings, WebhookRelay};
use lib::webhook::{OutgoingMessage, PublishError, WebhookPublisher};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

pub const HOOK_URL: &str = "https://discord.example/api/webhooks/1/token";

pub fn fast_timings() -> RelayTimings {
    RelayTimings {
        idle_poll: Duration::from_millis(20),
        empty_poll: Duration::from_millis(10),
        shutdown_timeout: Duration::from_millis(500),
    }
}

pub fn config_with_url(url: &str) -> SharedConfig {
    SharedConfig::new(Config {
        webhook_url: url.to_string(),
        ..Config::default()
    })
}

/// Returns a fixed URL for every sender; panics for a sender named "Panicky".
pub struct FixedResolver {
    url: String,
    calls: AtomicUsize,
}

impl FixedResolver {
    pub fn new(url: &str) -> Self {
        Self {
            url: url.to_string(),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ProfileResolver for FixedResolver {
    async fn resolve(&self, name: &str, _group: &str) -> String {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if name == "Panicky" {
            panic!("resolver exploded");
        }
        self.url.clone()
    }
}

/// Records every publish attempt. Messages whose body contains "FAIL" are rejected;
/// with a delay set, every publish sleeps first.
#[derive(Default)]
pub struct RecordingPublisher {
    attempts: Mutex<Vec<(String, OutgoingMessage)>>,
    delay: Option<Duration>,
}

impl RecordingPublisher {
    pub fn slow(delay: Duration) -> Self {
        Self {
            attempts: Mutex::new(Vec::new()),
            delay: Some(delay),
        }
    }

    pub fn attempts(&self) -> Vec<(String, OutgoingMessage)> {
        self.attempts.lock().unwrap().clone()
    }

    pub fn bodies(&self) -> Vec<String> {
        self.attempts().into_iter().map(|(_, m)| m.body).collect()
    }
}

#[async_trait]
impl WebhookPublisher for RecordingPublisher {
    async fn publish(&self, destination_url: &str, message: &OutgoingMessage) -> Result<(), PublishError> {
        if let Some(d) = self.delay {
            tokio::time::sleep(d).await;
        }
        self.attempts
            .lock()
            .unwrap()
            .push((destination_url.to_string(), message.clone()));
        if message.body.contains("FAIL") {
            return Err(PublishError::Status(format!("502 Bad Gateway ({})", message.body)));
        }
        Ok(())
    }
}

#[derive(Default)]
pub struct RecordingNotifier {
    pub errors: Mutex<Vec<String>>,
}

impl RecordingNotifier {
    pub fn errors(&self) -> Vec<String> {
        self.errors.lock().unwrap().clone()
    }
}

impl Notifier for RecordingNotifier {
    fn notify_error(&self, text: &str) {
        self.errors.lock().unwrap().push(text.to_string());
    }
}

pub struct Harness {
    pub relay: WebhookRelay,
    pub config: SharedConfig,
    pub resolver: Arc<FixedResolver>,
    pub publisher: Arc<RecordingPublisher>,
    pub notifier: Arc<RecordingNotifier>,
}

pub fn start(config: SharedConfig, resolver: FixedResolver, publisher: RecordingPublisher) -> Harness {
    start_with(config, resolver, publisher, fast_timings())
}

pub fn start_with(
    config: SharedConfig,
    resolver: FixedResolver,
    publisher: RecordingPublisher,
    timings: RelayTimings,
) -> Harness {
    let resolver = Arc::new(resolver);
    let publisher = Arc::new(publisher);
    let notifier = Arc::new(RecordingNotifier::default());
    let deps = RelayDeps {
        config: Arc::new(config.clone()),
        resolver: resolver.clone(),
        publisher: publisher.clone(),
        notifier: notifier.clone(),
    };
    Harness {
        relay: WebhookRelay::start_with_timings(deps, timings),
        config,
        resolver,
        publisher,
        notifier,
    }
}
