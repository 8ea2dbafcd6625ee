//! Configuration types and loading.
//!
//! Config is loaded from a JSON file (e.g. `~/.chatbridge/config.json`) and environment.
//! The relay reads it live through [`ConfigSource`], so edits applied to a [`SharedConfig`]
//! take effect on the next poll without a restart.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock};

use crate::chat::ChatCategory;

/// Top-level bridge config.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    /// Master switch. When false, events are ignored and the worker idles.
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Post a notice when a duty finder match is ready.
    #[serde(default = "default_true")]
    pub duty_finder_notify: bool,

    /// Discord webhook URL. Overridden by CHATBRIDGE_WEBHOOK_URL env. Empty means "not ready".
    #[serde(default)]
    pub webhook_url: String,

    /// Chat type ids (low 7 bits of the category) that are relayed.
    #[serde(default)]
    pub allowed_chat_types: HashSet<u16>,

    /// Profile lookup settings.
    #[serde(default)]
    pub lodestone: LodestoneConfig,
}

/// Lodestone profile search settings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LodestoneConfig {
    /// Search host (default https://na.finalfantasyxiv.com). Useful for regional mirrors.
    pub base_url: Option<String>,
}

fn default_true() -> bool {
    true
}

impl Default for Config {
    fn default() -> Self {
        Self {
            enabled: true,
            duty_finder_notify: true,
            webhook_url: String::new(),
            allowed_chat_types: HashSet::new(),
            lodestone: LodestoneConfig::default(),
        }
    }
}

impl Config {
    /// True if chat lines of this category pass the allow-list.
    pub fn allows(&self, category: ChatCategory) -> bool {
        self.allowed_chat_types.contains(&category.base_id())
    }

    /// Webhook URL with surrounding whitespace removed; `None` when unset.
    pub fn destination(&self) -> Option<&str> {
        let url = self.webhook_url.trim();
        if url.is_empty() {
            None
        } else {
            Some(url)
        }
    }
}

/// Resolve the webhook URL: env CHATBRIDGE_WEBHOOK_URL overrides config.
pub fn resolve_webhook_url(config: &Config) -> String {
    std::env::var("CHATBRIDGE_WEBHOOK_URL")
        .ok()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| config.webhook_url.trim().to_string())
}

/// Read-only, live view of the configuration. The relay calls `current` on every poll.
pub trait ConfigSource: Send + Sync {
    fn current(&self) -> Config;
}

/// Thread-safe config handle shared between the host, the bridge and the relay worker.
#[derive(Debug, Clone, Default)]
pub struct SharedConfig {
    inner: Arc<RwLock<Config>>,
}

impl SharedConfig {
    pub fn new(config: Config) -> Self {
        Self {
            inner: Arc::new(RwLock::new(config)),
        }
    }

    /// Replace the whole config (e.g. after reloading the file).
    pub fn replace(&self, config: Config) {
        let mut g = self.inner.write().unwrap_or_else(|e| e.into_inner());
        *g = config;
    }

    /// Apply an in-place edit.
    pub fn update(&self, f: impl FnOnce(&mut Config)) {
        let mut g = self.inner.write().unwrap_or_else(|e| e.into_inner());
        f(&mut g);
    }
}

impl ConfigSource for SharedConfig {
    fn current(&self) -> Config {
        self.inner.read().unwrap_or_else(|e| e.into_inner()).clone()
    }
}

/// Resolve config path from env or default.
pub fn default_config_path() -> PathBuf {
    std::env::var("CHATBRIDGE_CONFIG_PATH")
        .map(PathBuf::from)
        .unwrap_or_else(|_| {
            dirs::home_dir()
                .map(|h| h.join(".chatbridge").join("config.json"))
                .unwrap_or_else(|| PathBuf::from("config.json"))
        })
}

/// Load config from the given path (or the default). Missing file => default config.
/// The webhook URL env override is applied. Returns the config and the path that was used.
pub fn load_config(path: Option<PathBuf>) -> Result<(Config, PathBuf)> {
    let path = path.unwrap_or_else(default_config_path);
    let mut config = read_config_file(&path)?;
    config.webhook_url = resolve_webhook_url(&config);
    Ok((config, path))
}

fn read_config_file(path: &Path) -> Result<Config> {
    if !path.exists() {
        log::debug!("config file not found, using defaults: {}", path.display());
        return Ok(Config::default());
    }
    let s = std::fs::read_to_string(path)
        .with_context(|| format!("reading config from {}", path.display()))?;
    let config = serde_json::from_str(&s)
        .with_context(|| format!("parsing config from {}", path.display()))?;
    Ok(config)
}
