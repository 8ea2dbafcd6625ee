//! Lodestone character search: scrape the avatar `<img>` for a character name from the
//! search result page. Results are cached in memory for the process lifetime.

use super::ProfileResolver;
use crate::config::ConfigSource;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;

pub const DEFAULT_LODESTONE_BASE: &str = "https://na.finalfantasyxiv.com";

/// Lodestone rejects requests without a browser-like client header.
pub const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, thiserror::Error)]
enum LookupError {
    #[error("lodestone request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("lodestone search returned {0}")]
    Status(reqwest::StatusCode),
}

/// Where the search host comes from.
#[derive(Clone)]
enum SearchHost {
    Fixed(String),
    /// Re-read `lodestone.baseUrl` on every lookup so config reloads apply.
    Live(Arc<dyn ConfigSource>),
}

/// Profile resolver backed by the Lodestone character search page.
///
/// Cache policy: a found URL is cached; a search that succeeds but has no matching
/// character is cached as "no avatar" so known-missing profiles are not searched again;
/// transport errors and non-success responses are not cached and will be retried.
#[derive(Clone)]
pub struct LodestoneResolver {
    host: SearchHost,
    client: reqwest::Client,
    /// normalized "name@group" -> avatar url ("" = searched, nothing found)
    cache: Arc<RwLock<HashMap<String, String>>>,
}

impl LodestoneResolver {
    /// Resolver with a fixed search host (default https://na.finalfantasyxiv.com).
    pub fn new(base_url: Option<String>) -> Self {
        Self::with_host(SearchHost::Fixed(normalize_base(base_url)))
    }

    /// Resolver that takes the search host from the live config on every lookup.
    pub fn from_config(config: Arc<dyn ConfigSource>) -> Self {
        Self::with_host(SearchHost::Live(config))
    }

    fn with_host(host: SearchHost) -> Self {
        Self {
            host,
            client: reqwest::Client::new(),
            cache: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Number of cached lookups (hits and known misses).
    pub async fn cached_len(&self) -> usize {
        self.cache.read().await.len()
    }

    fn base_url(&self) -> String {
        match &self.host {
            SearchHost::Fixed(url) => url.clone(),
            SearchHost::Live(config) => normalize_base(config.current().lodestone.base_url),
        }
    }

    /// GET /lodestone/character/?q=<name>&worldname=<group> and return the page body.
    async fn search(&self, name: &str, group: &str) -> Result<String, LookupError> {
        let url = format!("{}/lodestone/character/", self.base_url());
        let res = self
            .client
            .get(&url)
            .query(&[("q", name), ("worldname", group)])
            .header(reqwest::header::USER_AGENT, USER_AGENT)
            .timeout(REQUEST_TIMEOUT)
            .send()
            .await?;
        if !res.status().is_success() {
            return Err(LookupError::Status(res.status()));
        }
        Ok(res.text().await?)
    }
}

#[async_trait]
impl ProfileResolver for LodestoneResolver {
    async fn resolve(&self, name: &str, group: &str) -> String {
        // The key, the query and the alt match all use the same trimmed values.
        let name = name.trim();
        let group = group.trim();
        if name.is_empty() || group.is_empty() {
            return String::new();
        }

        let key = cache_key(name, group);
        if let Some(url) = self.cache.read().await.get(&key) {
            return url.clone();
        }

        match self.search(name, group).await {
            Ok(html) => {
                let url = extract_avatar_url(&html, name).unwrap_or_default();
                if url.is_empty() {
                    log::debug!("lodestone: no avatar found for {}", key);
                }
                self.cache
                    .write()
                    .await
                    .entry(key)
                    .or_insert_with(|| url.clone());
                url
            }
            Err(e) => {
                log::error!("lodestone: error looking up {}: {}", key, e);
                String::new()
            }
        }
    }
}

fn normalize_base(base_url: Option<String>) -> String {
    base_url
        .map(|u| u.trim().trim_end_matches('/').to_string())
        .filter(|u| !u.is_empty())
        .unwrap_or_else(|| DEFAULT_LODESTONE_BASE.to_string())
}

fn cache_key(name: &str, group: &str) -> String {
    format!("{}@{}", name.trim(), group.trim()).to_lowercase()
}

/// First `<img src="...">` whose tag carries `alt="<name>"` (case-insensitive).
pub(crate) fn extract_avatar_url(html: &str, name: &str) -> Option<String> {
    let pattern = format!(r#"<img src="([^"]+)"[^>]*alt="{}""#, regex::escape(name));
    let re = regex::RegexBuilder::new(&pattern)
        .case_insensitive(true)
        .build()
        .ok()?;
    re.captures(html)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().to_string())
}
