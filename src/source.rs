use std::collections::HashMap;
use std::fmt;
use std::path::PathBuf;
use std::time::{Duration, Instant};

use parking_lot::Mutex;

use crate::error::DashboardError;

/// Where the activity log lives: a published sheet URL or a local CSV export.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum FeedRef {
    Url(String),
    Path(PathBuf),
}

impl FeedRef {
    pub fn parse(raw: &str) -> Self {
        let raw = raw.trim();
        if raw.starts_with("http://") || raw.starts_with("https://") {
            FeedRef::Url(raw.to_string())
        } else {
            FeedRef::Path(PathBuf::from(raw))
        }
    }
}

impl fmt::Display for FeedRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FeedRef::Url(url) => f.write_str(url),
            FeedRef::Path(path) => write!(f, "{}", path.display()),
        }
    }
}

pub trait FeedSource {
    /// Returns the raw CSV text behind `feed`.
    async fn fetch(&self, feed: &FeedRef) -> Result<String, DashboardError>;
}

impl<T: FeedSource> FeedSource for &T {
    async fn fetch(&self, feed: &FeedRef) -> Result<String, DashboardError> {
        (**self).fetch(feed).await
    }
}

#[derive(Default)]
pub struct RemoteFeed {
    client: reqwest::Client,
}

impl RemoteFeed {
    pub fn new() -> Self {
        Self {
            client: reqwest::Client::new(),
        }
    }
}

impl FeedSource for RemoteFeed {
    async fn fetch(&self, feed: &FeedRef) -> Result<String, DashboardError> {
        match feed {
            FeedRef::Url(url) => {
                tracing::info!(%url, "fetching feed");
                let resp = self
                    .client
                    .get(url)
                    .send()
                    .await
                    .map_err(|e| DashboardError::unavailable(feed, e))?;

                let status = resp.status();
                if !status.is_success() {
                    return Err(DashboardError::unavailable(
                        feed,
                        format!("HTTP {}", status.as_u16()),
                    ));
                }

                resp.text()
                    .await
                    .map_err(|e| DashboardError::unavailable(feed, e))
            }
            FeedRef::Path(path) => {
                tracing::info!(path = %path.display(), "reading feed");
                tokio::fs::read_to_string(path)
                    .await
                    .map_err(|e| DashboardError::unavailable(feed, e))
            }
        }
    }
}

pub trait Clock {
    fn now(&self) -> Instant;
}

impl<T: Clock> Clock for &T {
    fn now(&self) -> Instant {
        (**self).now()
    }
}

pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

struct CacheEntry {
    body: String,
    fetched_at: Instant,
}

/// Time-bounded memoizer over a `FeedSource`, keyed by feed reference.
/// Entries expire strictly after `ttl`; a zero `ttl` disables caching.
pub struct CachedFeed<S, C = SystemClock> {
    inner: S,
    clock: C,
    ttl: Duration,
    entries: Mutex<HashMap<FeedRef, CacheEntry>>,
}

impl<S: FeedSource, C: Clock> CachedFeed<S, C> {
    pub fn new(inner: S, clock: C, ttl: Duration) -> Self {
        Self {
            inner,
            clock,
            ttl,
            entries: Mutex::new(HashMap::new()),
        }
    }

    fn lookup(&self, feed: &FeedRef) -> Option<String> {
        let now = self.clock.now();
        let mut entries = self.entries.lock();
        match entries.get(feed) {
            Some(entry) if now.duration_since(entry.fetched_at) < self.ttl => {
                Some(entry.body.clone())
            }
            Some(_) => {
                entries.remove(feed);
                None
            }
            None => None,
        }
    }
}

impl<S: FeedSource, C: Clock> FeedSource for CachedFeed<S, C> {
    async fn fetch(&self, feed: &FeedRef) -> Result<String, DashboardError> {
        if self.ttl.is_zero() {
            return self.inner.fetch(feed).await;
        }

        if let Some(body) = self.lookup(feed) {
            tracing::debug!(%feed, "serving cached feed");
            return Ok(body);
        }

        let body = self.inner.fetch(feed).await?;
        self.entries.lock().insert(
            feed.clone(),
            CacheEntry {
                body: body.clone(),
                fetched_at: self.clock.now(),
            },
        );
        Ok(body)
    }
}
