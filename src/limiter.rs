use std::collections::HashMap;

use chrono::{DateTime, Duration, Utc};
use tokio::sync::Mutex;

use crate::config::structure::RateLimitConfig;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitResult {
    pub allowed: bool,
    pub remaining: u32,
    pub reset_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy)]
struct RateLimitEntry {
    count: u32,
    window_start: DateTime<Utc>,
}

/// In-memory fixed-window counter keyed by client identifier.
///
/// Windows reset lazily on the first access after they expire. Nothing is
/// swept in the background; call [`RateLimiter::cleanup`] to drop stale keys.
/// Every process keeps its own table.
pub struct RateLimiter {
    entries: Mutex<HashMap<String, RateLimitEntry>>,
    max_requests: u32,
    window: Duration,
}

impl RateLimiter {
    pub fn new(max_requests: u32, window: Duration) -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            max_requests,
            window,
        }
    }

    pub fn from_config(config: &RateLimitConfig) -> anyhow::Result<Self> {
        Ok(Self::new(config.max_requests, config.window()?))
    }

    pub async fn check(&self, key: &str) -> RateLimitResult {
        self.check_at(key, Utc::now()).await
    }

    pub async fn check_at(&self, key: &str, now: DateTime<Utc>) -> RateLimitResult {
        let mut entries = self.entries.lock().await;

        match entries.get_mut(key) {
            Some(entry) if !self.expired(entry, now) => {
                let reset_at = entry.window_start + self.window;

                if entry.count >= self.max_requests {
                    return RateLimitResult {
                        allowed: false,
                        remaining: 0,
                        reset_at,
                    };
                }

                entry.count += 1;
                RateLimitResult {
                    allowed: true,
                    remaining: self.max_requests - entry.count,
                    reset_at,
                }
            }
            _ => {
                entries.insert(
                    key.to_string(),
                    RateLimitEntry {
                        count: 1,
                        window_start: now,
                    },
                );

                RateLimitResult {
                    allowed: self.max_requests > 0,
                    remaining: self.max_requests.saturating_sub(1),
                    reset_at: now + self.window,
                }
            }
        }
    }

    /// Reports the current allowance without counting a request.
    pub async fn status(&self, key: &str) -> RateLimitResult {
        self.status_at(key, Utc::now()).await
    }

    pub async fn status_at(&self, key: &str, now: DateTime<Utc>) -> RateLimitResult {
        let entries = self.entries.lock().await;

        match entries.get(key) {
            Some(entry) if !self.expired(entry, now) => RateLimitResult {
                allowed: entry.count < self.max_requests,
                remaining: self.max_requests.saturating_sub(entry.count),
                reset_at: entry.window_start + self.window,
            },
            _ => RateLimitResult {
                allowed: self.max_requests > 0,
                remaining: self.max_requests,
                reset_at: now + self.window,
            },
        }
    }

    /// Drops every entry whose window has run out, returning how many went.
    pub async fn cleanup(&self) -> usize {
        self.cleanup_at(Utc::now()).await
    }

    pub async fn cleanup_at(&self, now: DateTime<Utc>) -> usize {
        let mut entries = self.entries.lock().await;
        let before = entries.len();
        entries.retain(|_, entry| now - entry.window_start < self.window);

        before - entries.len()
    }

    pub async fn reset(&self, key: &str) {
        self.entries.lock().await.remove(key);
    }

    pub async fn clear(&self) {
        self.entries.lock().await.clear();
    }

    pub async fn len(&self) -> usize {
        self.entries.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.lock().await.is_empty()
    }

    fn expired(&self, entry: &RateLimitEntry, now: DateTime<Utc>) -> bool {
        now - entry.window_start >= self.window
    }
}
