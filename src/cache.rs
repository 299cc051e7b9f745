//! Advisory URL content cache with TTL and bounded size.
//!
//! The cache is injected into the fetch chain rather than living as
//! ambient global state, so tests can substitute a fake clock. A miss
//! is never an error; concurrent writers racing to populate the same
//! key are harmless because values are idempotent for a URL within the
//! TTL window (last write wins).

use chrono::{DateTime, Duration, Utc};
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::sync::Mutex;
use tracing::debug;

/// Time source seam so tests can advance time without sleeping.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// Wall-clock time; the production clock.
#[derive(Debug, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

struct Entry {
    body: String,
    stored_at: DateTime<Utc>,
}

/// Read-mostly URL body cache keyed by a SHA-256 hash of the URL.
pub struct UrlCache {
    ttl: Duration,
    max_entries: usize,
    clock: Box<dyn Clock>,
    entries: Mutex<HashMap<String, Entry>>,
}

impl UrlCache {
    pub fn new(ttl_minutes: u64, max_entries: usize) -> Self {
        Self::with_clock(ttl_minutes, max_entries, Box::new(SystemClock))
    }

    pub fn with_clock(ttl_minutes: u64, max_entries: usize, clock: Box<dyn Clock>) -> Self {
        Self {
            ttl: Duration::minutes(ttl_minutes as i64),
            max_entries,
            clock,
            entries: Mutex::new(HashMap::new()),
        }
    }

    fn key(url: &str) -> String {
        let digest = Sha256::digest(url.as_bytes());
        format!("{digest:x}")
    }

    /// Look up a body for `url`, honoring the TTL. Expired entries are
    /// removed on access.
    pub fn get(&self, url: &str) -> Option<String> {
        let key = Self::key(url);
        let now = self.clock.now();
        let mut entries = self.entries.lock().expect("cache lock poisoned");
        if let Some(entry) = entries.get(&key) {
            if now - entry.stored_at < self.ttl {
                debug!(%url, "URL cache hit");
                return Some(entry.body.clone());
            }
            entries.remove(&key);
        }
        None
    }

    /// Store a body for `url`. When the cache is full, expired entries
    /// are purged first; if it is still full the write is skipped (the
    /// cache is advisory, never load-bearing).
    pub fn put(&self, url: &str, body: &str) {
        let key = Self::key(url);
        let now = self.clock.now();
        let mut entries = self.entries.lock().expect("cache lock poisoned");

        if entries.len() >= self.max_entries && !entries.contains_key(&key) {
            let ttl = self.ttl;
            entries.retain(|_, e| now - e.stored_at < ttl);
            if entries.len() >= self.max_entries {
                debug!(%url, "URL cache full; skipping insert");
                return;
            }
        }

        entries.insert(
            key,
            Entry {
                body: body.to_string(),
                stored_at: now,
            },
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicI64, Ordering};

    struct FakeClock {
        minutes: AtomicI64,
    }

    impl FakeClock {
        fn new() -> Self {
            Self {
                minutes: AtomicI64::new(0),
            }
        }
    }

    impl Clock for &'static FakeClock {
        fn now(&self) -> DateTime<Utc> {
            DateTime::<Utc>::from_timestamp(self.minutes.load(Ordering::SeqCst) * 60, 0).unwrap()
        }
    }

    fn leaked_clock() -> &'static FakeClock {
        Box::leak(Box::new(FakeClock::new()))
    }

    #[test]
    fn test_hit_within_ttl() {
        let clock = leaked_clock();
        let cache = UrlCache::with_clock(10, 8, Box::new(clock));
        cache.put("https://co.com/blog/a", "body");
        assert_eq!(cache.get("https://co.com/blog/a").as_deref(), Some("body"));
    }

    #[test]
    fn test_miss_after_ttl() {
        let clock = leaked_clock();
        let cache = UrlCache::with_clock(10, 8, Box::new(clock));
        cache.put("https://co.com/blog/a", "body");
        clock.minutes.store(11, Ordering::SeqCst);
        assert_eq!(cache.get("https://co.com/blog/a"), None);
    }

    #[test]
    fn test_miss_is_not_an_error_and_cache_is_bounded() {
        let clock = leaked_clock();
        let cache = UrlCache::with_clock(10, 2, Box::new(clock));
        assert_eq!(cache.get("https://co.com/never-stored"), None);

        cache.put("https://co.com/1", "a");
        cache.put("https://co.com/2", "b");
        cache.put("https://co.com/3", "c"); // full, skipped
        assert_eq!(cache.get("https://co.com/3"), None);
        assert_eq!(cache.get("https://co.com/1").as_deref(), Some("a"));
    }

    #[test]
    fn test_last_write_wins() {
        let clock = leaked_clock();
        let cache = UrlCache::with_clock(10, 8, Box::new(clock));
        cache.put("https://co.com/blog/a", "first");
        cache.put("https://co.com/blog/a", "second");
        assert_eq!(cache.get("https://co.com/blog/a").as_deref(), Some("second"));
    }
}
