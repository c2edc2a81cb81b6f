//! Whole-response cache for pages that don't depend on who is viewing them.
//!
//! Entries are served unchanged until their TTL runs out, even if the data behind them changed.
//! `clear` drops everything at once.
use bytes::Bytes;
use moka::{sync::Cache, Expiry};
use std::time::{Duration, Instant};

#[derive(Debug, Clone)]
struct Entry {
    body: Bytes,
    ttl: Duration,
}

/// Each entry lives for the TTL it was stored with.
struct EntryTtl;

impl Expiry<String, Entry> for EntryTtl {
    fn expire_after_create(
        &self,
        _key: &String,
        entry: &Entry,
        _created_at: Instant,
    ) -> Option<Duration> {
        Some(entry.ttl)
    }

    fn expire_after_update(
        &self,
        _key: &String,
        entry: &Entry,
        _updated_at: Instant,
        _duration_until_expiry: Option<Duration>,
    ) -> Option<Duration> {
        Some(entry.ttl)
    }
}

/// A bounded, keyed store of response bodies with per-entry expiry. Cloning shares the store.
#[derive(Debug, Clone)]
pub struct PageCache {
    entries: Cache<String, Entry>,
}

impl PageCache {
    /// At most `capacity` entries are kept, none of them for longer than `max_ttl`.
    pub fn new(capacity: u64, max_ttl: Duration) -> Self {
        let entries = Cache::builder()
            .max_capacity(capacity)
            .time_to_live(max_ttl)
            .expire_after(EntryTtl)
            .build();
        Self { entries }
    }

    /// The cached body for `key`, unless it is missing or expired.
    pub fn get(&self, key: &str) -> Option<Bytes> {
        self.entries.get(key).map(|entry| entry.body)
    }

    /// Store `body` under `key` for `ttl`. Overwrites whatever was there.
    pub fn set(&self, key: &str, body: Bytes, ttl: Duration) {
        self.entries.insert(key.to_owned(), Entry { body, ttl });
    }

    pub fn clear(&self) {
        self.entries.invalidate_all();
    }

    /// Live entries, once pending evictions have been applied.
    pub fn len(&self) -> u64 {
        self.entries.run_pending_tasks();
        self.entries.entry_count()
    }
}
