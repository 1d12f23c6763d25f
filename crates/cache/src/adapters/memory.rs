//! In-process cache store
//!
//! Expiry is evaluated lazily against the injected clock: an expired entry
//! is dropped the next time it is read or listed.

use async_trait::async_trait;
use dashmap::DashMap;
use log::trace;
use pulse_core::Timestamp;
use pulse_ports::{CacheStore, Clock, StoreResult};
use std::sync::Arc;
use std::time::Duration;

struct StoredValue {
    value: String,
    expires_at: Timestamp,
}

/// [`CacheStore`] backed by a concurrent map
pub struct InMemoryStore {
    entries: DashMap<String, StoredValue>,
    clock: Arc<dyn Clock>,
}

impl InMemoryStore {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            entries: DashMap::new(),
            clock,
        }
    }

    /// Number of stored entries, including expired ones not yet evicted
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Drop every expired entry; returns how many were removed
    pub fn purge_expired(&self) -> usize {
        let now = self.clock.now();
        let before = self.entries.len();
        self.entries.retain(|_, stored| stored.expires_at > now);
        before - self.entries.len()
    }
}

#[async_trait]
impl CacheStore for InMemoryStore {
    async fn get(&self, key: &str) -> StoreResult<Option<String>> {
        let now = self.clock.now();
        let expired = match self.entries.get(key) {
            Some(stored) if stored.expires_at > now => return Ok(Some(stored.value.clone())),
            Some(_) => true,
            None => false,
        };

        if expired {
            trace!("[STORE] evicting expired {}", key);
            self.entries.remove_if(key, |_, stored| stored.expires_at <= now);
        }
        Ok(None)
    }

    async fn set(&self, key: &str, value: String, ttl: Duration) -> StoreResult<()> {
        let ttl = chrono::Duration::from_std(ttl).unwrap_or(chrono::Duration::MAX);
        let now = self.clock.now();
        let expires_at = now.checked_add_signed(ttl).unwrap_or(Timestamp::MAX_UTC);
        self.entries
            .insert(key.to_string(), StoredValue { value, expires_at });
        Ok(())
    }

    async fn delete(&self, key: &str) -> StoreResult<bool> {
        Ok(self.entries.remove(key).is_some())
    }

    async fn keys(&self, pattern: &str) -> StoreResult<Vec<String>> {
        let now = self.clock.now();
        let mut keys: Vec<String> = self
            .entries
            .iter()
            .filter(|entry| entry.expires_at > now && glob_match(pattern, entry.key()))
            .map(|entry| entry.key().clone())
            .collect();
        keys.sort();
        Ok(keys)
    }
}

/// Match `text` against a pattern where `*` stands for any run of characters
pub fn glob_match(pattern: &str, text: &str) -> bool {
    let mut parts = pattern.split('*');
    let first = parts.next().unwrap_or("");
    let Some(mut rest) = text.strip_prefix(first) else {
        return false;
    };

    let segments: Vec<&str> = parts.collect();
    let Some((last, middle)) = segments.split_last() else {
        // No wildcard at all
        return rest.is_empty();
    };

    for segment in middle {
        match rest.find(segment) {
            Some(pos) => rest = &rest[pos + segment.len()..],
            None => return false,
        }
    }
    rest.len() >= last.len() && rest.ends_with(last)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration as ChronoDuration;
    use pulse_clock::ManualClock;

    #[test]
    fn test_glob_match() {
        assert!(glob_match("search:docs:*", "search:docs:tokio"));
        assert!(glob_match("*", "anything"));
        assert!(glob_match("search:*:tokio", "search:docs:tokio"));
        assert!(glob_match("exact", "exact"));
        assert!(glob_match("a*b*c", "aXXbYYc"));
        assert!(!glob_match("exact", "exact-not"));
        assert!(!glob_match("search:docs:*", "search:products:tokio"));
        assert!(!glob_match("a*bc", "abc-"));
        assert!(!glob_match("ab*ba", "aba"));
    }

    #[tokio::test]
    async fn test_entries_expire_with_clock() {
        let clock = ManualClock::new(None);
        let store = InMemoryStore::new(clock.clone());

        store.set("k", "v".to_string(), Duration::from_secs(60)).await.unwrap();
        assert_eq!(store.get("k").await.unwrap(), Some("v".to_string()));

        clock.advance(ChronoDuration::seconds(60));
        assert_eq!(store.get("k").await.unwrap(), None);
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn test_keys_and_delete() {
        let clock = ManualClock::new(None);
        let store = InMemoryStore::new(clock.clone());
        store.set("search:docs:a", "1".into(), Duration::from_secs(10)).await.unwrap();
        store.set("search:docs:b", "2".into(), Duration::from_secs(100)).await.unwrap();
        store.set("search:products:a", "3".into(), Duration::from_secs(100)).await.unwrap();

        assert_eq!(
            store.keys("search:docs:*").await.unwrap(),
            vec!["search:docs:a", "search:docs:b"]
        );

        clock.advance(ChronoDuration::seconds(30));
        assert_eq!(store.keys("search:docs:*").await.unwrap(), vec!["search:docs:b"]);
        assert_eq!(store.purge_expired(), 1);

        assert!(store.delete("search:docs:b").await.unwrap());
        assert!(!store.delete("search:docs:b").await.unwrap());
        assert_eq!(store.len(), 1);
    }
}
