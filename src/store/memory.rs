use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use async_trait::async_trait;
use dashmap::DashMap;

use super::{KvStore, StoreError};

/// In-process store with Redis hash/set semantics.
///
/// Each operation holds the shard lock of the single key it touches, which
/// gives the same per-key atomicity Redis offers. A hash whose last field is
/// deleted disappears, as in Redis.
#[derive(Clone, Default)]
pub struct MemoryStore {
    hashes: Arc<DashMap<String, HashMap<String, String>>>,
    sets: Arc<DashMap<String, HashSet<String>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of members currently in a set (for tests and debugging).
    pub fn set_len(&self, key: &str) -> usize {
        self.sets.get(key).map(|s| s.len()).unwrap_or(0)
    }

    pub fn is_member(&self, key: &str, member: &str) -> bool {
        self.sets
            .get(key)
            .map(|s| s.contains(member))
            .unwrap_or(false)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.hashes.contains_key(key) || self.sets.contains_key(key)
    }
}

/// Glob matching for the patterns this service issues: literal text with `*`
/// wildcards. `?` and character classes are not supported.
fn glob_match(pattern: &str, candidate: &str) -> bool {
    let mut parts = pattern.split('*');
    let first = parts.next().unwrap_or_default();
    let Some(mut rest) = candidate.strip_prefix(first) else {
        return false;
    };
    let tail: Vec<&str> = parts.collect();
    let Some((last, middle)) = tail.split_last() else {
        // no wildcard at all
        return rest.is_empty();
    };
    for part in middle {
        match rest.find(part) {
            Some(idx) => rest = &rest[idx + part.len()..],
            None => return false,
        }
    }
    rest.ends_with(last)
}

#[async_trait]
impl KvStore for MemoryStore {
    async fn enumerate_keys(&self, pattern: &str) -> Result<Vec<String>, StoreError> {
        let hashes = self.hashes.iter().map(|e| e.key().clone());
        let sets = self.sets.iter().map(|e| e.key().clone());
        Ok(hashes
            .chain(sets)
            .filter(|k| glob_match(pattern, k))
            .collect())
    }

    async fn get_all_fields(&self, key: &str) -> Result<HashMap<String, String>, StoreError> {
        Ok(self
            .hashes
            .get(key)
            .map(|h| h.value().clone())
            .unwrap_or_default())
    }

    async fn get_field(&self, key: &str, field: &str) -> Result<String, StoreError> {
        self.hashes
            .get(key)
            .and_then(|h| h.get(field).cloned())
            .ok_or_else(|| StoreError::NotFound {
                key: key.to_string(),
                field: field.to_string(),
            })
    }

    async fn set_add(&self, key: &str, member: &str) -> Result<usize, StoreError> {
        let added = self
            .sets
            .entry(key.to_string())
            .or_default()
            .insert(member.to_string());
        Ok(usize::from(added))
    }

    async fn delete_fields(&self, key: &str, fields: &[&str]) -> Result<usize, StoreError> {
        let Some(mut hash) = self.hashes.get_mut(key) else {
            return Ok(0);
        };
        let deleted = fields
            .iter()
            .filter(|field| hash.remove(**field).is_some())
            .count();
        let now_empty = hash.is_empty();
        drop(hash);
        if now_empty {
            self.hashes.remove_if(key, |_, h| h.is_empty());
        }
        Ok(deleted)
    }

    async fn set_members(&self, key: &str) -> Result<Vec<String>, StoreError> {
        Ok(self
            .sets
            .get(key)
            .map(|s| s.iter().cloned().collect())
            .unwrap_or_default())
    }

    async fn set_fields(&self, key: &str, fields: &[(&str, &str)]) -> Result<(), StoreError> {
        let mut hash = self.hashes.entry(key.to_string()).or_default();
        for (field, value) in fields {
            hash.insert(field.to_string(), value.to_string());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_glob_match() {
        assert!(glob_match("request:*", "request:42"));
        assert!(glob_match("request:*", "request:"));
        assert!(!glob_match("request:*", "edl"));
        assert!(!glob_match("request:*", "xrequest:1"));
        assert!(glob_match("edl", "edl"));
        assert!(!glob_match("edl", "edl2"));
        assert!(glob_match("*:done", "request:done"));
        assert!(glob_match("a*b*c", "a-x-b-y-c"));
        assert!(!glob_match("a*b*c", "a-x-c"));
    }

    #[tokio::test]
    async fn test_delete_fields_counts_only_present_fields() {
        let store = MemoryStore::new();
        store
            .set_fields("request:1", &[("user", "a"), ("url", "b")])
            .await
            .unwrap();

        let deleted = store
            .delete_fields("request:1", &["user", "url", "reason"])
            .await
            .unwrap();
        assert_eq!(deleted, 2);
        assert!(!store.contains_key("request:1"), "empty hash is removed");

        let again = store
            .delete_fields("request:1", &["user", "url", "reason"])
            .await
            .unwrap();
        assert_eq!(again, 0);
    }

    #[tokio::test]
    async fn test_set_add_is_idempotent() {
        let store = MemoryStore::new();
        assert_eq!(store.set_add("edl", "http://x.test").await.unwrap(), 1);
        assert_eq!(store.set_add("edl", "http://x.test").await.unwrap(), 0);
        assert_eq!(store.set_len("edl"), 1);
    }

    #[tokio::test]
    async fn test_get_field_missing_is_not_found() {
        let store = MemoryStore::new();
        let err = store.get_field("request:99", "url").await.unwrap_err();
        assert!(matches!(err, StoreError::NotFound { .. }));
    }

    #[tokio::test]
    async fn test_enumerate_keys_filters_by_pattern() {
        let store = MemoryStore::new();
        store.set_fields("request:1", &[("user", "a")]).await.unwrap();
        store.set_fields("request:2", &[("user", "b")]).await.unwrap();
        store.set_add("edl", "http://x.test").await.unwrap();

        let mut keys = store.enumerate_keys("request:*").await.unwrap();
        keys.sort();
        assert_eq!(keys, vec!["request:1", "request:2"]);
    }
}
