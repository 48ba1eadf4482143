//! In-process backend with the same visible semantics as Redis.
//!
//! Backs the test suites and single-process deployments where an external
//! store is not worth running.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use parking_lot::RwLock;

use crate::backend::Backend;
use crate::error::Result;

#[derive(Debug, Clone)]
struct PlainEntry {
    value: Vec<u8>,
    expires_at: Option<Instant>,
}

impl PlainEntry {
    fn is_expired(&self) -> bool {
        self.expires_at.is_some_and(|deadline| Instant::now() >= deadline)
    }
}

#[derive(Debug, Default)]
struct State {
    /// Ordered collections, kept sorted by (score, member bytes) like a
    /// Redis sorted set orders ties lexicographically.
    sorted: HashMap<String, Vec<(f64, Vec<u8>)>>,
    plain: HashMap<String, PlainEntry>,
}

/// An in-memory [`Backend`].
///
/// All operations take a short lock; nothing blocks on I/O, so no per-call
/// timeout is needed.
#[derive(Debug, Default)]
pub struct MemoryBackend {
    state: RwLock<State>,
}

impl MemoryBackend {
    /// Creates an empty backend.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Backend for MemoryBackend {
    async fn insert_scored(&self, key: &str, member: &[u8], score: f64) -> Result<()> {
        let mut state = self.state.write();
        let collection = state.sorted.entry(key.to_string()).or_default();
        // Byte-identical members update their score in place.
        collection.retain(|(_, existing)| existing != member);
        let position = collection
            .partition_point(|(s, m)| (s.total_cmp(&score), m.as_slice()) < (std::cmp::Ordering::Equal, member));
        collection.insert(position, (score, member.to_vec()));
        Ok(())
    }

    async fn range_by_score(
        &self,
        key: &str,
        max_score: f64,
        offset: i64,
        count: i64,
    ) -> Result<Vec<Vec<u8>>> {
        if count == 0 {
            return Ok(Vec::new());
        }
        let state = self.state.read();
        let members = state
            .sorted
            .get(key)
            .map(|collection| {
                let filtered = collection
                    .iter()
                    .filter(|(score, _)| *score <= max_score)
                    .skip(usize::try_from(offset).unwrap_or(0));
                if count < 0 {
                    filtered.map(|(_, member)| member.clone()).collect()
                } else {
                    filtered
                        .take(usize::try_from(count).unwrap_or(0))
                        .map(|(_, member)| member.clone())
                        .collect()
                }
            })
            .unwrap_or_default();
        Ok(members)
    }

    async fn cardinality(&self, key: &str) -> Result<i64> {
        let state = self.state.read();
        Ok(state.sorted.get(key).map_or(0, |c| c.len() as i64))
    }

    async fn set(&self, key: &str, value: &[u8], ttl: Option<Duration>) -> Result<()> {
        let entry = PlainEntry {
            value: value.to_vec(),
            expires_at: ttl.filter(|t| !t.is_zero()).map(|t| Instant::now() + t),
        };
        self.state.write().plain.insert(key.to_string(), entry);
        Ok(())
    }

    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        let state = self.state.read();
        Ok(state
            .plain
            .get(key)
            .filter(|entry| !entry.is_expired())
            .map(|entry| entry.value.clone()))
    }

    async fn exists(&self, key: &str) -> Result<bool> {
        let state = self.state.read();
        Ok(state.plain.get(key).is_some_and(|entry| !entry.is_expired()))
    }

    async fn delete(&self, key: &str) -> Result<bool> {
        let mut state = self.state.write();
        let had_sorted = state.sorted.remove(key).is_some();
        let had_plain = state.plain.remove(key).is_some();
        Ok(had_sorted || had_plain)
    }

    async fn delete_prefixed(&self, prefix: &str) -> Result<u64> {
        let mut state = self.state.write();
        let before = state.sorted.len() + state.plain.len();
        state.sorted.retain(|key, _| !key.starts_with(prefix));
        state.plain.retain(|key, _| !key.starts_with(prefix));
        Ok((before - state.sorted.len() - state.plain.len()) as u64)
    }

    async fn ping(&self) -> Result<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn range_returns_members_in_ascending_score_order() {
        let backend = MemoryBackend::new();
        backend.insert_scored("k", b"later", 200.0).await.unwrap();
        backend.insert_scored("k", b"earliest", 50.0).await.unwrap();
        backend.insert_scored("k", b"middle", 100.0).await.unwrap();

        let members = backend
            .range_by_score("k", f64::INFINITY, 0, -1)
            .await
            .unwrap();

        assert_eq!(members, vec![b"earliest".to_vec(), b"middle".to_vec(), b"later".to_vec()]);
    }

    #[tokio::test]
    async fn identical_member_updates_score_instead_of_duplicating() {
        let backend = MemoryBackend::new();
        backend.insert_scored("k", b"same", 10.0).await.unwrap();
        backend.insert_scored("k", b"same", 20.0).await.unwrap();

        assert_eq!(backend.cardinality("k").await.unwrap(), 1);

        let members = backend.range_by_score("k", 15.0, 0, -1).await.unwrap();
        assert!(members.is_empty());
    }

    #[tokio::test]
    async fn equal_scores_order_by_member_bytes() {
        let backend = MemoryBackend::new();
        backend.insert_scored("k", b"bbb", 5.0).await.unwrap();
        backend.insert_scored("k", b"aaa", 5.0).await.unwrap();

        let members = backend
            .range_by_score("k", f64::INFINITY, 0, -1)
            .await
            .unwrap();

        assert_eq!(members, vec![b"aaa".to_vec(), b"bbb".to_vec()]);
    }

    #[tokio::test]
    async fn range_honors_offset_and_count() {
        let backend = MemoryBackend::new();
        for (member, score) in [(b"a", 1.0), (b"b", 2.0), (b"c", 3.0), (b"d", 4.0)] {
            backend.insert_scored("k", member, score).await.unwrap();
        }

        let members = backend.range_by_score("k", f64::INFINITY, 1, 2).await.unwrap();
        assert_eq!(members, vec![b"b".to_vec(), b"c".to_vec()]);

        let none = backend.range_by_score("k", f64::INFINITY, 0, 0).await.unwrap();
        assert!(none.is_empty());
    }

    #[tokio::test]
    async fn range_ceiling_is_inclusive() {
        let backend = MemoryBackend::new();
        backend.insert_scored("k", b"at", 100.0).await.unwrap();
        backend.insert_scored("k", b"above", 101.0).await.unwrap();

        let members = backend.range_by_score("k", 100.0, 0, -1).await.unwrap();
        assert_eq!(members, vec![b"at".to_vec()]);
    }

    #[tokio::test]
    async fn cardinality_of_missing_key_is_zero() {
        let backend = MemoryBackend::new();
        assert_eq!(backend.cardinality("nope").await.unwrap(), 0);
    }

    #[tokio::test]
    async fn set_get_exists_delete_round_trip() {
        let backend = MemoryBackend::new();

        assert!(!backend.exists("snapshot").await.unwrap());
        backend.set("snapshot", b"v1", None).await.unwrap();
        assert!(backend.exists("snapshot").await.unwrap());
        assert_eq!(backend.get("snapshot").await.unwrap(), Some(b"v1".to_vec()));

        backend.set("snapshot", b"v2", None).await.unwrap();
        assert_eq!(backend.get("snapshot").await.unwrap(), Some(b"v2".to_vec()));

        assert!(backend.delete("snapshot").await.unwrap());
        assert!(!backend.exists("snapshot").await.unwrap());
        assert!(!backend.delete("snapshot").await.unwrap());
    }

    #[tokio::test]
    async fn expired_entries_are_invisible() {
        let backend = MemoryBackend::new();
        backend
            .set("ephemeral", b"v", Some(Duration::from_nanos(1)))
            .await
            .unwrap();
        tokio::time::sleep(Duration::from_millis(5)).await;

        assert!(!backend.exists("ephemeral").await.unwrap());
        assert_eq!(backend.get("ephemeral").await.unwrap(), None);
    }

    #[tokio::test]
    async fn delete_prefixed_removes_only_matching_keys() {
        let backend = MemoryBackend::new();
        backend.insert_scored("t1|a", b"m", 1.0).await.unwrap();
        backend.insert_scored("t1|b", b"m", 1.0).await.unwrap();
        backend.insert_scored("t10|a", b"m", 1.0).await.unwrap();

        let deleted = backend.delete_prefixed("t1|").await.unwrap();

        assert_eq!(deleted, 2);
        assert_eq!(backend.cardinality("t1|a").await.unwrap(), 0);
        assert_eq!(backend.cardinality("t10|a").await.unwrap(), 1);
    }

    #[tokio::test]
    async fn delete_prefixed_treats_metacharacters_literally() {
        let backend = MemoryBackend::new();
        backend.insert_scored("t*|a", b"m", 1.0).await.unwrap();
        backend.insert_scored("t1|a", b"m", 1.0).await.unwrap();
        backend.insert_scored("t2|a", b"m", 1.0).await.unwrap();

        let deleted = backend.delete_prefixed("t*|").await.unwrap();

        assert_eq!(deleted, 1);
        assert_eq!(backend.cardinality("t*|a").await.unwrap(), 0);
        assert_eq!(backend.cardinality("t1|a").await.unwrap(), 1);
        assert_eq!(backend.cardinality("t2|a").await.unwrap(), 1);
    }

    #[tokio::test]
    async fn ping_always_succeeds() {
        assert!(MemoryBackend::new().ping().await.is_ok());
    }
}
