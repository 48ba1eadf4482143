//! The backend contract and the closed set of selectable backends.

use std::time::Duration;

use async_trait::async_trait;

use crate::error::{BackendError, Result};

/// A thin, backend-agnostic contract for ordered collections keyed by
/// string, plus plain key/value storage.
///
/// All mutation is serialized inside the backend; implementations are safe
/// for unsynchronized concurrent use through a shared handle. Every
/// operation may block on I/O and honors the per-call timeout the
/// implementation was configured with.
///
/// Implementations:
/// - [`RedisBackend`](crate::redis::RedisBackend): Redis over RESP2
/// - [`MemoryBackend`](crate::memory::MemoryBackend): in-process store
#[async_trait]
pub trait Backend: Send + Sync {
    /// Adds `member` to the ordered collection at `key` with the given
    /// score. Byte-identical members update their score in place; distinct
    /// members are always kept, even with identical scores.
    async fn insert_scored(&self, key: &str, member: &[u8], score: f64) -> Result<()>;

    /// Ascending-score slice of the collection at `key`, from `-inf` up to
    /// and including `max_score`, skipping `offset` entries. A negative
    /// `count` means unbounded; zero returns nothing.
    async fn range_by_score(
        &self,
        key: &str,
        max_score: f64,
        offset: i64,
        count: i64,
    ) -> Result<Vec<Vec<u8>>>;

    /// Total member count of the collection at `key`, irrespective of
    /// pagination. Zero for a missing key.
    async fn cardinality(&self, key: &str) -> Result<i64>;

    /// Unconditional overwrite of a plain key, with an optional expiry.
    async fn set(&self, key: &str, value: &[u8], ttl: Option<Duration>) -> Result<()>;

    /// Fetches a plain key. `None` if absent or expired.
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>>;

    /// Whether a plain key is present.
    async fn exists(&self, key: &str) -> Result<bool>;

    /// Removes one key of any kind. Returns whether it existed.
    async fn delete(&self, key: &str) -> Result<bool>;

    /// Removes every key starting with `prefix`, returning how many were
    /// deleted.
    async fn delete_prefixed(&self, prefix: &str) -> Result<u64>;

    /// Liveness probe. Used at construction time: a backend that fails its
    /// initial ping must not be handed out.
    async fn ping(&self) -> Result<()>;
}

/// The closed set of supported backend names.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendKind {
    /// Redis-family store over RESP2.
    Redis,
    /// In-process store, for tests and single-node deployments.
    Memory,
}

impl BackendKind {
    /// Parses a configured backend name.
    ///
    /// # Errors
    ///
    /// Returns [`BackendError::UnknownBackend`] for any name outside the
    /// supported set; construction must fail rather than default silently.
    pub fn parse(name: &str) -> Result<Self> {
        match name {
            "redis" => Ok(Self::Redis),
            "memory" => Ok(Self::Memory),
            other => Err(BackendError::UnknownBackend(other.to_string())),
        }
    }

    /// Returns the canonical name of this backend.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Redis => "redis",
            Self::Memory => "memory",
        }
    }
}

impl std::str::FromStr for BackendKind {
    type Err = BackendError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl std::fmt::Display for BackendKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
