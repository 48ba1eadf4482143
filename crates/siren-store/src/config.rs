//! Store construction parameters.

use std::time::Duration;

/// Configuration for constructing an [`AlertStore`](crate::AlertStore).
///
/// The alert history and the group snapshots live in separate logical
/// databases of the same server, so one bad scan cannot touch the other
/// keyspace.
#[derive(Debug, Clone)]
pub struct StoreConfig {
    /// Backend name; must be in the supported set (`redis`, `memory`).
    pub backend: String,
    /// Backend server address.
    pub addr: String,
    /// Password for the backend, if it requires one.
    pub password: Option<String>,
    /// Logical database holding alert history collections.
    pub alerts_db: u32,
    /// Logical database holding group snapshots.
    pub groups_db: u32,
    /// Per-call timeout for backend operations. `None` means unbounded.
    pub timeout: Option<Duration>,
    /// Expiry for group snapshots. `None` keeps them until overwritten.
    pub snapshot_ttl: Option<Duration>,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            backend: "redis".to_string(),
            addr: "127.0.0.1:6379".to_string(),
            password: None,
            alerts_db: 0,
            groups_db: 1,
            timeout: None,
            snapshot_ttl: None,
        }
    }
}

impl StoreConfig {
    /// Creates a configuration for the named backend with defaults.
    #[must_use]
    pub fn new(backend: impl Into<String>) -> Self {
        Self {
            backend: backend.into(),
            ..Self::default()
        }
    }

    /// Sets the backend server address.
    #[must_use]
    pub fn with_addr(mut self, addr: impl Into<String>) -> Self {
        self.addr = addr.into();
        self
    }

    /// Sets the backend password.
    #[must_use]
    pub fn with_password(mut self, password: impl Into<String>) -> Self {
        self.password = Some(password.into());
        self
    }

    /// Sets the logical database indices for history and snapshots.
    #[must_use]
    pub const fn with_databases(mut self, alerts_db: u32, groups_db: u32) -> Self {
        self.alerts_db = alerts_db;
        self.groups_db = groups_db;
        self
    }

    /// Sets the per-call timeout.
    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Sets the group snapshot expiry.
    #[must_use]
    pub const fn with_snapshot_ttl(mut self, ttl: Duration) -> Self {
        self.snapshot_ttl = Some(ttl);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_targets_local_redis() {
        let config = StoreConfig::default();

        assert_eq!(config.backend, "redis");
        assert_eq!(config.addr, "127.0.0.1:6379");
        assert_eq!(config.alerts_db, 0);
        assert_eq!(config.groups_db, 1);
        assert!(config.timeout.is_none());
    }

    #[test]
    fn builder_overrides() {
        let config = StoreConfig::new("memory")
            .with_addr("redis.internal:6380")
            .with_password("hunter2")
            .with_databases(4, 5)
            .with_timeout(Duration::from_secs(1))
            .with_snapshot_ttl(Duration::from_secs(3600));

        assert_eq!(config.backend, "memory");
        assert_eq!(config.addr, "redis.internal:6380");
        assert_eq!(config.password.as_deref(), Some("hunter2"));
        assert_eq!(config.alerts_db, 4);
        assert_eq!(config.groups_db, 5);
        assert_eq!(config.snapshot_ttl, Some(Duration::from_secs(3600)));
    }
}
