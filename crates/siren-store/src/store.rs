//! The tenant-scoped alert store facade.

use std::sync::Arc;
use std::time::Duration;

use siren_backend::{Backend, BackendKind, MemoryBackend, RedisBackend, RedisConfig};
use siren_model::{decode_alerts, Alert, AlertGroup, HistoryPage, HistoryQuery};
use tracing::debug;

use crate::config::StoreConfig;
use crate::error::{Result, StoreError};

/// Composes the history collection key for one tenant and alert identity.
///
/// Two alerts with the same tenant and identity share one history
/// collection.
#[must_use]
pub fn history_key(tenant: &str, identity: &str) -> String {
    format!("{tenant}|{identity}")
}

/// The domain-level facade over the backend store.
///
/// Translates alert operations into backend calls: history inserts are
/// scored by the alert's start time (Unix seconds), group snapshots
/// overwrite a plain per-tenant key. The facade holds no in-process mutable
/// state and is safe for unsynchronized concurrent use; it never retries —
/// every backend failure propagates to the caller.
#[derive(Clone)]
pub struct AlertStore {
    alerts: Arc<dyn Backend>,
    groups: Arc<dyn Backend>,
    snapshot_ttl: Option<Duration>,
}

impl std::fmt::Debug for AlertStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AlertStore")
            .field("snapshot_ttl", &self.snapshot_ttl)
            .finish_non_exhaustive()
    }
}

impl AlertStore {
    /// Builds a store over already-constructed backend handles.
    #[must_use]
    pub fn new(alerts: Arc<dyn Backend>, groups: Arc<dyn Backend>) -> Self {
        Self {
            alerts,
            groups,
            snapshot_ttl: None,
        }
    }

    /// Sets the expiry applied to group snapshots.
    #[must_use]
    pub const fn with_snapshot_ttl(mut self, ttl: Duration) -> Self {
        self.snapshot_ttl = Some(ttl);
        self
    }

    /// Connects the configured backend and builds the store.
    ///
    /// Fails fast: an unknown backend name or a backend that does not
    /// answer its initial ping is a construction error, and the process
    /// should not serve traffic.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Backend`] for unknown backend names and for
    /// any connection or ping failure.
    pub async fn connect(config: &StoreConfig) -> Result<Self> {
        let store = match BackendKind::parse(&config.backend)? {
            BackendKind::Redis => {
                let base = RedisConfig::new(config.addr.clone());
                let base = match &config.password {
                    Some(password) => base.with_password(password.clone()),
                    None => base,
                };
                let base = match config.timeout {
                    Some(timeout) => base.with_timeout(timeout),
                    None => base,
                };
                let alerts = RedisBackend::connect(base.clone().with_db(config.alerts_db)).await?;
                let groups = RedisBackend::connect(base.with_db(config.groups_db)).await?;
                Self::new(Arc::new(alerts), Arc::new(groups))
            }
            BackendKind::Memory => Self::new(
                Arc::new(MemoryBackend::new()),
                Arc::new(MemoryBackend::new()),
            ),
        };

        Ok(match config.snapshot_ttl {
            Some(ttl) => store.with_snapshot_ttl(ttl),
            None => store,
        })
    }

    /// Upserts one alert into the history collection at `key`, scored by
    /// its start time.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Serialize`] if the alert cannot be serialized
    /// and [`StoreError::Backend`] on backend failure.
    pub async fn set_tenant_alert(&self, key: &str, alert: &Alert) -> Result<()> {
        let entry = serde_json::to_vec(alert).map_err(|source| StoreError::Serialize {
            what: "alert",
            source,
        })?;
        self.alerts.insert_scored(key, &entry, alert.score()).await?;
        debug!(key = %key, score = alert.score(), "stored alert");
        Ok(())
    }

    /// Stores `group` as the tenant's latest snapshot, discarding the
    /// previous one.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Serialize`] if the group cannot be serialized
    /// and [`StoreError::Backend`] on backend failure.
    pub async fn set_alert_group(&self, tenant: &str, group: &AlertGroup) -> Result<()> {
        let snapshot = serde_json::to_vec(group).map_err(|source| StoreError::Serialize {
            what: "alert group",
            source,
        })?;
        self.groups.set(tenant, &snapshot, self.snapshot_ttl).await?;
        debug!(tenant = %tenant, alerts = group.alerts.len(), "stored group snapshot");
        Ok(())
    }

    /// Fetches the tenant's latest group snapshot, if one exists.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Decode`] if the stored snapshot is not a valid
    /// serialized group and [`StoreError::Backend`] on backend failure.
    pub async fn get_alert_group(&self, tenant: &str) -> Result<Option<AlertGroup>> {
        match self.groups.get(tenant).await? {
            Some(snapshot) => Ok(Some(siren_model::parse_payload(&snapshot)?)),
            None => Ok(None),
        }
    }

    /// Runs one history query and shapes the result page.
    ///
    /// `total` is the full cardinality of the collection, independent of
    /// pagination; `limit` is the page size that was requested.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Backend`] on backend failure and
    /// [`StoreError::Decode`] if a stored entry is malformed.
    pub async fn get_tenant_alerts(&self, query: &HistoryQuery) -> Result<HistoryPage> {
        let raw = self
            .alerts
            .range_by_score(&query.key, query.score_ceiling, query.offset, query.count)
            .await?;
        let alerts = decode_alerts(&raw)?;
        let total = self.alerts.cardinality(&query.key).await?;

        Ok(HistoryPage {
            alerts,
            total,
            offset: query.offset,
            limit: query.count,
        })
    }

    /// Total number of alerts stored under `key`.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Backend`] on backend failure.
    pub async fn total_by_key(&self, key: &str) -> Result<i64> {
        Ok(self.alerts.cardinality(key).await?)
    }

    /// Deletes the tenant's entire alert history and its group snapshot.
    ///
    /// Removes every history collection under `"{tenant}|"` plus the
    /// snapshot key, and returns the number of history collections removed.
    /// The first backend failure aborts and surfaces; there is no silent
    /// partial delete.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Backend`] on backend failure.
    pub async fn delete_tenant_alerts(&self, tenant: &str) -> Result<u64> {
        let deleted = self.alerts.delete_prefixed(&history_key(tenant, "")).await?;
        self.groups.delete(tenant).await?;
        debug!(tenant = %tenant, collections = deleted, "deleted tenant history");
        Ok(deleted)
    }

    /// Pings both backends.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Backend`] if either backend is unreachable.
    pub async fn ping(&self) -> Result<()> {
        self.alerts.ping().await?;
        self.groups.ping().await?;
        Ok(())
    }
}
