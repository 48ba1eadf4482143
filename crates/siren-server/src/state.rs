//! Shared state for the HTTP handlers.

use std::time::Instant;

use siren_store::AlertStore;

use crate::config::TenantConfig;
use crate::metrics::Metrics;

/// State shared by every request handler.
///
/// Holds the one store handle opened at startup, the tenant extraction
/// rules, and the process metrics sink.
pub struct AppState {
    store: AlertStore,
    tenant: TenantConfig,
    metrics: Metrics,
    started_at: Instant,
}

impl AppState {
    /// Creates the shared state.
    #[must_use]
    pub fn new(store: AlertStore, tenant: TenantConfig) -> Self {
        Self {
            store,
            tenant,
            metrics: Metrics::new(),
            started_at: Instant::now(),
        }
    }

    /// The alert store handle.
    #[must_use]
    pub const fn store(&self) -> &AlertStore {
        &self.store
    }

    /// The tenant extraction rules.
    #[must_use]
    pub const fn tenant(&self) -> &TenantConfig {
        &self.tenant
    }

    /// The process metrics sink.
    #[must_use]
    pub const fn metrics(&self) -> &Metrics {
        &self.metrics
    }

    /// Seconds since the server started.
    #[must_use]
    pub fn uptime_secs(&self) -> u64 {
        self.started_at.elapsed().as_secs()
    }
}
