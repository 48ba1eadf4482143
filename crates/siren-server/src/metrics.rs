//! Process counters for the ingestion and query paths.
//!
//! A plain metrics sink passed explicitly through shared state; the alert
//! store itself stays metrics-agnostic and only returns outcomes for the
//! handlers to record.

use std::sync::atomic::{AtomicU64, Ordering};

use serde::Serialize;

/// Counters recorded by the HTTP handlers.
#[derive(Debug, Default)]
pub struct Metrics {
    webhooks_received: AtomicU64,
    webhooks_invalid: AtomicU64,
    alerts_received: AtomicU64,
    alerts_saved: AtomicU64,
    alerts_save_failures: AtomicU64,
    history_requests: AtomicU64,
    history_failures: AtomicU64,
}

/// A point-in-time copy of all counters, served at `/metrics`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct MetricsSnapshot {
    /// Webhook posts received, valid or not.
    pub webhooks_received: u64,
    /// Webhook posts rejected as malformed.
    pub webhooks_invalid: u64,
    /// Alerts contained in accepted webhooks.
    pub alerts_received: u64,
    /// Alerts successfully written to history.
    pub alerts_saved: u64,
    /// Alerts that failed to be written.
    pub alerts_save_failures: u64,
    /// History queries served.
    pub history_requests: u64,
    /// History queries that failed.
    pub history_failures: u64,
}

impl Metrics {
    /// Creates a zeroed sink.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Records one webhook post.
    pub fn inc_webhooks_received(&self) {
        self.webhooks_received.fetch_add(1, Ordering::Relaxed);
    }

    /// Records one rejected webhook post.
    pub fn inc_webhooks_invalid(&self) {
        self.webhooks_invalid.fetch_add(1, Ordering::Relaxed);
    }

    /// Records alerts carried by an accepted webhook.
    pub fn add_alerts_received(&self, count: u64) {
        self.alerts_received.fetch_add(count, Ordering::Relaxed);
    }

    /// Records one alert written to history.
    pub fn inc_alerts_saved(&self) {
        self.alerts_saved.fetch_add(1, Ordering::Relaxed);
    }

    /// Records one alert that failed to be written.
    pub fn inc_alerts_save_failures(&self) {
        self.alerts_save_failures.fetch_add(1, Ordering::Relaxed);
    }

    /// Records one history query.
    pub fn inc_history_requests(&self) {
        self.history_requests.fetch_add(1, Ordering::Relaxed);
    }

    /// Records one failed history query.
    pub fn inc_history_failures(&self) {
        self.history_failures.fetch_add(1, Ordering::Relaxed);
    }

    /// Copies the current counter values.
    #[must_use]
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            webhooks_received: self.webhooks_received.load(Ordering::Relaxed),
            webhooks_invalid: self.webhooks_invalid.load(Ordering::Relaxed),
            alerts_received: self.alerts_received.load(Ordering::Relaxed),
            alerts_saved: self.alerts_saved.load(Ordering::Relaxed),
            alerts_save_failures: self.alerts_save_failures.load(Ordering::Relaxed),
            history_requests: self.history_requests.load(Ordering::Relaxed),
            history_failures: self.history_failures.load(Ordering::Relaxed),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_sink_is_zeroed() {
        let snapshot = Metrics::new().snapshot();

        assert_eq!(snapshot.webhooks_received, 0);
        assert_eq!(snapshot.alerts_saved, 0);
        assert_eq!(snapshot.history_failures, 0);
    }

    #[test]
    fn counters_accumulate() {
        let metrics = Metrics::new();
        metrics.inc_webhooks_received();
        metrics.inc_webhooks_received();
        metrics.add_alerts_received(3);
        metrics.inc_alerts_saved();
        metrics.inc_alerts_save_failures();
        metrics.inc_history_requests();
        metrics.inc_history_failures();

        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.webhooks_received, 2);
        assert_eq!(snapshot.alerts_received, 3);
        assert_eq!(snapshot.alerts_saved, 1);
        assert_eq!(snapshot.alerts_save_failures, 1);
        assert_eq!(snapshot.history_requests, 1);
        assert_eq!(snapshot.history_failures, 1);
    }

    #[test]
    fn snapshot_serializes_all_counters() {
        let json = serde_json::to_value(Metrics::new().snapshot()).unwrap();

        assert_eq!(json["webhooks_received"], 0);
        assert_eq!(json["webhooks_invalid"], 0);
        assert_eq!(json["alerts_received"], 0);
    }
}
