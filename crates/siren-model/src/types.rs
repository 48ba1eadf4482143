//! Alert and alert-group value types.
//!
//! The wire format is the Alertmanager webhook payload (version 4). Fields
//! that a sender may omit deserialize to their empty values; no semantic
//! validation happens here.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::Result;

/// The status of an alert or an alert group.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AlertStatus {
    /// The alert condition is currently active.
    #[default]
    Firing,
    /// The alert condition has cleared.
    Resolved,
}

impl AlertStatus {
    /// Returns the status as a string.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Firing => "firing",
            Self::Resolved => "resolved",
        }
    }
}

impl std::fmt::Display for AlertStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One alert instance as delivered by an Alertmanager webhook.
///
/// Alerts are immutable value types: once constructed they are never
/// mutated, only serialized into the store. Being plain serde structs they
/// are serializable by construction, so storage layers can rely on
/// serialization never failing for a well-formed `Alert`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Alert {
    /// Whether the alert is firing or resolved.
    #[serde(default)]
    pub status: AlertStatus,
    /// Identifying labels.
    #[serde(default)]
    pub labels: HashMap<String, String>,
    /// Free-form annotations.
    #[serde(default)]
    pub annotations: HashMap<String, String>,
    /// When the alert started firing.
    #[serde(default = "zero_time")]
    pub starts_at: DateTime<Utc>,
    /// When the alert ended. The zero value means the alert is still open.
    #[serde(default = "zero_time")]
    pub ends_at: DateTime<Utc>,
    /// URL of the entity that generated this alert.
    #[serde(default, rename = "generatorURL")]
    pub generator_url: String,
    /// Stable identity hash assigned by the sender.
    #[serde(default)]
    pub fingerprint: String,
}

impl Alert {
    /// The ordering score for this alert: its start time as Unix seconds.
    ///
    /// History collections are ordered by this score, so out-of-order
    /// delivery re-sorts transparently.
    #[must_use]
    pub fn score(&self) -> f64 {
        self.starts_at.timestamp() as f64
    }

    /// Whether the alert has not yet ended (`ends_at` is the zero value).
    #[must_use]
    pub fn is_open(&self) -> bool {
        self.ends_at.timestamp() <= 0
    }
}

/// One webhook delivery: a snapshot of a notification batch.
///
/// This is a snapshot in time, not a log entry; storing a newer group for
/// the same tenant discards the older one.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AlertGroup {
    /// Webhook protocol version ("4" for Alertmanager).
    #[serde(default)]
    pub version: String,
    /// Opaque key identifying the alert grouping.
    #[serde(default)]
    pub group_key: String,
    /// The receiver this notification was addressed to.
    #[serde(default)]
    pub receiver: String,
    /// Aggregate status of the group.
    #[serde(default)]
    pub status: AlertStatus,
    /// The alerts in this delivery, in sender order.
    #[serde(default)]
    pub alerts: Vec<Alert>,
    /// Labels the group was keyed on.
    #[serde(default)]
    pub group_labels: HashMap<String, String>,
    /// Labels common to all alerts in the group.
    #[serde(default)]
    pub common_labels: HashMap<String, String>,
    /// Annotations common to all alerts in the group.
    #[serde(default)]
    pub common_annotations: HashMap<String, String>,
    /// Backlink to the sending Alertmanager.
    #[serde(default, rename = "externalURL")]
    pub external_url: String,
}

fn zero_time() -> DateTime<Utc> {
    DateTime::<Utc>::MIN_UTC
}

/// Decodes a raw webhook payload into an [`AlertGroup`].
///
/// Fails only on malformed bytes; missing fields are accepted as their
/// empty values.
///
/// # Errors
///
/// Returns [`ModelError::Decode`](crate::ModelError::Decode) if the bytes
/// are not valid JSON for the expected schema.
pub fn parse_payload(payload: &[u8]) -> Result<AlertGroup> {
    Ok(serde_json::from_slice(payload)?)
}

/// Decodes a batch of serialized history entries back into alerts.
///
/// The first malformed entry aborts the whole batch; no partial results
/// are returned. Input order is preserved.
///
/// # Errors
///
/// Returns [`ModelError::Decode`](crate::ModelError::Decode) on the first
/// entry that is not a valid serialized [`Alert`].
pub fn decode_alerts<I, B>(entries: I) -> Result<Vec<Alert>>
where
    I: IntoIterator<Item = B>,
    B: AsRef<[u8]>,
{
    entries
        .into_iter()
        .map(|entry| Ok(serde_json::from_slice(entry.as_ref())?))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn sample_payload() -> &'static str {
        r#"{
            "version": "4",
            "groupKey": "{}:{alertname=\"HighLatency\"}",
            "receiver": "siren",
            "status": "firing",
            "alerts": [
                {
                    "status": "firing",
                    "labels": {"alertname": "HighLatency", "tenantID": "t1"},
                    "annotations": {"summary": "p99 above threshold"},
                    "startsAt": "2024-05-01T10:00:00Z",
                    "endsAt": "0001-01-01T00:00:00Z",
                    "generatorURL": "http://prom/graph",
                    "fingerprint": "c4dd1b82d9f0"
                }
            ],
            "groupLabels": {"alertname": "HighLatency"},
            "commonLabels": {"tenantID": "t1"},
            "commonAnnotations": {},
            "externalURL": "http://alertmanager"
        }"#
    }

    #[test]
    fn parse_full_payload() {
        let group = parse_payload(sample_payload().as_bytes()).unwrap();

        assert_eq!(group.version, "4");
        assert_eq!(group.receiver, "siren");
        assert_eq!(group.status, AlertStatus::Firing);
        assert_eq!(group.alerts.len(), 1);
        assert_eq!(group.common_labels["tenantID"], "t1");
        assert_eq!(group.external_url, "http://alertmanager");

        let alert = &group.alerts[0];
        assert_eq!(alert.fingerprint, "c4dd1b82d9f0");
        assert_eq!(alert.labels["alertname"], "HighLatency");
        assert!(alert.is_open());
    }

    #[test]
    fn parse_accepts_missing_fields() {
        let group = parse_payload(br"{}").unwrap();

        assert!(group.version.is_empty());
        assert!(group.alerts.is_empty());
        assert!(group.common_labels.is_empty());
    }

    #[test]
    fn parse_rejects_malformed_payload() {
        let err = parse_payload(b"not json at all").unwrap_err();
        assert!(err.to_string().starts_with("failed to decode payload"));
    }

    #[test]
    fn alert_score_is_start_time_unix_seconds() {
        let alert = Alert {
            starts_at: Utc.with_ymd_and_hms(2024, 5, 1, 10, 0, 0).unwrap(),
            ..Alert::default()
        };
        assert_eq!(alert.score(), 1_714_557_600.0);
    }

    #[test]
    fn resolved_alert_is_not_open() {
        let alert = Alert {
            status: AlertStatus::Resolved,
            ends_at: Utc.with_ymd_and_hms(2024, 5, 1, 11, 0, 0).unwrap(),
            ..Alert::default()
        };
        assert!(!alert.is_open());
    }

    #[test]
    fn decode_alerts_preserves_order() {
        let first = serde_json::to_vec(&Alert {
            fingerprint: "aaa".to_string(),
            ..Alert::default()
        })
        .unwrap();
        let second = serde_json::to_vec(&Alert {
            fingerprint: "bbb".to_string(),
            ..Alert::default()
        })
        .unwrap();

        let alerts = decode_alerts([&first, &second]).unwrap();

        assert_eq!(alerts.len(), 2);
        assert_eq!(alerts[0].fingerprint, "aaa");
        assert_eq!(alerts[1].fingerprint, "bbb");
    }

    #[test]
    fn decode_alerts_aborts_on_first_malformed_entry() {
        let good = serde_json::to_vec(&Alert::default()).unwrap();
        let entries: Vec<&[u8]> = vec![&good, b"garbage", &good];

        assert!(decode_alerts(entries).is_err());
    }

    #[test]
    fn group_round_trips_through_serialization() {
        let group = parse_payload(sample_payload().as_bytes()).unwrap();
        let bytes = serde_json::to_vec(&group).unwrap();
        let reparsed = parse_payload(&bytes).unwrap();

        assert_eq!(group, reparsed);
    }

    #[test]
    fn status_as_str() {
        assert_eq!(AlertStatus::Firing.as_str(), "firing");
        assert_eq!(AlertStatus::Resolved.to_string(), "resolved");
    }
}
