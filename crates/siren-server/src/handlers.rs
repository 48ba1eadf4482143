//! HTTP request handlers.

use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};
use siren_model::{parse_payload, HistoryPage, HistoryQuery};
use siren_store::history_key;
use tracing::{debug, warn};

use crate::error::{Result, ServerError};
use crate::metrics::MetricsSnapshot;
use crate::state::AppState;

/// Query parameters for history lookups.
#[derive(Debug, Deserialize)]
pub struct HistoryParams {
    /// Entries to skip.
    pub offset: Option<i64>,
    /// Page size; absent means everything after the offset.
    pub limit: Option<i64>,
    /// Upper bound on the time score; absent means no bound.
    pub score: Option<f64>,
}

/// Health check response.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    /// Status message.
    pub status: String,
    /// Server uptime in seconds.
    pub uptime_secs: u64,
}

/// Handle POST /webhook - ingest one alert-group delivery.
///
/// A malformed payload is rejected before any storage attempt. Per-alert
/// storage failures are logged and counted but do not abort the rest of
/// the batch; the group snapshot write is the overall request outcome.
pub async fn ingest_webhook(
    State(state): State<Arc<AppState>>,
    body: Bytes,
) -> Result<StatusCode> {
    state.metrics().inc_webhooks_received();

    let group = parse_payload(&body).map_err(|err| {
        state.metrics().inc_webhooks_invalid();
        warn!(error = %err, "rejected webhook payload");
        ServerError::from(err)
    })?;
    state.metrics().add_alerts_received(group.alerts.len() as u64);
    debug!(
        receiver = %group.receiver,
        alerts = group.alerts.len(),
        "received webhook"
    );

    for alert in &group.alerts {
        let tenant = state.tenant().tenant_of(alert);
        let identity = state.tenant().identity_of(alert);
        let key = history_key(&tenant, &identity);
        match state.store().set_tenant_alert(&key, alert).await {
            Ok(()) => state.metrics().inc_alerts_saved(),
            Err(err) => {
                state.metrics().inc_alerts_save_failures();
                warn!(key = %key, error = %err, "failed to store alert");
            }
        }
    }

    let tenant = group
        .common_labels
        .get(&state.tenant().label)
        .cloned()
        .unwrap_or_default();
    state.store().set_alert_group(&tenant, &group).await?;

    Ok(StatusCode::OK)
}

/// Handle GET `/alerts/{id}/history` - paginated history for one alert
/// identity. The tenant comes from the configured request header.
pub async fn alert_history(
    State(state): State<Arc<AppState>>,
    Path(identity): Path<String>,
    Query(params): Query<HistoryParams>,
    headers: HeaderMap,
) -> Result<Json<HistoryPage>> {
    state.metrics().inc_history_requests();

    let tenant = headers
        .get(&state.tenant().header)
        .and_then(|value| value.to_str().ok())
        .unwrap_or_default();
    let query = HistoryQuery::new(
        history_key(tenant, &identity),
        params.score.unwrap_or(f64::INFINITY),
        params.offset.unwrap_or(0),
        params.limit.unwrap_or(HistoryQuery::UNBOUNDED),
    );

    let page = state
        .store()
        .get_tenant_alerts(&query)
        .await
        .inspect_err(|err| {
            state.metrics().inc_history_failures();
            warn!(key = %query.key, error = %err, "history query failed");
        })?;

    Ok(Json(page))
}

/// Handle GET /health - liveness of the server and its backend.
pub async fn health_check(State(state): State<Arc<AppState>>) -> Response {
    let body = HealthResponse {
        status: "ok".to_string(),
        uptime_secs: state.uptime_secs(),
    };
    match state.store().ping().await {
        Ok(()) => Json(body).into_response(),
        Err(err) => {
            warn!(error = %err, "backend ping failed");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(HealthResponse {
                    status: "backend unreachable".to_string(),
                    ..body
                }),
            )
                .into_response()
        }
    }
}

/// Handle GET /metrics - JSON snapshot of the process counters.
pub async fn metrics_snapshot(State(state): State<Arc<AppState>>) -> Json<MetricsSnapshot> {
    Json(state.metrics().snapshot())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::TenantConfig;
    use siren_store::{AlertStore, StoreConfig};

    async fn make_test_state() -> Arc<AppState> {
        let store = AlertStore::connect(&StoreConfig::new("memory"))
            .await
            .unwrap();
        Arc::new(AppState::new(store, TenantConfig::default()))
    }

    fn webhook_body() -> Bytes {
        Bytes::from_static(
            br#"{
                "version": "4",
                "groupKey": "{}:{alertname=\"HighLatency\"}",
                "receiver": "siren",
                "status": "firing",
                "alerts": [
                    {
                        "status": "firing",
                        "labels": {"alertname": "HighLatency", "tenantID": "t1"},
                        "startsAt": "2024-05-01T10:00:00Z",
                        "fingerprint": "c4dd1b82d9f0"
                    },
                    {
                        "status": "firing",
                        "labels": {"alertname": "HighLatency", "tenantID": "t1"},
                        "startsAt": "2024-05-01T09:00:00Z",
                        "fingerprint": "00aa11bb22cc"
                    }
                ],
                "commonLabels": {"tenantID": "t1"}
            }"#,
        )
    }

    #[tokio::test]
    async fn webhook_stores_alerts_and_snapshot() {
        let state = make_test_state().await;

        let status = ingest_webhook(State(state.clone()), webhook_body())
            .await
            .unwrap();
        assert_eq!(status, StatusCode::OK);

        assert_eq!(
            state.store().total_by_key("t1|c4dd1b82d9f0").await.unwrap(),
            1
        );
        assert_eq!(
            state.store().total_by_key("t1|00aa11bb22cc").await.unwrap(),
            1
        );
        let snapshot = state.store().get_alert_group("t1").await.unwrap().unwrap();
        assert_eq!(snapshot.alerts.len(), 2);

        let metrics = state.metrics().snapshot();
        assert_eq!(metrics.webhooks_received, 1);
        assert_eq!(metrics.alerts_received, 2);
        assert_eq!(metrics.alerts_saved, 2);
        assert_eq!(metrics.alerts_save_failures, 0);
    }

    #[tokio::test]
    async fn webhook_rejects_malformed_payload_before_storing() {
        let state = make_test_state().await;

        let result = ingest_webhook(State(state.clone()), Bytes::from_static(b"not json")).await;

        assert!(matches!(
            result.unwrap_err(),
            ServerError::InvalidPayload(_)
        ));
        let metrics = state.metrics().snapshot();
        assert_eq!(metrics.webhooks_invalid, 1);
        assert_eq!(metrics.alerts_received, 0);
    }

    #[tokio::test]
    async fn history_returns_page_for_tenant_header() {
        let state = make_test_state().await;
        ingest_webhook(State(state.clone()), webhook_body())
            .await
            .unwrap();

        let mut headers = HeaderMap::new();
        headers.insert("X-Scope-OrgID", "t1".parse().unwrap());
        let params = HistoryParams {
            offset: None,
            limit: None,
            score: None,
        };

        let page = alert_history(
            State(state.clone()),
            Path("c4dd1b82d9f0".to_string()),
            Query(params),
            headers,
        )
        .await
        .unwrap();

        assert_eq!(page.0.total, 1);
        assert_eq!(page.0.alerts[0].fingerprint, "c4dd1b82d9f0");
        assert_eq!(state.metrics().snapshot().history_requests, 1);
    }

    #[tokio::test]
    async fn history_without_tenant_header_queries_empty_tenant() {
        let state = make_test_state().await;

        let page = alert_history(
            State(state),
            Path("c4dd1b82d9f0".to_string()),
            Query(HistoryParams {
                offset: None,
                limit: None,
                score: None,
            }),
            HeaderMap::new(),
        )
        .await
        .unwrap();

        assert_eq!(page.0.total, 0);
        assert!(page.0.alerts.is_empty());
    }

    #[tokio::test]
    async fn health_reports_ok_on_reachable_backend() {
        let state = make_test_state().await;
        let response = health_check(State(state)).await;

        assert_eq!(response.status(), StatusCode::OK);
    }
}
