//! HTTP layer for sirenvault.
//!
//! Exposes the webhook ingestion endpoint, the per-tenant history query
//! endpoint, and liveness/metrics endpoints over the alert store:
//!
//! - `POST /webhook` — parse an Alertmanager delivery and persist each
//!   alert into its `tenant|identity` history, then store the group as the
//!   tenant's latest snapshot
//! - `GET /alerts/{id}/history` — paginated history for one alert
//!   identity, tenant taken from a configurable header
//! - `GET /health` — backend liveness
//! - `GET /metrics` — JSON snapshot of the process counters

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

pub mod config;
pub mod error;
pub mod handlers;
pub mod metrics;
pub mod routes;
pub mod server;
pub mod state;

// Re-export main types at crate root
pub use config::{ServerConfig, TenantConfig, VaultDbConfig};
pub use error::{Result, ServerError};
pub use metrics::{Metrics, MetricsSnapshot};
pub use routes::create_router;
pub use server::Server;
pub use state::AppState;
