//! Tenant-scoped alert store for sirenvault.
//!
//! `siren-store` maps tenants and alert identities onto the backend's
//! primitives: each `(tenant, identity)` pair owns one ordered history
//! collection scored by alert start time, and each tenant owns one
//! overwritable group snapshot key.
//!
//! # Example
//!
//! ```rust
//! use siren_model::{Alert, HistoryQuery};
//! use siren_store::{history_key, AlertStore, StoreConfig};
//!
//! # tokio_test::block_on(async {
//! let store = AlertStore::connect(&StoreConfig::new("memory")).await.unwrap();
//!
//! let key = history_key("t1", "c4dd1b82d9f0");
//! store.set_tenant_alert(&key, &Alert::default()).await.unwrap();
//!
//! let query = HistoryQuery::new(key, f64::INFINITY, 0, HistoryQuery::UNBOUNDED);
//! let page = store.get_tenant_alerts(&query).await.unwrap();
//! assert_eq!(page.total, 1);
//! # });
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

pub mod config;
pub mod error;
pub mod store;

// Re-export main types at crate root
pub use config::StoreConfig;
pub use error::{Result, StoreError};
pub use store::{history_key, AlertStore};
