//! Alert data model for sirenvault.
//!
//! This crate holds the value types shared across the service: a single
//! [`Alert`], the [`AlertGroup`] snapshot delivered by one webhook call,
//! and the [`HistoryQuery`]/[`HistoryPage`] pair used to page through a
//! tenant's alert history.
//!
//! # Example
//!
//! ```rust
//! use siren_model::{parse_payload, HistoryQuery};
//!
//! let payload = br#"{
//!     "version": "4",
//!     "receiver": "siren",
//!     "status": "firing",
//!     "alerts": [],
//!     "commonLabels": {"tenantID": "t1"}
//! }"#;
//!
//! let group = parse_payload(payload).unwrap();
//! assert_eq!(group.common_labels["tenantID"], "t1");
//!
//! let query = HistoryQuery::new("t1|fingerprint", f64::INFINITY, 0, 50);
//! assert_eq!(query.count, 50);
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

pub mod error;
pub mod history;
pub mod types;

// Re-export main types at crate root
pub use error::{ModelError, Result};
pub use history::{HistoryPage, HistoryQuery};
pub use types::{decode_alerts, parse_payload, Alert, AlertGroup, AlertStatus};
