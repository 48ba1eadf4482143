//! Backend clients for sirenvault.
//!
//! The [`Backend`] trait is a minimal contract over an external store:
//! ordered collections with scored inserts and range queries, plus plain
//! key/value storage. Two implementations exist:
//!
//! - [`RedisBackend`]: speaks RESP2 to a Redis-family server over TCP
//! - [`MemoryBackend`]: an in-process store with the same visible semantics
//!
//! Backend selection is a closed set ([`BackendKind`]); an unrecognized
//! name is a construction error, never a silent default.
//!
//! # Example
//!
//! ```rust
//! use siren_backend::{Backend, BackendKind, MemoryBackend};
//!
//! # tokio_test::block_on(async {
//! let backend = MemoryBackend::new();
//! backend.insert_scored("t1|abc", b"entry", 100.0).await.unwrap();
//! assert_eq!(backend.cardinality("t1|abc").await.unwrap(), 1);
//!
//! assert!(BackendKind::parse("carrier-pigeon").is_err());
//! # });
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

pub mod backend;
pub mod error;
pub mod memory;
pub mod redis;
mod resp;

// Re-export main types at crate root
pub use backend::{Backend, BackendKind};
pub use error::{BackendError, Result};
pub use memory::MemoryBackend;
pub use redis::{RedisBackend, RedisConfig};
