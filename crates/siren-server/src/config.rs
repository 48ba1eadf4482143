//! Server configuration.

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use siren_model::Alert;
use siren_store::StoreConfig;

use crate::error::{Result, ServerError};

/// How tenant and alert identity are extracted from incoming data.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TenantConfig {
    /// Take the tenant ID from an alert label.
    pub in_label: bool,
    /// Take the tenant ID from an alert annotation instead.
    pub in_annotation: bool,
    /// The label carrying the tenant ID.
    pub label: String,
    /// The annotation carrying the tenant ID.
    pub annotation: String,
    /// The label carrying the unique alert identity.
    pub unique_label: String,
    /// The request header carrying the tenant ID on query calls.
    pub header: String,
}

impl Default for TenantConfig {
    fn default() -> Self {
        Self {
            in_label: true,
            in_annotation: false,
            label: "tenantID".to_string(),
            annotation: "tenantID".to_string(),
            unique_label: "fingerprint".to_string(),
            header: "X-Scope-OrgID".to_string(),
        }
    }
}

impl TenantConfig {
    /// Extracts the tenant ID from an alert according to the configured
    /// rule. Missing values are the empty string; nothing is rejected here.
    #[must_use]
    pub fn tenant_of(&self, alert: &Alert) -> String {
        if self.in_label {
            alert.labels.get(&self.label).cloned().unwrap_or_default()
        } else if self.in_annotation {
            alert
                .annotations
                .get(&self.annotation)
                .cloned()
                .unwrap_or_default()
        } else {
            String::new()
        }
    }

    /// Extracts the unique alert identity from the configured label,
    /// falling back to the sender-assigned fingerprint when the identity
    /// label is the default `fingerprint` and no such label is set.
    #[must_use]
    pub fn identity_of(&self, alert: &Alert) -> String {
        if let Some(value) = alert.labels.get(&self.unique_label) {
            return value.clone();
        }
        if self.unique_label == "fingerprint" {
            return alert.fingerprint.clone();
        }
        String::new()
    }
}

/// Backend connection settings, as they appear in the config file.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct VaultDbConfig {
    /// Backend server address.
    pub addr: String,
    /// Backend password.
    pub password: Option<String>,
    /// Logical database for alert history.
    pub alerts_db: u32,
    /// Logical database for group snapshots.
    pub groups_db: u32,
    /// Per-call timeout in seconds; zero means unbounded.
    pub timeout_secs: u64,
    /// Group snapshot expiry in seconds; zero keeps snapshots forever.
    pub snapshot_ttl_secs: u64,
}

impl Default for VaultDbConfig {
    fn default() -> Self {
        Self {
            addr: "127.0.0.1:6379".to_string(),
            password: None,
            alerts_db: 0,
            groups_db: 1,
            timeout_secs: 0,
            snapshot_ttl_secs: 0,
        }
    }
}

/// Top-level configuration for the sirenvault server.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Address the HTTP server listens on.
    pub http_listen_address: String,
    /// Log level used when `RUST_LOG` is not set.
    pub log_level: String,
    /// Backend name (`redis` or `memory`).
    pub backend: String,
    /// Tenant extraction rules.
    pub tenant: TenantConfig,
    /// Backend connection settings.
    pub vaultdb: VaultDbConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            http_listen_address: "0.0.0.0:8080".to_string(),
            log_level: "info".to_string(),
            backend: "redis".to_string(),
            tenant: TenantConfig::default(),
            vaultdb: VaultDbConfig::default(),
        }
    }
}

impl ServerConfig {
    /// Loads configuration from an optional YAML file. `None` yields the
    /// defaults.
    ///
    /// # Errors
    ///
    /// Returns [`ServerError::Config`] if the file cannot be read or is
    /// not valid YAML for this schema.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let Some(path) = path else {
            return Ok(Self::default());
        };
        let raw = std::fs::read_to_string(path).map_err(|err| {
            ServerError::Config(format!("failed to read {}: {err}", path.display()))
        })?;
        serde_yaml::from_str(&raw).map_err(|err| {
            ServerError::Config(format!("failed to parse {}: {err}", path.display()))
        })
    }

    /// Derives the store construction parameters from this configuration.
    #[must_use]
    pub fn store_config(&self) -> StoreConfig {
        let mut store = StoreConfig::new(self.backend.clone())
            .with_addr(self.vaultdb.addr.clone())
            .with_databases(self.vaultdb.alerts_db, self.vaultdb.groups_db);
        if let Some(password) = &self.vaultdb.password {
            store = store.with_password(password.clone());
        }
        if self.vaultdb.timeout_secs > 0 {
            store = store.with_timeout(Duration::from_secs(self.vaultdb.timeout_secs));
        }
        if self.vaultdb.snapshot_ttl_secs > 0 {
            store = store.with_snapshot_ttl(Duration::from_secs(self.vaultdb.snapshot_ttl_secs));
        }
        store
    }
}
