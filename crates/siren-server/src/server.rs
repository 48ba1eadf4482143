//! Server construction and lifecycle.

use std::sync::Arc;

use siren_store::AlertStore;
use tokio::net::TcpListener;
use tracing::info;

use crate::config::ServerConfig;
use crate::error::{Result, ServerError};
use crate::routes::create_router;
use crate::state::AppState;

/// The sirenvault HTTP server.
///
/// Construction connects the configured backend and fails fast if it is
/// unreachable or unknown; a process never starts serving against a store
/// it cannot reach.
#[derive(Clone)]
pub struct Server {
    state: Arc<AppState>,
    listen_address: String,
}

impl std::fmt::Debug for Server {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Server")
            .field("listen_address", &self.listen_address)
            .finish_non_exhaustive()
    }
}

impl Server {
    /// Connects the store and builds the server.
    ///
    /// # Errors
    ///
    /// Returns [`ServerError::Store`] if backend selection or the initial
    /// connection fails.
    pub async fn new(config: ServerConfig) -> Result<Self> {
        let store = AlertStore::connect(&config.store_config()).await?;
        let state = Arc::new(AppState::new(store, config.tenant.clone()));
        Ok(Self {
            state,
            listen_address: config.http_listen_address,
        })
    }

    /// Builds a server over an already-connected store. Used by tests and
    /// embedders.
    #[must_use]
    pub fn with_state(state: Arc<AppState>, listen_address: impl Into<String>) -> Self {
        Self {
            state,
            listen_address: listen_address.into(),
        }
    }

    /// The shared handler state.
    #[must_use]
    pub fn state(&self) -> Arc<AppState> {
        self.state.clone()
    }

    /// Create the router without starting the server.
    #[must_use]
    pub fn router(&self) -> axum::Router {
        create_router(self.state.clone())
    }

    /// Start serving and run until a fatal error.
    ///
    /// # Errors
    ///
    /// Returns [`ServerError::BindFailed`] if the listen address cannot be
    /// bound.
    pub async fn serve(&self) -> Result<()> {
        let listener = self.bind().await?;
        axum::serve(listener, self.router())
            .await
            .map_err(|err| ServerError::Internal(err.to_string()))
    }

    /// Start serving and shut down when `shutdown` completes.
    ///
    /// # Errors
    ///
    /// Returns [`ServerError::BindFailed`] if the listen address cannot be
    /// bound.
    pub async fn serve_with_shutdown<F>(&self, shutdown: F) -> Result<()>
    where
        F: std::future::Future<Output = ()> + Send + 'static,
    {
        let listener = self.bind().await?;
        axum::serve(listener, self.router())
            .with_graceful_shutdown(shutdown)
            .await
            .map_err(|err| ServerError::Internal(err.to_string()))?;
        info!("server shut down");
        Ok(())
    }

    async fn bind(&self) -> Result<TcpListener> {
        let listener = TcpListener::bind(&self.listen_address)
            .await
            .map_err(|err| ServerError::BindFailed(self.listen_address.clone(), err))?;
        info!(addr = %self.listen_address, "listening");
        Ok(listener)
    }
}
