//! Command implementations and the shared client context.

pub mod auth;
pub mod products;

use std::sync::Arc;

use cafe_catalog_client::{
    ApiError, CafeApi, ClientConfig, ConfigError, FileStore, NavigationGate, ProductCache,
    ScreenGroup, SessionStore, StorageError,
};
use thiserror::Error;

/// Errors reported by CLI commands.
#[derive(Debug, Error)]
pub enum CliError {
    /// Configuration could not be loaded.
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Catalog API call failed.
    #[error("{0}")]
    Api(#[from] ApiError),

    /// Token storage failed.
    #[error("{0}")]
    Storage(#[from] StorageError),

    /// Sign-in or sign-up was rejected.
    #[error("authentication failed: {0}")]
    Authentication(String),

    /// The command needs a signed-in session.
    #[error("not signed in; run `cafe-cli login` first")]
    NotAuthenticated,

    /// Output could not be rendered.
    #[error("output error: {0}")]
    Output(#[from] serde_json::Error),
}

/// Client state shared by every command.
pub struct App {
    pub config: ClientConfig,
    pub api: CafeApi,
    pub session: SessionStore,
    pub gate: NavigationGate,
}

impl App {
    /// Build the client from the environment.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration is missing or the HTTP client
    /// cannot be built.
    pub fn connect() -> Result<Self, CliError> {
        let config = ClientConfig::from_env()?;
        let storage = Arc::new(FileStore::new(&config.storage_dir));
        let api = CafeApi::new(&config, storage)?;
        let session = SessionStore::new(api.clone());

        Ok(Self {
            config,
            api,
            session,
            gate: NavigationGate::default(),
        })
    }

    /// Restore the persisted session and remount the gate for it.
    pub async fn restore(&mut self) {
        let status = self.session.on_start().await;
        self.gate.sync(status);
    }

    /// Restore the session and fail unless product screens are reachable.
    ///
    /// # Errors
    ///
    /// Returns [`CliError::NotAuthenticated`] when no valid session exists.
    pub async fn require_authenticated(&mut self) -> Result<(), CliError> {
        self.restore().await;
        if self.gate.group() == ScreenGroup::Authenticated {
            Ok(())
        } else {
            Err(CliError::NotAuthenticated)
        }
    }

    /// Product cache bound to this client.
    #[must_use]
    pub fn products(&self) -> ProductCache {
        ProductCache::with_limit(self.api.clone(), self.config.product_limit)
    }
}
