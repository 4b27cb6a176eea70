//! Cafe Catalog Client - session, navigation and product cache for the catalog API.
//!
//! # Architecture
//!
//! - [`api::CafeApi`] performs every HTTP call. A [`api::BearerAuth`]
//!   decorator attaches the persisted token to each request before dispatch.
//! - [`storage`] persists the session token under a single key.
//! - [`session::SessionStore`] owns the authentication state machine and
//!   publishes snapshots to observers.
//! - [`navigation::NavigationGate`] maps the session status to the mounted
//!   screen group.
//! - [`products::ProductCache`] keeps the in-memory product list in step
//!   with the server.
//!
//! There are no ambient singletons: callers build a [`CafeApi`] once and
//! hand clones of it to the stores that need it.
//!
//! # Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//!
//! use cafe_catalog_client::{
//!     CafeApi, ClientConfig, Credentials, FileStore, NavigationGate, ProductCache, SessionStore,
//! };
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let config = ClientConfig::from_env()?;
//! let api = CafeApi::new(&config, Arc::new(FileStore::new(&config.storage_dir)))?;
//!
//! let mut session = SessionStore::new(api.clone());
//! let mut gate = NavigationGate::new(session.on_start().await);
//!
//! if !session.status().is_authenticated() {
//!     session
//!         .sign_in(&Credentials::new("test1@test.com", "123456"))
//!         .await;
//!     gate.sync(session.status());
//! }
//!
//! let mut products = ProductCache::with_limit(api, config.product_limit);
//! products.refresh().await?;
//! # Ok(())
//! # }
//! ```

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod api;
pub mod config;
pub mod error;
pub mod navigation;
pub mod products;
pub mod session;
pub mod storage;

pub use api::{BearerAuth, CafeApi, Credentials, ImageAsset, Registration};
pub use config::{ClientConfig, ConfigError};
pub use error::{ApiError, ErrorBody, FieldError};
pub use navigation::{NavigationError, NavigationGate, Screen, ScreenGroup};
pub use products::ProductCache;
pub use session::{SessionAction, SessionState, SessionStore, SessionWatcher};
pub use storage::{FileStore, KeyValueStore, MemoryStore, StorageError, TOKEN_KEY};
