//! Cafe Catalog Core - Shared domain types.
//!
//! This crate provides the types shared by every cafe catalog component:
//! - `client` - API client, session store, navigation gate and product cache
//! - `cli` - Command-line front end
//! - `integration-tests` - In-process fake catalog API and end-to-end tests
//!
//! # Architecture
//!
//! The core crate contains only types - no I/O, no HTTP clients, no storage.
//! Field names follow the Rust side; the catalog API's Spanish wire names are
//! mapped with serde renames.
//!
//! # Modules
//!
//! - [`types`] - String-backed ids, users, products, categories and statuses

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
