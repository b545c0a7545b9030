//! # Planora Shared Library
//!
//! Domain logic for the Planora booking portal, used by the API server.
//!
//! ## Module Organization
//!
//! - `models`: users, bookings, messages and their PostgreSQL queries
//! - `store`: storage traits with PostgreSQL and in-memory backends
//! - `db`: connection pool and migrations
//! - `auth`: hashing, session tokens, identity reconciliation, authorization
//! - `accounts`: password signup and login
//! - `oauth`: federated sign-in through an external identity provider
//! - `portal`: booking, message and admin operations behind the gate

pub mod accounts;
pub mod auth;
pub mod db;
pub mod models;
pub mod oauth;
pub mod portal;
pub mod store;

/// Current version of the Planora shared library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
