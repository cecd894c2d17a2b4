//! Gatekeeper Core Library
//!
//! Shared functionality for Gatekeeper components:
//! - Permission record model (subject → grantee scopes)
//! - Connection lifecycle for the permission store
//! - SQLite connector and database helpers
//! - Configuration and common error types

pub mod config;
pub mod connection;
pub mod db;
pub mod error;
pub mod permissions;
pub mod sqlite;
pub mod tracing_init;

pub use config::StoreConfig;
pub use connection::{
    ConnectionManager, Connector, Done, Lease, LifecycleConfig, LifecycleError, Shutdown, State,
};
pub use error::{Error, Result};
pub use permissions::{GroupView, Permissions, Scope};
pub use sqlite::{Collection, SqliteConnector};
