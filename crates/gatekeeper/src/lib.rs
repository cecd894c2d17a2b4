//! Gatekeeper Server Library
//!
//! Access control for shared user data:
//! - Session token resolution (caller identity)
//! - Data broker over the managed SQLite permission store
//! - Authorization pipeline (guards, body normalization, outcomes)
//! - axum routes

pub mod auth;
pub mod broker;
pub mod error;
pub mod pipeline;
pub mod routes;
