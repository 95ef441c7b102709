//! # Stockbook Sync API
//!
//! HTTP server the offline clients sync against. Thin orchestration
//! over `stockbook-sync` and `stockbook-db`: routing, auth, and the
//! JSON envelope live here, semantics live below.

pub mod auth;
pub mod config;
pub mod error;
pub mod routes;
pub mod state;
