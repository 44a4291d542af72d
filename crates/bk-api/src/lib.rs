//! bk-api: HTTP API for the booking gateway
//!
//! Provides the booking REST endpoints over the bk-booking core.
//! Built with axum for async HTTP handling.

pub mod error;
pub mod handlers;
pub mod middleware;
pub mod routes;
pub mod server;

pub use server::{AppState, start_server};
