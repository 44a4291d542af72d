//! Middleware modules
//!
//! Contains the booking endpoint rate limiting middleware.

pub mod rate_limit;
