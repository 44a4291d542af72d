//! Route definitions
//!
//! Defines the booking API endpoints and their rate limits. Reads and the
//! booking write get separate counters so a burst of availability polling
//! cannot starve bookings, and vice versa.

use std::sync::Arc;
use std::time::Duration;

use axum::{
    Router, middleware,
    routing::{get, post},
};

use crate::handlers::{create_booking, day_slots, health, month_availability};
use crate::middleware::rate_limit::{RateLimitConfig, RateLimiter, rate_limit_middleware};
use crate::server::AppState;

/// Create the API router
pub fn routes() -> Router<AppState> {
    let read_limiter = Arc::new(RateLimiter::with_config(RateLimitConfig {
        max_requests: 30,
        window: Duration::from_secs(60),
        prefix: "availability".to_string(),
    }));
    let write_limiter = Arc::new(RateLimiter::with_config(RateLimitConfig {
        max_requests: 5,
        window: Duration::from_secs(60),
        prefix: "create".to_string(),
    }));

    let read_routes = Router::new()
        .route("/booking/availability", get(month_availability))
        .route("/booking/slots", get(day_slots))
        .route_layer(middleware::from_fn(move |request, next| {
            rate_limit_middleware(Arc::clone(&read_limiter), request, next)
        }));

    let write_routes = Router::new()
        .route("/booking/create", post(create_booking))
        .route_layer(middleware::from_fn(move |request, next| {
            rate_limit_middleware(Arc::clone(&write_limiter), request, next)
        }));

    Router::new()
        // Health check
        .route("/health", get(health))
        .merge(read_routes)
        .merge(write_routes)
}
