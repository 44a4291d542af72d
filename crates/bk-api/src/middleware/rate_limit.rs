//! Rate limiting middleware
//!
//! Keeps abusive clients away from the external calendar, which carries
//! its own upstream quota. Counters are fixed-window, per client and per
//! endpoint prefix, in process memory only.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::{
    extract::Request,
    http::StatusCode,
    middleware::Next,
    response::{IntoResponse, Response},
};
use tokio::sync::RwLock;
use tracing::warn;

/// Rate limiter configuration
#[derive(Clone)]
pub struct RateLimitConfig {
    /// Maximum requests per window
    pub max_requests: u32,
    /// Time window for rate limiting
    pub window: Duration,
    /// Endpoint prefix, part of the counter key
    pub prefix: String,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            max_requests: 60,                // 60 requests
            window: Duration::from_secs(60), // per minute
            prefix: "default".to_string(),
        }
    }
}

/// Outcome of a rate limit check
#[derive(Debug, Clone, Copy)]
pub struct RateLimitDecision {
    pub allowed: bool,
    /// Requests left in the current window
    pub remaining: u32,
    /// When the current window expires
    pub reset_at: Instant,
}

/// Per-key window state
#[derive(Clone)]
struct WindowState {
    request_count: u32,
    window_start: Instant,
}

/// In-memory fixed-window rate limiter
#[derive(Clone)]
pub struct RateLimiter {
    config: RateLimitConfig,
    windows: Arc<RwLock<HashMap<String, WindowState>>>,
}

impl RateLimiter {
    /// Create a rate limiter with default configuration
    pub fn new() -> Self {
        Self::with_config(RateLimitConfig::default())
    }

    /// Create a rate limiter with custom configuration
    pub fn with_config(config: RateLimitConfig) -> Self {
        Self {
            config,
            windows: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Check-and-increment for one client.
    ///
    /// The whole update happens under the write lock, so two concurrent
    /// requests for the same key cannot under-count.
    pub async fn check(&self, client_id: &str) -> RateLimitDecision {
        let key = format!("{}:{}", self.config.prefix, client_id);
        let mut windows = self.windows.write().await;
        let now = Instant::now();

        let state = windows.entry(key).or_insert(WindowState {
            request_count: 0,
            window_start: now,
        });

        // Reset window if expired
        if now.duration_since(state.window_start) > self.config.window {
            state.request_count = 0;
            state.window_start = now;
        }

        let reset_at = state.window_start + self.config.window;

        if state.request_count >= self.config.max_requests {
            warn!("Rate limit exceeded for {}:{}", self.config.prefix, client_id);
            return RateLimitDecision {
                allowed: false,
                remaining: 0,
                reset_at,
            };
        }

        state.request_count += 1;
        RateLimitDecision {
            allowed: true,
            remaining: self.config.max_requests - state.request_count,
            reset_at,
        }
    }

    /// Cleanup expired entries (should be called periodically)
    pub async fn cleanup(&self) {
        let mut windows = self.windows.write().await;
        let now = Instant::now();

        windows.retain(|_, state| now.duration_since(state.window_start) <= self.config.window);
    }
}

impl Default for RateLimiter {
    fn default() -> Self {
        Self::new()
    }
}

/// Rate limiting middleware
///
/// Denied requests never reach the calendar-backed handlers.
pub async fn rate_limit_middleware(
    limiter: Arc<RateLimiter>,
    request: Request,
    next: Next,
) -> Response {
    let client_id = request
        .headers()
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .unwrap_or("unknown")
        .to_string();

    let decision = limiter.check(&client_id).await;
    if !decision.allowed {
        let retry_after = decision
            .reset_at
            .saturating_duration_since(Instant::now())
            .as_secs()
            .max(1);
        return (
            StatusCode::TOO_MANY_REQUESTS,
            [("retry-after", retry_after.to_string())],
            "Rate limit exceeded",
        )
            .into_response();
    }

    next.run(request).await
}
