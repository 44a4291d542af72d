//! HTTP API Server
//!
//! Starts and manages the axum-based HTTP server.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::Router;
use axum::http::HeaderValue;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::info;

use bk_booking::{AvailabilityCalculator, BookingWriter};
use bk_core::ApiConfig;

use crate::routes::routes;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub calculator: AvailabilityCalculator,
    pub writer: Arc<BookingWriter>,
}

/// Start the HTTP API server
pub async fn start_server(
    config: ApiConfig,
    calculator: AvailabilityCalculator,
    writer: Arc<BookingWriter>,
) -> anyhow::Result<()> {
    let state = AppState { calculator, writer };

    let cors = match &config.allowed_origins {
        Some(origins) if !origins.is_empty() => {
            let origins: Vec<HeaderValue> = origins
                .iter()
                .filter_map(|o| o.parse().ok())
                .collect();
            CorsLayer::new().allow_origin(AllowOrigin::list(origins))
        }
        _ => CorsLayer::permissive(),
    };

    let app = Router::new()
        .merge(routes())
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    info!("HTTP API listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
