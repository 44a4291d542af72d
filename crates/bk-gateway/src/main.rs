//! bk-gateway: Booking Gateway Main Binary
//!
//! HTTP backend for the studio website's booking flow.
//!
//! Usage:
//!   bk-gateway           - Start the HTTP API server
//!   bk-gateway --help    - Show help
//!   bk-gateway --version - Show version

use std::sync::Arc;

use tracing_subscriber::EnvFilter;

use bk_booking::{AvailabilityCalculator, BookingPolicy, BookingWriter};
use bk_calendar::{CalDavClient, CalendarProvider};
use bk_core::Config;
use bk_email::{EmailSender, Mailer};

/// Run mode
enum RunMode {
    /// HTTP API server
    Server,
    /// Show help
    Help,
    /// Show version
    Version,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    match parse_args() {
        RunMode::Help => {
            print_help();
            return Ok(());
        }
        RunMode::Version => {
            println!("bk-gateway {}", env!("CARGO_PKG_VERSION"));
            return Ok(());
        }
        RunMode::Server => {}
    }

    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("info".parse()?))
        .init();

    // Load .env file
    dotenvy::dotenv().ok();

    // Load configuration
    let config = Config::load().map_err(|e| anyhow::anyhow!("Config error: {}", e))?;

    tracing::info!("Starting bk-gateway...");

    run_server(config).await
}

/// Parse command line arguments
fn parse_args() -> RunMode {
    for arg in std::env::args().skip(1) {
        match arg.as_str() {
            "--help" | "-h" => return RunMode::Help,
            "--version" | "-v" => return RunMode::Version,
            _ => {}
        }
    }

    RunMode::Server
}

/// Print help message
fn print_help() {
    println!("bk-gateway - Booking Gateway");
    println!();
    println!("Usage:");
    println!("  bk-gateway           Start the HTTP API server");
    println!("  bk-gateway --help    Show this help message");
    println!("  bk-gateway --version Show version");
    println!();
    println!("Environment Variables:");
    println!("  CALDAV_URL               CalDAV server URL (required)");
    println!("  CALDAV_USER              CalDAV username");
    println!("  CALDAV_PASS              CalDAV password");
    println!("  CALDAV_CALENDAR_ID       Calendar collection (default: bookings)");
    println!("  SMTP_HOST                SMTP relay host");
    println!("  SMTP_FROM                From address for booking emails");
    println!("  BOOKING_NOTIFY_ADDRESS   Team inbox for new-booking notifications");
    println!("  BOOKING_TIMEZONE         Working-hours timezone (default: UTC)");
    println!("  API_PORT                 HTTP API port (default: 3000)");
}

/// Run the HTTP API server
async fn run_server(config: Config) -> anyhow::Result<()> {
    let policy = Arc::new(
        BookingPolicy::from_config(&config.booking)
            .map_err(|e| anyhow::anyhow!("Booking policy error: {}", e))?,
    );
    tracing::info!(
        "Booking policy: {}-minute slots, {}-month horizon, {}",
        policy.slot_minutes,
        policy.horizon_months,
        policy.timezone
    );

    let calendar: Arc<dyn CalendarProvider> = Arc::new(
        CalDavClient::new(config.calendar.clone())
            .map_err(|e| anyhow::anyhow!("Calendar client error: {}", e))?,
    );

    let sender = EmailSender::new(config.smtp.clone())
        .map_err(|e| anyhow::anyhow!("Email sender error: {}", e))?;
    let notify_address = sender.notify_address().to_string();
    let mailer: Arc<dyn Mailer> = Arc::new(sender);

    let calculator = AvailabilityCalculator::new(Arc::clone(&policy), Arc::clone(&calendar));
    let writer = Arc::new(BookingWriter::new(policy, calendar, mailer, notify_address));

    let api_config = config.api.clone();
    let handle = tokio::spawn(async move {
        if let Err(e) = bk_api::start_server(api_config, calculator, writer).await {
            tracing::error!("HTTP API error: {}", e);
        }
    });
    tracing::info!("HTTP API server started on port {}", config.api.port);
    tracing::info!("Press Ctrl+C to exit");

    // Wait for shutdown signal
    tokio::signal::ctrl_c().await?;
    tracing::info!("Shutting down...");

    handle.abort();

    tracing::info!("Shutdown complete");
    Ok(())
}
