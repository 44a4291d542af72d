//! Configuration management
//!
//! Settings are resolved with the following precedence:
//! 1. Environment variables
//! 2. bk-gateway.toml configuration file
//! 3. Default values
//!
//! Strings in the configuration file may reference environment variables
//! with the `${VAR_NAME}` syntax.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;

use crate::Error;

/// Main configuration for bk-gateway
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// HTTP API configuration
    #[serde(default)]
    pub api: ApiConfig,

    /// CalDAV calendar configuration
    #[serde(default)]
    pub calendar: CalendarConfig,

    /// SMTP configuration for booking emails
    #[serde(default)]
    pub smtp: SmtpConfig,

    /// Booking policy configuration
    #[serde(default)]
    pub booking: BookingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    /// Port for the HTTP API server
    #[serde(default = "default_api_port")]
    pub port: u16,

    /// Allowed CORS origins (e.g., ["https://studio.example"])
    /// If empty, all origins are allowed
    #[serde(default)]
    pub allowed_origins: Option<Vec<String>>,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            port: default_api_port(),
            allowed_origins: None,
        }
    }
}

/// CalDAV connection settings
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct CalendarConfig {
    /// CalDAV server URL
    pub server_url: String,
    /// Username for authentication
    pub username: String,
    /// Password for authentication
    pub password: String,
    /// Calendar collection ID (optional, defaults to "bookings")
    #[serde(default)]
    pub calendar_id: Option<String>,
}

/// SMTP settings for confirmation and notification emails
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SmtpConfig {
    #[serde(default = "default_smtp_host")]
    pub host: String,
    #[serde(default = "default_smtp_port")]
    pub port: u16,
    #[serde(default)]
    pub user: String,
    #[serde(default)]
    pub pass: String,
    /// From address on outgoing mail
    #[serde(default)]
    pub from_address: String,
    /// Internal address that receives new-booking notifications
    #[serde(default)]
    pub notify_address: String,
}

impl Default for SmtpConfig {
    fn default() -> Self {
        Self {
            host: default_smtp_host(),
            port: default_smtp_port(),
            user: String::new(),
            pass: String::new(),
            from_address: String::new(),
            notify_address: String::new(),
        }
    }
}

/// Booking policy settings
///
/// Working hours are kept as raw strings here ("09:00-17:00"); bk-booking
/// parses them into a typed policy at startup.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BookingConfig {
    /// Bookable slot length in minutes
    #[serde(default = "default_slot_minutes")]
    pub slot_minutes: u32,

    /// How many months ahead bookings are accepted
    #[serde(default = "default_horizon_months")]
    pub horizon_months: u32,

    /// Minimum lead time in hours before a slot can be booked
    #[serde(default = "default_min_lead_hours")]
    pub min_lead_hours: u32,

    /// IANA timezone the working hours are expressed in
    #[serde(default = "default_timezone")]
    pub timezone: String,

    /// Open intervals per weekday, keyed by "mon".."sun"
    #[serde(default = "default_hours")]
    pub hours: HashMap<String, Vec<String>>,
}

impl Default for BookingConfig {
    fn default() -> Self {
        Self {
            slot_minutes: default_slot_minutes(),
            horizon_months: default_horizon_months(),
            min_lead_hours: default_min_lead_hours(),
            timezone: default_timezone(),
            hours: default_hours(),
        }
    }
}

fn default_api_port() -> u16 {
    3000
}

fn default_smtp_host() -> String {
    "localhost".to_string()
}

fn default_smtp_port() -> u16 {
    587
}

fn default_slot_minutes() -> u32 {
    60
}

fn default_horizon_months() -> u32 {
    2
}

fn default_min_lead_hours() -> u32 {
    24
}

fn default_timezone() -> String {
    "UTC".to_string()
}

fn default_hours() -> HashMap<String, Vec<String>> {
    ["mon", "tue", "wed", "thu", "fri"]
        .iter()
        .map(|day| (day.to_string(), vec!["09:00-17:00".to_string()]))
        .collect()
}

impl Config {
    /// Expand `${VAR_NAME}` references to environment variable values.
    ///
    /// Unset variables expand to the empty string.
    fn expand_env_vars(value: &str) -> String {
        let mut result = String::new();
        let mut chars = value.chars().peekable();

        while let Some(c) = chars.next() {
            if c == '$' && chars.peek() == Some(&'{') {
                chars.next();

                let mut var_name = String::new();
                while let Some(&c) = chars.peek() {
                    if c == '}' {
                        chars.next();
                        break;
                    }
                    var_name.push(chars.next().unwrap());
                }

                if let Ok(env_value) = std::env::var(&var_name) {
                    result.push_str(&env_value);
                }
            } else {
                result.push(c);
            }
        }

        result
    }

    /// Load configuration from a TOML file, expanding `${VAR}` references
    /// and applying environment variable overrides afterwards.
    pub fn from_toml_file<P: AsRef<Path>>(path: P) -> crate::Result<Self> {
        let toml_content = std::fs::read_to_string(path.as_ref())
            .map_err(|e| Error::Config(format!("Failed to read config file: {}", e)))?;

        let expanded_content = Self::expand_env_vars(&toml_content);

        let mut config: Config = toml::from_str(&expanded_content)
            .map_err(|e| Error::Config(format!("Failed to parse TOML: {}", e)))?;

        config.apply_env_overrides();

        Ok(config)
    }

    /// Load configuration from the default location.
    ///
    /// Tries `./bk-gateway.toml` first and falls back to environment
    /// variables plus defaults.
    pub fn load() -> crate::Result<Self> {
        if Path::new("bk-gateway.toml").exists() {
            return Self::from_toml_file("bk-gateway.toml");
        }

        let mut config = Config {
            api: ApiConfig::default(),
            calendar: CalendarConfig::default(),
            smtp: SmtpConfig::default(),
            booking: BookingConfig::default(),
        };
        config.apply_env_overrides();
        Ok(config)
    }

    /// Override settings from environment variables where present.
    fn apply_env_overrides(&mut self) {
        if let Ok(port) = std::env::var("API_PORT") {
            if let Ok(p) = port.parse() {
                self.api.port = p;
            }
        }
        if let Ok(origins) = std::env::var("API_ALLOWED_ORIGINS") {
            self.api.allowed_origins =
                Some(origins.split(',').map(|s| s.trim().to_string()).collect());
        }

        if let Ok(url) = std::env::var("CALDAV_URL") {
            self.calendar.server_url = url;
        }
        if let Ok(user) = std::env::var("CALDAV_USER") {
            self.calendar.username = user;
        }
        if let Ok(pass) = std::env::var("CALDAV_PASS") {
            self.calendar.password = pass;
        }
        if let Ok(id) = std::env::var("CALDAV_CALENDAR_ID") {
            self.calendar.calendar_id = Some(id);
        }

        if let Ok(host) = std::env::var("SMTP_HOST") {
            self.smtp.host = host;
        }
        if let Ok(port) = std::env::var("SMTP_PORT") {
            if let Ok(p) = port.parse() {
                self.smtp.port = p;
            }
        }
        if let Ok(user) = std::env::var("SMTP_USER") {
            self.smtp.user = user;
        }
        if let Ok(pass) = std::env::var("SMTP_PASS") {
            self.smtp.pass = pass;
        }
        if let Ok(from) = std::env::var("SMTP_FROM") {
            self.smtp.from_address = from;
        }
        if let Ok(notify) = std::env::var("BOOKING_NOTIFY_ADDRESS") {
            self.smtp.notify_address = notify;
        }

        if let Ok(minutes) = std::env::var("BOOKING_SLOT_MINUTES") {
            if let Ok(m) = minutes.parse() {
                self.booking.slot_minutes = m;
            }
        }
        if let Ok(months) = std::env::var("BOOKING_HORIZON_MONTHS") {
            if let Ok(m) = months.parse() {
                self.booking.horizon_months = m;
            }
        }
        if let Ok(hours) = std::env::var("BOOKING_MIN_LEAD_HOURS") {
            if let Ok(h) = hours.parse() {
                self.booking.min_lead_hours = h;
            }
        }
        if let Ok(tz) = std::env::var("BOOKING_TIMEZONE") {
            self.booking.timezone = tz;
        }
    }
}
