//! Ops configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `OPS_DATABASE_URL` - `PostgreSQL` connection string (falls back to `DATABASE_URL`)
//! - `OPS_BASE_URL` - Public storefront URL, used to build cart-recovery links
//! - `SMTP_HOST` - SMTP server hostname
//! - `SMTP_USERNAME` - SMTP authentication username
//! - `SMTP_PASSWORD` - SMTP authentication password
//! - `SMTP_FROM` - Email sender address
//! - `ADMIN_ALERT_RECIPIENTS` - Comma-separated admin addresses for alerts/reports
//!
//! ## Optional
//! - `OPS_HOST` - Bind address (default: 127.0.0.1)
//! - `OPS_PORT` - Listen port (default: 3002)
//! - `SMTP_PORT` - SMTP port (default: 587)
//! - `REPORT_UTC_OFFSET` - Offset used for "today"/"this week" windows (default: +00:00)
//! - `STORE_CURRENCY` - ISO 4217 code stamped on money snapshots (default: USD)
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `SENTRY_ENVIRONMENT` - Sentry environment name
//! - `SENTRY_SAMPLE_RATE` / `SENTRY_TRACES_SAMPLE_RATE` - Sampling (default: 1.0)

use std::net::{IpAddr, SocketAddr};

use chrono::FixedOffset;
use secrecy::SecretString;
use thiserror::Error;
use tidewater_core::Email;

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// Ops application configuration.
#[derive(Debug, Clone)]
pub struct OpsConfig {
    /// `PostgreSQL` database connection URL (contains password)
    pub database_url: SecretString,
    /// IP address to bind the server to
    pub host: IpAddr,
    /// Port to listen on
    pub port: u16,
    /// Public storefront base URL (cart-recovery links)
    pub base_url: String,
    /// Email (SMTP) configuration
    pub email: EmailConfig,
    /// Admin recipients for alerts and reports
    pub alert_recipients: Vec<Email>,
    /// UTC offset for reporting windows ("today", "this week")
    pub report_offset: FixedOffset,
    /// ISO 4217 currency code stamped on money snapshots
    pub currency: String,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
    /// Sentry environment (e.g., "development", "production")
    pub sentry_environment: Option<String>,
    /// Sentry error sample rate (0.0 to 1.0)
    pub sentry_sample_rate: f32,
    /// Sentry traces sample rate for performance monitoring (0.0 to 1.0)
    pub sentry_traces_sample_rate: f32,
}

/// Email (SMTP) configuration.
///
/// Implements `Debug` manually to redact the password.
#[derive(Clone)]
pub struct EmailConfig {
    /// SMTP server hostname
    pub smtp_host: String,
    /// SMTP server port
    pub smtp_port: u16,
    /// SMTP authentication username
    pub smtp_username: String,
    /// SMTP authentication password
    pub smtp_password: SecretString,
    /// Email sender address (From header)
    pub from_address: String,
}

impl std::fmt::Debug for EmailConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EmailConfig")
            .field("smtp_host", &self.smtp_host)
            .field("smtp_port", &self.smtp_port)
            .field("smtp_username", &self.smtp_username)
            .field("smtp_password", &"[REDACTED]")
            .field("from_address", &self.from_address)
            .finish()
    }
}

impl OpsConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing or invalid.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let database_url = get_database_url("OPS_DATABASE_URL")?;
        let host = get_env_or_default("OPS_HOST", "127.0.0.1")
            .parse::<IpAddr>()
            .map_err(|e| ConfigError::InvalidEnvVar("OPS_HOST".to_string(), e.to_string()))?;
        let port = get_env_or_default("OPS_PORT", "3002")
            .parse::<u16>()
            .map_err(|e| ConfigError::InvalidEnvVar("OPS_PORT".to_string(), e.to_string()))?;
        let base_url = get_required_env("OPS_BASE_URL")?;

        let email = EmailConfig::from_env()?;
        let alert_recipients = parse_recipients(&get_required_env("ADMIN_ALERT_RECIPIENTS")?)?;
        let report_offset = parse_offset(&get_env_or_default("REPORT_UTC_OFFSET", "+00:00"))?;
        let currency = get_env_or_default("STORE_CURRENCY", "USD");

        let sentry_dsn = get_optional_env("SENTRY_DSN");
        let sentry_environment = get_optional_env("SENTRY_ENVIRONMENT");
        let sentry_sample_rate = get_optional_env("SENTRY_SAMPLE_RATE")
            .and_then(|s| s.parse().ok())
            .unwrap_or(1.0);
        let sentry_traces_sample_rate = get_optional_env("SENTRY_TRACES_SAMPLE_RATE")
            .and_then(|s| s.parse().ok())
            .unwrap_or(1.0);

        Ok(Self {
            database_url,
            host,
            port,
            base_url,
            email,
            alert_recipients,
            report_offset,
            currency,
            sentry_dsn,
            sentry_environment,
            sentry_sample_rate,
            sentry_traces_sample_rate,
        })
    }

    /// Returns the socket address for binding the server.
    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}

impl EmailConfig {
    fn from_env() -> Result<Self, ConfigError> {
        let smtp_port = get_env_or_default("SMTP_PORT", "587")
            .parse::<u16>()
            .map_err(|e| ConfigError::InvalidEnvVar("SMTP_PORT".to_string(), e.to_string()))?;

        Ok(Self {
            smtp_host: get_required_env("SMTP_HOST")?,
            smtp_port,
            smtp_username: get_required_env("SMTP_USERNAME")?,
            smtp_password: get_required_secret("SMTP_PASSWORD")?,
            from_address: get_required_env("SMTP_FROM")?,
        })
    }
}

/// Parse a comma-separated recipient list, rejecting malformed addresses.
fn parse_recipients(raw: &str) -> Result<Vec<Email>, ConfigError> {
    let recipients: Vec<Email> = raw
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| {
            Email::parse(s).map_err(|e| {
                ConfigError::InvalidEnvVar("ADMIN_ALERT_RECIPIENTS".to_string(), e.to_string())
            })
        })
        .collect::<Result<_, _>>()?;

    if recipients.is_empty() {
        return Err(ConfigError::InvalidEnvVar(
            "ADMIN_ALERT_RECIPIENTS".to_string(),
            "at least one recipient is required".to_string(),
        ));
    }

    Ok(recipients)
}

/// Parse a `±HH:MM` UTC offset.
fn parse_offset(raw: &str) -> Result<FixedOffset, ConfigError> {
    let invalid = || {
        ConfigError::InvalidEnvVar(
            "REPORT_UTC_OFFSET".to_string(),
            format!("expected an offset like +02:00 or -05:30, got '{raw}'"),
        )
    };

    let (east, rest) = if let Some(rest) = raw.strip_prefix('+') {
        (true, rest)
    } else if let Some(rest) = raw.strip_prefix('-') {
        (false, rest)
    } else {
        return Err(invalid());
    };

    let (hours, minutes) = rest.split_once(':').ok_or_else(invalid)?;
    let hours: i32 = hours.parse().map_err(|_| invalid())?;
    let minutes: i32 = minutes.parse().map_err(|_| invalid())?;
    if hours > 23 || minutes > 59 {
        return Err(invalid());
    }

    let seconds = hours * 3600 + minutes * 60;
    let offset = if east {
        FixedOffset::east_opt(seconds)
    } else {
        FixedOffset::west_opt(seconds)
    };
    offset.ok_or_else(invalid)
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Get a required environment variable.
fn get_required_env(key: &str) -> Result<String, ConfigError> {
    std::env::var(key).map_err(|_| ConfigError::MissingEnvVar(key.to_string()))
}

/// Get a required environment variable as a secret.
fn get_required_secret(key: &str) -> Result<SecretString, ConfigError> {
    let value = get_required_env(key)?;
    Ok(SecretString::from(value))
}

/// Get database URL with fallback to generic `DATABASE_URL` (used by Fly.io postgres attach).
fn get_database_url(primary_key: &str) -> Result<SecretString, ConfigError> {
    if let Ok(value) = std::env::var(primary_key) {
        return Ok(SecretString::from(value));
    }
    if let Ok(value) = std::env::var("DATABASE_URL") {
        return Ok(SecretString::from(value));
    }
    Err(ConfigError::MissingEnvVar(primary_key.to_string()))
}

/// Get an optional environment variable.
fn get_optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok()
}

/// Get an environment variable with a default value.
fn get_env_or_default(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}
