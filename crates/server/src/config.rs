//! Server configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `TALLY_DATABASE_URL` - `PostgreSQL` connection string (falls back to `DATABASE_URL`)
//! - `TALLY_BASE_URL` - Public URL of the web app, used to build invitation links
//!
//! ## Optional
//! - `TALLY_HOST` - Bind address (default: 127.0.0.1)
//! - `TALLY_PORT` - Listen port (default: 3000)
//! - `TALLY_IDENTITY_HEADER` - Header carrying the authenticated subject id
//!   (default: x-authenticated-subject)
//! - `TALLY_INVITE_EXPIRY_DAYS` - Days an invitation stays valid (default: 7)
//! - `TALLY_UTC_OFFSET_MINUTES` - Offset of the company's local calendar
//!   from UTC, used for pay periods and "today" (default: 0)
//! - `TALLY_LOG_JSON` - Emit JSON logs when set
//! - `SENTRY_DSN`, `SENTRY_ENVIRONMENT`, `SENTRY_SAMPLE_RATE`,
//!   `SENTRY_TRACES_SAMPLE_RATE` - Error tracking
//!
//! ## Optional (SMTP - enables invitation emails, all or none)
//! - `SMTP_HOST`, `SMTP_USERNAME`, `SMTP_PASSWORD` - relay and login
//! - `SMTP_PORT` - defaults to 587
//! - `SMTP_FROM` - sender mailbox for invitations

use std::net::{IpAddr, SocketAddr};
use std::str::FromStr;

use axum::http::HeaderName;
use chrono::FixedOffset;
use secrecy::SecretString;
use thiserror::Error;
use url::Url;

/// Default header set by the identity-aware proxy in front of the API.
pub const DEFAULT_IDENTITY_HEADER: &str = "x-authenticated-subject";

/// Default invitation lifetime.
pub const DEFAULT_INVITE_EXPIRY_DAYS: u32 = 7;

/// Longest allowed invitation lifetime.
const MAX_INVITE_EXPIRY_DAYS: u32 = 90;

/// Why the environment could not be turned into a config.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// Full server configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Connection string for the timesheet database; holds credentials
    pub database_url: SecretString,
    /// Listen address
    pub host: IpAddr,
    pub port: u16,
    /// Settings handlers read at request time
    pub app: AppSettings,
    /// Outgoing mail for invitations; `None` means links are only logged
    pub email: Option<EmailConfig>,
    /// Emit JSON logs instead of text
    pub log_json: bool,
    /// Error reporting endpoint; reporting is off when unset
    pub sentry_dsn: Option<String>,
    /// Deployment label attached to reported events
    pub sentry_environment: Option<String>,
    /// Fraction of errors reported, clamped to `0.0..=1.0`
    pub sentry_sample_rate: f32,
    /// Fraction of request traces reported
    pub sentry_traces_sample_rate: f32,
}

/// Settings that request handlers depend on.
#[derive(Debug, Clone)]
pub struct AppSettings {
    /// Public base URL of the web app (invitation links point here)
    pub base_url: Url,
    /// Header the identity provider uses to pass the subject id
    pub identity_header: HeaderName,
    /// Days until a new invitation expires
    pub invite_expiry_days: u32,
    /// Offset of the local calendar used for pay periods
    pub utc_offset: FixedOffset,
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            base_url: Url::parse("http://localhost:3000/").unwrap_or_else(|_| unreachable!()),
            identity_header: HeaderName::from_static(DEFAULT_IDENTITY_HEADER),
            invite_expiry_days: DEFAULT_INVITE_EXPIRY_DAYS,
            utc_offset: FixedOffset::east_opt(0).unwrap_or_else(|| unreachable!()),
        }
    }
}

impl AppSettings {
    /// Link a recipient follows to accept an invitation.
    #[must_use]
    pub fn accept_url(&self, token: &str) -> String {
        let mut url = self.base_url.clone();
        url.set_path("/accept-invite");
        url.query_pairs_mut().clear().append_pair("token", token);
        url.into()
    }

    /// Load only the request-handling settings.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if `TALLY_BASE_URL` is missing or any value is invalid.
    pub fn from_env() -> Result<Self, ConfigError> {
        let raw = required("TALLY_BASE_URL")?;
        let base_url = Url::parse(&raw).map_err(|e| invalid("TALLY_BASE_URL", e))?;

        let header = optional("TALLY_IDENTITY_HEADER")
            .unwrap_or_else(|| DEFAULT_IDENTITY_HEADER.to_owned());
        let identity_header = HeaderName::try_from(header.to_ascii_lowercase())
            .map_err(|e| invalid("TALLY_IDENTITY_HEADER", e))?;

        let invite_expiry_days = match optional("TALLY_INVITE_EXPIRY_DAYS") {
            Some(raw) => parse_invite_expiry(&raw)?,
            None => DEFAULT_INVITE_EXPIRY_DAYS,
        };
        let utc_offset = match optional("TALLY_UTC_OFFSET_MINUTES") {
            Some(raw) => parse_utc_offset(&raw)?,
            None => FixedOffset::east_opt(0).unwrap_or_else(|| unreachable!()),
        };

        Ok(Self {
            base_url,
            identity_header,
            invite_expiry_days,
            utc_offset,
        })
    }
}

/// Mail relay used to deliver invitations. `Debug` never prints the password.
#[derive(Clone)]
pub struct EmailConfig {
    pub smtp_host: String,
    pub smtp_port: u16,
    pub smtp_username: String,
    pub smtp_password: SecretString,
    /// Mailbox invitations are sent from
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

impl EmailConfig {
    fn from_env() -> Result<Option<Self>, ConfigError> {
        match (
            optional("SMTP_HOST"),
            optional("SMTP_USERNAME"),
            optional("SMTP_PASSWORD"),
            optional("SMTP_FROM"),
        ) {
            (None, None, None, None) => Ok(None),
            (Some(smtp_host), Some(smtp_username), Some(password), Some(from_address)) => {
                let smtp_port = parse_env("SMTP_PORT", 587)?;
                Ok(Some(Self {
                    smtp_host,
                    smtp_port,
                    smtp_username,
                    smtp_password: SecretString::from(password),
                    from_address,
                }))
            }
            _ => Err(ConfigError::InvalidEnvVar(
                "SMTP_*".to_string(),
                "SMTP_HOST, SMTP_USERNAME, SMTP_PASSWORD and SMTP_FROM must be set together"
                    .to_string(),
            )),
        }
    }
}

impl ServerConfig {
    /// Read the whole server configuration, picking up a `.env` file first
    /// when one exists.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` naming the first variable that is missing or
    /// does not parse.
    pub fn from_env() -> Result<Self, ConfigError> {
        let _ = dotenvy::dotenv();

        Ok(Self {
            database_url: get_database_url("TALLY_DATABASE_URL")?,
            host: parse_env("TALLY_HOST", IpAddr::from([127, 0, 0, 1]))?,
            port: parse_env("TALLY_PORT", 3000)?,
            app: AppSettings::from_env()?,
            email: EmailConfig::from_env()?,
            log_json: optional("TALLY_LOG_JSON").is_some(),
            sentry_dsn: optional("SENTRY_DSN"),
            sentry_environment: optional("SENTRY_ENVIRONMENT"),
            sentry_sample_rate: sample_rate("SENTRY_SAMPLE_RATE"),
            sentry_traces_sample_rate: sample_rate("SENTRY_TRACES_SAMPLE_RATE"),
        })
    }

    /// Address the listener binds to.
    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}

/// Database URL from `primary_key`, or the conventional `DATABASE_URL`.
///
/// # Errors
///
/// Returns `ConfigError::MissingEnvVar` naming `primary_key` if neither is set.
pub fn get_database_url(primary_key: &str) -> Result<SecretString, ConfigError> {
    optional(primary_key)
        .or_else(|| optional("DATABASE_URL"))
        .map(SecretString::from)
        .ok_or_else(|| ConfigError::MissingEnvVar(primary_key.to_owned()))
}

// Empty values count as unset.
fn optional(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

fn required(key: &str) -> Result<String, ConfigError> {
    optional(key).ok_or_else(|| ConfigError::MissingEnvVar(key.to_owned()))
}

fn invalid(key: &str, err: impl std::fmt::Display) -> ConfigError {
    ConfigError::InvalidEnvVar(key.to_owned(), err.to_string())
}

fn parse_env<T>(key: &str, default: T) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    optional(key).map_or(Ok(default), |raw| {
        raw.trim().parse().map_err(|e| invalid(key, e))
    })
}

// Unparsable rates fall back to reporting everything rather than failing startup.
fn sample_rate(key: &str) -> f32 {
    optional(key)
        .and_then(|raw| raw.trim().parse::<f32>().ok())
        .map_or(1.0, |rate| rate.clamp(0.0, 1.0))
}

fn parse_invite_expiry(value: &str) -> Result<u32, ConfigError> {
    const KEY: &str = "TALLY_INVITE_EXPIRY_DAYS";
    let days = value.trim().parse::<u32>().map_err(|e| invalid(KEY, e))?;
    if !(1..=MAX_INVITE_EXPIRY_DAYS).contains(&days) {
        return Err(invalid(KEY, format!("must be between 1 and {MAX_INVITE_EXPIRY_DAYS}")));
    }
    Ok(days)
}

fn parse_utc_offset(value: &str) -> Result<FixedOffset, ConfigError> {
    const KEY: &str = "TALLY_UTC_OFFSET_MINUTES";
    let minutes = value.trim().parse::<i32>().map_err(|e| invalid(KEY, e))?;
    minutes
        .checked_mul(60)
        .and_then(FixedOffset::east_opt)
        .ok_or_else(|| invalid(KEY, "offset must be within +/- 24 hours"))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_invite_expiry() {
        assert_eq!(parse_invite_expiry("7").unwrap(), 7);
        assert!(parse_invite_expiry("0").is_err());
        assert!(parse_invite_expiry("91").is_err());
        assert!(parse_invite_expiry("seven").is_err());
    }

    #[test]
    fn test_parse_utc_offset() {
        assert_eq!(parse_utc_offset("0").unwrap().local_minus_utc(), 0);
        assert_eq!(parse_utc_offset("-300").unwrap().local_minus_utc(), -300 * 60);
        assert_eq!(parse_utc_offset("330").unwrap().local_minus_utc(), 330 * 60);
        assert!(parse_utc_offset("1440").is_err());
        assert!(parse_utc_offset("east").is_err());
    }

    #[test]
    fn test_accept_url() {
        let settings = AppSettings {
            base_url: Url::parse("https://time.example.com/app").unwrap(),
            ..AppSettings::default()
        };
        assert_eq!(
            settings.accept_url("abc-DEF_123"),
            "https://time.example.com/accept-invite?token=abc-DEF_123"
        );
    }

    #[test]
    fn test_default_settings() {
        let settings = AppSettings::default();
        assert_eq!(settings.identity_header.as_str(), DEFAULT_IDENTITY_HEADER);
        assert_eq!(settings.invite_expiry_days, 7);
    }

    #[test]
    fn test_socket_addr() {
        let config = ServerConfig {
            database_url: SecretString::from("postgres://localhost/tally"),
            host: "0.0.0.0".parse().unwrap(),
            port: 8080,
            app: AppSettings::default(),
            email: None,
            log_json: false,
            sentry_dsn: None,
            sentry_environment: None,
            sentry_sample_rate: 1.0,
            sentry_traces_sample_rate: 1.0,
        };

        assert_eq!(config.socket_addr().to_string(), "0.0.0.0:8080");
    }

    #[test]
    fn test_smtp_password_never_printed() {
        let relay = EmailConfig {
            smtp_host: "mail.tally.test".to_owned(),
            smtp_port: 2525,
            smtp_username: "invites".to_owned(),
            smtp_password: SecretString::from("hunter2-relay"),
            from_address: "Tally <invites@tally.test>".to_owned(),
        };

        let printed = format!("{relay:?}");
        assert!(printed.contains("mail.tally.test"));
        assert!(printed.contains("2525"));
        assert!(!printed.contains("hunter2-relay"));
    }
}
