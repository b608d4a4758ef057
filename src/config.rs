//! Service configuration
//!
//! Everything is read from environment variables, with a `.env` file
//! loaded first when present.

use crate::error::{Error, Result};
use std::env;
use std::net::SocketAddr;

const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8000";
const DEFAULT_MAILGUN_API_URL: &str = "https://api.mailgun.net";
const DEFAULT_MAILGUN_EVENT: &str = "stored";

/// `cache-control` value applied to dynamic listing responses unless
/// `CACHE_CONTROL_DYNAMIC` overrides it.
pub const DEFAULT_DYNAMIC_CACHE_CONTROL: &str =
    "public, max-age=1, stale-while-revalidate=10, stale-if-error=86400";

/// Top-level configuration for the listing service.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Inbox domain, e.g. `example.com`. Usernames are joined to it.
    pub email_domain: String,
    pub bind_addr: SocketAddr,
    /// `cache-control` header for successful listings.
    pub cache_control: String,
    pub backend: BackendConfig,
}

/// Which upstream answers mail-listing calls.
#[derive(Debug, Clone)]
pub enum BackendConfig {
    Mailgun(MailgunConfig),
    Imap(ImapConfig),
}

/// Mailgun events API credentials.
#[derive(Debug, Clone)]
pub struct MailgunConfig {
    pub api_key: String,
    /// Mailgun sending domain whose events are queried.
    pub domain: String,
    /// API base URL without trailing slash (region specific).
    pub api_url: String,
    /// Event type filter sent as the `event` query parameter.
    pub event: String,
}

/// IMAP connection configuration for Proton Bridge or any STARTTLS
/// IMAP server.
#[derive(Debug, Clone)]
pub struct ImapConfig {
    pub host: String,
    pub port: u16,
    pub username: String,
    pub password: String,
    pub folder: String,
    /// Upper bound on messages returned per listing (newest kept).
    pub fetch_limit: usize,
}

impl AppConfig {
    /// Load configuration from environment variables.
    ///
    /// Reads from `.env` file if present. Required variables:
    /// - `EMAIL_DOMAIN`
    /// - `MAILGUN_API_KEY` (mailgun backend)
    /// - `IMAP_USERNAME`, `IMAP_PASSWORD` (imap backend)
    ///
    /// Optional (with defaults):
    /// - `BIND_ADDR` (default: `0.0.0.0:8000`)
    /// - `CACHE_CONTROL_DYNAMIC`
    /// - `MAIL_BACKEND` (default: `mailgun`)
    /// - `MAILGUN_DOMAIN` (default: `EMAIL_DOMAIN`)
    /// - `MAILGUN_API_URL` (default: `https://api.mailgun.net`)
    /// - `MAILGUN_EVENT` (default: `stored`)
    /// - `IMAP_HOST` (default: `127.0.0.1`)
    /// - `IMAP_PORT` (default: `1143`)
    /// - `IMAP_FOLDER` (default: `INBOX`)
    /// - `IMAP_FETCH_LIMIT` (default: `100`)
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build the configuration from an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let email_domain = required(&lookup, "EMAIL_DOMAIN")?;

        let bind_addr = lookup("BIND_ADDR")
            .unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string())
            .parse()
            .map_err(|e| Error::Config(format!("Invalid BIND_ADDR: {e}")))?;

        let cache_control = lookup("CACHE_CONTROL_DYNAMIC")
            .unwrap_or_else(|| DEFAULT_DYNAMIC_CACHE_CONTROL.to_string());

        let backend_name = lookup("MAIL_BACKEND").unwrap_or_else(|| "mailgun".to_string());
        let backend = BackendConfig::from_lookup(&backend_name, &email_domain, &lookup)?;

        Ok(Self {
            email_domain,
            bind_addr,
            cache_control,
            backend,
        })
    }
}

impl BackendConfig {
    /// Load the settings for the backend named `name`.
    pub fn from_lookup<F>(name: &str, email_domain: &str, lookup: &F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        match name.trim().to_ascii_lowercase().as_str() {
            "mailgun" => Ok(Self::Mailgun(MailgunConfig {
                api_key: required(lookup, "MAILGUN_API_KEY")?,
                domain: lookup("MAILGUN_DOMAIN").unwrap_or_else(|| email_domain.to_string()),
                api_url: lookup("MAILGUN_API_URL")
                    .unwrap_or_else(|| DEFAULT_MAILGUN_API_URL.to_string())
                    .trim_end_matches('/')
                    .to_string(),
                event: lookup("MAILGUN_EVENT").unwrap_or_else(|| DEFAULT_MAILGUN_EVENT.to_string()),
            })),
            "imap" => Ok(Self::Imap(ImapConfig {
                host: lookup("IMAP_HOST").unwrap_or_else(|| "127.0.0.1".to_string()),
                port: lookup("IMAP_PORT")
                    .unwrap_or_else(|| "1143".to_string())
                    .parse()
                    .map_err(|e| Error::Config(format!("Invalid IMAP_PORT: {e}")))?,
                username: required(lookup, "IMAP_USERNAME")?,
                password: required(lookup, "IMAP_PASSWORD")?,
                folder: lookup("IMAP_FOLDER").unwrap_or_else(|| "INBOX".to_string()),
                fetch_limit: lookup("IMAP_FETCH_LIMIT")
                    .unwrap_or_else(|| "100".to_string())
                    .parse()
                    .map_err(|e| Error::Config(format!("Invalid IMAP_FETCH_LIMIT: {e}")))?,
            })),
            other => Err(Error::Config(format!(
                "Unknown MAIL_BACKEND '{other}' (expected 'mailgun' or 'imap')"
            ))),
        }
    }
}

fn required<F>(lookup: &F, key: &str) -> Result<String>
where
    F: Fn(&str) -> Option<String>,
{
    lookup(key)
        .filter(|value| !value.trim().is_empty())
        .ok_or_else(|| Error::Config(format!("{key} not set")))
}
