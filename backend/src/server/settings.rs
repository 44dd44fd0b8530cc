//! Runtime settings loaded via OrthoConfig.
//!
//! Values come from `MERCADO_*` environment variables, an optional config
//! file, and command-line flags. Unset values fall back to the defaults
//! exposed by the accessor methods.

use std::net::SocketAddr;
use std::path::PathBuf;

use mercado::inbound::http::state::DEFAULT_UPLOAD_LIMIT;
use mercado::outbound::mail::SmtpSettings;
use ortho_config::OrthoConfig;
use serde::Deserialize;

const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8080";
const DEFAULT_UPLOADS_DIR: &str = "uploads";
const DEFAULT_TOKEN_TTL_MINUTES: i64 = 24 * 60;
const DEFAULT_POOL_SIZE: u32 = 10;
const DEFAULT_SMTP_PORT: u16 = 587;
const DEFAULT_SMTP_FROM: &str = "Mercado <no-reply@mercado.local>";

/// Problems with loaded settings that only surface once a value is used.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SettingsError {
    /// A required value was not provided.
    #[error("missing required setting {name}")]
    Missing {
        /// Environment variable naming the setting.
        name: &'static str,
    },
    /// A value could not be parsed.
    #[error("invalid value for {name}: {message}")]
    Invalid {
        /// Environment variable naming the setting.
        name: &'static str,
        /// Parser message.
        message: String,
    },
}

/// Server settings.
#[derive(Debug, Clone, Deserialize, OrthoConfig)]
#[ortho_config(prefix = "MERCADO")]
pub struct ServerSettings {
    /// Listen address, e.g. `127.0.0.1:8080`.
    pub bind_addr: Option<String>,
    /// PostgreSQL connection URL.
    pub database_url: Option<String>,
    /// Root directory for uploaded files and gallery images.
    pub uploads_dir: Option<PathBuf>,
    /// Largest accepted multipart file part, in bytes.
    pub max_upload_bytes: Option<usize>,
    /// Bearer token lifetime in minutes.
    pub token_ttl_minutes: Option<i64>,
    /// Apply pending migrations before serving.
    #[ortho_config(default = false)]
    pub migrate_on_start: bool,
    /// Maximum pooled connections.
    pub pool_size: Option<u32>,
    /// SMTP relay host; welcome mail is disabled when unset.
    pub smtp_host: Option<String>,
    /// SMTP relay port.
    pub smtp_port: Option<u16>,
    /// SMTP login.
    pub smtp_username: Option<String>,
    /// SMTP password.
    pub smtp_password: Option<String>,
    /// Sender mailbox for welcome mail.
    pub smtp_from: Option<String>,
    /// Use STARTTLS with the relay; defaults to `true`.
    pub smtp_starttls: Option<bool>,
}

impl ServerSettings {
    /// Socket address to bind.
    ///
    /// # Errors
    /// Returns [`SettingsError::Invalid`] when the address does not parse.
    pub fn bind_addr(&self) -> Result<SocketAddr, SettingsError> {
        let raw = self.bind_addr.as_deref().unwrap_or(DEFAULT_BIND_ADDR);
        raw.parse().map_err(|err: std::net::AddrParseError| SettingsError::Invalid {
            name: "MERCADO_BIND_ADDR",
            message: err.to_string(),
        })
    }

    /// Database URL.
    ///
    /// # Errors
    /// Returns [`SettingsError::Missing`] when unset or blank.
    pub fn database_url(&self) -> Result<&str, SettingsError> {
        self.database_url
            .as_deref()
            .map(str::trim)
            .filter(|url| !url.is_empty())
            .ok_or(SettingsError::Missing {
                name: "MERCADO_DATABASE_URL",
            })
    }

    /// Uploads root.
    pub fn uploads_dir(&self) -> PathBuf {
        self.uploads_dir
            .clone()
            .unwrap_or_else(|| PathBuf::from(DEFAULT_UPLOADS_DIR))
    }

    /// Upload cap in bytes.
    pub fn max_upload_bytes(&self) -> usize {
        self.max_upload_bytes.unwrap_or(DEFAULT_UPLOAD_LIMIT)
    }

    /// Token lifetime.
    ///
    /// # Errors
    /// Returns [`SettingsError::Invalid`] for non-positive lifetimes.
    pub fn token_ttl(&self) -> Result<chrono::Duration, SettingsError> {
        let minutes = self.token_ttl_minutes.unwrap_or(DEFAULT_TOKEN_TTL_MINUTES);
        if minutes <= 0 {
            return Err(SettingsError::Invalid {
                name: "MERCADO_TOKEN_TTL_MINUTES",
                message: format!("must be positive, got {minutes}"),
            });
        }
        chrono::Duration::try_minutes(minutes).ok_or_else(|| SettingsError::Invalid {
            name: "MERCADO_TOKEN_TTL_MINUTES",
            message: format!("{minutes} is out of range"),
        })
    }

    /// Pool size.
    pub fn pool_size(&self) -> u32 {
        self.pool_size.unwrap_or(DEFAULT_POOL_SIZE).max(1)
    }

    /// SMTP relay settings when a host is configured.
    pub fn smtp(&self) -> Option<SmtpSettings> {
        let host = self
            .smtp_host
            .as_deref()
            .map(str::trim)
            .filter(|host| !host.is_empty())?;
        Some(SmtpSettings {
            host: host.to_owned(),
            port: self.smtp_port.unwrap_or(DEFAULT_SMTP_PORT),
            username: self.smtp_username.clone(),
            password: self.smtp_password.clone(),
            from: self
                .smtp_from
                .clone()
                .unwrap_or_else(|| DEFAULT_SMTP_FROM.to_owned()),
            starttls: self.smtp_starttls.unwrap_or(true),
        })
    }
}
