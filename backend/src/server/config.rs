//! HTTP server configuration object and helpers.

use std::net::SocketAddr;

use mercado::inbound::http::state::DEFAULT_UPLOAD_LIMIT;
use mercado::outbound::mail::SmtpSettings;
use mercado::outbound::persistence::DbPool;
use mercado::outbound::security::TokenSecret;
use mercado::outbound::storage::LocalFileStorage;

#[cfg(feature = "metrics")]
use actix_web_prom::PrometheusMetrics;

const DEFAULT_TOKEN_TTL_HOURS: i64 = 24;

/// Builder-style configuration for creating the HTTP server.
pub struct ServerConfig {
    pub(crate) bind_addr: SocketAddr,
    pub(crate) db_pool: DbPool,
    pub(crate) storage: LocalFileStorage,
    pub(crate) token_secret: TokenSecret,
    pub(crate) token_ttl: chrono::Duration,
    pub(crate) upload_limit: usize,
    pub(crate) smtp: Option<SmtpSettings>,
    #[cfg(feature = "metrics")]
    pub(crate) prometheus: Option<PrometheusMetrics>,
}

impl ServerConfig {
    /// Construct a configuration with default token lifetime and upload cap,
    /// and with welcome mail disabled.
    #[must_use]
    pub fn new(
        bind_addr: SocketAddr,
        db_pool: DbPool,
        storage: LocalFileStorage,
        token_secret: TokenSecret,
    ) -> Self {
        Self {
            bind_addr,
            db_pool,
            storage,
            token_secret,
            token_ttl: chrono::Duration::hours(DEFAULT_TOKEN_TTL_HOURS),
            upload_limit: DEFAULT_UPLOAD_LIMIT,
            smtp: None,
            #[cfg(feature = "metrics")]
            prometheus: None,
        }
    }

    /// Override the bearer token lifetime.
    #[must_use]
    pub fn with_token_ttl(mut self, ttl: chrono::Duration) -> Self {
        self.token_ttl = ttl;
        self
    }

    /// Override the largest accepted upload, in bytes.
    #[must_use]
    pub fn with_upload_limit(mut self, bytes: usize) -> Self {
        self.upload_limit = bytes;
        self
    }

    /// Send welcome mail through an SMTP relay.
    #[must_use]
    pub fn with_smtp(mut self, smtp: Option<SmtpSettings>) -> Self {
        self.smtp = smtp;
        self
    }

    /// Return the socket address the server will bind to.
    #[must_use]
    pub fn bind_addr(&self) -> SocketAddr {
        self.bind_addr
    }

    #[cfg(feature = "metrics")]
    /// Attach Prometheus middleware to the configuration.
    #[must_use]
    pub fn with_metrics(mut self, prometheus: Option<PrometheusMetrics>) -> Self {
        self.prometheus = prometheus;
        self
    }
}
