//! Backend entry-point: loads settings, prepares the database and uploads
//! directory, and serves the REST API.

mod server;

use std::sync::Arc;

use actix_web::web;
use mockable::DefaultEnv;
use ortho_config::OrthoConfig;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, fmt};

use mercado::inbound::http::health::HealthState;
use mercado::outbound::persistence::{DbPool, PoolConfig, run_migrations};
use mercado::outbound::security::{BuildMode, token_secret_from_env};
use mercado::outbound::storage::LocalFileStorage;

#[cfg(feature = "metrics")]
use server::build_metrics;
use server::{DatabaseCheck, ServerConfig, ServerSettings, create_server};

fn startup_error(context: &str, err: impl std::fmt::Display) -> std::io::Error {
    std::io::Error::other(format!("{context}: {err}"))
}

/// Application bootstrap.
#[actix_web::main]
async fn main() -> std::io::Result<()> {
    if let Err(e) = fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .json()
        .try_init()
    {
        warn!(error = %e, "tracing init failed");
    }

    let settings = ServerSettings::load_from_iter(std::env::args_os())
        .map_err(|err| startup_error("failed to load settings", err))?;
    let bind_addr = settings
        .bind_addr()
        .map_err(|err| startup_error("invalid settings", err))?;
    let database_url = settings
        .database_url()
        .map_err(|err| startup_error("invalid settings", err))?;
    let token_ttl = settings
        .token_ttl()
        .map_err(|err| startup_error("invalid settings", err))?;

    let token_secret = token_secret_from_env(&DefaultEnv::new(), BuildMode::from_debug_assertions())
        .map_err(|err| startup_error("token secret unavailable", err))?;
    info!(fingerprint = %token_secret.fingerprint(), "token signing secret loaded");

    if settings.migrate_on_start {
        run_migrations(database_url)
            .await
            .map_err(|err| startup_error("migrations failed", err))?;
    }

    let pool = DbPool::new(PoolConfig::new(database_url).with_max_size(settings.pool_size()))
        .await
        .map_err(|err| startup_error("database pool unavailable", err))?;

    let uploads_dir = settings.uploads_dir();
    let storage = LocalFileStorage::open(&uploads_dir)
        .map_err(|err| startup_error("uploads directory unavailable", err))?;
    info!(path = %uploads_dir.display(), "uploads directory ready");

    let health_state = web::Data::new(HealthState::with_dependencies(vec![Arc::new(
        DatabaseCheck::new(pool.clone()),
    )]));

    let config = ServerConfig::new(bind_addr, pool, storage, token_secret)
        .with_token_ttl(token_ttl)
        .with_upload_limit(settings.max_upload_bytes())
        .with_smtp(settings.smtp());
    #[cfg(feature = "metrics")]
    let config = config.with_metrics(Some(build_metrics()?));

    info!(addr = %config.bind_addr(), "starting HTTP server");
    let server = create_server(health_state.clone(), config)?;
    let result = server.await;
    health_state.mark_unhealthy();
    result
}
