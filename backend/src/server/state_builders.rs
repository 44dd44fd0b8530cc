//! Builders wiring Diesel repositories and outbound adapters into the
//! domain services behind [`HttpState`].

use std::sync::Arc;

use actix_web::web;
use async_trait::async_trait;
use mockable::DefaultClock;
use tracing::info;

use mercado::domain::ports::{Accounts, MailerError, NoOpWelcomeMailer, WelcomeMailer};
use mercado::domain::{
    AccountService, CatalogService, GalleryService, ProductService, PurchaseService,
    UserDirectoryService,
};
use mercado::inbound::http::health::DependencyCheck;
use mercado::inbound::http::state::{HttpState, HttpStatePorts};
use mercado::outbound::mail::SmtpWelcomeMailer;
use mercado::outbound::persistence::{
    DbPool, DieselCatalogRepository, DieselImageRepository, DieselProductRepository,
    DieselTransactionRepository, DieselUserRepository,
};
use mercado::outbound::security::{BcryptPasswordHasher, JwtTokenService};
use mercado::outbound::storage::LocalFileStorage;

use super::ServerConfig;

/// Readiness check that pings the connection pool.
pub(crate) struct DatabaseCheck {
    pool: DbPool,
}

impl DatabaseCheck {
    pub(crate) fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl DependencyCheck for DatabaseCheck {
    fn name(&self) -> &'static str {
        "database"
    }

    async fn check(&self) -> Result<(), String> {
        self.pool.ping().await.map_err(|err| err.to_string())
    }
}

/// Repositories sharing one pool.
struct Repositories {
    users: Arc<DieselUserRepository>,
    catalogs: Arc<DieselCatalogRepository>,
    products: Arc<DieselProductRepository>,
    images: Arc<DieselImageRepository>,
    transactions: Arc<DieselTransactionRepository>,
}

impl Repositories {
    fn new(pool: &DbPool) -> Self {
        Self {
            users: Arc::new(DieselUserRepository::new(pool.clone())),
            catalogs: Arc::new(DieselCatalogRepository::new(pool.clone())),
            products: Arc::new(DieselProductRepository::new(pool.clone())),
            images: Arc::new(DieselImageRepository::new(pool.clone())),
            transactions: Arc::new(DieselTransactionRepository::new(pool.clone())),
        }
    }
}

fn build_accounts<M>(
    config: &ServerConfig,
    repos: &Repositories,
    hasher: Arc<BcryptPasswordHasher>,
    mailer: Arc<M>,
) -> Arc<dyn Accounts>
where
    M: WelcomeMailer + 'static,
{
    let tokens = Arc::new(JwtTokenService::new(
        &config.token_secret,
        config.token_ttl,
        Arc::new(DefaultClock),
    ));
    Arc::new(AccountService::new(
        repos.users.clone(),
        repos.catalogs.clone(),
        hasher,
        tokens,
        mailer,
    ))
}

fn build_accounts_with_mailer(
    config: &ServerConfig,
    repos: &Repositories,
    hasher: Arc<BcryptPasswordHasher>,
) -> Result<Arc<dyn Accounts>, MailerError> {
    match &config.smtp {
        Some(smtp) => {
            let mailer = SmtpWelcomeMailer::new(smtp)?;
            info!(host = %smtp.host, port = smtp.port, "welcome mail enabled");
            Ok(build_accounts(config, repos, hasher, Arc::new(mailer)))
        }
        None => {
            info!("welcome mail disabled; no SMTP host configured");
            Ok(build_accounts(
                config,
                repos,
                hasher,
                Arc::new(NoOpWelcomeMailer),
            ))
        }
    }
}

/// Build the shared HTTP state from the configured pool and adapters.
///
/// # Errors
/// Returns [`MailerError`] when SMTP settings are present but malformed.
pub(crate) fn build_http_state(config: &ServerConfig) -> Result<web::Data<HttpState>, MailerError> {
    let repos = Repositories::new(&config.db_pool);
    let storage: Arc<LocalFileStorage> = Arc::new(config.storage.clone());
    let hasher = Arc::new(BcryptPasswordHasher::default());

    let accounts = build_accounts_with_mailer(config, &repos, hasher.clone())?;
    let ports = HttpStatePorts {
        accounts,
        users: Arc::new(UserDirectoryService::new(
            repos.users.clone(),
            repos.catalogs.clone(),
            hasher,
        )),
        catalogs: Arc::new(CatalogService::new(repos.catalogs.clone())),
        products: Arc::new(ProductService::new(
            repos.products.clone(),
            repos.images.clone(),
            repos.catalogs.clone(),
            repos.transactions.clone(),
            storage.clone(),
        )),
        gallery: Arc::new(GalleryService::new(
            repos.images.clone(),
            repos.products.clone(),
            storage,
        )),
        purchases: Arc::new(PurchaseService::new(
            repos.transactions.clone(),
            repos.products.clone(),
            repos.catalogs.clone(),
        )),
    };

    Ok(web::Data::new(HttpState::with_upload_limit(
        ports,
        config.upload_limit,
    )))
}
