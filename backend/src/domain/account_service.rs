//! Registration, login, and bearer-token resolution.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{info, warn};

use crate::domain::port_errors::{map_catalog_error, map_hash_error, map_user_error};
use crate::domain::ports::{
    Accounts, AuthSession, CatalogRepository, PasswordHasher, TokenError, TokenService,
    UserRepository, WelcomeMailer,
};
use crate::domain::{
    CatalogKind, Error, LoginCredentials, NewUser, PlainPassword, Registration, User,
};

const INVALID_CREDENTIALS: &str = "invalid email or password";

fn map_token_error(error: TokenError) -> Error {
    match error {
        TokenError::Invalid { .. } => Error::unauthorized("invalid token"),
        TokenError::Expired => Error::unauthorized("token expired"),
        TokenError::Issue { message } => Error::internal(format!("token signing failed: {message}")),
    }
}

/// Account service implementing the [`Accounts`] driving port.
pub struct AccountService<U, C, H, T, M> {
    users: Arc<U>,
    catalogs: Arc<C>,
    hasher: Arc<H>,
    tokens: Arc<T>,
    mailer: Arc<M>,
}

impl<U, C, H, T, M> AccountService<U, C, H, T, M> {
    /// Create a service from its collaborators.
    pub fn new(
        users: Arc<U>,
        catalogs: Arc<C>,
        hasher: Arc<H>,
        tokens: Arc<T>,
        mailer: Arc<M>,
    ) -> Self {
        Self {
            users,
            catalogs,
            hasher,
            tokens,
            mailer,
        }
    }
}

impl<U, C, H, T, M> AccountService<U, C, H, T, M>
where
    U: UserRepository,
    C: CatalogRepository,
    H: PasswordHasher,
    T: TokenService,
    M: WelcomeMailer,
{
    fn session_for(&self, user: User) -> Result<AuthSession, Error> {
        let issued = self.tokens.issue(&user).map_err(map_token_error)?;
        Ok(AuthSession {
            token: issued.token,
            expires_at: issued.expires_at,
            user,
        })
    }

    async fn ensure_gender_exists(&self, registration: &Registration) -> Result<(), Error> {
        let Some(gender_id) = registration.gender_id else {
            return Ok(());
        };
        self.catalogs
            .find(CatalogKind::Gender, gender_id)
            .await
            .map_err(map_catalog_error)?
            .map(|_| ())
            .ok_or_else(|| Error::invalid_request(format!("unknown gender: {gender_id}")))
    }

    async fn verify(&self, password: &PlainPassword, hash: &str) -> Result<bool, Error> {
        self.hasher
            .verify(password, hash)
            .await
            .map_err(map_hash_error)
    }
}

#[async_trait]
impl<U, C, H, T, M> Accounts for AccountService<U, C, H, T, M>
where
    U: UserRepository,
    C: CatalogRepository,
    H: PasswordHasher,
    T: TokenService,
    M: WelcomeMailer,
{
    async fn register(&self, registration: Registration) -> Result<AuthSession, Error> {
        if !registration.role.is_self_assignable() {
            return Err(Error::invalid_request(format!(
                "id_tipo_usuario {} cannot be chosen at registration",
                registration.role.id()
            )));
        }
        self.ensure_gender_exists(&registration).await?;

        let password_hash = self
            .hasher
            .hash(&registration.password)
            .await
            .map_err(map_hash_error)?;
        let user = self
            .users
            .create(&NewUser {
                name: registration.name.as_str().to_owned(),
                email: registration.email.as_str().to_owned(),
                password_hash,
                birth_date: registration.birth_date,
                gender_id: registration.gender_id,
                role: registration.role,
            })
            .await
            .map_err(map_user_error)?;
        info!(user_id = %user.id, role = %user.role, "user registered");

        if let Err(error) = self.mailer.send_welcome(&user).await {
            warn!(user_id = %user.id, %error, "welcome email failed");
        }
        self.session_for(user)
    }

    async fn login(&self, credentials: LoginCredentials) -> Result<AuthSession, Error> {
        let email = credentials.email.trim().to_lowercase();
        let Some(stored) = self
            .users
            .find_credentials_by_email(&email)
            .await
            .map_err(map_user_error)?
        else {
            return Err(Error::unauthorized(INVALID_CREDENTIALS));
        };
        if !self
            .verify(&credentials.password, &stored.password_hash)
            .await?
        {
            info!(user_id = %stored.user.id, "login rejected");
            return Err(Error::unauthorized(INVALID_CREDENTIALS));
        }
        self.session_for(stored.user)
    }

    async fn resolve_token(&self, token: &str) -> Result<User, Error> {
        let user_id = self.tokens.verify(token).map_err(map_token_error)?;
        self.users
            .find_by_id(user_id)
            .await
            .map_err(map_user_error)?
            .ok_or_else(|| Error::unauthorized("user no longer exists"))
    }
}

#[cfg(test)]
#[path = "account_service_tests.rs"]
mod tests;
