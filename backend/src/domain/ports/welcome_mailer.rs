//! Port for the welcome email sent after registration.

use async_trait::async_trait;
use tracing::info;

use crate::domain::User;

use super::define_port_error;

define_port_error! {
    /// Errors raised by mailer adapters.
    pub enum MailerError {
        /// The message could not be built.
        Build { message: String } => "failed to build email: {message}",
        /// The SMTP relay refused or could not be reached.
        Delivery { message: String } => "failed to deliver email: {message}",
    }
}

/// Sends the registration welcome message.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait WelcomeMailer: Send + Sync {
    /// Greet a newly registered user.
    async fn send_welcome(&self, user: &User) -> Result<(), MailerError>;
}

/// Mailer used when no SMTP relay is configured; logs instead of sending.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoOpWelcomeMailer;

#[async_trait]
impl WelcomeMailer for NoOpWelcomeMailer {
    async fn send_welcome(&self, user: &User) -> Result<(), MailerError> {
        info!(user_id = %user.id, "smtp disabled; skipping welcome email");
        Ok(())
    }
}
