//! SMTP delivery of the registration welcome message.

use async_trait::async_trait;
use lettre::message::header::ContentType;
use lettre::message::Mailbox;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use tracing::debug;

use crate::domain::User;
use crate::domain::ports::{MailerError, WelcomeMailer};

const WELCOME_SUBJECT: &str = "Bienvenido a Mercado";

/// Relay connection details.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SmtpSettings {
    /// Relay host name.
    pub host: String,
    /// Relay port.
    pub port: u16,
    /// Optional login; sent only together with `password`.
    pub username: Option<String>,
    /// Optional password.
    pub password: Option<String>,
    /// Sender, e.g. `Mercado <no-reply@mercado.test>`.
    pub from: String,
    /// Upgrade the connection with STARTTLS.
    pub starttls: bool,
}

/// [`WelcomeMailer`] sending through an SMTP relay.
pub struct SmtpWelcomeMailer {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
}

impl SmtpWelcomeMailer {
    /// Build the transport. No connection is opened until the first send.
    ///
    /// # Errors
    /// Returns [`MailerError::Build`] when the sender or relay is malformed.
    pub fn new(settings: &SmtpSettings) -> Result<Self, MailerError> {
        let from = settings
            .from
            .parse::<Mailbox>()
            .map_err(|err| MailerError::build(format!("sender: {err}")))?;

        let mut builder = if settings.starttls {
            AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&settings.host)
                .map_err(|err| MailerError::build(format!("relay: {err}")))?
        } else {
            AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(&settings.host)
        };
        builder = builder.port(settings.port);
        if let (Some(user), Some(password)) = (&settings.username, &settings.password) {
            builder = builder.credentials(Credentials::new(user.clone(), password.clone()));
        }

        Ok(Self {
            transport: builder.build(),
            from,
        })
    }
}

fn welcome_message(from: &Mailbox, user: &User) -> Result<Message, MailerError> {
    let to = Mailbox::new(
        Some(user.name.clone()),
        user.email
            .parse()
            .map_err(|err| MailerError::build(format!("recipient: {err}")))?,
    );
    let body = format!(
        "Hola {name},\n\nTu cuenta de {role} en Mercado está lista. \
         Ya puedes iniciar sesión con {email}.\n",
        name = user.name,
        role = user.role.name(),
        email = user.email,
    );
    Message::builder()
        .from(from.clone())
        .to(to)
        .subject(WELCOME_SUBJECT)
        .header(ContentType::TEXT_PLAIN)
        .body(body)
        .map_err(|err| MailerError::build(err.to_string()))
}

#[async_trait]
impl WelcomeMailer for SmtpWelcomeMailer {
    async fn send_welcome(&self, user: &User) -> Result<(), MailerError> {
        let message = welcome_message(&self.from, user)?;
        let response = self
            .transport
            .send(message)
            .await
            .map_err(|err| MailerError::delivery(err.to_string()))?;
        debug!(user_id = %user.id, code = %response.code(), "welcome email accepted");
        Ok(())
    }
}
