use crate::config::{MailConfig, MailSecurity};
use crate::error::Result;
use crate::logging::get_logger;
use lettre::message::{Mailbox, header::ContentType};
use lettre::transport::smtp::authentication::Credentials;
use lettre::transport::smtp::client::{Tls, TlsParameters};
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use std::time::Duration;

/// Plain-text email over SMTP
pub struct SmtpMailer {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
    to: Mailbox,
    endpoint: String,
    logger: crate::logging::StructuredLogger,
}

impl SmtpMailer {
    /// Build the transport; no connection is opened until the first send
    pub fn new(config: &MailConfig, timeout: Duration) -> Result<Self> {
        let builder = match config.security {
            MailSecurity::Tls => AsyncSmtpTransport::<Tokio1Executor>::relay(&config.server)?,
            MailSecurity::Starttls => {
                AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.server)?
            }
            MailSecurity::Opportunistic => {
                AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(&config.server)
                    .tls(Tls::Opportunistic(TlsParameters::new(config.server.clone())?))
            }
            MailSecurity::None => {
                AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(&config.server)
            }
        };

        let mut builder = builder.port(config.port).timeout(Some(timeout));
        // Servers without authentication get no credentials at all
        if !config.login.is_empty() {
            builder = builder.credentials(Credentials::new(
                config.login.clone(),
                config.password.clone(),
            ));
        }

        Ok(Self {
            transport: builder.build(),
            from: config.from_address.parse()?,
            to: config.to_address.parse()?,
            endpoint: format!("{}:{}", config.server, config.port),
            logger: get_logger("mail"),
        })
    }

    pub fn build_message(&self, subject: &str, body: &str) -> Result<Message> {
        let message = Message::builder()
            .from(self.from.clone())
            .to(self.to.clone())
            .subject(subject)
            .header(ContentType::TEXT_PLAIN)
            .body(body.to_string())?;
        Ok(message)
    }

    pub async fn send(&self, subject: &str, body: &str) -> Result<()> {
        let message = self.build_message(subject, body)?;
        self.logger
            .info(&format!("Sending mail via server {}", self.endpoint));
        self.transport.send(message).await?;
        Ok(())
    }
}
