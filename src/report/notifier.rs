use async_trait::async_trait;
use lettre::{
    message::{header::ContentType, Mailbox},
    transport::smtp::authentication::Credentials,
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
};
use tracing::{info, instrument};

use crate::{config::MailSettings, errors::DeliveryError};

/// Delivers a rendered notification to a single fixed recipient. No retries.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn deliver(&self, subject: &str, body: &str) -> Result<(), DeliveryError>;
}

pub struct SmtpNotifier {
    settings: MailSettings,
}

impl SmtpNotifier {
    pub fn new(settings: MailSettings) -> Self {
        Self { settings }
    }

    fn mailbox(address: &str) -> Result<Mailbox, DeliveryError> {
        address
            .parse()
            .map_err(|_| DeliveryError::Address(address.to_string()))
    }
}

#[async_trait]
impl Notifier for SmtpNotifier {
    #[instrument(skip(self, body))]
    async fn deliver(&self, subject: &str, body: &str) -> Result<(), DeliveryError> {
        let settings = &self.settings;
        let message = Message::builder()
            .from(Self::mailbox(&settings.sender)?)
            .to(Self::mailbox(&settings.recipient)?)
            .subject(subject)
            .header(ContentType::TEXT_HTML)
            .body(body.to_string())?;

        let transport = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&settings.smtp_host)?
            .port(settings.smtp_port)
            .credentials(Credentials::new(
                settings.sender.clone(),
                settings.password.clone(),
            ))
            .build();

        let response = transport.send(message).await?;
        info!("Mail accepted with code {}", response.code());
        Ok(())
    }
}

/// Prints the notification instead of sending it.
pub struct ConsoleNotifier;

#[async_trait]
impl Notifier for ConsoleNotifier {
    async fn deliver(&self, subject: &str, body: &str) -> Result<(), DeliveryError> {
        println!("Subject: {subject}");
        println!();
        println!("{body}");
        Ok(())
    }
}
