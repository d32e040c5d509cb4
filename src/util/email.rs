use lettre::{
    message::{header::ContentType, Mailbox, MultiPart, SinglePart},
    transport::smtp::{
        authentication::Credentials,
        client::{Tls, TlsParameters},
    },
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
};
use tracing::{error, info, instrument};

use crate::config::{ConfigError, EmailConfig};

/// Email service errors
#[derive(Debug, thiserror::Error)]
pub enum EmailError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("SMTP error: {0}")]
    SmtpError(String),

    #[error("Message building error: {0}")]
    MessageError(String),

    #[error("Address error: {0}")]
    AddressError(String),
}

impl From<ConfigError> for EmailError {
    fn from(err: ConfigError) -> Self {
        EmailError::ConfigError(err.to_string())
    }
}

#[derive(Debug, Clone)]
pub struct EmailMessage {
    pub to: String,
    pub subject: String,
    pub text_body: String,
    pub html_body: String,
}

impl EmailMessage {
    /// Plain announcement-style message with an escaped HTML alternative.
    pub fn notification(to: &str, subject: &str, body: &str, sender_name: &str) -> Self {
        EmailMessage {
            to: to.to_string(),
            subject: subject.to_string(),
            text_body: format!("{}\n\n--\n{}", body, sender_name),
            html_body: render_notification_html(subject, body, sender_name),
        }
    }
}

/// Wraps a free-text message in the notification template. Paragraphs are
/// separated by blank lines in the source text.
pub fn render_notification_html(subject: &str, body: &str, sender_name: &str) -> String {
    let paragraphs: String = body
        .split("\n\n")
        .filter(|p| !p.trim().is_empty())
        .map(|p| {
            format!(
                "<p>{}</p>",
                html_escape::encode_text(p.trim()).replace('\n', "<br>")
            )
        })
        .collect();

    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <title>{subject}</title>
</head>
<body style="font-family: Arial, sans-serif; line-height: 1.6; color: #333; max-width: 600px; margin: 0 auto; padding: 20px;">
    <div style="background-color: #f8f9fa; padding: 20px; text-align: center; border-radius: 8px 8px 0 0;">
        <h2>{subject}</h2>
    </div>
    <div style="background-color: #ffffff; padding: 30px; border: 1px solid #dee2e6;">
        {paragraphs}
    </div>
    <div style="background-color: #f8f9fa; padding: 15px; text-align: center; font-size: 12px; color: #6c757d;">
        <p>{sender}. You receive this because email notifications are enabled in your preferences.</p>
    </div>
</body>
</html>"#,
        subject = html_escape::encode_text(subject),
        paragraphs = paragraphs,
        sender = html_escape::encode_text(sender_name),
    )
}

/// SMTP email service implementation
pub struct SmtpEmailService {
    pub config: EmailConfig,
    transport: AsyncSmtpTransport<Tokio1Executor>,
}

impl SmtpEmailService {
    #[instrument(skip(config), fields(host = %config.smtp_host, port = config.smtp_port))]
    pub fn new(config: EmailConfig) -> Result<Self, EmailError> {
        info!("Initializing SMTP email service");

        config.validate()?;

        let mut transport_builder = AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(&config.smtp_host)
            .port(config.smtp_port)
            .timeout(Some(std::time::Duration::from_secs(config.connection_timeout_secs)));

        if config.use_tls {
            let tls_parameters = TlsParameters::new(config.smtp_host.clone())
                .map_err(|e| EmailError::ConfigError(format!("TLS configuration error: {}", e)))?;
            transport_builder = if config.use_starttls {
                transport_builder.tls(Tls::Required(tls_parameters))
            } else {
                transport_builder.tls(Tls::Wrapper(tls_parameters))
            };
        } else {
            transport_builder = transport_builder.tls(Tls::None);
        }

        let credentials = Credentials::new(config.smtp_username.clone(), config.smtp_password.clone());
        let transport = transport_builder.credentials(credentials).build();

        info!("SMTP email service initialized successfully");
        Ok(Self { config, transport })
    }

    #[instrument(skip(self, message), fields(to = %message.to, subject = %message.subject))]
    pub async fn send_email(&self, message: EmailMessage) -> Result<(), EmailError> {
        let email_message = self.build_message(message)?;

        self.transport.send(email_message).await.map_err(|e| {
            error!("Failed to send email: {}", e);
            EmailError::SmtpError(format!("Failed to send email: {}", e))
        })?;

        Ok(())
    }

    fn build_message(&self, email_message: EmailMessage) -> Result<Message, EmailError> {
        let from_mailbox: Mailbox = format!("{} <{}>", self.config.from_name, self.config.from_email)
            .parse()
            .map_err(|e| EmailError::AddressError(format!("Invalid from address: {}", e)))?;

        let to_mailbox: Mailbox = email_message
            .to
            .parse()
            .map_err(|e| EmailError::AddressError(format!("Invalid to address: {}", e)))?;

        Message::builder()
            .from(from_mailbox)
            .to(to_mailbox)
            .subject(&email_message.subject)
            .multipart(
                MultiPart::alternative()
                    .singlepart(
                        SinglePart::builder()
                            .header(ContentType::TEXT_PLAIN)
                            .body(email_message.text_body),
                    )
                    .singlepart(
                        SinglePart::builder()
                            .header(ContentType::TEXT_HTML)
                            .body(email_message.html_body),
                    ),
            )
            .map_err(|e| EmailError::MessageError(format!("Failed to build multipart message: {}", e)))
    }
}
