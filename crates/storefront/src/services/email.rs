//! Email service for transactional mail.
//!
//! Uses SMTP via lettre for delivery with Askama HTML + plain-text
//! templates. The only message sent today is the password-reset link.

use askama::Template;
use chrono::{DateTime, Utc};
use lettre::{
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
    message::MultiPart,
    transport::smtp::{Error as SmtpError, authentication::Credentials},
};
use secrecy::ExposeSecret;
use thiserror::Error;

use crate::config::EmailConfig;

/// HTML template for the password-reset email.
#[derive(Template)]
#[template(path = "email/reset_password.html")]
struct ResetPasswordEmailHtml<'a> {
    first_name: &'a str,
    reset_url: &'a str,
    expires_at: String,
}

/// Plain text template for the password-reset email.
#[derive(Template)]
#[template(path = "email/reset_password.txt")]
struct ResetPasswordEmailText<'a> {
    first_name: &'a str,
    reset_url: &'a str,
    expires_at: String,
}

/// Errors that can occur when sending email.
#[derive(Debug, Error)]
pub enum EmailError {
    /// SMTP transport error.
    #[error("SMTP error: {0}")]
    Smtp(#[from] SmtpError),

    /// Failed to build email message.
    #[error("failed to build message: {0}")]
    MessageBuild(#[from] lettre::error::Error),

    /// Invalid email address.
    #[error("invalid email address: {0}")]
    InvalidAddress(String),

    /// Template rendering error.
    #[error("template error: {0}")]
    Template(#[from] askama::Error),
}

/// Email service for sending transactional emails.
#[derive(Clone)]
pub struct EmailService {
    mailer: AsyncSmtpTransport<Tokio1Executor>,
    from_address: String,
}

impl EmailService {
    /// Create a new email service from configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the SMTP relay parameters are invalid.
    pub fn new(config: &EmailConfig) -> Result<Self, SmtpError> {
        let credentials = Credentials::new(
            config.smtp_username.clone(),
            config.smtp_password.expose_secret().to_string(),
        );

        let mailer = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.smtp_host)?
            .port(config.smtp_port)
            .credentials(credentials)
            .build();

        Ok(Self {
            mailer,
            from_address: config.from_address.clone(),
        })
    }

    /// Send the password-reset email with the tokenized link.
    ///
    /// # Errors
    ///
    /// Returns an error if the message cannot be built or delivered. The
    /// caller (the reset flow) logs and swallows these so the endpoint
    /// cannot be used to probe for registered addresses.
    pub async fn send_password_reset(
        &self,
        to: &str,
        first_name: &str,
        reset_url: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<(), EmailError> {
        let expires = expires_at.format("%Y-%m-%d %H:%M UTC").to_string();
        let html = ResetPasswordEmailHtml {
            first_name,
            reset_url,
            expires_at: expires.clone(),
        }
        .render()?;
        let text = ResetPasswordEmailText {
            first_name,
            reset_url,
            expires_at: expires,
        }
        .render()?;

        self.send_multipart(to, "Reset your MyBookstore password", &text, &html)
            .await
    }

    /// Send a multipart email with both plain text and HTML versions.
    async fn send_multipart(
        &self,
        to: &str,
        subject: &str,
        text: &str,
        html: &str,
    ) -> Result<(), EmailError> {
        let message = Message::builder()
            .from(
                self.from_address
                    .parse()
                    .map_err(|_| EmailError::InvalidAddress(self.from_address.clone()))?,
            )
            .to(to
                .parse()
                .map_err(|_| EmailError::InvalidAddress(to.to_string()))?)
            .subject(subject)
            .multipart(MultiPart::alternative_plain_html(
                text.to_string(),
                html.to_string(),
            ))?;

        self.mailer.send(message).await?;
        Ok(())
    }
}
