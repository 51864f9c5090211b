//! Email delivery of card notifications.
//!
//! Supports multiple email providers:
//! - `console`: Logs emails (development)
//! - `smtp`: Sends via an SMTP server
//! - `sendgrid`: Uses the SendGrid API

use std::sync::Arc;

use async_trait::async_trait;
use lettre::message::{header::ContentType, Mailbox, MultiPart};
use lettre::transport::smtp::authentication::Credentials;
use lettre::{Address, AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use thiserror::Error;
use tracing::{debug, error, info};
use validator::ValidateEmail;

use domain::models::{Card, Sender};
use domain::services::{notification_variables, DeliveryError, NotificationSender};

use super::email_template::EmailTemplates;
use crate::config::EmailConfig;

const SENDGRID_URL: &str = "https://api.sendgrid.com/v3/mail/send";

/// Errors that can occur during email operations.
#[derive(Debug, Error)]
pub enum EmailError {
    #[error("Email service not configured: {0}")]
    NotConfigured(String),

    #[error("Invalid email address: {0}")]
    InvalidAddress(String),

    #[error("Failed to send email: {0}")]
    SendFailed(String),

    #[error("Template rendering error: {0}")]
    TemplateError(String),

    #[error("Provider error: {0}")]
    ProviderError(String),
}

impl From<EmailError> for DeliveryError {
    fn from(err: EmailError) -> Self {
        match err {
            EmailError::NotConfigured(msg) => DeliveryError::NotConfigured(msg),
            EmailError::TemplateError(msg) => DeliveryError::Template(msg),
            other => DeliveryError::Transport(other.to_string()),
        }
    }
}

/// Email message to be sent.
#[derive(Debug, Clone)]
pub struct EmailMessage {
    pub to: String,
    pub to_name: Option<String>,
    pub subject: String,
    pub body_text: String,
    pub body_html: Option<String>,
}

/// Email service for sending transactional emails.
#[derive(Clone)]
pub struct EmailService {
    config: Arc<EmailConfig>,
    sender_name: String,
    client: reqwest::Client,
}

impl EmailService {
    /// `default_sender_name` is used when `email.sender_name` is empty.
    pub fn new(config: EmailConfig, default_sender_name: &str) -> Self {
        let sender_name = if config.sender_name.trim().is_empty() {
            default_sender_name.to_string()
        } else {
            config.sender_name.clone()
        };

        Self {
            config: Arc::new(config),
            sender_name,
            client: reqwest::Client::new(),
        }
    }

    pub fn provider(&self) -> &str {
        &self.config.provider
    }

    /// Sends a message through the configured provider.
    ///
    /// `Ok` means the provider accepted the message.
    pub async fn send(&self, message: EmailMessage) -> Result<(), EmailError> {
        if !message.to.validate_email() {
            return Err(EmailError::InvalidAddress(message.to));
        }

        match self.config.provider.as_str() {
            "console" => self.send_console(message).await,
            "smtp" => self.send_smtp(message).await,
            "sendgrid" => self.send_sendgrid(message).await,
            provider => {
                error!(provider = %provider, "Unknown email provider");
                Err(EmailError::NotConfigured(format!(
                    "Unknown email provider '{}'",
                    provider
                )))
            }
        }
    }

    /// Console provider - logs email (for development).
    async fn send_console(&self, message: EmailMessage) -> Result<(), EmailError> {
        info!(
            to = %message.to,
            to_name = ?message.to_name,
            subject = %message.subject,
            from = %self.config.sender_email,
            from_name = %self.sender_name,
            "Email (console provider)"
        );
        debug!(body_text = %message.body_text, "Email body (plain text)");

        if let Some(html) = &message.body_html {
            debug!(body_html_length = html.len(), "Email body (HTML)");
        }

        Ok(())
    }

    /// SMTP provider - sends via the configured relay.
    async fn send_smtp(&self, message: EmailMessage) -> Result<(), EmailError> {
        if self.config.smtp_host.is_empty() {
            return Err(EmailError::NotConfigured("smtp_host is empty".to_string()));
        }

        let email = self.smtp_message(&message)?;
        let transport = self.smtp_transport()?;

        transport.send(email).await.map_err(|e| {
            error!(
                host = %self.config.smtp_host,
                port = self.config.smtp_port,
                error = %e,
                "SMTP send failed"
            );
            EmailError::SendFailed(format!("SMTP send failed: {}", e))
        })?;

        info!(to = %message.to, subject = %message.subject, "Email sent via SMTP");
        Ok(())
    }

    fn smtp_message(&self, message: &EmailMessage) -> Result<Message, EmailError> {
        let from_address: Address = self
            .config
            .sender_email
            .parse()
            .map_err(|_| EmailError::InvalidAddress(self.config.sender_email.clone()))?;
        let to_address: Address = message
            .to
            .parse()
            .map_err(|_| EmailError::InvalidAddress(message.to.clone()))?;

        let builder = Message::builder()
            .from(Mailbox::new(Some(self.sender_name.clone()), from_address))
            .to(Mailbox::new(message.to_name.clone(), to_address))
            .subject(message.subject.clone());

        let built = match &message.body_html {
            Some(html) => builder.multipart(MultiPart::alternative_plain_html(
                message.body_text.clone(),
                html.clone(),
            )),
            None => builder
                .header(ContentType::TEXT_PLAIN)
                .body(message.body_text.clone()),
        };
        built.map_err(|e| EmailError::TemplateError(format!("Invalid email message: {}", e)))
    }

    /// Builds the transport: implicit TLS on port 465, STARTTLS otherwise
    /// when `smtp_use_tls` is set, plain SMTP when it is not.
    fn smtp_transport(&self) -> Result<AsyncSmtpTransport<Tokio1Executor>, EmailError> {
        let host = self.config.smtp_host.as_str();
        let builder = if !self.config.smtp_use_tls {
            AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(host)
        } else if self.config.smtp_port == 465 {
            AsyncSmtpTransport::<Tokio1Executor>::relay(host)
                .map_err(|e| EmailError::NotConfigured(format!("SMTP TLS setup failed: {}", e)))?
        } else {
            AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(host)
                .map_err(|e| EmailError::NotConfigured(format!("SMTP TLS setup failed: {}", e)))?
        };

        let mut builder = builder.port(self.config.smtp_port);
        if !self.config.smtp_username.is_empty() && !self.config.smtp_password.is_empty() {
            builder = builder.credentials(Credentials::new(
                self.config.smtp_username.clone(),
                self.config.smtp_password.clone(),
            ));
        }
        Ok(builder.build())
    }

    /// SendGrid provider - sends via SendGrid API.
    async fn send_sendgrid(&self, message: EmailMessage) -> Result<(), EmailError> {
        if self.config.sendgrid_api_key.is_empty() {
            return Err(EmailError::NotConfigured(
                "sendgrid_api_key is empty".to_string(),
            ));
        }

        let mut recipient = serde_json::json!({ "email": message.to });
        if let Some(name) = &message.to_name {
            recipient["name"] = serde_json::json!(name);
        }

        let mut content = vec![serde_json::json!({
            "type": "text/plain",
            "value": message.body_text
        })];
        if let Some(html) = &message.body_html {
            content.push(serde_json::json!({
                "type": "text/html",
                "value": html
            }));
        }

        let body = serde_json::json!({
            "personalizations": [{ "to": [recipient] }],
            "from": {
                "email": self.config.sender_email,
                "name": self.sender_name
            },
            "subject": message.subject,
            "content": content
        });

        let response = self
            .client
            .post(SENDGRID_URL)
            .bearer_auth(&self.config.sendgrid_api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| EmailError::SendFailed(format!("SendGrid request failed: {}", e)))?;

        if response.status().is_success() {
            info!(to = %message.to, subject = %message.subject, "Email sent via SendGrid");
            Ok(())
        } else {
            let status = response.status();
            let error_body = response.text().await.unwrap_or_default();
            error!(status = %status, error = %error_body, "SendGrid API error");
            Err(EmailError::ProviderError(format!(
                "SendGrid returned {}: {}",
                status, error_body
            )))
        }
    }
}

/// Sends card notifications by email.
#[derive(Clone)]
pub struct EmailNotificationSender {
    email: EmailService,
    templates: EmailTemplates,
    frontend_url: String,
    app_name: String,
}

impl EmailNotificationSender {
    pub fn new(
        email: EmailService,
        templates: EmailTemplates,
        frontend_url: impl Into<String>,
        app_name: impl Into<String>,
    ) -> Self {
        Self {
            email,
            templates,
            frontend_url: frontend_url.into(),
            app_name: app_name.into(),
        }
    }
}

#[async_trait]
impl NotificationSender for EmailNotificationSender {
    async fn send(&self, card: &Card, sender: &Sender) -> Result<(), DeliveryError> {
        if self.frontend_url.trim().is_empty() {
            return Err(DeliveryError::NotConfigured(
                "app.frontend_url is not set".to_string(),
            ));
        }

        let vars = notification_variables(card, sender, &self.frontend_url, &self.app_name);
        let rendered = self.templates.render(&vars)?;

        self.email
            .send(EmailMessage {
                to: card.recipient_email.clone(),
                to_name: Some(card.recipient_name.clone()),
                subject: rendered.subject,
                body_text: rendered.body_text,
                body_html: Some(rendered.body_html),
            })
            .await?;

        debug!(card_id = %card.id, provider = %self.email.provider(), "Card notification sent");
        Ok(())
    }
}
