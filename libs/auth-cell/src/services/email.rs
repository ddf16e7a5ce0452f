use async_trait::async_trait;
use reqwest::Client;
use serde_json::json;
use thiserror::Error;
use tracing::{debug, info};

use shared_config::AppConfig;

#[derive(Debug, Clone, PartialEq)]
pub struct EmailMessage {
    pub to: String,
    pub subject: String,
    pub body: String,
}

impl EmailMessage {
    pub fn otp(to: &str, otp: &str) -> Self {
        Self {
            to: to.to_string(),
            subject: "Your OTP Code".to_string(),
            body: format!("Your OTP Code is {}", otp),
        }
    }
}

#[derive(Error, Debug)]
pub enum EmailError {
    #[error("Email transport failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Email API rejected message ({status}): {message}")]
    Rejected { status: u16, message: String },
}

#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, message: &EmailMessage) -> Result<(), EmailError>;
}

/// Delivers mail through an HTTP transactional email API.
pub struct HttpMailer {
    client: Client,
    api_url: String,
    api_key: String,
    from: String,
}

impl HttpMailer {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            client: Client::new(),
            api_url: config.email_api_url.clone(),
            api_key: config.email_api_key.clone(),
            from: config.email_from.clone(),
        }
    }
}

#[async_trait]
impl Mailer for HttpMailer {
    async fn send(&self, message: &EmailMessage) -> Result<(), EmailError> {
        debug!("Sending '{}' to {}", message.subject, message.to);

        let response = self
            .client
            .post(&self.api_url)
            .bearer_auth(&self.api_key)
            .json(&json!({
                "from": self.from,
                "to": message.to,
                "subject": message.subject,
                "text": message.body
            }))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(EmailError::Rejected {
                status: status.as_u16(),
                message,
            });
        }

        Ok(())
    }
}

/// Used when no transport is configured; only records that a message was due.
pub struct LogMailer;

#[async_trait]
impl Mailer for LogMailer {
    async fn send(&self, message: &EmailMessage) -> Result<(), EmailError> {
        info!("Email transport not configured, dropping '{}' for {}", message.subject, message.to);
        Ok(())
    }
}

pub fn mailer_for(config: &AppConfig) -> Box<dyn Mailer> {
    if config.is_email_configured() {
        Box::new(HttpMailer::new(config))
    } else {
        Box::new(LogMailer)
    }
}
