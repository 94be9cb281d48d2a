// SMS notifications for scan banners and in-budget round trips

use async_trait::async_trait;
use thiserror::Error;
use tracing::info;

use crate::config::TwilioConfig;

#[derive(Error, Debug)]
pub enum DeliveryError {
    #[error("Network error: {0}")]
    NetworkError(String),

    #[error("Message rejected: {status_code} - {message}")]
    Rejected { status_code: u16, message: String },

    #[error("Client error: {0}")]
    ClientError(String),
}

#[async_trait]
pub trait Notifier: Send + Sync {
    async fn notify(&self, message: &str) -> Result<(), DeliveryError>;
}

#[async_trait]
impl<T: Notifier + ?Sized> Notifier for Box<T> {
    async fn notify(&self, message: &str) -> Result<(), DeliveryError> {
        (**self).notify(message).await
    }
}

pub const MESSAGE_PREFIX: &str = "New message:\n";

pub fn message_body(message: &str) -> String {
    format!("{}{}", MESSAGE_PREFIX, message)
}

// Sends texts through the Twilio REST API
pub struct TwilioNotifier {
    client: reqwest::Client,
    config: TwilioConfig,
}

impl TwilioNotifier {
    pub fn new(config: TwilioConfig) -> Result<Self, DeliveryError> {
        let client = reqwest::Client::builder()
            .build()
            .map_err(|e| DeliveryError::ClientError(e.to_string()))?;
        Ok(Self { client, config })
    }

    pub fn messages_url(&self) -> String {
        format!(
            "{}/2010-04-01/Accounts/{}/Messages.json",
            self.config.api_base_url.trim_end_matches('/'),
            self.config.account_sid
        )
    }
}

#[async_trait]
impl Notifier for TwilioNotifier {
    async fn notify(&self, message: &str) -> Result<(), DeliveryError> {
        let body = message_body(message);
        let response = self
            .client
            .post(self.messages_url())
            .basic_auth(&self.config.account_sid, Some(&self.config.auth_token))
            .form(&[
                ("To", self.config.to_number.as_str()),
                ("From", self.config.from_number.as_str()),
                ("Body", body.as_str()),
            ])
            .send()
            .await
            .map_err(|e| DeliveryError::NetworkError(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(DeliveryError::Rejected {
                status_code: status.as_u16(),
                message,
            });
        }

        info!("Text message sent to {}", self.config.to_number);
        Ok(())
    }
}

// Stand-in when no SMS account is configured
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn notify(&self, message: &str) -> Result<(), DeliveryError> {
        info!("{}", message_body(message));
        Ok(())
    }
}
