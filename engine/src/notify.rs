// Delivery of the run summary
use async_trait::async_trait;
use serde::Serialize;
use tracing::info;

use crate::error::{EngineError, Result};

pub const SUMMARY_SUBJECT: &str = "Stock indicator alerts";

#[async_trait]
pub trait Notifier: Send + Sync {
    async fn send(&self, summary: &str) -> Result<()>;
}

/// Writes the summary to stdout and the log. Used when no webhook is configured.
pub struct LogNotifier {
    recipient: String,
}

impl LogNotifier {
    pub fn new(recipient: impl Into<String>) -> Self {
        Self { recipient: recipient.into() }
    }
}

#[async_trait]
impl Notifier for LogNotifier {
    async fn send(&self, summary: &str) -> Result<()> {
        info!(recipient = %self.recipient, lines = summary.lines().count(), "alert summary");
        println!("To: {}\nSubject: {}\n\n{}", self.recipient, SUMMARY_SUBJECT, summary);
        Ok(())
    }
}

#[derive(Debug, Serialize)]
struct WebhookMessage<'a> {
    to: &'a str,
    subject: &'a str,
    text: &'a str,
}

/// Posts the summary as JSON to a mail relay or chat webhook.
pub struct WebhookNotifier {
    url: String,
    recipient: String,
    client: reqwest::Client,
}

impl WebhookNotifier {
    pub fn new(url: impl Into<String>, recipient: impl Into<String>) -> Self {
        Self::with_client(url, recipient, reqwest::Client::new())
    }

    pub fn with_client(url: impl Into<String>, recipient: impl Into<String>, client: reqwest::Client) -> Self {
        Self {
            url: url.into(),
            recipient: recipient.into(),
            client,
        }
    }
}

#[async_trait]
impl Notifier for WebhookNotifier {
    async fn send(&self, summary: &str) -> Result<()> {
        let message = WebhookMessage {
            to: &self.recipient,
            subject: SUMMARY_SUBJECT,
            text: summary,
        };
        let response = self
            .client
            .post(&self.url)
            .json(&message)
            .send()
            .await
            .map_err(|e| EngineError::NotificationError(e.to_string()))?;
        if !response.status().is_success() {
            return Err(EngineError::NotificationError(format!(
                "webhook {} returned {}",
                self.url,
                response.status()
            )));
        }
        info!(recipient = %self.recipient, url = %self.url, "alert summary delivered");
        Ok(())
    }
}
