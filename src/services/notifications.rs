use reqwest::Client;
use serde_json::json;

use crate::error::{AppError, Result};

/// Pushes finished notifications to the configured webhook. The platform
/// delivering them to the user sits behind that URL.
pub struct NotificationService {
    client: Client,
    webhook_url: Option<String>,
}

impl NotificationService {
    pub fn new(webhook_url: Option<String>) -> Self {
        Self {
            client: Client::new(),
            webhook_url,
        }
    }

    pub fn is_configured(&self) -> bool {
        self.webhook_url.is_some()
    }

    pub async fn send(&self, title: &str, body: &str) -> Result<()> {
        let url = match &self.webhook_url {
            Some(u) => u,
            None => {
                tracing::debug!("Webhook non configuré, notification ignorée: {}", title);
                return Ok(());
            }
        };

        let payload = json!({
            "title": title,
            "body": body,
        });

        let response = self
            .client
            .post(url)
            .json(&payload)
            .send()
            .await
            .map_err(|e| AppError::Transport(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            tracing::warn!("Webhook de notification {}: {}", status, text);
        }

        Ok(())
    }
}
