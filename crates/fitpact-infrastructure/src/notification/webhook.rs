use async_trait::async_trait;

use fitpact_domain::notification::{NotificationMessage, NotificationSender};
use fitpact_domain::shared::DomainError;

/// Delivers notifications as JSON posts to the app's notification relay.
/// The relay owns channel selection (push, SMS, in-app); this sender only
/// hands the event over.
pub struct WebhookNotificationSender {
    client: reqwest::Client,
    webhook_url: String,
}

impl WebhookNotificationSender {
    pub fn new(webhook_url: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            webhook_url: webhook_url.into(),
        }
    }

    fn build_payload(&self, message: &NotificationMessage) -> serde_json::Value {
        serde_json::json!({
            "user_id": message.user_id.as_str(),
            "type": message.kind.as_str(),
            "title": message.title,
            "content": message.content,
        })
    }
}

#[async_trait]
impl NotificationSender for WebhookNotificationSender {
    async fn send(&self, message: &NotificationMessage) -> Result<(), DomainError> {
        let payload = self.build_payload(message);

        let response = self
            .client
            .post(&self.webhook_url)
            .header("Content-Type", "application/json")
            .json(&payload)
            .send()
            .await
            .map_err(|e| {
                DomainError::Infrastructure(format!("Failed to send notification: {}", e))
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(DomainError::Infrastructure(format!(
                "Notification relay failed with status {}: {}",
                status, body
            )));
        }

        Ok(())
    }
}
