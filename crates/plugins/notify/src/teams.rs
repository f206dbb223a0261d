//! Microsoft Teams incoming webhook notifier.

use async_trait::async_trait;
use devops_hub_core::{Error, Notifier, Result, Secret};
use tracing::{debug, info, warn};

/// Posts messages to a single Teams webhook. The webhook fixes the channel.
pub struct TeamsNotifier {
    webhook: Secret,
    client: reqwest::Client,
}

impl TeamsNotifier {
    pub fn new(webhook: Secret) -> Result<Self> {
        Ok(Self {
            webhook,
            client: crate::http_client()?,
        })
    }
}

#[async_trait]
impl Notifier for TeamsNotifier {
    fn name(&self) -> &'static str {
        "teams"
    }

    async fn send(&self, target: Option<&str>, text: &str) -> Result<()> {
        if let Some(target) = target {
            debug!(recipient = target, "Teams webhook ignores the target");
        }

        let response = self
            .client
            .post(self.webhook.expose())
            .json(&serde_json::json!({ "text": text }))
            .send()
            .await
            .map_err(|e| Error::Http(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            warn!(
                status = status.as_u16(),
                message = message,
                "Teams webhook error response"
            );
            return Err(Error::from_status(status.as_u16(), message));
        }

        info!("Teams message sent");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::prelude::*;

    #[tokio::test]
    async fn test_send() {
        let server = MockServer::start();

        let mock = server.mock(|when, then| {
            when.method(POST)
                .path("/webhookb2/abc")
                .json_body(serde_json::json!({"text": "deploy finished"}));
            then.status(200).body("1");
        });

        let notifier = TeamsNotifier::new(Secret::new(server.url("/webhookb2/abc"))).unwrap();
        assert_eq!(notifier.name(), "teams");
        notifier
            .send(Some("ignored"), "deploy finished")
            .await
            .unwrap();

        mock.assert();
    }

    #[tokio::test]
    async fn test_send_failure() {
        let server = MockServer::start();

        server.mock(|when, then| {
            when.method(POST).path("/webhookb2/gone");
            then.status(404).body("Webhook not found");
        });

        let notifier = TeamsNotifier::new(Secret::new(server.url("/webhookb2/gone"))).unwrap();
        let result = notifier.send(None, "hello").await;
        assert!(matches!(result.unwrap_err(), Error::NotFound(_)));
    }
}
