//! Slack Web API notifier.

use async_trait::async_trait;
use devops_hub_core::{Error, Notifier, Result, SlackSettings};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

/// Default Slack Web API URL.
pub const DEFAULT_SLACK_URL: &str = "https://slack.com/api";

#[derive(Debug, Serialize)]
struct PostMessage<'a> {
    channel: &'a str,
    text: &'a str,
}

/// Slack answers 200 for most failures and reports them in the body.
#[derive(Debug, Deserialize)]
struct SlackResponse {
    ok: bool,
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    ts: Option<String>,
}

/// Posts messages with a bot token.
pub struct SlackNotifier {
    base_url: String,
    bot_token: String,
    default_channel: Option<String>,
    client: reqwest::Client,
}

impl SlackNotifier {
    pub fn new(settings: &SlackSettings) -> Result<Self> {
        Self::with_base_url(
            DEFAULT_SLACK_URL,
            settings.bot_token.expose(),
            settings.default_channel.clone(),
        )
    }

    pub fn with_base_url(
        base_url: impl Into<String>,
        bot_token: impl Into<String>,
        default_channel: Option<String>,
    ) -> Result<Self> {
        Ok(Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            bot_token: bot_token.into(),
            default_channel,
            client: crate::http_client()?,
        })
    }
}

#[async_trait]
impl Notifier for SlackNotifier {
    fn name(&self) -> &'static str {
        "slack"
    }

    async fn send(&self, target: Option<&str>, text: &str) -> Result<()> {
        let channel = target
            .or(self.default_channel.as_deref())
            .ok_or_else(|| {
                Error::Config(
                    "No Slack channel given and DEVOPS_HUB_SLACK_DEFAULT_CHANNEL is not set"
                        .to_string(),
                )
            })?;

        let url = format!("{}/chat.postMessage", self.base_url);
        debug!(channel = channel, "Posting Slack message");

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.bot_token)
            .json(&PostMessage { channel, text })
            .send()
            .await
            .map_err(|e| Error::Http(e.to_string()))?;

        let status = response.status().as_u16();
        if !response.status().is_success() {
            let message = response.text().await.unwrap_or_default();
            warn!(
                status = status,
                message = message,
                "Slack API error response"
            );
            return Err(Error::from_status(status, message));
        }

        let body: SlackResponse = response
            .json()
            .await
            .map_err(|e| Error::InvalidData(format!("Failed to parse response: {}", e)))?;

        if !body.ok {
            let message = body.error.unwrap_or_else(|| "unknown_error".to_string());
            warn!(channel = channel, error = message, "Slack rejected message");
            return Err(Error::Api { status, message });
        }

        info!(channel = channel, ts = ?body.ts, "Slack message sent");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use devops_hub_core::Secret;
    use httpmock::prelude::*;

    fn notifier(server: &MockServer, default_channel: Option<&str>) -> SlackNotifier {
        SlackNotifier::with_base_url(
            server.base_url(),
            "xoxb-test",
            default_channel.map(String::from),
        )
        .unwrap()
    }

    #[test]
    fn test_new_from_settings() {
        let notifier = SlackNotifier::new(&SlackSettings {
            bot_token: Secret::new("xoxb-test"),
            default_channel: Some("#builds".to_string()),
        })
        .unwrap();
        assert_eq!(notifier.base_url, DEFAULT_SLACK_URL);
        assert_eq!(notifier.name(), "slack");
    }

    #[tokio::test]
    async fn test_send_to_target() {
        let server = MockServer::start();

        let mock = server.mock(|when, then| {
            when.method(POST)
                .path("/chat.postMessage")
                .header("Authorization", "Bearer xoxb-test")
                .json_body(serde_json::json!({"channel": "#releases", "text": "v1.2 is out"}));
            then.status(200)
                .json_body(serde_json::json!({"ok": true, "ts": "1700000000.000100"}));
        });

        notifier(&server, Some("#builds"))
            .send(Some("#releases"), "v1.2 is out")
            .await
            .unwrap();

        mock.assert();
    }

    #[tokio::test]
    async fn test_send_to_default_channel() {
        let server = MockServer::start();

        let mock = server.mock(|when, then| {
            when.method(POST)
                .path("/chat.postMessage")
                .body_includes("\"channel\":\"#builds\"");
            then.status(200).json_body(serde_json::json!({"ok": true}));
        });

        notifier(&server, Some("#builds"))
            .send(None, "build green")
            .await
            .unwrap();

        mock.assert();
    }

    #[tokio::test]
    async fn test_send_without_channel() {
        let server = MockServer::start();
        let result = notifier(&server, None).send(None, "hello").await;
        assert!(matches!(result.unwrap_err(), Error::Config(_)));
    }

    #[tokio::test]
    async fn test_slack_error_in_body() {
        let server = MockServer::start();

        server.mock(|when, then| {
            when.method(POST).path("/chat.postMessage");
            then.status(200)
                .json_body(serde_json::json!({"ok": false, "error": "channel_not_found"}));
        });

        let err = notifier(&server, None)
            .send(Some("#nope"), "hello")
            .await
            .unwrap_err();

        match err {
            Error::Api { status, message } => {
                assert_eq!(status, 200);
                assert_eq!(message, "channel_not_found");
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_invalid_token() {
        let server = MockServer::start();

        server.mock(|when, then| {
            when.method(POST).path("/chat.postMessage");
            then.status(401).body("invalid_auth");
        });

        let result = notifier(&server, None).send(Some("#builds"), "hello").await;
        assert!(matches!(result.unwrap_err(), Error::Unauthorized(_)));
    }
}
