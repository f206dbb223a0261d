//! Outbound notifications for mcp-devops-hub.
//!
//! - [`SlackNotifier`] posts through the Slack Web API (`chat.postMessage`).
//! - [`TeamsNotifier`] posts to a Microsoft Teams incoming webhook.

mod slack;
mod teams;

pub use slack::{SlackNotifier, DEFAULT_SLACK_URL};
pub use teams::TeamsNotifier;

fn http_client() -> devops_hub_core::Result<reqwest::Client> {
    reqwest::Client::builder()
        .user_agent("mcp-devops-hub")
        .build()
        .map_err(|e| devops_hub_core::Error::Http(format!("Failed to create HTTP client: {}", e)))
}
