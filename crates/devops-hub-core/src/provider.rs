//! Provider traits for the systems the hub aggregates.
//!
//! Each integration plugin implements one of these traits. The MCP server only
//! talks to the traits, so any integration can be absent or replaced by a mock.

use async_trait::async_trait;

use crate::error::Result;
use crate::types::{BuildInfo, ChatMessage, RepoContent, Sprint, SprintTask};

/// Sampling temperature for code analysis.
pub const ANALYSIS_TEMPERATURE: f32 = 0.3;

/// Sprint and task tracking (Jira).
#[cfg_attr(any(test, feature = "mocks"), mockall::automock)]
#[async_trait]
pub trait SprintProvider: Send + Sync {
    /// Get every task in a sprint of a project.
    async fn get_sprint_tasks(&self, project_key: &str, sprint_id: u64) -> Result<Vec<SprintTask>>;

    /// Get a sprint by ID. Returns `Ok(None)` if it doesn't exist.
    async fn get_sprint(&self, sprint_id: u64) -> Result<Option<Sprint>>;

    /// Get the most recently closed sprints, oldest first.
    async fn get_completed_sprints(&self, project_key: &str, limit: u32) -> Result<Vec<Sprint>>;
}

/// Source code hosting (GitHub).
#[cfg_attr(any(test, feature = "mocks"), mockall::automock)]
#[async_trait]
pub trait RepositoryProvider: Send + Sync {
    /// Get a file or directory listing. An empty path is the repository root.
    ///
    /// Returns `Ok(None)` if the repository or the path doesn't exist.
    async fn get_content(&self, owner: &str, repo: &str, path: &str)
        -> Result<Option<RepoContent>>;

    /// Login of the authenticated user.
    async fn authenticated_user(&self) -> Result<String>;
}

/// CI/CD build status (Jenkins).
#[cfg_attr(any(test, feature = "mocks"), mockall::automock)]
#[async_trait]
pub trait BuildProvider: Send + Sync {
    /// Get one build of a pipeline. Returns `Ok(None)` if the server refuses.
    async fn get_build_info(&self, pipeline: &str, build: &str) -> Result<Option<BuildInfo>>;
}

/// Chat completion backend (Groq or any OpenAI-compatible API).
#[cfg_attr(any(test, feature = "mocks"), mockall::automock)]
#[async_trait]
pub trait CompletionProvider: Send + Sync {
    /// Generate a completion. `None` overrides fall back to configured defaults.
    async fn complete(
        &self,
        messages: Vec<ChatMessage>,
        temperature: Option<f32>,
        max_tokens: Option<u32>,
    ) -> Result<String>;

    /// Review code for quality, potential issues and improvements.
    async fn analyze_code(&self, code: &str, language: &str) -> Result<String> {
        let messages = vec![
            ChatMessage::system(
                "You are a code analysis expert. Analyze the provided code for quality, \
                 potential issues, and suggestions for improvement.",
            ),
            ChatMessage::user(format!("Please analyze this {} code:\n\n{}", language, code)),
        ];
        self.complete(messages, Some(ANALYSIS_TEMPERATURE), None)
            .await
    }
}

/// Outbound notification channel (Slack, Teams).
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Channel name, e.g. "slack".
    fn name(&self) -> &'static str;

    /// Send a message. `target` selects a channel where the backend supports it.
    async fn send(&self, target: Option<&str>, text: &str) -> Result<()>;
}
