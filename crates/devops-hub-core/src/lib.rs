//! Core traits, types, and error handling for mcp-devops-hub.
//!
//! This crate provides the foundational abstractions shared by the MCP server,
//! the integration plugins and the command-line entry point.

pub mod config;
pub mod error;
pub mod provider;
pub mod secret;
pub mod types;

pub use config::{
    GitHubSettings, GroqSettings, JenkinsSettings, JiraSettings, Settings, SlackSettings,
    ENV_PREFIX,
};
pub use error::{Error, Result};
pub use provider::{BuildProvider, CompletionProvider, Notifier, RepositoryProvider, SprintProvider};
pub use secret::Secret;
pub use types::*;

#[cfg(any(test, feature = "mocks"))]
pub use provider::{
    MockBuildProvider, MockCompletionProvider, MockRepositoryProvider, MockSprintProvider,
};
