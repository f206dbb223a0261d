//! GitHub integration for mcp-devops-hub.
//!
//! Reads repository files and directory listings through the contents API.
//! GitHub Enterprise works by pointing the client at its API base URL.

mod client;
mod types;

pub use client::GitHubClient;
pub use types::*;

/// Default GitHub API URL.
pub const DEFAULT_GITHUB_URL: &str = "https://api.github.com";
