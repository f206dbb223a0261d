//! Common types shared by the integrations and the MCP server.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// =============================================================================
// Sprint tracking
// =============================================================================

/// A task (issue) that belongs to a sprint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SprintTask {
    pub key: String,
    pub summary: String,
    pub status: String,
    pub assignee: Option<String>,
    pub story_points: Option<f64>,
}

/// A sprint on an agile board.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sprint {
    pub id: u64,
    pub name: String,
    /// `future`, `active` or `closed`
    pub state: String,
    pub start_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,
}

// =============================================================================
// Repository content
// =============================================================================

/// Content at a repository path: either a file or a directory listing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum RepoContent {
    File {
        path: String,
        content: String,
    },
    #[serde(rename = "dir")]
    Directory {
        path: String,
        entries: Vec<ContentEntry>,
    },
}

impl RepoContent {
    pub fn path(&self) -> &str {
        match self {
            RepoContent::File { path, .. } | RepoContent::Directory { path, .. } => path,
        }
    }

    pub fn is_file(&self) -> bool {
        matches!(self, RepoContent::File { .. })
    }
}

/// One entry of a directory listing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContentEntry {
    pub name: String,
    /// `file`, `dir`, `symlink` or `submodule`
    #[serde(rename = "type")]
    pub kind: String,
}

// =============================================================================
// CI/CD
// =============================================================================

/// Status of one CI/CD build.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BuildInfo {
    pub pipeline: String,
    pub build: String,
    /// `SUCCESS`, `FAILURE`, `UNSTABLE`, `ABORTED`, or `None` while running
    pub result: Option<String>,
    pub building: bool,
    /// Start time in milliseconds since the Unix epoch
    pub timestamp: Option<i64>,
    /// Duration in milliseconds
    pub duration: Option<i64>,
    pub url: Option<String>,
}

// =============================================================================
// LLM chat
// =============================================================================

/// Author of a chat message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

/// A single chat message sent to a completion backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}
