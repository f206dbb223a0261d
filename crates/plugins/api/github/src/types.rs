//! GitHub API response types.
//!
//! These types represent the raw JSON responses from GitHub API.
//! They are deserialized and then mapped to hub types.

use serde::{Deserialize, Serialize};

// =============================================================================
// User
// =============================================================================

/// GitHub user representation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GitHubUser {
    pub id: u64,
    pub login: String,
    #[serde(default)]
    pub name: Option<String>,
}

// =============================================================================
// Contents
// =============================================================================

/// Response of `GET /repos/{owner}/{repo}/contents/{path}`.
///
/// A file path yields a single object, a directory path yields an array.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum GitHubContentResponse {
    Directory(Vec<GitHubContentItem>),
    File(GitHubContentItem),
}

/// One item of the contents API.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GitHubContentItem {
    pub name: String,
    pub path: String,
    /// `file`, `dir`, `symlink` or `submodule`
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub size: Option<u64>,
    #[serde(default)]
    pub sha: Option<String>,
    /// Present on files only
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub encoding: Option<String>,
    #[serde(default)]
    pub html_url: Option<String>,
}
