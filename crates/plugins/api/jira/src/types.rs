//! Jira API response types.
//!
//! These types represent the raw JSON responses from the Jira REST and Agile
//! APIs. They are deserialized and then mapped to hub types.

use std::collections::HashMap;

use serde::Deserialize;

// =============================================================================
// User
// =============================================================================

/// Jira user representation.
#[derive(Debug, Clone, Deserialize)]
pub struct JiraUser {
    /// Account ID (Cloud only)
    #[serde(default, rename = "accountId")]
    pub account_id: Option<String>,
    /// Username (Self-Hosted only)
    #[serde(default)]
    pub name: Option<String>,
    /// Display name
    #[serde(default, rename = "displayName")]
    pub display_name: Option<String>,
    /// Email address
    #[serde(default, rename = "emailAddress")]
    pub email_address: Option<String>,
}

// =============================================================================
// Issue
// =============================================================================

/// Jira issue as returned by search.
#[derive(Debug, Clone, Deserialize)]
pub struct JiraIssue {
    /// Issue key (e.g., "PROJ-123")
    pub key: String,
    /// Issue fields
    pub fields: JiraIssueFields,
}

/// Jira issue fields.
///
/// Story points live in an instance-specific custom field, so every field not
/// named here is kept in `extra`.
#[derive(Debug, Clone, Deserialize)]
pub struct JiraIssueFields {
    #[serde(default)]
    pub summary: Option<String>,
    #[serde(default)]
    pub status: Option<JiraStatus>,
    #[serde(default)]
    pub assignee: Option<JiraUser>,
    #[serde(flatten)]
    pub extra: HashMap<String, serde_json::Value>,
}

/// Jira issue status.
#[derive(Debug, Clone, Deserialize)]
pub struct JiraStatus {
    pub name: String,
}

// =============================================================================
// Search responses
// =============================================================================

/// Search response from Self-Hosted Jira (API v2, GET /search).
#[derive(Debug, Clone, Deserialize)]
pub struct JiraSearchResponse {
    pub issues: Vec<JiraIssue>,
    #[serde(default, rename = "startAt")]
    pub start_at: Option<u32>,
    #[serde(default, rename = "maxResults")]
    pub max_results: Option<u32>,
    #[serde(default)]
    pub total: Option<u32>,
}

/// Search response from Jira Cloud (API v3, GET /search/jql).
#[derive(Debug, Clone, Deserialize)]
pub struct JiraCloudSearchResponse {
    pub issues: Vec<JiraIssue>,
    #[serde(default, rename = "nextPageToken")]
    pub next_page_token: Option<String>,
    #[serde(default, rename = "isLast")]
    pub is_last: Option<bool>,
}

// =============================================================================
// Agile
// =============================================================================

/// Sprint from the Agile API.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JiraSprint {
    pub id: u64,
    pub name: String,
    pub state: String,
    #[serde(default)]
    pub start_date: Option<String>,
    #[serde(default)]
    pub end_date: Option<String>,
}

/// One page of sprints on a board.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JiraSprintPage {
    #[serde(default)]
    pub values: Vec<JiraSprint>,
    #[serde(default)]
    pub start_at: u32,
    #[serde(default)]
    pub is_last: bool,
}
