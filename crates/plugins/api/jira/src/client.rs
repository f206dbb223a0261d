//! Jira API client implementation.
//!
//! Supports both Jira Cloud (API v3) and Jira Self-Hosted/Data Center (API v2).
//! Flavor is auto-detected from the URL: `*.atlassian.net` → Cloud, otherwise → SelfHosted.
//! Sprint metadata always comes from the Agile API (`/rest/agile/1.0`).

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use devops_hub_core::{Error, JiraSettings, Result, Sprint, SprintProvider, SprintTask};
use tracing::{debug, info, warn};

use crate::types::{
    JiraCloudSearchResponse, JiraIssue, JiraSearchResponse, JiraSprint, JiraSprintPage, JiraUser,
};

/// Page size for issue search.
const SEARCH_PAGE_SIZE: u32 = 100;

/// Page size for board sprint listing.
const SPRINT_PAGE_SIZE: u32 = 50;

/// Jira deployment flavor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JiraFlavor {
    /// Jira Cloud: API v3, token-paginated search
    Cloud,
    /// Jira Self-Hosted / Data Center: API v2, offset-paginated search
    SelfHosted,
}

/// Jira API client.
pub struct JiraClient {
    instance_url: String,
    api_base: String,
    agile_base: String,
    username: String,
    token: String,
    flavor: JiraFlavor,
    board_id: u64,
    story_points_field: String,
    client: reqwest::Client,
}

impl JiraClient {
    /// Create a Jira client from settings. Flavor is auto-detected from the URL.
    pub fn new(settings: &JiraSettings) -> Result<Self> {
        let flavor = detect_flavor(&settings.url);
        Ok(Self::with_flavor(
            &settings.url,
            &settings.username,
            settings.api_token.expose(),
            flavor,
        )?
        .with_board_id(settings.board_id)
        .with_story_points_field(&settings.story_points_field))
    }

    /// Create a client for an instance URL with an explicit flavor.
    pub fn with_flavor(
        url: &str,
        username: impl Into<String>,
        token: impl Into<String>,
        flavor: JiraFlavor,
    ) -> Result<Self> {
        let instance_url = url.trim_end_matches('/').to_string();
        let client = reqwest::Client::builder()
            .user_agent("mcp-devops-hub")
            .build()
            .map_err(|e| Error::Http(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            api_base: build_api_base(&instance_url, flavor),
            agile_base: format!("{}/rest/agile/1.0", instance_url),
            instance_url,
            username: username.into(),
            token: token.into(),
            flavor,
            board_id: 1,
            story_points_field: "customfield_10026".to_string(),
            client,
        })
    }

    /// Board used to look up closed sprints.
    pub fn with_board_id(mut self, board_id: u64) -> Self {
        self.board_id = board_id;
        self
    }

    /// Custom field holding story points.
    pub fn with_story_points_field(mut self, field: impl Into<String>) -> Self {
        self.story_points_field = field.into();
        self
    }

    pub fn flavor(&self) -> JiraFlavor {
        self.flavor
    }

    pub fn instance_url(&self) -> &str {
        &self.instance_url
    }

    /// Display name of the authenticated user.
    pub async fn current_user(&self) -> Result<String> {
        let url = format!("{}/myself", self.api_base);
        let user: JiraUser = self.get(&url, &[]).await?;
        Ok(user
            .display_name
            .or(user.name)
            .or(user.account_id)
            .unwrap_or_default())
    }

    /// Make an authenticated GET request.
    async fn get<T: serde::de::DeserializeOwned>(
        &self,
        url: &str,
        query: &[(&str, String)],
    ) -> Result<T> {
        debug!(url = url, params = ?query, "Jira GET request");

        let response = self
            .client
            .get(url)
            .basic_auth(&self.username, Some(&self.token))
            .header("Accept", "application/json")
            .query(query)
            .send()
            .await
            .map_err(|e| Error::Http(e.to_string()))?;

        self.handle_response(response).await
    }

    /// Handle response and map errors.
    async fn handle_response<T: serde::de::DeserializeOwned>(
        &self,
        response: reqwest::Response,
    ) -> Result<T> {
        let status = response.status();

        if !status.is_success() {
            let status_code = status.as_u16();
            let message = response.text().await.unwrap_or_default();
            warn!(
                status = status_code,
                message = message,
                "Jira API error response"
            );
            return Err(Error::from_status(status_code, message));
        }

        response
            .json()
            .await
            .map_err(|e| Error::InvalidData(format!("Failed to parse response: {}", e)))
    }

    fn search_fields(&self) -> String {
        format!("summary,status,assignee,{}", self.story_points_field)
    }

    /// Self-Hosted search: offset pagination until `total` is reached.
    async fn search_self_hosted(&self, jql: &str) -> Result<Vec<JiraIssue>> {
        let url = format!("{}/search", self.api_base);
        let mut issues = Vec::new();
        let mut start_at = 0u32;

        loop {
            let params = vec![
                ("jql", jql.to_string()),
                ("fields", self.search_fields()),
                ("startAt", start_at.to_string()),
                ("maxResults", SEARCH_PAGE_SIZE.to_string()),
            ];
            let page: JiraSearchResponse = self.get(&url, &params).await?;

            let page_len = page.issues.len() as u32;
            issues.extend(page.issues);
            start_at += page_len;

            let total = page.total.unwrap_or(start_at);
            if page_len == 0 || start_at >= total {
                break;
            }
        }

        Ok(issues)
    }

    /// Cloud search: token pagination until the last page.
    async fn search_cloud(&self, jql: &str) -> Result<Vec<JiraIssue>> {
        let url = format!("{}/search/jql", self.api_base);
        let mut issues = Vec::new();
        let mut next_page_token: Option<String> = None;

        loop {
            let mut params = vec![
                ("jql", jql.to_string()),
                ("fields", self.search_fields()),
                ("maxResults", SEARCH_PAGE_SIZE.to_string()),
            ];
            if let Some(token) = &next_page_token {
                params.push(("nextPageToken", token.clone()));
            }

            let page: JiraCloudSearchResponse = self.get(&url, &params).await?;
            let page_len = page.issues.len();
            issues.extend(page.issues);

            match page.next_page_token {
                Some(token) if page_len > 0 && page.is_last != Some(true) => {
                    next_page_token = Some(token);
                }
                _ => break,
            }
        }

        Ok(issues)
    }

    fn map_task(&self, issue: &JiraIssue) -> SprintTask {
        SprintTask {
            key: issue.key.clone(),
            summary: issue.fields.summary.clone().unwrap_or_default(),
            status: issue
                .fields
                .status
                .as_ref()
                .map(|s| s.name.clone())
                .unwrap_or_else(|| "Unknown".to_string()),
            assignee: issue
                .fields
                .assignee
                .as_ref()
                .and_then(|a| a.display_name.clone().or_else(|| a.name.clone())),
            story_points: issue
                .fields
                .extra
                .get(&self.story_points_field)
                .and_then(serde_json::Value::as_f64),
        }
    }
}

// =============================================================================
// Flavor detection and mapping
// =============================================================================

/// Detect Jira flavor from the instance URL.
fn detect_flavor(url: &str) -> JiraFlavor {
    if url.contains(".atlassian.net") {
        JiraFlavor::Cloud
    } else {
        JiraFlavor::SelfHosted
    }
}

/// Build the REST API base URL from the instance URL and flavor.
fn build_api_base(url: &str, flavor: JiraFlavor) -> String {
    let base = url.trim_end_matches('/');
    match flavor {
        JiraFlavor::Cloud => format!("{}/rest/api/3", base),
        JiraFlavor::SelfHosted => format!("{}/rest/api/2", base),
    }
}

fn sprint_jql(project_key: &str, sprint_id: u64) -> String {
    format!("project = \"{}\" AND sprint = {}", project_key, sprint_id)
}

fn parse_date(value: Option<&str>) -> Option<DateTime<Utc>> {
    let value = value?;
    match DateTime::parse_from_rfc3339(value) {
        Ok(date) => Some(date.with_timezone(&Utc)),
        Err(e) => {
            warn!(value = value, error = %e, "Unparseable sprint date");
            None
        }
    }
}

fn map_sprint(sprint: &JiraSprint) -> Sprint {
    Sprint {
        id: sprint.id,
        name: sprint.name.clone(),
        state: sprint.state.clone(),
        start_date: parse_date(sprint.start_date.as_deref()),
        end_date: parse_date(sprint.end_date.as_deref()),
    }
}

// =============================================================================
// Trait implementation
// =============================================================================

#[async_trait]
impl SprintProvider for JiraClient {
    async fn get_sprint_tasks(&self, project_key: &str, sprint_id: u64) -> Result<Vec<SprintTask>> {
        let jql = sprint_jql(project_key, sprint_id);
        debug!(jql = jql, "Executing JQL");

        let issues = match self.flavor {
            JiraFlavor::Cloud => self.search_cloud(&jql).await?,
            JiraFlavor::SelfHosted => self.search_self_hosted(&jql).await?,
        };

        info!(
            project = project_key,
            sprint = sprint_id,
            count = issues.len(),
            "Fetched sprint tasks"
        );

        Ok(issues.iter().map(|i| self.map_task(i)).collect())
    }

    async fn get_sprint(&self, sprint_id: u64) -> Result<Option<Sprint>> {
        let url = format!("{}/sprint/{}", self.agile_base, sprint_id);
        match self.get::<JiraSprint>(&url, &[]).await {
            Ok(sprint) => Ok(Some(map_sprint(&sprint))),
            Err(e) if e.is_not_found() => {
                warn!(sprint = sprint_id, "Sprint not found");
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }

    async fn get_completed_sprints(&self, project_key: &str, limit: u32) -> Result<Vec<Sprint>> {
        if limit == 0 {
            return Ok(vec![]);
        }

        let url = format!("{}/board/{}/sprint", self.agile_base, self.board_id);
        debug!(
            project = project_key,
            board = self.board_id,
            "Listing closed sprints"
        );

        // The Agile API lists sprints oldest first; the most recent ones are on the last page.
        let mut sprints = Vec::new();
        let mut start_at = 0u32;
        loop {
            let params = vec![
                ("state", "closed".to_string()),
                ("startAt", start_at.to_string()),
                ("maxResults", SPRINT_PAGE_SIZE.to_string()),
            ];
            let page: JiraSprintPage = self.get(&url, &params).await?;
            let page_len = page.values.len() as u32;
            sprints.extend(page.values.iter().map(map_sprint));

            if page.is_last || page_len == 0 {
                break;
            }
            start_at = page.start_at + page_len;
        }

        let skip = sprints.len().saturating_sub(limit as usize);
        let recent: Vec<Sprint> = sprints.into_iter().skip(skip).collect();

        info!(
            board = self.board_id,
            count = recent.len(),
            limit = limit,
            "Fetched completed sprints"
        );
        Ok(recent)
    }
}

// =============================================================================
// Tests
// =============================================================================
