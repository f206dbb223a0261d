//! Resource templates and `resources/read`.
//!
//! Resources are addressed by URI. Each read returns one JSON document; a
//! failure to fetch the data is reported inside that document as
//! `{"error": "..."}`, while an unrecognised URI is a protocol error.

use std::sync::Arc;

use devops_hub_core::{RepoContent, Result};
use serde_json::{json, Value};
use tracing::{info, warn};

use crate::hub::Hub;
use crate::protocol::{ReadResourceResult, ResourceContents, ResourceTemplate};

const JSON_MIME: &str = "application/json";

/// A parsed resource URI.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResourceUri {
    SprintTasks { project_key: String, sprint_id: u64 },
    RepoContent {
        owner: String,
        repo: String,
        path: String,
    },
    BuildStatus { pipeline: String, build: String },
}

impl ResourceUri {
    /// Match a URI against the resource templates.
    pub fn parse(uri: &str) -> Option<Self> {
        let (scheme, rest) = uri.split_once("://")?;
        let segments: Vec<&str> = rest.split('/').collect();

        match (scheme, segments.as_slice()) {
            ("jira", ["project", project_key, "sprint", sprint_id, "tasks"])
                if !project_key.is_empty() =>
            {
                Some(ResourceUri::SprintTasks {
                    project_key: project_key.to_string(),
                    sprint_id: sprint_id.parse().ok()?,
                })
            }
            ("github", [owner, repo, "content", path @ ..])
                if !owner.is_empty() && !repo.is_empty() =>
            {
                Some(ResourceUri::RepoContent {
                    owner: owner.to_string(),
                    repo: repo.to_string(),
                    path: path.join("/"),
                })
            }
            // Pipeline names may contain folders: `cicd://team/app/build/7/status`
            ("cicd", [pipeline @ .., "build", build, "status"])
                if !pipeline.is_empty() && !build.is_empty() =>
            {
                Some(ResourceUri::BuildStatus {
                    pipeline: pipeline.join("/"),
                    build: build.to_string(),
                })
            }
            _ => None,
        }
    }
}

/// Serves the resource templates.
pub struct ResourceHandler {
    hub: Arc<Hub>,
}

impl ResourceHandler {
    pub fn new(hub: Arc<Hub>) -> Self {
        Self { hub }
    }

    pub fn templates(&self) -> Vec<ResourceTemplate> {
        let template = |uri: &str, name: &str, description: &str| ResourceTemplate {
            uri_template: uri.to_string(),
            name: name.to_string(),
            description: description.to_string(),
            mime_type: JSON_MIME.to_string(),
        };

        vec![
            template(
                "jira://project/{project_key}/sprint/{sprint_id}/tasks",
                "sprint_tasks",
                "Gets tasks for a Jira sprint.",
            ),
            template(
                "github://{owner}/{repo}/content",
                "repository_root",
                "Gets content of the root directory in a GitHub repo.",
            ),
            template(
                "github://{owner}/{repo}/content/{path}",
                "repository_content",
                "Gets content of a file or lists a directory in a GitHub repo.",
            ),
            template(
                "cicd://{pipeline_name}/build/{build_number}/status",
                "build_status",
                "Gets the status of a specific CI/CD build.",
            ),
        ]
    }

    /// Read a resource. `None` if the URI matches no template.
    pub async fn read(&self, uri: &str) -> Option<ReadResourceResult> {
        let resource = ResourceUri::parse(uri)?;
        info!(uri = uri, "Reading resource");

        let body = match self.fetch(&resource).await {
            Ok(body) => body,
            Err(e) => {
                warn!(uri = uri, error = %e, "Error reading resource");
                json!({ "error": e.to_string() })
            }
        };

        Some(ReadResourceResult {
            contents: vec![ResourceContents {
                uri: uri.to_string(),
                mime_type: JSON_MIME.to_string(),
                text: body.to_string(),
            }],
        })
    }

    async fn fetch(&self, resource: &ResourceUri) -> Result<Value> {
        match resource {
            ResourceUri::SprintTasks {
                project_key,
                sprint_id,
            } => {
                let tasks = self
                    .hub
                    .jira()?
                    .get_sprint_tasks(project_key, *sprint_id)
                    .await?;
                Ok(json!({ "total": tasks.len(), "tasks": tasks }))
            }
            ResourceUri::RepoContent { owner, repo, path } => {
                let content = self.hub.github()?.get_content(owner, repo, path).await?;
                Ok(match content {
                    Some(RepoContent::File { path, content }) => json!({
                        "type": "file",
                        "path": path,
                        "content": content,
                        "entries": null,
                    }),
                    Some(RepoContent::Directory { path, entries }) => json!({
                        "type": "dir",
                        "path": path,
                        "content": null,
                        "entries": entries,
                    }),
                    None => json!({ "error": format!("Not found: {}/{}/{}", owner, repo, path) }),
                })
            }
            ResourceUri::BuildStatus { pipeline, build } => {
                let info = self.hub.jenkins()?.get_build_info(pipeline, build).await?;
                Ok(match info {
                    Some(info) => json!({
                        "pipeline": pipeline,
                        "build": build,
                        "status": info.result,
                        "timestamp": info.timestamp,
                        "duration": info.duration,
                        "url": info.url,
                    }),
                    None => {
                        let error = format!(
                            "Build {} of {} not found or not accessible",
                            build, pipeline
                        );
                        json!({ "error": error })
                    }
                })
            }
        }
    }
}
