//! Tool handlers for MCP server.
//!
//! Each tool fetches data through the [`Hub`] and renders plain text.
//! Failures are reported as `isError` results, never as protocol errors.

use std::fmt::Display;
use std::sync::Arc;

use chrono::DateTime;
use devops_hub_core::{BuildInfo, ChatMessage, Error, RepoContent};
use devops_hub_insights::{
    language_from_path, render_directory_summary, truncate_string, CodeMetrics, CommentStyle,
    MAX_ANALYSIS_CHARS,
};
use serde_json::Value;
use tracing::{info, warn};

use crate::hub::Hub;
use crate::protocol::{ToolCallResult, ToolDefinition};

/// Sampling temperature for AI insights.
pub const INSIGHTS_TEMPERATURE: f32 = 0.3;

/// Completion budget for AI insights.
pub const INSIGHTS_MAX_TOKENS: u32 = 1500;

const INSIGHTS_SYSTEM_PROMPT: &str = "You are an AI assistant specialized in software \
    development and DevOps. Analyze the provided context and answer the question with \
    detailed insights.";

// =============================================================================
// Argument extraction
// =============================================================================

/// Required string argument.
pub(crate) fn required_str(args: &Value, name: &str) -> Result<String, String> {
    match args.get(name) {
        None | Some(Value::Null) => Err(format!("Missing required argument: {}", name)),
        Some(Value::String(s)) => Ok(s.clone()),
        Some(Value::Number(n)) => Ok(n.to_string()),
        Some(_) => Err(format!("Invalid argument {}: expected a string", name)),
    }
}

/// Optional string argument.
fn optional_str(args: &Value, name: &str) -> Result<Option<String>, String> {
    match args.get(name) {
        None | Some(Value::Null) => Ok(None),
        Some(_) => required_str(args, name).map(Some),
    }
}

/// Required non-negative integer argument, given as a number or a numeric string.
pub(crate) fn required_u64(args: &Value, name: &str) -> Result<u64, String> {
    let invalid = || {
        format!(
            "Invalid argument {}: expected a non-negative integer",
            name
        )
    };
    match args.get(name) {
        None | Some(Value::Null) => Err(format!("Missing required argument: {}", name)),
        Some(Value::Number(n)) => n.as_u64().ok_or_else(invalid),
        Some(Value::String(s)) => s.trim().parse().map_err(|_| invalid()),
        Some(_) => Err(invalid()),
    }
}

fn failure(verb: &str, error: impl Display) -> ToolCallResult {
    ToolCallResult::error(format!("Error {}: {}", verb, error))
}

// =============================================================================
// Tool handler
// =============================================================================

/// Tool handler that executes tools against the hub's integrations.
pub struct ToolHandler {
    hub: Arc<Hub>,
}

impl ToolHandler {
    pub fn new(hub: Arc<Hub>) -> Self {
        Self { hub }
    }

    /// Get available tool definitions.
    pub fn available_tools(&self) -> Vec<ToolDefinition> {
        let sprint_schema = serde_json::json!({
            "type": "object",
            "properties": {
                "project_key": {
                    "type": "string",
                    "description": "Jira project key (e.g., 'PROJ')"
                },
                "sprint_id": {
                    "type": "integer",
                    "description": "Numeric ID of the Jira sprint",
                    "minimum": 0
                }
            },
            "required": ["project_key", "sprint_id"]
        });

        vec![
            ToolDefinition {
                name: "generate_sprint_report".to_string(),
                description: "Generates a report summarizing completed/remaining tasks \
                              for a sprint."
                    .to_string(),
                input_schema: sprint_schema.clone(),
            },
            ToolDefinition {
                name: "predict_burndown".to_string(),
                description: "Analyzes sprint progress and historical data to predict burndown."
                    .to_string(),
                input_schema: sprint_schema,
            },
            ToolDefinition {
                name: "assess_code_quality".to_string(),
                description: "Assesses code quality for a given file or directory.".to_string(),
                input_schema: serde_json::json!({
                    "type": "object",
                    "properties": {
                        "owner": {"type": "string", "description": "GitHub repository owner"},
                        "repo": {"type": "string", "description": "GitHub repository name"},
                        "path": {
                            "type": "string",
                            "description": "Path to file or directory (default: repository root)",
                            "default": ""
                        }
                    },
                    "required": ["owner", "repo"]
                }),
            },
            ToolDefinition {
                name: "analyze_code_with_groq".to_string(),
                description: "Analyzes code using Groq's AI capabilities.".to_string(),
                input_schema: serde_json::json!({
                    "type": "object",
                    "properties": {
                        "owner": {"type": "string", "description": "GitHub repository owner"},
                        "repo": {"type": "string", "description": "GitHub repository name"},
                        "path": {"type": "string", "description": "Path to file"}
                    },
                    "required": ["owner", "repo", "path"]
                }),
            },
            ToolDefinition {
                name: "generate_ai_insights".to_string(),
                description: "Generate AI-powered insights. The model analyzes the context and \
                              provides a detailed answer to the question."
                    .to_string(),
                input_schema: serde_json::json!({
                    "type": "object",
                    "properties": {
                        "context": {
                            "type": "string",
                            "description": "Context information for the AI to analyze"
                        },
                        "question": {
                            "type": "string",
                            "description": "Specific question or analysis request"
                        }
                    },
                    "required": ["context", "question"]
                }),
            },
            ToolDefinition {
                name: "get_build_status".to_string(),
                description: "Gets the status of a specific CI/CD build.".to_string(),
                input_schema: serde_json::json!({
                    "type": "object",
                    "properties": {
                        "pipeline_name": {
                            "type": "string",
                            "description": "Jenkins job name, folders separated by '/'"
                        },
                        "build_number": {
                            "type": "string",
                            "description": "Build number or alias such as 'lastBuild'"
                        }
                    },
                    "required": ["pipeline_name", "build_number"]
                }),
            },
            ToolDefinition {
                name: "send_notification".to_string(),
                description: "Sends a message to Slack or Microsoft Teams.".to_string(),
                input_schema: serde_json::json!({
                    "type": "object",
                    "properties": {
                        "channel": {
                            "type": "string",
                            "enum": ["slack", "teams"],
                            "description": "Notification backend"
                        },
                        "message": {"type": "string", "description": "Message text"},
                        "target": {
                            "type": "string",
                            "description": "Slack channel (defaults to the configured channel)"
                        }
                    },
                    "required": ["channel", "message"]
                }),
            },
        ]
    }

    /// Execute a tool by name.
    pub async fn execute(&self, name: &str, arguments: Option<Value>) -> ToolCallResult {
        let args = arguments.unwrap_or_else(|| Value::Object(Default::default()));
        if !args.is_object() {
            return ToolCallResult::error("Invalid arguments: expected an object");
        }

        let result = match name {
            "generate_sprint_report" => self.generate_sprint_report(&args).await,
            "predict_burndown" => self.predict_burndown(&args).await,
            "assess_code_quality" => self.assess_code_quality(&args).await,
            "analyze_code_with_groq" => self.analyze_code_with_groq(&args).await,
            "generate_ai_insights" => self.generate_ai_insights(&args).await,
            "get_build_status" => self.get_build_status(&args).await,
            "send_notification" => self.send_notification(&args).await,
            _ => return ToolCallResult::error(format!("Unknown tool: {}", name)),
        };

        result.unwrap_or_else(ToolCallResult::error)
    }

    async fn generate_sprint_report(&self, args: &Value) -> Result<ToolCallResult, String> {
        let project_key = required_str(args, "project_key")?;
        let sprint_id = required_u64(args, "sprint_id")?;
        info!(
            project = project_key,
            sprint = sprint_id,
            "Generating sprint report"
        );

        Ok(match self.hub.sprint_report(&project_key, sprint_id).await {
            Ok(report) => ToolCallResult::text(report),
            Err(e) => {
                warn!(error = %e, "Error generating sprint report");
                failure("generating report", e)
            }
        })
    }

    async fn predict_burndown(&self, args: &Value) -> Result<ToolCallResult, String> {
        let project_key = required_str(args, "project_key")?;
        let sprint_id = required_u64(args, "sprint_id")?;
        info!(
            project = project_key,
            sprint = sprint_id,
            "Predicting burndown"
        );

        Ok(match self.hub.burndown(&project_key, sprint_id).await {
            Ok(forecast) => ToolCallResult::text(forecast.render(&project_key, sprint_id)),
            Err(e) => {
                warn!(error = %e, "Error predicting burndown");
                failure("predicting burndown", e)
            }
        })
    }

    /// Fetch repository content, mapping an absent path to an error.
    async fn fetch_content(
        &self,
        owner: &str,
        repo: &str,
        path: &str,
    ) -> devops_hub_core::Result<RepoContent> {
        self.hub
            .github()?
            .get_content(owner, repo, path)
            .await?
            .ok_or_else(|| Error::NotFound(format!("{}/{}/{}", owner, repo, path)))
    }

    async fn assess_code_quality(&self, args: &Value) -> Result<ToolCallResult, String> {
        let owner = required_str(args, "owner")?;
        let repo = required_str(args, "repo")?;
        let path = optional_str(args, "path")?.unwrap_or_default();
        info!(
            owner = owner,
            repo = repo,
            path = path,
            "Assessing code quality"
        );

        Ok(match self.fetch_content(&owner, &repo, &path).await {
            Ok(RepoContent::File { content, .. }) => {
                let metrics = CodeMetrics::analyze(&content, CommentStyle::from_path(&path));
                ToolCallResult::text(metrics.render_report(&path))
            }
            Ok(RepoContent::Directory { entries, .. }) => {
                ToolCallResult::text(render_directory_summary(&path, entries.len()))
            }
            Err(e) => {
                warn!(error = %e, "Error assessing code quality");
                failure("assessing code quality", e)
            }
        })
    }

    async fn analyze_code_with_groq(&self, args: &Value) -> Result<ToolCallResult, String> {
        let owner = required_str(args, "owner")?;
        let repo = required_str(args, "repo")?;
        let path = required_str(args, "path")?;
        info!(
            owner = owner,
            repo = repo,
            path = path,
            "Analyzing code with Groq"
        );

        let llm = match self.hub.llm() {
            Ok(llm) => llm,
            Err(e) => return Ok(failure("analyzing code", e)),
        };

        let code = match self.fetch_content(&owner, &repo, &path).await {
            Ok(RepoContent::File { content, .. }) => content,
            Ok(RepoContent::Directory { .. }) => {
                return Ok(ToolCallResult::error("Please provide a path to a specific file"));
            }
            Err(e) => {
                warn!(error = %e, "Error fetching code for analysis");
                return Ok(failure("analyzing code", e));
            }
        };

        let code = truncate_string(&code, MAX_ANALYSIS_CHARS);
        let language = language_from_path(&path);

        Ok(match llm.analyze_code(&code, language).await {
            Ok(analysis) => ToolCallResult::text(format!(
                "Code Analysis for {}\n{}\n{}",
                path,
                "=".repeat(50),
                analysis
            )),
            Err(e) => {
                warn!(error = %e, "Error in Groq analysis");
                failure("analyzing code", e)
            }
        })
    }

    async fn generate_ai_insights(&self, args: &Value) -> Result<ToolCallResult, String> {
        let context = required_str(args, "context")?;
        let question = required_str(args, "question")?;
        info!(question = question, "Generating AI insights");

        let messages = vec![
            ChatMessage::system(INSIGHTS_SYSTEM_PROMPT),
            ChatMessage::user(format!("Context:\n{}\n\nQuestion: {}", context, question)),
        ];

        let result = match self.hub.llm() {
            Ok(llm) => {
                llm.complete(
                    messages,
                    Some(INSIGHTS_TEMPERATURE),
                    Some(INSIGHTS_MAX_TOKENS),
                )
                .await
            }
            Err(e) => Err(e),
        };

        Ok(match result {
            Ok(text) => ToolCallResult::text(text),
            Err(e) => {
                warn!(error = %e, "Error generating AI insights");
                failure("generating insights", e)
            }
        })
    }

    async fn get_build_status(&self, args: &Value) -> Result<ToolCallResult, String> {
        let pipeline = required_str(args, "pipeline_name")?;
        let build = required_str(args, "build_number")?;
        info!(pipeline = pipeline, build = build, "Getting build status");

        let result = match self.hub.jenkins() {
            Ok(jenkins) => jenkins.get_build_info(&pipeline, &build).await,
            Err(e) => Err(e),
        };

        Ok(match result {
            Ok(Some(info)) => ToolCallResult::text(render_build(&info)),
            Ok(None) => failure(
                "fetching build status",
                format!(
                    "Build {} of {} not found or not accessible",
                    build, pipeline
                ),
            ),
            Err(e) => {
                warn!(error = %e, "Error fetching build status");
                failure("fetching build status", e)
            }
        })
    }

    async fn send_notification(&self, args: &Value) -> Result<ToolCallResult, String> {
        let channel = required_str(args, "channel")?;
        let message = required_str(args, "message")?;
        let target = optional_str(args, "target")?;
        info!(channel = channel, recipient = ?target, "Sending notification");

        let result = match self.hub.notifier(&channel) {
            Ok(notifier) => notifier.send(target.as_deref(), &message).await,
            Err(e) => Err(e),
        };

        Ok(match result {
            Ok(()) => ToolCallResult::text(match &target {
                Some(target) => format!("Notification sent via {} to {}", channel, target),
                None => format!("Notification sent via {}", channel),
            }),
            Err(e) => {
                warn!(error = %e, "Error sending notification");
                failure("sending notification", e)
            }
        })
    }
}

/// Plain-text build status.
fn render_build(info: &BuildInfo) -> String {
    let status = match (&info.result, info.building) {
        (_, true) => "BUILDING",
        (Some(result), false) => result.as_str(),
        (None, false) => "UNKNOWN",
    };

    let mut lines = vec![
        format!("Build Status for {} #{}", info.pipeline, info.build),
        format!("Status: {}", status),
    ];
    if let Some(started) = info.timestamp.and_then(DateTime::from_timestamp_millis) {
        lines.push(format!("Started: {}", started.to_rfc3339()));
    }
    if let Some(duration) = info.duration {
        lines.push(format!("Duration: {:.1}s", duration as f64 / 1000.0));
    }
    if let Some(url) = &info.url {
        lines.push(format!("URL: {}", url));
    }
    lines.join("\n")
}
