//! Prompt templates.

use std::sync::Arc;

use serde_json::Value;
use tracing::{info, warn};

use crate::handlers::{required_str, required_u64};
use crate::hub::Hub;
use crate::protocol::{
    GetPromptParams, GetPromptResult, PromptArgument, PromptDefinition, PromptMessage,
};

pub const SPRINT_RETROSPECTIVE: &str = "sprint_retrospective_guidance";

const RETROSPECTIVE_STRUCTURE: &str =
    "Based on the sprint data, let's structure our retrospective discussion:

1. Successes 🌟
   - What went particularly well this sprint?
   - Which tasks were completed ahead of schedule?
   - What positive team dynamics did you observe?

2. Challenges 🤔
   - What obstacles did we encounter?
   - Were there any unexpected delays?
   - Did we have all the resources needed?

3. Learning Opportunities 📚
   - What could we have done differently?
   - What processes need improvement?
   - What skills or knowledge gaps did we identify?

4. Action Items 📋
   - What specific changes should we implement?
   - Who will be responsible for each action item?
   - When will we review progress on these items?

Let's start with successes. What achievements should we celebrate from this sprint?";

/// Serves the prompt templates.
pub struct PromptHandler {
    hub: Arc<Hub>,
}

impl PromptHandler {
    pub fn new(hub: Arc<Hub>) -> Self {
        Self { hub }
    }

    pub fn available_prompts(&self) -> Vec<PromptDefinition> {
        vec![PromptDefinition {
            name: SPRINT_RETROSPECTIVE.to_string(),
            description: "Guides a structured sprint retrospective discussion.".to_string(),
            arguments: vec![
                PromptArgument {
                    name: "project_key".to_string(),
                    description: "Jira project key".to_string(),
                    required: true,
                },
                PromptArgument {
                    name: "sprint_id".to_string(),
                    description: "Jira sprint ID".to_string(),
                    required: true,
                },
            ],
        }]
    }

    /// Render a prompt. Unknown names and bad arguments are errors for the caller.
    pub async fn get(&self, params: GetPromptParams) -> Result<GetPromptResult, String> {
        match params.name.as_str() {
            SPRINT_RETROSPECTIVE => {
                let args = Value::Object(params.arguments.into_iter().collect());
                let project_key = required_str(&args, "project_key")?;
                let sprint_id = required_u64(&args, "sprint_id")?;
                Ok(self.sprint_retrospective(&project_key, sprint_id).await)
            }
            other => Err(format!("Unknown prompt: {}", other)),
        }
    }

    async fn sprint_retrospective(&self, project_key: &str, sprint_id: u64) -> GetPromptResult {
        info!(
            project = project_key,
            sprint = sprint_id,
            "Generating retrospective guidance"
        );

        let data = async {
            let report = self.hub.sprint_report(project_key, sprint_id).await?;
            let burndown = self.hub.burndown(project_key, sprint_id).await?;
            Ok::<_, devops_hub_core::Error>((report, burndown.render(project_key, sprint_id)))
        };

        let messages = match data.await {
            Ok((report, burndown)) => vec![
                PromptMessage::user(format!(
                    "Let's start the retrospective for sprint {} in project {}.\n\n\
                     Sprint Summary:\n{}\n\nBurndown Analysis:\n{}",
                    sprint_id, project_key, report, burndown
                )),
                PromptMessage::assistant(RETROSPECTIVE_STRUCTURE),
                PromptMessage::user("Please share your thoughts on our successes this sprint."),
            ],
            Err(e) => {
                warn!(error = %e, "Error generating retrospective guidance");
                vec![
                    PromptMessage::user(
                        "An error occurred while preparing the retrospective guidance.",
                    ),
                    PromptMessage::assistant(format!(
                        "I encountered an error: {}\n\
                         Let's proceed with a basic retrospective format instead.",
                        e
                    )),
                ]
            }
        };

        GetPromptResult {
            description: Some(format!(
                "Retrospective for {} sprint {}",
                project_key, sprint_id
            )),
            messages,
        }
    }
}
