//! Integration clients shared by tools, resources and prompts.
//!
//! The hub is built once at startup. Every integration is optional: a client
//! whose settings are missing or fail to build is left out, and any operation
//! that needs it fails with [`Error::NotConfigured`].

use std::sync::Arc;

use chrono::Utc;
use devops_hub_core::{
    BuildProvider, CompletionProvider, Error, Notifier, RepositoryProvider, Result, Settings,
    SprintProvider,
};
use devops_hub_github::GitHubClient;
use devops_hub_groq::GroqClient;
use devops_hub_insights::{completed_points, BurndownForecast, SprintSummary};
use devops_hub_jenkins::JenkinsClient;
use devops_hub_jira::JiraClient;
use devops_hub_notify::{SlackNotifier, TeamsNotifier};
use tracing::{debug, info, warn};

/// Number of closed sprints averaged into the team velocity.
pub const VELOCITY_SPRINTS: u32 = 3;

/// Optional clients for each integration.
#[derive(Default, Clone)]
pub struct Hub {
    jira: Option<Arc<dyn SprintProvider>>,
    github: Option<Arc<dyn RepositoryProvider>>,
    jenkins: Option<Arc<dyn BuildProvider>>,
    llm: Option<Arc<dyn CompletionProvider>>,
    notifiers: Vec<Arc<dyn Notifier>>,
}

/// Log a client that could not be built and leave it out.
fn build_client<T>(name: &str, result: Result<T>) -> Option<T> {
    match result {
        Ok(client) => {
            info!(integration = name, "Integration enabled");
            Some(client)
        }
        Err(e) => {
            warn!(integration = name, error = %e, "Failed to create client");
            None
        }
    }
}

impl Hub {
    /// Build every integration that has settings.
    pub fn from_settings(settings: &Settings) -> Self {
        let mut hub = Hub::default();

        if let Some(jira) = settings.jira() {
            hub.jira = build_client("jira", JiraClient::new(&jira))
                .map(|c| Arc::new(c) as Arc<dyn SprintProvider>);
        }
        if let Some(github) = settings.github() {
            hub.github = build_client("github", GitHubClient::new(&github))
                .map(|c| Arc::new(c) as Arc<dyn RepositoryProvider>);
        }
        if let Some(jenkins) = settings.jenkins() {
            hub.jenkins = build_client("jenkins", JenkinsClient::new(&jenkins))
                .map(|c| Arc::new(c) as Arc<dyn BuildProvider>);
        }
        if let Some(groq) = settings.groq() {
            hub.llm = build_client("groq", GroqClient::new(&groq))
                .map(|c| Arc::new(c) as Arc<dyn CompletionProvider>);
        }
        if let Some(slack) = settings.slack() {
            if let Some(notifier) = build_client("slack", SlackNotifier::new(&slack)) {
                hub.notifiers.push(Arc::new(notifier));
            }
        }
        if let Some(webhook) = settings.teams_webhook() {
            if let Some(notifier) = build_client("teams", TeamsNotifier::new(webhook)) {
                hub.notifiers.push(Arc::new(notifier));
            }
        }

        hub
    }

    pub fn with_jira(mut self, provider: Arc<dyn SprintProvider>) -> Self {
        self.jira = Some(provider);
        self
    }

    pub fn with_github(mut self, provider: Arc<dyn RepositoryProvider>) -> Self {
        self.github = Some(provider);
        self
    }

    pub fn with_jenkins(mut self, provider: Arc<dyn BuildProvider>) -> Self {
        self.jenkins = Some(provider);
        self
    }

    pub fn with_llm(mut self, provider: Arc<dyn CompletionProvider>) -> Self {
        self.llm = Some(provider);
        self
    }

    pub fn with_notifier(mut self, notifier: Arc<dyn Notifier>) -> Self {
        self.notifiers.push(notifier);
        self
    }

    pub fn jira(&self) -> Result<&dyn SprintProvider> {
        self.jira
            .as_deref()
            .ok_or_else(|| Error::NotConfigured("Jira".to_string()))
    }

    pub fn github(&self) -> Result<&dyn RepositoryProvider> {
        self.github
            .as_deref()
            .ok_or_else(|| Error::NotConfigured("GitHub".to_string()))
    }

    pub fn jenkins(&self) -> Result<&dyn BuildProvider> {
        self.jenkins
            .as_deref()
            .ok_or_else(|| Error::NotConfigured("Jenkins".to_string()))
    }

    pub fn llm(&self) -> Result<&dyn CompletionProvider> {
        self.llm
            .as_deref()
            .ok_or_else(|| Error::NotConfigured("Groq".to_string()))
    }

    /// Notifier registered under `channel` ("slack" or "teams").
    pub fn notifier(&self, channel: &str) -> Result<&dyn Notifier> {
        self.notifiers
            .iter()
            .find(|n| n.name().eq_ignore_ascii_case(channel))
            .map(|n| n.as_ref())
            .ok_or_else(|| Error::NotConfigured(channel.to_string()))
    }

    /// Names of the enabled integrations.
    pub fn enabled(&self) -> Vec<&'static str> {
        let mut names = Vec::new();
        if self.jira.is_some() {
            names.push("jira");
        }
        if self.github.is_some() {
            names.push("github");
        }
        if self.jenkins.is_some() {
            names.push("jenkins");
        }
        if self.llm.is_some() {
            names.push("groq");
        }
        names.extend(self.notifiers.iter().map(|n| n.name()));
        names
    }

    /// Text report of one sprint.
    pub async fn sprint_report(&self, project_key: &str, sprint_id: u64) -> Result<String> {
        let tasks = self.jira()?.get_sprint_tasks(project_key, sprint_id).await?;
        Ok(SprintSummary::from_tasks(&tasks).render_report(project_key, sprint_id))
    }

    /// Burndown forecast of one sprint from the velocity of the last closed sprints.
    pub async fn burndown(&self, project_key: &str, sprint_id: u64) -> Result<BurndownForecast> {
        let jira = self.jira()?;

        let sprint = jira
            .get_sprint(sprint_id)
            .await?
            .ok_or_else(|| Error::NotFound(format!("Sprint {} not found", sprint_id)))?;
        let tasks = jira.get_sprint_tasks(project_key, sprint_id).await?;

        let past = jira
            .get_completed_sprints(project_key, VELOCITY_SPRINTS)
            .await?;
        let mut velocities = Vec::with_capacity(past.len());
        for past_sprint in &past {
            let past_tasks = jira.get_sprint_tasks(project_key, past_sprint.id).await?;
            velocities.push(completed_points(&past_tasks));
        }
        debug!(sprint = sprint_id, velocities = ?velocities, "Sprint velocities");

        Ok(BurndownForecast::compute(
            &tasks,
            &velocities,
            sprint.end_date,
            Utc::now(),
        ))
    }
}
