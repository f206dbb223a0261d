//! Settings for mcp-devops-hub.
//!
//! Values are layered, lowest precedence first:
//!
//! 1. Built-in defaults
//! 2. Optional TOML file (`~/.config/devops-hub/config.toml` on Linux,
//!    `%APPDATA%\devops-hub\config.toml` on Windows)
//! 3. A `.env` file in the working directory
//! 4. Process environment variables prefixed with `DEVOPS_HUB_`
//!
//! Every credential is optional. A missing credential disables the matching
//! integration instead of failing startup.
//!
//! # Example
//!
//! ```ignore
//! use devops_hub_core::Settings;
//!
//! let settings = Settings::load(None)?;
//! if let Some(jira) = settings.jira() {
//!     println!("Jira at {}", jira.url);
//! }
//! ```

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::{Error, Result, Secret};

/// Prefix shared by every environment variable the hub reads.
pub const ENV_PREFIX: &str = "DEVOPS_HUB_";

/// Config file name.
const CONFIG_FILE_NAME: &str = "config.toml";

/// Config directory name.
const CONFIG_DIR_NAME: &str = "devops-hub";

const DEFAULT_JIRA_BOARD_ID: u64 = 1;
const DEFAULT_STORY_POINTS_FIELD: &str = "customfield_10026";
const DEFAULT_GROQ_BASE_URL: &str = "https://api.groq.com/openai/v1";
const DEFAULT_GROQ_MODEL: &str = "mixtral-8x7b-32768";
const DEFAULT_GROQ_MAX_TOKENS: u32 = 32768;
const DEFAULT_GROQ_TEMPERATURE: f32 = 0.7;

// =============================================================================
// Settings
// =============================================================================

/// Flat settings, one field per `DEVOPS_HUB_*` variable.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    // Jira
    pub jira_url: Option<String>,
    pub jira_username: Option<String>,
    pub jira_api_token: Option<Secret>,
    pub jira_board_id: u64,
    pub jira_story_points_field: String,

    // GitHub
    pub github_token: Option<Secret>,
    pub github_base_url: Option<String>,

    // CI/CD
    pub jenkins_url: Option<String>,
    pub jenkins_username: Option<String>,
    pub jenkins_token: Option<Secret>,

    // Notifications
    pub slack_bot_token: Option<Secret>,
    pub slack_default_channel: Option<String>,
    pub teams_default_webhook: Option<Secret>,

    // Generic LLM backend
    pub llm_api_key: Option<Secret>,
    pub llm_model_name: Option<String>,

    // Groq
    pub groq_api_key: Option<Secret>,
    pub groq_base_url: String,
    pub groq_model_name: String,
    pub groq_max_tokens: u32,
    pub groq_temperature: f32,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            jira_url: None,
            jira_username: None,
            jira_api_token: None,
            jira_board_id: DEFAULT_JIRA_BOARD_ID,
            jira_story_points_field: DEFAULT_STORY_POINTS_FIELD.to_string(),
            github_token: None,
            github_base_url: None,
            jenkins_url: None,
            jenkins_username: None,
            jenkins_token: None,
            slack_bot_token: None,
            slack_default_channel: None,
            teams_default_webhook: None,
            llm_api_key: None,
            llm_model_name: None,
            groq_api_key: None,
            groq_base_url: DEFAULT_GROQ_BASE_URL.to_string(),
            groq_model_name: DEFAULT_GROQ_MODEL.to_string(),
            groq_max_tokens: DEFAULT_GROQ_MAX_TOKENS,
            groq_temperature: DEFAULT_GROQ_TEMPERATURE,
        }
    }
}

// =============================================================================
// Integration views
// =============================================================================

/// Complete Jira credentials.
#[derive(Debug, Clone)]
pub struct JiraSettings {
    pub url: String,
    pub username: String,
    pub api_token: Secret,
    pub board_id: u64,
    pub story_points_field: String,
}

/// GitHub credentials. `base_url` is set for GitHub Enterprise.
#[derive(Debug, Clone)]
pub struct GitHubSettings {
    pub token: Secret,
    pub base_url: Option<String>,
}

/// Complete Jenkins credentials.
#[derive(Debug, Clone)]
pub struct JenkinsSettings {
    pub url: String,
    pub username: String,
    pub token: Secret,
}

/// Chat-completion backend settings.
#[derive(Debug, Clone)]
pub struct GroqSettings {
    pub api_key: Secret,
    pub base_url: String,
    pub model: String,
    pub max_tokens: u32,
    pub temperature: f32,
}

/// Slack bot credentials.
#[derive(Debug, Clone)]
pub struct SlackSettings {
    pub bot_token: Secret,
    pub default_channel: Option<String>,
}

impl Settings {
    /// Get the configuration directory path.
    pub fn config_dir() -> Result<PathBuf> {
        dirs::config_dir()
            .map(|p| p.join(CONFIG_DIR_NAME))
            .ok_or_else(|| Error::Config("Could not determine config directory".to_string()))
    }

    /// Get the default configuration file path.
    pub fn config_path() -> Result<PathBuf> {
        Ok(Self::config_dir()?.join(CONFIG_FILE_NAME))
    }

    /// Load settings from every layer.
    ///
    /// `path` overrides the default TOML location.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let path = match path {
            Some(p) => p.to_path_buf(),
            None => Self::config_path()?,
        };

        let mut settings = Self::load_from(&path)?;
        hydrate_env_file()?;
        settings.apply_env(std::env::vars())?;
        Ok(settings)
    }

    /// Load settings from a TOML file only.
    ///
    /// Returns defaults if the file doesn't exist.
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            debug!(path = ?path, "Config file does not exist, using defaults");
            return Ok(Self::default());
        }

        debug!(path = ?path, "Loading config");

        let contents = std::fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("Failed to read config file: {}", e)))?;

        let mut settings: Settings = toml::from_str(&contents)
            .map_err(|e| Error::Config(format!("Failed to parse config file: {}", e)))?;
        settings.clear_blank();

        info!(path = ?path, "Config loaded successfully");
        Ok(settings)
    }

    /// Treat blank file values the same as absent keys.
    fn clear_blank(&mut self) {
        for value in [
            &mut self.jira_url,
            &mut self.jira_username,
            &mut self.github_base_url,
            &mut self.jenkins_url,
            &mut self.jenkins_username,
            &mut self.slack_default_channel,
            &mut self.llm_model_name,
        ] {
            *value = non_blank(value);
        }

        for secret in [
            &mut self.jira_api_token,
            &mut self.github_token,
            &mut self.jenkins_token,
            &mut self.slack_bot_token,
            &mut self.teams_default_webhook,
            &mut self.llm_api_key,
            &mut self.groq_api_key,
        ] {
            if matches!(secret, Some(s) if s.expose().trim().is_empty()) {
                *secret = None;
            }
        }

        for (value, default) in [
            (&mut self.jira_story_points_field, DEFAULT_STORY_POINTS_FIELD),
            (&mut self.groq_base_url, DEFAULT_GROQ_BASE_URL),
            (&mut self.groq_model_name, DEFAULT_GROQ_MODEL),
        ] {
            if value.trim().is_empty() {
                *value = default.to_string();
            }
        }
    }

    /// Overlay `DEVOPS_HUB_*` variables onto these settings.
    ///
    /// Keys are matched case-insensitively, blank values are ignored and
    /// unknown keys are skipped.
    pub fn apply_env<I, K, V>(&mut self, vars: I) -> Result<()>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        for (key, value) in vars {
            let key = key.as_ref().to_ascii_uppercase();
            let Some(field) = key.strip_prefix(ENV_PREFIX) else {
                continue;
            };
            let value = value.as_ref().trim();
            if value.is_empty() {
                continue;
            }
            self.set_field(field, value)?;
        }
        Ok(())
    }

    fn set_field(&mut self, field: &str, value: &str) -> Result<()> {
        let text = || Some(value.to_string());
        let secret = || Some(Secret::new(value));

        match field {
            "JIRA_URL" => self.jira_url = text(),
            "JIRA_USERNAME" => self.jira_username = text(),
            "JIRA_API_TOKEN" => self.jira_api_token = secret(),
            "JIRA_BOARD_ID" => self.jira_board_id = parse_number(field, value)?,
            "JIRA_STORY_POINTS_FIELD" => self.jira_story_points_field = value.to_string(),
            "GITHUB_TOKEN" => self.github_token = secret(),
            "GITHUB_BASE_URL" => self.github_base_url = text(),
            "JENKINS_URL" => self.jenkins_url = text(),
            "JENKINS_USERNAME" => self.jenkins_username = text(),
            "JENKINS_TOKEN" => self.jenkins_token = secret(),
            "SLACK_BOT_TOKEN" => self.slack_bot_token = secret(),
            "SLACK_DEFAULT_CHANNEL" => self.slack_default_channel = text(),
            "TEAMS_DEFAULT_WEBHOOK" => self.teams_default_webhook = secret(),
            "LLM_API_KEY" => self.llm_api_key = secret(),
            "LLM_MODEL_NAME" => self.llm_model_name = text(),
            "GROQ_API_KEY" => self.groq_api_key = secret(),
            "GROQ_BASE_URL" => self.groq_base_url = value.to_string(),
            "GROQ_MODEL_NAME" => self.groq_model_name = value.to_string(),
            "GROQ_MAX_TOKENS" => self.groq_max_tokens = parse_number(field, value)?,
            "GROQ_TEMPERATURE" => self.groq_temperature = parse_number(field, value)?,
            other => debug!(key = other, "Ignoring unknown setting"),
        }
        Ok(())
    }

    /// Jira settings, if url, username and token are all present.
    pub fn jira(&self) -> Option<JiraSettings> {
        Some(JiraSettings {
            url: non_blank(&self.jira_url)?,
            username: non_blank(&self.jira_username)?,
            api_token: self.jira_api_token.clone()?,
            board_id: self.jira_board_id,
            story_points_field: self.jira_story_points_field.clone(),
        })
    }

    /// GitHub settings, if a token is present.
    pub fn github(&self) -> Option<GitHubSettings> {
        Some(GitHubSettings {
            token: self.github_token.clone()?,
            base_url: non_blank(&self.github_base_url),
        })
    }

    /// Jenkins settings, if url, username and token are all present.
    pub fn jenkins(&self) -> Option<JenkinsSettings> {
        Some(JenkinsSettings {
            url: non_blank(&self.jenkins_url)?,
            username: non_blank(&self.jenkins_username)?,
            token: self.jenkins_token.clone()?,
        })
    }

    /// Completion backend settings.
    ///
    /// Uses the Groq key when present, otherwise the generic LLM key with
    /// `LLM_MODEL_NAME` taking precedence over the Groq model name.
    pub fn groq(&self) -> Option<GroqSettings> {
        let (api_key, model) = match (&self.groq_api_key, &self.llm_api_key) {
            (Some(key), _) => (key.clone(), self.groq_model_name.clone()),
            (None, Some(key)) => (
                key.clone(),
                non_blank(&self.llm_model_name).unwrap_or_else(|| self.groq_model_name.clone()),
            ),
            (None, None) => return None,
        };

        Some(GroqSettings {
            api_key,
            base_url: self.groq_base_url.clone(),
            model,
            max_tokens: self.groq_max_tokens,
            temperature: self.groq_temperature,
        })
    }

    /// Slack settings, if a bot token is present.
    pub fn slack(&self) -> Option<SlackSettings> {
        Some(SlackSettings {
            bot_token: self.slack_bot_token.clone()?,
            default_channel: non_blank(&self.slack_default_channel),
        })
    }

    /// Default Teams incoming webhook.
    pub fn teams_webhook(&self) -> Option<Secret> {
        self.teams_default_webhook.clone()
    }

    /// Names of enabled integrations in a fixed order.
    pub fn configured_integrations(&self) -> Vec<&'static str> {
        let mut names = Vec::new();
        if self.jira().is_some() {
            names.push("jira");
        }
        if self.github().is_some() {
            names.push("github");
        }
        if self.jenkins().is_some() {
            names.push("jenkins");
        }
        if self.groq().is_some() {
            names.push("groq");
        }
        if self.slack().is_some() {
            names.push("slack");
        }
        if self.teams_webhook().is_some() {
            names.push("teams");
        }
        names
    }

    /// Credentials the server warns about when they are absent.
    pub fn missing_critical(&self) -> Vec<String> {
        let mut missing = Vec::new();
        if self.jira_api_token.is_none() {
            missing.push(format!("{}JIRA_API_TOKEN", ENV_PREFIX));
        }
        if self.github_token.is_none() {
            missing.push(format!("{}GITHUB_TOKEN", ENV_PREFIX));
        }
        if self.groq_api_key.is_none() {
            missing.push(format!("{}GROQ_API_KEY", ENV_PREFIX));
        }
        missing
    }

    /// Human-readable summary with secrets masked.
    pub fn redacted(&self) -> String {
        fn show(value: &Option<String>) -> String {
            value.clone().unwrap_or_else(|| "(not set)".to_string())
        }
        fn mask(value: &Option<Secret>) -> String {
            value
                .as_ref()
                .map(|s| s.to_string())
                .unwrap_or_else(|| "(not set)".to_string())
        }

        let integrations = self.configured_integrations();
        let enabled = if integrations.is_empty() {
            "(none)".to_string()
        } else {
            integrations.join(", ")
        };

        [
            "[jira]".to_string(),
            format!("  url             = {}", show(&self.jira_url)),
            format!("  username        = {}", show(&self.jira_username)),
            format!("  api_token       = {}", mask(&self.jira_api_token)),
            format!("  board_id        = {}", self.jira_board_id),
            format!("  story_points    = {}", self.jira_story_points_field),
            "[github]".to_string(),
            format!("  token           = {}", mask(&self.github_token)),
            format!("  base_url        = {}", show(&self.github_base_url)),
            "[jenkins]".to_string(),
            format!("  url             = {}", show(&self.jenkins_url)),
            format!("  username        = {}", show(&self.jenkins_username)),
            format!("  token           = {}", mask(&self.jenkins_token)),
            "[notifications]".to_string(),
            format!("  slack_bot_token = {}", mask(&self.slack_bot_token)),
            format!("  slack_channel   = {}", show(&self.slack_default_channel)),
            format!("  teams_webhook   = {}", mask(&self.teams_default_webhook)),
            "[llm]".to_string(),
            format!("  api_key         = {}", mask(&self.llm_api_key)),
            format!("  model           = {}", show(&self.llm_model_name)),
            "[groq]".to_string(),
            format!("  api_key         = {}", mask(&self.groq_api_key)),
            format!("  base_url        = {}", self.groq_base_url),
            format!("  model           = {}", self.groq_model_name),
            format!("  max_tokens      = {}", self.groq_max_tokens),
            format!("  temperature     = {}", self.groq_temperature),
            String::new(),
            format!("Enabled integrations: {}", enabled),
        ]
        .join("\n")
    }
}

/// Load `.env` from the working directory into the process environment.
///
/// A missing file is fine; existing process variables are not overridden.
fn hydrate_env_file() -> Result<()> {
    match dotenvy::dotenv() {
        Ok(path) => {
            debug!(path = ?path, "Loaded .env file");
            Ok(())
        }
        Err(dotenvy::Error::Io(err)) if err.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(err) => Err(Error::Config(format!("Failed to load .env file: {}", err))),
    }
}

fn parse_number<T>(field: &str, value: &str) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    value.parse().map_err(|e| {
        Error::Config(format!(
            "Invalid value '{}' for {}{}: {}",
            value, ENV_PREFIX, field, e
        ))
    })
}

fn non_blank(value: &Option<String>) -> Option<String> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::NamedTempFile;

    fn settings_from(vars: &[(&str, &str)]) -> Settings {
        let mut settings = Settings::default();
        settings.apply_env(vars.iter().copied()).unwrap();
        settings
    }

    #[test]
    fn test_defaults() {
        let settings = Settings::default();
        assert_eq!(settings.groq_model_name, "mixtral-8x7b-32768");
        assert_eq!(settings.groq_max_tokens, 32768);
        assert!((settings.groq_temperature - 0.7).abs() < f32::EPSILON);
        assert_eq!(settings.jira_board_id, 1);
        assert_eq!(settings.jira_story_points_field, "customfield_10026");
        assert!(settings.configured_integrations().is_empty());
    }

    #[test]
    fn test_apply_env_sets_fields() {
        let settings = settings_from(&[
            ("DEVOPS_HUB_JIRA_URL", "https://acme.atlassian.net"),
            ("DEVOPS_HUB_JIRA_USERNAME", "dev@acme.io"),
            ("DEVOPS_HUB_JIRA_API_TOKEN", "jira-token"),
            ("DEVOPS_HUB_GROQ_MAX_TOKENS", "1024"),
            ("DEVOPS_HUB_GROQ_TEMPERATURE", "0.25"),
            ("UNRELATED", "ignored"),
        ]);

        let jira = settings.jira().unwrap();
        assert_eq!(jira.url, "https://acme.atlassian.net");
        assert_eq!(jira.username, "dev@acme.io");
        assert_eq!(jira.api_token.expose(), "jira-token");
        assert_eq!(settings.groq_max_tokens, 1024);
        assert!((settings.groq_temperature - 0.25).abs() < f32::EPSILON);
    }

    #[test]
    fn test_apply_env_is_case_insensitive_and_skips_blank() {
        let settings = settings_from(&[
            ("devops_hub_github_token", "ghp_x"),
            ("DEVOPS_HUB_GITHUB_BASE_URL", "   "),
        ]);
        let github = settings.github().unwrap();
        assert_eq!(github.token.expose(), "ghp_x");
        assert!(github.base_url.is_none());
    }

    #[test]
    fn test_invalid_number_names_variable() {
        let mut settings = Settings::default();
        let err = settings
            .apply_env([("DEVOPS_HUB_GROQ_MAX_TOKENS", "lots")])
            .unwrap_err();
        assert!(err.to_string().contains("DEVOPS_HUB_GROQ_MAX_TOKENS"));
    }

    #[test]
    fn test_partial_jira_is_disabled() {
        let settings = settings_from(&[
            ("DEVOPS_HUB_JIRA_URL", "https://jira.example.com"),
            ("DEVOPS_HUB_JIRA_API_TOKEN", "t"),
        ]);
        assert!(settings.jira().is_none());
        assert!(!settings.configured_integrations().contains(&"jira"));
    }

    #[test]
    fn test_partial_jenkins_is_disabled() {
        let settings = settings_from(&[
            ("DEVOPS_HUB_JENKINS_URL", "https://ci.example.com"),
            ("DEVOPS_HUB_JENKINS_USERNAME", "bot"),
        ]);
        assert!(settings.jenkins().is_none());
    }

    #[test]
    fn test_groq_prefers_groq_key() {
        let settings = settings_from(&[
            ("DEVOPS_HUB_GROQ_API_KEY", "gsk_1"),
            ("DEVOPS_HUB_LLM_API_KEY", "llm_1"),
            ("DEVOPS_HUB_LLM_MODEL_NAME", "other-model"),
        ]);
        let groq = settings.groq().unwrap();
        assert_eq!(groq.api_key.expose(), "gsk_1");
        assert_eq!(groq.model, "mixtral-8x7b-32768");
    }

    #[test]
    fn test_groq_falls_back_to_llm_key() {
        let settings = settings_from(&[
            ("DEVOPS_HUB_LLM_API_KEY", "llm_1"),
            ("DEVOPS_HUB_LLM_MODEL_NAME", "llama-3.1-8b-instant"),
        ]);
        let groq = settings.groq().unwrap();
        assert_eq!(groq.api_key.expose(), "llm_1");
        assert_eq!(groq.model, "llama-3.1-8b-instant");
    }

    #[test]
    fn test_configured_integrations_order() {
        let settings = settings_from(&[
            ("DEVOPS_HUB_TEAMS_DEFAULT_WEBHOOK", "https://outlook.office.com/webhook/x"),
            ("DEVOPS_HUB_GITHUB_TOKEN", "ghp"),
            ("DEVOPS_HUB_SLACK_BOT_TOKEN", "xoxb"),
            ("DEVOPS_HUB_GROQ_API_KEY", "gsk"),
        ]);
        assert_eq!(
            settings.configured_integrations(),
            vec!["github", "groq", "slack", "teams"]
        );
    }

    #[test]
    fn test_missing_critical() {
        let settings = settings_from(&[("DEVOPS_HUB_GITHUB_TOKEN", "ghp")]);
        assert_eq!(
            settings.missing_critical(),
            vec![
                "DEVOPS_HUB_JIRA_API_TOKEN".to_string(),
                "DEVOPS_HUB_GROQ_API_KEY".to_string()
            ]
        );
    }

    #[test]
    fn test_redacted_masks_secrets() {
        let settings = settings_from(&[
            ("DEVOPS_HUB_GITHUB_TOKEN", "ghp_super_secret"),
            ("DEVOPS_HUB_JIRA_URL", "https://jira.example.com"),
        ]);
        let text = settings.redacted();
        assert!(!text.contains("ghp_super_secret"));
        assert!(text.contains("********"));
        assert!(text.contains("https://jira.example.com"));
        assert!(text.contains("Enabled integrations: github"));
    }

    #[test]
    fn test_load_from_toml_then_env_overrides() {
        let file = NamedTempFile::new().unwrap();
        std::fs::write(
            file.path(),
            "jira_url = \"https://file.example.com\"\ngroq_model_name = \"llama3-70b-8192\"\n",
        )
        .unwrap();

        let mut settings = Settings::load_from(file.path()).unwrap();
        assert_eq!(
            settings.jira_url.as_deref(),
            Some("https://file.example.com")
        );
        assert_eq!(settings.groq_model_name, "llama3-70b-8192");
        // Defaults survive for keys absent from the file
        assert_eq!(settings.groq_max_tokens, 32768);

        settings
            .apply_env([("DEVOPS_HUB_JIRA_URL", "https://env.example.com")])
            .unwrap();
        assert_eq!(
            settings.jira_url.as_deref(),
            Some("https://env.example.com")
        );
    }

    #[test]
    fn test_load_from_treats_blank_values_as_unset() {
        let file = NamedTempFile::new().unwrap();
        std::fs::write(
            file.path(),
            "jira_url = \"https://acme.atlassian.net\"\n\
             jira_username = \"bot\"\n\
             jira_api_token = \"\"\n\
             github_token = \"  \"\n\
             slack_default_channel = \" \"\n\
             groq_model_name = \"\"\n",
        )
        .unwrap();

        let settings = Settings::load_from(file.path()).unwrap();
        assert!(settings.jira_api_token.is_none());
        assert!(settings.jira().is_none());
        assert!(settings.github().is_none());
        assert!(settings.slack_default_channel.is_none());
        assert_eq!(settings.groq_model_name, DEFAULT_GROQ_MODEL);
        assert_eq!(
            settings.missing_critical(),
            vec![
                "DEVOPS_HUB_JIRA_API_TOKEN",
                "DEVOPS_HUB_GITHUB_TOKEN",
                "DEVOPS_HUB_GROQ_API_KEY",
            ]
        );
    }

    #[test]
    fn test_load_nonexistent() {
        let settings = Settings::load_from(Path::new("/nonexistent/path/config.toml")).unwrap();
        assert!(settings.jira_url.is_none());
    }

    #[test]
    fn test_load_invalid_toml() {
        let file = NamedTempFile::new().unwrap();
        std::fs::write(file.path(), "jira_url = [not valid").unwrap();
        assert!(matches!(
            Settings::load_from(file.path()),
            Err(Error::Config(_))
        ));
    }
}
