//! mcp-devops-hub - MCP server for development lifecycle visibility.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};
use devops_hub_core::{RepositoryProvider, Settings};
use devops_hub_github::GitHubClient;
use devops_hub_jenkins::JenkinsClient;
use devops_hub_jira::JiraClient;
use devops_hub_mcp::{Hub, McpServer};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "mcp-devops-hub")]
#[command(author, version, long_about = None)]
#[command(about = "DevOps Visibility Hub - MCP server for Jira, GitHub and Jenkins")]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Path to the TOML config file
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand, Debug, PartialEq)]
enum Commands {
    /// Start the MCP server on stdin/stdout (default)
    Serve,

    /// Inspect configuration
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },

    /// Verify the configured integrations can be reached
    Check,
}

#[derive(Subcommand, Debug, PartialEq)]
enum ConfigCommands {
    /// Show current configuration with secrets masked
    Show,
    /// Print the config file location
    Path,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Stdout carries the protocol, logs go to stderr
    let default_level = if cli.verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    match cli.command.unwrap_or(Commands::Serve) {
        Commands::Serve => serve(cli.config).await,
        Commands::Config { command } => match command {
            ConfigCommands::Show => {
                let settings = Settings::load(cli.config.as_deref())?;
                println!("{}", settings.redacted());
                Ok(())
            }
            ConfigCommands::Path => {
                let path = match cli.config {
                    Some(path) => path,
                    None => Settings::config_path()?,
                };
                println!("{}", path.display());
                Ok(())
            }
        },
        Commands::Check => check(cli.config).await,
    }
}

async fn serve(config: Option<PathBuf>) -> anyhow::Result<()> {
    let settings = Settings::load(config.as_deref()).context("Failed to load settings")?;

    for var in settings.missing_critical() {
        tracing::warn!("{} not set, the matching features are disabled", var);
    }

    eprintln!("Starting DevOps Visibility Hub MCP Server...");

    let hub = Arc::new(Hub::from_settings(&settings));
    let mut server = McpServer::new(hub);
    server.run().await?;
    Ok(())
}

/// One line of `check` output.
fn report(name: &str, outcome: Result<String, String>) -> bool {
    match outcome {
        Ok(detail) => {
            println!("  {:<8} ok      {}", name, detail);
            true
        }
        Err(e) => {
            println!("  {:<8} FAILED  {}", name, e);
            false
        }
    }
}

async fn check(config: Option<PathBuf>) -> anyhow::Result<()> {
    let settings = Settings::load(config.as_deref()).context("Failed to load settings")?;
    let mut healthy = true;

    println!("Checking integrations:");

    match settings.jira() {
        Some(jira) => {
            let outcome = match JiraClient::new(&jira) {
                Ok(client) => client
                    .current_user()
                    .await
                    .map(|user| format!("{} as {}", client.instance_url(), user))
                    .map_err(|e| e.to_string()),
                Err(e) => Err(e.to_string()),
            };
            healthy &= report("jira", outcome);
        }
        None => println!("  {:<8} skipped (not configured)", "jira"),
    }

    match settings.github() {
        Some(github) => {
            let outcome = match GitHubClient::new(&github) {
                Ok(client) => client
                    .authenticated_user()
                    .await
                    .map(|login| format!("authenticated as {}", login))
                    .map_err(|e| e.to_string()),
                Err(e) => Err(e.to_string()),
            };
            healthy &= report("github", outcome);
        }
        None => println!("  {:<8} skipped (not configured)", "github"),
    }

    match settings.jenkins() {
        Some(jenkins) => {
            let outcome = match JenkinsClient::new(&jenkins) {
                Ok(client) => client
                    .verify()
                    .await
                    .map(|version| match version {
                        Some(v) => format!("{} (Jenkins {})", client.base_url(), v),
                        None => client.base_url().to_string(),
                    })
                    .map_err(|e| e.to_string()),
                Err(e) => Err(e.to_string()),
            };
            healthy &= report("jenkins", outcome);
        }
        None => println!("  {:<8} skipped (not configured)", "jenkins"),
    }

    if !healthy {
        anyhow::bail!("One or more integrations failed the check");
    }
    Ok(())
}
