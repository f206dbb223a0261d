//! mcp-devops-hub-demo - walks an MCP session against a spawned server.

use std::path::PathBuf;
use std::process::Stdio;

use anyhow::{bail, Context};
use clap::Parser;
use devops_hub_mcp::protocol::{JsonRpcNotification, JsonRpcRequest, MCP_VERSION};
use devops_hub_mcp::LineTransport;
use serde_json::{json, Value};
use tokio::io::BufReader;
use tokio::process::{ChildStdin, ChildStdout, Command};
use tracing_subscriber::EnvFilter;

const SERVER_BIN: &str = "mcp-devops-hub";

#[derive(Parser, Debug)]
#[command(name = "mcp-devops-hub-demo")]
#[command(author, version, long_about = None)]
#[command(about = "Demo client for the DevOps Visibility Hub MCP server")]
struct Cli {
    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,

    /// Server executable (defaults to the one next to this binary)
    #[arg(long, value_name = "PATH")]
    server: Option<PathBuf>,

    /// Tool to call after listing capabilities
    #[arg(long)]
    tool: Option<String>,

    /// Tool arguments as a JSON object
    #[arg(long, default_value = "{}", requires = "tool")]
    args: String,
}

/// Client half of the session over the child's pipes.
struct Session {
    transport: LineTransport<BufReader<ChildStdout>, ChildStdin>,
    next_id: i64,
}

impl Session {
    /// Send a request and wait for the response with the same id.
    async fn request(&mut self, method: &str, params: Option<Value>) -> anyhow::Result<Value> {
        self.next_id += 1;
        let id = self.next_id;
        self.transport
            .send(&JsonRpcRequest::new(id, method, params))
            .await?;

        loop {
            let message = self
                .transport
                .read_value()
                .await?
                .context("Server closed the connection")?;

            if message.get("id") != Some(&json!(id)) {
                tracing::debug!(message = %message, "Skipping unrelated message");
                continue;
            }
            if let Some(error) = message.get("error") {
                bail!("{} failed: {}", method, error);
            }
            return Ok(message.get("result").cloned().unwrap_or(Value::Null));
        }
    }

    async fn notify(&mut self, method: &str) -> anyhow::Result<()> {
        self.transport
            .send(&JsonRpcNotification::new(method))
            .await?;
        Ok(())
    }
}

fn server_path(explicit: Option<PathBuf>) -> PathBuf {
    if let Some(path) = explicit {
        return path;
    }
    let sibling = std::env::current_exe()
        .ok()
        .and_then(|exe| exe.parent().map(|dir| dir.join(SERVER_BIN)))
        .filter(|path| path.exists());
    sibling.unwrap_or_else(|| PathBuf::from(SERVER_BIN))
}

/// Names listed under `key` in a list result.
fn names(result: &Value, key: &str, field: &str) -> Vec<String> {
    result
        .get(key)
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .filter_map(|item| item.get(field).and_then(Value::as_str))
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default()
}

fn print_section(title: &str, items: &[String]) {
    println!("\n{} ({}):", title, items.len());
    for item in items {
        println!("  - {}", item);
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let tool_args: Value = serde_json::from_str(&cli.args).context("--args is not valid JSON")?;
    if !tool_args.is_object() {
        bail!("--args must be a JSON object");
    }

    let server = server_path(cli.server);
    tracing::info!(server = %server.display(), "Spawning MCP server");

    let mut child = Command::new(&server)
        .arg("serve")
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::inherit())
        .kill_on_drop(true)
        .spawn()
        .with_context(|| format!("Failed to start {}", server.display()))?;

    let stdin = child.stdin.take().context("Server stdin unavailable")?;
    let stdout = child.stdout.take().context("Server stdout unavailable")?;
    let mut session = Session {
        transport: LineTransport::new(BufReader::new(stdout), stdin),
        next_id: 0,
    };

    let init = session
        .request(
            "initialize",
            Some(json!({
                "protocolVersion": MCP_VERSION,
                "capabilities": {},
                "clientInfo": {"name": "mcp-devops-hub-demo", "version": env!("CARGO_PKG_VERSION")}
            })),
        )
        .await?;
    session.notify("notifications/initialized").await?;

    println!(
        "Connected to {} {}",
        init["serverInfo"]["name"].as_str().unwrap_or("server"),
        init["serverInfo"]["version"].as_str().unwrap_or("")
    );

    let tools = session.request("tools/list", None).await?;
    print_section("Tools", &names(&tools, "tools", "name"));

    let templates = session.request("resources/templates/list", None).await?;
    print_section(
        "Resource templates",
        &names(&templates, "resourceTemplates", "uriTemplate"),
    );

    let prompts = session.request("prompts/list", None).await?;
    print_section("Prompts", &names(&prompts, "prompts", "name"));

    if let Some(tool) = cli.tool {
        println!("\nCalling {}...", tool);
        let result = session
            .request(
                "tools/call",
                Some(json!({"name": tool, "arguments": tool_args})),
            )
            .await?;

        if result["isError"].as_bool().unwrap_or(false) {
            println!("Tool reported an error:");
        }
        for block in result["content"].as_array().into_iter().flatten() {
            if let Some(text) = block["text"].as_str() {
                println!("{}", text);
            }
        }
    }

    // Closing stdin ends the server loop
    drop(session);
    let status = child.wait().await?;
    tracing::debug!(status = %status, "Server exited");
    Ok(())
}
