//! MCP (Model Context Protocol) server for mcp-devops-hub.
//!
//! Exposes sprint, repository, build and LLM functionality to AI assistants
//! as MCP tools, resources and prompts.

pub mod handlers;
pub mod hub;
pub mod prompts;
pub mod protocol;
pub mod resources;
pub mod server;
pub mod transport;

pub use hub::Hub;
pub use server::McpServer;
pub use transport::{IncomingMessage, LineTransport};
