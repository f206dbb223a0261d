//! Groq integration for mcp-devops-hub.
//!
//! Talks to the OpenAI-compatible chat completions endpoint. Any other
//! compatible backend can be used by overriding the base URL.

mod client;
mod types;

pub use client::GroqClient;
pub use types::*;
