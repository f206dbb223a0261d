//! Jira integration for mcp-devops-hub.
//!
//! Reads sprint tasks through the Jira REST search API and sprint metadata
//! through the Jira Agile API. Supports both Jira Cloud (REST v3) and Jira
//! Self-Hosted/Data Center (REST v2).

mod client;
mod types;

pub use client::{JiraClient, JiraFlavor};
pub use types::*;
