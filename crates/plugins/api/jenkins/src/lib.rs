//! Jenkins integration for mcp-devops-hub.
//!
//! Reads build and job status through the Jenkins JSON API. Jobs inside
//! folders are addressed with `/`-separated names such as `team/service`.

mod client;
mod types;

pub use client::JenkinsClient;
pub use types::*;
