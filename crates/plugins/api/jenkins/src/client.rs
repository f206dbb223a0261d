//! Jenkins API client implementation.

use async_trait::async_trait;
use devops_hub_core::{BuildInfo, BuildProvider, Error, JenkinsSettings, Result};
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use crate::types::JenkinsBuild;

/// Jenkins API client.
pub struct JenkinsClient {
    base_url: String,
    username: String,
    token: String,
    client: reqwest::Client,
}

impl JenkinsClient {
    /// Create a Jenkins client from settings.
    pub fn new(settings: &JenkinsSettings) -> Result<Self> {
        Self::with_credentials(&settings.url, &settings.username, settings.token.expose())
    }

    pub fn with_credentials(
        base_url: impl Into<String>,
        username: impl Into<String>,
        token: impl Into<String>,
    ) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent("mcp-devops-hub")
            .build()
            .map_err(|e| Error::Http(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            username: username.into(),
            token: token.into(),
            client,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Check the server answers with these credentials. Returns the Jenkins
    /// version when the server reports one.
    pub async fn verify(&self) -> Result<Option<String>> {
        let url = format!("{}/api/json", self.base_url);
        debug!(url = url, "Jenkins connection check");

        let response = self
            .client
            .get(&url)
            .basic_auth(&self.username, Some(&self.token))
            .send()
            .await
            .map_err(|e| Error::Http(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(Error::from_status(status.as_u16(), message));
        }

        Ok(response
            .headers()
            .get("X-Jenkins")
            .and_then(|v| v.to_str().ok())
            .map(str::to_string))
    }

    /// GET a JSON document. Error statuses are logged and yield `None`.
    async fn get_optional<T: DeserializeOwned>(&self, url: &str) -> Result<Option<T>> {
        debug!(url = url, "Jenkins GET request");

        let response = self
            .client
            .get(url)
            .basic_auth(&self.username, Some(&self.token))
            .send()
            .await
            .map_err(|e| Error::Http(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            warn!(
                status = status.as_u16(),
                message = message,
                url = url,
                "Jenkins API error response"
            );
            return Ok(None);
        }

        response
            .json()
            .await
            .map(Some)
            .map_err(|e| Error::InvalidData(format!("Failed to parse response: {}", e)))
    }
}

/// Turn a `/`-separated job name into its URL path: `a/b` -> `/job/a/job/b`.
fn job_path(pipeline: &str) -> String {
    pipeline
        .split('/')
        .filter(|segment| !segment.is_empty())
        .map(|segment| format!("/job/{}", segment))
        .collect()
}

#[async_trait]
impl BuildProvider for JenkinsClient {
    async fn get_build_info(&self, pipeline: &str, build: &str) -> Result<Option<BuildInfo>> {
        let url = format!("{}{}/{}/api/json", self.base_url, job_path(pipeline), build);
        let build_json: Option<JenkinsBuild> = self.get_optional(&url).await?;

        Ok(build_json.map(|b| BuildInfo {
            pipeline: pipeline.to_string(),
            build: b
                .number
                .map(|n| n.to_string())
                .unwrap_or_else(|| build.to_string()),
            result: b.result,
            building: b.building,
            timestamp: b.timestamp,
            duration: b.duration,
            url: b.url,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::prelude::*;

    fn client(server: &MockServer) -> JenkinsClient {
        JenkinsClient::with_credentials(server.base_url(), "ci", "api-token").unwrap()
    }

    #[test]
    fn test_job_path() {
        assert_eq!(job_path("backend"), "/job/backend");
        assert_eq!(job_path("team/backend"), "/job/team/job/backend");
        assert_eq!(job_path("/team//backend/"), "/job/team/job/backend");
    }

    #[test]
    fn test_base_url_trimmed() {
        let client = JenkinsClient::with_credentials("https://ci.acme.io/", "ci", "t").unwrap();
        assert_eq!(client.base_url(), "https://ci.acme.io");
    }

    #[tokio::test]
    async fn test_get_build_info() {
        let server = MockServer::start();

        let mock = server.mock(|when, then| {
            when.method(GET)
                .path("/job/backend/42/api/json")
                .header_exists("Authorization");
            then.status(200).json_body(serde_json::json!({
                "number": 42,
                "result": "SUCCESS",
                "building": false,
                "timestamp": 1700000000000i64,
                "duration": 95000,
                "url": "https://ci.acme.io/job/backend/42/"
            }));
        });

        let info = client(&server)
            .get_build_info("backend", "42")
            .await
            .unwrap()
            .unwrap();

        mock.assert();
        assert_eq!(info.pipeline, "backend");
        assert_eq!(info.build, "42");
        assert_eq!(info.result.as_deref(), Some("SUCCESS"));
        assert!(!info.building);
        assert_eq!(info.duration, Some(95000));
    }

    #[tokio::test]
    async fn test_get_build_info_folder_and_symbolic_build() {
        let server = MockServer::start();

        server.mock(|when, then| {
            when.method(GET)
                .path("/job/team/job/backend/lastBuild/api/json");
            then.status(200).json_body(serde_json::json!({
                "number": 7,
                "result": null,
                "building": true
            }));
        });

        let info = client(&server)
            .get_build_info("team/backend", "lastBuild")
            .await
            .unwrap()
            .unwrap();

        assert_eq!(info.build, "7");
        assert!(info.building);
        assert!(info.result.is_none());
    }

    #[tokio::test]
    async fn test_get_build_info_error_status_is_none() {
        let server = MockServer::start();

        server.mock(|when, then| {
            when.method(GET).path("/job/backend/999/api/json");
            then.status(404).body("Not Found");
        });

        let info = client(&server)
            .get_build_info("backend", "999")
            .await
            .unwrap();
        assert!(info.is_none());
    }

    #[tokio::test]
    async fn test_get_build_info_connection_failure() {
        let client = JenkinsClient::with_credentials("http://127.0.0.1:1", "ci", "t").unwrap();
        let result = client.get_build_info("backend", "1").await;
        assert!(matches!(result.unwrap_err(), Error::Http(_)));
    }

    #[tokio::test]
    async fn test_verify() {
        let server = MockServer::start();

        let mock = server.mock(|when, then| {
            when.method(GET)
                .path("/api/json")
                .header_exists("Authorization");
            then.status(200)
                .header("X-Jenkins", "2.440.1")
                .json_body(serde_json::json!({"mode": "NORMAL"}));
        });

        let version = client(&server).verify().await.unwrap();
        mock.assert();
        assert_eq!(version.as_deref(), Some("2.440.1"));
    }

    #[tokio::test]
    async fn test_verify_unauthorized() {
        let server = MockServer::start();

        server.mock(|when, then| {
            when.method(GET).path("/api/json");
            then.status(401).body("Invalid password/token");
        });

        let result = client(&server).verify().await;
        assert!(matches!(result.unwrap_err(), Error::Unauthorized(_)));
    }
}
