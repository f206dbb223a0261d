//! GitHub API client implementation.

use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use devops_hub_core::{
    ContentEntry, Error, GitHubSettings, RepoContent, RepositoryProvider, Result,
};
use tracing::{debug, warn};

use crate::types::{GitHubContentItem, GitHubContentResponse, GitHubUser};
use crate::DEFAULT_GITHUB_URL;

/// GitHub API client.
pub struct GitHubClient {
    base_url: String,
    token: String,
    client: reqwest::Client,
}

impl GitHubClient {
    /// Create a GitHub client from settings.
    pub fn new(settings: &GitHubSettings) -> Result<Self> {
        let base_url = settings.base_url.as_deref().unwrap_or(DEFAULT_GITHUB_URL);
        Self::with_base_url(base_url, settings.token.expose())
    }

    /// Create a new GitHub client with a custom base URL.
    pub fn with_base_url(base_url: impl Into<String>, token: impl Into<String>) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent("mcp-devops-hub")
            .build()
            .map_err(|e| Error::Http(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            token: token.into(),
            client,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Make an authenticated GET request.
    async fn get(&self, url: &str) -> Result<reqwest::Response> {
        debug!(url = url, "GitHub GET request");

        let response = self
            .client
            .get(url)
            .header("Authorization", format!("Bearer {}", self.token))
            .header("Accept", "application/vnd.github+json")
            .header("X-GitHub-Api-Version", "2022-11-28")
            .send()
            .await
            .map_err(|e| Error::Http(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let message = response.text().await.unwrap_or_default();
            warn!(
                status = status,
                message = message,
                "GitHub API error response"
            );
            return Err(Error::from_status(status, message));
        }

        Ok(response)
    }

    fn contents_url(&self, owner: &str, repo: &str, path: &str) -> String {
        let path = path.trim_matches('/');
        if path.is_empty() {
            format!("{}/repos/{}/{}/contents", self.base_url, owner, repo)
        } else {
            format!(
                "{}/repos/{}/{}/contents/{}",
                self.base_url, owner, repo, path
            )
        }
    }
}

/// Decode the base64 payload of a file. GitHub wraps it at 60 columns.
fn decode_content(encoded: &str) -> Result<String> {
    let compact: String = encoded.chars().filter(|c| !c.is_whitespace()).collect();
    let bytes = STANDARD
        .decode(compact.as_bytes())
        .map_err(|_| Error::InvalidData("Invalid content encoding".to_string()))?;
    String::from_utf8(bytes).map_err(|_| Error::InvalidData("Invalid content encoding".to_string()))
}

/// Files over 1 MB come back with encoding `none`, symlinks and submodules
/// without content.
fn map_file(item: GitHubContentItem) -> Result<RepoContent> {
    let Some(encoded) = item.content.as_deref() else {
        return Err(Error::InvalidData(format!("No content returned for {}", item.path)));
    };
    let content = match item.encoding.as_deref() {
        Some("base64") => decode_content(encoded)?,
        other => {
            return Err(Error::InvalidData(format!(
                "Unsupported content encoding '{}' for {}",
                other.unwrap_or("none"),
                item.path
            )));
        }
    };
    Ok(RepoContent::File {
        path: item.path,
        content,
    })
}

fn map_directory(path: &str, items: Vec<GitHubContentItem>) -> RepoContent {
    RepoContent::Directory {
        path: path.trim_matches('/').to_string(),
        entries: items
            .into_iter()
            .map(|item| ContentEntry {
                name: item.name,
                kind: item.kind,
            })
            .collect(),
    }
}

#[async_trait]
impl RepositoryProvider for GitHubClient {
    async fn get_content(
        &self,
        owner: &str,
        repo: &str,
        path: &str,
    ) -> Result<Option<RepoContent>> {
        let url = self.contents_url(owner, repo, path);

        let response = match self.get(&url).await {
            Ok(response) => response,
            Err(e) if e.is_not_found() => return Ok(None),
            Err(e) => return Err(e),
        };

        let body: GitHubContentResponse = response
            .json()
            .await
            .map_err(|e| Error::InvalidData(format!("Failed to parse response: {}", e)))?;

        let content = match body {
            GitHubContentResponse::File(item) => map_file(item)?,
            GitHubContentResponse::Directory(items) => map_directory(path, items),
        };
        Ok(Some(content))
    }

    async fn authenticated_user(&self) -> Result<String> {
        let url = format!("{}/user", self.base_url);
        let user: GitHubUser = self
            .get(&url)
            .await?
            .json()
            .await
            .map_err(|e| Error::InvalidData(format!("Failed to parse response: {}", e)))?;
        Ok(user.login)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use devops_hub_core::Secret;
    use httpmock::prelude::*;

    fn client(server: &MockServer) -> GitHubClient {
        GitHubClient::with_base_url(server.base_url(), "ghp_test").unwrap()
    }

    #[test]
    fn test_new_uses_default_url() {
        let settings = GitHubSettings {
            token: Secret::new("ghp_test"),
            base_url: None,
        };
        let client = GitHubClient::new(&settings).unwrap();
        assert_eq!(client.base_url(), "https://api.github.com");

        let enterprise = GitHubSettings {
            token: Secret::new("ghp_test"),
            base_url: Some("https://github.acme.io/api/v3/".to_string()),
        };
        let client = GitHubClient::new(&enterprise).unwrap();
        assert_eq!(client.base_url(), "https://github.acme.io/api/v3");
    }

    #[test]
    fn test_decode_content_with_line_breaks() {
        // "hello world\n" wrapped the way GitHub does it
        let decoded = decode_content("aGVsbG8g\nd29ybGQK\n").unwrap();
        assert_eq!(decoded, "hello world\n");
    }

    #[test]
    fn test_decode_content_rejects_invalid_utf8() {
        // 0xFF 0xFE is not valid UTF-8
        let err = decode_content("//4=").unwrap_err();
        assert_eq!(err.to_string(), "Invalid data: Invalid content encoding");
    }

    #[tokio::test]
    async fn test_get_file_content() {
        let server = MockServer::start();

        let mock = server.mock(|when, then| {
            when.method(GET)
                .path("/repos/acme/api/contents/src/main.rs")
                .header("Authorization", "Bearer ghp_test")
                .header("X-GitHub-Api-Version", "2022-11-28");
            then.status(200).json_body(serde_json::json!({
                "name": "main.rs",
                "path": "src/main.rs",
                "type": "file",
                "size": 13,
                "encoding": "base64",
                "content": "Zm4gbWFpbigp\nIHt9Cg==\n"
            }));
        });

        let content = client(&server)
            .get_content("acme", "api", "src/main.rs")
            .await
            .unwrap()
            .unwrap();

        mock.assert();
        assert_eq!(
            content,
            RepoContent::File {
                path: "src/main.rs".to_string(),
                content: "fn main() {}\n".to_string(),
            }
        );
    }

    #[tokio::test]
    async fn test_get_large_file_is_invalid_data() {
        let server = MockServer::start();

        server.mock(|when, then| {
            when.method(GET).path("/repos/acme/api/contents/data.bin");
            then.status(200).json_body(serde_json::json!({
                "name": "data.bin",
                "path": "data.bin",
                "type": "file",
                "size": 5242880,
                "encoding": "none",
                "content": ""
            }));
        });

        let err = client(&server)
            .get_content("acme", "api", "data.bin")
            .await
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "Invalid data: Unsupported content encoding 'none' for data.bin"
        );
    }

    #[tokio::test]
    async fn test_get_symlink_without_content_is_invalid_data() {
        let server = MockServer::start();

        server.mock(|when, then| {
            when.method(GET).path("/repos/acme/api/contents/latest");
            then.status(200).json_body(serde_json::json!({
                "name": "latest",
                "path": "latest",
                "type": "symlink",
                "target": "releases/v2"
            }));
        });

        let result = client(&server).get_content("acme", "api", "latest").await;
        assert!(matches!(result.unwrap_err(), Error::InvalidData(_)));
    }

    #[tokio::test]
    async fn test_get_directory_listing() {
        let server = MockServer::start();

        server.mock(|when, then| {
            when.method(GET).path("/repos/acme/api/contents");
            then.status(200).json_body(serde_json::json!([
                {"name": "src", "path": "src", "type": "dir"},
                {"name": "README.md", "path": "README.md", "type": "file", "size": 120}
            ]));
        });

        let content = client(&server)
            .get_content("acme", "api", "")
            .await
            .unwrap()
            .unwrap();

        match content {
            RepoContent::Directory { path, entries } => {
                assert_eq!(path, "");
                assert_eq!(entries.len(), 2);
                assert_eq!(entries[0].name, "src");
                assert_eq!(entries[0].kind, "dir");
                assert_eq!(entries[1].kind, "file");
            }
            other => panic!("expected directory, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_get_content_not_found() {
        let server = MockServer::start();

        server.mock(|when, then| {
            when.method(GET)
                .path("/repos/acme/missing/contents/README.md");
            then.status(404)
                .json_body(serde_json::json!({"message": "Not Found"}));
        });

        let content = client(&server)
            .get_content("acme", "missing", "README.md")
            .await
            .unwrap();
        assert!(content.is_none());
    }

    #[tokio::test]
    async fn test_get_content_forbidden() {
        let server = MockServer::start();

        server.mock(|when, then| {
            when.method(GET).path("/repos/acme/private/contents");
            then.status(403)
                .json_body(serde_json::json!({"message": "Resource not accessible"}));
        });

        let result = client(&server).get_content("acme", "private", "").await;
        assert!(matches!(result.unwrap_err(), Error::Forbidden(_)));
    }

    #[tokio::test]
    async fn test_authenticated_user() {
        let server = MockServer::start();

        server.mock(|when, then| {
            when.method(GET).path("/user");
            then.status(200)
                .json_body(serde_json::json!({"id": 1, "login": "octocat"}));
        });

        let login = client(&server).authenticated_user().await.unwrap();
        assert_eq!(login, "octocat");
    }
}
