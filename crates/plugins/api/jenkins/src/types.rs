//! Jenkins JSON API response types.

use serde::Deserialize;

/// Response of `GET /job/{name}/{build}/api/json`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JenkinsBuild {
    #[serde(default)]
    pub number: Option<u64>,
    #[serde(default)]
    pub result: Option<String>,
    #[serde(default)]
    pub building: bool,
    #[serde(default)]
    pub timestamp: Option<i64>,
    #[serde(default)]
    pub duration: Option<i64>,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub display_name: Option<String>,
}
