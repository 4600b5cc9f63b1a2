use serde::Deserialize;

/// Envelope every LMS response is wrapped in. Any field may be null.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiResponse {
    #[serde(default)]
    pub status: Option<i32>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub data: serde_json::Value,
    #[serde(default)]
    pub error_code: Option<String>,
}
