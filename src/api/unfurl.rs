use std::sync::LazyLock;

use axum::{Json, http::HeaderMap};
use regex::Regex;
use serde::{Deserialize, Serialize};

use super::{ApiError, ApiResponse};

static TITLE_TAG: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?is)<title[^>]*>(.*?)</title>")
        .unwrap_or_else(|e| panic!("invalid title pattern: {e}"))
});

static OG_META: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r#"(?i)<meta[^>]+property=["']og:(title|description|image)["'][^>]+content=["']([^"']*)["']"#,
    )
    .unwrap_or_else(|e| panic!("invalid og pattern: {e}"))
});

#[derive(Deserialize)]
pub struct UnfurlRequest {
    pub url: String,
}

#[derive(Serialize)]
pub struct UnfurlResponse {
    pub url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
}

/// POST /api/unfurl
///
/// Fetches the submitted URL from the server and returns its preview
/// metadata. The URL is not restricted by scheme, host or address range,
/// and the route sits outside the session guard.
pub async fn unfurl(
    headers: HeaderMap,
    Json(payload): Json<UnfurlRequest>,
) -> Result<Json<ApiResponse<UnfurlResponse>>, ApiError> {
    if payload.url.is_empty() {
        return Err(ApiError::validation("URL is required"));
    }

    let client = reqwest::Client::new();
    let mut request = client.get(&payload.url);

    // The client's User-Agent is forwarded to the target.
    if let Some(agent) = headers.get("user-agent").and_then(|h| h.to_str().ok()) {
        request = request.header("user-agent", agent);
    }

    let response = request
        .send()
        .await
        .map_err(|e| ApiError::fetch_error(format!("Failed to fetch {}: {e}", payload.url)))?;

    let body = response
        .text()
        .await
        .map_err(|e| ApiError::fetch_error(format!("Failed to read body: {e}")))?;

    let mut title = TITLE_TAG
        .captures(&body)
        .map(|caps| caps[1].trim().to_string());
    let mut description = None;
    let mut image = None;

    for caps in OG_META.captures_iter(&body) {
        let value = caps[2].to_string();
        match caps[1].to_ascii_lowercase().as_str() {
            "title" => title = Some(value),
            "description" => description = Some(value),
            "image" => image = Some(value),
            _ => {}
        }
    }

    Ok(Json(ApiResponse::success(UnfurlResponse {
        url: payload.url,
        title,
        description,
        image,
    })))
}
