use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use serde::{Deserialize, Serialize};

use super::validation::strip_command_metachars;
use super::{ApiError, ApiResponse, AppState, MessageResponse, ToolDto};

#[derive(Deserialize)]
pub struct CreateToolRequest {
    pub name: String,
    pub path: String,
    pub description: String,
}

#[derive(Deserialize)]
pub struct ExecuteRequest {
    pub tool_id: i32,
    #[serde(default)]
    pub args: String,
}

#[derive(Serialize)]
pub struct ExecuteResponse {
    /// The exact command line handed to the shell.
    pub cmd: String,
    pub output: String,
}

/// GET /api/tools
pub async fn list_tools(
    State(state): State<Arc<AppState>>,
) -> Result<Json<ApiResponse<Vec<ToolDto>>>, ApiError> {
    let tools = state.store().list_tools().await?;
    let tools = tools.into_iter().map(ToolDto::from).collect();

    Ok(Json(ApiResponse::success(tools)))
}

/// GET /api/tools/{id}
///
/// The id path segment goes to the store as the string the client sent.
pub async fn get_tool(
    State(state): State<Arc<AppState>>,
    Path(raw_id): Path<String>,
) -> Result<Json<ApiResponse<ToolDto>>, ApiError> {
    let tool = state
        .store()
        .get_tool_by_raw_id(&raw_id)
        .await?
        .ok_or_else(|| ApiError::not_found("Tool", raw_id))?;

    Ok(Json(ApiResponse::success(ToolDto::from(tool))))
}

/// POST /api/tools/execute
///
/// Builds `<tool path> <args>` and runs it through `sh -c`. The command
/// line is filtered for `;`, `&` and `|` only; quoting, substitution and
/// redirection pass through untouched.
pub async fn execute(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<ExecuteRequest>,
) -> Result<Json<ApiResponse<ExecuteResponse>>, ApiError> {
    let tool = state
        .store()
        .get_tool(payload.tool_id)
        .await?
        .ok_or_else(|| ApiError::not_found("Tool", payload.tool_id))?;

    let cmd = strip_command_metachars(&format!("{} {}", tool.path, payload.args));

    tracing::info!(tool = %tool.name, cmd = %cmd, "Executing tool");

    let output = tokio::process::Command::new("sh")
        .arg("-c")
        .arg(&cmd)
        .output()
        .await
        .map_err(|e| ApiError::internal(format!("Failed to spawn tool: {e}")))?;

    let mut combined = String::from_utf8_lossy(&output.stdout).into_owned();
    combined.push_str(&String::from_utf8_lossy(&output.stderr));

    Ok(Json(ApiResponse::success(ExecuteResponse {
        cmd,
        output: combined,
    })))
}

/// POST /api/admin/tools
pub async fn add_tool(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<CreateToolRequest>,
) -> Result<(StatusCode, Json<ApiResponse<ToolDto>>), ApiError> {
    if payload.name.is_empty() || payload.path.is_empty() {
        return Err(ApiError::validation("Name and path are required"));
    }

    let tool = state
        .store()
        .add_tool(&payload.name, &payload.path, &payload.description)
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success(ToolDto::from(tool))),
    ))
}

/// DELETE /api/admin/tools/{id}
pub async fn remove_tool(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i32>,
) -> Result<Json<ApiResponse<MessageResponse>>, ApiError> {
    let removed = state.store().remove_tool(id).await?;

    if !removed {
        return Err(ApiError::not_found("Tool", id));
    }

    Ok(Json(ApiResponse::success(MessageResponse {
        message: format!("Tool {id} removed"),
    })))
}
