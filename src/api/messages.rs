use std::sync::Arc;

use axum::{
    Extension, Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use serde::Deserialize;

use super::{ApiError, ApiResponse, AppState, BoardMessageDto, MessageResponse};
use crate::db::User;

const DEFAULT_PAGE_SIZE: u64 = 50;

#[derive(Deserialize)]
pub struct ListQuery {
    pub limit: Option<u64>,
}

#[derive(Deserialize)]
pub struct CreateRequest {
    pub comment: String,
}

/// GET /api/messages
pub async fn list(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ListQuery>,
) -> Result<Json<ApiResponse<Vec<BoardMessageDto>>>, ApiError> {
    let limit = query.limit.unwrap_or(DEFAULT_PAGE_SIZE);

    let rows = state.store().list_messages(limit).await?;
    let messages = rows
        .into_iter()
        .map(|(message, author)| BoardMessageDto::from_row(message, author))
        .collect();

    Ok(Json(ApiResponse::success(messages)))
}

/// POST /api/messages
///
/// The comment is stored exactly as submitted; no encoding happens on
/// either side of the database.
pub async fn create(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<User>,
    Json(payload): Json<CreateRequest>,
) -> Result<(StatusCode, Json<ApiResponse<BoardMessageDto>>), ApiError> {
    if payload.comment.is_empty() {
        return Err(ApiError::validation("Comment is required"));
    }

    let message = state.store().add_message(user.id, &payload.comment).await?;
    let author = state.store().get_user_by_id(user.id).await?;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success(BoardMessageDto::from_row(
            message, author,
        ))),
    ))
}

/// DELETE /api/messages/{id}
///
/// Deletes by id alone. The message's author is never compared with the
/// caller.
pub async fn delete(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i32>,
) -> Result<Json<ApiResponse<MessageResponse>>, ApiError> {
    let deleted = state.store().delete_message(id).await?;

    if !deleted {
        return Err(ApiError::not_found("Message", id));
    }

    Ok(Json(ApiResponse::success(MessageResponse {
        message: format!("Message {id} deleted"),
    })))
}
