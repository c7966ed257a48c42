use std::sync::Arc;

use axum::{
    Extension, Json,
    extract::{Path, State},
};
use serde::{Deserialize, Serialize};

use super::validation::validate_password;
use super::{ApiError, ApiResponse, AppState, UserDto};
use crate::constants::DEFAULT_NOTE;
use crate::db::User;
use crate::entities::users::{Role, UserStatus};

#[derive(Serialize)]
pub struct ProfileDto {
    pub id: i32,
    pub username: String,
    pub question: String,
    pub answer: String,
    pub role: Role,
    pub created_at: String,
}

#[derive(Serialize)]
pub struct NotesDto {
    pub notes: String,
}

#[derive(Deserialize)]
pub struct NotesRequest {
    pub notes: String,
}

#[derive(Deserialize)]
pub struct ProfileRequest {
    pub password: String,
    pub question: String,
    pub answer: String,
}

/// GET /api/users/me
pub async fn me(Extension(user): Extension<User>) -> Json<ApiResponse<ProfileDto>> {
    Json(ApiResponse::success(ProfileDto {
        id: user.id,
        username: user.username,
        question: user.question,
        answer: user.answer,
        role: user.role,
        created_at: user.created_at,
    }))
}

/// GET /api/notes
pub async fn get_notes(Extension(user): Extension<User>) -> Json<ApiResponse<NotesDto>> {
    let notes = user
        .notes
        .filter(|n| !n.is_empty())
        .unwrap_or_else(|| DEFAULT_NOTE.to_string());

    Json(ApiResponse::success(NotesDto { notes }))
}

/// PUT /api/notes
pub async fn update_notes(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<User>,
    Json(payload): Json<NotesRequest>,
) -> Result<Json<ApiResponse<NotesDto>>, ApiError> {
    state.store().update_user_notes(user.id, &payload.notes).await?;

    Ok(Json(ApiResponse::success(NotesDto {
        notes: payload.notes,
    })))
}

/// PUT /api/profile
///
/// Replaces the caller's password, question and answer in one shot. The
/// current password is not asked for.
pub async fn update_profile(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<User>,
    Json(payload): Json<ProfileRequest>,
) -> Result<Json<ApiResponse<UserDto>>, ApiError> {
    let (enc_key, min_length) = {
        let config = state.config().read().await;
        (
            config.security.pw_enc_key.clone(),
            config.security.min_password_length,
        )
    };

    validate_password(&payload.password, min_length)?;

    let updated = state
        .store()
        .update_user_profile(
            user.id,
            &payload.password,
            &payload.question,
            &payload.answer,
            &enc_key,
        )
        .await?;

    Ok(Json(ApiResponse::success(UserDto::from(updated))))
}

/// GET /api/admin/users
pub async fn list_users(
    State(state): State<Arc<AppState>>,
) -> Result<Json<ApiResponse<Vec<UserDto>>>, ApiError> {
    let users = state.store().list_users().await?;
    let users = users.into_iter().map(UserDto::from).collect();

    Ok(Json(ApiResponse::success(users)))
}

/// GET /api/admin/users/{action}/{id}
///
/// Registered alongside the other /admin routes but outside the admin
/// guard, so any logged-in user can flip roles and statuses on any account
/// other than their own.
pub async fn user_action(
    State(state): State<Arc<AppState>>,
    Extension(caller): Extension<User>,
    Path((action, id)): Path<(String, i32)>,
) -> Result<Json<ApiResponse<UserDto>>, ApiError> {
    let store = state.store();

    store
        .get_user_by_id(id)
        .await?
        .ok_or_else(|| ApiError::not_found("User", id))?;

    if id == caller.id {
        return Err(ApiError::validation("Self modification denied"));
    }

    match action.as_str() {
        "enable" => store.set_user_status(id, UserStatus::Enabled).await?,
        "disable" => store.set_user_status(id, UserStatus::Disabled).await?,
        "promote" => store.set_user_role(id, Role::Admin).await?,
        "demote" => store.set_user_role(id, Role::Standard).await?,
        other => {
            return Err(ApiError::validation(format!("Unknown action: {other}")));
        }
    }

    let user = store
        .get_user_by_id(id)
        .await?
        .ok_or_else(|| ApiError::not_found("User", id))?;

    tracing::info!(target_user = id, action = %action, "User account modified");
    Ok(Json(ApiResponse::success(UserDto::from(user))))
}
