use std::collections::HashMap;
use std::sync::Arc;

use axum::{
    Form, Json,
    extract::{Request, State},
    http::StatusCode,
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};
use serde::{Deserialize, Serialize};
use tower_sessions::Session;

use super::session::SessionContext;
use super::validation::validate_password;
use super::{ApiError, ApiResponse, AppState, MessageResponse, UserDto};
use crate::constants::QUESTIONS;
use crate::db::User;
use crate::db::repositories::user::xor_encode;
use crate::entities::users::UserStatus;

#[derive(Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Serialize)]
pub struct RegisterPageDto {
    pub questions: &'static [&'static str],
}

// ============================================================================
// Middleware
// ============================================================================

/// Resolve the session to a user and stash it in request extensions. Rejects
/// with 401 before any role check can produce a 403, so an anonymous probe
/// learns nothing about which routes are admin-only.
pub async fn require_authenticated(
    State(state): State<Arc<AppState>>,
    session: Session,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let ctx = SessionContext::new(session, state.store());
    let user = ctx.current_user().await?.ok_or(ApiError::Unauthenticated)?;

    tracing::Span::current().record("user_id", user.id);
    request.extensions_mut().insert(user);

    Ok(next.run(request).await)
}

/// Role check on top of [`require_authenticated`]. Reads the user the outer
/// guard stored; checks role, not status.
pub async fn require_admin(request: Request, next: Next) -> Result<Response, ApiError> {
    let user = request
        .extensions()
        .get::<User>()
        .ok_or(ApiError::Unauthenticated)?;

    if !user.is_admin() {
        return Err(ApiError::Forbidden);
    }

    Ok(next.run(request).await)
}

// ============================================================================
// Handlers
// ============================================================================

/// GET /
///
/// Landing route: the logged-in user's projection, or a bounce to login.
pub async fn home(
    State(state): State<Arc<AppState>>,
    session: Session,
) -> Result<Response, ApiError> {
    let ctx = SessionContext::new(session, state.store());

    match ctx.current_user().await? {
        Some(user) => Ok(Json(ApiResponse::success(UserDto::from(user))).into_response()),
        None => Ok(Redirect::to("/login").into_response()),
    }
}

/// GET /login
pub async fn login_page(
    State(state): State<Arc<AppState>>,
    session: Session,
) -> Result<Response, ApiError> {
    let ctx = SessionContext::new(session, state.store());

    if ctx.current_user().await?.is_some() {
        return Ok(Redirect::to("/").into_response());
    }

    Ok(Json(ApiResponse::success(MessageResponse {
        message: "Log in to continue.".to_string(),
    }))
    .into_response())
}

/// GET /register
///
/// Serves the security-question catalog the registration form offers.
pub async fn register_page() -> Json<ApiResponse<RegisterPageDto>> {
    Json(ApiResponse::success(RegisterPageDto {
        questions: QUESTIONS,
    }))
}

/// POST /login
pub async fn login(
    State(state): State<Arc<AppState>>,
    session: Session,
    Form(payload): Form<LoginRequest>,
) -> Result<Response, ApiError> {
    let ctx = SessionContext::new(session, state.store());

    if ctx.current_user().await?.is_some() {
        return Ok(Redirect::to("/").into_response());
    }

    let enc_key = {
        let config = state.config().read().await;
        config.security.pw_enc_key.clone()
    };

    let encoded = xor_encode(&payload.password, &enc_key);

    // The submitted username is matched against the stored row by raw SQL;
    // the status check happens afterwards, outside the statement.
    let user = state
        .store()
        .find_user_by_credentials_raw(&payload.username, &encoded)
        .await?;

    match user {
        Some(user) if user.status == UserStatus::Enabled => {
            ctx.start_session(user.id).await?;
            tracing::info!(user_id = user.id, "Login succeeded");
            Ok(Json(ApiResponse::success(UserDto::from(user))).into_response())
        }
        // Unknown user, wrong password, disabled account: one answer.
        _ => Err(ApiError::InvalidCredentials),
    }
}

/// POST /register
///
/// The form is taken as an open field map and handed to the store, which
/// applies every column-named field it finds.
pub async fn register(
    State(state): State<Arc<AppState>>,
    Form(fields): Form<HashMap<String, String>>,
) -> Result<impl IntoResponse, ApiError> {
    let username = fields
        .get("username")
        .map(String::as_str)
        .unwrap_or_default();
    let password = fields
        .get("password")
        .map(String::as_str)
        .unwrap_or_default();
    let confirm = fields
        .get("confirm_password")
        .map(String::as_str)
        .unwrap_or_default();

    if username.is_empty() {
        return Err(ApiError::validation("Username is required"));
    }

    if state.store().get_user_by_username(username).await?.is_some() {
        return Err(ApiError::UsernameTaken);
    }

    if password != confirm {
        return Err(ApiError::PasswordMismatch);
    }

    let (enc_key, min_length) = {
        let config = state.config().read().await;
        (
            config.security.pw_enc_key.clone(),
            config.security.min_password_length,
        )
    };

    validate_password(password, min_length)?;

    let user = state.store().create_user_from_fields(&fields, &enc_key).await?;
    tracing::info!(user_id = user.id, username = %user.username, "User registered");

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success(UserDto::from(user))),
    ))
}

/// GET /logout
pub async fn logout(
    State(state): State<Arc<AppState>>,
    session: Session,
) -> Result<Response, ApiError> {
    let ctx = SessionContext::new(session, state.store());

    if ctx.current_user().await?.is_none() {
        return Err(ApiError::Unauthenticated);
    }

    ctx.end_session().await?;
    Ok(Redirect::to("/").into_response())
}
