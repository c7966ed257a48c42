use std::sync::Arc;

use axum::{
    Form, Json,
    extract::State,
    response::{IntoResponse, Redirect, Response},
};
use serde::{Deserialize, Serialize};
use tower_sessions::Session;

use super::session::SessionContext;
use super::validation::validate_password;
use super::{ApiError, ApiResponse, AppState};

#[derive(Deserialize)]
pub struct ResetInitRequest {
    pub username: String,
}

#[derive(Deserialize)]
pub struct ResetAnswerRequest {
    pub answer: String,
}

#[derive(Deserialize)]
pub struct ResetPasswordRequest {
    pub password: String,
    pub confirm_password: String,
}

#[derive(Serialize)]
pub struct ResetStepDto {
    pub step: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub question: Option<String>,
}

/// GET /reset
pub async fn reset_init_page() -> Json<ApiResponse<ResetStepDto>> {
    Json(ApiResponse::success(ResetStepDto {
        step: "init",
        question: None,
    }))
}

/// POST /reset
///
/// Confirms whether a username exists: an unknown name gets a distinct 404.
pub async fn reset_init(
    State(state): State<Arc<AppState>>,
    session: Session,
    Form(payload): Form<ResetInitRequest>,
) -> Result<Response, ApiError> {
    let user = state
        .store()
        .get_user_by_username(&payload.username)
        .await?
        .ok_or(ApiError::UserNotFound)?;

    let ctx = SessionContext::new(session, state.store());
    ctx.begin_reset(user.id).await?;

    tracing::info!(user_id = user.id, "Password reset initiated");
    Ok(Redirect::to("/reset/question").into_response())
}

/// GET /reset/question
pub async fn reset_question_page(
    State(state): State<Arc<AppState>>,
    session: Session,
) -> Result<Json<ApiResponse<ResetStepDto>>, ApiError> {
    let ctx = SessionContext::new(session, state.store());
    let subject = ctx
        .reset_subject()
        .await?
        .ok_or(ApiError::FlowNotInitialized)?;

    Ok(Json(ApiResponse::success(ResetStepDto {
        step: "question",
        question: Some(subject.question),
    })))
}

/// POST /reset/question
///
/// A correct answer forwards to the password step without recording that
/// the question was ever answered; the password step only checks that a
/// flow is active, so this step can be skipped entirely.
pub async fn reset_question(
    State(state): State<Arc<AppState>>,
    session: Session,
    Form(payload): Form<ResetAnswerRequest>,
) -> Result<Response, ApiError> {
    let ctx = SessionContext::new(session, state.store());
    let subject = ctx
        .reset_subject()
        .await?
        .ok_or(ApiError::FlowNotInitialized)?;

    if subject.answer != payload.answer {
        return Err(ApiError::IncorrectAnswer);
    }

    Ok(Redirect::to("/reset/password").into_response())
}

/// GET /reset/password
pub async fn reset_password_page(
    State(state): State<Arc<AppState>>,
    session: Session,
) -> Result<Json<ApiResponse<ResetStepDto>>, ApiError> {
    let ctx = SessionContext::new(session, state.store());
    ctx.reset_subject()
        .await?
        .ok_or(ApiError::FlowNotInitialized)?;

    Ok(Json(ApiResponse::success(ResetStepDto {
        step: "password",
        question: None,
    })))
}

/// POST /reset/password
pub async fn reset_password(
    State(state): State<Arc<AppState>>,
    session: Session,
    Form(payload): Form<ResetPasswordRequest>,
) -> Result<Response, ApiError> {
    let ctx = SessionContext::new(session, state.store());

    // Guard before validation so the error order is stable: no flow beats
    // a bad password.
    ctx.reset_subject()
        .await?
        .ok_or(ApiError::FlowNotInitialized)?;

    if payload.password != payload.confirm_password {
        return Err(ApiError::PasswordMismatch);
    }

    let (enc_key, min_length) = {
        let config = state.config().read().await;
        (
            config.security.pw_enc_key.clone(),
            config.security.min_password_length,
        )
    };

    validate_password(&payload.password, min_length)?;

    // Consume the flow and mutate in that order; a second submit with the
    // same session lands back at /reset.
    let user_id = ctx
        .complete_reset()
        .await?
        .ok_or(ApiError::FlowNotInitialized)?;

    state
        .store()
        .update_user_password(user_id, &payload.password, &enc_key)
        .await?;

    tracing::info!(user_id = user_id, "Password reset completed");
    Ok(Redirect::to("/login").into_response())
}
