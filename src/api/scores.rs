use std::sync::{Arc, LazyLock};

use axum::{
    Form, Json,
    extract::{Path, State},
    http::header,
    response::{IntoResponse, Response},
};
use regex::Regex;
use serde::Deserialize;

use super::{ApiError, ApiResponse, AppState, MessageResponse};

static REC_FILE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^rec(\d+)\.txt$").unwrap_or_else(|e| panic!("invalid recfile pattern: {e}"))
});

/// Form the snake client posts at game over, field names included.
#[derive(Deserialize)]
pub struct SubmitScoreRequest {
    #[serde(rename = "playerName")]
    pub player_name: String,
    pub score: i64,
    /// Client-side obfuscation of the score: `score * score + 1337`.
    pub scorehash: i64,
    /// Marker the client sets to "1"; anything else is rejected.
    #[serde(rename = "SNAKE_BLOCK")]
    pub snake_block: String,
    #[serde(rename = "recTurn")]
    pub rec_turn: String,
    #[serde(rename = "recFrame")]
    pub rec_frame: String,
    #[serde(rename = "recFood")]
    pub rec_food: String,
}

/// GET /api/games/snake/{filename}
///
/// The game client reads two kinds of virtual files: `highscores.txt`, the
/// board in its urlencoded wire format, and `rec<N>.txt`, the replay held
/// by board slot N.
pub async fn snake_file(
    State(state): State<Arc<AppState>>,
    Path(filename): Path<String>,
) -> Result<Response, ApiError> {
    if filename == "highscores.txt" {
        let scores = state.store().high_scores().await?;

        // Triplets per slot; recFile carries the bare slot number, the
        // client turns it into a rec<N>.txt request.
        let body = scores
            .iter()
            .enumerate()
            .map(|(i, s)| {
                format!(
                    "name{i}={}&score{i}={}&recFile{i}={}",
                    urlencoding::encode(&s.player),
                    s.score,
                    s.recid.unwrap_or_default(),
                )
            })
            .collect::<Vec<_>>()
            .join("&");

        return Ok(([(header::CONTENT_TYPE, "text/plain")], body).into_response());
    }

    if let Some(caps) = REC_FILE.captures(&filename) {
        let recid: i32 = caps[1]
            .parse()
            .map_err(|_| ApiError::not_found("Recording", &filename))?;

        let score = state
            .store()
            .get_score_by_recid(recid)
            .await?
            .ok_or_else(|| ApiError::not_found("Recording", &filename))?;

        return Ok(([(header::CONTENT_TYPE, "text/plain")], score.recording).into_response());
    }

    Err(ApiError::not_found("File", filename))
}

/// POST /api/games/snake/scores
pub async fn submit_score(
    State(state): State<Arc<AppState>>,
    Form(payload): Form<SubmitScoreRequest>,
) -> Result<Json<ApiResponse<MessageResponse>>, ApiError> {
    if payload.player_name.is_empty() {
        return Err(ApiError::validation("Player name is required"));
    }

    // The hash only proves the client knows the formula, not that the
    // score was earned. Overflow counts as a failed check.
    let verified = payload
        .score
        .checked_mul(payload.score)
        .and_then(|squared| squared.checked_add(1337))
        .is_some_and(|expected| expected == payload.scorehash);
    if !verified {
        return Err(ApiError::validation("Score failed verification"));
    }

    if payload.snake_block != "1" {
        return Err(ApiError::validation("Score failed verification"));
    }

    let recording = format!(
        "recTurn={}&recFrame={}&recFood={}",
        urlencoding::encode(&payload.rec_turn),
        urlencoding::encode(&payload.rec_frame),
        urlencoding::encode(&payload.rec_food),
    );

    state
        .store()
        .record_score(&payload.player_name, payload.score, &recording)
        .await?;

    tracing::info!(player = %payload.player_name, score = payload.score, "Snake score recorded");

    Ok(Json(ApiResponse::success(MessageResponse {
        message: "Score recorded".to_string(),
    })))
}
