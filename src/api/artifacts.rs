use std::path::PathBuf;
use std::sync::Arc;

use axum::{
    Json,
    extract::{Multipart, Path, State},
    http::{StatusCode, header},
    response::{IntoResponse, Response},
};
use serde::Deserialize;

use super::validation::has_allowed_extension;
use super::{ApiError, ApiResponse, AppState, ArtifactDto, MessageResponse};

#[derive(Debug, Deserialize)]
#[serde(rename = "artifact")]
struct ArtifactXml {
    filename: String,
    content: String,
}

async fn artifacts_config(state: &AppState) -> (PathBuf, Vec<String>) {
    let config = state.config().read().await;
    (
        PathBuf::from(&config.artifacts.upload_path),
        config.artifacts.allowed_extensions.clone(),
    )
}

/// GET /api/artifacts
pub async fn list(
    State(state): State<Arc<AppState>>,
) -> Result<Json<ApiResponse<Vec<ArtifactDto>>>, ApiError> {
    let (upload_path, _) = artifacts_config(&state).await;

    let mut artifacts = Vec::new();

    let mut dir = match tokio::fs::read_dir(&upload_path).await {
        Ok(dir) => dir,
        // Nothing uploaded yet.
        Err(_) => return Ok(Json(ApiResponse::success(artifacts))),
    };

    while let Some(entry) = dir
        .next_entry()
        .await
        .map_err(|e| ApiError::internal(format!("Failed to read artifacts dir: {e}")))?
    {
        let metadata = entry
            .metadata()
            .await
            .map_err(|e| ApiError::internal(format!("Failed to stat artifact: {e}")))?;

        if metadata.is_file() {
            artifacts.push(ArtifactDto {
                name: entry.file_name().to_string_lossy().into_owned(),
                size: metadata.len(),
            });
        }
    }

    artifacts.sort_by(|a, b| a.name.cmp(&b.name));
    Ok(Json(ApiResponse::success(artifacts)))
}

/// POST /api/artifacts
///
/// Multipart upload. The client-supplied filename is joined onto the
/// upload directory without normalization, so `..` segments walk out of it.
pub async fn upload(
    State(state): State<Arc<AppState>>,
    mut multipart: Multipart,
) -> Result<(StatusCode, Json<ApiResponse<ArtifactDto>>), ApiError> {
    let (upload_path, allowed) = artifacts_config(&state).await;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::validation(format!("Malformed multipart body: {e}")))?
    {
        let Some(filename) = field.file_name().map(ToString::to_string) else {
            continue;
        };

        if !has_allowed_extension(&filename, &allowed) {
            return Err(ApiError::validation("File type is not allowed"));
        }

        let data = field
            .bytes()
            .await
            .map_err(|e| ApiError::validation(format!("Failed to read upload: {e}")))?;

        let dest = upload_path.join(&filename);
        if let Some(parent) = dest.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| ApiError::internal(format!("Failed to create upload dir: {e}")))?;
        }

        if tokio::fs::try_exists(&dest).await.unwrap_or(false) {
            return Err(ApiError::Conflict(
                "An artifact with that name already exists".to_string(),
            ));
        }

        let size = data.len() as u64;
        tokio::fs::write(&dest, &data)
            .await
            .map_err(|e| ApiError::internal(format!("Failed to store artifact: {e}")))?;

        tracing::info!(artifact = %filename, size, "Artifact stored");

        return Ok((
            StatusCode::CREATED,
            Json(ApiResponse::success(ArtifactDto {
                name: filename,
                size,
            })),
        ));
    }

    Err(ApiError::validation("No file field in upload"))
}

/// POST /api/artifacts/xml
///
/// Accepts `<artifact><filename>..</filename><content>..</content></artifact>`.
/// The stored name gets a timestamp suffix so repeated posts do not clobber
/// each other.
pub async fn upload_xml(
    State(state): State<Arc<AppState>>,
    body: String,
) -> Result<(StatusCode, Json<ApiResponse<ArtifactDto>>), ApiError> {
    let (upload_path, allowed) = artifacts_config(&state).await;

    let artifact: ArtifactXml = quick_xml::de::from_str(&body)
        .map_err(|e| ApiError::validation(format!("Malformed artifact XML: {e}")))?;

    if !has_allowed_extension(&artifact.filename, &allowed) {
        return Err(ApiError::validation("File type is not allowed"));
    }

    let timestamp = chrono::Utc::now().timestamp();
    let stored_name = match artifact.filename.rsplit_once('.') {
        Some((stem, ext)) => format!("{stem}_{timestamp}.{ext}"),
        None => format!("{}_{timestamp}", artifact.filename),
    };

    let dest = upload_path.join(&stored_name);
    if let Some(parent) = dest.parent() {
        tokio::fs::create_dir_all(parent)
            .await
            .map_err(|e| ApiError::internal(format!("Failed to create upload dir: {e}")))?;
    }

    if tokio::fs::try_exists(&dest).await.unwrap_or(false) {
        return Err(ApiError::Conflict(
            "An artifact with that name already exists".to_string(),
        ));
    }

    let size = artifact.content.len() as u64;
    tokio::fs::write(&dest, artifact.content.as_bytes())
        .await
        .map_err(|e| ApiError::internal(format!("Failed to store artifact: {e}")))?;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success(ArtifactDto {
            name: stored_name,
            size,
        })),
    ))
}

/// GET /api/artifacts/view/{*filename}
///
/// Serves whatever the joined path resolves to, with a guessed media type.
pub async fn view(
    State(state): State<Arc<AppState>>,
    Path(filename): Path<String>,
) -> Result<Response, ApiError> {
    let (upload_path, _) = artifacts_config(&state).await;

    let path = upload_path.join(&filename);
    let data = tokio::fs::read(&path)
        .await
        .map_err(|_| ApiError::not_found("Artifact", &filename))?;

    let mime = mime_guess::from_path(&path).first_or_octet_stream();

    Ok(([(header::CONTENT_TYPE, mime.to_string())], data).into_response())
}

/// DELETE /api/artifacts/{filename}
pub async fn delete(
    State(state): State<Arc<AppState>>,
    Path(filename): Path<String>,
) -> Result<Json<ApiResponse<MessageResponse>>, ApiError> {
    let (upload_path, _) = artifacts_config(&state).await;

    let path = upload_path.join(&filename);
    tokio::fs::remove_file(&path)
        .await
        .map_err(|_| ApiError::not_found("Artifact", &filename))?;

    Ok(Json(ApiResponse::success(MessageResponse {
        message: format!("Artifact {filename} deleted"),
    })))
}
