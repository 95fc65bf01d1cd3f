//! services/api/src/web/dreams.rs
//!
//! Handlers for the journal itself: completing a fragment through the
//! generation service, persisting finished dreams, and listing history.

use axum::{extract::State, Extension, Json};
use base64::{engine::general_purpose::STANDARD, Engine};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use somnova_core::domain::{Dream, DreamFragment, UserId};
use somnova_core::ports::PortError;
use std::sync::Arc;
use tracing::warn;
use utoipa::ToSchema;

use crate::web::error::{ErrorBody, HttpError};
use crate::web::state::AppState;

/// Stored label for submissions that carried no text fragment.
const UNTITLED_FRAGMENT: &str = "Voice/Image Dream";

//=========================================================================================
// Request/Response Types
//=========================================================================================

#[derive(Serialize, ToSchema)]
pub struct DreamResponse {
    pub id: i64,
    pub user_id: i64,
    pub content: String,
    pub completed_text: String,
    pub created_at: DateTime<Utc>,
}

impl From<Dream> for DreamResponse {
    fn from(dream: Dream) -> Self {
        Self {
            id: dream.id,
            user_id: dream.user_id,
            content: dream.content,
            completed_text: dream.completed_text,
            created_at: dream.created_at,
        }
    }
}

#[derive(Deserialize, ToSchema)]
pub struct CreateDreamRequest {
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub completed_text: String,
}

#[derive(Serialize, ToSchema)]
pub struct CreateDreamResponse {
    pub id: i64,
}

/// The multi-modal fragment as the browser submits it: base64 payloads,
/// with or without a `data:` URL prefix.
#[derive(Deserialize, ToSchema)]
pub struct CompleteDreamRequest {
    pub text: Option<String>,
    #[serde(default)]
    pub images: Vec<String>,
    pub audio: Option<String>,
}

#[derive(Serialize, ToSchema)]
pub struct CompleteDreamResponse {
    /// The fragment text to persist alongside the narrative; falls back to a
    /// placeholder label for voice/image-only submissions.
    pub content: String,
    pub completed_text: String,
    /// Base64-encoded narration audio, when synthesis produced any.
    pub voice_audio: Option<String>,
}

//=========================================================================================
// Handlers
//=========================================================================================

/// GET /dreams - List the caller's dream history, newest first
#[utoipa::path(
    get,
    path = "/dreams",
    responses(
        (status = 200, description = "The caller's dreams, newest first", body = [DreamResponse]),
        (status = 401, description = "No valid session", body = ErrorBody)
    )
)]
pub async fn list_dreams_handler(
    State(state): State<Arc<AppState>>,
    Extension(user_id): Extension<UserId>,
) -> Result<Json<Vec<DreamResponse>>, HttpError> {
    let dreams = state.dreams.list_by_owner(user_id).await?;
    Ok(Json(dreams.into_iter().map(DreamResponse::from).collect()))
}

/// POST /dreams - Persist a completed dream for the caller
///
/// Only stores already-produced text; the completion round-trip happens in
/// `POST /dreams/complete` beforehand.
#[utoipa::path(
    post,
    path = "/dreams",
    request_body = CreateDreamRequest,
    responses(
        (status = 200, description = "Dream persisted", body = CreateDreamResponse),
        (status = 400, description = "Missing fragment or narrative", body = ErrorBody),
        (status = 401, description = "No valid session", body = ErrorBody)
    )
)]
pub async fn create_dream_handler(
    State(state): State<Arc<AppState>>,
    Extension(user_id): Extension<UserId>,
    Json(req): Json<CreateDreamRequest>,
) -> Result<Json<CreateDreamResponse>, HttpError> {
    if req.content.trim().is_empty() || req.completed_text.trim().is_empty() {
        return Err(
            PortError::Validation("content and completed_text are required".to_string()).into(),
        );
    }

    let id = state
        .dreams
        .create(user_id, &req.content, &req.completed_text)
        .await?;

    Ok(Json(CreateDreamResponse { id }))
}

/// POST /dreams/complete - Run a fragment through the generation service
///
/// Returns the completed narrative plus best-effort narration audio; nothing
/// is persisted here.
#[utoipa::path(
    post,
    path = "/dreams/complete",
    request_body = CompleteDreamRequest,
    responses(
        (status = 200, description = "Fragment completed", body = CompleteDreamResponse),
        (status = 400, description = "Empty or undecodable fragment", body = ErrorBody),
        (status = 401, description = "No valid session", body = ErrorBody),
        (status = 502, description = "Generation service failed", body = ErrorBody)
    )
)]
pub async fn complete_dream_handler(
    State(state): State<Arc<AppState>>,
    Extension(_user_id): Extension<UserId>,
    Json(req): Json<CompleteDreamRequest>,
) -> Result<Json<CompleteDreamResponse>, HttpError> {
    let images = req
        .images
        .iter()
        .map(|image| decode_media(image))
        .collect::<Result<Vec<_>, _>>()?;
    let voice_clip = req.audio.as_deref().map(decode_media).transpose()?;

    let fragment = DreamFragment {
        text: req.text,
        images,
        voice_clip,
    };
    if fragment.is_empty() {
        return Err(PortError::Validation(
            "a text, image, or voice fragment is required".to_string(),
        )
        .into());
    }

    let completed_text = state.completion.complete_dream(&fragment).await?;

    // Narration is best-effort: a synthesis failure never blocks the
    // completed text from reaching the client.
    let voice_audio = match state.voice.synthesize_voice(&completed_text).await {
        Ok(audio) => audio.map(|bytes| STANDARD.encode(bytes)),
        Err(e) => {
            warn!("Voice synthesis failed: {}", e);
            None
        }
    };

    let content = fragment
        .text
        .as_deref()
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(str::to_string)
        .unwrap_or_else(|| UNTITLED_FRAGMENT.to_string());

    Ok(Json(CompleteDreamResponse {
        content,
        completed_text,
        voice_audio,
    }))
}

/// Accepts both raw base64 and browser data URLs (`data:...;base64,<payload>`).
fn decode_media(value: &str) -> Result<Vec<u8>, HttpError> {
    let payload = value.rsplit_once(',').map_or(value, |(_, payload)| payload);
    STANDARD
        .decode(payload)
        .map_err(|e| PortError::Validation(format!("invalid base64 media payload: {}", e)).into())
}
