//! Transcription route handlers
//!
//! Call audio is relayed to the speech-to-text vendor and the transcript
//! is persisted alongside a hash of the uploaded audio.

use crate::auth::{require_role, Claims, Role};
use crate::db::queries::{self, ListQueryBuilder};
use crate::error::{validation_error, ApiResult, AppError};
use crate::models::{ListTranscriptionsQuery, SuccessResponse, Transcription};
use crate::state::SharedState;
use crate::vendors::speech::TranscriptionResult;
use axum::{
    extract::{Extension, Multipart, Query, State},
    Json,
};
use chrono::Utc;
use serde::Serialize;
use sha2::{Digest, Sha256};
use tracing::{debug, info, warn};

const PERSIST_WARNING: &str = "Audio was transcribed but the transcript could not be saved";

/// Transcript returned to the caller
///
/// `id` is present only when the row was persisted.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TranscriptionResponse {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<i32>,
    pub file_name: String,
    pub language: Option<String>,
    pub transcript: String,
    pub duration_seconds: Option<f64>,
    pub audio_sha256: String,
}

/// GET /api/transcriptions
///
/// List stored transcriptions, optionally filtered by language.
pub async fn list_transcriptions(
    State(state): State<SharedState>,
    Query(params): Query<ListTranscriptionsQuery>,
) -> ApiResult<Json<SuccessResponse<Vec<Transcription>>>> {
    debug!("Listing transcriptions");

    let limit = queries::clamp_limit(params.limit, 25, 100);
    let offset = params.offset.unwrap_or(0).max(0);

    let (sql, sql_params) = ListQueryBuilder::new(queries::LIST_TRANSCRIPTIONS)
        .filter_eq("language", params.language)
        .build("created_at DESC", limit, offset);

    let client = state.db_pool.get().await?;
    let rows = client.query(&sql, &queries::param_refs(&sql_params)).await?;

    let transcriptions: Vec<Transcription> = rows.iter().map(Transcription::from_row).collect();

    info!("Listed {} transcriptions", transcriptions.len());

    Ok(Json(SuccessResponse::with_data(
        format!("{} transcriptions found.", transcriptions.len()),
        transcriptions,
    )))
}

/// POST /api/transcriptions
///
/// Transcribe one audio upload and persist the transcript.
///
/// Multipart field: `audio` (file).
pub async fn create_transcription(
    State(state): State<SharedState>,
    Extension(claims): Extension<Claims>,
    mut multipart: Multipart,
) -> ApiResult<Json<SuccessResponse<TranscriptionResponse>>> {
    require_role(&claims, Role::Analyst)?;

    let mut upload: Option<(String, String, Vec<u8>)> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| validation_error(format!("Malformed multipart body: {}", e)))?
    {
        if field.name() != Some("audio") {
            continue;
        }
        let file_name = field.file_name().unwrap_or("audio.wav").to_string();
        let content_type = field
            .content_type()
            .unwrap_or("application/octet-stream")
            .to_string();
        let data = field
            .bytes()
            .await
            .map_err(|e| validation_error(format!("Unreadable audio field: {}", e)))?;
        upload = Some((file_name, content_type, data.to_vec()));
    }

    let (file_name, content_type, data) =
        upload.ok_or_else(|| validation_error("An audio field is required"))?;
    if data.is_empty() {
        return Err(validation_error("Audio upload is empty"));
    }

    debug!("Transcribing {} ({} bytes)", file_name, data.len());

    let sha = format!("{:x}", Sha256::digest(&data));
    let result = state.speech.transcribe(data, &content_type).await?;

    let mut warning = None;
    let id = match persist_transcription(&state, &file_name, &result, &sha).await {
        Ok(id) => Some(id),
        Err(e) => {
            warn!("Failed to persist transcription: {}", e);
            warning = Some(PERSIST_WARNING.to_string());
            None
        }
    };

    info!("Audio transcribed: {} chars (id: {:?})", result.text.len(), id);

    Ok(Json(
        SuccessResponse::with_data(
            "Audio transcribed successfully.",
            TranscriptionResponse {
                id,
                file_name,
                language: result.language,
                transcript: result.text,
                duration_seconds: result.duration_seconds,
                audio_sha256: sha,
            },
        )
        .with_warning(warning),
    ))
}

/// Insert one transcription, returning its id
async fn persist_transcription(
    state: &SharedState,
    file_name: &str,
    result: &TranscriptionResult,
    sha: &str,
) -> Result<i32, AppError> {
    let client = state.db_pool.get().await?;

    let row = client
        .query_one(
            "INSERT INTO transcriptions (file_name, language, transcript, duration_seconds, audio_sha256, created_at)
             VALUES ($1, $2, $3, $4, $5, $6)
             RETURNING id",
            &[
                &file_name,
                &result.language,
                &result.text,
                &result.duration_seconds,
                &sha,
                &Utc::now(),
            ],
        )
        .await?;

    Ok(row.get(0))
}
