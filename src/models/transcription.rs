//! Transcription models and DTOs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio_postgres::Row;

/// A stored call-audio transcription
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Transcription {
    pub id: i32,
    pub file_name: Option<String>,
    pub language: Option<String>,
    pub transcript: String,
    pub duration_seconds: Option<f64>,
    pub audio_sha256: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Transcription {
    pub fn from_row(row: &Row) -> Self {
        Self {
            id: row.get("id"),
            file_name: row.get("file_name"),
            language: row.get("language"),
            transcript: row.get("transcript"),
            duration_seconds: row.get("duration_seconds"),
            audio_sha256: row.get("audio_sha256"),
            created_at: row.get("created_at"),
        }
    }
}

/// Query parameters for the transcriptions list endpoint
#[derive(Debug, Deserialize)]
pub struct ListTranscriptionsQuery {
    pub language: Option<String>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}
