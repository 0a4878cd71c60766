//! Application state management
//!
//! Contains shared state accessible across all handlers.

use crate::vendors::{GenAiClient, OcrClient, SpeechClient};
use deadpool_postgres::Pool;
use std::sync::Arc;

/// Application state shared across all handlers
pub struct AppState {
    /// Database connection pool (required)
    pub db_pool: Pool,

    /// Generative-language vendor client
    pub genai: GenAiClient,

    /// OCR vendor client
    pub ocr: OcrClient,

    /// Speech-to-text vendor client
    pub speech: SpeechClient,
}

impl AppState {
    pub fn new(pool: Pool, genai: GenAiClient, ocr: OcrClient, speech: SpeechClient) -> Self {
        Self {
            db_pool: pool,
            genai,
            ocr,
            speech,
        }
    }
}

/// Type alias for shared state
pub type SharedState = Arc<AppState>;
