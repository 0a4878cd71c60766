//! Speech-to-text vendor client
//!
//! Uploads raw call audio and returns the transcript the vendor produced.

use crate::config::VendorConfig;
use crate::error::AppError;
use serde::Deserialize;
use std::time::Duration;
use thiserror::Error;

const USER_AGENT: &str = concat!("lumina-api/", env!("CARGO_PKG_VERSION"));

/// Speech client errors
#[derive(Debug, Error)]
pub enum SpeechError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("API error {0}: {1}")]
    Api(u16, String),

    #[error("Parse error: {0}")]
    Parse(String),
}

impl From<SpeechError> for AppError {
    fn from(e: SpeechError) -> Self {
        AppError::Vendor(e.to_string())
    }
}

/// Transcription result for one audio upload
#[derive(Debug, Clone, Deserialize)]
pub struct TranscriptionResult {
    #[serde(alias = "transcript")]
    pub text: String,
    #[serde(default, alias = "language_code")]
    pub language: Option<String>,
    #[serde(default, alias = "audio_duration")]
    pub duration_seconds: Option<f64>,
}

/// Speech-to-text API client
#[derive(Clone)]
pub struct SpeechClient {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl SpeechClient {
    pub fn new(config: &VendorConfig) -> Result<Self, SpeechError> {
        let http = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| SpeechError::Network(e.to_string()))?;

        Ok(Self {
            http,
            base_url: config.speech_api_url.trim_end_matches('/').to_string(),
            api_key: config.speech_api_key.clone(),
        })
    }

    /// Transcribe one audio file
    pub async fn transcribe(
        &self,
        audio: Vec<u8>,
        content_type: &str,
    ) -> Result<TranscriptionResult, SpeechError> {
        let url = format!("{}/v1/transcribe", self.base_url);

        let response = self
            .http
            .post(&url)
            .header("authorization", &self.api_key)
            .header("content-type", content_type)
            .body(audio)
            .send()
            .await
            .map_err(|e| SpeechError::Network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(SpeechError::Api(status.as_u16(), body));
        }

        response
            .json()
            .await
            .map_err(|e| SpeechError::Parse(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_vendor_field_names() {
        let body = r#"{"transcript": "hello there", "language_code": "en", "audio_duration": 4.2}"#;
        let result: TranscriptionResult = serde_json::from_str(body).unwrap();
        assert_eq!(result.text, "hello there");
        assert_eq!(result.language.as_deref(), Some("en"));
        assert_eq!(result.duration_seconds, Some(4.2));
    }

    #[test]
    fn test_parse_minimal_response() {
        let result: TranscriptionResult = serde_json::from_str(r#"{"text": "hi"}"#).unwrap();
        assert_eq!(result.text, "hi");
        assert!(result.language.is_none());
        assert!(result.duration_seconds.is_none());
    }
}
