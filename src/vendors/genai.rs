//! Generative-language API client
//!
//! Speaks the `generateContent` REST shape: prompt goes in as
//! `contents[].parts[].text`, the reply comes back as
//! `candidates[0].content.parts[0].text`. Every operation asks the model
//! for strict JSON and parses the reply into a typed struct.

use crate::config::VendorConfig;
use crate::error::AppError;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

const USER_AGENT: &str = concat!("lumina-api/", env!("CARGO_PKG_VERSION"));

/// Generative-language client errors
#[derive(Debug, Error)]
pub enum GenAiError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("API error {0}: {1}")]
    Api(u16, String),

    #[error("Empty response from model")]
    EmptyResponse,

    #[error("Parse error: {0}")]
    Parse(String),
}

impl From<GenAiError> for AppError {
    fn from(e: GenAiError) -> Self {
        AppError::Vendor(e.to_string())
    }
}

/// Sentiment analysis of a single customer comment
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SentimentAnalysis {
    pub sentiment: String,
    pub score: f64,
    #[serde(default)]
    pub keywords: Vec<String>,
}

/// Categorization and summary of a feedback entry
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeedbackTriage {
    pub category: String,
    pub priority: String,
    pub summary: String,
}

/// Classification and suggested reply for a support ticket
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TicketTriage {
    pub category: String,
    pub priority: String,
    pub suggested_reply: String,
}

/// One projected point of a forecast
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ForecastPoint {
    pub date: String,
    pub value: f64,
}

/// Forecast produced from a history series
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ForecastResult {
    pub points: Vec<ForecastPoint>,
    pub summary: String,
}

// generateContent response shape; only the reply text path is mapped
#[derive(Debug, Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Debug, Deserialize)]
struct CandidatePart {
    text: Option<String>,
}

/// Generative-language API client
#[derive(Clone)]
pub struct GenAiClient {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
    model: String,
}

impl GenAiClient {
    pub fn new(config: &VendorConfig) -> Result<Self, GenAiError> {
        let http = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| GenAiError::Network(e.to_string()))?;

        Ok(Self {
            http,
            base_url: config.genai_api_url.trim_end_matches('/').to_string(),
            api_key: config.genai_api_key.clone(),
            model: config.genai_model.clone(),
        })
    }

    /// Model identifier, recorded alongside persisted results
    pub fn model(&self) -> &str {
        &self.model
    }

    /// Send one prompt and return the raw reply text
    async fn generate(&self, prompt: &str) -> Result<String, GenAiError> {
        let url = format!(
            "{}/v1beta/models/{}:generateContent?key={}",
            self.base_url, self.model, self.api_key
        );

        let payload = serde_json::json!({
            "contents": [{ "parts": [{ "text": prompt }] }],
            "generationConfig": {
                "temperature": 0.2,
                "responseMimeType": "application/json"
            }
        });

        let response = self
            .http
            .post(&url)
            .json(&payload)
            .send()
            .await
            .map_err(|e| GenAiError::Network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(GenAiError::Api(status.as_u16(), body));
        }

        let parsed: GenerateContentResponse = response
            .json()
            .await
            .map_err(|e| GenAiError::Parse(e.to_string()))?;

        parsed
            .candidates
            .into_iter()
            .next()
            .and_then(|c| c.content)
            .and_then(|c| c.parts.into_iter().next())
            .and_then(|p| p.text)
            .ok_or(GenAiError::EmptyResponse)
    }

    /// Send one prompt and parse the reply as JSON of type `T`
    async fn generate_json<T: serde::de::DeserializeOwned>(&self, prompt: &str) -> Result<T, GenAiError> {
        let reply = self.generate(prompt).await?;
        let json = strip_code_fences(&reply);
        serde_json::from_str(json)
            .map_err(|e| GenAiError::Parse(format!("{} in model reply: {}", e, json)))
    }

    /// Classify the sentiment of one customer comment
    pub async fn analyze_sentiment(&self, content: &str) -> Result<SentimentAnalysis, GenAiError> {
        let prompt = format!(
            "Analyze the sentiment of the following customer comment. \
             Respond with JSON only, shaped as \
             {{\"sentiment\": \"positive\"|\"neutral\"|\"negative\", \
             \"score\": <number between -1 and 1>, \
             \"keywords\": [<up to 5 notable phrases>]}}.\n\nComment:\n{}",
            content
        );
        self.generate_json(&prompt).await
    }

    /// Categorize and summarize one feedback entry
    pub async fn triage_feedback(&self, content: &str) -> Result<FeedbackTriage, GenAiError> {
        let prompt = format!(
            "Triage the following customer feedback for a product team. \
             Respond with JSON only, shaped as \
             {{\"category\": \"bug\"|\"feature_request\"|\"complaint\"|\"praise\"|\"question\", \
             \"priority\": \"low\"|\"medium\"|\"high\", \
             \"summary\": <one sentence>}}.\n\nFeedback:\n{}",
            content
        );
        self.generate_json(&prompt).await
    }

    /// Classify a support ticket and draft a reply
    pub async fn triage_ticket(&self, subject: &str, description: &str) -> Result<TicketTriage, GenAiError> {
        let prompt = format!(
            "You are triaging a customer support ticket. \
             Respond with JSON only, shaped as \
             {{\"category\": \"billing\"|\"technical\"|\"account\"|\"shipping\"|\"other\", \
             \"priority\": \"low\"|\"medium\"|\"high\"|\"urgent\", \
             \"suggested_reply\": <a courteous first reply to the customer>}}.\n\n\
             Subject: {}\nDescription: {}",
            subject, description
        );
        self.generate_json(&prompt).await
    }

    /// Project a metric forward from its history
    pub async fn forecast(
        &self,
        metric: &str,
        horizon_days: i32,
        history: &str,
    ) -> Result<ForecastResult, GenAiError> {
        let prompt = format!(
            "Given the following daily history of the business metric \"{}\", \
             forecast the next {} days. Respond with JSON only, shaped as \
             {{\"points\": [{{\"date\": \"YYYY-MM-DD\", \"value\": <number>}}], \
             \"summary\": <one sentence on the expected trend>}}.\n\nHistory:\n{}",
            metric, horizon_days, history
        );
        self.generate_json(&prompt).await
    }
}

/// Strip Markdown code fences some models wrap around JSON replies
pub fn strip_code_fences(text: &str) -> &str {
    let trimmed = text.trim();
    let Some(inner) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    // Drop an optional language tag after the opening fence
    let inner = inner.strip_prefix("json").unwrap_or(inner);
    inner.trim_end_matches('`').trim()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_strip_code_fences_plain() {
        assert_eq!(strip_code_fences("{\"a\": 1}"), "{\"a\": 1}");
        assert_eq!(strip_code_fences("  {\"a\": 1}\n"), "{\"a\": 1}");
    }

    #[test]
    fn test_strip_code_fences_fenced() {
        assert_eq!(strip_code_fences("```json\n{\"a\": 1}\n```"), "{\"a\": 1}");
        assert_eq!(strip_code_fences("```\n{\"a\": 1}\n```"), "{\"a\": 1}");
    }

    #[test]
    fn test_parse_sentiment_reply() {
        let reply = "```json\n{\"sentiment\": \"negative\", \"score\": -0.7, \"keywords\": [\"late delivery\"]}\n```";
        let parsed: SentimentAnalysis = serde_json::from_str(strip_code_fences(reply)).unwrap();
        assert_eq!(parsed.sentiment, "negative");
        assert_eq!(parsed.score, -0.7);
        assert_eq!(parsed.keywords, vec!["late delivery".to_string()]);
    }

    #[test]
    fn test_parse_sentiment_reply_missing_keywords() {
        let parsed: SentimentAnalysis =
            serde_json::from_str("{\"sentiment\": \"positive\", \"score\": 0.9}").unwrap();
        assert!(parsed.keywords.is_empty());
    }

    #[test]
    fn test_candidate_text_extraction() {
        let body = r#"{
            "candidates": [
                {"content": {"parts": [{"text": "{\"category\": \"bug\"}"}]}}
            ]
        }"#;
        let parsed: GenerateContentResponse = serde_json::from_str(body).unwrap();
        let text = parsed
            .candidates
            .into_iter()
            .next()
            .and_then(|c| c.content)
            .and_then(|c| c.parts.into_iter().next())
            .and_then(|p| p.text)
            .unwrap();
        assert_eq!(text, "{\"category\": \"bug\"}");
    }

    #[test]
    fn test_empty_candidates() {
        let parsed: GenerateContentResponse = serde_json::from_str("{}").unwrap();
        assert!(parsed.candidates.is_empty());
    }
}
