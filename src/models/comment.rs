//! Comment-related models and DTOs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio_postgres::Row;
use validator::Validate;

/// Review states a comment can move through
pub const COMMENT_STATUSES: &[&str] = &["new", "reviewed", "archived"];

/// A customer comment with its stored sentiment analysis
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Comment {
    pub id: i32,
    pub author_name: Option<String>,
    pub source: Option<String>,
    pub content: String,
    pub sentiment: String,
    pub sentiment_score: f64,
    pub keywords: Vec<String>,
    pub status: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Comment {
    pub fn from_row(row: &Row) -> Self {
        Self {
            id: row.get("id"),
            author_name: row.get("author_name"),
            source: row.get("source"),
            content: row.get("content"),
            sentiment: row.get("sentiment"),
            sentiment_score: row.get("sentiment_score"),
            keywords: row.get("keywords"),
            status: row.get("status"),
            created_at: row.get("created_at"),
            updated_at: row.get("updated_at"),
        }
    }
}

/// Analysis result returned to the caller
///
/// `id` is present only when the row was persisted; a failed write leaves
/// it unset and the response carries a warning instead.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CommentAnalysis {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<i32>,
    pub author_name: Option<String>,
    pub source: Option<String>,
    pub content: String,
    pub sentiment: String,
    pub sentiment_score: f64,
    pub keywords: Vec<String>,
    pub status: String,
}

/// Request to analyze a single comment
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct AnalyzeCommentRequest {
    #[validate(length(min = 1, max = 8000, message = "Comment content must be between 1 and 8000 characters"))]
    pub content: String,

    #[serde(default)]
    pub author_name: Option<String>,

    #[serde(default)]
    pub source: Option<String>,
}

/// Request to analyze a batch of comments
#[derive(Debug, Deserialize)]
pub struct BatchAnalyzeCommentsRequest {
    pub items: Vec<AnalyzeCommentRequest>,
}

/// Request to update a comment's review status
#[derive(Debug, Deserialize)]
pub struct UpdateCommentRequest {
    pub status: String,
}

/// Query parameters for the comments list endpoint
#[derive(Debug, Deserialize)]
pub struct ListCommentsQuery {
    pub sentiment: Option<String>,
    pub source: Option<String>,
    pub status: Option<String>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_content_fails_validation() {
        let req = AnalyzeCommentRequest {
            content: String::new(),
            author_name: None,
            source: None,
        };
        assert!(req.validate().is_err());
    }

    #[test]
    fn test_valid_request_passes() {
        let req = AnalyzeCommentRequest {
            content: "Great product, slow shipping".to_string(),
            author_name: Some("Dana".to_string()),
            source: Some("app_store".to_string()),
        };
        assert!(req.validate().is_ok());
    }
}
