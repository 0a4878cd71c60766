//! Feedback-related models and DTOs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio_postgres::Row;
use validator::Validate;

/// Priorities the triage model may assign
pub const FEEDBACK_PRIORITIES: &[&str] = &["low", "medium", "high"];

/// Categories the triage model may assign
pub const FEEDBACK_CATEGORIES: &[&str] =
    &["bug", "feature_request", "complaint", "praise", "question"];

/// A feedback entry with its stored triage result
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Feedback {
    pub id: i32,
    pub customer_name: Option<String>,
    pub channel: Option<String>,
    pub content: String,
    pub category: String,
    pub priority: String,
    pub summary: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Feedback {
    pub fn from_row(row: &Row) -> Self {
        Self {
            id: row.get("id"),
            customer_name: row.get("customer_name"),
            channel: row.get("channel"),
            content: row.get("content"),
            category: row.get("category"),
            priority: row.get("priority"),
            summary: row.get("summary"),
            created_at: row.get("created_at"),
            updated_at: row.get("updated_at"),
        }
    }
}

/// Triage result returned to the caller
///
/// `id` is present only when the row was persisted.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedbackAnalysis {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<i32>,
    pub customer_name: Option<String>,
    pub channel: Option<String>,
    pub content: String,
    pub category: String,
    pub priority: String,
    pub summary: String,
}

/// Request to triage a single feedback entry
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct SubmitFeedbackRequest {
    #[validate(length(min = 1, max = 8000, message = "Feedback content must be between 1 and 8000 characters"))]
    pub content: String,

    #[serde(default)]
    pub customer_name: Option<String>,

    #[serde(default)]
    pub channel: Option<String>,
}

/// Request to triage a batch of feedback entries
#[derive(Debug, Deserialize)]
pub struct BatchSubmitFeedbackRequest {
    pub items: Vec<SubmitFeedbackRequest>,
}

/// Request to override category or priority on a feedback entry
#[derive(Debug, Deserialize)]
pub struct UpdateFeedbackRequest {
    pub category: Option<String>,
    pub priority: Option<String>,
}

/// Query parameters for the feedback list endpoint
#[derive(Debug, Deserialize)]
pub struct ListFeedbackQuery {
    pub channel: Option<String>,
    pub category: Option<String>,
    pub priority: Option<String>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}
