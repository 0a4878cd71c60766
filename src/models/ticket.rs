//! Ticket-related models and DTOs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio_postgres::Row;
use validator::Validate;

/// Lifecycle states of a support ticket
pub const TICKET_STATUSES: &[&str] = &["open", "in_progress", "resolved", "closed"];

/// Priorities the triage model may assign
pub const TICKET_PRIORITIES: &[&str] = &["low", "medium", "high", "urgent"];

/// A support ticket with its stored triage result
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Ticket {
    pub id: i32,
    pub ticket_number: String,
    pub subject: String,
    pub description: Option<String>,
    pub requester_email: String,
    pub status: String,
    pub priority: String,
    pub category: String,
    pub suggested_reply: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Ticket {
    pub fn from_row(row: &Row) -> Self {
        Self {
            id: row.get("id"),
            ticket_number: row.get("ticket_number"),
            subject: row.get("subject"),
            description: row.get("description"),
            requester_email: row.get("requester_email"),
            status: row.get("status"),
            priority: row.get("priority"),
            category: row.get("category"),
            suggested_reply: row.get("suggested_reply"),
            created_at: row.get("created_at"),
            updated_at: row.get("updated_at"),
        }
    }
}

/// Creation result returned to the caller
///
/// `id` is present only when the row was persisted.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TicketDraft {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<i32>,
    pub ticket_number: String,
    pub subject: String,
    pub description: Option<String>,
    pub requester_email: String,
    pub status: String,
    pub priority: String,
    pub category: String,
    pub suggested_reply: String,
}

/// Request to open a new support ticket
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateTicketRequest {
    #[validate(length(min = 1, max = 500, message = "Subject must be between 1 and 500 characters"))]
    pub subject: String,

    #[serde(default)]
    pub description: Option<String>,

    #[validate(email(message = "A valid requester email is required"))]
    pub requester_email: String,
}

/// Request to update a ticket's status or priority
#[derive(Debug, Deserialize)]
pub struct UpdateTicketRequest {
    pub status: Option<String>,
    pub priority: Option<String>,
}

/// Query parameters for the tickets list endpoint
#[derive(Debug, Deserialize)]
pub struct ListTicketsQuery {
    pub status: Option<String>,
    pub priority: Option<String>,
    pub category: Option<String>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_requester_email_is_validated() {
        let req = CreateTicketRequest {
            subject: "Refund for order 1182".to_string(),
            description: None,
            requester_email: "not-an-email".to_string(),
        };
        assert!(req.validate().is_err());
    }
}
