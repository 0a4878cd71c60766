//! Support ticket route handlers
//!
//! New tickets are classified by the generative-language vendor, which
//! also drafts a first reply for the support agent to review.

use crate::auth::{require_role, Claims, Role};
use crate::db::queries::{self, ListQueryBuilder};
use crate::error::{not_found_error, validation_error, ApiResult, AppError};
use crate::models::{
    CreateTicketRequest, ListTicketsQuery, SuccessResponse, Ticket, TicketDraft,
    UpdateTicketRequest, TICKET_PRIORITIES, TICKET_STATUSES,
};
use crate::state::SharedState;
use crate::vendors::genai::TicketTriage;
use axum::{
    extract::{Extension, Path, Query, State},
    Json,
};
use chrono::Utc;
use rand::Rng;
use tracing::{debug, info, warn};
use validator::Validate;

const PERSIST_WARNING: &str = "Ticket was triaged but could not be saved";

/// GET /api/tickets
///
/// List tickets, optionally filtered by status, priority, or category.
pub async fn list_tickets(
    State(state): State<SharedState>,
    Query(params): Query<ListTicketsQuery>,
) -> ApiResult<Json<SuccessResponse<Vec<Ticket>>>> {
    debug!("Listing tickets");

    let limit = queries::clamp_limit(params.limit, 25, 100);
    let offset = params.offset.unwrap_or(0).max(0);

    let (sql, sql_params) = ListQueryBuilder::new(queries::LIST_TICKETS)
        .filter_eq("status", params.status)
        .filter_eq("priority", params.priority)
        .filter_eq("category", params.category)
        .build("created_at DESC", limit, offset);

    let client = state.db_pool.get().await?;
    let rows = client.query(&sql, &queries::param_refs(&sql_params)).await?;

    let tickets: Vec<Ticket> = rows.iter().map(Ticket::from_row).collect();

    info!("Listed {} tickets", tickets.len());

    Ok(Json(SuccessResponse::with_data(
        format!("{} tickets found.", tickets.len()),
        tickets,
    )))
}

/// GET /api/tickets/{id}
pub async fn get_ticket(
    State(state): State<SharedState>,
    Path(id): Path<i32>,
) -> ApiResult<Json<SuccessResponse<Ticket>>> {
    debug!("Getting ticket: {}", id);

    let client = state.db_pool.get().await?;

    let row = client
        .query_opt(
            &format!("{} WHERE id = $1", queries::LIST_TICKETS),
            &[&id],
        )
        .await?
        .ok_or_else(|| not_found_error(format!("Ticket {} not found", id)))?;

    Ok(Json(SuccessResponse::with_data(
        "Ticket fetched successfully.",
        Ticket::from_row(&row),
    )))
}

/// POST /api/tickets
///
/// Open a ticket; the vendor classifies it and drafts a suggested reply.
pub async fn create_ticket(
    State(state): State<SharedState>,
    Extension(claims): Extension<Claims>,
    Json(payload): Json<CreateTicketRequest>,
) -> ApiResult<Json<SuccessResponse<TicketDraft>>> {
    require_role(&claims, Role::Analyst)?;
    payload.validate().map_err(|e| validation_error(e.to_string()))?;

    debug!("Creating ticket: {}", payload.subject);

    let description = payload.description.as_deref().unwrap_or("");
    let triage = state.genai.triage_ticket(&payload.subject, description).await?;

    let ticket_number = generate_ticket_number();

    let mut warning = None;
    let id = match persist_ticket(&state, &ticket_number, &payload, &triage).await {
        Ok(id) => Some(id),
        Err(e) => {
            warn!("Failed to persist ticket {}: {}", ticket_number, e);
            warning = Some(PERSIST_WARNING.to_string());
            None
        }
    };

    info!(
        "Ticket {} created: category={} priority={} (id: {:?})",
        ticket_number, triage.category, triage.priority, id
    );

    Ok(Json(
        SuccessResponse::with_data(
            format!("Ticket {} created.", ticket_number),
            TicketDraft {
                id,
                ticket_number,
                subject: payload.subject,
                description: payload.description,
                requester_email: payload.requester_email,
                status: "open".to_string(),
                priority: triage.priority,
                category: triage.category,
                suggested_reply: triage.suggested_reply,
            },
        )
        .with_warning(warning),
    ))
}

/// PUT /api/tickets/{id}
///
/// Update a ticket's status or priority. Closing a ticket is admin-only.
pub async fn update_ticket(
    State(state): State<SharedState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<i32>,
    Json(payload): Json<UpdateTicketRequest>,
) -> ApiResult<Json<SuccessResponse<Ticket>>> {
    require_role(&claims, Role::Analyst)?;

    if payload.status.is_none() && payload.priority.is_none() {
        return Err(validation_error("Provide a status or a priority to update"));
    }
    if let Some(status) = &payload.status {
        if !TICKET_STATUSES.contains(&status.as_str()) {
            return Err(validation_error(format!(
                "Invalid status '{}', expected one of: {}",
                status,
                TICKET_STATUSES.join(", ")
            )));
        }
        if status == "closed" {
            require_role(&claims, Role::Admin)?;
        }
    }
    if let Some(priority) = &payload.priority {
        if !TICKET_PRIORITIES.contains(&priority.as_str()) {
            return Err(validation_error(format!(
                "Invalid priority '{}', expected one of: {}",
                priority,
                TICKET_PRIORITIES.join(", ")
            )));
        }
    }

    let client = state.db_pool.get().await?;

    let row = client
        .query_opt(
            "UPDATE tickets
             SET status = COALESCE($1, status),
                 priority = COALESCE($2, priority),
                 updated_at = $3
             WHERE id = $4
             RETURNING id, ticket_number, subject, description, requester_email, status, priority, category, suggested_reply, created_at, updated_at",
            &[&payload.status, &payload.priority, &Utc::now(), &id],
        )
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Ticket {} not found", id)))?;

    info!("Ticket {} updated", id);

    Ok(Json(SuccessResponse::with_data(
        "Ticket updated successfully.",
        Ticket::from_row(&row),
    )))
}

/// Insert one triaged ticket, returning its id
async fn persist_ticket(
    state: &SharedState,
    ticket_number: &str,
    payload: &CreateTicketRequest,
    triage: &TicketTriage,
) -> Result<i32, AppError> {
    let client = state.db_pool.get().await?;

    let now = Utc::now();
    let row = client
        .query_one(
            "INSERT INTO tickets (ticket_number, subject, description, requester_email, status, priority, category, suggested_reply, created_at, updated_at)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
             RETURNING id",
            &[
                &ticket_number,
                &payload.subject,
                &payload.description,
                &payload.requester_email,
                &"open",
                &triage.priority,
                &triage.category,
                &triage.suggested_reply,
                &now,
                &now,
            ],
        )
        .await?;

    Ok(row.get(0))
}

fn generate_ticket_number() -> String {
    let n: u32 = rand::thread_rng().gen_range(0..1_000_000);
    format!("TKT-{:06}", n)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ticket_number_format() {
        let number = generate_ticket_number();
        assert!(number.starts_with("TKT-"));
        assert_eq!(number.len(), 10);
        assert!(number[4..].chars().all(|c| c.is_ascii_digit()));
    }
}
