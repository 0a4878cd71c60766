//! Feedback route handlers
//!
//! Feedback entries are triaged by the generative-language vendor
//! (category, priority, one-line summary) and persisted. Analysts can
//! override the assigned category or priority afterwards.

use crate::auth::{require_role, Claims, Role};
use crate::db::queries::{self, ListQueryBuilder};
use crate::error::{validation_error, ApiResult, AppError};
use crate::models::{
    BatchItemResult, BatchSubmitFeedbackRequest, Feedback, FeedbackAnalysis, ListFeedbackQuery,
    SubmitFeedbackRequest, SuccessResponse, UpdateFeedbackRequest, FEEDBACK_CATEGORIES,
    FEEDBACK_PRIORITIES,
};
use crate::state::SharedState;
use crate::vendors::genai::FeedbackTriage;
use axum::{
    extract::{Extension, Path, Query, State},
    Json,
};
use chrono::Utc;
use tracing::{debug, info, warn};
use validator::Validate;

/// Maximum number of entries accepted by the batch endpoint
pub const BATCH_LIMIT: usize = 20;

const PERSIST_WARNING: &str = "Triage completed but the result could not be saved";

/// GET /api/feedback
///
/// List stored feedback, optionally filtered by channel, category, or priority.
pub async fn list_feedback(
    State(state): State<SharedState>,
    Query(params): Query<ListFeedbackQuery>,
) -> ApiResult<Json<SuccessResponse<Vec<Feedback>>>> {
    debug!("Listing feedback");

    let limit = queries::clamp_limit(params.limit, 25, 100);
    let offset = params.offset.unwrap_or(0).max(0);

    let (sql, sql_params) = ListQueryBuilder::new(queries::LIST_FEEDBACK)
        .filter_eq("channel", params.channel)
        .filter_eq("category", params.category)
        .filter_eq("priority", params.priority)
        .build("created_at DESC", limit, offset);

    let client = state.db_pool.get().await?;
    let rows = client.query(&sql, &queries::param_refs(&sql_params)).await?;

    let entries: Vec<Feedback> = rows.iter().map(Feedback::from_row).collect();

    info!("Listed {} feedback entries", entries.len());

    Ok(Json(SuccessResponse::with_data(
        format!("{} feedback entries found.", entries.len()),
        entries,
    )))
}

/// POST /api/feedback
///
/// Triage one feedback entry and persist the result.
pub async fn submit_feedback(
    State(state): State<SharedState>,
    Extension(claims): Extension<Claims>,
    Json(payload): Json<SubmitFeedbackRequest>,
) -> ApiResult<Json<SuccessResponse<FeedbackAnalysis>>> {
    require_role(&claims, Role::Analyst)?;
    payload.validate().map_err(|e| validation_error(e.to_string()))?;

    debug!("Triaging feedback ({} chars)", payload.content.len());

    let triage = state.genai.triage_feedback(&payload.content).await?;

    let mut warning = None;
    let id = match persist_feedback(&state, &payload, &triage).await {
        Ok(id) => Some(id),
        Err(e) => {
            warn!("Failed to persist feedback triage: {}", e);
            warning = Some(PERSIST_WARNING.to_string());
            None
        }
    };

    info!(
        "Feedback triaged: category={} priority={} (id: {:?})",
        triage.category, triage.priority, id
    );

    Ok(Json(
        SuccessResponse::with_data(
            "Feedback triaged successfully.",
            to_response(id, &payload, triage),
        )
        .with_warning(warning),
    ))
}

/// POST /api/feedback/batch
///
/// Triage up to [`BATCH_LIMIT`] feedback entries sequentially, collecting
/// per-item outcomes.
pub async fn submit_feedback_batch(
    State(state): State<SharedState>,
    Extension(claims): Extension<Claims>,
    Json(payload): Json<BatchSubmitFeedbackRequest>,
) -> ApiResult<Json<SuccessResponse<Vec<BatchItemResult<FeedbackAnalysis>>>>> {
    require_role(&claims, Role::Analyst)?;

    if payload.items.is_empty() {
        return Err(validation_error("Batch must contain at least one item"));
    }
    if payload.items.len() > BATCH_LIMIT {
        return Err(validation_error(format!(
            "Batch size {} exceeds the limit of {}",
            payload.items.len(),
            BATCH_LIMIT
        )));
    }

    debug!("Triaging batch of {} feedback entries", payload.items.len());

    let mut results = Vec::with_capacity(payload.items.len());

    for (index, item) in payload.items.iter().enumerate() {
        if let Err(e) = item.validate() {
            results.push(BatchItemResult::failed(index, e.to_string()));
            continue;
        }

        match state.genai.triage_feedback(&item.content).await {
            Ok(triage) => {
                let mut warning = None;
                let id = match persist_feedback(&state, item, &triage).await {
                    Ok(id) => Some(id),
                    Err(e) => {
                        warn!("Failed to persist batch feedback {}: {}", index, e);
                        warning = Some(PERSIST_WARNING.to_string());
                        None
                    }
                };
                results.push(BatchItemResult::ok(index, to_response(id, item, triage), warning));
            }
            Err(e) => {
                warn!("Vendor call failed for batch feedback {}: {}", index, e);
                results.push(BatchItemResult::failed(index, e.to_string()));
            }
        }
    }

    let succeeded = results.iter().filter(|r| r.success).count();
    info!("Feedback batch finished: {}/{} succeeded", succeeded, results.len());

    Ok(Json(SuccessResponse::with_data(
        format!("{} of {} feedback entries triaged.", succeeded, results.len()),
        results,
    )))
}

/// PUT /api/feedback/{id}
///
/// Override the category or priority on a feedback entry.
pub async fn update_feedback(
    State(state): State<SharedState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<i32>,
    Json(payload): Json<UpdateFeedbackRequest>,
) -> ApiResult<Json<SuccessResponse<Feedback>>> {
    require_role(&claims, Role::Analyst)?;

    if payload.category.is_none() && payload.priority.is_none() {
        return Err(validation_error("Provide a category or a priority to update"));
    }
    if let Some(category) = &payload.category {
        if !FEEDBACK_CATEGORIES.contains(&category.as_str()) {
            return Err(validation_error(format!(
                "Invalid category '{}', expected one of: {}",
                category,
                FEEDBACK_CATEGORIES.join(", ")
            )));
        }
    }
    if let Some(priority) = &payload.priority {
        if !FEEDBACK_PRIORITIES.contains(&priority.as_str()) {
            return Err(validation_error(format!(
                "Invalid priority '{}', expected one of: {}",
                priority,
                FEEDBACK_PRIORITIES.join(", ")
            )));
        }
    }

    let client = state.db_pool.get().await?;

    let row = client
        .query_opt(
            "UPDATE feedback
             SET category = COALESCE($1, category),
                 priority = COALESCE($2, priority),
                 updated_at = $3
             WHERE id = $4
             RETURNING id, customer_name, channel, content, category, priority, summary, created_at, updated_at",
            &[&payload.category, &payload.priority, &Utc::now(), &id],
        )
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Feedback entry {} not found", id)))?;

    info!("Feedback {} updated", id);

    Ok(Json(SuccessResponse::with_data(
        "Feedback updated successfully.",
        Feedback::from_row(&row),
    )))
}

/// Insert one triaged feedback entry, returning its id
async fn persist_feedback(
    state: &SharedState,
    payload: &SubmitFeedbackRequest,
    triage: &FeedbackTriage,
) -> Result<i32, AppError> {
    let client = state.db_pool.get().await?;

    let now = Utc::now();
    let row = client
        .query_one(
            "INSERT INTO feedback (customer_name, channel, content, category, priority, summary, created_at, updated_at)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
             RETURNING id",
            &[
                &payload.customer_name,
                &payload.channel,
                &payload.content,
                &triage.category,
                &triage.priority,
                &triage.summary,
                &now,
                &now,
            ],
        )
        .await?;

    Ok(row.get(0))
}

fn to_response(id: Option<i32>, payload: &SubmitFeedbackRequest, triage: FeedbackTriage) -> FeedbackAnalysis {
    FeedbackAnalysis {
        id,
        customer_name: payload.customer_name.clone(),
        channel: payload.channel.clone(),
        content: payload.content.clone(),
        category: triage.category,
        priority: triage.priority,
        summary: triage.summary,
    }
}
