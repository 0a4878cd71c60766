//! Comment route handlers
//!
//! Customer comments are run through the generative-language vendor for
//! sentiment analysis and persisted. The vendor result is the payload the
//! caller came for, so a failed database write only adds a warning.

use crate::auth::{require_role, Claims, Role};
use crate::db::queries::{self, ListQueryBuilder};
use crate::error::{validation_error, ApiResult, AppError};
use crate::models::{
    AnalyzeCommentRequest, BatchAnalyzeCommentsRequest, BatchItemResult, Comment, CommentAnalysis,
    ListCommentsQuery, SuccessResponse, UpdateCommentRequest, COMMENT_STATUSES,
};
use crate::state::SharedState;
use crate::vendors::genai::SentimentAnalysis;
use axum::{
    extract::{Extension, Path, Query, State},
    Json,
};
use chrono::Utc;
use tracing::{debug, info, warn};
use validator::Validate;

/// Maximum number of comments accepted by the batch endpoint
pub const BATCH_LIMIT: usize = 50;

const PERSIST_WARNING: &str = "Analysis completed but the result could not be saved";

/// GET /api/comments
///
/// List stored comments, optionally filtered by sentiment, source, or status.
pub async fn list_comments(
    State(state): State<SharedState>,
    Query(params): Query<ListCommentsQuery>,
) -> ApiResult<Json<SuccessResponse<Vec<Comment>>>> {
    debug!("Listing comments");

    let limit = queries::clamp_limit(params.limit, 25, 100);
    let offset = params.offset.unwrap_or(0).max(0);

    let (sql, sql_params) = ListQueryBuilder::new(queries::LIST_COMMENTS)
        .filter_eq("sentiment", params.sentiment)
        .filter_eq("source", params.source)
        .filter_eq("status", params.status)
        .build("created_at DESC", limit, offset);

    let client = state.db_pool.get().await?;
    let rows = client.query(&sql, &queries::param_refs(&sql_params)).await?;

    let comments: Vec<Comment> = rows.iter().map(Comment::from_row).collect();

    info!("Listed {} comments", comments.len());

    Ok(Json(SuccessResponse::with_data(
        format!("{} comments found.", comments.len()),
        comments,
    )))
}

/// POST /api/comments
///
/// Analyze one comment and persist the result.
pub async fn analyze_comment(
    State(state): State<SharedState>,
    Extension(claims): Extension<Claims>,
    Json(payload): Json<AnalyzeCommentRequest>,
) -> ApiResult<Json<SuccessResponse<CommentAnalysis>>> {
    require_role(&claims, Role::Analyst)?;
    payload.validate().map_err(|e| validation_error(e.to_string()))?;

    debug!("Analyzing comment ({} chars)", payload.content.len());

    let analysis = state.genai.analyze_sentiment(&payload.content).await?;

    let mut warning = None;
    let id = match persist_comment(&state, &payload, &analysis).await {
        Ok(id) => Some(id),
        Err(e) => {
            warn!("Failed to persist comment analysis: {}", e);
            warning = Some(PERSIST_WARNING.to_string());
            None
        }
    };

    info!("Comment analyzed: sentiment={} (id: {:?})", analysis.sentiment, id);

    Ok(Json(
        SuccessResponse::with_data(
            "Comment analyzed successfully.",
            to_response(id, &payload, analysis),
        )
        .with_warning(warning),
    ))
}

/// POST /api/comments/batch
///
/// Analyze up to [`BATCH_LIMIT`] comments sequentially. Per-item failures
/// land in the response array; the batch itself never aborts part-way.
pub async fn analyze_comments_batch(
    State(state): State<SharedState>,
    Extension(claims): Extension<Claims>,
    Json(payload): Json<BatchAnalyzeCommentsRequest>,
) -> ApiResult<Json<SuccessResponse<Vec<BatchItemResult<CommentAnalysis>>>>> {
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

    debug!("Analyzing batch of {} comments", payload.items.len());

    let mut results = Vec::with_capacity(payload.items.len());

    for (index, item) in payload.items.iter().enumerate() {
        if let Err(e) = item.validate() {
            results.push(BatchItemResult::failed(index, e.to_string()));
            continue;
        }

        match state.genai.analyze_sentiment(&item.content).await {
            Ok(analysis) => {
                let mut warning = None;
                let id = match persist_comment(&state, item, &analysis).await {
                    Ok(id) => Some(id),
                    Err(e) => {
                        warn!("Failed to persist batch comment {}: {}", index, e);
                        warning = Some(PERSIST_WARNING.to_string());
                        None
                    }
                };
                results.push(BatchItemResult::ok(index, to_response(id, item, analysis), warning));
            }
            Err(e) => {
                warn!("Vendor call failed for batch comment {}: {}", index, e);
                results.push(BatchItemResult::failed(index, e.to_string()));
            }
        }
    }

    let succeeded = results.iter().filter(|r| r.success).count();
    info!("Comment batch finished: {}/{} succeeded", succeeded, results.len());

    Ok(Json(SuccessResponse::with_data(
        format!("{} of {} comments analyzed.", succeeded, results.len()),
        results,
    )))
}

/// PUT /api/comments/{id}
///
/// Update a comment's review status.
pub async fn update_comment(
    State(state): State<SharedState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<i32>,
    Json(payload): Json<UpdateCommentRequest>,
) -> ApiResult<Json<SuccessResponse<Comment>>> {
    require_role(&claims, Role::Analyst)?;

    if !COMMENT_STATUSES.contains(&payload.status.as_str()) {
        return Err(validation_error(format!(
            "Invalid status '{}', expected one of: {}",
            payload.status,
            COMMENT_STATUSES.join(", ")
        )));
    }

    let client = state.db_pool.get().await?;

    let row = client
        .query_opt(
            "UPDATE comments SET status = $1, updated_at = $2 WHERE id = $3
             RETURNING id, author_name, source, content, sentiment, sentiment_score, keywords, status, created_at, updated_at",
            &[&payload.status, &Utc::now(), &id],
        )
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Comment {} not found", id)))?;

    info!("Comment {} moved to status '{}'", id, payload.status);

    Ok(Json(SuccessResponse::with_data(
        "Comment updated successfully.",
        Comment::from_row(&row),
    )))
}

/// Insert one analyzed comment, returning its id
async fn persist_comment(
    state: &SharedState,
    payload: &AnalyzeCommentRequest,
    analysis: &SentimentAnalysis,
) -> Result<i32, AppError> {
    let client = state.db_pool.get().await?;

    let now = Utc::now();
    let row = client
        .query_one(
            "INSERT INTO comments (author_name, source, content, sentiment, sentiment_score, keywords, status, created_at, updated_at)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
             RETURNING id",
            &[
                &payload.author_name,
                &payload.source,
                &payload.content,
                &analysis.sentiment,
                &analysis.score,
                &analysis.keywords,
                &"new",
                &now,
                &now,
            ],
        )
        .await?;

    Ok(row.get(0))
}

fn to_response(id: Option<i32>, payload: &AnalyzeCommentRequest, analysis: SentimentAnalysis) -> CommentAnalysis {
    CommentAnalysis {
        id,
        author_name: payload.author_name.clone(),
        source: payload.source.clone(),
        content: payload.content.clone(),
        sentiment: analysis.sentiment,
        sentiment_score: analysis.score,
        keywords: analysis.keywords,
        status: "new".to_string(),
    }
}
