//! Forecast route handlers
//!
//! A history series goes to the generative-language vendor, which returns
//! a projected point series and a one-line trend summary. The points are
//! stored as JSONB so the dashboard can chart them as-is.

use crate::auth::{require_role, Claims, Role};
use crate::db::queries::{self, ListQueryBuilder};
use crate::error::{validation_error, ApiResult, AppError};
use crate::models::{
    CreateForecastRequest, Forecast, HistoryPoint, ListForecastsQuery, SuccessResponse,
};
use crate::state::SharedState;
use crate::vendors::genai::ForecastResult;
use axum::{
    extract::{Extension, Query, State},
    Json,
};
use chrono::Utc;
use serde::Serialize;
use tracing::{debug, info, warn};
use validator::Validate;

const PERSIST_WARNING: &str = "Forecast was generated but could not be saved";

/// Forecast returned to the caller
///
/// `id` is present only when the row was persisted.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ForecastResponse {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<i32>,
    pub metric: String,
    pub horizon_days: i32,
    pub points: serde_json::Value,
    pub summary: String,
    pub model: String,
}

/// GET /api/forecasts
///
/// List stored forecasts, optionally filtered by metric.
pub async fn list_forecasts(
    State(state): State<SharedState>,
    Query(params): Query<ListForecastsQuery>,
) -> ApiResult<Json<SuccessResponse<Vec<Forecast>>>> {
    debug!("Listing forecasts");

    let limit = queries::clamp_limit(params.limit, 25, 100);
    let offset = params.offset.unwrap_or(0).max(0);

    let (sql, sql_params) = ListQueryBuilder::new(queries::LIST_FORECASTS)
        .filter_eq("metric", params.metric)
        .build("created_at DESC", limit, offset);

    let client = state.db_pool.get().await?;
    let rows = client.query(&sql, &queries::param_refs(&sql_params)).await?;

    let forecasts: Vec<Forecast> = rows.iter().map(Forecast::from_row).collect();

    info!("Listed {} forecasts", forecasts.len());

    Ok(Json(SuccessResponse::with_data(
        format!("{} forecasts found.", forecasts.len()),
        forecasts,
    )))
}

/// POST /api/forecasts
///
/// Generate a forecast from a metric's history and persist it.
pub async fn create_forecast(
    State(state): State<SharedState>,
    Extension(claims): Extension<Claims>,
    Json(payload): Json<CreateForecastRequest>,
) -> ApiResult<Json<SuccessResponse<ForecastResponse>>> {
    require_role(&claims, Role::Analyst)?;
    payload.validate().map_err(|e| validation_error(e.to_string()))?;

    debug!(
        "Forecasting {} over {} days from {} history points",
        payload.metric,
        payload.horizon_days,
        payload.history.len()
    );

    let history = render_history(&payload.history);
    let result = state
        .genai
        .forecast(&payload.metric, payload.horizon_days, &history)
        .await?;

    let points = serde_json::to_value(&result.points)
        .map_err(|e| AppError::Internal(format!("Failed to serialize forecast points: {}", e)))?;

    let mut warning = None;
    let id = match persist_forecast(&state, &payload, &result, &points).await {
        Ok(id) => Some(id),
        Err(e) => {
            warn!("Failed to persist forecast: {}", e);
            warning = Some(PERSIST_WARNING.to_string());
            None
        }
    };

    info!(
        "Forecast generated for {}: {} points (id: {:?})",
        payload.metric,
        result.points.len(),
        id
    );

    Ok(Json(
        SuccessResponse::with_data(
            "Forecast generated successfully.",
            ForecastResponse {
                id,
                metric: payload.metric,
                horizon_days: payload.horizon_days,
                points,
                summary: result.summary,
                model: state.genai.model().to_string(),
            },
        )
        .with_warning(warning),
    ))
}

/// Insert one forecast, returning its id
async fn persist_forecast(
    state: &SharedState,
    payload: &CreateForecastRequest,
    result: &ForecastResult,
    points: &serde_json::Value,
) -> Result<i32, AppError> {
    let client = state.db_pool.get().await?;

    let row = client
        .query_one(
            "INSERT INTO forecasts (metric, horizon_days, points, summary, model, created_at)
             VALUES ($1, $2, $3, $4, $5, $6)
             RETURNING id",
            &[
                &payload.metric,
                &payload.horizon_days,
                points,
                &result.summary,
                &state.genai.model(),
                &Utc::now(),
            ],
        )
        .await?;

    Ok(row.get(0))
}

/// Render the history series as `date,value` lines for the prompt
fn render_history(history: &[HistoryPoint]) -> String {
    history
        .iter()
        .map(|p| format!("{},{}", p.date, p.value))
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_render_history() {
        let history = vec![
            HistoryPoint { date: NaiveDate::from_ymd_opt(2026, 7, 1).unwrap(), value: 1200.0 },
            HistoryPoint { date: NaiveDate::from_ymd_opt(2026, 7, 2).unwrap(), value: 1350.5 },
        ];
        assert_eq!(render_history(&history), "2026-07-01,1200\n2026-07-02,1350.5");
    }
}
