//! Forecast models and DTOs

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use tokio_postgres::Row;
use validator::Validate;

/// A stored forecast with its projected point series
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Forecast {
    pub id: i32,
    pub metric: String,
    pub horizon_days: i32,
    pub points: serde_json::Value,
    pub summary: Option<String>,
    pub model: String,
    pub created_at: DateTime<Utc>,
}

impl Forecast {
    pub fn from_row(row: &Row) -> Self {
        Self {
            id: row.get("id"),
            metric: row.get("metric"),
            horizon_days: row.get("horizon_days"),
            points: row.get("points"),
            summary: row.get("summary"),
            model: row.get("model"),
            created_at: row.get("created_at"),
        }
    }
}

/// One observed value in a metric's history
#[derive(Debug, Deserialize, Serialize)]
pub struct HistoryPoint {
    pub date: NaiveDate,
    pub value: f64,
}

/// Request to generate a forecast from a history series
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateForecastRequest {
    #[validate(length(min = 1, max = 100, message = "Metric name must be between 1 and 100 characters"))]
    pub metric: String,

    #[validate(range(min = 1, max = 365, message = "Horizon must be between 1 and 365 days"))]
    pub horizon_days: i32,

    #[validate(length(min = 2, message = "At least two history points are required"))]
    pub history: Vec<HistoryPoint>,
}

/// Query parameters for the forecasts list endpoint
#[derive(Debug, Deserialize)]
pub struct ListForecastsQuery {
    pub metric: Option<String>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_history_too_short_fails_validation() {
        let req = CreateForecastRequest {
            metric: "daily_revenue".to_string(),
            horizon_days: 14,
            history: vec![HistoryPoint {
                date: NaiveDate::from_ymd_opt(2026, 7, 1).unwrap(),
                value: 1200.0,
            }],
        };
        assert!(req.validate().is_err());
    }

    #[test]
    fn test_horizon_bounds() {
        let mk = |horizon_days| CreateForecastRequest {
            metric: "daily_revenue".to_string(),
            horizon_days,
            history: vec![
                HistoryPoint { date: NaiveDate::from_ymd_opt(2026, 7, 1).unwrap(), value: 1200.0 },
                HistoryPoint { date: NaiveDate::from_ymd_opt(2026, 7, 2).unwrap(), value: 1350.0 },
            ],
        };
        assert!(mk(0).validate().is_err());
        assert!(mk(366).validate().is_err());
        assert!(mk(30).validate().is_ok());
    }
}
