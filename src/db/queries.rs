//! SQL query constants and builders
//!
//! Contains the schema bootstrap DDL, the SELECT bases for list endpoints,
//! and the conditional filter builder used by every GET list handler.

use tokio_postgres::types::ToSql;

/// Tables created at startup, in dependency order
pub const SCHEMA_TABLES: &[&str] = &[
    r#"CREATE TABLE IF NOT EXISTS users (
        id UUID PRIMARY KEY,
        email VARCHAR(255) UNIQUE NOT NULL,
        password_hash VARCHAR(255) NOT NULL,
        name VARCHAR(255),
        role VARCHAR(20) NOT NULL DEFAULT 'viewer',
        created_at TIMESTAMPTZ NOT NULL DEFAULT CURRENT_TIMESTAMP,
        updated_at TIMESTAMPTZ NOT NULL DEFAULT CURRENT_TIMESTAMP
    )"#,
    r#"CREATE TABLE IF NOT EXISTS comments (
        id SERIAL PRIMARY KEY,
        author_name VARCHAR(255),
        source VARCHAR(50),
        content TEXT NOT NULL,
        sentiment VARCHAR(20) NOT NULL,
        sentiment_score DOUBLE PRECISION NOT NULL,
        keywords TEXT[] NOT NULL DEFAULT '{}',
        status VARCHAR(20) NOT NULL DEFAULT 'new',
        created_at TIMESTAMPTZ NOT NULL DEFAULT CURRENT_TIMESTAMP,
        updated_at TIMESTAMPTZ NOT NULL DEFAULT CURRENT_TIMESTAMP
    )"#,
    r#"CREATE TABLE IF NOT EXISTS feedback (
        id SERIAL PRIMARY KEY,
        customer_name VARCHAR(255),
        channel VARCHAR(50),
        content TEXT NOT NULL,
        category VARCHAR(50) NOT NULL,
        priority VARCHAR(20) NOT NULL,
        summary TEXT,
        created_at TIMESTAMPTZ NOT NULL DEFAULT CURRENT_TIMESTAMP,
        updated_at TIMESTAMPTZ NOT NULL DEFAULT CURRENT_TIMESTAMP
    )"#,
    r#"CREATE TABLE IF NOT EXISTS tickets (
        id SERIAL PRIMARY KEY,
        ticket_number VARCHAR(20) UNIQUE NOT NULL,
        subject VARCHAR(500) NOT NULL,
        description TEXT,
        requester_email VARCHAR(255) NOT NULL,
        status VARCHAR(20) NOT NULL DEFAULT 'open',
        priority VARCHAR(20) NOT NULL,
        category VARCHAR(50) NOT NULL,
        suggested_reply TEXT,
        created_at TIMESTAMPTZ NOT NULL DEFAULT CURRENT_TIMESTAMP,
        updated_at TIMESTAMPTZ NOT NULL DEFAULT CURRENT_TIMESTAMP
    )"#,
    r#"CREATE TABLE IF NOT EXISTS price_records (
        id SERIAL PRIMARY KEY,
        competitor VARCHAR(255) NOT NULL,
        product_name VARCHAR(500) NOT NULL,
        price DOUBLE PRECISION NOT NULL,
        currency VARCHAR(10) NOT NULL,
        raw_text TEXT,
        image_sha256 VARCHAR(64),
        created_at TIMESTAMPTZ NOT NULL DEFAULT CURRENT_TIMESTAMP,
        updated_at TIMESTAMPTZ NOT NULL DEFAULT CURRENT_TIMESTAMP
    )"#,
    r#"CREATE TABLE IF NOT EXISTS forecasts (
        id SERIAL PRIMARY KEY,
        metric VARCHAR(100) NOT NULL,
        horizon_days INTEGER NOT NULL,
        points JSONB NOT NULL,
        summary TEXT,
        model VARCHAR(100) NOT NULL,
        created_at TIMESTAMPTZ NOT NULL DEFAULT CURRENT_TIMESTAMP
    )"#,
    r#"CREATE TABLE IF NOT EXISTS transcriptions (
        id SERIAL PRIMARY KEY,
        file_name VARCHAR(500),
        language VARCHAR(20),
        transcript TEXT NOT NULL,
        duration_seconds DOUBLE PRECISION,
        audio_sha256 VARCHAR(64),
        created_at TIMESTAMPTZ NOT NULL DEFAULT CURRENT_TIMESTAMP
    )"#,
];

/// Secondary indexes for the list endpoints
pub const SCHEMA_INDEXES: &[&str] = &[
    "CREATE INDEX IF NOT EXISTS idx_comments_sentiment ON comments(sentiment)",
    "CREATE INDEX IF NOT EXISTS idx_comments_status ON comments(status)",
    "CREATE INDEX IF NOT EXISTS idx_feedback_category ON feedback(category)",
    "CREATE INDEX IF NOT EXISTS idx_tickets_status ON tickets(status)",
    "CREATE INDEX IF NOT EXISTS idx_price_records_competitor ON price_records(competitor)",
    "CREATE INDEX IF NOT EXISTS idx_forecasts_metric ON forecasts(metric)",
];

/// SELECT base for the comments list endpoint
pub const LIST_COMMENTS: &str = "SELECT id, author_name, source, content, sentiment, sentiment_score, keywords, status, created_at, updated_at FROM comments";

/// SELECT base for the feedback list endpoint
pub const LIST_FEEDBACK: &str = "SELECT id, customer_name, channel, content, category, priority, summary, created_at, updated_at FROM feedback";

/// SELECT base for the tickets list endpoint
pub const LIST_TICKETS: &str = "SELECT id, ticket_number, subject, description, requester_email, status, priority, category, suggested_reply, created_at, updated_at FROM tickets";

/// SELECT base for the price records list endpoint
pub const LIST_PRICE_RECORDS: &str = "SELECT id, competitor, product_name, price, currency, raw_text, image_sha256, created_at, updated_at FROM price_records";

/// SELECT base for the forecasts list endpoint
pub const LIST_FORECASTS: &str = "SELECT id, metric, horizon_days, points, summary, model, created_at FROM forecasts";

/// SELECT base for the transcriptions list endpoint
pub const LIST_TRANSCRIPTIONS: &str = "SELECT id, file_name, language, transcript, duration_seconds, audio_sha256, created_at FROM transcriptions";

/// Owned SQL parameter, boxed so a built query can cross an await point
pub type SqlParam = Box<dyn ToSql + Sync + Send>;

/// Builder for list queries with optional filters
///
/// Every GET list handler follows the same shape: start from a SELECT
/// base, add an equality condition per filter that is actually present in
/// the query string, then order and paginate. Placeholders are numbered in
/// push order, so the produced SQL and the parameter vector always agree.
pub struct ListQueryBuilder {
    base: String,
    conditions: Vec<String>,
    params: Vec<SqlParam>,
}

impl ListQueryBuilder {
    /// Start from a SELECT base (one of the `LIST_*` constants)
    pub fn new(base: &str) -> Self {
        Self {
            base: base.to_string(),
            conditions: Vec::new(),
            params: Vec::new(),
        }
    }

    /// Add `column = $n` for a filter value that is present
    ///
    /// `column` must be a trusted identifier, never user input.
    pub fn filter_eq<T>(mut self, column: &str, value: Option<T>) -> Self
    where
        T: ToSql + Sync + Send + 'static,
    {
        if let Some(value) = value {
            self.params.push(Box::new(value));
            self.conditions.push(format!("{} = ${}", column, self.params.len()));
        }
        self
    }

    /// Add `column ILIKE $n` with a contains pattern for a filter value that is present
    pub fn filter_contains(mut self, column: &str, value: Option<String>) -> Self {
        if let Some(value) = value {
            self.params.push(Box::new(format!("%{}%", value)));
            self.conditions.push(format!("{} ILIKE ${}", column, self.params.len()));
        }
        self
    }

    /// Finish with ordering and pagination, producing SQL and its parameters
    pub fn build(mut self, order_by: &str, limit: i64, offset: i64) -> (String, Vec<SqlParam>) {
        let mut sql = self.base;

        if !self.conditions.is_empty() {
            sql.push_str(" WHERE ");
            sql.push_str(&self.conditions.join(" AND "));
        }

        self.params.push(Box::new(limit));
        sql.push_str(&format!(" ORDER BY {} LIMIT ${}", order_by, self.params.len()));

        self.params.push(Box::new(offset));
        sql.push_str(&format!(" OFFSET ${}", self.params.len()));

        (sql, self.params)
    }
}

/// Borrow boxed parameters in the form `tokio_postgres::Client::query` expects
pub fn param_refs(params: &[SqlParam]) -> Vec<&(dyn ToSql + Sync)> {
    params
        .iter()
        .map(|p| {
            let r: &(dyn ToSql + Sync) = p.as_ref();
            r
        })
        .collect()
}

/// Clamp a caller-supplied page size to something the database will like
pub fn clamp_limit(limit: Option<i64>, default: i64, max: i64) -> i64 {
    limit.unwrap_or(default).clamp(1, max)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_no_filters_means_no_where() {
        let (sql, params) = ListQueryBuilder::new("SELECT id FROM comments")
            .filter_eq::<String>("sentiment", None)
            .filter_eq::<String>("status", None)
            .build("created_at DESC", 25, 0);

        assert_eq!(sql, "SELECT id FROM comments ORDER BY created_at DESC LIMIT $1 OFFSET $2");
        assert_eq!(params.len(), 2);
    }

    #[test]
    fn test_present_filters_are_numbered_in_order() {
        let (sql, params) = ListQueryBuilder::new("SELECT id FROM comments")
            .filter_eq("sentiment", Some("negative".to_string()))
            .filter_eq::<String>("source", None)
            .filter_eq("status", Some("new".to_string()))
            .build("created_at DESC", 50, 100);

        assert_eq!(
            sql,
            "SELECT id FROM comments WHERE sentiment = $1 AND status = $2 ORDER BY created_at DESC LIMIT $3 OFFSET $4"
        );
        assert_eq!(params.len(), 4);
    }

    #[test]
    fn test_contains_filter_wraps_pattern() {
        let (sql, params) = ListQueryBuilder::new("SELECT id FROM price_records")
            .filter_contains("product_name", Some("espresso".to_string()))
            .build("created_at DESC", 10, 0);

        assert_eq!(
            sql,
            "SELECT id FROM price_records WHERE product_name ILIKE $1 ORDER BY created_at DESC LIMIT $2 OFFSET $3"
        );
        assert_eq!(params.len(), 3);
    }

    #[test]
    fn test_clamp_limit() {
        assert_eq!(clamp_limit(None, 25, 100), 25);
        assert_eq!(clamp_limit(Some(500), 25, 100), 100);
        assert_eq!(clamp_limit(Some(0), 25, 100), 1);
        assert_eq!(clamp_limit(Some(-5), 25, 100), 1);
        assert_eq!(clamp_limit(Some(40), 25, 100), 40);
    }
}
