//! Route definitions and router setup
//!
//! Configures all API routes and middleware.

mod auth;
mod comment;
mod feedback;
mod forecast;
mod price;
mod ticket;
mod transcription;

use crate::auth::auth_middleware;
use crate::config::Settings;
use crate::state::SharedState;
use axum::{
    http::{header, Method},
    middleware,
    routing::{get, post, put},
    Router,
};
use std::time::Duration;
use tower::ServiceBuilder;
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    request_id::MakeRequestUuid,
    trace::{DefaultMakeSpan, DefaultOnRequest, DefaultOnResponse, TraceLayer},
    ServiceBuilderExt,
};
use tracing::Level;

/// Create the application router with all routes and middleware
pub fn create_router(state: SharedState, settings: &Settings) -> Router {
    // Build CORS layer
    let cors = build_cors_layer(settings);

    // Build tracing/logging layer
    let trace_layer = TraceLayer::new_for_http()
        .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
        .on_request(DefaultOnRequest::new().level(Level::INFO))
        .on_response(DefaultOnResponse::new().level(Level::INFO));

    // Build middleware stack
    let middleware_stack = ServiceBuilder::new()
        .set_x_request_id(MakeRequestUuid)
        .layer(trace_layer)
        .layer(CompressionLayer::new())
        .layer(cors)
        .propagate_x_request_id();

    // Everything under /api except the auth entry points requires a bearer token
    let protected = Router::new()
        // Current user
        .route("/api/auth/me", get(auth::me))

        // Comment routes
        .route("/api/comments", get(comment::list_comments).post(comment::analyze_comment))
        .route("/api/comments/batch", post(comment::analyze_comments_batch))
        .route("/api/comments/{id}", put(comment::update_comment))

        // Feedback routes
        .route("/api/feedback", get(feedback::list_feedback).post(feedback::submit_feedback))
        .route("/api/feedback/batch", post(feedback::submit_feedback_batch))
        .route("/api/feedback/{id}", put(feedback::update_feedback))

        // Ticket routes
        .route("/api/tickets", get(ticket::list_tickets).post(ticket::create_ticket))
        .route("/api/tickets/{id}", get(ticket::get_ticket).put(ticket::update_ticket))

        // Competitor price routes
        .route("/api/prices", get(price::list_price_records).post(price::capture_price))
        .route("/api/prices/batch", post(price::capture_prices_batch))
        .route("/api/prices/{id}", put(price::update_price_record))

        // Forecast routes
        .route("/api/forecasts", get(forecast::list_forecasts).post(forecast::create_forecast))

        // Transcription routes
        .route("/api/transcriptions", get(transcription::list_transcriptions).post(transcription::create_transcription))

        .route_layer(middleware::from_fn(auth_middleware));

    // Build the router
    Router::new()
        // Health check
        .route("/health", get(health_check))

        // Auth entry points
        .route("/api/auth/register", post(auth::register))
        .route("/api/auth/login", post(auth::login))
        .route("/api/auth/refresh", post(auth::refresh))

        .merge(protected)

        // Apply middleware and state
        .layer(middleware_stack)
        .with_state(state)
}

/// Build CORS layer from settings
fn build_cors_layer(settings: &Settings) -> CorsLayer {
    let origins: Vec<_> = settings
        .cors
        .allowed_origins
        .iter()
        .filter_map(|s| s.parse().ok())
        .collect();

    if origins.is_empty() {
        CorsLayer::new()
            .allow_origin(Any)
            .allow_methods([Method::GET, Method::POST, Method::PUT, Method::OPTIONS])
            .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION, header::ACCEPT])
            .max_age(Duration::from_secs(3600))
    } else {
        CorsLayer::new()
            .allow_origin(origins)
            .allow_methods([Method::GET, Method::POST, Method::PUT, Method::OPTIONS])
            .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION, header::ACCEPT])
            .max_age(Duration::from_secs(3600))
    }
}

/// Health check endpoint
async fn health_check() -> axum::Json<serde_json::Value> {
    axum::Json(serde_json::json!({
        "success": true,
        "message": "Server is running fine.",
        "timestamp": chrono::Utc::now().to_rfc3339(),
        "version": env!("CARGO_PKG_VERSION")
    }))
}
