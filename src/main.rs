//! Lumina API - AI Business Insights Platform
//!
//! Backend for the Lumina dashboard. Every route is a thin adapter:
//! validate the request, relay text or media to a third-party vendor
//! (generative-language, OCR, speech-to-text), persist the returned JSON
//! in PostgreSQL, and answer with a uniform envelope.

mod auth;
mod config;
mod db;
mod error;
mod models;
mod routes;
mod state;
mod vendors;

use crate::config::Settings;
use crate::routes::create_router;
use crate::state::AppState;
use crate::vendors::{GenAiClient, OcrClient, SpeechClient};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{error, info, warn};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing subscriber for structured logging
    init_tracing();

    info!("🚀 Starting Lumina - AI Business Insights Platform...");

    // Load configuration
    let settings = Settings::load()?;
    info!("📋 Configuration loaded successfully");

    if std::env::var("JWT_SECRET").is_err() {
        warn!("⚠️  JWT_SECRET not set, using default (INSECURE - set in production!)");
    }
    if settings.vendors.genai_api_key.is_empty() {
        warn!("⚠️  GENAI_API_KEY not set, analysis endpoints will fail");
    }

    // Initialize database pool - REQUIRED (no fallback to in-memory)
    let use_tls = std::env::var("DATABASE_URL")
        .map(|url| url.contains("neon.tech") || url.contains("sslmode=require"))
        .unwrap_or(false);

    let pool = match db::create_pool(&settings.database, use_tls) {
        Ok(pool) => pool,
        Err(e) => {
            error!("❌ FATAL: Failed to initialize database pool: {}", e);
            error!("DATABASE_URL must be set in .env and database must be accessible");
            return Err(anyhow::anyhow!("Cannot start server without database connection"));
        }
    };

    db::verify_connection(&pool)
        .await
        .map_err(|e| anyhow::anyhow!("Failed to verify database connection: {}", e))?;
    info!("✅ Database connection successful (TLS: {})", use_tls);

    // Create tables if they don't exist
    if let Err(e) = db::init_schema(&pool).await {
        warn!("⚠️  Warning creating tables: {}", e);
    }

    // Build vendor clients
    let genai = GenAiClient::new(&settings.vendors)
        .map_err(|e| anyhow::anyhow!("Failed to build generative-language client: {}", e))?;
    let ocr = OcrClient::new(&settings.vendors)
        .map_err(|e| anyhow::anyhow!("Failed to build OCR client: {}", e))?;
    let speech = SpeechClient::new(&settings.vendors)
        .map_err(|e| anyhow::anyhow!("Failed to build speech client: {}", e))?;

    let state = Arc::new(AppState::new(pool, genai, ocr, speech));

    // Build the router
    let app = create_router(state, &settings);

    // Create socket address
    let addr = SocketAddr::from((settings.server.host, settings.server.port));

    info!("🌐 Server listening on http://{}", addr);
    info!("");
    info!("📚 API Endpoints:");
    info!("   --- Authentication ---");
    info!("   POST /api/auth/register        - Register new account");
    info!("   POST /api/auth/login           - Login with email/password");
    info!("   POST /api/auth/refresh         - Refresh access token");
    info!("   GET  /api/auth/me              - Get current user");
    info!("");
    info!("   --- Comments ---");
    info!("   GET  /api/comments             - List analyzed comments");
    info!("   POST /api/comments             - Analyze one comment");
    info!("   POST /api/comments/batch       - Analyze up to 50 comments");
    info!("   PUT  /api/comments/{{id}}        - Update review status");
    info!("");
    info!("   --- Feedback ---");
    info!("   GET  /api/feedback             - List triaged feedback");
    info!("   POST /api/feedback             - Triage one entry");
    info!("   POST /api/feedback/batch       - Triage up to 20 entries");
    info!("   PUT  /api/feedback/{{id}}        - Override category/priority");
    info!("");
    info!("   --- Tickets ---");
    info!("   GET  /api/tickets              - List tickets");
    info!("   POST /api/tickets              - Open ticket with AI triage");
    info!("   PUT  /api/tickets/{{id}}         - Update status/priority");
    info!("");
    info!("   --- Competitor Prices ---");
    info!("   GET  /api/prices               - List price records");
    info!("   POST /api/prices               - OCR one price-tag image");
    info!("   POST /api/prices/batch         - OCR up to 10 images");
    info!("   PUT  /api/prices/{{id}}          - Correct a record");
    info!("");
    info!("   --- Forecasts & Transcriptions ---");
    info!("   POST /api/forecasts            - Generate a forecast");
    info!("   POST /api/transcriptions       - Transcribe call audio");
    info!("");

    // Create TCP listener and serve
    let listener = TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("👋 Server shutdown complete");
    Ok(())
}

/// Initialize tracing with structured logging
fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,lumina_api=debug,tower_http=debug"));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(
            fmt::layer()
                .with_target(true)
                .with_level(true)
                .with_thread_ids(true)
                .with_file(true)
                .with_line_number(true)
                .compact(),
        )
        .init();
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("📴 Received Ctrl+C signal, initiating graceful shutdown...");
        },
        _ = terminate => {
            info!("📴 Received terminate signal, initiating graceful shutdown...");
        },
    }
}
