//! Authentication route handlers
//!
//! Provides login, register, refresh, and current-user endpoints.

use crate::auth::{
    create_tokens, hash_password, refresh_tokens, verify_password, Claims, Role, TokenPair,
};
use crate::error::AppError;
use crate::state::SharedState;
use axum::{
    extract::{Extension, State},
    http::StatusCode,
    Json,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

// ============================================
// Request/Response Types
// ============================================

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
    pub name: String,
}

#[derive(Debug, Deserialize)]
pub struct RefreshRequest {
    pub refresh_token: String,
}

#[derive(Debug, Serialize)]
pub struct AuthResponse {
    pub success: bool,
    pub user: UserResponse,
    pub tokens: TokenPair,
}

#[derive(Debug, Serialize)]
pub struct UserResponse {
    pub id: String,
    pub email: String,
    pub name: String,
    pub role: Role,
}

#[derive(Debug, Serialize)]
pub struct TokenResponse {
    pub success: bool,
    pub tokens: TokenPair,
}

#[derive(Debug, Serialize)]
pub struct MeResponse {
    pub success: bool,
    pub user: UserResponse,
}

// ============================================
// Route Handlers
// ============================================

/// POST /api/auth/register
///
/// Register a new user account. New users get the viewer role by default.
pub async fn register(
    State(state): State<SharedState>,
    Json(req): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<AuthResponse>), AppError> {
    // Validate input
    if req.email.is_empty() || !req.email.contains('@') {
        return Err(AppError::BadRequest("Invalid email address".to_string()));
    }
    if req.password.len() < 8 {
        return Err(AppError::BadRequest("Password must be at least 8 characters".to_string()));
    }
    if req.name.is_empty() {
        return Err(AppError::BadRequest("Name is required".to_string()));
    }

    let client = state.db_pool.get().await?;

    // Check if email already exists
    let existing = client
        .query_opt("SELECT id FROM users WHERE email = $1", &[&req.email])
        .await?;
    if existing.is_some() {
        return Err(AppError::Conflict("Email already registered".to_string()));
    }

    let password_hash = hash_password(&req.password)?;
    let user_id = Uuid::new_v4();
    let now = Utc::now();

    client
        .execute(
            "INSERT INTO users (id, email, password_hash, name, role, created_at, updated_at)
             VALUES ($1, $2, $3, $4, $5, $6, $7)",
            &[&user_id, &req.email, &password_hash, &req.name, &"viewer", &now, &now],
        )
        .await?;

    info!("User registered: {}", req.email);

    let tokens = create_tokens(user_id, &req.email, Role::Viewer)?;

    Ok((
        StatusCode::CREATED,
        Json(AuthResponse {
            success: true,
            user: UserResponse {
                id: user_id.to_string(),
                email: req.email,
                name: req.name,
                role: Role::Viewer,
            },
            tokens,
        }),
    ))
}

/// POST /api/auth/login
///
/// Authenticate with email and password, receive JWT tokens.
pub async fn login(
    State(state): State<SharedState>,
    Json(req): Json<LoginRequest>,
) -> Result<Json<AuthResponse>, AppError> {
    let client = state.db_pool.get().await?;

    let row = client
        .query_opt(
            "SELECT id, email, password_hash, name, role FROM users WHERE email = $1",
            &[&req.email],
        )
        .await?
        .ok_or_else(|| AppError::Unauthorized("Invalid email or password".to_string()))?;

    let password_hash: String = row.get("password_hash");
    if !verify_password(&req.password, &password_hash)? {
        return Err(AppError::Unauthorized("Invalid email or password".to_string()));
    }

    let user_id: Uuid = row.get("id");
    let email: String = row.get("email");
    let name: Option<String> = row.get("name");
    let role = Role::parse(row.get("role"));

    let tokens = create_tokens(user_id, &email, role)?;

    Ok(Json(AuthResponse {
        success: true,
        user: UserResponse {
            id: user_id.to_string(),
            email,
            name: name.unwrap_or_default(),
            role,
        },
        tokens,
    }))
}

/// POST /api/auth/refresh
///
/// Refresh access token using refresh token.
pub async fn refresh(
    Json(req): Json<RefreshRequest>,
) -> Result<Json<TokenResponse>, AppError> {
    let tokens = refresh_tokens(&req.refresh_token)?;

    Ok(Json(TokenResponse {
        success: true,
        tokens,
    }))
}

/// GET /api/auth/me
///
/// Get current user info from the validated JWT claims.
pub async fn me(
    State(state): State<SharedState>,
    Extension(claims): Extension<Claims>,
) -> Result<Json<MeResponse>, AppError> {
    let client = state.db_pool.get().await?;

    let row = client
        .query_opt(
            "SELECT id, email, name, role FROM users WHERE id = $1",
            &[&claims.sub],
        )
        .await?
        .ok_or_else(|| AppError::Unauthorized("User not found".to_string()))?;

    let user_id: Uuid = row.get("id");
    let name: Option<String> = row.get("name");

    Ok(Json(MeResponse {
        success: true,
        user: UserResponse {
            id: user_id.to_string(),
            email: row.get("email"),
            name: name.unwrap_or_default(),
            role: Role::parse(row.get("role")),
        },
    }))
}
