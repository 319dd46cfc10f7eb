use std::sync::Arc;

use argon2::{
    Argon2, PasswordHash, PasswordHasher, PasswordVerifier,
    password_hash::{SaltString, rand_core::OsRng},
};
use axum::{Extension, Json, extract::State, http::StatusCode, response::IntoResponse};
use jsonwebtoken::{EncodingKey, Header, encode};
use uuid::Uuid;

use guildhall_db::Database;
use guildhall_types::api::{
    Claims, LoginRequest, LoginResponse, RegisterRequest, RegisterResponse, RoleResponse,
};

use crate::error::{ApiError, join_error};

pub type AppState = Arc<AppStateInner>;

pub struct AppStateInner {
    pub db: Database,
    pub jwt_secret: String,
    /// Fixed per-day bonus granted by /points/claim. Configuration, not protocol.
    pub daily_bonus: i64,
}

/// The user's profile row is created here, at first successful identity
/// establishment. The points ledger treats a missing row as fatal afterwards.
pub async fn register(
    State(state): State<AppState>,
    Json(req): Json<RegisterRequest>,
) -> Result<impl IntoResponse, ApiError> {
    if !req.email.contains('@') || req.email.len() > 254 {
        return Err(ApiError::BadRequest("Invalid email".into()));
    }
    if req.password.len() < 8 {
        return Err(ApiError::BadRequest("Password must be at least 8 characters".into()));
    }

    // Check if email is taken
    let db = state.clone();
    let email = req.email.clone();
    let existing = tokio::task::spawn_blocking(move || db.db.get_user_by_email(&email))
        .await
        .map_err(join_error)??;
    if existing.is_some() {
        return Err(ApiError::Conflict("An account with this email already exists".into()));
    }

    // Hash password with Argon2id
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();
    let password_hash = argon2
        .hash_password(req.password.as_bytes(), &salt)
        .map_err(|_| ApiError::Internal)?
        .to_string();

    let user_id = Uuid::new_v4();

    let db = state.clone();
    let uid = user_id.to_string();
    let email = req.email.clone();
    tokio::task::spawn_blocking(move || db.db.create_user(&uid, &email, &password_hash))
        .await
        .map_err(join_error)??;

    let token = create_token(&state.jwt_secret, user_id, &req.email).map_err(|_| ApiError::Internal)?;

    Ok((StatusCode::CREATED, Json(RegisterResponse { user_id, token })))
}

pub async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let db = state.clone();
    let email = req.email.clone();
    let user = tokio::task::spawn_blocking(move || db.db.get_user_by_email(&email))
        .await
        .map_err(join_error)??
        .ok_or(ApiError::Unauthorized)?;

    // Verify password
    let parsed_hash = PasswordHash::new(&user.password).map_err(|_| ApiError::Internal)?;

    Argon2::default()
        .verify_password(req.password.as_bytes(), &parsed_hash)
        .map_err(|_| ApiError::Unauthorized)?;

    let user_id: Uuid = user.id.parse().map_err(|_| ApiError::Internal)?;

    let token = create_token(&state.jwt_secret, user_id, &user.email).map_err(|_| ApiError::Internal)?;

    Ok(Json(LoginResponse {
        user_id,
        email: user.email,
        token,
    }))
}

/// Caller's stored role, `member` when the profile row is missing.
pub async fn role(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, ApiError> {
    let db = state.clone();
    let uid = claims.sub.to_string();
    let user = tokio::task::spawn_blocking(move || db.db.get_user_by_id(&uid))
        .await
        .map_err(join_error)??;

    let role = user.map(|u| u.role).unwrap_or_else(|| "member".into());
    Ok(Json(RoleResponse { role }))
}

fn create_token(secret: &str, user_id: Uuid, email: &str) -> anyhow::Result<String> {
    let claims = Claims {
        sub: user_id,
        email: email.to_string(),
        exp: (chrono::Utc::now() + chrono::Duration::days(30)).timestamp() as usize,
    };

    let token = encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )?;

    Ok(token)
}
