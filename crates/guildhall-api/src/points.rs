use axum::{
    Extension, Json,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use chrono::Utc;

use guildhall_db::models::parse_ts;
use guildhall_types::api::{Claims, ClaimResponse, ProfileResponse};
use guildhall_types::rank::rank_for;

use crate::auth::AppState;
use crate::error::{ApiError, join_error};

/// Caller's point balance with the rank derived on read. Rank is never
/// persisted, so it can't disagree with the counter.
pub async fn me(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, ApiError> {
    let db = state.clone();
    let uid = claims.sub.to_string();
    let user = tokio::task::spawn_blocking(move || db.db.get_user_by_id(&uid))
        .await
        .map_err(join_error)??
        .ok_or_else(|| ApiError::NotFound("User profile not found".into()))?;

    let last_claim_at = user.last_daily_claim_at.as_deref().map(parse_ts).transpose()?;

    Ok(Json(ProfileResponse {
        points: user.points,
        rank: rank_for(user.points),
        last_claim_at,
    }))
}

/// Once-per-UTC-day bonus grant. Already-claimed is a normal outcome
/// reported as 409 with the same body shape, `granted=false`.
pub async fn claim_daily(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<Response, ApiError> {
    let db = state.clone();
    let uid = claims.sub.to_string();
    let bonus = state.daily_bonus;

    let outcome = tokio::task::spawn_blocking(move || db.db.claim_daily(&uid, Utc::now(), bonus))
        .await
        .map_err(join_error)??;

    let status = if outcome.granted {
        StatusCode::OK
    } else {
        StatusCode::CONFLICT
    };

    let body = Json(ClaimResponse {
        granted: outcome.granted,
        points: outcome.points,
        last_claim_at: outcome.last_claim_at,
    });

    Ok((status, body).into_response())
}
