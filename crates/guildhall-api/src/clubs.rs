use axum::{Extension, Json, extract::State, response::IntoResponse};

use guildhall_types::api::{Claims, UpsertClubRequest, UpsertClubResponse};

use crate::auth::AppState;
use crate::error::{ApiError, join_error};

/// Super-admin creates or updates a club record: its name and the admin
/// email list that the review flow authorizes against. Roster sync is a
/// separate concern and stays out of this subsystem.
pub async fn upsert(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<UpsertClubRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let db = state.clone();
    let uid = claims.sub.to_string();
    let caller = tokio::task::spawn_blocking(move || db.db.get_user_by_id(&uid))
        .await
        .map_err(join_error)??;

    if caller.map(|u| u.role) != Some("super_admin".to_string()) {
        return Err(ApiError::Forbidden);
    }

    let club_id = req
        .club_id
        .ok_or_else(|| ApiError::BadRequest("Club ID is required".into()))?;
    let name = req
        .name
        .ok_or_else(|| ApiError::BadRequest("Club name is required".into()))?;
    let admin_emails = req.admin_emails.unwrap_or_default();

    let db = state.clone();
    tokio::task::spawn_blocking(move || db.db.upsert_club(&club_id, &name, &admin_emails))
        .await
        .map_err(join_error)??;

    Ok(Json(UpsertClubResponse {
        message: "Club updated successfully".into(),
    }))
}
