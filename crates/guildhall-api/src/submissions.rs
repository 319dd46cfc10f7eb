use axum::{Extension, Json, extract::State, response::IntoResponse};
use chrono::Utc;
use tracing::warn;
use uuid::Uuid;

use guildhall_db::ledger::NewSubmission;
use guildhall_db::models::{SubmissionRow, parse_ts};
use guildhall_types::api::{
    Claims, ListSubmissionsRequest, ListSubmissionsResponse, ReviewRequest, ReviewResponse,
    SubmissionView, SubmissionsByQuestResponse, SubmitQuestRequest, SubmitQuestResponse,
};
use guildhall_types::status::{SubmissionStatus, collapse_by_quest};

use crate::auth::AppState;
use crate::error::{ApiError, join_error};

fn missing(field: &str) -> ApiError {
    ApiError::BadRequest(format!("Missing required field: {}", field))
}

/// Club admins are matched by email against the club record's admin list.
/// `club_missing` controls whether an absent club reads as 403 (review,
/// where the caller proves nothing) or 404 (listing an explicit club id).
async fn require_club_admin(
    state: &AppState,
    club_id: &str,
    email: &str,
    club_missing: ApiError,
) -> Result<(), ApiError> {
    let db = state.clone();
    let cid = club_id.to_string();
    let club = tokio::task::spawn_blocking(move || db.db.get_club(&cid))
        .await
        .map_err(join_error)??
        .ok_or(club_missing)?;

    if club.admin_emails_vec()?.iter().any(|e| e == email) {
        Ok(())
    } else {
        Err(ApiError::Forbidden)
    }
}

/// Member submits a quest attempt. Points are snapshotted from the quest
/// metadata now, so later catalog changes can't retroactively reprice past
/// submissions. No ledger effect until approval.
pub async fn submit(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<SubmitQuestRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let quest_id = req.quest_id.ok_or_else(|| missing("questId"))?;
    let points = req.points.ok_or_else(|| missing("points"))?;
    let repo_link = req.repo_link.ok_or_else(|| missing("repoLink"))?;
    let club_id = req.club_id.ok_or_else(|| missing("clubId"))?;
    if points < 0 {
        return Err(ApiError::BadRequest("points must be non-negative".into()));
    }

    let quest_title = req.quest_title.unwrap_or_default();
    let track = req.track.unwrap_or_else(|| "general".into());

    let db = state.clone();
    let submission_id = Uuid::new_v4().to_string();
    let user_id = claims.sub.to_string();
    tokio::task::spawn_blocking(move || {
        db.db.create_submission(
            &submission_id,
            &NewSubmission {
                user_id: &user_id,
                club_id: &club_id,
                quest_id: &quest_id,
                quest_title: &quest_title,
                track: &track,
                points,
                repo_link: &repo_link,
            },
            Utc::now(),
        )
    })
    .await
    .map_err(join_error)??;

    Ok(Json(SubmitQuestResponse {
        message: "Submission received. Pending approval.".into(),
        success: true,
    }))
}

/// Caller's submission history collapsed to one status per quest
/// (approved > pending > rejected).
pub async fn by_quest(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, ApiError> {
    let db = state.clone();
    let uid = claims.sub.to_string();
    let rows = tokio::task::spawn_blocking(move || db.db.submissions_for_user(&uid))
        .await
        .map_err(join_error)??;

    let submissions = collapse_by_quest(rows.iter().filter_map(|row| {
        match SubmissionStatus::from_str(&row.status) {
            Some(status) => Some((row.quest_id.clone(), status)),
            None => {
                warn!("Corrupt status '{}' on submission '{}'", row.status, row.id);
                None
            }
        }
    }));

    Ok(Json(SubmissionsByQuestResponse { submissions }))
}

/// Reviewer approves or rejects a submission. The status transition and its
/// ledger adjustment commit atomically in the store; repeating a decision
/// never double-credits.
pub async fn review(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<ReviewRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let submission_id = req.submission_id.ok_or_else(|| missing("submissionId"))?;
    let action_raw = req.action.ok_or_else(|| missing("action"))?;
    let club_id = req.club_id.ok_or_else(|| missing("clubId"))?;

    let action = match SubmissionStatus::from_str(&action_raw) {
        Some(SubmissionStatus::Approved) => SubmissionStatus::Approved,
        Some(SubmissionStatus::Rejected) => SubmissionStatus::Rejected,
        _ => return Err(ApiError::BadRequest("action must be 'approved' or 'rejected'".into())),
    };

    require_club_admin(&state, &club_id, &claims.email, ApiError::Forbidden).await?;

    let db = state.clone();
    let reviewer = claims.sub.to_string();
    let outcome = tokio::task::spawn_blocking(move || {
        // Scoped lookup: a submission outside the authorized club reads as absent.
        db.db.review_submission(&submission_id, &club_id, action, &reviewer, Utc::now())
    })
    .await
    .map_err(join_error)??;

    Ok(Json(ReviewResponse {
        message: format!("Submission {}", outcome.current.as_str()),
    }))
}

/// Club admin lists a club's submissions, newest first, optionally for a
/// single member.
pub async fn list(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<ListSubmissionsRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let club_id = req.club_id.ok_or_else(|| missing("clubId"))?;

    require_club_admin(
        &state,
        &club_id,
        &claims.email,
        ApiError::NotFound("Club not found".into()),
    )
    .await?;

    let db = state.clone();
    let cid = club_id.clone();
    let user_filter = req.user_id.clone();
    let rows = tokio::task::spawn_blocking(move || {
        db.db.submissions_for_club(&cid, user_filter.as_deref())
    })
    .await
    .map_err(join_error)??;

    let submissions = rows.into_iter().filter_map(into_view).collect();
    Ok(Json(ListSubmissionsResponse { submissions }))
}

fn into_view(row: SubmissionRow) -> Option<SubmissionView> {
    let status = match SubmissionStatus::from_str(&row.status) {
        Some(s) => s,
        None => {
            warn!("Corrupt status '{}' on submission '{}'", row.status, row.id);
            return None;
        }
    };
    let submitted_at = match parse_ts(&row.submitted_at) {
        Ok(ts) => ts,
        Err(e) => {
            warn!("Corrupt submitted_at on submission '{}': {}", row.id, e);
            return None;
        }
    };
    let reviewed_at = match row.reviewed_at.as_deref().map(parse_ts).transpose() {
        Ok(ts) => ts,
        Err(e) => {
            warn!("Corrupt reviewed_at on submission '{}': {}", row.id, e);
            return None;
        }
    };

    Some(SubmissionView {
        id: row.id,
        user_id: row.user_id,
        club_id: row.club_id,
        quest_id: row.quest_id,
        quest_title: row.quest_title,
        track: row.track,
        points: row.points,
        repo_link: row.repo_link,
        status,
        submitted_at,
        reviewed_by: row.reviewed_by,
        reviewed_at,
    })
}
