use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::rank::Rank;
use crate::status::SubmissionStatus;

// -- JWT Claims --

/// JWT claims shared between token issuance (auth handlers) and the REST
/// middleware. Canonical definition lives here in guildhall-types.
/// `email` rides along because club-admin authorization matches on email.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: Uuid,
    pub email: String,
    pub exp: usize,
}

// -- Auth --

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct RegisterResponse {
    pub user_id: Uuid,
    pub token: String,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub user_id: Uuid,
    pub email: String,
    pub token: String,
}

#[derive(Debug, Serialize)]
pub struct RoleResponse {
    pub role: String,
}

// -- Points --

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClaimResponse {
    pub granted: bool,
    pub points: i64,
    pub last_claim_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileResponse {
    pub points: i64,
    pub rank: Rank,
    pub last_claim_at: Option<DateTime<Utc>>,
}

// -- Submissions --

/// Request fields are optional so missing values surface as 400s with an
/// explicit message instead of a serde rejection.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct SubmitQuestRequest {
    pub quest_id: Option<String>,
    pub quest_title: Option<String>,
    pub track: Option<String>,
    pub points: Option<i64>,
    pub repo_link: Option<String>,
    pub club_id: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct SubmitQuestResponse {
    pub message: String,
    pub success: bool,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct ReviewRequest {
    pub submission_id: Option<String>,
    pub action: Option<String>,
    pub club_id: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ReviewResponse {
    pub message: String,
}

#[derive(Debug, Serialize)]
pub struct SubmissionsByQuestResponse {
    pub submissions: HashMap<String, SubmissionStatus>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct ListSubmissionsRequest {
    pub club_id: Option<String>,
    pub user_id: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmissionView {
    pub id: String,
    pub user_id: String,
    pub club_id: String,
    pub quest_id: String,
    pub quest_title: String,
    pub track: String,
    pub points: i64,
    pub repo_link: String,
    pub status: SubmissionStatus,
    pub submitted_at: DateTime<Utc>,
    pub reviewed_by: Option<String>,
    pub reviewed_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Serialize)]
pub struct ListSubmissionsResponse {
    pub submissions: Vec<SubmissionView>,
}

// -- Clubs --

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct UpsertClubRequest {
    pub club_id: Option<String>,
    pub name: Option<String>,
    pub admin_emails: Option<Vec<String>>,
}

#[derive(Debug, Serialize)]
pub struct UpsertClubResponse {
    pub message: String,
}
