use chrono::{DateTime, Utc};

use crate::{Result, StoreError};

/// Database row types — these map directly to SQLite rows.
/// Distinct from guildhall-types API models to keep the DB layer independent.

pub struct UserRow {
    pub id: String,
    pub email: String,
    pub password: String,
    pub role: String,
    pub points: i64,
    pub last_daily_claim_at: Option<String>,
    pub created_at: String,
}

pub struct ClubRow {
    pub id: String,
    pub name: String,
    pub admin_emails: String,
}

pub struct SubmissionRow {
    pub id: String,
    pub user_id: String,
    pub club_id: String,
    pub quest_id: String,
    pub quest_title: String,
    pub track: String,
    pub points: i64,
    pub repo_link: String,
    pub status: String,
    pub submitted_at: String,
    pub reviewed_by: Option<String>,
    pub reviewed_at: Option<String>,
}

impl ClubRow {
    /// Admin emails are stored as a JSON array in a TEXT column.
    pub fn admin_emails_vec(&self) -> Result<Vec<String>> {
        serde_json::from_str(&self.admin_emails)
            .map_err(|e| StoreError::Internal(format!("corrupt admin_emails on club '{}': {}", self.id, e)))
    }
}

/// Timestamps are stored as RFC 3339 text.
pub fn parse_ts(s: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| StoreError::Internal(format!("bad timestamp '{}': {}", s, e)))
}
