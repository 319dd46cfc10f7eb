use rusqlite::{Connection, OptionalExtension, params};

use crate::models::{ClubRow, SubmissionRow, UserRow};
use crate::{Database, Result};

impl Database {
    // -- Users --

    pub fn create_user(&self, id: &str, email: &str, password_hash: &str) -> Result<()> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO users (id, email, password) VALUES (?1, ?2, ?3)",
                (id, email, password_hash),
            )?;
            Ok(())
        })
    }

    pub fn get_user_by_email(&self, email: &str) -> Result<Option<UserRow>> {
        self.with_conn(|conn| query_user(conn, "email", email))
    }

    pub fn get_user_by_id(&self, id: &str) -> Result<Option<UserRow>> {
        self.with_conn(|conn| query_user(conn, "id", id))
    }

    // -- Clubs --

    pub fn upsert_club(&self, id: &str, name: &str, admin_emails: &[String]) -> Result<()> {
        let emails = serde_json::to_string(admin_emails)
            .map_err(|e| crate::StoreError::Internal(format!("encode admin_emails: {}", e)))?;
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO clubs (id, name, admin_emails) VALUES (?1, ?2, ?3)
                 ON CONFLICT(id) DO UPDATE SET name = excluded.name, admin_emails = excluded.admin_emails",
                params![id, name, emails],
            )?;
            Ok(())
        })
    }

    pub fn get_club(&self, id: &str) -> Result<Option<ClubRow>> {
        self.with_conn(|conn| {
            let row = conn
                .query_row(
                    "SELECT id, name, admin_emails FROM clubs WHERE id = ?1",
                    [id],
                    |row| {
                        Ok(ClubRow {
                            id: row.get(0)?,
                            name: row.get(1)?,
                            admin_emails: row.get(2)?,
                        })
                    },
                )
                .optional()?;
            Ok(row)
        })
    }

    // -- Submissions --

    pub fn submissions_for_user(&self, user_id: &str) -> Result<Vec<SubmissionRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {} FROM quest_submissions WHERE user_id = ?1",
                SUBMISSION_COLUMNS
            ))?;
            let rows = stmt
                .query_map([user_id], submission_from_row)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    /// Club-wide listing for reviewers, newest first, optionally narrowed
    /// to one member.
    pub fn submissions_for_club(&self, club_id: &str, user_id: Option<&str>) -> Result<Vec<SubmissionRow>> {
        self.with_conn(|conn| {
            let rows = match user_id {
                Some(uid) => {
                    let mut stmt = conn.prepare(&format!(
                        "SELECT {} FROM quest_submissions
                         WHERE club_id = ?1 AND user_id = ?2
                         ORDER BY submitted_at DESC",
                        SUBMISSION_COLUMNS
                    ))?;
                    stmt.query_map(params![club_id, uid], submission_from_row)?
                        .collect::<std::result::Result<Vec<_>, _>>()?
                }
                None => {
                    let mut stmt = conn.prepare(&format!(
                        "SELECT {} FROM quest_submissions
                         WHERE club_id = ?1
                         ORDER BY submitted_at DESC",
                        SUBMISSION_COLUMNS
                    ))?;
                    stmt.query_map([club_id], submission_from_row)?
                        .collect::<std::result::Result<Vec<_>, _>>()?
                }
            };
            Ok(rows)
        })
    }
}

const SUBMISSION_COLUMNS: &str =
    "id, user_id, club_id, quest_id, quest_title, track, points, repo_link, status, submitted_at, reviewed_by, reviewed_at";

fn submission_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<SubmissionRow> {
    Ok(SubmissionRow {
        id: row.get(0)?,
        user_id: row.get(1)?,
        club_id: row.get(2)?,
        quest_id: row.get(3)?,
        quest_title: row.get(4)?,
        track: row.get(5)?,
        points: row.get(6)?,
        repo_link: row.get(7)?,
        status: row.get(8)?,
        submitted_at: row.get(9)?,
        reviewed_by: row.get(10)?,
        reviewed_at: row.get(11)?,
    })
}

fn query_user(conn: &Connection, column: &str, value: &str) -> Result<Option<UserRow>> {
    // `column` is one of two compile-time literals, never caller input.
    let mut stmt = conn.prepare(&format!(
        "SELECT id, email, password, role, points, last_daily_claim_at, created_at
         FROM users WHERE {} = ?1",
        column
    ))?;

    let row = stmt
        .query_row([value], |row| {
            Ok(UserRow {
                id: row.get(0)?,
                email: row.get(1)?,
                password: row.get(2)?,
                role: row.get(3)?,
                points: row.get(4)?,
                last_daily_claim_at: row.get(5)?,
                created_at: row.get(6)?,
            })
        })
        .optional()?;

    Ok(row)
}
