//! Ledger-affecting operations. Every operation here runs as a single
//! SQLite transaction: the user's `points` counter has two writers (daily
//! claims and submission reviews), and a read-modify-write outside a
//! transaction would permit lost updates under concurrent requests.

use chrono::{DateTime, Utc};
use rusqlite::{OptionalExtension, params};

use guildhall_types::status::SubmissionStatus;

use crate::models::parse_ts;
use crate::{Database, Result, StoreError};

#[derive(Debug)]
pub struct ClaimOutcome {
    pub granted: bool,
    pub points: i64,
    pub last_claim_at: Option<DateTime<Utc>>,
}

pub struct NewSubmission<'a> {
    pub user_id: &'a str,
    pub club_id: &'a str,
    pub quest_id: &'a str,
    pub quest_title: &'a str,
    pub track: &'a str,
    pub points: i64,
    pub repo_link: &'a str,
}

#[derive(Debug)]
pub struct ReviewOutcome {
    pub previous: SubmissionStatus,
    pub current: SubmissionStatus,
    /// Net change applied to the owner's point counter by this review.
    pub ledger_delta: i64,
    /// Owner's balance after the review committed.
    pub user_points: i64,
}

/// UTC calendar-date equality (year/month/day), not a rolling 24h window.
pub fn same_utc_day(a: DateTime<Utc>, b: DateTime<Utc>) -> bool {
    a.date_naive() == b.date_naive()
}

impl Database {
    /// Grant the daily bonus at most once per UTC calendar day.
    ///
    /// `granted=false` is a normal outcome, not an error: the caller maps it
    /// to 409 with the user's unchanged balance.
    pub fn claim_daily(&self, user_id: &str, now: DateTime<Utc>, bonus: i64) -> Result<ClaimOutcome> {
        self.with_conn_mut(|conn| {
            let tx = conn.transaction()?;

            let row = tx
                .query_row(
                    "SELECT points, last_daily_claim_at FROM users WHERE id = ?1",
                    [user_id],
                    |r| Ok((r.get::<_, i64>(0)?, r.get::<_, Option<String>>(1)?)),
                )
                .optional()?;
            let (points, last_raw) = row.ok_or(StoreError::UserNotFound)?;

            let last_claim_at = last_raw.as_deref().map(parse_ts).transpose()?;
            if let Some(prev) = last_claim_at {
                if same_utc_day(prev, now) {
                    // No write; dropping the transaction rolls it back.
                    return Ok(ClaimOutcome {
                        granted: false,
                        points,
                        last_claim_at: Some(prev),
                    });
                }
            }

            tx.execute(
                "UPDATE users SET points = points + ?1, last_daily_claim_at = ?2 WHERE id = ?3",
                params![bonus, now.to_rfc3339(), user_id],
            )?;
            tx.commit()?;

            Ok(ClaimOutcome {
                granted: true,
                points: points + bonus,
                last_claim_at: Some(now),
            })
        })
    }

    /// Create a pending submission, enforcing the duplicate check in the
    /// same transaction as the insert. A `pending` or `approved` submission
    /// for the same (user, quest) blocks; a `rejected` one does not, so a
    /// member can resubmit after rejection.
    ///
    /// No ledger effect — points are only snapshotted here, credited on
    /// approval.
    pub fn create_submission(&self, id: &str, sub: &NewSubmission<'_>, now: DateTime<Utc>) -> Result<()> {
        self.with_conn_mut(|conn| {
            let tx = conn.transaction()?;

            let mut stmt = tx.prepare(
                "SELECT status FROM quest_submissions WHERE user_id = ?1 AND quest_id = ?2",
            )?;
            let statuses = stmt
                .query_map(params![sub.user_id, sub.quest_id], |r| r.get::<_, String>(0))?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            drop(stmt);

            for raw in &statuses {
                let status = SubmissionStatus::from_str(raw).ok_or_else(|| {
                    StoreError::Internal(format!("corrupt submission status '{}'", raw))
                })?;
                if status.blocks_resubmission() {
                    return Err(StoreError::DuplicateSubmission);
                }
            }

            tx.execute(
                "INSERT INTO quest_submissions
                     (id, user_id, club_id, quest_id, quest_title, track, points, repo_link, status, submitted_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, 'pending', ?9)",
                params![
                    id,
                    sub.user_id,
                    sub.club_id,
                    sub.quest_id,
                    sub.quest_title,
                    sub.track,
                    sub.points,
                    sub.repo_link,
                    now.to_rfc3339(),
                ],
            )?;
            tx.commit()?;
            Ok(())
        })
    }

    /// Apply a review decision and its ledger side effect atomically.
    ///
    /// The delta is computed from the status on record *before* the
    /// overwrite: only the transition into `approved` credits the snapshotted
    /// points, and only `approved` -> `rejected` debits them back. Repeating
    /// the same decision is a no-op on the ledger.
    ///
    /// The lookup is scoped to `club_id`: a submission belonging to another
    /// club reads as absent, so a reviewer can only act within the club they
    /// were authorized against.
    pub fn review_submission(
        &self,
        submission_id: &str,
        club_id: &str,
        action: SubmissionStatus,
        reviewer_id: &str,
        now: DateTime<Utc>,
    ) -> Result<ReviewOutcome> {
        self.with_conn_mut(|conn| {
            let tx = conn.transaction()?;

            let row = tx
                .query_row(
                    "SELECT user_id, points, status FROM quest_submissions WHERE id = ?1 AND club_id = ?2",
                    params![submission_id, club_id],
                    |r| {
                        Ok((
                            r.get::<_, String>(0)?,
                            r.get::<_, i64>(1)?,
                            r.get::<_, String>(2)?,
                        ))
                    },
                )
                .optional()?;
            let (owner_id, quest_points, prev_raw) = row.ok_or(StoreError::SubmissionNotFound)?;

            let previous = SubmissionStatus::from_str(&prev_raw).ok_or_else(|| {
                StoreError::Internal(format!("corrupt submission status '{}'", prev_raw))
            })?;

            tx.execute(
                "UPDATE quest_submissions SET status = ?1, reviewed_by = ?2, reviewed_at = ?3 WHERE id = ?4",
                params![action.as_str(), reviewer_id, now.to_rfc3339(), submission_id],
            )?;

            let ledger_delta = match (previous, action) {
                (prev, SubmissionStatus::Approved) if prev != SubmissionStatus::Approved => quest_points,
                (SubmissionStatus::Approved, SubmissionStatus::Rejected) => -quest_points,
                _ => 0,
            };

            if ledger_delta != 0 {
                let changed = tx.execute(
                    "UPDATE users SET points = points + ?1 WHERE id = ?2",
                    params![ledger_delta, owner_id],
                )?;
                if changed == 0 {
                    // Orphan submission; abort rather than half-apply.
                    return Err(StoreError::UserNotFound);
                }
            }

            let user_points = tx
                .query_row("SELECT points FROM users WHERE id = ?1", [&owner_id], |r| {
                    r.get::<_, i64>(0)
                })
                .optional()?
                .ok_or(StoreError::UserNotFound)?;

            tx.commit()?;

            Ok(ReviewOutcome {
                previous,
                current: action,
                ledger_delta,
                user_points,
            })
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    const BONUS: i64 = 10;

    fn test_db() -> Database {
        Database::open_in_memory().unwrap()
    }

    fn seed_user(db: &Database, points: i64) -> String {
        let id = Uuid::new_v4().to_string();
        let email = format!("{}@club.test", &id[..8]);
        db.with_conn(|conn| {
            conn.execute(
                "INSERT INTO users (id, email, password, points) VALUES (?1, ?2, 'x', ?3)",
                params![id, email, points],
            )?;
            Ok(())
        })
        .unwrap();
        id
    }

    fn ts(s: &str) -> DateTime<Utc> {
        DateTime::parse_from_rfc3339(s).unwrap().with_timezone(&Utc)
    }

    fn submit(db: &Database, user: &str, quest: &str, points: i64) -> String {
        let id = Uuid::new_v4().to_string();
        db.create_submission(
            &id,
            &NewSubmission {
                user_id: user,
                club_id: "club-1",
                quest_id: quest,
                quest_title: "Quest",
                track: "general",
                points,
                repo_link: "https://example.com/repo",
            },
            ts("2025-03-01T12:00:00Z"),
        )
        .unwrap();
        id
    }

    #[test]
    fn claim_twice_same_day_grants_once() {
        let db = test_db();
        let user = seed_user(&db, 0);

        let first = db.claim_daily(&user, ts("2025-03-01T08:00:00Z"), BONUS).unwrap();
        assert!(first.granted);
        assert_eq!(first.points, BONUS);

        let second = db.claim_daily(&user, ts("2025-03-01T23:59:59Z"), BONUS).unwrap();
        assert!(!second.granted);
        assert_eq!(second.points, first.points);
        assert_eq!(second.last_claim_at, first.last_claim_at);
    }

    #[test]
    fn claim_across_utc_days_grants_each_day() {
        let db = test_db();
        let user = seed_user(&db, 0);

        let day1 = db.claim_daily(&user, ts("2025-03-01T23:59:59Z"), BONUS).unwrap();
        assert!(day1.granted);

        // One second later, but a new UTC calendar day.
        let day2 = db.claim_daily(&user, ts("2025-03-02T00:00:00Z"), BONUS).unwrap();
        assert!(day2.granted);
        assert_eq!(day2.points, 2 * BONUS);
    }

    #[test]
    fn concurrent_claims_grant_at_most_once_per_day() {
        use std::sync::atomic::{AtomicUsize, Ordering};

        let db = test_db();
        let user = seed_user(&db, 0);
        let now = ts("2025-03-01T08:00:00Z");

        let granted = AtomicUsize::new(0);
        std::thread::scope(|s| {
            for _ in 0..8 {
                s.spawn(|| {
                    let outcome = db.claim_daily(&user, now, BONUS).unwrap();
                    if outcome.granted {
                        granted.fetch_add(1, Ordering::SeqCst);
                    }
                });
            }
        });

        assert_eq!(granted.load(Ordering::SeqCst), 1);
        let points = db.get_user_by_id(&user).unwrap().unwrap().points;
        assert_eq!(points, BONUS);
    }

    #[test]
    fn claim_for_missing_user_fails() {
        let db = test_db();
        let err = db.claim_daily("nobody", ts("2025-03-01T08:00:00Z"), BONUS).unwrap_err();
        assert!(matches!(err, StoreError::UserNotFound));
    }

    #[test]
    fn same_utc_day_compares_calendar_dates() {
        assert!(same_utc_day(ts("2025-03-01T00:00:00Z"), ts("2025-03-01T23:59:59Z")));
        assert!(!same_utc_day(ts("2025-03-01T23:59:59Z"), ts("2025-03-02T00:00:00Z")));
    }

    #[test]
    fn duplicate_submission_blocked_while_live() {
        let db = test_db();
        let user = seed_user(&db, 0);
        submit(&db, &user, "q1", 100);

        let err = db
            .create_submission(
                &Uuid::new_v4().to_string(),
                &NewSubmission {
                    user_id: &user,
                    club_id: "club-1",
                    quest_id: "q1",
                    quest_title: "Quest",
                    track: "general",
                    points: 100,
                    repo_link: "https://example.com/other",
                },
                ts("2025-03-02T12:00:00Z"),
            )
            .unwrap_err();
        assert!(matches!(err, StoreError::DuplicateSubmission));
    }

    #[test]
    fn resubmission_allowed_after_rejection() {
        let db = test_db();
        let user = seed_user(&db, 0);
        let reviewer = seed_user(&db, 0);
        let sub = submit(&db, &user, "q1", 100);

        db.review_submission(&sub, "club-1", SubmissionStatus::Rejected, &reviewer, ts("2025-03-01T13:00:00Z"))
            .unwrap();

        // The rejected submission no longer blocks a fresh attempt.
        submit(&db, &user, "q1", 100);
    }

    #[test]
    fn approve_credits_snapshotted_points_once() {
        let db = test_db();
        let user = seed_user(&db, 0);
        let reviewer = seed_user(&db, 0);
        let sub = submit(&db, &user, "q1", 100);

        let first = db
            .review_submission(&sub, "club-1", SubmissionStatus::Approved, &reviewer, ts("2025-03-01T13:00:00Z"))
            .unwrap();
        assert_eq!(first.previous, SubmissionStatus::Pending);
        assert_eq!(first.ledger_delta, 100);
        assert_eq!(first.user_points, 100);

        // Repeat approval sees prev=approved and leaves the ledger alone.
        let second = db
            .review_submission(&sub, "club-1", SubmissionStatus::Approved, &reviewer, ts("2025-03-01T14:00:00Z"))
            .unwrap();
        assert_eq!(second.previous, SubmissionStatus::Approved);
        assert_eq!(second.ledger_delta, 0);
        assert_eq!(second.user_points, 100);
    }

    #[test]
    fn reject_after_approve_reverses_the_credit() {
        let db = test_db();
        let user = seed_user(&db, 50);
        let reviewer = seed_user(&db, 0);
        let sub = submit(&db, &user, "q1", 100);

        db.review_submission(&sub, "club-1", SubmissionStatus::Approved, &reviewer, ts("2025-03-01T13:00:00Z"))
            .unwrap();
        let outcome = db
            .review_submission(&sub, "club-1", SubmissionStatus::Rejected, &reviewer, ts("2025-03-01T14:00:00Z"))
            .unwrap();
        assert_eq!(outcome.ledger_delta, -100);
        assert_eq!(outcome.user_points, 50);
    }

    #[test]
    fn reject_pending_has_no_ledger_effect() {
        let db = test_db();
        let user = seed_user(&db, 30);
        let reviewer = seed_user(&db, 0);
        let sub = submit(&db, &user, "q1", 100);

        let outcome = db
            .review_submission(&sub, "club-1", SubmissionStatus::Rejected, &reviewer, ts("2025-03-01T13:00:00Z"))
            .unwrap();
        assert_eq!(outcome.ledger_delta, 0);
        assert_eq!(outcome.user_points, 30);
    }

    #[test]
    fn review_of_unknown_submission_fails() {
        let db = test_db();
        let reviewer = seed_user(&db, 0);
        let err = db
            .review_submission("missing", "club-1", SubmissionStatus::Approved, &reviewer, ts("2025-03-01T13:00:00Z"))
            .unwrap_err();
        assert!(matches!(err, StoreError::SubmissionNotFound));
    }

    #[test]
    fn review_is_scoped_to_the_submissions_club() {
        let db = test_db();
        let user = seed_user(&db, 0);
        let reviewer = seed_user(&db, 0);
        let sub = submit(&db, &user, "q1", 100);

        // An admin authorized for a different club can't touch this one.
        let err = db
            .review_submission(&sub, "club-2", SubmissionStatus::Approved, &reviewer, ts("2025-03-01T13:00:00Z"))
            .unwrap_err();
        assert!(matches!(err, StoreError::SubmissionNotFound));

        assert_eq!(db.get_user_by_id(&user).unwrap().unwrap().points, 0);
        let rows = db.submissions_for_user(&user).unwrap();
        assert_eq!(rows[0].status, "pending");
    }

    #[test]
    fn review_records_reviewer_and_timestamp() {
        let db = test_db();
        let user = seed_user(&db, 0);
        let reviewer = seed_user(&db, 0);
        let sub = submit(&db, &user, "q1", 100);

        db.review_submission(&sub, "club-1", SubmissionStatus::Approved, &reviewer, ts("2025-03-01T13:00:00Z"))
            .unwrap();

        let rows = db.submissions_for_user(&user).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].status, "approved");
        assert_eq!(rows[0].reviewed_by.as_deref(), Some(reviewer.as_str()));
        assert_eq!(rows[0].reviewed_at.as_deref(), Some("2025-03-01T13:00:00+00:00"));
    }

    #[test]
    fn ledger_scenario_end_to_end() {
        // 0 pts -> approve 100-pt quest -> 100 -> re-review rejected -> 0
        // -> claim (+10) -> 10 -> claim again same day -> still 10.
        let db = test_db();
        let user = seed_user(&db, 0);
        let reviewer = seed_user(&db, 0);
        let sub = submit(&db, &user, "q1", 100);

        let approved = db
            .review_submission(&sub, "club-1", SubmissionStatus::Approved, &reviewer, ts("2025-03-01T13:00:00Z"))
            .unwrap();
        assert_eq!(approved.user_points, 100);

        let rejected = db
            .review_submission(&sub, "club-1", SubmissionStatus::Rejected, &reviewer, ts("2025-03-01T14:00:00Z"))
            .unwrap();
        assert_eq!(rejected.user_points, 0);

        let claim = db.claim_daily(&user, ts("2025-03-02T09:00:00Z"), BONUS).unwrap();
        assert!(claim.granted);
        assert_eq!(claim.points, 10);

        let again = db.claim_daily(&user, ts("2025-03-02T18:00:00Z"), BONUS).unwrap();
        assert!(!again.granted);
        assert_eq!(again.points, 10);
    }
}
