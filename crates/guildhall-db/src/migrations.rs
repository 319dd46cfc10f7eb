use rusqlite::Connection;
use tracing::info;

use crate::Result;

pub fn run(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS users (
            id                   TEXT PRIMARY KEY,
            email                TEXT NOT NULL UNIQUE,
            password             TEXT NOT NULL,
            role                 TEXT NOT NULL DEFAULT 'member',
            points               INTEGER NOT NULL DEFAULT 0,
            last_daily_claim_at  TEXT,
            created_at           TEXT NOT NULL DEFAULT (datetime('now'))
        );

        CREATE TABLE IF NOT EXISTS clubs (
            id            TEXT PRIMARY KEY,
            name          TEXT NOT NULL,
            admin_emails  TEXT NOT NULL DEFAULT '[]',
            created_at    TEXT NOT NULL DEFAULT (datetime('now'))
        );

        CREATE TABLE IF NOT EXISTS quest_submissions (
            id            TEXT PRIMARY KEY,
            user_id       TEXT NOT NULL REFERENCES users(id),
            club_id       TEXT NOT NULL,
            quest_id      TEXT NOT NULL,
            quest_title   TEXT NOT NULL DEFAULT '',
            track         TEXT NOT NULL DEFAULT 'general',
            points        INTEGER NOT NULL,
            repo_link     TEXT NOT NULL,
            status        TEXT NOT NULL DEFAULT 'pending',
            submitted_at  TEXT NOT NULL,
            reviewed_by   TEXT,
            reviewed_at   TEXT
        );

        CREATE INDEX IF NOT EXISTS idx_submissions_user_quest
            ON quest_submissions(user_id, quest_id);

        CREATE INDEX IF NOT EXISTS idx_submissions_club
            ON quest_submissions(club_id, submitted_at);
        ",
    )?;

    info!("Database migrations complete");
    Ok(())
}
