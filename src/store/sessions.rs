//! Visitor sessions
//!
//! Session ids are client-generated and opaque. A session row appears on
//! the first pageview that carries an unseen id; `ended_at` and `duration`
//! are set once by `end_session`.

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::PgPool;

use crate::Result;

#[derive(Clone, Debug, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct VisitorSession {
    pub session_id: String,
    pub visitor_id: String,
    pub entry_page: String,
    pub exit_page: String,
    pub page_count: i64,
    pub started_at: DateTime<Utc>,
    pub ended_at: Option<DateTime<Utc>>,
    pub duration: Option<i32>,
}

/// Upsert on `pageview`: first sight creates the session with the page as
/// both entry and exit; later pageviews bump `page_count` and overwrite
/// `exit_page` only.
pub async fn record_page(
    pool: &PgPool,
    session_id: &str,
    visitor_id: &str,
    page_url: &str,
    now: DateTime<Utc>,
) -> Result<()> {
    sqlx::query(
        "INSERT INTO visitor_sessions (session_id, visitor_id, entry_page, exit_page, page_count, started_at)
         VALUES ($1, $2, $3, $3, 1, $4)
         ON CONFLICT (session_id) DO UPDATE SET
             page_count = visitor_sessions.page_count + 1,
             exit_page = EXCLUDED.exit_page",
    )
    .bind(session_id)
    .bind(visitor_id)
    .bind(page_url)
    .bind(now)
    .execute(pool)
    .await?;
    Ok(())
}

/// Close the session; no-op when the id was never seen.
pub async fn end(
    pool: &PgPool,
    session_id: &str,
    duration: Option<i32>,
    now: DateTime<Utc>,
) -> Result<()> {
    sqlx::query("UPDATE visitor_sessions SET ended_at = $2, duration = $3 WHERE session_id = $1")
        .bind(session_id)
        .bind(now)
        .bind(duration)
        .execute(pool)
        .await?;
    Ok(())
}
