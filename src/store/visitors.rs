//! All-time visitor records

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::PgPool;

use crate::domain::UaProfile;
use crate::Result;

/// Hard cap on the visitor list query.
pub const VISITOR_PAGE_SIZE: i64 = 500;

#[derive(Clone, Debug, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Visitor {
    pub visitor_id: String,
    pub ip_address: String,
    pub user_agent: String,
    pub device_type: String,
    pub browser: String,
    pub os: String,
    pub first_visit: DateTime<Utc>,
    pub last_visit: DateTime<Utc>,
    pub visit_count: i64,
    pub is_bot: bool,
}

/// Upsert on `visit`: first sight inserts with `visit_count = 1` and pins
/// `first_visit`; every later visit increments the counter atomically and
/// refreshes the last-observed IP, user agent, and classification.
pub async fn record_visit(
    pool: &PgPool,
    visitor_id: &str,
    ip: &str,
    user_agent: &str,
    profile: &UaProfile,
    now: DateTime<Utc>,
) -> Result<()> {
    sqlx::query(
        "INSERT INTO visitors (visitor_id, ip_address, user_agent, device_type, browser, os, first_visit, last_visit, visit_count, is_bot)
         VALUES ($1, $2, $3, $4, $5, $6, $7, $7, 1, FALSE)
         ON CONFLICT (visitor_id) DO UPDATE SET
             ip_address = EXCLUDED.ip_address,
             user_agent = EXCLUDED.user_agent,
             device_type = EXCLUDED.device_type,
             browser = EXCLUDED.browser,
             os = EXCLUDED.os,
             last_visit = EXCLUDED.last_visit,
             visit_count = visitors.visit_count + 1",
    )
    .bind(visitor_id)
    .bind(ip)
    .bind(user_agent)
    .bind(profile.device)
    .bind(profile.browser)
    .bind(profile.os)
    .bind(now)
    .execute(pool)
    .await?;
    Ok(())
}

/// Non-bot visitors seen since `since`, most recent first.
pub async fn list_recent(pool: &PgPool, since: DateTime<Utc>) -> Result<Vec<Visitor>> {
    let visitors = sqlx::query_as::<_, Visitor>(
        "SELECT * FROM visitors WHERE is_bot = FALSE AND last_visit >= $1
         ORDER BY last_visit DESC LIMIT $2",
    )
    .bind(since)
    .bind(VISITOR_PAGE_SIZE)
    .fetch_all(pool)
    .await?;
    Ok(visitors)
}

/// All-time non-bot visitor count.
pub async fn count_all(pool: &PgPool) -> Result<i64> {
    let total: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM visitors WHERE is_bot = FALSE")
        .fetch_one(pool)
        .await?;
    Ok(total.0)
}
