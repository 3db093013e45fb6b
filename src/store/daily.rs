//! Per-IP per-day rollups
//!
//! One row per `(date, ip)`; a fresh row starts each calendar day even for
//! a returning IP. These rows back the "today" dashboard without scanning
//! the full pageview history.

use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;
use sqlx::PgPool;

use crate::domain::UaProfile;
use crate::Result;

#[derive(Clone, Debug, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct DailyVisit {
    pub visit_date: NaiveDate,
    pub ip_address: String,
    pub visitor_id: String,
    pub device_type: String,
    pub browser: String,
    pub os: String,
    pub visit_count: i64,
    pub pages_viewed: i64,
    pub last_visit_time: DateTime<Utc>,
}

/// Upsert on `visit`: first visit of the day inserts a fresh row; later
/// visits increment `visit_count` and refresh `last_visit_time` while
/// preserving the accumulated `pages_viewed`.
pub async fn record_visit(
    pool: &PgPool,
    date: NaiveDate,
    ip: &str,
    visitor_id: &str,
    profile: &UaProfile,
    now: DateTime<Utc>,
) -> Result<()> {
    sqlx::query(
        "INSERT INTO daily_visits (visit_date, ip_address, visitor_id, device_type, browser, os, visit_count, pages_viewed, last_visit_time)
         VALUES ($1, $2, $3, $4, $5, $6, 1, 0, $7)
         ON CONFLICT (visit_date, ip_address) DO UPDATE SET
             visit_count = daily_visits.visit_count + 1,
             last_visit_time = EXCLUDED.last_visit_time",
    )
    .bind(date)
    .bind(ip)
    .bind(visitor_id)
    .bind(profile.device)
    .bind(profile.browser)
    .bind(profile.os)
    .bind(now)
    .execute(pool)
    .await?;
    Ok(())
}

/// Bump `pages_viewed` for today's row. Plain UPDATE, not an upsert: a
/// pageview arriving before the day's `visit` event finds no row and the
/// increment is silently dropped, matching the ingestion order contract.
pub async fn record_page_view(pool: &PgPool, date: NaiveDate, ip: &str) -> Result<()> {
    sqlx::query(
        "UPDATE daily_visits SET pages_viewed = pages_viewed + 1
         WHERE visit_date = $1 AND ip_address = $2",
    )
    .bind(date)
    .bind(ip)
    .execute(pool)
    .await?;
    Ok(())
}

/// All rollup rows for `date`, most recent activity first.
pub async fn list_for_date(pool: &PgPool, date: NaiveDate) -> Result<Vec<DailyVisit>> {
    let rows = sqlx::query_as::<_, DailyVisit>(
        "SELECT * FROM daily_visits WHERE visit_date = $1 ORDER BY last_visit_time DESC",
    )
    .bind(date)
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

/// `(unique_ips, total_visits)` for `date`. Row count equals distinct IPs
/// because `(visit_date, ip_address)` is the primary key.
pub async fn totals_for_date(pool: &PgPool, date: NaiveDate) -> Result<(i64, i64)> {
    let totals: (i64, i64) = sqlx::query_as(
        "SELECT COUNT(*), COALESCE(SUM(visit_count), 0)::BIGINT
         FROM daily_visits WHERE visit_date = $1",
    )
    .bind(date)
    .fetch_one(pool)
    .await?;
    Ok(totals)
}
