//! Aggregate snapshots and the daily archive

use chrono::{DateTime, Duration, NaiveDate, NaiveTime, Utc};
use serde::Serialize;
use sqlx::PgPool;

use crate::store::{carts, daily, pageviews, visitors};
use crate::Result;

pub const DAILY_HISTORY_DEFAULT_DAYS: i64 = 30;

/// One row of the externally populated nightly archive. This service only
/// reads it; the batch job that writes it lives elsewhere.
#[derive(Clone, Debug, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct DailyStats {
    pub stat_date: NaiveDate,
    pub unique_visitors: i64,
    pub total_visits: i64,
    pub total_page_views: i64,
    pub new_visitors: i64,
    pub returning_visitors: i64,
    pub total_cart_value: f64,
    pub abandoned_carts: i64,
    pub converted_carts: i64,
    pub top_pages: serde_json::Value,
    pub device_breakdown: serde_json::Value,
    pub browser_breakdown: serde_json::Value,
}

/// Most recent `limit` archive rows, newest first.
pub async fn history(pool: &PgPool, limit: i64) -> Result<Vec<DailyStats>> {
    let rows = sqlx::query_as::<_, DailyStats>(
        "SELECT * FROM daily_stats ORDER BY stat_date DESC LIMIT $1",
    )
    .bind(limit)
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

/// Composite "right now" snapshot for the admin dashboard.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatsSnapshot {
    pub unique_visitors_today: i64,
    pub total_visits_today: i64,
    pub page_views_today: i64,
    pub active_cart_count: i64,
    pub active_cart_value: f64,
    pub active_carts: Vec<carts::ActiveCart>,
    pub total_visitors: i64,
}

pub async fn snapshot(pool: &PgPool, now: DateTime<Utc>) -> Result<StatsSnapshot> {
    let today = now.date_naive();
    let day_start = today.and_time(NaiveTime::MIN).and_utc();

    let (unique_visitors_today, total_visits_today) =
        daily::totals_for_date(pool, today).await?;
    let page_views_today = pageviews::count_since(pool, day_start).await?;
    let active = carts::list_active_since(pool, now - Duration::hours(24)).await?;
    let active_cart_value = active.iter().map(|c| c.subtotal).sum();
    let total_visitors = visitors::count_all(pool).await?;

    Ok(StatsSnapshot {
        unique_visitors_today,
        total_visits_today,
        page_views_today,
        active_cart_count: active.len() as i64,
        active_cart_value,
        active_carts: active,
        total_visitors,
    })
}
