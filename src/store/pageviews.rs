//! Append-only pageview log

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::PgPool;

use crate::domain::event::PageviewPayload;
use crate::Result;

/// Hard cap on pageview list queries. Top-pages ranking aggregates over
/// the same capped fetch, so on very busy windows the ranking is an
/// approximation over the most recent rows.
pub const PAGE_VIEW_PAGE_SIZE: i64 = 1000;

/// Ranking is truncated to this many entries.
pub const TOP_PAGES_LIMIT: usize = 20;

#[derive(Clone, Debug, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct PageView {
    pub id: i64,
    pub visitor_id: String,
    pub page_url: String,
    pub page_title: Option<String>,
    pub referrer: Option<String>,
    pub session_id: Option<String>,
    pub time_on_page: Option<i32>,
    pub scroll_depth: Option<i32>,
    pub created_at: DateTime<Utc>,
}

/// Insert one immutable row per pageview event.
pub async fn insert(
    pool: &PgPool,
    visitor_id: &str,
    page_url: &str,
    payload: &PageviewPayload,
    now: DateTime<Utc>,
) -> Result<()> {
    sqlx::query(
        "INSERT INTO page_views (visitor_id, page_url, page_title, referrer, session_id, time_on_page, scroll_depth, created_at)
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8)",
    )
    .bind(visitor_id)
    .bind(page_url)
    .bind(&payload.page_title)
    .bind(&payload.referrer)
    .bind(&payload.session_id)
    .bind(payload.time_on_page)
    .bind(payload.scroll_depth)
    .bind(now)
    .execute(pool)
    .await?;
    Ok(())
}

/// Pageviews since `since`, most recent first.
pub async fn list_recent(pool: &PgPool, since: DateTime<Utc>) -> Result<Vec<PageView>> {
    let views = sqlx::query_as::<_, PageView>(
        "SELECT * FROM page_views WHERE created_at >= $1 ORDER BY created_at DESC LIMIT $2",
    )
    .bind(since)
    .bind(PAGE_VIEW_PAGE_SIZE)
    .fetch_all(pool)
    .await?;
    Ok(views)
}

/// Number of pageview rows created since `since`.
pub async fn count_since(pool: &PgPool, since: DateTime<Utc>) -> Result<i64> {
    let total: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM page_views WHERE created_at >= $1")
        .bind(since)
        .fetch_one(pool)
        .await?;
    Ok(total.0)
}

/// Page URLs since `since`, capped at [`PAGE_VIEW_PAGE_SIZE`]; input for
/// the in-memory top-pages ranking.
pub async fn urls_since(pool: &PgPool, since: DateTime<Utc>) -> Result<Vec<String>> {
    let urls: Vec<(String,)> = sqlx::query_as(
        "SELECT page_url FROM page_views WHERE created_at >= $1 ORDER BY created_at DESC LIMIT $2",
    )
    .bind(since)
    .bind(PAGE_VIEW_PAGE_SIZE)
    .fetch_all(pool)
    .await?;
    Ok(urls.into_iter().map(|(url,)| url).collect())
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TopPage {
    pub page_url: String,
    pub views: i64,
}

/// Group URLs, count, and rank descending by count (URL as tiebreaker for
/// a stable order), truncated to [`TOP_PAGES_LIMIT`].
pub fn rank_top_pages(urls: &[String]) -> Vec<TopPage> {
    let mut counts: HashMap<&str, i64> = HashMap::new();
    for url in urls {
        *counts.entry(url).or_default() += 1;
    }
    let mut pages: Vec<TopPage> = counts
        .into_iter()
        .map(|(page_url, views)| TopPage { page_url: page_url.to_string(), views })
        .collect();
    pages.sort_by(|a, b| b.views.cmp(&a.views).then_with(|| a.page_url.cmp(&b.page_url)));
    pages.truncate(TOP_PAGES_LIMIT);
    pages
}

#[cfg(test)]
mod tests {
    use super::*;

    fn urls(entries: &[(&str, usize)]) -> Vec<String> {
        let mut out = Vec::new();
        for (url, count) in entries {
            out.extend(std::iter::repeat(url.to_string()).take(*count));
        }
        out
    }

    #[test]
    fn test_rank_strictly_descending() {
        let ranked = rank_top_pages(&urls(&[("/a", 5), ("/b", 3), ("/c", 8)]));
        assert_eq!(
            ranked,
            vec![
                TopPage { page_url: "/c".into(), views: 8 },
                TopPage { page_url: "/a".into(), views: 5 },
                TopPage { page_url: "/b".into(), views: 3 },
            ]
        );
    }

    #[test]
    fn test_rank_truncates_to_limit() {
        let many: Vec<(String, usize)> =
            (0..30usize).map(|i| (format!("/page-{i}"), i + 1)).collect();
        let entries: Vec<(&str, usize)> = many.iter().map(|(u, c)| (u.as_str(), *c)).collect();
        let ranked = rank_top_pages(&urls(&entries));
        assert_eq!(ranked.len(), TOP_PAGES_LIMIT);
        assert_eq!(ranked[0].views, 30);
    }

    #[test]
    fn test_rank_empty_input() {
        assert!(rank_top_pages(&[]).is_empty());
    }
}
