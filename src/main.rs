//! Parfum Tracking - Visitor Analytics Service

use anyhow::Result;
use axum::extract::{Query, State};
use axum::http::HeaderMap;
use axum::routing::get;
use axum::{Json, Router};
use chrono::{Duration, Utc};
use serde::Deserialize;
use serde_json::{json, Value};
use sqlx::postgres::PgPoolOptions;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use parfum_tracking::domain::{bot, identity, ua, TrackingEvent, TrackingRequest};
use parfum_tracking::store::{carts, daily, pageviews, sessions, stats, visitors};
use parfum_tracking::TrackingError;

#[derive(Clone)]
pub struct AppState {
    pub db: sqlx::PgPool,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with(tracing_subscriber::fmt::layer())
        .init();
    let db = PgPoolOptions::new()
        .max_connections(10)
        .connect(&std::env::var("DATABASE_URL")?)
        .await?;
    sqlx::migrate!("./migrations").run(&db).await?;
    let state = AppState { db };

    let app = Router::new()
        .route(
            "/health",
            get(|| async { Json(json!({"status": "healthy", "service": "parfum-tracking"})) }),
        )
        .route("/api/v1/tracking", get(query_tracking).post(ingest_event))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state);

    let port = std::env::var("PORT").unwrap_or_else(|_| "8084".to_string());
    tracing::info!("parfum-tracking listening on 0.0.0.0:{}", port);
    axum::serve(tokio::net::TcpListener::bind(format!("0.0.0.0:{}", port)).await?, app).await?;
    Ok(())
}

/// `POST /api/v1/tracking` with `{action, data}`.
///
/// Bots are answered first and never reach the store. A single timestamp
/// is taken per request and threaded through every mutation.
async fn ingest_event(
    State(s): State<AppState>,
    headers: HeaderMap,
    Json(req): Json<TrackingRequest>,
) -> std::result::Result<Json<Value>, TrackingError> {
    let user_agent = headers
        .get("user-agent")
        .and_then(|v| v.to_str().ok())
        .unwrap_or("")
        .to_string();
    if bot::is_bot(&user_agent) {
        return Ok(Json(json!({"success": true, "ignored": true})));
    }

    let ip = identity::client_ip(&headers);
    let visitor_id = identity::visitor_id(&ip, &user_agent);
    let now = Utc::now();

    match TrackingEvent::parse(req)? {
        TrackingEvent::Visit(payload) => {
            let profile = ua::classify(&user_agent);
            visitors::record_visit(&s.db, &visitor_id, &ip, &user_agent, &profile, now).await?;
            daily::record_visit(&s.db, now.date_naive(), &ip, &visitor_id, &profile, now).await?;
            let session_id = payload.session_id.unwrap_or_else(identity::new_session_id);
            Ok(Json(json!({"success": true, "visitorId": visitor_id, "sessionId": session_id})))
        }
        TrackingEvent::Pageview(payload) => {
            // Instrumentation can fire without a URL; nothing useful can
            // be recorded, so degrade to a silent no-op.
            let Some(page_url) = payload.page_url.as_deref() else {
                return Ok(Json(json!({"success": true})));
            };
            pageviews::insert(&s.db, &visitor_id, page_url, &payload, now).await?;
            daily::record_page_view(&s.db, now.date_naive(), &ip).await?;
            if let Some(session_id) = payload.session_id.as_deref() {
                sessions::record_page(&s.db, session_id, &visitor_id, page_url, now).await?;
            }
            Ok(Json(json!({"success": true})))
        }
        TrackingEvent::Cart(payload) => {
            carts::upsert(&s.db, &visitor_id, &payload, now).await?;
            Ok(Json(json!({"success": true})))
        }
        TrackingEvent::CartConverted => {
            carts::mark_converted(&s.db, &visitor_id, now).await?;
            Ok(Json(json!({"success": true})))
        }
        TrackingEvent::EndSession(payload) => {
            if let Some(session_id) = payload.session_id.as_deref() {
                sessions::end(&s.db, session_id, payload.duration, now).await?;
            }
            Ok(Json(json!({"success": true})))
        }
    }
}

/// Day windows wider than a year are meaningless for these dashboards.
const MAX_WINDOW_DAYS: i64 = 365;

#[derive(Debug, Deserialize)]
pub struct TrackingQuery {
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub days: Option<i64>,
}

impl TrackingQuery {
    /// Clamp the caller-supplied window to a sane positive range; an
    /// extreme value would overflow the duration math and a negative one
    /// would reach the store as a negative LIMIT.
    fn window_days(&self, default: i64) -> i64 {
        self.days.unwrap_or(default).clamp(1, MAX_WINDOW_DAYS)
    }
}

/// `GET /api/v1/tracking?type=...&days=N` - read-side aggregation.
async fn query_tracking(
    State(s): State<AppState>,
    Query(q): Query<TrackingQuery>,
) -> std::result::Result<Json<Value>, TrackingError> {
    let now = Utc::now();
    let kind = q.kind.as_deref().ok_or(TrackingError::MissingQueryType)?;
    match kind {
        "visitors" => {
            let since = now - Duration::days(q.window_days(7));
            let visitors = visitors::list_recent(&s.db, since).await?;
            Ok(Json(json!({ "visitors": visitors })))
        }
        "pageviews" => {
            let since = now - Duration::days(q.window_days(7));
            let pageviews = pageviews::list_recent(&s.db, since).await?;
            Ok(Json(json!({ "pageviews": pageviews })))
        }
        "carts" => {
            let carts = carts::list_active_views(&s.db, now).await?;
            Ok(Json(json!({ "carts": carts })))
        }
        "stats" => {
            let snapshot = stats::snapshot(&s.db, now).await?;
            Ok(Json(json!({ "stats": snapshot })))
        }
        "daily_history" => {
            let history =
                stats::history(&s.db, q.window_days(stats::DAILY_HISTORY_DEFAULT_DAYS)).await?;
            Ok(Json(json!({ "history": history })))
        }
        "today_details" => {
            let details = daily::list_for_date(&s.db, now.date_naive()).await?;
            Ok(Json(json!({ "todayDetails": details })))
        }
        "top_pages" => {
            let since = now - Duration::days(q.window_days(7));
            let urls = pageviews::urls_since(&s.db, since).await?;
            Ok(Json(json!({ "topPages": pageviews::rank_top_pages(&urls) })))
        }
        other => Err(TrackingError::UnknownQueryType(other.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_window_days_clamps_extremes() {
        let q = TrackingQuery { kind: None, days: Some(i64::MAX) };
        assert_eq!(q.window_days(7), MAX_WINDOW_DAYS);
        // The clamped window must survive the handler's duration math.
        let _ = Utc::now() - Duration::days(q.window_days(7));

        let q = TrackingQuery { kind: None, days: Some(i64::MIN) };
        assert_eq!(q.window_days(7), 1);
    }

    #[test]
    fn test_window_days_rejects_nonpositive() {
        let q = TrackingQuery { kind: None, days: Some(-5) };
        assert_eq!(q.window_days(30), 1);
        let q = TrackingQuery { kind: None, days: Some(0) };
        assert_eq!(q.window_days(30), 1);
    }

    #[test]
    fn test_window_days_defaults() {
        let q = TrackingQuery { kind: None, days: None };
        assert_eq!(q.window_days(7), 7);
        assert_eq!(q.window_days(30), 30);
    }
}
