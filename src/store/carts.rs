//! Active cart state
//!
//! One cart per visitor, upserted on every `cart` event. Any cart update
//! clears `abandoned_at` (activity disproves abandonment); `converted_at`
//! is set once by `cart_converted` and never cleared.

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::PgPool;

use crate::domain::cart::is_abandoned;
use crate::domain::event::CartPayload;
use crate::{Result, TrackingError};

/// Hard cap on the active-cart list query.
pub const CART_PAGE_SIZE: i64 = 100;

#[derive(Clone, Debug, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct ActiveCart {
    pub visitor_id: String,
    pub session_id: Option<String>,
    pub items: serde_json::Value,
    pub subtotal: f64,
    pub item_count: i64,
    pub last_activity: DateTime<Utc>,
    pub user_email: Option<String>,
    pub abandoned_at: Option<DateTime<Utc>>,
    pub converted_at: Option<DateTime<Utc>>,
}

/// Cart as served to the dashboard: the row plus the read-time abandonment
/// flag and, when the email matches an account, the customer profile.
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CartView {
    #[serde(flatten)]
    pub cart: ActiveCart,
    pub abandoned: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub customer: Option<CustomerProfile>,
}

#[derive(Clone, Debug, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct CustomerProfile {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub phone: Option<String>,
}

pub async fn upsert(
    pool: &PgPool,
    visitor_id: &str,
    payload: &CartPayload,
    now: DateTime<Utc>,
) -> Result<()> {
    let items = serde_json::to_value(&payload.items).map_err(TrackingError::Payload)?;
    // converted_at is deliberately absent from the update list: conversion
    // is terminal and later cart events must not resurrect the cart.
    sqlx::query(
        "INSERT INTO active_carts (visitor_id, session_id, items, subtotal, item_count, last_activity, user_email, abandoned_at)
         VALUES ($1, $2, $3, $4, $5, $6, $7, NULL)
         ON CONFLICT (visitor_id) DO UPDATE SET
             session_id = EXCLUDED.session_id,
             items = EXCLUDED.items,
             subtotal = EXCLUDED.subtotal,
             item_count = EXCLUDED.item_count,
             last_activity = EXCLUDED.last_activity,
             user_email = EXCLUDED.user_email,
             abandoned_at = NULL",
    )
    .bind(visitor_id)
    .bind(&payload.session_id)
    .bind(items)
    .bind(payload.subtotal)
    .bind(payload.item_count())
    .bind(now)
    .bind(&payload.user_email)
    .execute(pool)
    .await?;
    Ok(())
}

/// Idempotent in effect: setting `converted_at` twice observes the same
/// terminal state. No existence check.
pub async fn mark_converted(pool: &PgPool, visitor_id: &str, now: DateTime<Utc>) -> Result<()> {
    sqlx::query("UPDATE active_carts SET converted_at = $2 WHERE visitor_id = $1")
        .bind(visitor_id)
        .bind(now)
        .execute(pool)
        .await?;
    Ok(())
}

/// Non-empty, non-converted carts, most recent activity first.
pub async fn list_active(pool: &PgPool) -> Result<Vec<ActiveCart>> {
    let carts = sqlx::query_as::<_, ActiveCart>(
        "SELECT * FROM active_carts
         WHERE item_count > 0 AND converted_at IS NULL
         ORDER BY last_activity DESC LIMIT $1",
    )
    .bind(CART_PAGE_SIZE)
    .fetch_all(pool)
    .await?;
    Ok(carts)
}

/// Active carts touched since `since`; feeds the stats snapshot.
pub async fn list_active_since(pool: &PgPool, since: DateTime<Utc>) -> Result<Vec<ActiveCart>> {
    let carts = sqlx::query_as::<_, ActiveCart>(
        "SELECT * FROM active_carts
         WHERE item_count > 0 AND converted_at IS NULL AND last_activity >= $1
         ORDER BY last_activity DESC LIMIT $2",
    )
    .bind(since)
    .bind(CART_PAGE_SIZE)
    .fetch_all(pool)
    .await?;
    Ok(carts)
}

async fn customer_by_email(pool: &PgPool, email: &str) -> Result<Option<CustomerProfile>> {
    let profile = sqlx::query_as::<_, CustomerProfile>(
        "SELECT first_name, last_name, phone FROM customers WHERE email = $1",
    )
    .bind(email)
    .fetch_optional(pool)
    .await?;
    Ok(profile)
}

/// Active carts enriched for the dashboard. Profile lookup is best-effort:
/// a cart whose email matches no account is returned unenriched.
pub async fn list_active_views(pool: &PgPool, now: DateTime<Utc>) -> Result<Vec<CartView>> {
    let carts = list_active(pool).await?;
    let mut views = Vec::with_capacity(carts.len());
    for cart in carts {
        let customer = match cart.user_email.as_deref() {
            Some(email) => customer_by_email(pool, email).await.ok().flatten(),
            None => None,
        };
        let abandoned = is_abandoned(cart.last_activity, cart.converted_at, now);
        views.push(CartView { cart, abandoned, customer });
    }
    Ok(views)
}
