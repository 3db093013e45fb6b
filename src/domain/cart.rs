//! Cart lifecycle rules
//!
//! Abandonment is derived at read time from `last_activity`, never stored
//! as a persistent flag on every path. Conversion is terminal: a converted
//! cart is excluded from "active" regardless of later activity.

use chrono::{DateTime, Duration, Utc};

/// A cart with no activity for this long counts as abandoned.
pub const ABANDONMENT_THRESHOLD_SECS: i64 = 2 * 60 * 60;

pub fn is_abandoned(
    last_activity: DateTime<Utc>,
    converted_at: Option<DateTime<Utc>>,
    now: DateTime<Utc>,
) -> bool {
    converted_at.is_none()
        && now.signed_duration_since(last_activity) > Duration::seconds(ABANDONMENT_THRESHOLD_SECS)
}
