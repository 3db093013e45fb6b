//! Tracking event envelope
//!
//! Inbound events arrive as `{action, data}` with a per-action payload
//! shape. The envelope is parsed into one typed variant per action;
//! unknown actions are rejected before any state mutation.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::TrackingError;

/// Raw request body for `POST /api/v1/tracking`.
#[derive(Debug, Deserialize)]
pub struct TrackingRequest {
    pub action: String,
    #[serde(default)]
    pub data: Value,
}

#[derive(Debug)]
pub enum TrackingEvent {
    Visit(VisitPayload),
    Pageview(PageviewPayload),
    Cart(CartPayload),
    CartConverted,
    EndSession(EndSessionPayload),
}

impl TrackingEvent {
    pub fn parse(req: TrackingRequest) -> Result<Self, TrackingError> {
        let TrackingRequest { action, data } = req;
        // Treat an absent `data` field the same as an empty object.
        let data = if data.is_null() {
            Value::Object(Default::default())
        } else {
            data
        };
        match action.as_str() {
            "visit" => Ok(Self::Visit(serde_json::from_value(data)?)),
            "pageview" => Ok(Self::Pageview(serde_json::from_value(data)?)),
            "cart" => Ok(Self::Cart(serde_json::from_value(data)?)),
            "cart_converted" => Ok(Self::CartConverted),
            "end_session" => Ok(Self::EndSession(serde_json::from_value(data)?)),
            _ => Err(TrackingError::InvalidAction(action)),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct VisitPayload {
    pub session_id: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PageviewPayload {
    pub page_url: Option<String>,
    pub page_title: Option<String>,
    pub referrer: Option<String>,
    pub session_id: Option<String>,
    pub time_on_page: Option<i32>,
    pub scroll_depth: Option<i32>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CartPayload {
    pub items: Vec<CartLine>,
    pub subtotal: f64,
    pub session_id: Option<String>,
    pub user_email: Option<String>,
}

impl CartPayload {
    /// Total units across all lines, stored denormalized on the cart row.
    pub fn item_count(&self) -> i64 {
        self.items.iter().map(|line| line.quantity).sum()
    }
}

#[derive(Clone, Debug, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CartLine {
    pub product_id: String,
    pub size: Option<String>,
    pub quantity: i64,
    pub price: f64,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct EndSessionPayload {
    pub session_id: Option<String>,
    pub duration: Option<i32>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn parse(body: Value) -> Result<TrackingEvent, TrackingError> {
        TrackingEvent::parse(serde_json::from_value(body).unwrap())
    }

    #[test]
    fn test_parse_visit_with_session() {
        let event = parse(json!({"action": "visit", "data": {"sessionId": "s1"}})).unwrap();
        match event {
            TrackingEvent::Visit(p) => assert_eq!(p.session_id.as_deref(), Some("s1")),
            other => panic!("expected visit, got {other:?}"),
        }
    }

    #[test]
    fn test_parse_tolerates_missing_data() {
        assert!(matches!(
            parse(json!({"action": "visit"})).unwrap(),
            TrackingEvent::Visit(_)
        ));
        assert!(matches!(
            parse(json!({"action": "cart_converted"})).unwrap(),
            TrackingEvent::CartConverted
        ));
    }

    #[test]
    fn test_unknown_action_rejected() {
        let err = parse(json!({"action": "purchase", "data": {}})).unwrap_err();
        assert!(matches!(err, TrackingError::InvalidAction(a) if a == "purchase"));
    }

    #[test]
    fn test_cart_item_count_sums_quantities() {
        let event = parse(json!({
            "action": "cart",
            "data": {
                "items": [
                    {"productId": "eau-de-nuit", "size": "50ml", "quantity": 2, "price": 89.0},
                    {"productId": "ambre-royal", "size": "100ml", "quantity": 1, "price": 129.5}
                ],
                "subtotal": 307.5,
                "userEmail": "claire@example.com"
            }
        }))
        .unwrap();
        match event {
            TrackingEvent::Cart(p) => {
                assert_eq!(p.item_count(), 3);
                assert_eq!(p.subtotal, 307.5);
                assert_eq!(p.user_email.as_deref(), Some("claire@example.com"));
            }
            other => panic!("expected cart, got {other:?}"),
        }
    }

    #[test]
    fn test_pageview_payload_fields() {
        let event = parse(json!({
            "action": "pageview",
            "data": {"pageUrl": "/parfums", "pageTitle": "Parfums", "sessionId": "s1", "scrollDepth": 80}
        }))
        .unwrap();
        match event {
            TrackingEvent::Pageview(p) => {
                assert_eq!(p.page_url.as_deref(), Some("/parfums"));
                assert_eq!(p.scroll_depth, Some(80));
                assert_eq!(p.time_on_page, None);
            }
            other => panic!("expected pageview, got {other:?}"),
        }
    }

    #[test]
    fn test_pageview_without_url_parses_to_none() {
        let event = parse(json!({"action": "pageview", "data": {"sessionId": "s1"}})).unwrap();
        match event {
            // No empty-string URL: the handler drops URL-less pageviews
            // instead of logging them.
            TrackingEvent::Pageview(p) => assert_eq!(p.page_url, None),
            other => panic!("expected pageview, got {other:?}"),
        }
    }
}
