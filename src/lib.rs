//! Parfum Tracking - Visitor Analytics Service
//!
//! Tracking ingestion and aggregation backend for the perfume storefront.
//!
//! ## Features
//! - Bot filtering ahead of any state mutation
//! - Pseudonymous visitor identity from IP + user agent
//! - Per-day visit and pageview rollups
//! - Cart abandonment and conversion tracking
//! - Read-side aggregation queries for the admin dashboard

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use thiserror::Error;

pub mod domain;
pub mod store;

#[derive(Error, Debug)]
pub enum TrackingError {
    #[error("invalid action: {0}")]
    InvalidAction(String),

    #[error("missing query type")]
    MissingQueryType,

    #[error("unknown query type: {0}")]
    UnknownQueryType(String),

    #[error("invalid payload: {0}")]
    Payload(#[from] serde_json::Error),

    #[error("storage error: {0}")]
    Storage(#[from] sqlx::Error),
}

impl IntoResponse for TrackingError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            // Store detail stays in the logs, not in the response body.
            Self::Storage(err) => {
                tracing::error!("tracking store failure: {err}");
                (StatusCode::INTERNAL_SERVER_ERROR, "tracking failed".to_string())
            }
            _ => (StatusCode::BAD_REQUEST, self.to_string()),
        };
        (status, Json(json!({ "error": message }))).into_response()
    }
}

pub type Result<T> = std::result::Result<T, TrackingError>;
