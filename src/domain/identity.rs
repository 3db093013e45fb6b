//! Pseudonymous visitor identity
//!
//! The visitor id is a one-way digest of IP + user agent. It is the join
//! key across all tracking tables and requires no cookies or client-side
//! storage. Same input, same id.

use axum::http::HeaderMap;
use rand::RngCore;
use sha2::{Digest, Sha256};

/// Used when no forwarding header is present. All direct traffic without
/// the header collapses into one synthetic identity; accepted trade-off.
pub const FALLBACK_IP: &str = "127.0.0.1";

/// Derive the stable visitor id for an `(ip, user_agent)` pair:
/// SHA-256 of `"{ip}:{ua}"`, lowercase hex, truncated to 32 chars.
pub fn visitor_id(ip: &str, user_agent: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(ip.as_bytes());
    hasher.update(b":");
    hasher.update(user_agent.as_bytes());
    let digest = format!("{:x}", hasher.finalize());
    digest[..32].to_string()
}

/// Resolve the client IP from `x-forwarded-for`, taking only the first
/// comma-segment when a proxy chain is present.
pub fn client_ip(headers: &HeaderMap) -> String {
    headers
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .unwrap_or_else(|| FALLBACK_IP.to_string())
}

/// Fresh opaque session id: 16 random bytes, hex-encoded.
pub fn new_session_id() -> String {
    let mut bytes = [0u8; 16];
    rand::thread_rng().fill_bytes(&mut bytes);
    bytes.iter().map(|b| format!("{b:02x}")).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn test_visitor_id_deterministic() {
        let a = visitor_id("1.2.3.4", "Mozilla/5.0 Chrome/120");
        let b = visitor_id("1.2.3.4", "Mozilla/5.0 Chrome/120");
        assert_eq!(a, b);
        assert_eq!(a.len(), 32);
        assert!(a.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn test_visitor_id_varies_with_input() {
        let base = visitor_id("1.2.3.4", "Mozilla/5.0 Chrome/120");
        assert_ne!(base, visitor_id("5.6.7.8", "Mozilla/5.0 Chrome/120"));
        assert_ne!(base, visitor_id("1.2.3.4", "Mozilla/5.0 Firefox/121"));
    }

    #[test]
    fn test_client_ip_takes_first_forwarded_segment() {
        let mut headers = HeaderMap::new();
        headers.insert(
            "x-forwarded-for",
            HeaderValue::from_static("203.0.113.7, 10.0.0.1, 172.16.0.2"),
        );
        assert_eq!(client_ip(&headers), "203.0.113.7");
    }

    #[test]
    fn test_client_ip_falls_back_to_loopback() {
        assert_eq!(client_ip(&HeaderMap::new()), FALLBACK_IP);
    }

    #[test]
    fn test_session_ids_are_unique_hex() {
        let a = new_session_id();
        let b = new_session_id();
        assert_eq!(a.len(), 32);
        assert_ne!(a, b);
    }
}
