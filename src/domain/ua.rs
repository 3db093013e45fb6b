//! Coarse user-agent classification
//!
//! Ordered substring matching only; no version parsing. Browser order
//! matters because Chromium UAs also carry "safari" and Edge UAs carry
//! "chrome"; first match in priority order wins.

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UaProfile {
    pub device: &'static str,
    pub browser: &'static str,
    pub os: &'static str,
}

const TABLET_TOKENS: &[&str] = &["ipad", "tablet", "kindle", "silk"];
const MOBILE_TOKENS: &[&str] = &[
    "mobile",
    "android",
    "iphone",
    "ipod",
    "windows phone",
    "blackberry",
    "opera mini",
];

pub fn classify(user_agent: &str) -> UaProfile {
    let ua = user_agent.to_lowercase();

    // Tablet takes precedence: iPad UAs also match generic mobile tokens.
    let device = if TABLET_TOKENS.iter().any(|t| ua.contains(t)) {
        "tablet"
    } else if MOBILE_TOKENS.iter().any(|t| ua.contains(t)) {
        "mobile"
    } else {
        "desktop"
    };

    let browser = if ua.contains("firefox") {
        "Firefox"
    } else if ua.contains("edg") {
        "Edge"
    } else if ua.contains("chrome") {
        "Chrome"
    } else if ua.contains("safari") {
        "Safari"
    } else if ua.contains("opera") || ua.contains("opr/") {
        "Opera"
    } else {
        "Unknown"
    };

    let os = if ua.contains("windows") {
        "Windows"
    } else if ua.contains("mac os") || ua.contains("macintosh") {
        "macOS"
    } else if ua.contains("linux") {
        "Linux"
    } else if ua.contains("android") {
        "Android"
    } else if ua.contains("iphone") || ua.contains("ipad") || ua.contains("ios") {
        "iOS"
    } else {
        "Unknown"
    };

    UaProfile { device, browser, os }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CHROME_WIN: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";
    const SAFARI_IPHONE: &str = "Mozilla/5.0 (iPhone; CPU iPhone OS 17_0 like Mac OS X) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/17.0 Mobile/15E148 Safari/604.1";
    const EDGE_WIN: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36 Edg/120.0.0.0";

    #[test]
    fn test_desktop_chrome_windows() {
        let p = classify(CHROME_WIN);
        assert_eq!(p, UaProfile { device: "desktop", browser: "Chrome", os: "Windows" });
    }

    #[test]
    fn test_iphone_is_mobile_safari() {
        let p = classify(SAFARI_IPHONE);
        assert_eq!(p.device, "mobile");
        assert_eq!(p.browser, "Safari");
    }

    #[test]
    fn test_ipad_takes_tablet_precedence() {
        let p = classify("Mozilla/5.0 (iPad; CPU OS 17_0 like Mac OS X) AppleWebKit/605.1.15 Mobile/15E148 Safari/604.1");
        assert_eq!(p.device, "tablet");
    }

    #[test]
    fn test_edge_wins_over_chrome_token() {
        assert_eq!(classify(EDGE_WIN).browser, "Edge");
    }

    #[test]
    fn test_deterministic() {
        assert_eq!(classify(CHROME_WIN), classify(CHROME_WIN));
    }

    #[test]
    fn test_unknown_defaults() {
        let p = classify("SomethingElse/1.0");
        assert_eq!(p, UaProfile { device: "desktop", browser: "Unknown", os: "Unknown" });
    }
}
