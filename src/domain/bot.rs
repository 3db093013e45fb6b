//! Bot traffic filter
//!
//! Classification happens before any state mutation: bot requests get a
//! benign success response and never touch the tracking tables.

/// Known crawler, unfurler, and automation signatures. Any single
/// case-insensitive substring match classifies the request as a bot.
const BOT_SIGNATURES: &[&str] = &[
    // generic tokens
    "bot",
    "spider",
    "crawler",
    "scraper",
    // search engines
    "googlebot",
    "bingbot",
    "yandex",
    "duckduckbot",
    "baiduspider",
    "applebot",
    // social link unfurlers
    "facebookexternalhit",
    "twitterbot",
    "linkedinbot",
    "whatsapp",
    "telegrambot",
    "slackbot",
    "discordbot",
    "pinterest",
    // SEO crawlers
    "ahrefsbot",
    "semrushbot",
    "mj12bot",
    "dotbot",
    "petalbot",
    "screaming frog",
    // headless browsers and automation tooling
    "headlesschrome",
    "phantomjs",
    "puppeteer",
    "playwright",
    "selenium",
    "python-requests",
    "python-urllib",
    "go-http-client",
    "curl",
    "wget",
    "scrapy",
    // monitoring
    "lighthouse",
    "pingdom",
    "uptimerobot",
    "gtmetrix",
];

pub fn is_bot(user_agent: &str) -> bool {
    let ua = user_agent.to_lowercase();
    BOT_SIGNATURES.iter().any(|sig| ua.contains(sig))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_crawlers_detected() {
        assert!(is_bot("Mozilla/5.0 (compatible; Googlebot/2.1; +http://www.google.com/bot.html)"));
        assert!(is_bot("facebookexternalhit/1.1"));
        assert!(is_bot("curl/8.4.0"));
        assert!(is_bot("Mozilla/5.0 (X11; Linux x86_64) HeadlessChrome/120.0.0.0"));
    }

    #[test]
    fn test_match_is_case_insensitive() {
        assert!(is_bot("GOOGLEBOT/2.1"));
        assert!(is_bot("My Custom BOT v1"));
    }

    #[test]
    fn test_regular_browsers_pass() {
        assert!(!is_bot(
            "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36"
        ));
        assert!(!is_bot("Mozilla/5.0 (iPhone; CPU iPhone OS 17_0 like Mac OS X) AppleWebKit/605.1.15"));
        assert!(!is_bot(""));
    }
}
