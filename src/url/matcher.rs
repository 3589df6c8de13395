/// Markup fragments served by bot-challenge interstitials instead of the real page
pub const CHALLENGE_BODY_MARKERS: &[&str] = &[
    "cf-chl-",
    "challenge-platform",
    "<title>Just a moment...</title>",
];

/// Checks if a URL carries one of the configured protection markers
///
/// Matching is a case-insensitive substring test against the whole URL, so a
/// marker such as `cloudflare` catches both `https://cloudflare.com/...` and
/// `https://example.com/cdn-cgi/cloudflare-challenge`.
///
/// # Arguments
///
/// * `url` - The URL about to be fetched
/// * `markers` - Marker substrings from the fetcher configuration
///
/// # Returns
///
/// The first marker found in the URL, if any
///
/// # Examples
///
/// ```
/// use scrapesmart::url::matches_challenge_marker;
///
/// let markers = vec!["cloudflare".to_string()];
/// assert_eq!(
///     matches_challenge_marker("https://www.CloudFlare.com/x", &markers),
///     Some("cloudflare")
/// );
/// assert_eq!(matches_challenge_marker("https://example.com/", &markers), None);
/// ```
pub fn matches_challenge_marker<'a>(url: &str, markers: &'a [String]) -> Option<&'a str> {
    let lower = url.to_ascii_lowercase();
    markers
        .iter()
        .find(|marker| lower.contains(&marker.to_ascii_lowercase()))
        .map(String::as_str)
}

/// Checks if fetched markup is a bot-challenge interstitial
pub fn is_challenge_page(markup: &str) -> bool {
    CHALLENGE_BODY_MARKERS
        .iter()
        .any(|marker| markup.contains(marker))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn markers() -> Vec<String> {
        vec!["cloudflare".to_string(), "captcha".to_string()]
    }

    #[test]
    fn test_marker_in_host() {
        assert_eq!(
            matches_challenge_marker("https://cloudflare.com/", &markers()),
            Some("cloudflare")
        );
    }

    #[test]
    fn test_marker_in_path() {
        assert_eq!(
            matches_challenge_marker("https://example.com/captcha?next=/", &markers()),
            Some("captcha")
        );
    }

    #[test]
    fn test_marker_case_insensitive() {
        assert!(matches_challenge_marker("https://EXAMPLE.com/CloudFlare", &markers()).is_some());
    }

    #[test]
    fn test_no_marker() {
        assert_eq!(matches_challenge_marker("https://example.com/page", &markers()), None);
        assert_eq!(matches_challenge_marker("https://example.com/", &[]), None);
    }

    #[test]
    fn test_challenge_page_detection() {
        assert!(is_challenge_page(
            r#"<html><head><title>Just a moment...</title></head></html>"#
        ));
        assert!(is_challenge_page(r#"<script src="/cdn-cgi/challenge-platform/h/b"></script>"#));
        assert!(!is_challenge_page("<html><body>Regular page</body></html>"));
    }
}
