use url::Url;

/// Resolves a link href to an absolute URL and validates it
///
/// Returns None if the link should be excluded:
/// - javascript:, mailto:, tel: schemes
/// - data: URIs
/// - Fragment-only links (same page anchors)
/// - Invalid URLs
/// - Non-HTTP(S) URLs after resolution
///
/// # Examples
///
/// ```
/// use scrapesmart::url::resolve_link;
/// use url::Url;
///
/// let base = Url::parse("https://example.com/docs/page").unwrap();
/// assert_eq!(resolve_link("/other", &base).as_deref(), Some("https://example.com/other"));
/// assert_eq!(resolve_link("mailto:a@b.c", &base), None);
/// ```
pub fn resolve_link(href: &str, base_url: &Url) -> Option<String> {
    let href = href.trim();

    if href.is_empty() || href.starts_with('#') {
        return None;
    }

    if has_excluded_scheme(href) {
        return None;
    }

    let absolute_url = base_url.join(href).ok()?;
    if is_http(&absolute_url) {
        Some(absolute_url.to_string())
    } else {
        None
    }
}

/// Resolves an `<img src>` value against the page URL
///
/// Protocol-relative sources (`//cdn.example.com/a.png`) are pinned to https;
/// everything else goes through normal URL joining. Inline `data:` images are
/// skipped since there is nothing to download.
pub fn resolve_image_src(src: &str, base_url: &Url) -> Option<String> {
    let src = src.trim();

    if src.is_empty() || src.starts_with("data:") {
        return None;
    }

    let resolved = if src.starts_with("//") {
        Url::parse(&format!("https:{}", src)).ok()?
    } else {
        base_url.join(src).ok()?
    };

    if is_http(&resolved) {
        Some(resolved.to_string())
    } else {
        None
    }
}

fn has_excluded_scheme(href: &str) -> bool {
    let lower = href.to_ascii_lowercase();
    ["javascript:", "mailto:", "tel:", "data:"]
        .iter()
        .any(|scheme| lower.starts_with(scheme))
}

fn is_http(url: &Url) -> bool {
    url.scheme() == "http" || url.scheme() == "https"
}
