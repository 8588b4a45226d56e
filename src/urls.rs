use url::Url;

/// Resolves `href` against `base` into an absolute, fragment-free URL.
///
/// Returns `None` for in-page anchors, `javascript:`/`mailto:`/`tel:` links,
/// non-http(s) schemes, and anything that fails to parse. Never panics.
pub fn normalize(base: &Url, href: &str) -> Option<Url> {
    let href = href.trim();
    if href.is_empty() {
        return None;
    }
    if href.starts_with('#')
        || href.starts_with("javascript:")
        || href.starts_with("mailto:")
        || href.starts_with("tel:")
    {
        return None;
    }

    let mut resolved = base.join(href).ok()?;
    resolved.set_fragment(None);

    match resolved.scheme() {
        "http" | "https" => Some(resolved),
        _ => None,
    }
}

/// Exact host (and port) equality between two URLs.
///
/// No subdomain folding: `docs.example.com` is not the same host as
/// `example.com`.
pub fn same_host(a: &Url, b: &Url) -> bool {
    a.host_str() == b.host_str() && a.port_or_known_default() == b.port_or_known_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base() -> Url {
        Url::parse("https://example.com/docs/").unwrap()
    }

    #[test]
    fn test_normalize_resolves_relative_hrefs() {
        let url = normalize(&base(), "guide/intro").unwrap();
        assert_eq!(url.as_str(), "https://example.com/docs/guide/intro");

        let url = normalize(&base(), "/about").unwrap();
        assert_eq!(url.as_str(), "https://example.com/about");

        let url = normalize(&base(), "https://other.com/page").unwrap();
        assert_eq!(url.as_str(), "https://other.com/page");
    }

    #[test]
    fn test_normalize_strips_fragments() {
        let url = normalize(&base(), "/page#section-2").unwrap();
        assert_eq!(url.as_str(), "https://example.com/page");
        assert!(url.fragment().is_none());
    }

    #[test]
    fn test_normalize_rejects_non_navigable_hrefs() {
        assert!(normalize(&base(), "#top").is_none());
        assert!(normalize(&base(), "javascript:void(0)").is_none());
        assert!(normalize(&base(), "mailto:a@b.com").is_none());
        assert!(normalize(&base(), "tel:+15551234").is_none());
        assert!(normalize(&base(), "ftp://example.com/file").is_none());
        assert!(normalize(&base(), "").is_none());
        assert!(normalize(&base(), "   ").is_none());
    }

    #[test]
    fn test_normalize_trims_whitespace() {
        let url = normalize(&base(), "  /page  ").unwrap();
        assert_eq!(url.as_str(), "https://example.com/page");
    }

    #[test]
    fn test_same_host_is_exact() {
        let root = Url::parse("https://example.com/").unwrap();
        let same = Url::parse("https://example.com/deep/page").unwrap();
        let sub = Url::parse("https://docs.example.com/").unwrap();
        let other = Url::parse("https://other.com/").unwrap();

        assert!(same_host(&root, &same));
        assert!(!same_host(&root, &sub));
        assert!(!same_host(&root, &other));
    }
}
