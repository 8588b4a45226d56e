use crate::urls;
use regex::Regex;
use url::Url;

/// Scope rules applied to every candidate URL, at seed time and at
/// discovery time alike. Immutable for the duration of a crawl.
#[derive(Debug)]
pub struct ScopeFilter {
    domain_restricted: bool,
    include: Option<Regex>,
    exclude: Option<Regex>,
}

impl ScopeFilter {
    /// Compile the filter from the configured patterns.
    pub fn new(
        domain_restricted: bool,
        include: Option<&str>,
        exclude: Option<&str>,
    ) -> Result<Self, regex::Error> {
        Ok(Self {
            domain_restricted,
            include: include.map(Regex::new).transpose()?,
            exclude: exclude.map(Regex::new).transpose()?,
        })
    }

    /// Whether a URL may enter the crawl.
    ///
    /// Domain restriction checks exact host equality against `root`; the
    /// include regex (when set) must match and the exclude regex (when set)
    /// must not.
    pub fn admits(&self, url: &Url, root: &Url) -> bool {
        if self.domain_restricted && !urls::same_host(url, root) {
            return false;
        }

        let url_str = url.as_str();
        if let Some(inc) = &self.include {
            if !inc.is_match(url_str) {
                return false;
            }
        }
        if let Some(exc) = &self.exclude {
            if exc.is_match(url_str) {
                return false;
            }
        }

        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn root() -> Url {
        Url::parse("https://example.com/").unwrap()
    }

    #[test]
    fn test_domain_restriction() {
        let filter = ScopeFilter::new(true, None, None).unwrap();

        let inside = Url::parse("https://example.com/page").unwrap();
        assert!(filter.admits(&inside, &root()));

        let outside = Url::parse("https://other.com/page").unwrap();
        assert!(!filter.admits(&outside, &root()));

        let subdomain = Url::parse("https://docs.example.com/page").unwrap();
        assert!(!filter.admits(&subdomain, &root()));
    }

    #[test]
    fn test_domain_restriction_disabled() {
        let filter = ScopeFilter::new(false, None, None).unwrap();

        let outside = Url::parse("https://other.com/page").unwrap();
        assert!(filter.admits(&outside, &root()));
    }

    #[test]
    fn test_include_pattern() {
        let filter = ScopeFilter::new(true, Some("/docs/"), None).unwrap();

        let docs = Url::parse("https://example.com/docs/a").unwrap();
        assert!(filter.admits(&docs, &root()));

        let blog = Url::parse("https://example.com/blog/b").unwrap();
        assert!(!filter.admits(&blog, &root()));
    }

    #[test]
    fn test_exclude_pattern() {
        let filter = ScopeFilter::new(true, None, Some(r"\.pdf$")).unwrap();

        let page = Url::parse("https://example.com/docs/a").unwrap();
        assert!(filter.admits(&page, &root()));

        let pdf = Url::parse("https://example.com/docs/manual.pdf").unwrap();
        assert!(!filter.admits(&pdf, &root()));
    }

    #[test]
    fn test_exclude_wins_over_include() {
        let filter = ScopeFilter::new(true, Some("/docs/"), Some("/docs/draft/")).unwrap();

        let published = Url::parse("https://example.com/docs/a").unwrap();
        assert!(filter.admits(&published, &root()));

        let draft = Url::parse("https://example.com/docs/draft/a").unwrap();
        assert!(!filter.admits(&draft, &root()));
    }

    #[test]
    fn test_invalid_pattern_is_an_error() {
        assert!(ScopeFilter::new(true, Some("("), None).is_err());
    }
}
