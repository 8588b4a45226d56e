use crate::urls;
use regex::Regex;
use std::path::Path;
use std::time::Duration;
use url::Url;

const SITEMAP_FETCH_TIMEOUT: Duration = Duration::from_secs(30);

/// Reads extra seed routes from a file, one URL or path per line.
///
/// Lines are normalized against the start URL; blank lines and lines that
/// fail normalization are dropped. A missing or unreadable file contributes
/// nothing and is logged.
pub fn load_routes(path: &Path, start: &Url) -> Vec<Url> {
    let contents = match std::fs::read_to_string(path) {
        Ok(contents) => contents,
        Err(e) => {
            ::log::warn!("Could not read routes file {}: {}", path.display(), e);
            return Vec::new();
        }
    };

    contents
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .filter_map(|line| urls::normalize(start, line))
        .collect()
}

/// Fetches a sitemap.xml and returns its `<loc>` entries.
///
/// Any failure (network, non-200 status) is logged to the error stream and
/// yields an empty seed set; the crawl proceeds without sitemap seeds.
pub async fn fetch_sitemap(sitemap_url: &str) -> Vec<String> {
    let client = match reqwest::Client::builder()
        .timeout(SITEMAP_FETCH_TIMEOUT)
        .build()
    {
        Ok(client) => client,
        Err(e) => {
            ::log::error!("Failed to build sitemap HTTP client: {}", e);
            return Vec::new();
        }
    };

    let response = match client.get(sitemap_url).send().await {
        Ok(response) => response,
        Err(e) => {
            ::log::error!("Failed to load sitemap {}: {}", sitemap_url, e);
            return Vec::new();
        }
    };

    if !response.status().is_success() {
        ::log::error!(
            "Sitemap {} returned status {}",
            sitemap_url,
            response.status()
        );
        return Vec::new();
    }

    match response.text().await {
        Ok(xml) => parse_sitemap_locs(&xml),
        Err(e) => {
            ::log::error!("Failed to read sitemap body {}: {}", sitemap_url, e);
            Vec::new()
        }
    }
}

/// Extracts `<loc>` entry values from sitemap XML by pattern match.
pub fn parse_sitemap_locs(xml: &str) -> Vec<String> {
    // A full XML parser buys nothing here; sitemaps are flat <loc> lists.
    let loc = Regex::new(r"<loc>\s*([^<]+?)\s*</loc>").expect("loc pattern is valid");
    loc.captures_iter(xml)
        .map(|c| c[1].to_string())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_parse_sitemap_locs() {
        let xml = r#"<?xml version="1.0"?>
            <urlset>
              <url><loc>https://example.com/</loc></url>
              <url><loc>  https://example.com/docs/a  </loc></url>
              <url><lastmod>2024-01-01</lastmod></url>
            </urlset>"#;
        let locs = parse_sitemap_locs(xml);
        assert_eq!(
            locs,
            vec!["https://example.com/", "https://example.com/docs/a"]
        );
    }

    #[test]
    fn test_parse_sitemap_locs_empty() {
        assert!(parse_sitemap_locs("<urlset></urlset>").is_empty());
        assert!(parse_sitemap_locs("not xml at all").is_empty());
    }

    #[test]
    fn test_load_routes_normalizes_against_start() {
        let start = Url::parse("https://example.com/").unwrap();
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "/admin/settings").unwrap();
        writeln!(file).unwrap();
        writeln!(file, "https://example.com/reports").unwrap();
        writeln!(file, "javascript:void(0)").unwrap();

        let routes = load_routes(file.path(), &start);
        assert_eq!(routes.len(), 2);
        assert_eq!(routes[0].as_str(), "https://example.com/admin/settings");
        assert_eq!(routes[1].as_str(), "https://example.com/reports");
    }

    #[test]
    fn test_load_routes_missing_file_is_empty() {
        let start = Url::parse("https://example.com/").unwrap();
        let routes = load_routes(Path::new("/nonexistent/routes.txt"), &start);
        assert!(routes.is_empty());
    }
}
