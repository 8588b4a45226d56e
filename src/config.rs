use crate::error::CrawlError;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};

/// Configuration for a crawl run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CrawlConfig {
    /// URL to start crawling from
    pub start_url: String,

    /// Directory that receives the ledger files and per-page artifacts
    #[serde(default = "default_outdir")]
    pub outdir: PathBuf,

    /// Stop after this many pages have been recorded
    #[serde(default = "default_max_pages")]
    pub max_pages: usize,

    /// Restrict the crawl to the start URL's host
    #[serde(default = "default_domain_restricted")]
    pub domain_restricted: bool,

    /// Delay between pages, in seconds
    #[serde(default = "default_delay")]
    pub delay_secs: f64,

    /// Regex a URL must match to be crawled
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub include: Option<String>,

    /// Regex that drops a URL from the crawl
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exclude: Option<String>,

    /// DOM idle threshold in milliseconds for SPA settling
    #[serde(default = "default_quiet_ms")]
    pub quiet_ms: u64,

    /// CSS selector that must appear before capture
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ready_selector: Option<String>,

    /// Extra seed routes, one per line, absolute or relative to the start URL
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub routes_file: Option<PathBuf>,

    /// Seed the crawl from a sitemap.xml at this URL
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sitemap: Option<String>,

    /// Attribute carrying SPA route targets on `div` elements
    #[serde(default = "default_route_attribute")]
    pub route_attribute: String,

    /// Login flow; when absent the crawl starts unauthenticated
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub login: Option<LoginConfig>,

    /// Path for persisting/reusing the browser session state
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session_state: Option<PathBuf>,

    /// Comma-separated CSS selectors hidden before capture
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hide_selectors: Option<String>,

    /// Convert fixed/sticky elements to static before capture
    #[serde(default)]
    pub unfix_fixed: bool,

    /// Expand overflowed scroll containers before capture
    #[serde(default)]
    pub expand_scrollables: bool,

    /// URL of the WebDriver instance
    #[serde(default = "default_webdriver_url")]
    pub webdriver_url: String,
}

/// Authenticated-session bootstrap settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginConfig {
    /// Login page URL
    pub login_url: String,

    /// Environment variable holding the username/email
    pub user_env: String,

    /// Environment variable holding the password
    pub pass_env: String,

    /// CSS selector for the username field
    #[serde(default = "default_user_selector")]
    pub user_selector: String,

    /// CSS selector for the password field
    #[serde(default = "default_pass_selector")]
    pub pass_selector: String,

    /// CSS selector for the submit control
    #[serde(default = "default_submit_selector")]
    pub submit_selector: String,

    /// URL substring expected after a successful login
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub post_login_url: Option<String>,
}

impl CrawlConfig {
    /// Create a configuration with default values for everything but the
    /// start URL
    pub fn new(start_url: &str) -> Self {
        Self {
            start_url: start_url.to_string(),
            outdir: default_outdir(),
            max_pages: default_max_pages(),
            domain_restricted: default_domain_restricted(),
            delay_secs: default_delay(),
            include: None,
            exclude: None,
            quiet_ms: default_quiet_ms(),
            ready_selector: None,
            routes_file: None,
            sitemap: None,
            route_attribute: default_route_attribute(),
            login: None,
            session_state: None,
            hide_selectors: None,
            unfix_fixed: false,
            expand_scrollables: false,
            webdriver_url: default_webdriver_url(),
        }
    }

    /// Load a configuration from a JSON file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, CrawlError> {
        let path = path.as_ref();
        let mut contents = String::new();
        File::open(path)
            .and_then(|mut f| f.read_to_string(&mut contents))
            .map_err(|e| CrawlError::Config {
                path: path.to_path_buf(),
                message: e.to_string(),
            })?;

        serde_json::from_str(&contents).map_err(|e| CrawlError::Config {
            path: path.to_path_buf(),
            message: e.to_string(),
        })
    }

    /// The hide-selector list, split and trimmed
    pub fn hide_selector_list(&self) -> Vec<String> {
        self.hide_selectors
            .as_deref()
            .unwrap_or("")
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect()
    }
}

fn default_outdir() -> PathBuf {
    PathBuf::from("site_dump")
}

fn default_max_pages() -> usize {
    200
}

fn default_domain_restricted() -> bool {
    true
}

fn default_delay() -> f64 {
    0.5
}

fn default_quiet_ms() -> u64 {
    2000
}

fn default_route_attribute() -> String {
    "pageroute".to_string()
}

fn default_webdriver_url() -> String {
    "http://localhost:4444".to_string()
}

fn default_user_selector() -> String {
    r#"input[type="email"]"#.to_string()
}

fn default_pass_selector() -> String {
    r#"input[type="password"]"#.to_string()
}

fn default_submit_selector() -> String {
    r#"button[type="submit"]"#.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_minimal_config_from_json() {
        let cfg: CrawlConfig =
            serde_json::from_str(r#"{"start_url": "https://example.com/"}"#).unwrap();
        assert_eq!(cfg.start_url, "https://example.com/");
        assert_eq!(cfg.max_pages, 200);
        assert!(cfg.domain_restricted);
        assert_eq!(cfg.quiet_ms, 2000);
        assert_eq!(cfg.route_attribute, "pageroute");
        assert!(cfg.login.is_none());
    }

    #[test]
    fn test_login_selector_defaults() {
        let cfg: LoginConfig = serde_json::from_str(
            r#"{"login_url": "https://example.com/login", "user_env": "U", "pass_env": "P"}"#,
        )
        .unwrap();
        assert_eq!(cfg.user_selector, r#"input[type="email"]"#);
        assert_eq!(cfg.pass_selector, r#"input[type="password"]"#);
        assert_eq!(cfg.submit_selector, r#"button[type="submit"]"#);
    }

    #[test]
    fn test_hide_selector_list_splits_and_trims() {
        let mut cfg = CrawlConfig::new("https://example.com/");
        cfg.hide_selectors = Some(" .cookie , .chat-widget ,, ".to_string());
        assert_eq!(cfg.hide_selector_list(), vec![".cookie", ".chat-widget"]);

        cfg.hide_selectors = None;
        assert!(cfg.hide_selector_list().is_empty());
    }
}
