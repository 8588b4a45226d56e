use clap::Parser;
use sitescribe::config::{CrawlConfig, LoginConfig};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "sitescribe")]
#[command(
    about = "Crawl a website (incl. SPAs) and save screenshots, HTML, and text for LLM ingestion"
)]
#[command(version)]
pub struct Args {
    /// Starting URL (e.g. https://example.com)
    pub start_url: String,

    /// Output directory
    #[arg(short, long, default_value = "site_dump")]
    pub outdir: PathBuf,

    /// Max pages to crawl
    #[arg(short = 'n', long, default_value_t = 200)]
    pub max_pages: usize,

    /// Allow leaving the start domain
    #[arg(long)]
    pub all_domains: bool,

    /// Delay between pages in seconds
    #[arg(long, default_value_t = 0.5)]
    pub delay: f64,

    /// Regex to include only URLs that match (applied to absolute URLs)
    #[arg(long)]
    pub include: Option<String>,

    /// Regex to exclude URLs that match (applied to absolute URLs)
    #[arg(long)]
    pub exclude: Option<String>,

    /// DOM idle threshold in ms for SPA settling
    #[arg(long, default_value_t = 2000)]
    pub quiet_ms: u64,

    /// CSS selector that must appear before capture (e.g. app root or page hero)
    #[arg(long)]
    pub ready_selector: Option<String>,

    /// Seed crawl with additional routes (one per line, absolute or relative to start URL)
    #[arg(long)]
    pub routes_file: Option<PathBuf>,

    /// Seed crawl with URLs from a sitemap.xml (absolute URL)
    #[arg(long)]
    pub sitemap: Option<String>,

    /// Attribute carrying SPA route targets on div elements
    #[arg(long, default_value = "pageroute")]
    pub route_attribute: String,

    /// Login page URL (enables the login flow)
    #[arg(long)]
    pub login_url: Option<String>,

    /// Env var for username/email
    #[arg(long, default_value = "CRAWL_USER")]
    pub user_env: String,

    /// Env var for password
    #[arg(long, default_value = "CRAWL_PASS")]
    pub pass_env: String,

    /// CSS selector for the email/username field
    #[arg(long, default_value = r#"input[type="email"]"#)]
    pub user_selector: String,

    /// CSS selector for the password field
    #[arg(long, default_value = r#"input[type="password"]"#)]
    pub pass_selector: String,

    /// CSS selector for the submit button
    #[arg(long, default_value = r#"button[type="submit"]"#)]
    pub submit_selector: String,

    /// URL or pattern expected after a successful login
    #[arg(long)]
    pub post_login_url: Option<String>,

    /// Path to save/reuse browser session state
    #[arg(long)]
    pub storage_state: Option<PathBuf>,

    /// Convert fixed/sticky headers/footers to static before capture
    #[arg(long)]
    pub unfix_fixed: bool,

    /// Comma-separated CSS selectors to hide (e.g. .cookie, .chat-widget)
    #[arg(long)]
    pub hide_selectors: Option<String>,

    /// Expand overflowed scroll containers to reveal hidden content
    #[arg(long)]
    pub expand_scrollables: bool,

    /// WebDriver server URL (defaults to the WEBDRIVER_URL env var, then
    /// http://localhost:4444)
    #[arg(long)]
    pub webdriver_url: Option<String>,
}

impl Args {
    /// Builds the crawl configuration from the parsed arguments.
    pub fn into_config(self) -> CrawlConfig {
        let mut config = CrawlConfig::new(&self.start_url);
        config.outdir = self.outdir;
        config.max_pages = self.max_pages;
        config.domain_restricted = !self.all_domains;
        config.delay_secs = self.delay;
        config.include = self.include;
        config.exclude = self.exclude;
        config.quiet_ms = self.quiet_ms;
        config.ready_selector = self.ready_selector;
        config.routes_file = self.routes_file;
        config.sitemap = self.sitemap;
        config.route_attribute = self.route_attribute;
        config.session_state = self.storage_state;
        config.hide_selectors = self.hide_selectors;
        config.unfix_fixed = self.unfix_fixed;
        config.expand_scrollables = self.expand_scrollables;

        if let Some(url) = self
            .webdriver_url
            .or_else(|| std::env::var("WEBDRIVER_URL").ok().filter(|s| !s.is_empty()))
        {
            config.webdriver_url = url;
        }

        if let Some(login_url) = self.login_url {
            config.login = Some(LoginConfig {
                login_url,
                user_env: self.user_env,
                pass_env: self.pass_env,
                user_selector: self.user_selector,
                pass_selector: self.pass_selector,
                submit_selector: self.submit_selector,
                post_login_url: self.post_login_url,
            });
        }

        config
    }
}
