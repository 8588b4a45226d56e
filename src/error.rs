use std::path::PathBuf;

/// Errors surfaced by the crawler.
///
/// Only configuration-time failures abort a run. Anything that happens once
/// the crawl loop has started is caught at the page-task boundary, logged
/// with the offending URL, and contained to that task.
#[derive(Debug, thiserror::Error)]
pub enum CrawlError {
    /// Login was requested but the credential environment variables are
    /// unset or empty.
    #[error("missing credentials: ensure env vars {user_var} and {pass_var} are set")]
    MissingCredentials { user_var: String, pass_var: String },

    /// The start URL could not be parsed.
    #[error("invalid start URL '{url}': {source}")]
    InvalidStartUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },

    /// An include/exclude pattern failed to compile.
    #[error("invalid filter pattern: {0}")]
    InvalidPattern(#[from] regex::Error),

    /// Could not read or parse a JSON configuration file.
    #[error("failed to load config {path}: {message}")]
    Config { path: PathBuf, message: String },

    /// No WebDriver server answered at the configured URL.
    #[error("failed to connect to WebDriver at {url}: {source}")]
    WebdriverConnect {
        url: String,
        #[source]
        source: fantoccini::error::NewSessionError,
    },

    /// A WebDriver command failed.
    #[error("webdriver command failed: {0}")]
    Webdriver(#[from] fantoccini::error::CmdError),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("csv write failed: {0}")]
    Csv(#[from] csv::Error),

    #[error("json encode failed: {0}")]
    Json(#[from] serde_json::Error),
}
