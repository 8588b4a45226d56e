use crate::browser;
use crate::config::LoginConfig;
use crate::error::CrawlError;
use fantoccini::cookies::Cookie;
use fantoccini::error::CmdError;
use fantoccini::{Client, Locator};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use tokio::time::timeout;

const LOGIN_NAV_TIMEOUT: Duration = Duration::from_secs(45);
const POST_LOGIN_TIMEOUT: Duration = Duration::from_secs(20);
const URL_POLL: Duration = Duration::from_millis(500);

const LOCAL_STORAGE_DUMP: &str = "return Object.entries(window.localStorage);";

const LOCAL_STORAGE_RESTORE: &str = r#"
for (const [key, value] of arguments[0]) {
    window.localStorage.setItem(key, value);
}
"#;

/// Login credentials, resolved from the environment at startup and held only
/// for the duration of the login flow. Never persisted.
#[derive(Debug)]
pub struct Credentials {
    user: String,
    pass: String,
}

impl Credentials {
    /// Resolves the configured environment variables.
    ///
    /// An unset or empty variable is a fatal configuration error; the run
    /// must abort before any navigation or output is produced.
    pub fn from_env(config: &LoginConfig) -> Result<Self, CrawlError> {
        let user = std::env::var(&config.user_env).unwrap_or_default();
        let pass = std::env::var(&config.pass_env).unwrap_or_default();
        if user.is_empty() || pass.is_empty() {
            return Err(CrawlError::MissingCredentials {
                user_var: config.user_env.clone(),
                pass_var: config.pass_env.clone(),
            });
        }
        Ok(Self { user, pass })
    }
}

/// Persisted browser-session material: cookies plus the current origin's
/// `localStorage`. Enough for a later run to start already logged in.
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct SessionState {
    pub cookies: Vec<StoredCookie>,
    #[serde(default)]
    pub local_storage: Vec<(String, String)>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredCookie {
    pub name: String,
    pub value: String,
    pub domain: Option<String>,
    pub path: Option<String>,
    #[serde(default)]
    pub secure: bool,
    #[serde(default)]
    pub http_only: bool,
}

impl SessionState {
    /// Snapshots the live session. The localStorage dump is best-effort;
    /// cookie retrieval failures fail the snapshot.
    pub async fn snapshot(client: &Client) -> Result<Self, CmdError> {
        let cookies = client
            .get_all_cookies()
            .await?
            .iter()
            .map(|c| StoredCookie {
                name: c.name().to_string(),
                value: c.value().to_string(),
                domain: c.domain().map(str::to_string),
                path: c.path().map(str::to_string),
                secure: c.secure().unwrap_or(false),
                http_only: c.http_only().unwrap_or(false),
            })
            .collect();

        let local_storage = match client.execute(LOCAL_STORAGE_DUMP, vec![]).await {
            Ok(value) => serde_json::from_value(value).unwrap_or_default(),
            Err(e) => {
                ::log::debug!("localStorage snapshot failed: {}", e);
                Vec::new()
            }
        };

        Ok(Self {
            cookies,
            local_storage,
        })
    }

    /// Re-applies the snapshot to a live session. The browser must already
    /// be on the target origin for the cookies to attach. Expirations are
    /// not restored; restored cookies live as session cookies.
    pub async fn restore(&self, client: &Client) {
        for stored in &self.cookies {
            let mut cookie = Cookie::new(stored.name.clone(), stored.value.clone());
            if let Some(domain) = &stored.domain {
                cookie.set_domain(domain.clone());
            }
            if let Some(path) = &stored.path {
                cookie.set_path(path.clone());
            }
            cookie.set_secure(stored.secure);
            cookie.set_http_only(stored.http_only);
            if let Err(e) = client.add_cookie(cookie).await {
                ::log::debug!("Could not restore cookie '{}': {}", stored.name, e);
            }
        }

        if !self.local_storage.is_empty() {
            let entries = serde_json::json!(self.local_storage);
            if let Err(e) = client.execute(LOCAL_STORAGE_RESTORE, vec![entries]).await {
                ::log::debug!("localStorage restore failed: {}", e);
            }
        }
    }

    pub fn save(&self, path: &Path) -> Result<(), CrawlError> {
        std::fs::write(path, serde_json::to_string_pretty(self)?)?;
        Ok(())
    }

    pub fn load(path: &Path) -> Result<Self, CrawlError> {
        Ok(serde_json::from_str(&std::fs::read_to_string(path)?)?)
    }
}

/// Performs the authenticated login flow once, in its own tab.
///
/// Credentials were already resolved; everything past that point is
/// best-effort. A failed or unconfirmed login is logged and the crawl
/// proceeds with whatever session state resulted. The tab is closed on
/// every exit path.
pub async fn login(
    client: &Client,
    config: &LoginConfig,
    credentials: &Credentials,
    ready_selector: Option<&str>,
    persist_path: Option<&Path>,
) {
    ::log::info!("Performing login at {}", config.login_url);

    let tab = match browser::open_tab(client).await {
        Ok(tab) => tab,
        Err(e) => {
            ::log::warn!("Could not open a tab for login: {}", e);
            return;
        }
    };

    let outcome = run_login_flow(client, config, credentials, ready_selector, persist_path).await;
    tab.close(client).await;

    if let Err(e) = outcome {
        ::log::warn!(
            "Login flow did not complete ({}); continuing with current session state",
            e
        );
    }
}

async fn run_login_flow(
    client: &Client,
    config: &LoginConfig,
    credentials: &Credentials,
    ready_selector: Option<&str>,
    persist_path: Option<&Path>,
) -> Result<(), CmdError> {
    timeout(LOGIN_NAV_TIMEOUT, client.goto(&config.login_url))
        .await
        .map_err(|_| CmdError::WaitTimeout)??;

    client
        .find(Locator::Css(&config.user_selector))
        .await?
        .send_keys(&credentials.user)
        .await?;
    client
        .find(Locator::Css(&config.pass_selector))
        .await?
        .send_keys(&credentials.pass)
        .await?;
    client
        .find(Locator::Css(&config.submit_selector))
        .await?
        .click()
        .await?;

    ::log::info!("Submitted login form, waiting for post-login state...");

    if let Some(pattern) = &config.post_login_url {
        if wait_for_url_match(client, pattern).await {
            ::log::info!("User logged in");
        } else {
            ::log::warn!("Could not confirm post-login URL '{}'", pattern);
        }
    }

    if let Some(selector) = ready_selector {
        let found = client
            .wait()
            .at_most(POST_LOGIN_TIMEOUT)
            .for_element(Locator::Css(selector))
            .await;
        if found.is_err() {
            ::log::warn!("Post-login selector '{}' did not appear", selector);
        }
    }

    if let Some(path) = persist_path {
        match SessionState::snapshot(client).await {
            Ok(state) => match state.save(path) {
                Ok(()) => ::log::info!("Session state saved to {}", path.display()),
                Err(e) => ::log::warn!("Could not save session state: {}", e),
            },
            Err(e) => ::log::warn!("Could not snapshot session state: {}", e),
        }
    }

    Ok(())
}

/// Polls the current URL until it matches `pattern` (regex when valid,
/// substring otherwise) or the post-login timeout elapses.
async fn wait_for_url_match(client: &Client, pattern: &str) -> bool {
    let regex = Regex::new(pattern).ok();
    let deadline = tokio::time::Instant::now() + POST_LOGIN_TIMEOUT;
    loop {
        if let Ok(current) = client.current_url().await {
            let current = current.as_str();
            let matched = match &regex {
                Some(re) => re.is_match(current),
                None => current.contains(pattern),
            };
            if matched {
                return true;
            }
        }
        if tokio::time::Instant::now() >= deadline {
            return false;
        }
        tokio::time::sleep(URL_POLL).await;
    }
}
