pub mod discover;
pub mod session;
pub mod settle;

use crate::error::CrawlError;
use fantoccini::error::CmdError;
use fantoccini::wd::WindowHandle;
use fantoccini::{Client, ClientBuilder};
use serde_json::json;

pub const VIEWPORT_WIDTH: u32 = 1600;
pub const VIEWPORT_HEIGHT: u32 = 1000;
const USER_AGENT: &str = "sitescribe/0.1 (+LLM ingestion)";

/// Screenshot windows taller than this are clamped; extremely long pages get
/// cut rather than producing gigapixel captures.
const MAX_CAPTURE_HEIGHT: u64 = 12000;

const STATUS_PROBE: &str = r#"
const nav = performance.getEntriesByType('navigation');
if (!nav.length) return null;
const s = nav[0].responseStatus;
return (typeof s === 'number' && s > 0) ? s : null;
"#;

const SCROLL_HEIGHT_PROBE: &str = r#"
return Math.max(document.body.scrollHeight, document.documentElement.scrollHeight);
"#;

// Incremental scroll to trigger lazy loads, then return to the top.
const SMART_SCROLL_SCRIPT: &str = r#"
const done = arguments[arguments.length - 1];
const step = 800;
const max = Math.max(document.body.scrollHeight, document.documentElement.scrollHeight);
let y = 0;
(function tick() {
    if (y >= max) { window.scrollTo(0, 0); done(); return; }
    window.scrollTo(0, y);
    y += step;
    setTimeout(tick, 150);
})();
"#;

const PREPARE_CAPTURE_SCRIPT: &str = r#"
const hide = arguments[0];
const unfix = arguments[1];
const expand = arguments[2];
for (const sel of hide) {
    try {
        document.querySelectorAll(sel).forEach(e => { e.style.display = 'none'; });
    } catch (e) {}
}
if (unfix || expand) {
    for (const el of document.querySelectorAll('*')) {
        const style = getComputedStyle(el);
        if (unfix && (style.position === 'fixed' || style.position === 'sticky')) {
            el.style.position = 'static';
        }
        if (expand && (style.overflowY === 'auto' || style.overflowY === 'scroll')
            && el.scrollHeight > el.clientHeight) {
            el.style.overflow = 'visible';
            el.style.maxHeight = 'none';
        }
    }
}
"#;

/// Connects to the WebDriver server, trying common fallback addresses before
/// giving up. A total connection failure is fatal to the run.
pub async fn connect(webdriver_url: &str) -> Result<Client, CrawlError> {
    let first_err = match try_connect(webdriver_url).await {
        Ok(client) => return Ok(client),
        Err(e) => {
            ::log::error!("Failed to connect to WebDriver at {}: {}", webdriver_url, e);
            e
        }
    };

    let fallback_urls = [
        "http://localhost:9515", // ChromeDriver default
        "http://127.0.0.1:4444", // IP instead of localhost
    ];
    for url in fallback_urls {
        if url == webdriver_url {
            continue;
        }
        ::log::info!("Trying fallback WebDriver URL: {}", url);
        if let Ok(client) = try_connect(url).await {
            return Ok(client);
        }
    }

    ::log::error!(
        "No WebDriver server reachable; start one or set the WEBDRIVER_URL environment variable"
    );
    Err(CrawlError::WebdriverConnect {
        url: webdriver_url.to_string(),
        source: first_err,
    })
}

async fn try_connect(url: &str) -> Result<Client, fantoccini::error::NewSessionError> {
    let client = ClientBuilder::native()
        .capabilities(chrome_capabilities())
        .connect(url)
        .await?;
    if let Err(e) = client.set_window_size(VIEWPORT_WIDTH, VIEWPORT_HEIGHT).await {
        ::log::debug!("Could not size browser window: {}", e);
    }
    Ok(client)
}

fn chrome_capabilities() -> serde_json::Map<String, serde_json::Value> {
    let mut caps = serde_json::Map::new();
    caps.insert(
        "goog:chromeOptions".to_string(),
        json!({
            "args": [
                "--headless=new",
                format!("--window-size={VIEWPORT_WIDTH},{VIEWPORT_HEIGHT}"),
                format!("--user-agent={USER_AGENT}"),
                "--hide-scrollbars",
            ],
        }),
    );
    caps
}

/// A page task's own browser tab. Every task opens one and closes it on
/// every exit path, so a failure mid-page cannot leak the handle.
pub struct Tab {
    home: WindowHandle,
}

/// Opens a fresh tab and switches the session into it.
pub async fn open_tab(client: &Client) -> Result<Tab, CmdError> {
    let home = client.window().await?;
    let win = client.new_window(true).await?;
    client.switch_to_window(win.handle).await?;
    Ok(Tab { home })
}

impl Tab {
    /// Closes the tab and returns the session to the window it came from.
    pub async fn close(self, client: &Client) {
        if let Err(e) = client.close_window().await {
            ::log::warn!("Failed to close page tab: {}", e);
        }
        if let Err(e) = client.switch_to_window(self.home).await {
            ::log::warn!("Failed to switch back to the root window: {}", e);
        }
    }
}

/// The current document's title, or an empty string when the probe fails.
pub async fn page_title(client: &Client) -> String {
    match client.execute("return document.title;", vec![]).await {
        Ok(value) => value.as_str().unwrap_or("").to_string(),
        Err(e) => {
            ::log::debug!("Title probe failed: {}", e);
            String::new()
        }
    }
}

/// The HTTP status of the navigation that produced the current document.
///
/// WebDriver does not expose response status, so this reads
/// `PerformanceNavigationTiming.responseStatus`; browsers without that field
/// (or a zero reading) yield `None`.
pub async fn http_status(client: &Client) -> Option<u16> {
    match client.execute(STATUS_PROBE, vec![]).await {
        Ok(value) => value.as_u64().and_then(|s| u16::try_from(s).ok()),
        Err(e) => {
            ::log::debug!("Status probe failed: {}", e);
            None
        }
    }
}

/// Scrolls through the page in steps to trigger lazy-loaded content, then
/// returns to the top. Best-effort.
pub async fn scroll_page(client: &Client) {
    if let Err(e) = client.execute_async(SMART_SCROLL_SCRIPT, vec![]).await {
        ::log::debug!("Lazy-load scroll failed: {}", e);
    }
}

/// Applies the cosmetic capture toggles: hidden selectors, unfixed
/// fixed/sticky elements, expanded scroll containers. Best-effort.
pub async fn prepare_capture(client: &Client, hide: &[String], unfix: bool, expand: bool) {
    if hide.is_empty() && !unfix && !expand {
        return;
    }
    let args = vec![json!(hide), json!(unfix), json!(expand)];
    if let Err(e) = client.execute(PREPARE_CAPTURE_SCRIPT, args).await {
        ::log::debug!("Capture preparation script failed: {}", e);
    }
}

/// Captures a full-height screenshot by growing the window to the document's
/// scroll height (clamped) before shooting, restoring the viewport after.
/// Degrades to a plain viewport shot if resizing fails.
pub async fn full_page_screenshot(client: &Client) -> Result<Vec<u8>, CmdError> {
    let height = client
        .execute(SCROLL_HEIGHT_PROBE, vec![])
        .await
        .ok()
        .and_then(|v| v.as_u64())
        .unwrap_or(0)
        .clamp(u64::from(VIEWPORT_HEIGHT), MAX_CAPTURE_HEIGHT);

    if height > u64::from(VIEWPORT_HEIGHT) {
        if let Err(e) = client.set_window_size(VIEWPORT_WIDTH, height as u32).await {
            ::log::debug!("Could not grow window for capture: {}", e);
        }
    }

    let shot = client.screenshot().await;

    if let Err(e) = client.set_window_size(VIEWPORT_WIDTH, VIEWPORT_HEIGHT).await {
        ::log::debug!("Could not restore window size: {}", e);
    }

    shot
}
