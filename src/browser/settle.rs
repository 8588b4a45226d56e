use fantoccini::{Client, Locator};
use serde_json::json;
use std::time::Duration;
use tokio::time::timeout;

const NETWORK_IDLE_TIMEOUT: Duration = Duration::from_secs(10);
const NETWORK_IDLE_POLL: Duration = Duration::from_millis(250);
const READY_SELECTOR_TIMEOUT: Duration = Duration::from_secs(15);

/// Extra headroom on top of the quiet window before the quiescence probe is
/// abandoned; a page that mutates forever must not hang its task.
const QUIESCENCE_GRACE: Duration = Duration::from_secs(20);

/// Quiet threshold cap for the settle pass after lazy-load scrolling.
const POST_SCROLL_QUIET_CAP_MS: u64 = 1200;

// True once the document has loaded and no resource fetch is in flight.
// WebDriver has no network-idle event; resource timing entries with
// responseEnd === 0 are the in-flight ones.
const NETWORK_IDLE_PROBE: &str = r#"
if (document.readyState !== 'complete') return false;
const inflight = performance.getEntriesByType('resource')
    .filter(e => e.responseEnd === 0).length;
return inflight === 0;
"#;

// Resolves once the DOM has gone `quiet` milliseconds without a subtree
// mutation, polled on the frame callback.
const DOM_QUIET_SCRIPT: &str = r#"
const quiet = arguments[0];
const done = arguments[arguments.length - 1];
let lastChange = performance.now();
const obs = new MutationObserver(() => { lastChange = performance.now(); });
obs.observe(document, {subtree: true, childList: true, attributes: true, characterData: true});
(function check() {
    if (performance.now() - lastChange >= quiet) {
        obs.disconnect();
        done();
    } else {
        requestAnimationFrame(check);
    }
})();
"#;

/// Waits for a dynamically rendered page to reach a quiescent state worth
/// capturing. Every stage is best-effort: a timeout degrades to "proceed
/// anyway" rather than failing the page task.
pub async fn settle(client: &Client, quiet_ms: u64, ready_selector: Option<&str>) {
    wait_for_network_idle(client).await;
    if let Some(selector) = ready_selector {
        wait_for_ready_selector(client, selector).await;
    }
    wait_for_dom_quiet(client, quiet_ms).await;
}

/// Shorter second settle pass after lazy-content scrolling, capped so the
/// full quiet window is not paid twice.
pub async fn settle_after_scroll(client: &Client, quiet_ms: u64) {
    settle(client, quiet_ms.min(POST_SCROLL_QUIET_CAP_MS), None).await;
}

async fn wait_for_network_idle(client: &Client) {
    let deadline = tokio::time::Instant::now() + NETWORK_IDLE_TIMEOUT;
    loop {
        // A probe failure counts as idle; the quiescence pass still guards.
        let idle = client
            .execute(NETWORK_IDLE_PROBE, vec![])
            .await
            .ok()
            .and_then(|v| v.as_bool())
            .unwrap_or(true);
        if idle {
            return;
        }
        if tokio::time::Instant::now() >= deadline {
            ::log::debug!("Network never went idle, proceeding");
            return;
        }
        tokio::time::sleep(NETWORK_IDLE_POLL).await;
    }
}

async fn wait_for_ready_selector(client: &Client, selector: &str) {
    let found = client
        .wait()
        .at_most(READY_SELECTOR_TIMEOUT)
        .for_element(Locator::Css(selector))
        .await;
    if found.is_err() {
        ::log::debug!("Ready selector '{}' did not appear, proceeding", selector);
    }
}

async fn wait_for_dom_quiet(client: &Client, quiet_ms: u64) {
    let quiet = Duration::from_millis(quiet_ms);
    let cap = quiet + QUIESCENCE_GRACE;
    let probe = client.execute_async(DOM_QUIET_SCRIPT, vec![json!(quiet_ms)]);
    match timeout(cap, probe).await {
        Ok(Ok(_)) => {}
        Ok(Err(e)) => {
            // Probe could not run; fall back to a flat sleep of the window.
            ::log::debug!("DOM quiescence probe failed ({}), sleeping {}ms", e, quiet_ms);
            tokio::time::sleep(quiet).await;
        }
        Err(_) => {
            ::log::debug!("DOM did not settle within {:?}, proceeding", cap);
        }
    }
}
