use crate::browser::{self, discover, session, settle};
use crate::config::CrawlConfig;
use crate::crawlers::frontier::Frontier;
use crate::error::CrawlError;
use crate::filter::ScopeFilter;
use crate::output::{self, Recorder};
use crate::parsers;
use crate::results::PageRecord;
use crate::seeds;
use crate::urls;
use fantoccini::Client;
use fantoccini::error::CmdError;
use std::path::Path;
use std::time::Duration;
use tokio::time::timeout;
use url::Url;

const NAVIGATION_TIMEOUT: Duration = Duration::from_secs(60);

/// Runs a crawl to completion and returns the number of recorded pages.
///
/// Pages are processed strictly one at a time in FIFO dequeue order, so the
/// ledger rows land in deterministic breadth-first order. A failure on one
/// page is logged and contained; only configuration-time errors abort the
/// run.
pub async fn run(config: &CrawlConfig) -> Result<usize, CrawlError> {
    let root = Url::parse(&config.start_url).map_err(|source| CrawlError::InvalidStartUrl {
        url: config.start_url.clone(),
        source,
    })?;
    let filter = ScopeFilter::new(
        config.domain_restricted,
        config.include.as_deref(),
        config.exclude.as_deref(),
    )?;

    // Credentials resolve before anything touches the filesystem or the
    // network, so a misconfigured login aborts with zero output.
    let credentials = config
        .login
        .as_ref()
        .map(session::Credentials::from_env)
        .transpose()?;

    let mut recorder = Recorder::create(&config.outdir)?;

    let mut frontier = Frontier::new();
    seed_frontier(&mut frontier, config, &root).await;

    let client = browser::connect(&config.webdriver_url).await?;

    match (&config.login, &credentials) {
        (Some(login_config), Some(creds)) => {
            session::login(
                &client,
                login_config,
                creds,
                config.ready_selector.as_deref(),
                config.session_state.as_deref(),
            )
            .await;
        }
        _ => {
            if let Some(path) = &config.session_state {
                restore_session(&client, path, &root).await;
            } else {
                ::log::info!("Skipping login; no session state configured");
            }
        }
    }

    let mut processed = 0usize;
    while processed < config.max_pages {
        let Some(url) = frontier.pop() else { break };

        if frontier.is_visited(&url) {
            continue;
        }
        if !filter.admits(&url, &root) {
            ::log::debug!("Out of scope, skipping: {}", url);
            continue;
        }
        if !frontier.claim(&url) {
            continue;
        }

        ::log::info!("Requesting page {}", url);
        match process_page(&client, config, &url).await {
            Ok(outcome) => {
                match recorder.record(
                    &outcome.record,
                    &outcome.screenshot,
                    &outcome.html,
                    &outcome.text,
                ) {
                    Ok(()) => {
                        processed += 1;
                        enqueue_discovered(&mut frontier, &filter, &root, outcome.links);
                    }
                    Err(e) => ::log::error!("Error on {}: {}", url, e),
                }
            }
            Err(e) => ::log::error!("Error on {}: {}", url, e),
        }

        if config.delay_secs > 0.0 {
            tokio::time::sleep(Duration::from_secs_f64(config.delay_secs)).await;
        }
    }

    if let Err(e) = client.close().await {
        ::log::warn!("Failed to close WebDriver session: {}", e);
    }

    ::log::info!("Crawl complete: {} pages recorded", processed);
    Ok(processed)
}

/// Everything a single page task produces, gathered before anything is
/// written so a mid-pipeline failure leaves no partial artifacts.
struct PageOutcome {
    record: PageRecord,
    screenshot: Vec<u8>,
    html: String,
    text: String,
    links: Vec<Url>,
}

/// Processes one URL in its own tab; the tab is closed whether or not the
/// pipeline succeeds.
async fn process_page(
    client: &Client,
    config: &CrawlConfig,
    url: &Url,
) -> Result<PageOutcome, CrawlError> {
    let tab = browser::open_tab(client).await?;
    let outcome = run_pipeline(client, config, url).await;
    tab.close(client).await;
    outcome
}

/// Navigate, settle, trigger lazy content, capture, and discover for one
/// page. Any error here fails the page task.
async fn run_pipeline(
    client: &Client,
    config: &CrawlConfig,
    url: &Url,
) -> Result<PageOutcome, CrawlError> {
    timeout(NAVIGATION_TIMEOUT, client.goto(url.as_str()))
        .await
        .map_err(|_| CmdError::WaitTimeout)
        .map_err(CrawlError::from)??;
    let status = browser::http_status(client).await;

    settle::settle(client, config.quiet_ms, config.ready_selector.as_deref()).await;
    browser::scroll_page(client).await;
    settle::settle_after_scroll(client, config.quiet_ms).await;

    let title = browser::page_title(client).await;
    browser::prepare_capture(
        client,
        &config.hide_selector_list(),
        config.unfix_fixed,
        config.expand_scrollables,
    )
    .await;

    let screenshot = browser::full_page_screenshot(client).await?;
    let html = client.source().await?;
    let text = parsers::html::extract_text(&html);
    let links = discover::discover(client, url, &config.route_attribute).await?;

    let (screenshot_path, html_path, text_path) = output::artifact_paths(url);
    let record = PageRecord {
        url: url.to_string(),
        title,
        status,
        screenshot_path,
        html_path,
        text_path,
    };

    Ok(PageOutcome {
        record,
        screenshot,
        html,
        text,
        links,
    })
}

/// Seeds the frontier from the start URL, the optional routes file, and the
/// optional sitemap. Sitemap failures contribute nothing.
async fn seed_frontier(frontier: &mut Frontier, config: &CrawlConfig, root: &Url) {
    frontier.push(root.clone());

    if let Some(path) = &config.routes_file {
        for url in seeds::load_routes(path, root) {
            frontier.push(url);
        }
    }

    if let Some(sitemap_url) = &config.sitemap {
        for loc in seeds::fetch_sitemap(sitemap_url).await {
            if let Some(url) = urls::normalize(root, &loc) {
                frontier.push(url);
            }
        }
    }

    ::log::info!("Frontier seeded with {} URLs", frontier.len());
}

/// Applies the same scope rules used at seed time to freshly discovered
/// links, then enqueues the survivors.
fn enqueue_discovered(frontier: &mut Frontier, filter: &ScopeFilter, root: &Url, links: Vec<Url>) {
    for link in links {
        if frontier.is_visited(&link) {
            continue;
        }
        if !filter.admits(&link, root) {
            ::log::debug!("Filter rejected discovered link: {}", link);
            continue;
        }
        ::log::debug!("Queuing link for crawling: {}", link);
        frontier.push(link);
    }
}

/// Reuses persisted session state from an earlier run. Missing files are a
/// silent no-op; anything else is logged and skipped.
async fn restore_session(client: &Client, path: &Path, root: &Url) {
    if !path.exists() {
        return;
    }
    match session::SessionState::load(path) {
        Ok(state) => {
            ::log::info!("Restoring session state from {}", path.display());
            // Cookies only attach once the browser is on the target origin.
            if let Err(e) = client.goto(root.as_str()).await {
                ::log::warn!("Could not open {} to restore session: {}", root, e);
                return;
            }
            state.restore(client).await;
        }
        Err(e) => ::log::warn!("Could not load session state {}: {}", path.display(), e),
    }
}
