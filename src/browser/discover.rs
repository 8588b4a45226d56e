use crate::urls;
use fantoccini::Client;
use fantoccini::error::CmdError;
use serde_json::json;
use std::collections::HashSet;
use url::Url;

const ROUTE_ATTR_SCRIPT: &str = r#"
const selector = arguments[0];
const attr = arguments[1];
return Array.from(document.querySelectorAll(selector)).map(e => e.getAttribute(attr));
"#;

// Angular-style router links; often tree-shaken out of production builds,
// so absence is expected.
const ROUTER_LINK_SCRIPT: &str = r#"
return Array.from(document.querySelectorAll('[routerLink],[ng-reflect-router-link]'))
    .map(e => e.getAttribute('routerLink') || e.getAttribute('ng-reflect-router-link'));
"#;

/// Extracts candidate URLs from the rendered page: route-marker attributes
/// in document order, then router-link attributes best-effort. Values are
/// normalized against `base` and de-duplicated preserving first-seen order.
///
/// Scope and include/exclude filtering happen in the orchestrator; this is a
/// pure extraction step.
pub async fn discover(
    client: &Client,
    base: &Url,
    route_attribute: &str,
) -> Result<Vec<Url>, CmdError> {
    let selector = format!("div[{route_attribute}]");
    let routes = client
        .execute(ROUTE_ATTR_SCRIPT, vec![json!(selector), json!(route_attribute)])
        .await?;
    let mut hrefs = collect_strings(&routes);

    match client.execute(ROUTER_LINK_SCRIPT, vec![]).await {
        Ok(value) => hrefs.extend(collect_strings(&value)),
        Err(e) => ::log::debug!("Router-link discovery unavailable: {}", e),
    }

    Ok(normalize_and_dedup(&hrefs, base))
}

/// Non-empty strings out of a script's array result.
fn collect_strings(value: &serde_json::Value) -> Vec<String> {
    value
        .as_array()
        .map(|items| {
            items
                .iter()
                .filter_map(|v| v.as_str())
                .filter(|s| !s.is_empty())
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default()
}

/// Normalizes hrefs against `base`, dropping rejects and duplicates while
/// keeping first-seen order.
fn normalize_and_dedup(hrefs: &[String], base: &Url) -> Vec<Url> {
    let mut seen = HashSet::new();
    let mut out = Vec::new();
    for href in hrefs {
        if let Some(url) = urls::normalize(base, href) {
            if seen.insert(url.as_str().to_string()) {
                out.push(url);
            }
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_collect_strings_filters_nulls_and_empties() {
        let value = json!(["/a", null, "", "/b"]);
        assert_eq!(collect_strings(&value), vec!["/a", "/b"]);

        assert!(collect_strings(&json!(null)).is_empty());
        assert!(collect_strings(&json!("not-an-array")).is_empty());
    }

    #[test]
    fn test_normalize_and_dedup_keeps_first_seen_order() {
        let base = Url::parse("https://example.com/").unwrap();
        let hrefs = vec![
            "/b".to_string(),
            "/a".to_string(),
            "/b#frag".to_string(),
            "javascript:void(0)".to_string(),
            "/a".to_string(),
        ];
        let urls: Vec<String> = normalize_and_dedup(&hrefs, &base)
            .iter()
            .map(|u| u.to_string())
            .collect();
        assert_eq!(urls, vec!["https://example.com/b", "https://example.com/a"]);
    }
}
