use crate::net::TransportError;
use reqwest::Url;
use tabtrack_config::{COLLECTOR_BASE_PARAM, DEFAULT_COLLECTOR_BASE};

/// Reads the collector override from the hosting page's query string.
///
/// Returns `None` when the parameter is missing or empty.
pub fn collector_base_param(page: &Url) -> Option<String> {
    page.query_pairs()
        .find(|(k, _)| k == COLLECTOR_BASE_PARAM)
        .map(|(_, v)| v.into_owned())
        .filter(|v| !v.is_empty())
}

/// Resolves the collector base for a hosting page.
///
/// A relative base (the default `/api/1.0/events` included) resolves against the page,
/// the way the browser would resolve it. The result always ends in `/` so endpoint
/// paths join beneath it.
pub fn resolve_collector_base(page_url: &str) -> Result<Url, TransportError> {
    let page = Url::parse(page_url).map_err(|e| TransportError::InvalidUrl {
        url: page_url.to_string(),
        message: e.to_string(),
    })?;

    let base = collector_base_param(&page).unwrap_or_else(|| DEFAULT_COLLECTOR_BASE.to_string());
    let mut url = page.join(&base).map_err(|e| TransportError::InvalidUrl {
        url: base.clone(),
        message: e.to_string(),
    })?;

    url.set_query(None);
    url.set_fragment(None);
    if !url.path().ends_with('/') {
        url.set_path(&format!("{}/", url.path()));
    }

    tracing::info!("Using collector: {}", url);
    Ok(url)
}
