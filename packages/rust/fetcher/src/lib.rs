//! Listing and detail page fetching for executive orders.
//!
//! This crate provides:
//! - [`OrderFetcher`]: HTTP client wrapper issuing browser-identified GETs
//! - [`listing`]: extraction of `(title, link)` candidates from the listing page
//! - [`detail`]: extraction of issuance date and body text from a detail page

pub mod detail;
pub mod listing;

use std::time::Duration;

use ordertrack_shared::{OrderCandidate, OrderTrackError, Result, SourceConfig};
use reqwest::Client;
use scraper::Selector;
use tracing::{debug, info, instrument, warn};
use url::Url;

pub use detail::{DetailOutcome, DetailPage, parse_detail, parse_timestamp};
pub use listing::parse_listing;

/// Maximum number of redirects to follow per request.
const MAX_REDIRECTS: usize = 5;

// ---------------------------------------------------------------------------
// Selectors
// ---------------------------------------------------------------------------

/// Compiled CSS selectors for listing and detail extraction.
#[derive(Debug, Clone)]
pub struct PageSelectors {
    /// Listing post-title headings.
    pub title: Selector,
    /// Anchor inside a heading.
    pub anchor: Selector,
    /// Detail page time marker.
    pub time: Selector,
    /// Detail page primary content container.
    pub content: Selector,
    /// Paragraphs inside the content container.
    pub paragraph: Selector,
}

impl PageSelectors {
    /// Compile the selectors named in the source config.
    pub fn from_config(source: &SourceConfig) -> Result<Self> {
        Ok(Self {
            title: compile(&source.title_selector)?,
            anchor: compile("a")?,
            time: compile(&source.time_selector)?,
            content: compile(&source.content_selector)?,
            paragraph: compile("p")?,
        })
    }
}

fn compile(css: &str) -> Result<Selector> {
    Selector::parse(css)
        .map_err(|e| OrderTrackError::parse(format!("invalid selector '{css}': {e:?}")))
}

// ---------------------------------------------------------------------------
// OrderFetcher
// ---------------------------------------------------------------------------

/// Fetches listing and detail pages from the order source.
pub struct OrderFetcher {
    client: Client,
    selectors: PageSelectors,
}

impl OrderFetcher {
    /// Build a fetcher from the `[source]` config section.
    pub fn new(source: &SourceConfig) -> Result<Self> {
        let mut builder = Client::builder()
            .user_agent(source.user_agent.as_str())
            .redirect(reqwest::redirect::Policy::limited(MAX_REDIRECTS));

        if let Some(secs) = source.request_timeout_secs {
            builder = builder.timeout(Duration::from_secs(secs));
        }

        let client = builder.build().map_err(|e| {
            OrderTrackError::Fetch(format!("failed to build HTTP client: {e}"))
        })?;

        Ok(Self {
            client,
            selectors: PageSelectors::from_config(source)?,
        })
    }

    /// Fetch the listing page and return its candidates in page order
    /// (newest first on the source site).
    ///
    /// Fails on network errors and non-2xx responses. Does not retry.
    #[instrument(skip_all, fields(url = %base_url))]
    pub async fn fetch_listing(&self, base_url: &Url) -> Result<Vec<OrderCandidate>> {
        let body = self.fetch_html(base_url.as_str()).await?;
        let candidates = parse_listing(&body, base_url, &self.selectors);
        info!(candidates = candidates.len(), "listing fetched");
        Ok(candidates)
    }

    /// Fetch a detail page.
    ///
    /// Never fails: transport problems come back as [`DetailOutcome::Degraded`]
    /// so one bad page cannot stop the run.
    #[instrument(skip_all, fields(url = %link))]
    pub async fn fetch_detail(&self, link: &str) -> DetailOutcome {
        match self.fetch_html(link).await {
            Ok(body) => {
                let page = parse_detail(&body, &self.selectors);
                debug!(
                    has_date = page.published.is_some(),
                    content_len = page.content.len(),
                    "detail extracted"
                );
                DetailOutcome::Extracted(page)
            }
            Err(e) => {
                warn!(error = %e, "detail fetch failed, using defaults");
                DetailOutcome::Degraded {
                    reason: e.to_string(),
                }
            }
        }
    }

    /// GET `url` and return the body of a 2xx response.
    async fn fetch_html(&self, url: &str) -> Result<String> {
        debug!(%url, "fetching page");

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| OrderTrackError::Fetch(format!("{url}: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            return Err(OrderTrackError::Fetch(format!("{url}: HTTP {status}")));
        }

        response
            .text()
            .await
            .map_err(|e| OrderTrackError::Fetch(format!("{url}: body read failed: {e}")))
    }
}
