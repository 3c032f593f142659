//! Flea-market listing fetcher and detail parser.
//!
//! The index page is mandatory: any failure to load it aborts the run.
//! Detail pages are best effort: a page that fails to load, or that names no
//! recognisable place, simply contributes nothing.

mod parser;

use std::collections::HashSet;
use std::time::Duration;

use reqwest::Client;
use tracing::{debug, info, instrument, warn};
use url::Url;

use flearoute_shared::{FleaMarketListing, FleaMarketLocation, FleaRouteError, ListingConfig, ListingPage, Result};

pub use parser::{LocationVocabulary, detail_items, find_location_phrase, parse_listing_page};

/// User-Agent string for listing requests.
const USER_AGENT: &str = concat!("flearoute/", env!("CARGO_PKG_VERSION"));

/// Maximum number of redirects to follow.
const MAX_REDIRECTS: usize = 5;

// ---------------------------------------------------------------------------
// ListingClient
// ---------------------------------------------------------------------------

/// HTTP client bound to one flea-market site.
pub struct ListingClient {
    client: Client,
    site_url: Url,
    origin: String,
    vocabulary: LocationVocabulary,
}

impl ListingClient {
    /// Create a client for the site described by `config`.
    pub fn new(config: &ListingConfig) -> Result<Self> {
        let site_url = Url::parse(&config.site_url).map_err(|e| {
            FleaRouteError::config(format!("invalid site_url '{}': {e}", config.site_url))
        })?;
        let origin = origin_url(&site_url)?;

        let client = Client::builder()
            .user_agent(USER_AGENT)
            .redirect(reqwest::redirect::Policy::limited(MAX_REDIRECTS))
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| FleaRouteError::Network(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            site_url,
            origin,
            vocabulary: LocationVocabulary::new(&config.location_keywords),
        })
    }

    /// Origin every detail link must start with.
    pub fn origin(&self) -> &str {
        &self.origin
    }

    /// Download and parse the index page.
    #[instrument(skip_all, fields(url = %self.site_url))]
    pub async fn fetch_listing_page(&self) -> Result<ListingPage> {
        let body = fetch_text(&self.client, self.site_url.as_str())
            .await
            .map_err(|e| {
                FleaRouteError::Network(format!(
                    "an error occurred while loading the listing page: {e}"
                ))
            })?;

        let page = parse_listing_page(&body, &self.origin);

        info!(
            date = %page.date,
            listings = page.listings.len(),
            "listing page loaded"
        );

        Ok(page)
    }

    /// Fetch one detail page and extract its location phrase.
    pub async fn fetch_location_phrase(&self, listing: &FleaMarketListing) -> Result<Option<String>> {
        let body = fetch_text(&self.client, &listing.detail_url).await?;
        let items = detail_items(&body);
        Ok(find_location_phrase(&items, &self.vocabulary))
    }

    /// Resolve a location phrase for each town, first match wins.
    ///
    /// `on_fetch(current, total, town)` is called before each detail request.
    #[instrument(skip_all, fields(listings = listings.len()))]
    pub async fn collect_locations(
        &self,
        listings: &[FleaMarketListing],
        mut on_fetch: impl FnMut(usize, usize, &str),
    ) -> Vec<FleaMarketLocation> {
        let mut seen: HashSet<&str> = HashSet::new();
        let mut locations = Vec::new();
        let total = listings.len();

        for (i, listing) in listings.iter().enumerate() {
            if seen.contains(listing.town.as_str()) {
                debug!(town = %listing.town, "town already located, skipping");
                continue;
            }

            on_fetch(i + 1, total, &listing.town);

            match self.fetch_location_phrase(listing).await {
                Ok(Some(phrase)) => {
                    debug!(town = %listing.town, %phrase, "location found");
                    seen.insert(listing.town.as_str());
                    locations.push(FleaMarketLocation {
                        town: listing.town.clone(),
                        location_phrase: phrase,
                    });
                }
                Ok(None) => {
                    debug!(town = %listing.town, url = %listing.detail_url, "no location phrase on detail page");
                }
                Err(e) => {
                    warn!(town = %listing.town, error = %e, "detail page unavailable, skipping");
                }
            }
        }

        info!(
            towns = locations.len(),
            "data about the nearby flea markets has been retrieved"
        );

        locations
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Extract the origin (scheme + host + port) from a URL.
fn origin_url(url: &Url) -> Result<String> {
    let scheme = url.scheme();
    let host = url
        .host_str()
        .ok_or_else(|| FleaRouteError::config(format!("URL has no host: {url}")))?;

    match url.port() {
        Some(port) => Ok(format!("{scheme}://{host}:{port}")),
        None => Ok(format!("{scheme}://{host}")),
    }
}

/// GET a URL and return its body, failing on any non-success status.
async fn fetch_text(client: &Client, url: &str) -> Result<String> {
    let response = client
        .get(url)
        .send()
        .await
        .map_err(|e| FleaRouteError::Network(format!("{url}: {e}")))?;

    let status = response.status();
    if !status.is_success() {
        return Err(FleaRouteError::Network(format!("{url}: HTTP {status}")));
    }

    response
        .text()
        .await
        .map_err(|e| FleaRouteError::Network(format!("{url}: failed to read body: {e}")))
}
