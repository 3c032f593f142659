//! HTML parsing for the flea-market site.
//!
//! Two page templates are understood:
//! - the index page: `div.deptardt` / `div.dept` blocks whose `ul > li > a`
//!   anchors each describe one event, plus the `h2#datejour` date heading
//! - the detail page: the second `ul.ville-colonne` of a block lists the
//!   practical details, one of which usually names the street or square

use std::sync::LazyLock;

use scraper::{ElementRef, Html, Selector};
use tracing::{debug, warn};

use flearoute_shared::{FleaMarketListing, ListingPage};

/// Department blocks, cities grouped first then plain departments.
static DEPT_SELECTORS: LazyLock<[Selector; 2]> = LazyLock::new(|| {
    [
        Selector::parse(r#"div[class="deptardt"]"#).expect("deptardt selector"),
        Selector::parse(r#"div[class="dept"]"#).expect("dept selector"),
    ]
});

static EVENT_LINK_SEL: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("ul > li > a").expect("event link selector"));

static DATE_SEL: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("h2#datejour").expect("date selector"));

static DIV_SEL: LazyLock<Selector> = LazyLock::new(|| Selector::parse("div").expect("div selector"));

static LI_SEL: LazyLock<Selector> = LazyLock::new(|| Selector::parse("li").expect("li selector"));

/// Class of the detail page's list columns.
const COLUMN_CLASS: &str = "ville-colonne";

// ---------------------------------------------------------------------------
// Index page
// ---------------------------------------------------------------------------

/// Parse the index page into listings.
///
/// Links that do not start with `origin` are logged and dropped.
pub fn parse_listing_page(html: &str, origin: &str) -> ListingPage {
    let doc = Html::parse_document(html);

    let date = match doc.select(&DATE_SEL).next() {
        Some(el) => el.text().collect::<String>().trim().to_string(),
        None => {
            warn!("listing page has no date heading");
            String::new()
        }
    };

    let mut listings = Vec::new();

    for dept_sel in DEPT_SELECTORS.iter() {
        for dept in doc.select(dept_sel) {
            for link in dept.select(&EVENT_LINK_SEL) {
                let Some(href) = link.value().attr("href") else {
                    continue;
                };

                if !href.starts_with(origin) {
                    warn!(href, "suspect URL detected, moving to the next flea market");
                    continue;
                }

                listings.push(FleaMarketListing {
                    town: link.text().collect::<String>().trim().to_string(),
                    category: link.value().attr("title").unwrap_or_default().trim().to_string(),
                    detail_url: href.to_string(),
                });
            }
        }
    }

    debug!(count = listings.len(), %date, "parsed listing page");

    ListingPage { date, listings }
}

// ---------------------------------------------------------------------------
// Detail page
// ---------------------------------------------------------------------------

/// Case-insensitive set of words that identify a location phrase.
#[derive(Debug, Clone)]
pub struct LocationVocabulary {
    words: Vec<String>,
}

impl LocationVocabulary {
    pub fn new<I, S>(words: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            words: words
                .into_iter()
                .map(|w| w.as_ref().trim().to_lowercase())
                .filter(|w| !w.is_empty())
                .collect(),
        }
    }

    /// Whether `fragment` contains any vocabulary word.
    pub fn matches(&self, fragment: &str) -> bool {
        let lowered = fragment.to_lowercase();
        self.words.iter().any(|w| lowered.contains(w.as_str()))
    }
}

/// Text fragments of every `li` in the detail page's second column, in document order.
///
/// Each inner vector holds one list item's text nodes.
pub fn detail_items(html: &str) -> Vec<Vec<String>> {
    let doc = Html::parse_document(html);
    let mut items = Vec::new();

    for div in doc.select(&DIV_SEL) {
        let Some(column) = div
            .children()
            .filter_map(ElementRef::wrap)
            .filter(|el| el.value().name() == "ul" && el.value().attr("class") == Some(COLUMN_CLASS))
            .nth(1)
        else {
            continue;
        };

        for li in column.select(&LI_SEL) {
            items.push(li.text().map(str::to_string).collect());
        }
    }

    items
}

/// First fragment, across all items, that contains a vocabulary word.
pub fn find_location_phrase(items: &[Vec<String>], vocabulary: &LocationVocabulary) -> Option<String> {
    items
        .iter()
        .flatten()
        .find(|fragment| vocabulary.matches(fragment))
        .map(|fragment| fragment.trim().to_string())
}
