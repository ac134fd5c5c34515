//! Product discovery & tab orchestration.
//!
//! Drives the search-results page in the session's main tab, parses a
//! bounded set of candidate entries out of the rendered HTML, and processes
//! them strictly one at a time: open a detail tab, extract fields and
//! reviews, close the tab, refocus the search results. A failure while
//! processing one entry skips that entry only; the main tab is repaired and
//! the remaining candidates still run.

use std::time::Duration;

use anyhow::{Context, Result};
use scraper::{Html, Selector};
use tokio::time::sleep;
use tracing::{debug, info, warn};

use crate::browser::BrowsingSession;
use crate::record::ProductRecord;
use crate::reviews::{self, normalized_text};
use crate::{detail, stealth};

pub const SITE_ORIGIN: &str = "https://www.flipkart.com";

const RESULTS_CONTAINER: &str = "div._1YokD2._3Mn1Gg";
const RESULT_ENTRY: &str = "div[data-id]";
const PRODUCT_ANCHOR: &str = "a[href*='/p/']";
const ENTRY_REVIEWS_LABEL: &str = "span.Wphh3N";
const POPUP_CLOSE_BUTTON: &str = "button._2KpZ6l._2doB4z";
const POPUP_CLOSE_GLYPH: &str = "//button[contains(text(), '✕')]";

/// Build the search URL for a free-text query, spaces encoded as `+`.
pub fn search_url(query: &str) -> String {
    let encoded = urlencoding::encode(query).replace("%20", "+");
    format!("{SITE_ORIGIN}/search?q={encoded}")
}

/// Snapshot of one search-result entry, parsed from the results page.
#[derive(Debug, Clone)]
pub struct CandidateEntry {
    pub data_id: String,
    /// Absolute product-page URL, when the entry exposed a product anchor.
    pub href: Option<String>,
    /// Compact "N Reviews" label shown on the result card, when present.
    pub reviews_label: Option<String>,
}

/// Parse up to `max` candidate entries out of the rendered results page.
pub fn parse_candidates(html: &str, max: usize) -> Vec<CandidateEntry> {
    let document = Html::parse_document(html);
    let entry_selector = Selector::parse(RESULT_ENTRY).unwrap();
    let anchor_selector = Selector::parse(PRODUCT_ANCHOR).unwrap();
    let label_selector = Selector::parse(ENTRY_REVIEWS_LABEL).unwrap();

    document
        .select(&entry_selector)
        .take(max)
        .map(|entry| {
            let data_id = entry.value().attr("data-id").unwrap_or_default().to_string();
            let href = entry
                .select(&anchor_selector)
                .next()
                .and_then(|anchor| anchor.value().attr("href"))
                .map(absolutize);
            let reviews_label = entry
                .select(&label_selector)
                .next()
                .map(|label| normalized_text(&label))
                .filter(|text| !text.is_empty());
            CandidateEntry { data_id, href, reviews_label }
        })
        .collect()
}

fn absolutize(href: &str) -> String {
    if href.starts_with("http") {
        href.to_string()
    } else {
        format!("{SITE_ORIGIN}{href}")
    }
}

pub struct FlipkartScraper {
    session: BrowsingSession,
}

impl FlipkartScraper {
    /// Launch a fresh, fully isolated scraper session.
    pub fn launch() -> Result<Self> {
        Ok(Self { session: BrowsingSession::launch()? })
    }

    /// Run the search and extract one `ProductRecord` per candidate entry,
    /// in result order. Per-entry failures are logged and skipped.
    pub async fn scrape(
        &self,
        query: &str,
        max_products: usize,
        review_count: usize,
    ) -> Result<Vec<ProductRecord>> {
        let main = self.session.main_tab();
        let url = search_url(query);
        info!(%url, "navigating to search results");
        main.navigate_to(&url).context("failed to open search results")?;
        if let Err(err) = main.wait_until_navigated() {
            warn!(error = %err, "search navigation did not settle, continuing");
        }

        // The page is often usable even when the container never shows up.
        if main
            .wait_for_element_with_custom_timeout(RESULTS_CONTAINER, Duration::from_secs(8))
            .is_err()
        {
            warn!("results container not found within budget, proceeding after grace delay");
            sleep(Duration::from_secs(3)).await;
        }

        dismiss_popup(main).await;

        if main
            .wait_for_element_with_custom_timeout(RESULT_ENTRY, Duration::from_secs(6))
            .is_err()
        {
            warn!("no result entries appeared within the wait budget");
        }

        let html = main.get_content().context("failed to read search results page")?;
        let candidates = parse_candidates(&html, max_products);
        info!(count = candidates.len(), "discovered candidate entries");

        let mut records = Vec::with_capacity(candidates.len());
        for (index, entry) in candidates.iter().enumerate() {
            match self.process_entry(entry, index, &url, review_count).await {
                Ok(record) => records.push(record),
                Err(err) => {
                    warn!(index, data_id = %entry.data_id, error = %err, "skipping entry after failure");
                    self.session.focus_main();
                }
            }
        }

        Ok(records)
    }

    async fn process_entry(
        &self,
        entry: &CandidateEntry,
        index: usize,
        search_page_url: &str,
        review_count: usize,
    ) -> Result<ProductRecord> {
        let product_url = match &entry.href {
            Some(href) => href.clone(),
            None => self.resolve_url_by_click(index, search_page_url).await?,
        };
        debug!(index, %product_url, "processing candidate entry");

        let detail_tab = self.session.open_detail(&product_url)?;
        let tab = detail_tab.tab();

        if tab
            .wait_for_element_with_custom_timeout("body", Duration::from_secs(8))
            .is_err()
        {
            warn!(%product_url, "timed out waiting for product page body");
        }
        dismiss_popup(tab).await;

        let mut record = detail::extract_details(tab, &product_url, entry.reviews_label.as_deref())?;

        if product_url.contains("flipkart.com") {
            record.top_reviews = reviews::top_reviews(tab, &product_url, review_count).await;
        }

        detail_tab.close();
        Ok(record)
    }

    /// Fallback URL resolution when an entry exposes no product anchor:
    /// click the entry's first link in the main tab, read the landing URL,
    /// then restore the main tab to the search results.
    async fn resolve_url_by_click(&self, index: usize, search_page_url: &str) -> Result<String> {
        let main = self.session.main_tab();
        let entries = main.find_elements(RESULT_ENTRY).context("result entries vanished")?;
        let entry = entries
            .get(index)
            .context("candidate entry no longer present on the results page")?;
        entry
            .find_element("a")
            .context("entry has no clickable anchor")?
            .click()
            .context("failed to click entry anchor")?;
        stealth::human_pause().await;
        if let Err(err) = main.wait_until_navigated() {
            warn!(error = %err, "click navigation did not settle");
        }
        let product_url = main.get_url();

        main.navigate_to(search_page_url)
            .context("failed to restore search results after click")?;
        let _ = main.wait_until_navigated();

        Ok(product_url)
    }
}

/// Best-effort dismissal of the login interstitial: the known close-button
/// class first, then any button whose text is the close glyph. Absence of
/// either is not an error.
async fn dismiss_popup(tab: &headless_chrome::Tab) {
    if let Ok(button) = tab.wait_for_element_with_custom_timeout(POPUP_CLOSE_BUTTON, Duration::from_secs(3)) {
        if button.click().is_ok() {
            debug!("dismissed login popup");
            stealth::human_pause().await;
            return;
        }
    }
    if let Ok(button) = tab.find_element_by_xpath(POPUP_CLOSE_GLYPH) {
        if button.click().is_ok() {
            debug!("dismissed popup via close glyph");
            stealth::human_pause().await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const RESULTS_PAGE: &str = r#"
        <html><body><div class="_1YokD2 _3Mn1Gg">
            <div data-id="PRC111">
                <a href="/prestige-cooker/p/itmAAA111?pid=PRC111">Prestige Cooker</a>
                <span class="Wphh3N">1,021 Ratings &amp; 97 Reviews</span>
            </div>
            <div data-id="PRC222">
                <a href="https://www.flipkart.com/hawkins-cooker/p/itmBBB222">Hawkins Cooker</a>
            </div>
            <div data-id="PRC333">
                <a href="/no-product-path">not a product link</a>
            </div>
            <div class="ad-slot">sponsored, no data id</div>
        </div></body></html>
    "#;

    #[test]
    fn search_url_encodes_spaces_as_plus() {
        assert_eq!(search_url("Cooker"), "https://www.flipkart.com/search?q=Cooker");
        assert_eq!(
            search_url("pressure cooker 5l"),
            "https://www.flipkart.com/search?q=pressure+cooker+5l"
        );
    }

    #[test]
    fn search_url_escapes_reserved_characters() {
        assert_eq!(
            search_url("cooker & lid"),
            "https://www.flipkart.com/search?q=cooker+%26+lid"
        );
    }

    #[test]
    fn candidates_are_parsed_with_absolute_hrefs() {
        let candidates = parse_candidates(RESULTS_PAGE, 10);
        assert_eq!(candidates.len(), 3);

        assert_eq!(candidates[0].data_id, "PRC111");
        assert_eq!(
            candidates[0].href.as_deref(),
            Some("https://www.flipkart.com/prestige-cooker/p/itmAAA111?pid=PRC111")
        );
        assert_eq!(candidates[0].reviews_label.as_deref(), Some("1,021 Ratings & 97 Reviews"));

        assert_eq!(
            candidates[1].href.as_deref(),
            Some("https://www.flipkart.com/hawkins-cooker/p/itmBBB222")
        );
        assert!(candidates[1].reviews_label.is_none());
    }

    #[test]
    fn entry_without_product_anchor_has_no_href() {
        let candidates = parse_candidates(RESULTS_PAGE, 10);
        assert!(candidates[2].href.is_none());
    }

    #[test]
    fn candidates_are_truncated_to_max() {
        assert_eq!(parse_candidates(RESULTS_PAGE, 1).len(), 1);
        assert!(parse_candidates(RESULTS_PAGE, 0).is_empty());
    }

    #[test]
    fn empty_page_yields_no_candidates() {
        assert!(parse_candidates("<html><body></body></html>", 5).is_empty());
    }
}
