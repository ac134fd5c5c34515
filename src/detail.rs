//! Product detail-page extraction.
//!
//! Each scalar field resolves through its own selector cascade so a missing
//! price never blocks the title or rating; unresolved fields carry the
//! shared sentinel. The review total prefers the compact label captured
//! from the originating search entry, then falls back to pattern-matching
//! the full detail-page text.

use std::sync::Arc;

use anyhow::{Context, Result};
use headless_chrome::Tab;
use once_cell::sync::Lazy;
use regex::Regex;
use scraper::Html;

use crate::cascade::{self, Strategy};
use crate::record::{ProductRecord, NOT_AVAILABLE};
use crate::reviews::normalized_text;

/// Title: primary heading first, then the span nested inside the heading.
pub const TITLE_STRATEGIES: &[Strategy] = &[
    Strategy::css_wait("h1, span.B_NuCI", 6),
    Strategy::css("h1>span"),
];

/// Price: first element whose text carries the rupee glyph.
pub const PRICE_STRATEGIES: &[Strategy] = &[Strategy::xpath_wait("//*[contains(text(),'₹')]", 4)];

/// Rating: dedicated badge, then the id-pattern-matched span.
pub const RATING_STRATEGIES: &[Strategy] = &[
    Strategy::css("div._3LWZlK"),
    Strategy::xpath("//span[contains(@id, 'productRating')]"),
];

// Count patterns keep grouping commas as literal text.
static RATINGS_AND_REVIEWS_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(\d{1,3}(?:,\d{3})*)\s*Ratings\s*&\s*(\d{1,3}(?:,\d{3})*)\s*Reviews").unwrap()
});
static REVIEWS_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(\d{1,3}(?:,\d{3})*)\s+Reviews").unwrap());
static RATINGS_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(\d{1,3}(?:,\d{3})*)\s+Ratings").unwrap());
static PRODUCT_ID_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"/p/(itm[0-9A-Za-z]+)").unwrap());

/// Extract the product id (`itm...` path segment) from a product URL.
pub fn product_id_from_url(url: &str) -> String {
    PRODUCT_ID_RE
        .captures(url)
        .map(|caps| caps[1].to_string())
        .unwrap_or_else(|| NOT_AVAILABLE.to_string())
}

/// Resolve the review total. The search-entry label wins when present
/// (falling back to the raw label if the count pattern misses); otherwise
/// the detail-page text is scanned for, in priority order, a combined
/// "X Ratings & Y Reviews" pattern (taking Y), a standalone "Y Reviews",
/// and finally a standalone "X Ratings".
pub fn resolve_total_reviews(entry_label: Option<&str>, page_text: &str) -> String {
    if let Some(label) = entry_label {
        let label = label.trim();
        if !label.is_empty() {
            return REVIEWS_RE
                .captures(label)
                .map(|caps| caps[1].to_string())
                .unwrap_or_else(|| label.to_string());
        }
    }
    total_reviews_from_page_text(page_text)
}

fn total_reviews_from_page_text(page_text: &str) -> String {
    if let Some(caps) = RATINGS_AND_REVIEWS_RE.captures(page_text) {
        return caps[2].to_string();
    }
    if let Some(caps) = REVIEWS_RE.captures(page_text) {
        return caps[1].to_string();
    }
    if let Some(caps) = RATINGS_RE.captures(page_text) {
        return caps[1].to_string();
    }
    NOT_AVAILABLE.to_string()
}

/// Whole-document visible text, whitespace-collapsed.
pub fn page_text(html: &str) -> String {
    let document = Html::parse_document(html);
    normalized_text(&document.root_element())
}

/// Extract the scalar fields of one product from its open detail tab.
/// Reviews are merged in afterward by the orchestrator. Only a failure to
/// read the page content at all escalates; individual field gaps degrade
/// to the sentinel.
pub fn extract_details(
    tab: &Arc<Tab>,
    product_url: &str,
    entry_reviews_label: Option<&str>,
) -> Result<ProductRecord> {
    let product_title = cascade::resolve_field(tab, TITLE_STRATEGIES);
    let price = cascade::resolve_field(tab, PRICE_STRATEGIES);
    let rating = cascade::resolve_field(tab, RATING_STRATEGIES);

    let html = tab
        .get_content()
        .context("failed to read product page content")?;
    let total_reviews = resolve_total_reviews(entry_reviews_label, &page_text(&html));

    Ok(ProductRecord {
        product_id: product_id_from_url(product_url),
        product_title,
        rating,
        total_reviews,
        price,
        ..ProductRecord::default()
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn product_id_is_extracted_from_path_segment() {
        let url = "https://www.flipkart.com/prestige-svachh-cooker/p/itmf3a9ae7x2hzqk?pid=PRC1";
        assert_eq!(product_id_from_url(url), "itmf3a9ae7x2hzqk");
    }

    #[test]
    fn product_id_without_match_is_sentinel() {
        assert_eq!(product_id_from_url("https://www.flipkart.com/search?q=cooker"), NOT_AVAILABLE);
        assert_eq!(product_id_from_url("N/A"), NOT_AVAILABLE);
    }

    #[test]
    fn combined_pattern_takes_review_group() {
        let resolved = resolve_total_reviews(None, "1,234 Ratings & 567 Reviews");
        assert_eq!(resolved, "567");
    }

    #[test]
    fn standalone_reviews_pattern_is_second_priority() {
        assert_eq!(resolve_total_reviews(None, "Summary: 2,901 Reviews so far"), "2,901");
    }

    #[test]
    fn ratings_pattern_is_last_resort() {
        assert_eq!(resolve_total_reviews(None, "8,450 Ratings"), "8,450");
        assert_eq!(resolve_total_reviews(None, "no counts on this page"), NOT_AVAILABLE);
    }

    #[test]
    fn entry_label_takes_priority_over_page_text() {
        let resolved = resolve_total_reviews(Some("3,113 Ratings & 321 Reviews"), "999 Reviews");
        assert_eq!(resolved, "321");
    }

    #[test]
    fn unparsable_entry_label_is_kept_verbatim() {
        assert_eq!(resolve_total_reviews(Some("  12K reviews "), "999 Reviews"), "12K reviews");
    }

    #[test]
    fn empty_entry_label_falls_back_to_page_text() {
        assert_eq!(resolve_total_reviews(Some("   "), "42 Reviews"), "42");
    }

    #[test]
    fn grouping_commas_survive_extraction() {
        assert_eq!(resolve_total_reviews(None, "1,234,567 Reviews"), "1,234,567");
    }

    #[test]
    fn page_text_collapses_markup() {
        let html = "<html><body><div>4.3 <span>★</span></div><p>1,234   Ratings &amp; 567 Reviews</p></body></html>";
        assert_eq!(page_text(html), "4.3 ★ 1,234 Ratings & 567 Reviews");
    }
}
