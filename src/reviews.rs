//! Review extraction.
//!
//! Flipkart's review container classes churn across page variants, so
//! extraction is two-tier: known container selectors first, then a
//! structure-agnostic scan of long text blocks. Length thresholds filter
//! out short labels and button text; exact-string dedup keeps repeated
//! blocks (the same review rendered twice) out of the output.

use std::collections::HashSet;
use std::sync::Arc;

use headless_chrome::Tab;
use scraper::{ElementRef, Html, Selector};
use tracing::{debug, warn};

use crate::record::{join_reviews, NO_REVIEWS_FOUND};
use crate::stealth;

/// Known review container classes, tried as alternatives in one query.
pub const KNOWN_REVIEW_CONTAINERS: &str =
    "div._27M-vq, div.col.EPCmJX, div._6K-7Co, div.t-ZTKy, div.qwjRop";

/// Minimum text length (chars, exclusive) for a known-container block.
pub const MIN_CONTAINER_LEN: usize = 20;

/// Minimum text length (chars, exclusive) for a generic fallback block.
pub const MIN_FALLBACK_LEN: usize = 80;

/// Visible text of an element, whitespace-collapsed and trimmed.
pub fn normalized_text(element: &ElementRef) -> String {
    element
        .text()
        .flat_map(str::split_whitespace)
        .collect::<Vec<_>>()
        .join(" ")
}

/// Extract up to `desired` deduplicated review-like text blocks from
/// rendered page HTML. An empty result is a valid outcome meaning
/// "no reviews found".
pub fn review_texts(html: &str, desired: usize) -> Vec<String> {
    if desired == 0 {
        return Vec::new();
    }

    let document = Html::parse_document(html);
    let mut reviews = Vec::new();
    let mut seen: HashSet<String> = HashSet::new();

    let container_selector = Selector::parse(KNOWN_REVIEW_CONTAINERS).unwrap();
    for block in document.select(&container_selector) {
        let text = normalized_text(&block);
        if text.chars().count() > MIN_CONTAINER_LEN && seen.insert(text.clone()) {
            reviews.push(text);
        }
        if reviews.len() >= desired {
            return reviews;
        }
    }

    // Fallback: long text blocks anywhere on the page, in document order.
    let block_selector = Selector::parse("p, div").unwrap();
    for block in document.select(&block_selector) {
        if reviews.len() >= desired {
            break;
        }
        let text = normalized_text(&block);
        if text.chars().count() > MIN_FALLBACK_LEN && seen.insert(text.clone()) {
            reviews.push(text);
        }
    }

    reviews
}

/// Collect the top reviews from an open detail tab and join them into the
/// output string. A malformed (non-HTTP) product URL short-circuits with
/// the no-reviews sentinel.
pub async fn top_reviews(tab: &Arc<Tab>, product_url: &str, desired: usize) -> String {
    if !product_url.starts_with("http") {
        return NO_REVIEWS_FOUND.to_string();
    }

    // Review blocks load lazily as the page scrolls.
    if let Err(err) = stealth::scroll_to_page_end(tab, 4).await {
        debug!(error = %err, "scroll before review extraction failed");
    }

    let html = match tab.get_content() {
        Ok(html) => html,
        Err(err) => {
            warn!(error = %err, "could not read product page content for reviews");
            return NO_REVIEWS_FOUND.to_string();
        }
    };

    let reviews = review_texts(&html, desired);
    debug!(count = reviews.len(), "collected review blocks");
    join_reviews(&reviews)
}

#[cfg(test)]
mod tests {
    use super::*;

    const REVIEW_PAGE: &str = r#"
        <html><body>
            <div class="_27M-vq">Excellent cooker, the steel is thick and it whistles on time.</div>
            <div class="t-ZTKy">Good value for money, been using it daily for two months now.</div>
            <div class="_27M-vq">Excellent cooker, the steel is thick and it whistles on time.</div>
            <div class="_27M-vq">Too short</div>
        </body></html>
    "#;

    #[test]
    fn known_containers_are_collected_in_order() {
        let reviews = review_texts(REVIEW_PAGE, 2);
        assert_eq!(
            reviews,
            vec![
                "Excellent cooker, the steel is thick and it whistles on time.".to_string(),
                "Good value for money, been using it daily for two months now.".to_string(),
            ]
        );
    }

    #[test]
    fn duplicates_and_short_blocks_are_rejected() {
        let reviews = review_texts(REVIEW_PAGE, 5);
        assert_eq!(reviews.len(), 2);
        let unique: HashSet<_> = reviews.iter().collect();
        assert_eq!(unique.len(), reviews.len());
        for review in &reviews {
            assert!(review.chars().count() > MIN_CONTAINER_LEN);
        }
    }

    #[test]
    fn result_is_bounded_by_desired_count() {
        assert_eq!(review_texts(REVIEW_PAGE, 1).len(), 1);
        assert!(review_texts(REVIEW_PAGE, 0).is_empty());
    }

    #[test]
    fn fallback_scans_long_generic_blocks() {
        let html = r#"
            <html><body>
                <p>Buy now</p>
                <p>This pressure cooker changed how I plan weeknight dinners; rice and lentils come
                   out perfectly every single time and cleanup takes under a minute.</p>
            </body></html>
        "#;
        let reviews = review_texts(html, 2);
        assert_eq!(reviews.len(), 1);
        assert!(reviews[0].starts_with("This pressure cooker"));
        assert!(reviews[0].chars().count() > MIN_FALLBACK_LEN);
    }

    #[test]
    fn page_without_reviews_yields_empty_list() {
        let html = "<html><body><p>Cart</p><div>Login</div></body></html>";
        assert!(review_texts(html, 2).is_empty());
    }

    #[test]
    fn text_is_whitespace_collapsed() {
        let html = r#"
            <html><body>
                <div class="qwjRop">Sturdy   base,
                    even   heating <span>and the lid</span>   seals well after months of use.</div>
            </body></html>
        "#;
        let reviews = review_texts(html, 1);
        assert_eq!(
            reviews[0],
            "Sturdy base, even heating and the lid seals well after months of use."
        );
    }
}
