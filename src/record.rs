use serde::Serialize;

/// Sentinel for a scalar field that could not be resolved.
pub const NOT_AVAILABLE: &str = "N/A";

/// Sentinel for a product with no extractable review text.
pub const NO_REVIEWS_FOUND: &str = "No reviews found";

/// Literal delimiter between joined review texts.
pub const REVIEW_DELIMITER: &str = " || ";

/// One scraped product. Every field is always populated: unresolved
/// scalars carry [`NOT_AVAILABLE`], an empty review list carries
/// [`NO_REVIEWS_FOUND`]. Field order matches the CSV header order.
#[derive(Debug, Serialize, Clone)]
pub struct ProductRecord {
    pub product_id: String,
    pub product_title: String,
    pub rating: String,
    pub total_reviews: String,
    pub price: String,
    pub top_reviews: String,
}

impl Default for ProductRecord {
    fn default() -> Self {
        Self {
            product_id: NOT_AVAILABLE.to_string(),
            product_title: NOT_AVAILABLE.to_string(),
            rating: NOT_AVAILABLE.to_string(),
            total_reviews: NOT_AVAILABLE.to_string(),
            price: NOT_AVAILABLE.to_string(),
            top_reviews: NO_REVIEWS_FOUND.to_string(),
        }
    }
}

/// Join review texts with [`REVIEW_DELIMITER`], or the no-reviews sentinel
/// when the list is empty.
pub fn join_reviews(reviews: &[String]) -> String {
    if reviews.is_empty() {
        NO_REVIEWS_FOUND.to_string()
    } else {
        reviews.join(REVIEW_DELIMITER)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn join_reviews_uses_delimiter() {
        let reviews = vec!["Great cooker".to_string(), "Heats evenly".to_string()];
        assert_eq!(join_reviews(&reviews), "Great cooker || Heats evenly");
    }

    #[test]
    fn join_reviews_empty_is_sentinel() {
        assert_eq!(join_reviews(&[]), NO_REVIEWS_FOUND);
    }

    #[test]
    fn default_record_is_fully_populated() {
        let record = ProductRecord::default();
        assert_eq!(record.product_id, NOT_AVAILABLE);
        assert_eq!(record.price, NOT_AVAILABLE);
        assert_eq!(record.top_reviews, NO_REVIEWS_FOUND);
    }
}
