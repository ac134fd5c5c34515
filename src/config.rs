//! Environment-driven configuration with sensible defaults.

use std::env;

#[derive(Debug, Clone)]
pub struct ScraperConfig {
    /// Directory bare output filenames are placed under.
    pub output_dir: String,
    /// Upper bound on candidate entries processed per query.
    pub max_products: usize,
    /// Desired review texts per product.
    pub review_count: usize,
}

impl Default for ScraperConfig {
    fn default() -> Self {
        Self {
            output_dir: "data".to_string(),
            max_products: 1,
            review_count: 2,
        }
    }
}

impl ScraperConfig {
    /// Read configuration from the environment (`OUTPUT_DIR`,
    /// `MAX_PRODUCTS`, `REVIEW_COUNT`), falling back to defaults for
    /// missing or unparsable values.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            output_dir: env::var("OUTPUT_DIR").unwrap_or(defaults.output_dir),
            max_products: env_usize("MAX_PRODUCTS", defaults.max_products),
            review_count: env_usize("REVIEW_COUNT", defaults.review_count),
        }
    }
}

fn env_usize(key: &str, default: usize) -> usize {
    env::var(key).ok().and_then(|value| value.parse().ok()).unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_applied() {
        let config = ScraperConfig::default();
        assert_eq!(config.output_dir, "data");
        assert_eq!(config.max_products, 1);
        assert_eq!(config.review_count, 2);
    }

    #[test]
    fn env_usize_parses_and_falls_back() {
        env::set_var("FLIPKART_CRAWLER_TEST_MAX", "7");
        assert_eq!(env_usize("FLIPKART_CRAWLER_TEST_MAX", 1), 7);

        env::set_var("FLIPKART_CRAWLER_TEST_MAX", "not-a-number");
        assert_eq!(env_usize("FLIPKART_CRAWLER_TEST_MAX", 1), 1);

        assert_eq!(env_usize("FLIPKART_CRAWLER_TEST_UNSET", 3), 3);
    }
}
