mod browser;
mod cascade;
mod config;
mod detail;
mod export;
mod record;
mod reviews;
mod search;
mod stealth;

use anyhow::Result;
use dotenv::dotenv;
use std::env;
use tracing::info;

#[tokio::main]
async fn main() -> Result<()> {
    dotenv().ok();
    tracing_subscriber::fmt::init();

    let config = config::ScraperConfig::from_env();
    let query = env::args()
        .nth(1)
        .or_else(|| env::var("SEARCH_QUERY").ok())
        .unwrap_or_else(|| "Cooker".to_string());
    let output_file =
        env::var("OUTPUT_FILE").unwrap_or_else(|_| "product_reviews.csv".to_string());

    info!(%query, max_products = config.max_products, review_count = config.review_count, "starting scrape");

    let scraper = search::FlipkartScraper::launch()?;
    let records = scraper
        .scrape(&query, config.max_products, config.review_count)
        .await?;
    info!(count = records.len(), "scrape complete");

    export::save_to_csv(&records, &config.output_dir, &output_file)?;

    Ok(())
}
