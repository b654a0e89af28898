//! Query a running vismatch server and filter results for display.
//!
//! The server always returns the top matches unfiltered; the similarity
//! threshold shown to users is applied here, on the client.
//!
//! ```text
//! cargo run -p vismatch-server --example api_client -- https://example.com/shoe.jpg 0.75
//! ```

use reqwest::Client;
use serde::Deserialize;
use serde_json::json;
use vismatch::{DisplayThreshold, ScoredResult};

const SERVER_URL: &str = "http://localhost:8080";

#[derive(Debug, Deserialize)]
struct MatchResponse {
    catalog_version: u64,
    total: usize,
    results: Vec<ScoredResult>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let mut args = std::env::args().skip(1);
    let image_url = args
        .next()
        .unwrap_or_else(|| "https://example.com/images/red_shoe.jpg".to_string());
    let threshold = match args.next() {
        Some(raw) => DisplayThreshold::new(raw.parse()?)?,
        None => DisplayThreshold::default(),
    };

    let client = Client::new();

    println!("1. Health Check:");
    let resp = client.get(format!("{SERVER_URL}/health")).send().await?;
    println!("Status: {}", resp.status());
    println!("Body: {}", resp.text().await?);
    println!();

    println!("2. Catalog Stats:");
    let resp = client
        .get(format!("{SERVER_URL}/api/v1/catalog/stats"))
        .send()
        .await?;
    println!("Body: {}", resp.text().await?);
    println!();

    println!("3. Match {image_url}:");
    let resp = client
        .post(format!("{SERVER_URL}/api/v1/match"))
        .json(&json!({ "image_url": image_url, "limit": 20 }))
        .send()
        .await?;
    if !resp.status().is_success() {
        println!("Status: {}", resp.status());
        println!("Body: {}", resp.text().await?);
        return Ok(());
    }
    let matches: MatchResponse = resp.json().await?;
    println!(
        "catalog v{}: {} results, showing those scoring at least {:.2}",
        matches.catalog_version,
        matches.total,
        threshold.value()
    );
    for result in threshold.apply(&matches.results) {
        let product = result.product();
        println!(
            "  #{:<3} {:.3}  {} ({}) {}",
            result.rank(),
            result.score(),
            product.name,
            product.category,
            product.image
        );
    }

    Ok(())
}
