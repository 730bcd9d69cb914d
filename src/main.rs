// src/main.rs

use order_extract::{ExtractorConfig, cancel_flag, extract_file};
use std::path::Path;
use tracing::info;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // init tracing
    tracing_subscriber::fmt()
        .with_target(true)
        .with_level(true)
        .with_env_filter("info")
        .init();

    let mut args = std::env::args().skip(1);
    let Some(input) = args.next() else {
        eprintln!("usage: order_extract <order file> [config.toml]");
        std::process::exit(2);
    };
    let config = match args.next() {
        Some(path) => ExtractorConfig::load(path)?,
        None => ExtractorConfig::default(),
    };

    let cancel = cancel_flag();
    let order = extract_file(Path::new(&input), &config, &cancel).await?;

    if let Some(ref quality) = order.quality {
        info!(
            items = quality.items_count,
            items_priced = quality.items_with_unit_price,
            coverage = format!("{:.2}", quality.header_field_coverage),
            "extraction quality"
        );
    }
    println!("{}", serde_json::to_string_pretty(&order)?);

    Ok(())
}
