//! `add store` / `add catalog` handlers: fetch raw vendor data into the
//! ledger, then parse staged raw data into canonical catalog snapshots.

use anyhow::Context;
use sqlx::SqlitePool;

use rackdb_core::AppConfig;
use rackdb_scraper::{AdapterRegistry, FetchOptions, RawCatalog};

/// Fetches `brand`'s current listings through its registered adapter and
/// stages the raw payload under `alias`.
pub(crate) async fn add_store(
    ledger: &SqlitePool,
    config: &AppConfig,
    brand: &str,
    alias: &str,
    comments: Option<&str>,
) -> anyhow::Result<()> {
    let registry = AdapterRegistry::builtin();
    let adapter = registry.get(brand)?;

    let client = reqwest::Client::builder()
        .timeout(std::time::Duration::from_secs(
            config.scraper_request_timeout_secs,
        ))
        .user_agent(&config.scraper_user_agent)
        .build()
        .context("failed to build HTTP client")?;

    let options = FetchOptions {
        inter_request_delay_ms: config.scraper_inter_request_delay_ms,
        max_retries: config.scraper_max_retries,
        backoff_base_secs: config.scraper_retry_backoff_base_secs,
    };

    tracing::info!(brand, alias, "fetching raw listings");
    let raw = adapter
        .fetch(&client, options)
        .await
        .with_context(|| format!("failed to fetch listings for {brand}"))?;

    let raw_json = serde_json::to_string(&raw)?;
    rackdb_ledger::add_brand(ledger, brand, alias, comments, Some(&raw_json)).await?;

    println!(
        "staged {} raw items for {brand} as `{alias}`",
        raw.item_count()
    );
    Ok(())
}

/// Parses the raw payload staged under `store_alias` into canonical products
/// and stages the batch as a catalog under `alias`.
pub(crate) async fn add_catalog(
    ledger: &SqlitePool,
    store_alias: &str,
    alias: &str,
    comments: Option<&str>,
) -> anyhow::Result<()> {
    let brand_row = rackdb_ledger::get_brand_by_alias(ledger, store_alias).await?;
    let raw_json = brand_row
        .raw_data
        .as_deref()
        .with_context(|| format!("store `{store_alias}` has no staged raw data"))?;
    let raw: RawCatalog =
        serde_json::from_str(raw_json).context("staged raw data is not a valid raw catalog")?;

    let registry = AdapterRegistry::builtin();
    let adapter = registry.get(&brand_row.brand)?;

    let products = adapter
        .parse(&raw)
        .with_context(|| format!("failed to parse staged data for {}", brand_row.brand))?;

    let data = serde_json::to_string(&products)?;
    rackdb_ledger::add_catalog(ledger, store_alias, alias, comments, &data).await?;

    println!(
        "staged catalog `{alias}` with {} products for {}",
        products.len(),
        brand_row.brand
    );
    Ok(())
}
