//! `commit catalog` handler: run the reconciliation engine for one staged
//! catalog and write the terminal state back onto its ledger row.

use anyhow::Context;
use sqlx::SqlitePool;

use rackdb_core::{AppConfig, CanonicalProduct};
use rackdb_db::{PgCatalogStore, PoolConfig};
use rackdb_ledger::CommitState;

pub(crate) async fn commit_catalog(
    ledger: &SqlitePool,
    config: &AppConfig,
    alias: &str,
    migrate: bool,
) -> anyhow::Result<()> {
    let catalog = rackdb_ledger::get_catalog_by_alias(ledger, alias).await?;
    let brand_row = rackdb_ledger::get_brand_by_id(ledger, catalog.store_id).await?;

    let data = catalog
        .data
        .as_deref()
        .with_context(|| format!("catalog `{alias}` has no staged product data"))?;
    let products: Vec<CanonicalProduct> =
        serde_json::from_str(data).context("staged catalog data is not a canonical batch")?;

    let pool = rackdb_db::connect_pool(&config.database_url, PoolConfig::from_app_config(config))
        .await
        .context("failed to connect to the remote store")?;
    rackdb_db::ping(&pool)
        .await
        .context("remote store did not answer a health check")?;
    if migrate {
        rackdb_db::run_migrations(&pool).await?;
        println!("remote schema is up to date");
    }

    let store = PgCatalogStore::new(pool);

    tracing::info!(
        brand = %brand_row.brand,
        alias,
        batch = products.len(),
        "reconciling staged catalog"
    );
    let result = rackdb_engine::reconcile(&store, &brand_row.brand, &products).await;

    let state = CommitState::from_commit_result(&result);
    match &result {
        Ok(outcome) => {
            let failed = i64::try_from(outcome.failures.len()).unwrap_or(i64::MAX);
            rackdb_ledger::record_commit(ledger, alias, state, failed, ledger_message(outcome))
                .await?;

            println!(
                "committed `{alias}`: {} written, {} failed, {} unattempted",
                outcome.committed,
                outcome.failures.len(),
                outcome.unattempted
            );
            for failure in &outcome.failures {
                eprintln!(
                    "  failed {} ({}): {}",
                    failure.store_product_id,
                    failure.kind.as_str(),
                    failure.message
                );
            }
        }
        Err(fatal) => {
            let message = fatal.to_string();
            rackdb_ledger::record_commit(ledger, alias, state, 0, Some(&message)).await?;
            eprintln!("commit of `{alias}` failed: {message}");
        }
    }

    // Surface the fatal error after the ledger has the terminal state.
    result.map(|_| ()).map_err(anyhow::Error::from)
}

/// Error message persisted on the catalog row for a partially-failed commit:
/// the most recent per-record failure, or nothing for a clean batch.
fn ledger_message(outcome: &rackdb_engine::Outcome) -> Option<&str> {
    outcome.failures.last().map(|f| f.message.as_str())
}
