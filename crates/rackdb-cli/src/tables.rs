//! `show` handlers: fixed-width listings of the staging ledger.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use sqlx::SqlitePool;

pub(crate) async fn show_stores(ledger: &SqlitePool) -> anyhow::Result<()> {
    let brands = rackdb_ledger::list_brands(ledger).await?;
    if brands.is_empty() {
        println!("no staged stores; run `add store` first");
        return Ok(());
    }

    let header = format!(
        "{:<5}{:<12}{:<21}{:<14}COMMENTS",
        "ID", "BRAND", "FETCHED", "ALIAS"
    );
    println!("{header}");
    for brand in &brands {
        println!(
            "{:<5}{:<12}{:<21}{:<14}{}",
            brand.id,
            brand.brand,
            fmt_time(brand.time_created),
            brand.alias,
            brand.comments.as_deref().unwrap_or("-")
        );
    }

    Ok(())
}

pub(crate) async fn show_catalogs(ledger: &SqlitePool) -> anyhow::Result<()> {
    let catalogs = rackdb_ledger::list_catalogs(ledger).await?;
    if catalogs.is_empty() {
        println!("no parsed catalogs; run `add catalog` first");
        return Ok(());
    }

    let brands: HashMap<i64, String> = rackdb_ledger::list_brands(ledger)
        .await?
        .into_iter()
        .map(|b| (b.id, b.brand))
        .collect();

    let header = format!(
        "{:<5}{:<12}{:<21}{:<14}{:<15}{:<8}ERROR",
        "ID", "BRAND", "PARSED", "ALIAS", "STATE", "FAILED"
    );
    println!("{header}");
    for catalog in &catalogs {
        let brand = brands
            .get(&catalog.store_id)
            .map_or("?", String::as_str);
        println!(
            "{:<5}{:<12}{:<21}{:<14}{:<15}{:<8}{}",
            catalog.id,
            brand,
            fmt_time(catalog.time_parsed),
            catalog.alias,
            catalog.commit_state().as_str(),
            catalog.failed_records,
            catalog.error_message.as_deref().unwrap_or("-")
        );
    }

    Ok(())
}

fn fmt_time(ts: DateTime<Utc>) -> String {
    ts.format("%Y-%m-%d %H:%M").to_string()
}

#[cfg(test)]
mod tests {
    use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};

    use rackdb_ledger::CommitState;

    use super::*;

    async fn memory_ledger() -> SqlitePool {
        let options = SqliteConnectOptions::new()
            .in_memory(true)
            .foreign_keys(true);
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect_with(options)
            .await
            .expect("in-memory sqlite pool");
        rackdb_ledger::init_schema(&pool).await.expect("schema init");
        pool
    }

    #[tokio::test]
    async fn tables_render_on_an_empty_ledger() {
        let ledger = memory_ledger().await;
        show_stores(&ledger).await.expect("show stores failed");
        show_catalogs(&ledger).await.expect("show catalogs failed");
    }

    #[tokio::test]
    async fn catalogs_table_renders_after_a_failed_commit() {
        let ledger = memory_ledger().await;
        rackdb_ledger::add_brand(&ledger, "Uniqlo", "uniqlo_26_08", None, None)
            .await
            .unwrap();
        rackdb_ledger::add_catalog(&ledger, "uniqlo_26_08", "parse1", None, "[]")
            .await
            .unwrap();
        rackdb_ledger::record_commit(
            &ledger,
            "parse1",
            CommitState::CommitFailed,
            0,
            Some("deactivation pass failed for brand Uniqlo: store unreachable"),
        )
        .await
        .unwrap();

        show_catalogs(&ledger).await.expect("show catalogs failed");
    }
}
