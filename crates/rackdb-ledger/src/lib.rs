//! Local SQLite staging ledger.
//!
//! Tracks brand registrations and named catalog snapshots on the way to the
//! remote store: raw scraped data is staged against a brand, parsed into a
//! canonical batch staged as a catalog, and each commit attempt records its
//! terminal state (committed or commit-failed) on the catalog row.

pub mod state;

use std::path::Path;

use chrono::{DateTime, Utc};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use thiserror::Error;

pub use state::CommitState;

#[derive(Debug, Error)]
pub enum LedgerError {
    #[error("no brand registered under alias `{0}`")]
    UnknownBrandAlias(String),

    #[error("no catalog staged under alias `{0}`")]
    UnknownCatalogAlias(String),

    #[error("alias `{0}` is already taken")]
    DuplicateAlias(String),

    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),
}

// ---------------------------------------------------------------------------
// Row types
// ---------------------------------------------------------------------------

/// A row from the `store` table: one registered brand plus the raw payload
/// fetched from its storefront.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct BrandRow {
    pub id: i64,
    pub brand: String,
    /// Unique name for this registration, e.g. `uniqlo_24_06_26`.
    pub alias: String,
    pub comments: Option<String>,
    /// JSON string of the raw vendor payload, as fetched.
    pub raw_data: Option<String>,
    pub time_created: DateTime<Utc>,
}

/// A row from the `catalog` table: one named, parsed snapshot of a brand's
/// products, with its commit lifecycle flags.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct CatalogRow {
    pub id: i64,
    pub store_id: i64,
    pub alias: String,
    pub comments: Option<String>,
    /// JSON string of the serialized canonical product batch.
    pub data: Option<String>,
    pub committed: bool,
    pub error: bool,
    /// Per-record failures from the last commit attempt. Zero for a clean
    /// commit; nonzero rows are still `committed = true`.
    pub failed_records: i64,
    pub error_message: Option<String>,
    pub time_parsed: DateTime<Utc>,
}

impl CatalogRow {
    #[must_use]
    pub fn commit_state(&self) -> CommitState {
        CommitState::from_flags(self.committed, self.error)
    }
}

// ---------------------------------------------------------------------------
// Pool + schema
// ---------------------------------------------------------------------------

/// Opens (and creates if missing) the ledger database at `path` and ensures
/// the schema exists.
///
/// # Errors
///
/// Returns [`LedgerError::Sqlx`] if the file cannot be opened or the schema
/// statements fail.
pub async fn open_ledger(path: &Path) -> Result<SqlitePool, LedgerError> {
    let options = SqliteConnectOptions::new()
        .filename(path)
        .create_if_missing(true)
        .foreign_keys(true);
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect_with(options)
        .await?;
    init_schema(&pool).await?;
    Ok(pool)
}

/// Creates the ledger tables if they do not exist. Idempotent.
///
/// # Errors
///
/// Returns [`LedgerError::Sqlx`] if a DDL statement fails.
pub async fn init_schema(pool: &SqlitePool) -> Result<(), LedgerError> {
    sqlx::query(
        "CREATE TABLE IF NOT EXISTS store ( \
             id            INTEGER PRIMARY KEY AUTOINCREMENT, \
             brand         TEXT NOT NULL, \
             alias         TEXT NOT NULL UNIQUE, \
             comments      TEXT, \
             raw_data      TEXT, \
             time_created  TEXT NOT NULL \
         )",
    )
    .execute(pool)
    .await?;

    sqlx::query(
        "CREATE TABLE IF NOT EXISTS catalog ( \
             id             INTEGER PRIMARY KEY AUTOINCREMENT, \
             store_id       INTEGER NOT NULL REFERENCES store (id) ON DELETE CASCADE, \
             alias          TEXT NOT NULL UNIQUE, \
             comments       TEXT, \
             data           TEXT, \
             committed      INTEGER NOT NULL DEFAULT 0, \
             error          INTEGER NOT NULL DEFAULT 0, \
             failed_records INTEGER NOT NULL DEFAULT 0, \
             error_message  TEXT, \
             time_parsed    TEXT NOT NULL \
         )",
    )
    .execute(pool)
    .await?;

    Ok(())
}

// ---------------------------------------------------------------------------
// store operations
// ---------------------------------------------------------------------------

/// Registers a brand under a unique alias, with the raw payload attached.
///
/// # Errors
///
/// Returns [`LedgerError::DuplicateAlias`] if the alias is taken, or
/// [`LedgerError::Sqlx`] on other failures.
pub async fn add_brand(
    pool: &SqlitePool,
    brand: &str,
    alias: &str,
    comments: Option<&str>,
    raw_data: Option<&str>,
) -> Result<BrandRow, LedgerError> {
    let result = sqlx::query_as::<_, BrandRow>(
        "INSERT INTO store (brand, alias, comments, raw_data, time_created) \
         VALUES (?1, ?2, ?3, ?4, ?5) \
         RETURNING id, brand, alias, comments, raw_data, time_created",
    )
    .bind(brand)
    .bind(alias)
    .bind(comments)
    .bind(raw_data)
    .bind(Utc::now())
    .fetch_one(pool)
    .await;

    result.map_err(|e| dup_alias_or(e, alias))
}

/// Looks up a brand registration by alias.
///
/// # Errors
///
/// Returns [`LedgerError::UnknownBrandAlias`] if absent.
pub async fn get_brand_by_alias(pool: &SqlitePool, alias: &str) -> Result<BrandRow, LedgerError> {
    sqlx::query_as::<_, BrandRow>(
        "SELECT id, brand, alias, comments, raw_data, time_created \
         FROM store WHERE alias = ?1",
    )
    .bind(alias)
    .fetch_optional(pool)
    .await?
    .ok_or_else(|| LedgerError::UnknownBrandAlias(alias.to_string()))
}

/// Looks up a brand registration by its row id (e.g. from
/// [`CatalogRow::store_id`]).
///
/// # Errors
///
/// Returns [`LedgerError::UnknownBrandAlias`] if absent.
pub async fn get_brand_by_id(pool: &SqlitePool, id: i64) -> Result<BrandRow, LedgerError> {
    sqlx::query_as::<_, BrandRow>(
        "SELECT id, brand, alias, comments, raw_data, time_created \
         FROM store WHERE id = ?1",
    )
    .bind(id)
    .fetch_optional(pool)
    .await?
    .ok_or_else(|| LedgerError::UnknownBrandAlias(format!("store id {id}")))
}

/// Returns all brand registrations, oldest first.
///
/// # Errors
///
/// Returns [`LedgerError::Sqlx`] if the query fails.
pub async fn list_brands(pool: &SqlitePool) -> Result<Vec<BrandRow>, LedgerError> {
    let rows = sqlx::query_as::<_, BrandRow>(
        "SELECT id, brand, alias, comments, raw_data, time_created \
         FROM store ORDER BY id",
    )
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

/// Removes a brand registration and every catalog staged from it.
///
/// # Errors
///
/// Returns [`LedgerError::UnknownBrandAlias`] if absent.
pub async fn delete_brand(pool: &SqlitePool, alias: &str) -> Result<(), LedgerError> {
    let brand = get_brand_by_alias(pool, alias).await?;

    let mut tx = pool.begin().await?;
    sqlx::query("DELETE FROM catalog WHERE store_id = ?1")
        .bind(brand.id)
        .execute(&mut *tx)
        .await?;
    sqlx::query("DELETE FROM store WHERE id = ?1")
        .bind(brand.id)
        .execute(&mut *tx)
        .await?;
    tx.commit().await?;
    Ok(())
}

// ---------------------------------------------------------------------------
// catalog operations
// ---------------------------------------------------------------------------

/// Stages a parsed catalog snapshot for the brand registered under
/// `brand_alias`. The new row starts in [`CommitState::Staged`].
///
/// # Errors
///
/// Returns [`LedgerError::UnknownBrandAlias`] if the brand alias is not
/// registered, or [`LedgerError::DuplicateAlias`] if the catalog alias is
/// taken.
pub async fn add_catalog(
    pool: &SqlitePool,
    brand_alias: &str,
    alias: &str,
    comments: Option<&str>,
    data: &str,
) -> Result<CatalogRow, LedgerError> {
    let brand = get_brand_by_alias(pool, brand_alias).await?;

    let result = sqlx::query_as::<_, CatalogRow>(
        "INSERT INTO catalog (store_id, alias, comments, data, time_parsed) \
         VALUES (?1, ?2, ?3, ?4, ?5) \
         RETURNING id, store_id, alias, comments, data, committed, error, \
                   failed_records, error_message, time_parsed",
    )
    .bind(brand.id)
    .bind(alias)
    .bind(comments)
    .bind(data)
    .bind(Utc::now())
    .fetch_one(pool)
    .await;

    result.map_err(|e| dup_alias_or(e, alias))
}

/// Looks up a staged catalog by alias.
///
/// # Errors
///
/// Returns [`LedgerError::UnknownCatalogAlias`] if absent.
pub async fn get_catalog_by_alias(
    pool: &SqlitePool,
    alias: &str,
) -> Result<CatalogRow, LedgerError> {
    sqlx::query_as::<_, CatalogRow>(
        "SELECT id, store_id, alias, comments, data, committed, error, \
                failed_records, error_message, time_parsed \
         FROM catalog WHERE alias = ?1",
    )
    .bind(alias)
    .fetch_optional(pool)
    .await?
    .ok_or_else(|| LedgerError::UnknownCatalogAlias(alias.to_string()))
}

/// Returns all staged catalogs, oldest first.
///
/// # Errors
///
/// Returns [`LedgerError::Sqlx`] if the query fails.
pub async fn list_catalogs(pool: &SqlitePool) -> Result<Vec<CatalogRow>, LedgerError> {
    let rows = sqlx::query_as::<_, CatalogRow>(
        "SELECT id, store_id, alias, comments, data, committed, error, \
                failed_records, error_message, time_parsed \
         FROM catalog ORDER BY id",
    )
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

/// Removes a staged catalog.
///
/// # Errors
///
/// Returns [`LedgerError::UnknownCatalogAlias`] if absent.
pub async fn delete_catalog(pool: &SqlitePool, alias: &str) -> Result<(), LedgerError> {
    let result = sqlx::query("DELETE FROM catalog WHERE alias = ?1")
        .bind(alias)
        .execute(pool)
        .await?;
    if result.rows_affected() == 0 {
        return Err(LedgerError::UnknownCatalogAlias(alias.to_string()));
    }
    Ok(())
}

/// Writes the terminal state of one commit attempt onto the catalog row.
///
/// Re-running a commit simply overwrites the previous terminal state; the
/// reconciliation itself is idempotent, so the latest attempt is the truth.
///
/// # Errors
///
/// Returns [`LedgerError::UnknownCatalogAlias`] if absent.
pub async fn record_commit(
    pool: &SqlitePool,
    alias: &str,
    state: CommitState,
    failed_records: i64,
    error_message: Option<&str>,
) -> Result<(), LedgerError> {
    let (committed, error) = state.flags();
    let result = sqlx::query(
        "UPDATE catalog \
         SET committed = ?1, error = ?2, failed_records = ?3, error_message = ?4 \
         WHERE alias = ?5",
    )
    .bind(committed)
    .bind(error)
    .bind(failed_records)
    .bind(error_message)
    .bind(alias)
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        return Err(LedgerError::UnknownCatalogAlias(alias.to_string()));
    }
    Ok(())
}

fn dup_alias_or(err: sqlx::Error, alias: &str) -> LedgerError {
    match err.as_database_error() {
        Some(db_err) if db_err.is_unique_violation() => {
            LedgerError::DuplicateAlias(alias.to_string())
        }
        _ => LedgerError::Sqlx(err),
    }
}

#[cfg(test)]
#[path = "ledger_test.rs"]
mod tests;
