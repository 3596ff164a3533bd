//! Contract between the reconciliation engine and the persistent catalog
//! store, plus the persisted entity shape.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;
use uuid::Uuid;

use crate::products::CanonicalProduct;

/// A persisted catalog entity: a [`CanonicalProduct`] plus the system fields
/// the store owns.
///
/// `uid` is generated on first insert and never changes afterwards; every
/// later reconciliation of the same `store_product_id` mutates the other
/// fields in place.
#[derive(Debug, Clone)]
pub struct StoredProduct {
    pub uid: Uuid,
    /// Timestamp of the last successful write.
    pub time_scraped: DateTime<Utc>,
    /// True while the item was present in the most recent reconciliation for
    /// its brand. Cleared by the deactivation pass, never by deletion.
    pub active: bool,
    pub product: CanonicalProduct,
}

/// Errors the catalog store can surface to the engine.
///
/// The engine's conflict handling depends on [`StoreError::UniqueViolation`]
/// being distinguishable from every other write error: it is the signal to
/// fall back from insert to update, and must never be conflated with other
/// constraint failures.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The `store_product_id` uniqueness constraint fired on insert.
    #[error("unique constraint violated for store_product_id {store_product_id}")]
    UniqueViolation { store_product_id: String },

    /// A constraint unrelated to uniqueness (check, not-null, foreign key).
    #[error("constraint violated: {0}")]
    Constraint(String),

    /// Connectivity or timeout talking to the store.
    #[error("transport error: {0}")]
    Transport(String),

    #[error("store error: {0}")]
    Other(String),
}

impl StoreError {
    #[must_use]
    pub fn is_unique_violation(&self) -> bool {
        matches!(self, StoreError::UniqueViolation { .. })
    }
}

/// Durable entity storage with a uniqueness constraint on
/// `store_product_id`, enforced by the store rather than by callers.
///
/// One implementation is expected to back production (Postgres); tests use
/// in-memory implementations. Every method is an independent store round
/// trip; implementations must make each call transactional on its own so a
/// failed call never leaves a record half-written.
#[async_trait]
pub trait CatalogStore: Send + Sync {
    /// Atomically sets `active = false` for every entity of `brand`.
    /// Returns the number of entities deactivated.
    async fn deactivate_brand(&self, brand: &str) -> Result<u64, StoreError>;

    /// Inserts a new entity with a freshly generated uid, `active = true`,
    /// and `time_scraped = now`. Returns the new uid.
    ///
    /// Must surface a duplicate `store_product_id` as
    /// [`StoreError::UniqueViolation`] after rolling back the attempt.
    async fn insert_product(&self, product: &CanonicalProduct) -> Result<Uuid, StoreError>;

    /// Looks up an entity by its natural key. Cardinality is 0 or 1 because
    /// the store enforces uniqueness of `store_product_id`.
    async fn find_by_store_product_id(
        &self,
        store_product_id: &str,
    ) -> Result<Option<StoredProduct>, StoreError>;

    /// Overwrites the mutable fields of the entity identified by `uid` with
    /// the values from `product`, sets `active = true`, and refreshes
    /// `time_scraped`. The uid itself never changes.
    async fn update_product(
        &self,
        uid: Uuid,
        product: &CanonicalProduct,
    ) -> Result<(), StoreError>;
}
