//! Catalog reconciliation engine.
//!
//! Takes a validated batch of canonical products for one brand and merges it
//! into a [`rackdb_core::CatalogStore`]: every product in the batch is
//! inserted or updated, every previously-known product for the brand that is
//! absent from the batch is deactivated, and a failure on one record never
//! aborts the rest of the batch.

pub mod outcome;
pub mod reconcile;

pub use outcome::{FailureKind, FatalBatchError, Outcome, RecordFailure};
pub use reconcile::{reconcile, reconcile_with_options, ReconcileOptions};
