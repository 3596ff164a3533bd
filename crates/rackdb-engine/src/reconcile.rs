//! The deactivate-then-upsert reconciliation pass.

use std::time::Instant;

use rackdb_core::{CanonicalProduct, CatalogStore, StoreError};

use crate::outcome::{FailureKind, FatalBatchError, Outcome, RecordFailure};

/// Knobs for one reconciliation invocation.
#[derive(Debug, Clone, Copy, Default)]
pub struct ReconcileOptions {
    /// When set and passed, no new per-record transaction is issued; the
    /// record currently in flight completes or rolls back normally. Skipped
    /// records are counted in [`Outcome::unattempted`].
    pub deadline: Option<Instant>,
}

/// Reconciles `products` against the persistent catalog for `brand`.
///
/// Runs the deactivation pass first (always, including for an empty batch;
/// that is how disappeared listings become inactive without being deleted),
/// then upserts each record in input order. Each record is an independent
/// store transaction: a failure is recorded in the [`Outcome`] and the batch
/// continues. A duplicate `store_product_id` within one batch issues one
/// write per occurrence, last write wins.
///
/// The whole operation is idempotent: re-applying the same batch converges
/// to the same end state, which is also the recovery path after a crash
/// mid-batch.
///
/// # Errors
///
/// Returns [`FatalBatchError`] if the deactivation pass fails; no upserts
/// are attempted in that case. Per-record failures are not errors.
pub async fn reconcile<S: CatalogStore + ?Sized>(
    store: &S,
    brand: &str,
    products: &[CanonicalProduct],
) -> Result<Outcome, FatalBatchError> {
    reconcile_with_options(store, brand, products, ReconcileOptions::default()).await
}

/// [`reconcile`] with an explicit [`ReconcileOptions`].
///
/// # Errors
///
/// Returns [`FatalBatchError`] if the deactivation pass fails.
pub async fn reconcile_with_options<S: CatalogStore + ?Sized>(
    store: &S,
    brand: &str,
    products: &[CanonicalProduct],
    options: ReconcileOptions,
) -> Result<Outcome, FatalBatchError> {
    let deactivated = store
        .deactivate_brand(brand)
        .await
        .map_err(|source| FatalBatchError {
            brand: brand.to_string(),
            source,
        })?;

    tracing::debug!(brand, deactivated, batch = products.len(), "deactivation pass complete");

    let mut outcome = Outcome::default();

    for (index, product) in products.iter().enumerate() {
        if let Some(deadline) = options.deadline {
            if Instant::now() >= deadline {
                let remaining = products.len() - index;
                outcome.unattempted = u32::try_from(remaining).unwrap_or(u32::MAX);
                tracing::warn!(
                    brand,
                    remaining,
                    "deadline reached, stopping before next record"
                );
                break;
            }
        }

        match upsert_record(store, product).await {
            Ok(()) => outcome.committed += 1,
            Err(failure) => {
                tracing::warn!(
                    brand,
                    store_product_id = %failure.store_product_id,
                    kind = failure.kind.as_str(),
                    error = %failure.message,
                    "record upsert failed, continuing batch"
                );
                outcome.failures.push(failure);
            }
        }
    }

    tracing::debug!(
        brand,
        committed = outcome.committed,
        failed = outcome.failures.len(),
        unattempted = outcome.unattempted,
        "reconciliation complete"
    );

    Ok(outcome)
}

/// Upserts one record: insert, and on a uniqueness violation fall back to
/// lookup-by-natural-key plus in-place update. The insert and the update run
/// in separate store transactions so the rollback of the failed insert never
/// drags the update down with it.
async fn upsert_record<S: CatalogStore + ?Sized>(
    store: &S,
    product: &CanonicalProduct,
) -> Result<(), RecordFailure> {
    match store.insert_product(product).await {
        Ok(_uid) => Ok(()),
        Err(err) if err.is_unique_violation() => update_existing(store, product).await,
        Err(err) => Err(record_failure(product, &err)),
    }
}

async fn update_existing<S: CatalogStore + ?Sized>(
    store: &S,
    product: &CanonicalProduct,
) -> Result<(), RecordFailure> {
    let existing = store
        .find_by_store_product_id(&product.store_product_id)
        .await
        .map_err(|err| record_failure(product, &err))?;

    let Some(existing) = existing else {
        // The row that caused the violation vanished between the insert and
        // the lookup. Surfaced as a conflict; a re-run will insert it.
        return Err(RecordFailure {
            store_product_id: product.store_product_id.clone(),
            kind: FailureKind::Conflict,
            message: "conflicting row disappeared before update".to_string(),
        });
    };

    store
        .update_product(existing.uid, product)
        .await
        .map_err(|err| record_failure(product, &err))
}

fn record_failure(product: &CanonicalProduct, err: &StoreError) -> RecordFailure {
    RecordFailure {
        store_product_id: product.store_product_id.clone(),
        kind: FailureKind::from_store_error(err),
        message: err.to_string(),
    }
}

#[cfg(test)]
#[path = "reconcile_test.rs"]
mod tests;
