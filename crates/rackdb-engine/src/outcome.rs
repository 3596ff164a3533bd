//! Structured results of one reconciliation invocation.

use rackdb_core::StoreError;
use thiserror::Error;

/// Why a single record's upsert failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    /// Insert hit the uniqueness constraint but the follow-up lookup or
    /// update failed too (includes the lookup finding no row).
    Conflict,
    /// A constraint unrelated to uniqueness fired on this record.
    ConstraintViolation,
    /// Connectivity or timeout during this record's transaction.
    Transport,
    Unknown,
}

impl FailureKind {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            FailureKind::Conflict => "conflict",
            FailureKind::ConstraintViolation => "constraint_violation",
            FailureKind::Transport => "transport",
            FailureKind::Unknown => "unknown",
        }
    }

    pub(crate) fn from_store_error(err: &StoreError) -> Self {
        match err {
            StoreError::UniqueViolation { .. } => FailureKind::Conflict,
            StoreError::Constraint(_) => FailureKind::ConstraintViolation,
            StoreError::Transport(_) => FailureKind::Transport,
            StoreError::Other(_) => FailureKind::Unknown,
        }
    }
}

/// One record that could not be written, tagged with its natural key.
#[derive(Debug, Clone)]
pub struct RecordFailure {
    pub store_product_id: String,
    pub kind: FailureKind,
    pub message: String,
}

/// Aggregate result of one [`crate::reconcile`] call.
///
/// A non-empty `failures` list is still a caller-visible success; it is the
/// caller's job to decide whether partial failure should change its own
/// terminal state.
#[derive(Debug, Clone, Default)]
pub struct Outcome {
    /// Records successfully written (inserted + updated).
    pub committed: u32,
    pub failures: Vec<RecordFailure>,
    /// Records never attempted because the deadline fired first. Zero in the
    /// normal path; the batch converges on re-run either way.
    pub unattempted: u32,
}

impl Outcome {
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty() && self.unattempted == 0
    }
}

/// The deactivation pass failed: nothing about the brand's catalog is safely
/// reconcilable, so no upserts were attempted and the caller must not mark
/// the commit successful.
#[derive(Debug, Error)]
#[error("deactivation pass failed for brand {brand}: {source}")]
pub struct FatalBatchError {
    pub brand: String,
    #[source]
    pub source: StoreError,
}
