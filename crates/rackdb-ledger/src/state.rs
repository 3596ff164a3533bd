//! The commit lifecycle of a staged catalog.

use rackdb_engine::{FatalBatchError, Outcome};

/// Terminal-state machine for one staged catalog:
/// `Staged → Committed | CommitFailed`.
///
/// An [`Outcome`] with per-record failures still counts as `Committed`: the
/// deactivation pass and the surviving records landed, and the failure count
/// is persisted alongside so partial failure stays visible. Only a fatal
/// engine error (deactivation or transport failure before any upsert) yields
/// `CommitFailed`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommitState {
    Staged,
    Committed,
    CommitFailed,
}

impl CommitState {
    /// Decides the terminal state from one engine invocation.
    #[must_use]
    pub fn from_commit_result(result: &Result<Outcome, FatalBatchError>) -> Self {
        match result {
            Ok(_) => CommitState::Committed,
            Err(_) => CommitState::CommitFailed,
        }
    }

    /// Reconstructs the state from the persisted `(committed, error)` flags.
    #[must_use]
    pub fn from_flags(committed: bool, error: bool) -> Self {
        match (committed, error) {
            (true, _) => CommitState::Committed,
            (false, true) => CommitState::CommitFailed,
            (false, false) => CommitState::Staged,
        }
    }

    /// The `(committed, error)` flag pair this state persists as.
    #[must_use]
    pub fn flags(self) -> (bool, bool) {
        match self {
            CommitState::Staged => (false, false),
            CommitState::Committed => (true, false),
            CommitState::CommitFailed => (false, true),
        }
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            CommitState::Staged => "staged",
            CommitState::Committed => "committed",
            CommitState::CommitFailed => "commit-failed",
        }
    }
}
