use std::collections::BTreeSet;

use sll_model::{BookRecord, StudentRecord};
use sll_types::{PartyId, RecordId, StudentId};

use crate::error::CommitError;
use crate::transition::{CommittedVersion, Transition};

/// Read boundary over committed ledger state.
pub trait LedgerReader: Send + Sync {
    /// The most recently committed record version, absent if never created.
    fn current(&self, id: &RecordId) -> Result<Option<BookRecord>, CommitError>;

    /// The head of the version history with its commit metadata.
    fn head(&self, id: &RecordId) -> Result<Option<CommittedVersion>, CommitError>;

    /// The full version history, oldest first.
    fn history(&self, id: &RecordId) -> Result<Vec<CommittedVersion>, CommitError>;

    /// All record lineages known to the ledger.
    fn record_ids(&self) -> Result<Vec<RecordId>, CommitError>;

    /// Resolve a registered student, absent if unknown.
    fn student(&self, id: &StudentId) -> Result<Option<StudentRecord>, CommitError>;
}

/// Write boundary: the only path by which state enters the ledger.
///
/// Implementations must serialize transitions against the same record id,
/// validate before persisting, and persist nothing on a rejection.
pub trait LedgerCommit: Send + Sync {
    /// Validate and commit one transition, superseding the prior version.
    fn commit(&self, transition: &Transition) -> Result<CommittedVersion, CommitError>;

    /// Validate and store a student registration.
    fn register_student(
        &self,
        student: &StudentRecord,
        signers: &BTreeSet<PartyId>,
    ) -> Result<(), CommitError>;
}
