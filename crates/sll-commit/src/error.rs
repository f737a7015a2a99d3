use sll_model::ModelError;
use sll_validate::RejectReason;

/// Errors produced by commit operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CommitError {
    /// The validator refused the transition; nothing was persisted.
    #[error("transition rejected: {0}")]
    Rejected(RejectReason),

    /// The proposal was built against a stale version of the record.
    #[error("version conflict: proposal expected version {expected}, current is {current}")]
    Conflict { expected: u64, current: u64 },

    /// A proposal builder could not construct a legal candidate.
    #[error("invalid proposal: {0}")]
    Proposal(#[from] ModelError),

    #[error("book record not found")]
    RecordNotFound,

    #[error("student record not found")]
    StudentNotFound,

    #[error("student number '{0}' is already registered by this school")]
    DuplicateStudent(String),

    #[error("integrity violation at version {version}: {reason}")]
    IntegrityViolation { version: u64, reason: String },

    #[error("serialization error: {0}")]
    Serialization(String),

    #[error("commit store lock poisoned")]
    LockPoisoned,
}
