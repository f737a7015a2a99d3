use sll_types::PartyId;
use thiserror::Error;

/// Errors produced when constructing or checking a record.
///
/// These are programmer-facing structural errors. Untrusted candidates that
/// reach the transition validator over the wire are rejected with a verdict
/// instead, but the validator maps these same violations onto its reasons.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ModelError {
    #[error("book title must not be empty")]
    EmptyTitle,

    #[error("book ISBN must not be empty")]
    EmptyIsbn,

    #[error("student id must not be empty")]
    EmptyStudentId,

    #[error("borrowed flag does not match holder/owner relation")]
    BorrowedFlagMismatch,

    #[error("holder {0} is neither the owner nor an entitled party")]
    HolderNotEntitled(PartyId),

    #[error("requester {0} is not an entitled party")]
    RequesterNotEntitled(PartyId),

    #[error("requester {0} is already queued for this book")]
    DuplicateRequester(PartyId),

    #[error("queued request targets a different book")]
    RequestBookMismatch,

    #[error("participants set does not equal owner plus entitled parties")]
    ParticipantsMismatch,

    #[error("the owner cannot borrow its own book")]
    HolderIsOwner,

    #[error("no queued request to hand the book over to")]
    NoQueuedRequest,
}
