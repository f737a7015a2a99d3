use std::fmt;

use crate::command::Command;

/// The validator's answer for one proposed transition.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Verdict {
    /// The transition may be committed.
    Accepted,
    /// The transition must be discarded; the reason is surfaced to the
    /// proposer, who can construct a corrected transition and resubmit.
    Rejected(RejectReason),
}

impl Verdict {
    /// Returns `true` if accepted.
    pub fn is_accepted(&self) -> bool {
        matches!(self, Self::Accepted)
    }

    /// Returns `true` if rejected.
    pub fn is_rejected(&self) -> bool {
        matches!(self, Self::Rejected(_))
    }

    /// The rejection reason, if any.
    pub fn reason(&self) -> Option<&RejectReason> {
        match self {
            Self::Accepted => None,
            Self::Rejected(reason) => Some(reason),
        }
    }
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Accepted => write!(f, "accepted"),
            Self::Rejected(reason) => write!(f, "rejected: {reason}"),
        }
    }
}

/// Malformed transition shape, checked before any business rule.
///
/// Shape violations and business violations are never conflated: a
/// transition that is not even the right shape for its command gets one of
/// these, and the business checks never run.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ShapeViolation {
    /// The command consumes a prior version but none was supplied.
    MissingPriorRecord,
    /// The command takes no prior version but one was supplied.
    UnexpectedPriorRecord,
    /// The candidate does not continue the prior version's lineage.
    RecordIdMismatch,
    /// A field outside the command's write set changed.
    FieldChanged { field: &'static str },
}

impl fmt::Display for ShapeViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingPriorRecord => write!(f, "command requires a prior record version"),
            Self::UnexpectedPriorRecord => write!(f, "command must not consume a prior record"),
            Self::RecordIdMismatch => write!(f, "candidate record id differs from the prior version"),
            Self::FieldChanged { field } => {
                write!(f, "field '{field}' may not change under this command")
            }
        }
    }
}

/// A distinct tag per failed check.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RejectReason {
    /// The transition is malformed; no business rule was evaluated.
    Shape(ShapeViolation),
    /// The command is not handled by the validator it was routed to.
    UnsupportedCommand { command: Command },
    /// The book's ISBN is empty.
    EmptyIsbn,
    /// The book's title is empty.
    EmptyTitle,
    /// The student's number is empty.
    EmptyStudentId,
    /// The declared signers do not cover the candidate's participants.
    NotAllParticipantsSigned,
    /// A borrow was attempted on a book that is already out.
    AlreadyBorrowed,
    /// The command needs a borrowed book (or must leave it borrowed) and
    /// the record is not marked borrowed.
    NotBorrowed,
    /// The candidate holder is not in the entitled set.
    HolderNotEntitled,
    /// The appended request's requester is not in the entitled set.
    RequesterNotEntitled,
    /// Pending requests were not consumed: demand existed but the queue was
    /// left standing (or the record claims otherwise).
    QueueNotDrained,
    /// The record claims a direct hand-over but no request was queued.
    NoQueuedRequest,
    /// The new queue is not the old queue with exactly one entry appended.
    QueueNotAppendOnly,
    /// The appended requester is already queued for this book.
    DuplicateRequester,
    /// `is_borrowed` does not match the holder/owner relation.
    BorrowedFlagMismatch,
    /// `participants` does not equal `{owner} ∪ entitled_parties`.
    ParticipantsMismatch,
}

impl fmt::Display for RejectReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Shape(violation) => write!(f, "shape error: {violation}"),
            Self::UnsupportedCommand { command } => {
                write!(f, "unsupported command '{command}'")
            }
            Self::EmptyIsbn => write!(f, "the book's ISBN must not be empty"),
            Self::EmptyTitle => write!(f, "the book's title must not be empty"),
            Self::EmptyStudentId => write!(f, "the student's number must not be empty"),
            Self::NotAllParticipantsSigned => {
                write!(f, "all of the participants must be signers")
            }
            Self::AlreadyBorrowed => write!(f, "the book is already borrowed"),
            Self::NotBorrowed => write!(f, "the book is not marked borrowed"),
            Self::HolderNotEntitled => write!(f, "the holder must be in the entitled list"),
            Self::RequesterNotEntitled => write!(f, "the requester must be in the entitled list"),
            Self::QueueNotDrained => {
                write!(f, "pending requests must be consumed by this transition")
            }
            Self::NoQueuedRequest => {
                write!(f, "no queued request exists to hand the book over to")
            }
            Self::QueueNotAppendOnly => {
                write!(f, "the queue must equal the old queue plus one appended entry")
            }
            Self::DuplicateRequester => {
                write!(f, "the requester is already queued for this book")
            }
            Self::BorrowedFlagMismatch => {
                write!(f, "the borrowed flag must match the holder/owner relation")
            }
            Self::ParticipantsMismatch => {
                write!(f, "participants must equal the owner plus the entitled parties")
            }
        }
    }
}
