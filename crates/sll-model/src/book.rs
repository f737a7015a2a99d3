use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use sll_types::{PartyId, RecordId, StudentId, Timestamp};

use crate::error::ModelError;
use crate::request::BorrowRequest;

/// One versioned snapshot of a book's lending state.
///
/// Invariants that hold in every committed record:
/// 1. `is_borrowed == (holder != owner)`
/// 2. `holder ∈ entitled_parties ∪ {owner}`
/// 3. every queued request's `requester ∈ entitled_parties`
/// 4. `isbn` and `title` are non-empty
/// 5. `participants == {owner} ∪ entitled_parties`
///
/// The constructor and the functional-update builders uphold these by
/// construction. Deserialized candidates can violate them, which is why the
/// transition validator re-checks via [`BookRecord::verify_invariants`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookRecord {
    /// Stable identifier, preserved across all versions.
    pub id: RecordId,
    pub title: String,
    pub author: String,
    pub isbn: String,
    /// The party holding ultimate custodial rights.
    pub owner: PartyId,
    /// The party currently possessing the book; equals `owner` when idle.
    pub holder: PartyId,
    pub is_borrowed: bool,
    /// When the current borrow started; `None` while the book is idle.
    pub borrow_date: Option<Timestamp>,
    /// Parties permitted to ever hold or queue for this book.
    pub entitled_parties: BTreeSet<PartyId>,
    /// FIFO queue of pending borrow requests, insertion order.
    pub request_queue: Vec<BorrowRequest>,
    /// Parties that must co-sign any transition. Always the derived set
    /// `{owner} ∪ entitled_parties`, never maintained independently.
    pub participants: BTreeSet<PartyId>,
}

impl BookRecord {
    /// Construct the initial (idle, unqueued) version of a book record.
    pub fn new(
        id: RecordId,
        title: impl Into<String>,
        author: impl Into<String>,
        isbn: impl Into<String>,
        owner: PartyId,
        entitled_parties: BTreeSet<PartyId>,
    ) -> Result<Self, ModelError> {
        let title = title.into();
        let isbn = isbn.into();
        if title.trim().is_empty() {
            return Err(ModelError::EmptyTitle);
        }
        if isbn.trim().is_empty() {
            return Err(ModelError::EmptyIsbn);
        }

        let participants = Self::derive_participants(&owner, &entitled_parties);
        Ok(Self {
            id,
            title,
            author: author.into(),
            isbn,
            owner,
            holder: owner,
            is_borrowed: false,
            borrow_date: None,
            entitled_parties,
            request_queue: Vec::new(),
            participants,
        })
    }

    /// Recompute the co-signing set from `owner` and `entitled_parties`.
    ///
    /// Used whenever either input changes; `participants` must always equal
    /// this union (invariant 5).
    pub fn derive_participants(
        owner: &PartyId,
        entitled_parties: &BTreeSet<PartyId>,
    ) -> BTreeSet<PartyId> {
        let mut participants = entitled_parties.clone();
        participants.insert(*owner);
        participants
    }

    /// The next version after the book is borrowed by `borrower`.
    ///
    /// The queue is drained: a successful borrow consumes the pending
    /// requests (the borrower is whoever the counterparties agreed to sign
    /// for, not necessarily the queue head).
    pub fn borrowed_by(&self, borrower: PartyId, at: Timestamp) -> Result<Self, ModelError> {
        if borrower == self.owner {
            return Err(ModelError::HolderIsOwner);
        }
        if !self.entitled_parties.contains(&borrower) {
            return Err(ModelError::HolderNotEntitled(borrower));
        }

        let mut next = self.clone();
        next.holder = borrower;
        next.is_borrowed = true;
        next.borrow_date = Some(at);
        next.request_queue = Vec::new();
        Ok(next)
    }

    /// The next version after the book is returned to its owner.
    ///
    /// Only legal when no requests are queued; the validator enforces that.
    pub fn returned(&self) -> Self {
        let mut next = self.clone();
        next.holder = next.owner;
        next.is_borrowed = false;
        next.borrow_date = None;
        next
    }

    /// The next version after a return hands the book directly to the
    /// head-of-queue requester, skipping the idle state.
    pub fn handed_over(&self, at: Timestamp) -> Result<Self, ModelError> {
        let head = self
            .request_queue
            .first()
            .ok_or(ModelError::NoQueuedRequest)?;

        let mut next = self.clone();
        next.holder = head.requester;
        next.is_borrowed = true;
        next.borrow_date = Some(at);
        next.request_queue = Vec::new();
        Ok(next)
    }

    /// The next version with one borrow request appended to the queue.
    pub fn with_request(
        &self,
        requester: PartyId,
        student_id: StudentId,
        at: Timestamp,
    ) -> Result<Self, ModelError> {
        if !self.entitled_parties.contains(&requester) {
            return Err(ModelError::RequesterNotEntitled(requester));
        }
        if self.request_queue.iter().any(|r| r.requester == requester) {
            return Err(ModelError::DuplicateRequester(requester));
        }

        let mut next = self.clone();
        next.request_queue
            .push(BorrowRequest::new(self.id, requester, student_id, at));
        Ok(next)
    }

    /// Check invariants 1–5 against this snapshot.
    ///
    /// Records built through the constructors cannot fail this; candidates
    /// deserialized from the wire can.
    pub fn verify_invariants(&self) -> Result<(), ModelError> {
        if self.title.trim().is_empty() {
            return Err(ModelError::EmptyTitle);
        }
        if self.isbn.trim().is_empty() {
            return Err(ModelError::EmptyIsbn);
        }
        if self.is_borrowed != (self.holder != self.owner) {
            return Err(ModelError::BorrowedFlagMismatch);
        }
        if self.holder != self.owner && !self.entitled_parties.contains(&self.holder) {
            return Err(ModelError::HolderNotEntitled(self.holder));
        }
        for request in &self.request_queue {
            if request.book_id != self.id {
                return Err(ModelError::RequestBookMismatch);
            }
            if !self.entitled_parties.contains(&request.requester) {
                return Err(ModelError::RequesterNotEntitled(request.requester));
            }
        }
        let mut seen = BTreeSet::new();
        for request in &self.request_queue {
            if !seen.insert(request.requester) {
                return Err(ModelError::DuplicateRequester(request.requester));
            }
        }
        if self.participants != Self::derive_participants(&self.owner, &self.entitled_parties) {
            return Err(ModelError::ParticipantsMismatch);
        }
        Ok(())
    }
}
