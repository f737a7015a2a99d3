use std::collections::BTreeSet;

use sll_model::{BookRecord, ModelError, StudentRecord};
use sll_types::PartyId;

use crate::command::Command;
use crate::verdict::{RejectReason, ShapeViolation, Verdict};

/// Validate a proposed book-record transition.
///
/// `old` is the most recently committed version (absent for Create), `new`
/// is the candidate that would supersede it, and `signers` is the set of
/// identities that signed the proposal. The commit service must call this
/// before persisting any transition and must not commit on a rejection.
///
/// Checks run in a fixed order: shape first, then the command's business
/// rules, then a structural re-check of the candidate (candidates may
/// arrive deserialized from the wire, bypassing the model constructors).
pub fn validate(
    command: Command,
    old: Option<&BookRecord>,
    new: &BookRecord,
    signers: &BTreeSet<PartyId>,
) -> Verdict {
    match command {
        Command::Create => validate_create(old, new, signers),
        Command::Borrow => validate_borrow(old, new, signers),
        Command::Return => validate_return(old, new, signers),
        Command::AddRequest => validate_add_request(old, new, signers),
        Command::CreateStudent => Verdict::Rejected(RejectReason::UnsupportedCommand { command }),
    }
}

/// Validate a student registration.
///
/// Only `CreateStudent` is handled here; book commands routed to this entry
/// point are rejected as unsupported rather than falling through.
pub fn validate_student(
    command: Command,
    new: &StudentRecord,
    signers: &BTreeSet<PartyId>,
) -> Verdict {
    match command {
        Command::CreateStudent => {
            if new.student_number.trim().is_empty() {
                return Verdict::Rejected(RejectReason::EmptyStudentId);
            }
            if !new.participants().is_subset(signers) {
                return Verdict::Rejected(RejectReason::NotAllParticipantsSigned);
            }
            Verdict::Accepted
        }
        Command::Create | Command::Borrow | Command::Return | Command::AddRequest => {
            Verdict::Rejected(RejectReason::UnsupportedCommand { command })
        }
    }
}

fn validate_create(
    old: Option<&BookRecord>,
    new: &BookRecord,
    signers: &BTreeSet<PartyId>,
) -> Verdict {
    if old.is_some() {
        return Verdict::Rejected(RejectReason::Shape(ShapeViolation::UnexpectedPriorRecord));
    }
    if new.isbn.trim().is_empty() {
        return Verdict::Rejected(RejectReason::EmptyIsbn);
    }
    if new.title.trim().is_empty() {
        return Verdict::Rejected(RejectReason::EmptyTitle);
    }
    if let Some(reason) = unsigned_participants(new, signers) {
        return Verdict::Rejected(reason);
    }
    // A freshly issued record must be idle with an empty queue.
    if new.is_borrowed {
        return Verdict::Rejected(RejectReason::AlreadyBorrowed);
    }
    if !new.request_queue.is_empty() {
        return Verdict::Rejected(RejectReason::QueueNotDrained);
    }
    structural(new)
}

fn validate_borrow(
    old: Option<&BookRecord>,
    new: &BookRecord,
    signers: &BTreeSet<PartyId>,
) -> Verdict {
    let old = match prior(old, new) {
        Ok(old) => old,
        Err(violation) => return Verdict::Rejected(RejectReason::Shape(violation)),
    };
    if let Some(violation) = changed_identity_field(old, new) {
        return Verdict::Rejected(RejectReason::Shape(violation));
    }
    if old.is_borrowed {
        return Verdict::Rejected(RejectReason::AlreadyBorrowed);
    }
    if let Some(reason) = unsigned_participants(new, signers) {
        return Verdict::Rejected(reason);
    }
    if !new.entitled_parties.contains(&new.holder) {
        return Verdict::Rejected(RejectReason::HolderNotEntitled);
    }
    // A successful borrow consumes whatever was queued. Whether the new
    // holder must equal the old queue head is an open business question;
    // the validator deliberately does not require it.
    if !new.request_queue.is_empty() {
        return Verdict::Rejected(RejectReason::QueueNotDrained);
    }
    if !new.is_borrowed {
        return Verdict::Rejected(RejectReason::NotBorrowed);
    }
    structural(new)
}

fn validate_return(
    old: Option<&BookRecord>,
    new: &BookRecord,
    signers: &BTreeSet<PartyId>,
) -> Verdict {
    let old = match prior(old, new) {
        Ok(old) => old,
        Err(violation) => return Verdict::Rejected(RejectReason::Shape(violation)),
    };
    if let Some(violation) = changed_identity_field(old, new) {
        return Verdict::Rejected(RejectReason::Shape(violation));
    }
    if !old.is_borrowed {
        return Verdict::Rejected(RejectReason::NotBorrowed);
    }
    if let Some(reason) = unsigned_participants(new, signers) {
        return Verdict::Rejected(reason);
    }
    // The returned record stays borrowed exactly when demand was queued:
    // the book is then handed straight to a requester with no idle state in
    // between. Either way the queue must come out empty.
    let had_demand = !old.request_queue.is_empty();
    if had_demand && !new.is_borrowed {
        return Verdict::Rejected(RejectReason::QueueNotDrained);
    }
    if !had_demand && new.is_borrowed {
        return Verdict::Rejected(RejectReason::NoQueuedRequest);
    }
    if !new.request_queue.is_empty() {
        return Verdict::Rejected(RejectReason::QueueNotDrained);
    }
    structural(new)
}

fn validate_add_request(
    old: Option<&BookRecord>,
    new: &BookRecord,
    signers: &BTreeSet<PartyId>,
) -> Verdict {
    let old = match prior(old, new) {
        Ok(old) => old,
        Err(violation) => return Verdict::Rejected(RejectReason::Shape(violation)),
    };
    if let Some(violation) = changed_identity_field(old, new) {
        return Verdict::Rejected(RejectReason::Shape(violation));
    }
    // AddRequest writes the queue and nothing else.
    if new.holder != old.holder {
        return Verdict::Rejected(RejectReason::Shape(ShapeViolation::FieldChanged {
            field: "holder",
        }));
    }
    if new.is_borrowed != old.is_borrowed {
        return Verdict::Rejected(RejectReason::Shape(ShapeViolation::FieldChanged {
            field: "is_borrowed",
        }));
    }
    if new.borrow_date != old.borrow_date {
        return Verdict::Rejected(RejectReason::Shape(ShapeViolation::FieldChanged {
            field: "borrow_date",
        }));
    }
    if !old.is_borrowed {
        return Verdict::Rejected(RejectReason::NotBorrowed);
    }
    if let Some(reason) = unsigned_participants(new, signers) {
        return Verdict::Rejected(reason);
    }
    if new.request_queue.len() != old.request_queue.len() + 1 {
        return Verdict::Rejected(RejectReason::QueueNotAppendOnly);
    }
    if new.request_queue[..old.request_queue.len()] != old.request_queue[..] {
        return Verdict::Rejected(RejectReason::QueueNotAppendOnly);
    }
    let Some(appended) = new.request_queue.last() else {
        return Verdict::Rejected(RejectReason::QueueNotAppendOnly);
    };
    if !new.entitled_parties.contains(&appended.requester) {
        return Verdict::Rejected(RejectReason::RequesterNotEntitled);
    }
    structural(new)
}

fn prior<'a>(
    old: Option<&'a BookRecord>,
    new: &BookRecord,
) -> Result<&'a BookRecord, ShapeViolation> {
    let old = old.ok_or(ShapeViolation::MissingPriorRecord)?;
    if old.id != new.id {
        return Err(ShapeViolation::RecordIdMismatch);
    }
    Ok(old)
}

/// Fields no superseding command may rewrite.
fn changed_identity_field(old: &BookRecord, new: &BookRecord) -> Option<ShapeViolation> {
    if new.title != old.title {
        return Some(ShapeViolation::FieldChanged { field: "title" });
    }
    if new.author != old.author {
        return Some(ShapeViolation::FieldChanged { field: "author" });
    }
    if new.isbn != old.isbn {
        return Some(ShapeViolation::FieldChanged { field: "isbn" });
    }
    if new.owner != old.owner {
        return Some(ShapeViolation::FieldChanged { field: "owner" });
    }
    if new.entitled_parties != old.entitled_parties {
        return Some(ShapeViolation::FieldChanged {
            field: "entitled_parties",
        });
    }
    None
}

fn unsigned_participants(new: &BookRecord, signers: &BTreeSet<PartyId>) -> Option<RejectReason> {
    if !new.participants.is_subset(signers) {
        return Some(RejectReason::NotAllParticipantsSigned);
    }
    None
}

fn structural(new: &BookRecord) -> Verdict {
    match new.verify_invariants() {
        Ok(()) => Verdict::Accepted,
        Err(error) => Verdict::Rejected(structural_reason(error)),
    }
}

fn structural_reason(error: ModelError) -> RejectReason {
    match error {
        ModelError::EmptyTitle => RejectReason::EmptyTitle,
        ModelError::EmptyIsbn => RejectReason::EmptyIsbn,
        ModelError::EmptyStudentId => RejectReason::EmptyStudentId,
        ModelError::BorrowedFlagMismatch => RejectReason::BorrowedFlagMismatch,
        ModelError::HolderNotEntitled(_) => RejectReason::HolderNotEntitled,
        ModelError::RequesterNotEntitled(_) => RejectReason::RequesterNotEntitled,
        ModelError::DuplicateRequester(_) => RejectReason::DuplicateRequester,
        ModelError::RequestBookMismatch => RejectReason::QueueNotAppendOnly,
        ModelError::ParticipantsMismatch => RejectReason::ParticipantsMismatch,
        // Builder-only errors; verify_invariants never produces these, but
        // every branch must still yield an explicit verdict.
        ModelError::HolderIsOwner | ModelError::NoQueuedRequest => {
            RejectReason::BorrowedFlagMismatch
        }
    }
}

#[cfg(test)]
mod tests {
    use sll_model::BorrowRequest;
    use sll_types::{RecordId, StudentId, Timestamp};

    use super::*;

    struct Fixture {
        owner: PartyId,
        a: PartyId,
        b: PartyId,
        c: PartyId,
        signers: BTreeSet<PartyId>,
        book: BookRecord,
    }

    fn fixture() -> Fixture {
        let owner = PartyId::from_org_name("A");
        let a = PartyId::from_org_name("A-branch");
        let b = PartyId::from_org_name("B");
        let c = PartyId::from_org_name("C");
        let entitled = BTreeSet::from([a, b, c]);
        let book = BookRecord::new(RecordId::new(), "Go", "anon", "123", owner, entitled).unwrap();
        let signers = book.participants.clone();
        Fixture {
            owner,
            a,
            b,
            c,
            signers,
            book,
        }
    }

    // -- Create -----------------------------------------------------------

    #[test]
    fn create_accepts_a_fresh_record() {
        let f = fixture();
        assert_eq!(
            validate(Command::Create, None, &f.book, &f.signers),
            Verdict::Accepted
        );
    }

    #[test]
    fn create_rejects_a_prior_record() {
        let f = fixture();
        assert_eq!(
            validate(Command::Create, Some(&f.book), &f.book, &f.signers),
            Verdict::Rejected(RejectReason::Shape(ShapeViolation::UnexpectedPriorRecord))
        );
    }

    #[test]
    fn create_rejects_empty_isbn() {
        let f = fixture();
        let mut candidate = f.book.clone();
        candidate.isbn = "  ".into();
        assert_eq!(
            validate(Command::Create, None, &candidate, &f.signers),
            Verdict::Rejected(RejectReason::EmptyIsbn)
        );
    }

    #[test]
    fn create_rejects_empty_title() {
        let f = fixture();
        let mut candidate = f.book.clone();
        candidate.title = String::new();
        assert_eq!(
            validate(Command::Create, None, &candidate, &f.signers),
            Verdict::Rejected(RejectReason::EmptyTitle)
        );
    }

    #[test]
    fn create_rejects_missing_signer() {
        let f = fixture();
        let mut signers = f.signers.clone();
        signers.remove(&f.b);
        assert_eq!(
            validate(Command::Create, None, &f.book, &signers),
            Verdict::Rejected(RejectReason::NotAllParticipantsSigned)
        );
    }

    #[test]
    fn create_accepts_extra_signers() {
        let f = fixture();
        let mut signers = f.signers.clone();
        signers.insert(PartyId::ephemeral());
        assert_eq!(
            validate(Command::Create, None, &f.book, &signers),
            Verdict::Accepted
        );
    }

    #[test]
    fn create_rejects_a_record_born_borrowed() {
        let f = fixture();
        let mut candidate = f.book.clone();
        candidate.holder = f.a;
        candidate.is_borrowed = true;
        assert_eq!(
            validate(Command::Create, None, &candidate, &f.signers),
            Verdict::Rejected(RejectReason::AlreadyBorrowed)
        );
    }

    #[test]
    fn create_rejects_a_record_born_queued() {
        let f = fixture();
        let mut candidate = f.book.clone();
        candidate.request_queue.push(BorrowRequest::new(
            candidate.id,
            f.b,
            StudentId::new(),
            Timestamp::zero(),
        ));
        assert_eq!(
            validate(Command::Create, None, &candidate, &f.signers),
            Verdict::Rejected(RejectReason::QueueNotDrained)
        );
    }

    #[test]
    fn create_rejects_stale_participants_set() {
        let f = fixture();
        let mut candidate = f.book.clone();
        candidate.participants.remove(&f.c);
        let signers = candidate.participants.clone();
        assert_eq!(
            validate(Command::Create, None, &candidate, &signers),
            Verdict::Rejected(RejectReason::ParticipantsMismatch)
        );
    }

    // -- Borrow -----------------------------------------------------------

    #[test]
    fn borrow_accepts_an_entitled_holder() {
        let f = fixture();
        let new = f.book.borrowed_by(f.b, Timestamp::now()).unwrap();
        assert_eq!(
            validate(Command::Borrow, Some(&f.book), &new, &f.signers),
            Verdict::Accepted
        );
        assert_eq!(new.holder, f.b);
        assert!(new.is_borrowed);
    }

    #[test]
    fn borrow_requires_a_prior_record() {
        let f = fixture();
        let new = f.book.borrowed_by(f.b, Timestamp::now()).unwrap();
        assert_eq!(
            validate(Command::Borrow, None, &new, &f.signers),
            Verdict::Rejected(RejectReason::Shape(ShapeViolation::MissingPriorRecord))
        );
    }

    #[test]
    fn borrow_rejects_an_already_borrowed_book() {
        let f = fixture();
        let borrowed = f.book.borrowed_by(f.b, Timestamp::now()).unwrap();
        let again = borrowed.clone();
        assert_eq!(
            validate(Command::Borrow, Some(&borrowed), &again, &f.signers),
            Verdict::Rejected(RejectReason::AlreadyBorrowed)
        );
    }

    #[test]
    fn borrow_rejects_lineage_break() {
        let f = fixture();
        let mut new = f.book.borrowed_by(f.b, Timestamp::now()).unwrap();
        new.id = RecordId::new();
        assert_eq!(
            validate(Command::Borrow, Some(&f.book), &new, &f.signers),
            Verdict::Rejected(RejectReason::Shape(ShapeViolation::RecordIdMismatch))
        );
    }

    #[test]
    fn borrow_rejects_isbn_rewrite() {
        let f = fixture();
        let mut new = f.book.borrowed_by(f.b, Timestamp::now()).unwrap();
        new.isbn = "456".into();
        assert_eq!(
            validate(Command::Borrow, Some(&f.book), &new, &f.signers),
            Verdict::Rejected(RejectReason::Shape(ShapeViolation::FieldChanged {
                field: "isbn"
            }))
        );
    }

    #[test]
    fn borrow_rejects_entitlement_rewrite() {
        let f = fixture();
        let mut new = f.book.borrowed_by(f.b, Timestamp::now()).unwrap();
        new.entitled_parties.insert(PartyId::ephemeral());
        new.participants = BookRecord::derive_participants(&new.owner, &new.entitled_parties);
        assert_eq!(
            validate(Command::Borrow, Some(&f.book), &new, &f.signers),
            Verdict::Rejected(RejectReason::Shape(ShapeViolation::FieldChanged {
                field: "entitled_parties"
            }))
        );
    }

    #[test]
    fn borrow_rejects_missing_signer() {
        let f = fixture();
        let new = f.book.borrowed_by(f.b, Timestamp::now()).unwrap();
        let signers = BTreeSet::from([f.owner, f.b]);
        assert_eq!(
            validate(Command::Borrow, Some(&f.book), &new, &signers),
            Verdict::Rejected(RejectReason::NotAllParticipantsSigned)
        );
    }

    #[test]
    fn borrow_rejects_unentitled_holder() {
        let f = fixture();
        // Hand-built candidate: the model builder would refuse this holder.
        let mut new = f.book.clone();
        new.holder = f.owner;
        new.is_borrowed = false;
        assert_eq!(
            validate(Command::Borrow, Some(&f.book), &new, &f.signers),
            Verdict::Rejected(RejectReason::HolderNotEntitled)
        );
    }

    #[test]
    fn borrow_rejects_undrained_queue() {
        let f = fixture();
        let mut new = f.book.borrowed_by(f.b, Timestamp::now()).unwrap();
        new.request_queue.push(BorrowRequest::new(
            new.id,
            f.c,
            StudentId::new(),
            Timestamp::zero(),
        ));
        assert_eq!(
            validate(Command::Borrow, Some(&f.book), &new, &f.signers),
            Verdict::Rejected(RejectReason::QueueNotDrained)
        );
    }

    #[test]
    fn borrow_rejects_unset_borrowed_flag() {
        let f = fixture();
        let mut new = f.book.borrowed_by(f.b, Timestamp::now()).unwrap();
        new.is_borrowed = false;
        assert_eq!(
            validate(Command::Borrow, Some(&f.book), &new, &f.signers),
            Verdict::Rejected(RejectReason::NotBorrowed)
        );
    }

    // -- Return -----------------------------------------------------------

    #[test]
    fn return_to_owner_accepts_when_no_demand() {
        let f = fixture();
        let borrowed = f.book.borrowed_by(f.b, Timestamp::now()).unwrap();
        let new = borrowed.returned();
        assert_eq!(
            validate(Command::Return, Some(&borrowed), &new, &f.signers),
            Verdict::Accepted
        );
        assert_eq!(new.holder, f.owner);
    }

    #[test]
    fn return_rejects_an_idle_book() {
        let f = fixture();
        let new = f.book.clone();
        assert_eq!(
            validate(Command::Return, Some(&f.book), &new, &f.signers),
            Verdict::Rejected(RejectReason::NotBorrowed)
        );
    }

    #[test]
    fn return_hands_over_when_demand_exists() {
        let f = fixture();
        let borrowed = f.book.borrowed_by(f.b, Timestamp::from_millis(1)).unwrap();
        let queued = borrowed
            .with_request(f.c, StudentId::new(), Timestamp::from_millis(2))
            .unwrap();
        let new = queued.handed_over(Timestamp::from_millis(3)).unwrap();
        assert_eq!(
            validate(Command::Return, Some(&queued), &new, &f.signers),
            Verdict::Accepted
        );
        assert_eq!(new.holder, f.c);
        assert!(new.is_borrowed);
        assert!(new.request_queue.is_empty());
    }

    #[test]
    fn return_rejects_ignored_demand() {
        let f = fixture();
        let borrowed = f.book.borrowed_by(f.b, Timestamp::from_millis(1)).unwrap();
        let queued = borrowed
            .with_request(f.a, StudentId::new(), Timestamp::from_millis(2))
            .unwrap()
            .with_request(f.c, StudentId::new(), Timestamp::from_millis(3))
            .unwrap();
        // Demand existed (two queued requests) but the candidate reverts to
        // the idle state anyway.
        let mut new = queued.returned();
        new.request_queue.clear();
        assert_eq!(
            validate(Command::Return, Some(&queued), &new, &f.signers),
            Verdict::Rejected(RejectReason::QueueNotDrained)
        );
    }

    #[test]
    fn return_rejects_phantom_handover() {
        let f = fixture();
        let borrowed = f.book.borrowed_by(f.b, Timestamp::now()).unwrap();
        // No demand was queued, yet the record claims it is still out.
        let mut new = borrowed.clone();
        new.holder = f.c;
        assert_eq!(
            validate(Command::Return, Some(&borrowed), &new, &f.signers),
            Verdict::Rejected(RejectReason::NoQueuedRequest)
        );
    }

    #[test]
    fn return_rejects_a_leftover_queue() {
        let f = fixture();
        let borrowed = f.book.borrowed_by(f.b, Timestamp::from_millis(1)).unwrap();
        let queued = borrowed
            .with_request(f.a, StudentId::new(), Timestamp::from_millis(2))
            .unwrap()
            .with_request(f.c, StudentId::new(), Timestamp::from_millis(3))
            .unwrap();
        // Handed over, but the second request was left standing.
        let mut new = queued.clone();
        new.holder = f.a;
        new.request_queue.remove(0);
        assert_eq!(
            validate(Command::Return, Some(&queued), &new, &f.signers),
            Verdict::Rejected(RejectReason::QueueNotDrained)
        );
    }

    // -- AddRequest -------------------------------------------------------

    #[test]
    fn add_request_accepts_an_entitled_requester() {
        let f = fixture();
        let borrowed = f.book.borrowed_by(f.b, Timestamp::from_millis(1)).unwrap();
        let new = borrowed
            .with_request(f.c, StudentId::new(), Timestamp::from_millis(2))
            .unwrap();
        assert_eq!(
            validate(Command::AddRequest, Some(&borrowed), &new, &f.signers),
            Verdict::Accepted
        );
    }

    #[test]
    fn add_request_rejects_an_idle_book() {
        let f = fixture();
        // Hand-built: with_request would also work on an idle record, but
        // the validator must refuse queueing for a book nobody has out.
        let mut new = f.book.clone();
        new.request_queue.push(BorrowRequest::new(
            new.id,
            f.c,
            StudentId::new(),
            Timestamp::zero(),
        ));
        assert_eq!(
            validate(Command::AddRequest, Some(&f.book), &new, &f.signers),
            Verdict::Rejected(RejectReason::NotBorrowed)
        );
    }

    #[test]
    fn add_request_rejects_unentitled_requester() {
        let f = fixture();
        let stranger = PartyId::from_org_name("Stranger");
        let borrowed = f.book.borrowed_by(f.b, Timestamp::now()).unwrap();
        let mut new = borrowed.clone();
        new.request_queue.push(BorrowRequest::new(
            new.id,
            stranger,
            StudentId::new(),
            Timestamp::zero(),
        ));
        assert_eq!(
            validate(Command::AddRequest, Some(&borrowed), &new, &f.signers),
            Verdict::Rejected(RejectReason::RequesterNotEntitled)
        );
    }

    #[test]
    fn add_request_rejects_a_reordered_queue() {
        let f = fixture();
        let borrowed = f.book.borrowed_by(f.b, Timestamp::from_millis(1)).unwrap();
        let queued = borrowed
            .with_request(f.a, StudentId::new(), Timestamp::from_millis(2))
            .unwrap();
        let appended = queued
            .with_request(f.c, StudentId::new(), Timestamp::from_millis(3))
            .unwrap();
        let mut new = appended.clone();
        new.request_queue.swap(0, 1);
        assert_eq!(
            validate(Command::AddRequest, Some(&queued), &new, &f.signers),
            Verdict::Rejected(RejectReason::QueueNotAppendOnly)
        );
    }

    #[test]
    fn add_request_rejects_multiple_appends() {
        let f = fixture();
        let borrowed = f.book.borrowed_by(f.b, Timestamp::from_millis(1)).unwrap();
        let new = borrowed
            .with_request(f.a, StudentId::new(), Timestamp::from_millis(2))
            .unwrap()
            .with_request(f.c, StudentId::new(), Timestamp::from_millis(3))
            .unwrap();
        assert_eq!(
            validate(Command::AddRequest, Some(&borrowed), &new, &f.signers),
            Verdict::Rejected(RejectReason::QueueNotAppendOnly)
        );
    }

    #[test]
    fn add_request_rejects_a_removed_entry() {
        let f = fixture();
        let borrowed = f.book.borrowed_by(f.b, Timestamp::from_millis(1)).unwrap();
        let queued = borrowed
            .with_request(f.a, StudentId::new(), Timestamp::from_millis(2))
            .unwrap();
        let mut new = queued.clone();
        new.request_queue.clear();
        assert_eq!(
            validate(Command::AddRequest, Some(&queued), &new, &f.signers),
            Verdict::Rejected(RejectReason::QueueNotAppendOnly)
        );
    }

    #[test]
    fn add_request_rejects_duplicate_requester() {
        let f = fixture();
        let borrowed = f.book.borrowed_by(f.b, Timestamp::from_millis(1)).unwrap();
        let queued = borrowed
            .with_request(f.c, StudentId::new(), Timestamp::from_millis(2))
            .unwrap();
        let mut new = queued.clone();
        new.request_queue.push(BorrowRequest::new(
            new.id,
            f.c,
            StudentId::new(),
            Timestamp::from_millis(3),
        ));
        assert_eq!(
            validate(Command::AddRequest, Some(&queued), &new, &f.signers),
            Verdict::Rejected(RejectReason::DuplicateRequester)
        );
    }

    #[test]
    fn add_request_rejects_holder_change() {
        let f = fixture();
        let borrowed = f.book.borrowed_by(f.b, Timestamp::from_millis(1)).unwrap();
        let mut new = borrowed
            .with_request(f.c, StudentId::new(), Timestamp::from_millis(2))
            .unwrap();
        new.holder = f.a;
        assert_eq!(
            validate(Command::AddRequest, Some(&borrowed), &new, &f.signers),
            Verdict::Rejected(RejectReason::Shape(ShapeViolation::FieldChanged {
                field: "holder"
            }))
        );
    }

    // -- Routing ----------------------------------------------------------

    #[test]
    fn create_student_is_unsupported_on_book_records() {
        let f = fixture();
        assert_eq!(
            validate(Command::CreateStudent, None, &f.book, &f.signers),
            Verdict::Rejected(RejectReason::UnsupportedCommand {
                command: Command::CreateStudent
            })
        );
    }

    #[test]
    fn book_commands_are_unsupported_on_student_records() {
        let school = PartyId::from_org_name("A");
        let student = StudentRecord::new(
            StudentId::new(),
            "Avery Park",
            "S-1",
            school,
            "555",
            "a@example.edu",
        )
        .unwrap();
        let signers = BTreeSet::from([school]);
        assert_eq!(
            validate_student(Command::Borrow, &student, &signers),
            Verdict::Rejected(RejectReason::UnsupportedCommand {
                command: Command::Borrow
            })
        );
    }

    #[test]
    fn create_student_checks_number_and_signers() {
        let school = PartyId::from_org_name("A");
        let student = StudentRecord::new(
            StudentId::new(),
            "Avery Park",
            "S-1",
            school,
            "555",
            "a@example.edu",
        )
        .unwrap();

        assert_eq!(
            validate_student(Command::CreateStudent, &student, &BTreeSet::from([school])),
            Verdict::Accepted
        );
        assert_eq!(
            validate_student(Command::CreateStudent, &student, &BTreeSet::new()),
            Verdict::Rejected(RejectReason::NotAllParticipantsSigned)
        );

        let mut unnumbered = student.clone();
        unnumbered.student_number = "  ".into();
        assert_eq!(
            validate_student(
                Command::CreateStudent,
                &unnumbered,
                &BTreeSet::from([school])
            ),
            Verdict::Rejected(RejectReason::EmptyStudentId)
        );
    }

    // -- Lifecycle --------------------------------------------------------

    #[test]
    fn full_lifecycle_is_accepted_at_every_step() {
        let f = fixture();
        let student = StudentId::new();

        // Create -> Borrow by B -> AddRequest by C -> Return (hand-over) ->
        // the final holder is the queued requester and the queue is empty.
        assert_eq!(
            validate(Command::Create, None, &f.book, &f.signers),
            Verdict::Accepted
        );

        let borrowed = f.book.borrowed_by(f.b, Timestamp::from_millis(1)).unwrap();
        assert_eq!(
            validate(Command::Borrow, Some(&f.book), &borrowed, &f.signers),
            Verdict::Accepted
        );

        let queued = borrowed
            .with_request(f.c, student, Timestamp::from_millis(2))
            .unwrap();
        assert_eq!(
            validate(Command::AddRequest, Some(&borrowed), &queued, &f.signers),
            Verdict::Accepted
        );

        let handed = queued.handed_over(Timestamp::from_millis(3)).unwrap();
        assert_eq!(
            validate(Command::Return, Some(&queued), &handed, &f.signers),
            Verdict::Accepted
        );
        assert_eq!(handed.holder, f.c);
        assert!(handed.request_queue.is_empty());

        // Queueing again requires the book to still be out.
        let requeued = handed
            .with_request(f.b, StudentId::new(), Timestamp::from_millis(4))
            .unwrap();
        assert_eq!(
            validate(Command::AddRequest, Some(&handed), &requeued, &f.signers),
            Verdict::Accepted
        );

        // ... and is rejected once it has come back to rest.
        let idle = handed.returned();
        assert_eq!(
            validate(Command::Return, Some(&handed), &idle, &f.signers),
            Verdict::Accepted
        );
        let mut late = idle.clone();
        late.request_queue.push(BorrowRequest::new(
            late.id,
            f.b,
            StudentId::new(),
            Timestamp::from_millis(5),
        ));
        assert_eq!(
            validate(Command::AddRequest, Some(&idle), &late, &f.signers),
            Verdict::Rejected(RejectReason::NotBorrowed)
        );
    }

    #[test]
    fn verdicts_are_idempotent() {
        let f = fixture();
        let new = f.book.borrowed_by(f.b, Timestamp::from_millis(7)).unwrap();
        let first = validate(Command::Borrow, Some(&f.book), &new, &f.signers);
        let second = validate(Command::Borrow, Some(&f.book), &new, &f.signers);
        assert_eq!(first, second);
    }
}
