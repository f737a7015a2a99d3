use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use sll_model::BookRecord;
use sll_types::{PartyId, RecordId, StudentId, Timestamp};
use sll_validate::Command;

use crate::error::CommitError;
use crate::traits::LedgerReader;

/// A proposed transition against the current committed version.
///
/// `expected_version` pins the version the candidate was built from
/// (`0` for Create). The commit service compares it against the actual
/// head so a proposal raced by another commit is rejected as a conflict
/// instead of being validated against stale state.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transition {
    pub command: Command,
    pub expected_version: u64,
    /// The candidate record that would supersede the current version.
    pub new: BookRecord,
    /// Identities that signed the proposal.
    pub signers: BTreeSet<PartyId>,
}

impl Transition {
    /// The record lineage this transition belongs to.
    pub fn record_id(&self) -> RecordId {
        self.new.id
    }

    /// Propose issuing a brand-new record.
    pub fn create(record: BookRecord, signers: BTreeSet<PartyId>) -> Self {
        Self {
            command: Command::Create,
            expected_version: 0,
            new: record,
            signers,
        }
    }

    /// Propose lending the book out to `borrower`, building the candidate
    /// from the current committed version.
    pub fn borrow<R: LedgerReader + ?Sized>(
        reader: &R,
        book_id: &RecordId,
        borrower: PartyId,
        at: Timestamp,
        signers: BTreeSet<PartyId>,
    ) -> Result<Self, CommitError> {
        let (current, version) = resolve(reader, book_id)?;
        let new = current.borrowed_by(borrower, at)?;
        Ok(Self {
            command: Command::Borrow,
            expected_version: version,
            new,
            signers,
        })
    }

    /// Propose giving the book back. When requests are queued the candidate
    /// hands the book straight to the head requester; otherwise it reverts
    /// to the owner.
    pub fn give_back<R: LedgerReader + ?Sized>(
        reader: &R,
        book_id: &RecordId,
        at: Timestamp,
        signers: BTreeSet<PartyId>,
    ) -> Result<Self, CommitError> {
        let (current, version) = resolve(reader, book_id)?;
        let new = if current.request_queue.is_empty() {
            current.returned()
        } else {
            current.handed_over(at)?
        };
        Ok(Self {
            command: Command::Return,
            expected_version: version,
            new,
            signers,
        })
    }

    /// Propose queueing `requester` for the book on behalf of a registered
    /// student. The student reference is resolved here — the validator
    /// itself trusts referential integrity has been pre-checked.
    pub fn add_request<R: LedgerReader + ?Sized>(
        reader: &R,
        book_id: &RecordId,
        requester: PartyId,
        student_id: &StudentId,
        at: Timestamp,
        signers: BTreeSet<PartyId>,
    ) -> Result<Self, CommitError> {
        if reader.student(student_id)?.is_none() {
            return Err(CommitError::StudentNotFound);
        }
        let (current, version) = resolve(reader, book_id)?;
        let new = current.with_request(requester, *student_id, at)?;
        Ok(Self {
            command: Command::AddRequest,
            expected_version: version,
            new,
            signers,
        })
    }
}

fn resolve<R: LedgerReader + ?Sized>(
    reader: &R,
    book_id: &RecordId,
) -> Result<(BookRecord, u64), CommitError> {
    let head = reader.head(book_id)?.ok_or(CommitError::RecordNotFound)?;
    let version = head.version;
    Ok((head.record, version))
}

/// One committed, immutable version of a book record.
///
/// Versions of the same record form a hash-linked chain; a superseded
/// version is history and is never rewritten.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommittedVersion {
    pub record_id: RecordId,
    /// Monotonic 1-based version number within the lineage.
    pub version: u64,
    /// BLAKE3 hash of this version's canonical encoding.
    pub version_hash: [u8; 32],
    /// Hash of the superseded version, `None` for version 1.
    pub prev_hash: Option<[u8; 32]>,
    /// The command whose transition produced this version.
    pub command: Command,
    pub committed_at: Timestamp,
    pub record: BookRecord,
}

impl CommittedVersion {
    /// Recompute this version's hash from its canonical encoding.
    pub fn compute_hash(&self) -> Result<[u8; 32], CommitError> {
        let mut canonical = self.clone();
        canonical.version_hash = [0; 32];
        let encoded = serde_json::to_vec(&canonical)
            .map_err(|e| CommitError::Serialization(e.to_string()))?;
        let mut hasher = blake3::Hasher::new();
        hasher.update(b"sll-version-v1:");
        hasher.update(&encoded);
        Ok(*hasher.finalize().as_bytes())
    }
}
