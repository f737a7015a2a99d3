use std::collections::{BTreeSet, HashMap};
use std::sync::RwLock;

use tracing::{debug, info};

use sll_model::{BookRecord, StudentRecord};
use sll_types::{PartyId, RecordId, StudentId, Timestamp};
use sll_validate::{validate, validate_student, Command, Verdict};

use crate::error::CommitError;
use crate::traits::{LedgerCommit, LedgerReader};
use crate::transition::{CommittedVersion, Transition};

/// In-memory commit service for tests, local demos, and embedding.
///
/// The write lock serializes commits, so at most one transition per record
/// is in flight at a time and `old` is always the true head when the
/// validator runs. A proposal built against a superseded version fails the
/// expected-version check and is rejected as a conflict, never validated
/// against stale state.
pub struct InMemoryCommitService {
    inner: RwLock<CommitState>,
}

#[derive(Default)]
struct CommitState {
    streams: HashMap<RecordId, Vec<CommittedVersion>>,
    students: HashMap<StudentId, StudentRecord>,
}

impl InMemoryCommitService {
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(CommitState::default()),
        }
    }

    /// Re-check the hash chain, version numbering, and record invariants of
    /// one lineage's committed history.
    pub fn verify_history(&self, id: &RecordId) -> Result<(), CommitError> {
        let state = self.inner.read().map_err(|_| CommitError::LockPoisoned)?;
        let Some(stream) = state.streams.get(id) else {
            return Ok(());
        };

        for (index, version) in stream.iter().enumerate() {
            let expected_version = (index + 1) as u64;
            if version.version != expected_version {
                return Err(CommitError::IntegrityViolation {
                    version: version.version,
                    reason: format!("expected version {expected_version}"),
                });
            }
            if version.record_id != *id || version.record.id != *id {
                return Err(CommitError::IntegrityViolation {
                    version: version.version,
                    reason: "version belongs to a different lineage".into(),
                });
            }

            let expected_prev = if index == 0 {
                None
            } else {
                Some(stream[index - 1].version_hash)
            };
            if version.prev_hash != expected_prev {
                return Err(CommitError::IntegrityViolation {
                    version: version.version,
                    reason: "previous hash link mismatch".into(),
                });
            }

            if version.compute_hash()? != version.version_hash {
                return Err(CommitError::IntegrityViolation {
                    version: version.version,
                    reason: "version hash mismatch".into(),
                });
            }

            if let Err(error) = version.record.verify_invariants() {
                return Err(CommitError::IntegrityViolation {
                    version: version.version,
                    reason: error.to_string(),
                });
            }
        }

        Ok(())
    }
}

impl Default for InMemoryCommitService {
    fn default() -> Self {
        Self::new()
    }
}

impl LedgerCommit for InMemoryCommitService {
    fn commit(&self, transition: &Transition) -> Result<CommittedVersion, CommitError> {
        let mut state = self.inner.write().map_err(|_| CommitError::LockPoisoned)?;
        let record_id = transition.record_id();

        let current = state
            .streams
            .get(&record_id)
            .map(|s| s.len() as u64)
            .unwrap_or(0);
        if transition.expected_version != current {
            return Err(CommitError::Conflict {
                expected: transition.expected_version,
                current,
            });
        }

        let old = state
            .streams
            .get(&record_id)
            .and_then(|s| s.last())
            .map(|v| v.record.clone());

        match validate(
            transition.command,
            old.as_ref(),
            &transition.new,
            &transition.signers,
        ) {
            Verdict::Accepted => {}
            Verdict::Rejected(reason) => {
                debug!(
                    record = %record_id.short_id(),
                    command = %transition.command,
                    %reason,
                    "transition rejected"
                );
                return Err(CommitError::Rejected(reason));
            }
        }

        let prev_hash = state
            .streams
            .get(&record_id)
            .and_then(|s| s.last())
            .map(|v| v.version_hash);

        let mut version = CommittedVersion {
            record_id,
            version: current + 1,
            version_hash: [0; 32],
            prev_hash,
            command: transition.command,
            committed_at: Timestamp::now(),
            record: transition.new.clone(),
        };
        version.version_hash = version.compute_hash()?;

        state
            .streams
            .entry(record_id)
            .or_default()
            .push(version.clone());

        info!(
            record = %record_id.short_id(),
            version = version.version,
            command = %transition.command,
            "transition committed"
        );
        Ok(version)
    }

    fn register_student(
        &self,
        student: &StudentRecord,
        signers: &BTreeSet<PartyId>,
    ) -> Result<(), CommitError> {
        match validate_student(Command::CreateStudent, student, signers) {
            Verdict::Accepted => {}
            Verdict::Rejected(reason) => return Err(CommitError::Rejected(reason)),
        }

        let mut state = self.inner.write().map_err(|_| CommitError::LockPoisoned)?;
        let duplicate = state.students.values().any(|existing| {
            existing.school == student.school && existing.student_number == student.student_number
        });
        if duplicate {
            return Err(CommitError::DuplicateStudent(student.student_number.clone()));
        }

        state.students.insert(student.id, student.clone());
        info!(student = %student.id.short_id(), "student registered");
        Ok(())
    }
}

impl LedgerReader for InMemoryCommitService {
    fn current(&self, id: &RecordId) -> Result<Option<BookRecord>, CommitError> {
        Ok(self.head(id)?.map(|v| v.record))
    }

    fn head(&self, id: &RecordId) -> Result<Option<CommittedVersion>, CommitError> {
        let state = self.inner.read().map_err(|_| CommitError::LockPoisoned)?;
        Ok(state
            .streams
            .get(id)
            .and_then(|stream| stream.last())
            .cloned())
    }

    fn history(&self, id: &RecordId) -> Result<Vec<CommittedVersion>, CommitError> {
        let state = self.inner.read().map_err(|_| CommitError::LockPoisoned)?;
        Ok(state.streams.get(id).cloned().unwrap_or_default())
    }

    fn record_ids(&self) -> Result<Vec<RecordId>, CommitError> {
        let state = self.inner.read().map_err(|_| CommitError::LockPoisoned)?;
        let mut ids: Vec<_> = state.streams.keys().copied().collect();
        ids.sort();
        Ok(ids)
    }

    fn student(&self, id: &StudentId) -> Result<Option<StudentRecord>, CommitError> {
        let state = self.inner.read().map_err(|_| CommitError::LockPoisoned)?;
        Ok(state.students.get(id).cloned())
    }
}
