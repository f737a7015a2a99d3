use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use sll_types::{PartyId, StudentId};

use crate::error::ModelError;

/// The student a borrow request is lodged on behalf of.
///
/// Student records have a lifecycle independent from book records: they are
/// referenced by queued requests but never touched by book transitions.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StudentRecord {
    /// Ledger handle for this student.
    pub id: StudentId,
    pub full_name: String,
    /// The school's own student number; non-empty and unique per school.
    pub student_number: String,
    /// The school registering the student; its only required co-signer.
    pub school: PartyId,
    pub mobile: String,
    pub email: String,
}

impl StudentRecord {
    pub fn new(
        id: StudentId,
        full_name: impl Into<String>,
        student_number: impl Into<String>,
        school: PartyId,
        mobile: impl Into<String>,
        email: impl Into<String>,
    ) -> Result<Self, ModelError> {
        let student_number = student_number.into();
        if student_number.trim().is_empty() {
            return Err(ModelError::EmptyStudentId);
        }
        Ok(Self {
            id,
            full_name: full_name.into(),
            student_number,
            school,
            mobile: mobile.into(),
            email: email.into(),
        })
    }

    /// Parties that must co-sign the registration; just the school.
    pub fn participants(&self) -> BTreeSet<PartyId> {
        BTreeSet::from([self.school])
    }

    /// Check the structural invariant (non-empty student number).
    pub fn verify_invariants(&self) -> Result<(), ModelError> {
        if self.student_number.trim().is_empty() {
            return Err(ModelError::EmptyStudentId);
        }
        Ok(())
    }
}
