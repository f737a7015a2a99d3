use serde::{Deserialize, Serialize};
use sll_types::{PartyId, RecordId, StudentId, Timestamp};

/// One entry in a book's FIFO request queue.
///
/// A request is immutable once created and leaves the queue only by being
/// consumed when the book is borrowed or handed over. `requested_at` is an
/// ordering hint for display; queue order is insertion order.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BorrowRequest {
    /// The book record lineage this request targets.
    pub book_id: RecordId,
    /// The party queueing for the book; must be entitled on that book.
    pub requester: PartyId,
    /// The student the book is requested on behalf of.
    pub student_id: StudentId,
    /// When the request was lodged.
    pub requested_at: Timestamp,
}

impl BorrowRequest {
    pub fn new(
        book_id: RecordId,
        requester: PartyId,
        student_id: StudentId,
        requested_at: Timestamp,
    ) -> Self {
        Self {
            book_id,
            requester,
            student_id,
            requested_at,
        }
    }
}
