//! Record model for the Shared Library Ledger (SLL).
//!
//! This crate provides the immutable value types a lending ledger is made
//! of:
//! - [`BookRecord`] — one versioned snapshot of a book's lending state
//! - [`BorrowRequest`] — one entry in a book's FIFO request queue
//! - [`StudentRecord`] — the student a request is lodged on behalf of
//!
//! A record is never mutated in place. Every change is expressed by
//! constructing a brand-new record from an old one via the functional-update
//! builders ([`BookRecord::borrowed_by`], [`BookRecord::returned`],
//! [`BookRecord::handed_over`], [`BookRecord::with_request`]), so the
//! transition validator can always compare "old" and "new" as two
//! independent snapshots.

pub mod book;
pub mod error;
pub mod request;
pub mod student;

pub use book::BookRecord;
pub use error::ModelError;
pub use request::BorrowRequest;
pub use student::StudentRecord;
