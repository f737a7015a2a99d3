//! State-transition validator for the Shared Library Ledger (SLL).
//!
//! This crate decides whether a proposed record update may be committed.
//! It is the sole gate the commit service consults:
//! - [`Command`] — the closed set of ledger commands
//! - [`Verdict`] / [`RejectReason`] — accept, or reject with a distinct tag
//! - [`validate`] — book-record entry point, one handler per command
//! - [`validate_student`] — student-registration entry point
//!
//! The validator is pure: no I/O, no clock, no logging, no shared state.
//! Identical inputs always produce identical verdicts, so it may be called
//! concurrently and replayed freely. Rejections are values, never errors;
//! every branch of every command has an explicit verdict.

pub mod command;
pub mod validator;
pub mod verdict;

pub use command::Command;
pub use validator::{validate, validate_student};
pub use verdict::{RejectReason, ShapeViolation, Verdict};
