//! Ledger commit adapter for the Shared Library Ledger (SLL).
//!
//! The transition validator in `sll-validate` is pure; this crate is the
//! seam it plugs into. It provides:
//! - [`Transition`] proposals and the flow-style builders that construct
//!   candidate record versions from the current committed state
//! - [`CommittedVersion`] — hash-linked, per-record version history
//! - [`LedgerReader`] / [`LedgerCommit`] trait boundaries
//! - [`InMemoryCommitService`] for tests, local demos, and embedding
//!
//! Counterparty signature collection, notarization, and durable persistence
//! are the hosting platform's concern. What this layer does guarantee is
//! the commit contract the validator's correctness depends on: at most one
//! in-flight transition per record, stale proposals rejected as conflicts,
//! and nothing persisted on a rejection.

pub mod error;
pub mod memory;
pub mod traits;
pub mod transition;

pub use error::CommitError;
pub use memory::InMemoryCommitService;
pub use traits::{LedgerCommit, LedgerReader};
pub use transition::{CommittedVersion, Transition};
