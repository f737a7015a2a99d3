//! Foundation types for the Shared Library Ledger (SLL).
//!
//! This crate provides the identity and identifier types used throughout the
//! SLL system. Every other SLL crate depends on `sll-types`.
//!
//! # Key Types
//!
//! - [`PartyId`] — Persistent cryptographic identity for a lending party
//! - [`RecordId`] — UUID v7 identifier for a book record lineage
//! - [`StudentId`] — UUID v7 identifier for a student record
//! - [`Timestamp`] — Opaque wall-clock ordering hint

pub mod error;
pub mod identity;
pub mod ids;
pub mod temporal;

pub use error::TypeError;
pub use identity::{IdentityMaterial, PartyId};
pub use ids::{RecordId, StudentId};
pub use temporal::Timestamp;
