//! Domain model for cases, workflow phases and caller identity.
//!
//! # Invariants
//! - Every case is identified by a store-assigned `CaseId`.
//! - Deletion is a soft-delete tombstone until explicitly purged.

pub mod case;
pub mod case_form;
pub mod identity;
pub mod workflow;
