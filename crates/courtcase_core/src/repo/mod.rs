//! Document store layer.
//!
//! # Responsibility
//! - Define the case document store contract the service layer depends on.
//! - Isolate SQLite and JSON body details from ownership/permission logic.
//!
//! # Invariants
//! - Store APIs return `NotFound` for absent documents on update/delete.
//! - Native timestamps never leak past `service::convert`.

pub mod case_store;
pub mod clock;
pub mod document;
