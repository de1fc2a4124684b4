//! Case use-case services.
//!
//! # Responsibility
//! - Enforce identity, ownership and permission rules over the case store.
//! - Keep view-state and entry points decoupled from storage details.

pub mod case_service;
pub mod convert;
pub mod trigger;
