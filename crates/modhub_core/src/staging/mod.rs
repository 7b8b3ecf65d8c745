//! Staged enablement changes.
//!
//! # Responsibility
//! - Record the operator's pending enable/disable toggles per mod.
//! - Drain them through a persistence collaborator on confirm.
//!
//! # Invariants
//! - At most one pending change exists per mod id.
//! - A toggle back to the committed value leaves no pending change.
//! - No lock is held while the persistence collaborator runs.

pub mod commit;
pub mod ledger;
