//! Process-wide mod catalogue and caller attribution.
//!
//! # Responsibility
//! - Hold the write-once, read-many catalogue of discovered mods.
//! - Resolve which mod, if any, issued the current call.
//!
//! # Invariants
//! - The catalogue is bulk-loaded exactly once and frozen afterwards.
//! - Read paths never fail; absence is a valid answer.

pub mod caller;
pub mod mod_registry;
