//! Domain model for discovered extensions ("mods").
//!
//! # Responsibility
//! - Define the immutable record shape handed over by the loading pipeline.
//! - Define the opaque code-origin handle used for caller attribution.
//!
//! # Invariants
//! - Every record is identified by a stable, process-unique `id`.
//! - Records are never mutated after construction.

pub mod mod_record;
