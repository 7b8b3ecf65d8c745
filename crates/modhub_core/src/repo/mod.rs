//! Repository layer for durable enablement decisions.
//!
//! # Responsibility
//! - Persist operator-confirmed enable/disable decisions.
//! - Isolate SQL details from staging and service orchestration.
//!
//! # Invariants
//! - Read paths reject invalid persisted state instead of masking it.

pub mod enablement_repo;
