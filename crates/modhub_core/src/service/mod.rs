//! Core use-case services.
//!
//! # Responsibility
//! - Orchestrate registry, ledger and commit calls into UI-facing APIs.
//! - Keep interactive surfaces decoupled from storage details.

pub mod mod_list_service;
