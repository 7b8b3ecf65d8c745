//! Pending-change ledger with add/remove reconciliation.
//!
//! # Responsibility
//! - Stage toggles keyed by mod id.
//! - Reconcile every toggle against the committed value, never against the
//!   previous pending value.
//!
//! # Invariants
//! - `pending` never holds an entry equal to the committed value.
//! - The committed value is the last successfully persisted value for the
//!   mod in this process, falling back to the record's `enabled` flag.
//! - Toggle and read accessors are serialized by one mutex, so readers never
//!   observe a half-applied toggle.

use crate::model::mod_record::ModId;
use crate::registry::mod_registry::ModRegistry;
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// One staged enable/disable request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingChange {
    pub mod_id: ModId,
    pub requested_enabled: bool,
}

impl PendingChange {
    pub fn new(mod_id: impl Into<ModId>, requested_enabled: bool) -> Self {
        Self {
            mod_id: mod_id.into(),
            requested_enabled,
        }
    }
}

/// Staging errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StagingError {
    /// The mod id is not in the registry.
    UnknownIdentity(ModId),
}

impl Display for StagingError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::UnknownIdentity(value) => write!(f, "unknown mod id: {value}"),
        }
    }
}

impl Error for StagingError {}

#[derive(Debug, Default)]
struct LedgerState {
    pending: BTreeMap<ModId, bool>,
    /// Values persisted by a commit during this process.
    persisted: BTreeMap<ModId, bool>,
}

/// Session-scoped staging area for enablement toggles.
#[derive(Debug)]
pub struct StagedChangeLedger {
    registry: Arc<ModRegistry>,
    state: Mutex<LedgerState>,
}

impl StagedChangeLedger {
    pub fn new(registry: Arc<ModRegistry>) -> Self {
        Self {
            registry,
            state: Mutex::new(LedgerState::default()),
        }
    }

    pub fn registry(&self) -> &Arc<ModRegistry> {
        &self.registry
    }

    /// Stages `requested` for `mod_id`, or drops the staged entry when
    /// `requested` equals the committed value.
    ///
    /// # Errors
    /// - `UnknownIdentity` when `mod_id` is not installed; the ledger is
    ///   left unchanged.
    pub fn toggle(&self, mod_id: &str, requested: bool) -> Result<(), StagingError> {
        let Some(record) = self.registry.get(mod_id) else {
            warn!(
                "event=mod_toggle module=staging status=error error_code=unknown_identity mod_id={}",
                mod_id
            );
            return Err(StagingError::UnknownIdentity(mod_id.to_string()));
        };

        let mut state = self.lock();
        let committed = state
            .persisted
            .get(mod_id)
            .copied()
            .unwrap_or(record.enabled);

        if requested == committed {
            let removed = state.pending.remove(mod_id).is_some();
            debug!(
                "event=mod_toggle module=staging status=reconciled mod_id={} requested={} removed={}",
                mod_id, requested, removed
            );
        } else {
            state.pending.insert(record.id.clone(), requested);
            debug!(
                "event=mod_toggle module=staging status=staged mod_id={} requested={}",
                mod_id, requested
            );
        }
        Ok(())
    }

    /// Returns whether any change is staged.
    pub fn has_pending_changes(&self) -> bool {
        !self.lock().pending.is_empty()
    }

    pub fn len(&self) -> usize {
        self.lock().pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().pending.is_empty()
    }

    /// Returns a snapshot of staged changes ordered by mod id.
    pub fn pending_changes(&self) -> Vec<PendingChange> {
        self.lock()
            .pending
            .iter()
            .map(|(mod_id, requested)| PendingChange::new(mod_id.clone(), *requested))
            .collect()
    }

    /// Returns the staged value for one mod, if any.
    pub fn pending_for(&self, mod_id: &str) -> Option<bool> {
        self.lock().pending.get(mod_id).copied()
    }

    /// Returns the value a toggle for `mod_id` is reconciled against.
    pub fn committed_enabled(&self, mod_id: &str) -> Option<bool> {
        let record = self.registry.get(mod_id)?;
        Some(
            self.lock()
                .persisted
                .get(mod_id)
                .copied()
                .unwrap_or(record.enabled),
        )
    }

    /// Discards every staged change.
    pub fn clear(&self) {
        let dropped = {
            let mut state = self.lock();
            let dropped = state.pending.len();
            state.pending.clear();
            dropped
        };
        info!(
            "event=ledger_clear module=staging status=ok dropped={}",
            dropped
        );
    }

    /// Atomically removes and returns every staged change.
    pub(crate) fn take_pending(&self) -> Vec<PendingChange> {
        std::mem::take(&mut self.lock().pending)
            .into_iter()
            .map(|(mod_id, requested)| PendingChange::new(mod_id, requested))
            .collect()
    }

    /// Records a successful write as the new committed baseline.
    ///
    /// A change staged while the write was in flight is reconciled against
    /// the new baseline.
    pub(crate) fn mark_persisted(&self, mod_id: &str, enabled: bool) {
        let mut state = self.lock();
        state.persisted.insert(mod_id.to_string(), enabled);
        if state.pending.get(mod_id) == Some(&enabled) {
            state.pending.remove(mod_id);
        }
    }

    /// Puts drained changes back after an aborted commit.
    ///
    /// Entries staged after the drain are kept as they are.
    pub(crate) fn restore_pending(&self, changes: Vec<PendingChange>) {
        let mut state = self.lock();
        for change in changes {
            if state.pending.contains_key(change.mod_id.as_str()) {
                continue;
            }
            let committed = state
                .persisted
                .get(change.mod_id.as_str())
                .copied()
                .or_else(|| self.registry.get(&change.mod_id).map(|r| r.enabled));
            if committed != Some(change.requested_enabled) {
                state
                    .pending
                    .insert(change.mod_id, change.requested_enabled);
            }
        }
    }

    fn lock(&self) -> MutexGuard<'_, LedgerState> {
        // Every critical section leaves both maps consistent.
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
