//! Commit pipeline draining the ledger into durable storage.
//!
//! # Responsibility
//! - Hand every staged change to an [`EnablementWriter`] exactly once.
//! - Report per-mod persistence failures without aborting the batch
//!   (`CommitPolicy::BestEffort`), or roll the batch back
//!   (`CommitPolicy::AllOrNothing`).
//!
//! # Invariants
//! - The ledger lock is released before the first write starts.
//! - An empty ledger makes `commit` a silent no-op.
//! - With `BestEffort`, the ledger is empty after `commit` returns, whether
//!   or not individual writes failed.
//! - An `AllOrNothing` rollback restores values, not rows: every mod written
//!   before the failure gets its committed value written back, so the store
//!   may hold a row equal to the discovery default afterwards.

use crate::staging::ledger::{PendingChange, StagedChangeLedger};
use log::{debug, error, info, warn};
use serde::{Deserialize, Serialize};
use std::fmt::Display;

/// Durable sink for enablement decisions.
pub trait EnablementWriter {
    type Error: Display;

    /// Durably records that `mod_id` should be `enabled` on next start.
    fn write_enablement(&self, mod_id: &str, enabled: bool) -> Result<(), Self::Error>;
}

impl<F, E> EnablementWriter for F
where
    F: Fn(&str, bool) -> Result<(), E>,
    E: Display,
{
    type Error = E;

    fn write_enablement(&self, mod_id: &str, enabled: bool) -> Result<(), E> {
        self(mod_id, enabled)
    }
}

/// How `commit` reacts to a failed write.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CommitPolicy {
    /// Attempt every write, report failures, always clear the ledger.
    #[default]
    BestEffort,
    /// Stop at the first failure, revert earlier writes, keep the ledger.
    ///
    /// Reverting writes the committed value back through the same writer;
    /// a mod that had no durable decision before the batch ends up with one
    /// holding its committed value.
    AllOrNothing,
}

/// One failed write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PersistenceFailure {
    pub mod_id: String,
    /// Value the failed write tried to record.
    pub enabled: bool,
    pub message: String,
    /// Set when the write was an `AllOrNothing` compensating write.
    pub during_rollback: bool,
}

/// Outcome of one `commit` call.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommitReport {
    /// Changes that are durable after this commit.
    pub written: Vec<PendingChange>,
    /// Failed writes, including failed rollback writes.
    pub failures: Vec<PersistenceFailure>,
    /// Set when an `AllOrNothing` batch was reverted and re-staged.
    pub rolled_back: bool,
}

impl CommitReport {
    /// Returns whether every attempted write succeeded.
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }

    /// Returns whether a rolled-back batch left durable state as it was.
    ///
    /// False when a compensating write failed, since the forward write for
    /// that mod is still in the store.
    pub fn is_fully_reverted(&self) -> bool {
        self.rolled_back && self.failures.iter().all(|failure| !failure.during_rollback)
    }

    /// Returns the mod ids whose write failed, in attempt order.
    pub fn failed_ids(&self) -> Vec<&str> {
        self.failures
            .iter()
            .map(|failure| failure.mod_id.as_str())
            .collect()
    }
}

/// Drains `ledger` through `writer` according to `policy`.
pub fn commit<W>(ledger: &StagedChangeLedger, writer: &W, policy: CommitPolicy) -> CommitReport
where
    W: EnablementWriter + ?Sized,
{
    let changes = ledger.take_pending();
    if changes.is_empty() {
        debug!("event=commit module=staging status=skipped reason=no_pending_changes");
        return CommitReport::default();
    }

    info!(
        "event=commit module=staging status=start count={} policy={:?}",
        changes.len(),
        policy
    );
    let report = match policy {
        CommitPolicy::BestEffort => commit_best_effort(ledger, writer, changes),
        CommitPolicy::AllOrNothing => commit_all_or_nothing(ledger, writer, changes),
    };

    if report.is_clean() {
        info!(
            "event=commit module=staging status=ok written={}",
            report.written.len()
        );
    } else {
        error!(
            "event=commit module=staging status=error written={} failed={} rolled_back={}",
            report.written.len(),
            report.failures.len(),
            report.rolled_back
        );
    }
    report
}

fn commit_best_effort<W>(
    ledger: &StagedChangeLedger,
    writer: &W,
    changes: Vec<PendingChange>,
) -> CommitReport
where
    W: EnablementWriter + ?Sized,
{
    let mut report = CommitReport::default();
    for change in changes {
        match write_one(writer, &change.mod_id, change.requested_enabled) {
            Ok(()) => {
                ledger.mark_persisted(&change.mod_id, change.requested_enabled);
                report.written.push(change);
            }
            Err(failure) => report.failures.push(failure),
        }
    }
    report
}

fn commit_all_or_nothing<W>(
    ledger: &StagedChangeLedger,
    writer: &W,
    changes: Vec<PendingChange>,
) -> CommitReport
where
    W: EnablementWriter + ?Sized,
{
    let mut report = CommitReport::default();
    let mut written: Vec<(usize, bool)> = Vec::new();

    for (position, change) in changes.iter().enumerate() {
        let previous = ledger
            .committed_enabled(&change.mod_id)
            .unwrap_or(!change.requested_enabled);
        match write_one(writer, &change.mod_id, change.requested_enabled) {
            Ok(()) => written.push((position, previous)),
            Err(failure) => {
                report.failures.push(failure);
                break;
            }
        }
    }

    if report.failures.is_empty() {
        for change in &changes {
            ledger.mark_persisted(&change.mod_id, change.requested_enabled);
        }
        report.written = changes;
        return report;
    }

    for (position, previous) in written.into_iter().rev() {
        let mod_id = changes[position].mod_id.as_str();
        match write_one(writer, mod_id, previous) {
            Ok(()) => debug!(
                "event=commit_rollback module=staging status=ok mod_id={}",
                mod_id
            ),
            Err(mut failure) => {
                error!(
                    "event=commit_rollback module=staging status=error mod_id={}",
                    mod_id
                );
                failure.during_rollback = true;
                report.failures.push(failure);
            }
        }
    }
    ledger.restore_pending(changes);
    report.rolled_back = true;
    report
}

fn write_one<W>(writer: &W, mod_id: &str, enabled: bool) -> Result<(), PersistenceFailure>
where
    W: EnablementWriter + ?Sized,
{
    writer.write_enablement(mod_id, enabled).map_err(|err| {
        warn!(
            "event=commit_write module=staging status=error mod_id={} enabled={} error={}",
            mod_id, enabled, err
        );
        PersistenceFailure {
            mod_id: mod_id.to_string(),
            enabled,
            message: err.to_string(),
            during_rollback: false,
        }
    })
}
