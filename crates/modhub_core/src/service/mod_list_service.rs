//! Mod list use-case service.
//!
//! # Responsibility
//! - Back the interactive mod list: rows to render, toggles, confirm.
//! - Own the session-scoped ledger and the configured commit policy.
//!
//! # Invariants
//! - Opening the list discards unsaved toggles from a previous session.
//! - Rows are always in display order (`display_name`, then `id`).
//! - `can_commit` reflects the ledger synchronously after every toggle.

use crate::model::mod_record::ModRecord;
use crate::registry::mod_registry::ModRegistry;
use crate::staging::commit::{commit, CommitPolicy, CommitReport, EnablementWriter};
use crate::staging::ledger::{PendingChange, StagedChangeLedger, StagingError};
use std::sync::Arc;

/// One rendered row of the mod list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModListRow {
    pub record: ModRecord,
    /// Value the toggle reconciles against.
    pub committed_enabled: bool,
    /// Operator's unsaved choice, if any.
    pub staged_enabled: Option<bool>,
}

impl ModListRow {
    /// State the toggle widget should show.
    pub fn shown_enabled(&self) -> bool {
        self.staged_enabled.unwrap_or(self.committed_enabled)
    }

    pub fn is_dirty(&self) -> bool {
        self.staged_enabled.is_some()
    }
}

/// Sorts a registry snapshot for display.
///
/// Ordering is case-insensitive on `display_name`, ties broken by `id`.
pub fn display_order(mut records: Vec<ModRecord>) -> Vec<ModRecord> {
    records.sort_by(|left, right| {
        left.display_name
            .to_lowercase()
            .cmp(&right.display_name.to_lowercase())
            .then_with(|| left.id.cmp(&right.id))
    });
    records
}

/// Use-case service behind the interactive mod list.
pub struct ModListService {
    ledger: StagedChangeLedger,
    policy: CommitPolicy,
}

impl ModListService {
    pub fn new(registry: Arc<ModRegistry>, policy: CommitPolicy) -> Self {
        Self {
            ledger: StagedChangeLedger::new(registry),
            policy,
        }
    }

    pub fn policy(&self) -> CommitPolicy {
        self.policy
    }

    pub fn ledger(&self) -> &StagedChangeLedger {
        &self.ledger
    }

    /// (Re)opens the list: drops unsaved toggles and returns fresh rows.
    pub fn open(&self) -> Vec<ModListRow> {
        self.ledger.clear();
        self.rows()
    }

    /// Returns rows in display order with their staged state.
    pub fn rows(&self) -> Vec<ModListRow> {
        display_order(self.ledger.registry().all_records())
            .into_iter()
            .map(|record| ModListRow {
                committed_enabled: self
                    .ledger
                    .committed_enabled(&record.id)
                    .unwrap_or(record.enabled),
                staged_enabled: self.ledger.pending_for(&record.id),
                record,
            })
            .collect()
    }

    /// Forwards one widget interaction to the ledger.
    pub fn toggle(&self, mod_id: &str, enabled: bool) -> Result<(), StagingError> {
        self.ledger.toggle(mod_id, enabled)
    }

    /// Whether the confirm control should be enabled.
    pub fn can_commit(&self) -> bool {
        self.ledger.has_pending_changes()
    }

    pub fn pending_changes(&self) -> Vec<PendingChange> {
        self.ledger.pending_changes()
    }

    /// Flushes staged toggles through `writer` using the configured policy.
    pub fn confirm<W>(&self, writer: &W) -> CommitReport
    where
        W: EnablementWriter + ?Sized,
    {
        commit(&self.ledger, writer, self.policy)
    }
}

#[cfg(test)]
mod tests {
    use super::{display_order, ModListService};
    use crate::model::mod_record::ModRecord;
    use crate::registry::mod_registry::ModRegistry;
    use crate::staging::commit::CommitPolicy;
    use semver::Version;
    use std::sync::Arc;

    fn record(id: &str, name: &str, enabled: bool) -> ModRecord {
        ModRecord::new(id, name, "t", Version::new(1, 0, 0), enabled)
    }

    fn service() -> ModListService {
        let registry = ModRegistry::new();
        registry
            .load(vec![
                record("c", "zoom", true),
                record("a", "Atlas", false),
                record("b", "atlas", true),
            ])
            .expect("load");
        ModListService::new(Arc::new(registry), CommitPolicy::BestEffort)
    }

    #[test]
    fn display_order_is_case_insensitive_with_id_tiebreak() {
        let ids: Vec<String> = display_order(vec![
            record("c", "zoom", true),
            record("b", "atlas", true),
            record("a", "Atlas", false),
        ])
        .into_iter()
        .map(|r| r.id)
        .collect();
        assert_eq!(ids, vec!["a", "b", "c"]);
    }

    #[test]
    fn rows_reflect_staged_toggles() {
        let service = service();
        service.toggle("a", true).expect("toggle");

        let rows = service.rows();
        assert!(rows[0].is_dirty());
        assert!(rows[0].shown_enabled());
        assert!(!rows[0].committed_enabled);
        assert!(!rows[1].is_dirty());
        assert!(service.can_commit());
    }

    #[test]
    fn reopening_discards_unsaved_toggles() {
        let service = service();
        service.toggle("c", false).expect("toggle");
        let rows = service.open();
        assert!(!service.can_commit());
        assert!(rows.iter().all(|row| !row.is_dirty()));
    }

    #[test]
    fn confirm_updates_committed_state_in_rows() {
        let service = service();
        service.toggle("a", true).expect("toggle");
        let writer = |_: &str, _: bool| -> Result<(), String> { Ok(()) };
        let report = service.confirm(&writer);
        assert!(report.is_clean());
        assert!(!service.can_commit());

        let rows = service.rows();
        assert!(rows[0].committed_enabled);
        assert!(!rows[0].record.enabled);
    }
}
