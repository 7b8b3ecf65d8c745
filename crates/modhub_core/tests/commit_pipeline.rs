use modhub_core::db::{open_db, open_db_in_memory};
use modhub_core::{
    commit, CommitPolicy, EnablementWriter, ModListService, ModRecord, ModRegistry, PendingChange,
    SqliteEnablementStore, StagedChangeLedger,
};
use semver::Version;
use std::cell::RefCell;
use std::sync::Arc;

fn registry() -> Arc<ModRegistry> {
    let registry = ModRegistry::new();
    registry
        .load(vec![
            ModRecord::new("A", "Alpha", "x", Version::new(1, 0, 0), true),
            ModRecord::new("B", "Beta", "x", Version::new(1, 0, 0), false),
            ModRecord::new("C", "Gamma", "x", Version::new(2, 1, 0), false),
        ])
        .unwrap();
    Arc::new(registry)
}

#[test]
fn commit_writes_each_change_once_and_clears_despite_failures() {
    let ledger = StagedChangeLedger::new(registry());
    ledger.toggle("A", false).unwrap();
    ledger.toggle("B", true).unwrap();
    ledger.toggle("C", true).unwrap();

    let calls = RefCell::new(Vec::new());
    let writer = |mod_id: &str, enabled: bool| -> Result<(), String> {
        calls.borrow_mut().push((mod_id.to_string(), enabled));
        if mod_id == "B" {
            Err("read-only volume".to_string())
        } else {
            Ok(())
        }
    };

    let report = commit(&ledger, &writer, CommitPolicy::BestEffort);

    assert_eq!(calls.borrow().len(), 3);
    assert_eq!(report.failed_ids(), vec!["B"]);
    assert_eq!(report.failures[0].message, "read-only volume");
    assert_eq!(report.written.len(), 2);
    assert!(!ledger.has_pending_changes());

    let report = commit(&ledger, &writer, CommitPolicy::BestEffort);
    assert!(report.written.is_empty());
    assert_eq!(calls.borrow().len(), 3);
}

#[test]
fn end_to_end_toggle_and_commit() {
    let registry = registry();
    assert_eq!(registry.find_by_id("A").unwrap().id, "A");
    assert!(registry.find_by_id("B").is_none());
    assert!(registry.is_present("B"));

    let ledger = StagedChangeLedger::new(Arc::clone(&registry));
    ledger.toggle("B", true).unwrap();
    assert!(ledger.has_pending_changes());
    assert_eq!(ledger.pending_changes(), vec![PendingChange::new("B", true)]);

    ledger.toggle("B", false).unwrap();
    assert!(!ledger.has_pending_changes());

    ledger.toggle("B", true).unwrap();
    let calls = RefCell::new(Vec::new());
    let writer = |mod_id: &str, enabled: bool| -> Result<(), String> {
        calls.borrow_mut().push((mod_id.to_string(), enabled));
        Ok(())
    };
    let report = commit(&ledger, &writer, CommitPolicy::BestEffort);

    assert!(report.is_clean());
    assert_eq!(*calls.borrow(), vec![("B".to_string(), true)]);
    assert!(ledger.pending_changes().is_empty());
}

#[test]
fn retoggling_to_just_committed_value_stages_nothing() {
    let ledger = StagedChangeLedger::new(registry());
    ledger.toggle("B", true).unwrap();
    let writer = |_: &str, _: bool| -> Result<(), String> { Ok(()) };
    commit(&ledger, &writer, CommitPolicy::BestEffort);

    ledger.toggle("B", true).unwrap();
    assert!(!ledger.has_pending_changes());
    ledger.toggle("B", false).unwrap();
    assert_eq!(ledger.pending_changes(), vec![PendingChange::new("B", false)]);
}

#[test]
fn service_confirm_persists_to_sqlite_store() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("mods.sqlite3");
    let conn = open_db(&path).unwrap();
    let store = SqliteEnablementStore::new(&conn);

    let service = ModListService::new(registry(), CommitPolicy::BestEffort);
    service.open();
    service.toggle("C", true).unwrap();
    service.toggle("A", false).unwrap();
    assert!(service.can_commit());

    let report = service.confirm(&store);
    assert!(report.is_clean());
    assert!(!service.can_commit());

    let decisions = store.load_all().unwrap();
    assert_eq!(decisions.get("A"), Some(&false));
    assert_eq!(decisions.get("C"), Some(&true));
    assert!(!decisions.contains_key("B"));
}

#[test]
fn all_or_nothing_keeps_ledger_when_store_rejects_a_write() {
    let ledger = StagedChangeLedger::new(registry());
    ledger.toggle("B", true).unwrap();
    ledger.toggle("C", true).unwrap();

    let writer = |mod_id: &str, _: bool| -> Result<(), String> {
        if mod_id == "C" {
            Err("disk full".to_string())
        } else {
            Ok(())
        }
    };
    let report = commit(&ledger, &writer, CommitPolicy::AllOrNothing);

    assert!(report.rolled_back);
    assert!(ledger.has_pending_changes());
    assert_eq!(ledger.pending_changes().len(), 2);
    assert_eq!(ledger.committed_enabled("B"), Some(false));
}

/// Fails every write for one mod, delegating the rest to the SQLite store.
struct FailingFor<'a> {
    store: &'a SqliteEnablementStore<'a>,
    failing_id: &'static str,
}

impl EnablementWriter for FailingFor<'_> {
    type Error = String;

    fn write_enablement(&self, mod_id: &str, enabled: bool) -> Result<(), String> {
        if mod_id == self.failing_id {
            return Err("simulated outage".to_string());
        }
        self.store
            .write_enablement(mod_id, enabled)
            .map_err(|err| err.to_string())
    }
}

#[test]
fn all_or_nothing_rollback_writes_committed_value_back_to_store() {
    let conn = open_db_in_memory().unwrap();
    let store = SqliteEnablementStore::new(&conn);
    let ledger = StagedChangeLedger::new(registry());
    ledger.toggle("A", false).unwrap();
    ledger.toggle("B", true).unwrap();

    let writer = FailingFor {
        store: &store,
        failing_id: "B",
    };
    let report = commit(&ledger, &writer, CommitPolicy::AllOrNothing);

    assert!(report.is_fully_reverted());
    // `A` had no durable row; rollback leaves one holding its committed value.
    let decisions = store.load_all().unwrap();
    assert_eq!(decisions.get("A"), Some(&true));
    assert!(!decisions.contains_key("B"));
    assert_eq!(store.history("A").unwrap().len(), 2);
}

#[test]
fn padded_identity_is_reported_as_persistence_failure() {
    let registry = ModRegistry::new();
    registry
        .load(vec![ModRecord::new(
            " padded",
            "Padded",
            "x",
            Version::new(1, 0, 0),
            false,
        )])
        .unwrap();
    let ledger = StagedChangeLedger::new(Arc::new(registry));
    ledger.toggle(" padded", true).unwrap();

    let conn = open_db_in_memory().unwrap();
    let store = SqliteEnablementStore::new(&conn);
    let report = commit(&ledger, &store, CommitPolicy::BestEffort);

    assert_eq!(report.failed_ids(), vec![" padded"]);
    assert_eq!(ledger.committed_enabled(" padded"), Some(false));
    assert!(store.load_all().unwrap().is_empty());
}
