use modhub_core::{ModRecord, ModRegistry, PendingChange, StagedChangeLedger, StagingError};
use semver::Version;
use std::sync::Arc;
use std::thread;

fn ledger() -> StagedChangeLedger {
    let registry = ModRegistry::new();
    registry
        .load(vec![
            ModRecord::new("shaders", "Shaders", "a", Version::new(1, 4, 0), true),
            ModRecord::new("minimap", "Minimap", "b", Version::new(0, 9, 2), false),
        ])
        .unwrap();
    StagedChangeLedger::new(Arc::new(registry))
}

#[test]
fn unknown_identity_is_rejected_without_mutation() {
    let ledger = ledger();
    ledger.toggle("minimap", true).unwrap();
    let before = ledger.pending_changes();

    let err = ledger.toggle("ghost", true).unwrap_err();
    assert_eq!(err, StagingError::UnknownIdentity("ghost".to_string()));
    assert_eq!(ledger.pending_changes(), before);
}

#[test]
fn net_zero_toggle_sequence_leaves_no_entry() {
    let ledger = ledger();
    ledger.toggle("minimap", true).unwrap();
    assert!(ledger.has_pending_changes());
    ledger.toggle("minimap", false).unwrap();
    assert!(!ledger.has_pending_changes());
    assert!(ledger.pending_changes().is_empty());
}

#[test]
fn three_toggles_reconcile_against_committed_value() {
    let ledger = ledger();
    ledger.toggle("shaders", false).unwrap();
    ledger.toggle("shaders", true).unwrap();
    ledger.toggle("shaders", false).unwrap();
    assert_eq!(
        ledger.pending_changes(),
        vec![PendingChange::new("shaders", false)]
    );
    ledger.toggle("shaders", true).unwrap();
    assert!(ledger.pending_changes().is_empty());
}

#[test]
fn repeated_toggles_to_same_state_are_idempotent() {
    let ledger = ledger();
    for _ in 0..5 {
        ledger.toggle("minimap", true).unwrap();
    }
    assert_eq!(
        ledger.pending_changes(),
        vec![PendingChange::new("minimap", true)]
    );
}

#[test]
fn clear_empties_the_ledger() {
    let ledger = ledger();
    ledger.toggle("minimap", true).unwrap();
    ledger.toggle("shaders", false).unwrap();
    ledger.clear();
    assert!(!ledger.has_pending_changes());
    ledger.clear();
    assert!(ledger.is_empty());
}

#[test]
fn polling_reader_never_sees_torn_state() {
    let ledger = Arc::new(ledger());

    let writer = {
        let ledger = Arc::clone(&ledger);
        thread::spawn(move || {
            for i in 0..2_000 {
                ledger.toggle("minimap", i % 2 == 0).unwrap();
            }
        })
    };

    for _ in 0..2_000 {
        let pending = ledger.pending_changes();
        assert!(pending.len() <= 1);
        if let Some(change) = pending.first() {
            assert_eq!(change, &PendingChange::new("minimap", true));
        }
    }

    writer.join().unwrap();
    assert!(!ledger.has_pending_changes());
}
