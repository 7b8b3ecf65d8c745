//! Write-once mod registry.
//!
//! # Responsibility
//! - Accept the finished record list from the loading pipeline in one batch.
//! - Serve identity, origin and enumeration lookups to any caller.
//!
//! # Invariants
//! - `id` is unique across the registry; a batch with duplicates is rejected
//!   whole and leaves the registry untouched.
//! - Records are never removed or re-keyed once loaded.
//! - Reads are lock-free after `load` publishes the index.

use crate::model::mod_record::{CodeOrigin, ModId, ModRecord};
use log::{error, info};
use once_cell::sync::OnceCell;
use std::collections::BTreeMap;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Registry load errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RegistryError {
    /// Two records in the batch share one identity.
    DuplicateIdentity(ModId),
    /// `load` already published a catalogue for this registry.
    AlreadyLoaded,
}

impl Display for RegistryError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::DuplicateIdentity(value) => write!(f, "mod id registered twice: {value}"),
            Self::AlreadyLoaded => write!(f, "mod registry is already loaded"),
        }
    }
}

impl Error for RegistryError {}

#[derive(Debug, Default)]
struct RegistryIndex {
    /// Insertion order as handed over by the loading pipeline.
    records: Vec<ModRecord>,
    by_id: BTreeMap<ModId, usize>,
}

impl RegistryIndex {
    fn build(records: Vec<ModRecord>) -> Result<Self, RegistryError> {
        let mut by_id = BTreeMap::new();
        for (position, record) in records.iter().enumerate() {
            if by_id.insert(record.id.clone(), position).is_some() {
                return Err(RegistryError::DuplicateIdentity(record.id.clone()));
            }
        }
        Ok(Self { records, by_id })
    }

    fn get(&self, mod_id: &str) -> Option<&ModRecord> {
        self.by_id
            .get(mod_id)
            .and_then(|position| self.records.get(*position))
    }
}

/// Catalogue of every mod known to the host.
///
/// Construct one per host and share it by reference (`Arc<ModRegistry>`)
/// with every collaborator. Before `load` completes, all lookups behave as
/// if the registry were empty.
#[derive(Debug, Default)]
pub struct ModRegistry {
    index: OnceCell<RegistryIndex>,
}

impl ModRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Publishes the loading pipeline's record list.
    ///
    /// # Errors
    /// - `DuplicateIdentity` when two records share an `id`; nothing is stored.
    /// - `AlreadyLoaded` when a previous `load` succeeded; nothing changes.
    pub fn load(&self, records: Vec<ModRecord>) -> Result<(), RegistryError> {
        if self.index.get().is_some() {
            error!("event=registry_load module=registry status=error error_code=already_loaded");
            return Err(RegistryError::AlreadyLoaded);
        }

        let count = records.len();
        let index = RegistryIndex::build(records).map_err(|err| {
            error!(
                "event=registry_load module=registry status=error error_code=duplicate_identity error={}",
                err
            );
            err
        })?;

        if self.index.set(index).is_err() {
            error!("event=registry_load module=registry status=error error_code=already_loaded");
            return Err(RegistryError::AlreadyLoaded);
        }

        info!(
            "event=registry_load module=registry status=ok count={} enabled={}",
            count,
            self.records().iter().filter(|record| record.enabled).count()
        );
        Ok(())
    }

    /// Returns whether `load` has published a catalogue.
    pub fn is_loaded(&self) -> bool {
        self.index.get().is_some()
    }

    pub fn len(&self) -> usize {
        self.records().len()
    }

    pub fn is_empty(&self) -> bool {
        self.records().is_empty()
    }

    /// Looks up an enabled mod by identity.
    ///
    /// Disabled mods are reported as absent so dependents cannot bind to code
    /// that never loaded. Use [`ModRegistry::is_present`] to tell "not
    /// installed" apart from "installed but disabled".
    pub fn find_by_id(&self, mod_id: &str) -> Option<&ModRecord> {
        self.get(mod_id).filter(|record| record.enabled)
    }

    /// Returns whether `mod_id` is installed, regardless of enablement.
    pub fn is_present(&self, mod_id: &str) -> bool {
        self.get(mod_id).is_some()
    }

    /// Finds the mod whose loaded code unit is `origin`.
    pub fn find_by_origin(&self, origin: CodeOrigin) -> Option<&ModRecord> {
        self.records()
            .iter()
            .find(|record| record.code_origin == Some(origin))
    }

    /// Returns an owned snapshot of every record in insertion order.
    ///
    /// Display ordering is the caller's job, see
    /// [`crate::service::mod_list_service::display_order`].
    pub fn all_records(&self) -> Vec<ModRecord> {
        self.records().to_vec()
    }

    /// Unfiltered lookup, including disabled mods.
    pub(crate) fn get(&self, mod_id: &str) -> Option<&ModRecord> {
        self.index.get().and_then(|index| index.get(mod_id))
    }

    fn records(&self) -> &[ModRecord] {
        self.index
            .get()
            .map_or(&[][..], |index| index.records.as_slice())
    }
}
