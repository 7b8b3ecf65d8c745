//! Mod record domain model.
//!
//! # Responsibility
//! - Describe one discovered extension: identity, display metadata,
//!   effective enablement and loaded-code handle.
//!
//! # Invariants
//! - `id` is assigned at discovery time and never reused for another mod.
//! - `enabled` is the effective state decided by the loading pipeline; this
//!   crate never flips it.
//! - `code_origin` is `None` when the mod failed to load.

use semver::Version;
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};
use uuid::Uuid;

/// Stable identity of one mod, e.g. `example.minimap`.
pub type ModId = String;

/// Opaque handle for one loaded code unit.
///
/// The loading pipeline assigns one origin per loaded unit; the registry only
/// compares origins for equality.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CodeOrigin(Uuid);

impl CodeOrigin {
    /// Allocates a fresh origin handle.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Wraps an origin handle that already exists on the host side.
    pub fn from_uuid(value: Uuid) -> Self {
        Self(value)
    }

    pub fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl Default for CodeOrigin {
    fn default() -> Self {
        Self::new()
    }
}

impl Display for CodeOrigin {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Canonical record for one discovered mod.
///
/// Fields are public for pattern matching and serialization, but callers
/// only ever see copies handed out by the registry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModRecord {
    /// Globally unique identity.
    pub id: ModId,
    /// Human-readable name shown in the mod list.
    pub display_name: String,
    pub author: String,
    pub version: Version,
    /// Effective (loaded-pipeline) enablement state.
    pub enabled: bool,
    /// Loaded code unit; absent when loading failed.
    #[serde(default)]
    pub code_origin: Option<CodeOrigin>,
}

impl ModRecord {
    /// Creates a record with no code origin attached.
    pub fn new(
        id: impl Into<ModId>,
        display_name: impl Into<String>,
        author: impl Into<String>,
        version: Version,
        enabled: bool,
    ) -> Self {
        Self {
            id: id.into(),
            display_name: display_name.into(),
            author: author.into(),
            version,
            enabled,
            code_origin: None,
        }
    }

    /// Attaches the loaded code unit handle.
    pub fn with_origin(mut self, origin: CodeOrigin) -> Self {
        self.code_origin = Some(origin);
        self
    }

    /// Returns whether the mod's code was actually loaded.
    pub fn is_loaded(&self) -> bool {
        self.code_origin.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::{CodeOrigin, ModRecord};
    use semver::Version;

    #[test]
    fn origins_are_unique_per_allocation() {
        assert_ne!(CodeOrigin::new(), CodeOrigin::new());
    }

    #[test]
    fn deserializes_record_without_origin() {
        let record: ModRecord = serde_json::from_str(
            r#"{
                "id": "example.minimap",
                "display_name": "Minimap",
                "author": "someone",
                "version": "1.2.3",
                "enabled": true
            }"#,
        )
        .expect("record json should parse");

        assert_eq!(record.id, "example.minimap");
        assert_eq!(record.version, Version::new(1, 2, 3));
        assert!(record.code_origin.is_none());
        assert!(!record.is_loaded());
    }

    #[test]
    fn with_origin_marks_record_loaded() {
        let origin = CodeOrigin::new();
        let record = ModRecord::new("a", "A", "x", Version::new(0, 1, 0), true).with_origin(origin);
        assert_eq!(record.code_origin, Some(origin));
        assert!(record.is_loaded());
    }
}
