//! Mod registry and staged enablement core.
//!
//! The host's loading pipeline hands a finished record list to
//! [`ModRegistry::load`] once; any mod may then query the registry. The
//! interactive mod list stages toggles in a [`StagedChangeLedger`] and drains
//! them through an [`EnablementWriter`] on confirm.

pub mod config;
pub mod db;
pub mod diagnostics;
pub mod logging;
pub mod model;
pub mod registry;
pub mod repo;
pub mod service;
pub mod staging;

pub use config::{ConfigError, CoreConfig};
pub use diagnostics::{attribute_message, AttributedMessage};
pub use logging::{
    default_log_level, init_logging, init_logging_from_config, logging_status, LoggingError,
};
pub use model::mod_record::{CodeOrigin, ModId, ModRecord};
pub use registry::caller::{
    enter_extension, enter_frame, enter_host, get_calling_mod, CallFrames, CallerResolver,
    ExplicitCaller, FrameGuard, FrameOwner,
};
pub use registry::mod_registry::{ModRegistry, RegistryError};
pub use repo::enablement_repo::{
    EnablementHistoryEntry, SqliteEnablementStore, StoreError, StoreResult,
};
pub use service::mod_list_service::{display_order, ModListRow, ModListService};
pub use staging::commit::{
    commit, CommitPolicy, CommitReport, EnablementWriter, PersistenceFailure,
};
pub use staging::ledger::{PendingChange, StagedChangeLedger, StagingError};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
