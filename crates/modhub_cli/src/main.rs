//! Operator CLI for the mod registry core.
//!
//! # Responsibility
//! - Load a record list the way a host's loading pipeline would.
//! - List mods in display order and apply staged toggles to a SQLite store.

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use log::info;
use modhub_core::db::open_db;
use modhub_core::{
    init_logging_from_config, CommitReport, CoreConfig, ModListRow, ModListService, ModRecord,
    ModRegistry, SqliteEnablementStore,
};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;

/// Inspect installed mods and stage enable/disable decisions.
#[derive(Parser, Debug)]
#[command(name = "modhub")]
#[command(version, about, long_about = None)]
struct Cli {
    /// JSON config file (`log_level`, `log_dir`, `db_path`, `commit_policy`)
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,

    /// SQLite file with confirmed decisions; overrides the config value
    #[arg(long, global = true, value_name = "PATH")]
    db: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print mods in display order
    List {
        /// JSON array of mod records
        records: PathBuf,
    },
    /// Stage `<id>=on|off` toggles and commit them
    Apply {
        /// JSON array of mod records
        records: PathBuf,
        /// Toggles such as `example.minimap=on`
        #[arg(required = true)]
        toggles: Vec<String>,
    },
}

fn main() -> ExitCode {
    match run(Cli::parse()) {
        Ok(code) => code,
        Err(err) => {
            eprintln!("error: {err:#}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<ExitCode> {
    let mut config = match &cli.config {
        Some(path) => {
            let raw = std::fs::read_to_string(path)
                .with_context(|| format!("cannot read config {}", path.display()))?;
            CoreConfig::from_json_str(&raw)?
        }
        None => CoreConfig::default(),
    };
    if let Some(db) = cli.db {
        config.db_path = Some(db);
    }
    init_logging_from_config(&config)?;

    match cli.command {
        Command::List { records } => {
            let registry = load_registry(&records, &config)?;
            let service = ModListService::new(registry, config.commit_policy);
            for row in service.open() {
                println!("{}", format_row(&row));
            }
            Ok(ExitCode::SUCCESS)
        }
        Command::Apply { records, toggles } => {
            let Some(db_path) = config.db_path.clone() else {
                bail!("apply needs a database: pass --db or set db_path in the config");
            };
            let registry = load_registry(&records, &config)?;
            let service = ModListService::new(registry, config.commit_policy);
            service.open();

            for raw in &toggles {
                let (mod_id, enabled) = parse_toggle(raw)?;
                service
                    .toggle(mod_id, enabled)
                    .with_context(|| format!("cannot stage `{raw}`"))?;
            }
            if !service.can_commit() {
                println!("nothing to commit");
                return Ok(ExitCode::SUCCESS);
            }

            let conn = open_db(&db_path)
                .with_context(|| format!("cannot open {}", db_path.display()))?;
            let store = SqliteEnablementStore::new(&conn);
            let report = service.confirm(&store);
            for change in &report.written {
                println!(
                    "{} -> {}",
                    change.mod_id,
                    on_off(change.requested_enabled)
                );
            }
            for failure in &report.failures {
                eprintln!("failed {}: {}", failure.mod_id, failure.message);
            }
            if let Some(notice) = rollback_notice(&report) {
                eprintln!("{notice}");
            }
            info!(
                "event=cli_apply module=cli status={} written={} failed={}",
                if report.is_clean() { "ok" } else { "error" },
                report.written.len(),
                report.failures.len()
            );
            Ok(if report.is_clean() {
                ExitCode::SUCCESS
            } else {
                ExitCode::FAILURE
            })
        }
    }
}

fn load_registry(records_path: &Path, config: &CoreConfig) -> Result<Arc<ModRegistry>> {
    let raw = std::fs::read_to_string(records_path)
        .with_context(|| format!("cannot read {}", records_path.display()))?;
    let mut records: Vec<ModRecord> = serde_json::from_str(&raw)
        .with_context(|| format!("invalid record list in {}", records_path.display()))?;

    if let Some(db_path) = config.db_path.as_deref().filter(|path| path.exists()) {
        let conn = open_db(db_path)?;
        records = SqliteEnablementStore::new(&conn).apply_to(records)?;
    }

    let registry = ModRegistry::new();
    registry.load(records)?;
    Ok(Arc::new(registry))
}

fn parse_toggle(raw: &str) -> Result<(&str, bool)> {
    let Some((mod_id, state)) = raw.split_once('=') else {
        bail!("toggle `{raw}` must look like <id>=on|off");
    };
    let enabled = match state.trim().to_ascii_lowercase().as_str() {
        "on" | "true" | "1" => true,
        "off" | "false" | "0" => false,
        other => bail!("unknown state `{other}` in `{raw}`"),
    };
    Ok((mod_id.trim(), enabled))
}

/// Describes how far an `AllOrNothing` rollback got, if one happened.
fn rollback_notice(report: &CommitReport) -> Option<&'static str> {
    if !report.rolled_back {
        None
    } else if report.is_fully_reverted() {
        Some("commit rolled back; nothing was changed")
    } else {
        Some("commit rolled back, but some reverts failed; the store may be partially changed")
    }
}

fn format_row(row: &ModListRow) -> String {
    let marker = if row.is_dirty() { "*" } else { " " };
    format!(
        "{marker}[{}] {} {} ({}) by {}",
        if row.shown_enabled() { "x" } else { " " },
        row.record.display_name,
        row.record.version,
        row.record.id,
        row.record.author
    )
}

fn on_off(enabled: bool) -> &'static str {
    if enabled {
        "on"
    } else {
        "off"
    }
}
