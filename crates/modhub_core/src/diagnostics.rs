//! Operator-visible messages attributed to the requesting mod.
//!
//! # Responsibility
//! - Resolve the calling mod and attach its display name to a message.
//! - Normalize message text before it reaches the host's notification UI.
//!
//! # Invariants
//! - Attribution never fails; unattributed messages carry `source = None`.
//! - Message text is single-line, with control characters removed.

use crate::model::mod_record::ModId;
use crate::registry::caller::{get_calling_mod, CallerResolver};
use crate::registry::mod_registry::ModRegistry;
use once_cell::sync::Lazy;
use regex::Regex;
use std::fmt::{Display, Formatter};

static CONTROL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\p{Cc}+").expect("valid control char regex"));
static WHITESPACE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").expect("valid ws regex"));

/// Message text with the display name of the mod that requested it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttributedMessage {
    pub source_id: Option<ModId>,
    pub source_name: Option<String>,
    pub text: String,
}

impl Display for AttributedMessage {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match &self.source_name {
            Some(name) => write!(f, "[{name}] {}", self.text),
            None => write!(f, "{}", self.text),
        }
    }
}

/// Builds an operator-visible message attributed to the current caller.
pub fn attribute_message(
    registry: &ModRegistry,
    resolver: &impl CallerResolver,
    text: &str,
) -> AttributedMessage {
    let caller = get_calling_mod(registry, resolver);
    AttributedMessage {
        source_id: caller.map(|record| record.id.clone()),
        source_name: caller.map(|record| normalize_message_text(&record.display_name)),
        text: normalize_message_text(text),
    }
}

fn normalize_message_text(text: &str) -> String {
    let without_controls = CONTROL_RE.replace_all(text, " ");
    WHITESPACE_RE
        .replace_all(without_controls.trim(), " ")
        .into_owned()
}
