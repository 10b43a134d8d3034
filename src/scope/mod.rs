//! Scopes and groups
//!
//! A [`Scope`] is the bookkeeping unit clump checks run against: it maps
//! aliases to canonical names and records which names it owns, its clumps,
//! required names and defaults. Every parser has one; every group attached
//! to a parser has its own.

use crate::clump::{ClumpSet, Clumps};
use crate::error::{CliError, CliResult};
use crate::value::{Namespace, Value};
use std::collections::{BTreeMap, BTreeSet};

/// Alias table, membership and constraints of one namespace level
#[derive(Debug, Clone, Default)]
pub struct Scope {
    label: String,
    aliases: BTreeMap<String, String>,
    members: BTreeSet<String>,
    clumps: ClumpSet,
    required: BTreeSet<String>,
    defaults: Namespace,
}

impl Scope {
    /// Empty scope reported as `label` in clump diagnostics
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            ..Self::default()
        }
    }

    /// Diagnostic label
    pub fn label(&self) -> &str {
        &self.label
    }

    /// Canonical name for `name`, if this scope knows it
    pub fn dealias(&self, name: &str) -> Option<&str> {
        self.aliases.get(name).map(String::as_str)
    }

    /// Whether `name` is a member or an alias of one
    pub fn owns(&self, name: &str) -> bool {
        self.members.contains(name) || self.aliases.contains_key(name)
    }

    /// Canonical names registered here
    pub fn members(&self) -> &BTreeSet<String> {
        &self.members
    }

    /// Clumps owned by this scope
    pub fn clumps(&self) -> &ClumpSet {
        &self.clumps
    }

    /// Names that must be supplied
    pub fn required(&self) -> &BTreeSet<String> {
        &self.required
    }

    /// Fallback values
    pub fn defaults(&self) -> &Namespace {
        &self.defaults
    }

    pub(crate) fn relabel(&mut self, label: &str) {
        self.label = label.to_string();
    }

    pub(crate) fn alias(&mut self, alias: impl Into<String>, canonical: impl Into<String>) {
        self.aliases.insert(alias.into(), canonical.into());
    }

    /// Record a member along with its constraints
    pub(crate) fn admit(
        &mut self,
        name: &str,
        clumps: &Clumps,
        required: bool,
        default: Option<Value>,
    ) {
        self.members.insert(name.to_string());
        self.aliases.insert(name.to_string(), name.to_string());
        self.clumps.join(name, clumps);
        if required {
            self.required.insert(name.to_string());
        }
        if let Some(value) = default {
            self.defaults.insert(name, value);
        }
    }

    pub(crate) fn join(&mut self, name: &str, clumps: &Clumps) {
        self.clumps.join(name, clumps);
    }

    pub(crate) fn require(&mut self, name: &str) {
        self.required.insert(name.to_string());
    }

    pub(crate) fn set_default(&mut self, name: &str, value: Value) {
        self.defaults.insert(name, value);
    }

    /// Drop every trace of `name`: aliases, membership, clumps, requirement, default
    pub(crate) fn forget(&mut self, name: &str) {
        self.aliases.retain(|_, canonical| canonical != name);
        self.members.remove(name);
        self.clumps.forget(name);
        self.required.remove(name);
        self.defaults.remove(name);
    }
}

/// Options for [`Parser::attach_group`](crate::Parser::attach_group)
#[derive(Debug, Clone, Default)]
pub struct GroupSpec {
    pub(crate) required: bool,
    pub(crate) clumps: Clumps,
}

impl GroupSpec {
    /// Group with no outer constraints
    pub fn new() -> Self {
        Self::default()
    }

    /// At least one member must be supplied
    pub fn required(mut self, required: bool) -> Self {
        self.required = required;
        self
    }

    /// Clumps of the parent the group joins as a unit
    pub fn clumps(mut self, clumps: Clumps) -> Self {
        self.clumps = clumps;
        self
    }
}

/// A named sub-namespace of a parser with clumps of its own
#[derive(Debug, Clone)]
pub struct Group {
    scope: Scope,
}

impl Group {
    pub(crate) fn new(name: &str) -> Self {
        Self {
            scope: Scope::new(name),
        }
    }

    /// Group name
    pub fn name(&self) -> &str {
        self.scope.label()
    }

    /// The group's own bookkeeping
    pub fn scope(&self) -> &Scope {
        &self.scope
    }

    pub(crate) fn scope_mut(&mut self) -> &mut Scope {
        &mut self.scope
    }

    /// Whether any supplied name belongs to this group
    pub fn touched(&self, parsed: &BTreeSet<String>) -> bool {
        parsed.iter().any(|name| self.scope.owns(name))
    }
}

/// Returned by `attach_group`; names the group for later registration
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct GroupHandle {
    name: String,
}

impl GroupHandle {
    pub(crate) fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }

    /// Group name
    pub fn name(&self) -> &str {
        &self.name
    }
}

impl AsRef<str> for GroupHandle {
    fn as_ref(&self) -> &str {
        &self.name
    }
}

/// Check that `name` can be used as a group name
pub(crate) fn validate_group_name(name: &str) -> CliResult<()> {
    let mut chars = name.chars();
    let valid = match chars.next() {
        Some(first) => {
            (first.is_alphabetic() || first == '_')
                && chars.all(|c| c.is_alphanumeric() || c == '_')
        }
        None => false,
    };
    if valid {
        Ok(())
    } else {
        Err(CliError::config(format!(
            "Group name '{}' is not a valid identifier",
            name
        )))
    }
}
