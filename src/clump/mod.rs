//! Clump engine
//!
//! A clump is a named AND/OR/XOR constraint over a set of entity names.
//! Clumps are keyed by `(kind, key)` within their owning scope: registering
//! another member against an existing key grows that clump instead of
//! creating a second one.
//!
//! | Kind | passes when | eliminating set on failure |
//! |------|-------------|----------------------------|
//! | AND  | none or all members given | members given |
//! | OR   | at least one member given | members given |
//! | XOR  | at most one given (exactly one with a required member) | members absent |
//!
//! [`ClumpCheck`] evaluates a scope's clumps against a set of supplied names,
//! letting satisfied clumps excuse failures of other kinds.

mod check;

pub use check::ClumpCheck;

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

/// The three constraint kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum ClumpKind {
    /// All members or none
    And,
    /// At least one member
    Or,
    /// At most one member
    Xor,
}

impl ClumpKind {
    /// All kinds in evaluation order
    pub const ALL: [ClumpKind; 3] = [ClumpKind::And, ClumpKind::Or, ClumpKind::Xor];
}

impl fmt::Display for ClumpKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ClumpKind::And => write!(f, "AND"),
            ClumpKind::Or => write!(f, "OR"),
            ClumpKind::Xor => write!(f, "XOR"),
        }
    }
}

/// Identity distinguishing independent clumps of the same kind
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ClumpKey(String);

impl ClumpKey {
    /// The key as a string
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ClumpKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ClumpKey {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for ClumpKey {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<i32> for ClumpKey {
    fn from(i: i32) -> Self {
        Self(i.to_string())
    }
}

impl From<u32> for ClumpKey {
    fn from(i: u32) -> Self {
        Self(i.to_string())
    }
}

impl From<usize> for ClumpKey {
    fn from(i: usize) -> Self {
        Self(i.to_string())
    }
}

/// Clump memberships to attach to an entity, group or command.
///
/// ```
/// use argclump::Clumps;
///
/// let clumps = Clumps::new().and("blah").xor(0);
/// assert!(!clumps.is_empty());
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Clumps {
    pub(crate) and: Option<ClumpKey>,
    pub(crate) or: Option<ClumpKey>,
    pub(crate) xor: Option<ClumpKey>,
}

impl Clumps {
    /// No memberships
    pub fn new() -> Self {
        Self::default()
    }

    /// Join the AND clump with this key
    pub fn and(mut self, key: impl Into<ClumpKey>) -> Self {
        self.and = Some(key.into());
        self
    }

    /// Join the OR clump with this key
    pub fn or(mut self, key: impl Into<ClumpKey>) -> Self {
        self.or = Some(key.into());
        self
    }

    /// Join the XOR clump with this key
    pub fn xor(mut self, key: impl Into<ClumpKey>) -> Self {
        self.xor = Some(key.into());
        self
    }

    /// Whether no membership is set
    pub fn is_empty(&self) -> bool {
        self.and.is_none() && self.or.is_none() && self.xor.is_none()
    }

    /// `(kind, key)` pairs that are set
    pub fn entries(&self) -> impl Iterator<Item = (ClumpKind, &ClumpKey)> {
        [
            (ClumpKind::And, self.and.as_ref()),
            (ClumpKind::Or, self.or.as_ref()),
            (ClumpKind::Xor, self.xor.as_ref()),
        ]
        .into_iter()
        .filter_map(|(kind, key)| key.map(|k| (kind, k)))
    }
}

/// A single constraint instance
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Clump {
    kind: ClumpKind,
    key: ClumpKey,
    members: BTreeSet<String>,
}

impl Clump {
    fn new(kind: ClumpKind, key: ClumpKey) -> Self {
        Self {
            kind,
            key,
            members: BTreeSet::new(),
        }
    }

    /// Constraint kind
    pub fn kind(&self) -> ClumpKind {
        self.kind
    }

    /// Constraint key
    pub fn key(&self) -> &ClumpKey {
        &self.key
    }

    /// Member names
    pub fn members(&self) -> &BTreeSet<String> {
        &self.members
    }

    fn given(&self, parsed: &BTreeSet<String>) -> BTreeSet<String> {
        self.members.intersection(parsed).cloned().collect()
    }

    /// Whether `parsed` satisfies this clump
    pub fn verify(&self, parsed: &BTreeSet<String>, required: &BTreeSet<String>) -> bool {
        let given = self.members.intersection(parsed).count();
        match self.kind {
            ClumpKind::And => given == 0 || given == self.members.len(),
            ClumpKind::Or => given > 0,
            ClumpKind::Xor => {
                if self.has_required(required) {
                    given == 1
                } else {
                    given <= 1
                }
            }
        }
    }

    /// Members that were handled as expected despite the failure
    pub fn eliminate(&self, parsed: &BTreeSet<String>) -> BTreeSet<String> {
        match self.kind {
            ClumpKind::And | ClumpKind::Or => self.given(parsed),
            ClumpKind::Xor => self.members.difference(parsed).cloned().collect(),
        }
    }

    pub(crate) fn has_required(&self, required: &BTreeSet<String>) -> bool {
        !self.members.is_disjoint(required)
    }
}

/// Registry of a scope's clumps, keyed by `(kind, key)`
#[derive(Debug, Clone, Default)]
pub struct ClumpSet {
    clumps: BTreeMap<(ClumpKind, ClumpKey), Clump>,
}

impl ClumpSet {
    /// Empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Add `member` to the clump `(kind, key)`, creating it on first use
    pub fn add(&mut self, kind: ClumpKind, key: ClumpKey, member: impl Into<String>) {
        self.clumps
            .entry((kind, key.clone()))
            .or_insert_with(|| Clump::new(kind, key))
            .members
            .insert(member.into());
    }

    /// Add `member` to every clump named in `clumps`
    pub fn join(&mut self, member: &str, clumps: &Clumps) {
        for (kind, key) in clumps.entries() {
            self.add(kind, key.clone(), member);
        }
    }

    /// Look up a clump
    pub fn get(&self, kind: ClumpKind, key: &ClumpKey) -> Option<&Clump> {
        self.clumps.get(&(kind, key.clone()))
    }

    /// Clumps of one kind
    pub fn of_kind(&self, kind: ClumpKind) -> impl Iterator<Item = &Clump> {
        self.clumps.values().filter(move |c| c.kind == kind)
    }

    /// Every clump
    pub fn iter(&self) -> impl Iterator<Item = &Clump> {
        self.clumps.values()
    }

    /// Number of clumps
    pub fn len(&self) -> usize {
        self.clumps.len()
    }

    /// Whether there are no clumps
    pub fn is_empty(&self) -> bool {
        self.clumps.is_empty()
    }

    /// Member names of every satisfied clump of `kind`
    pub fn successes(
        &self,
        kind: ClumpKind,
        parsed: &BTreeSet<String>,
        required: &BTreeSet<String>,
    ) -> BTreeSet<String> {
        self.of_kind(kind)
            .filter(|c| c.verify(parsed, required))
            .flat_map(|c| c.members.iter().cloned())
            .collect()
    }

    /// Failing clumps of `kind`, paired with their eliminating sets
    pub fn failures<'a>(
        &'a self,
        kind: ClumpKind,
        parsed: &'a BTreeSet<String>,
        required: &'a BTreeSet<String>,
    ) -> impl Iterator<Item = (&'a Clump, BTreeSet<String>)> + 'a {
        self.of_kind(kind)
            .filter(move |c| !c.verify(parsed, required))
            .map(move |c| (c, c.eliminate(parsed)))
    }

    /// Drop `member` from every clump
    pub(crate) fn forget(&mut self, member: &str) {
        for clump in self.clumps.values_mut() {
            clump.members.remove(member);
        }
    }
}
