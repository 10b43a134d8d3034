//! Clump evaluation with cross-kind exemptions

use super::{Clump, ClumpKind, ClumpSet};
use crate::error::{ClumpFailure, CliError, CliResult};
use std::collections::{BTreeMap, BTreeSet};
use tracing::trace;

/// One evaluation of a scope's clumps against the names supplied to it.
///
/// Checks run AND, then OR, then XOR, then plain requirements. A failing
/// clump is excused when its offending members belong to a satisfied clump
/// of another kind:
///
/// - AND failures are excused by satisfied OR and XOR clumps
/// - OR failures are excused by satisfied XOR clumps
/// - XOR failures are excused by satisfied AND clumps, and a single
///   remaining member is tolerated since it is the one actually chosen
///
/// Successes are gathered over the scope's own clumps and every inherited
/// (ancestor) clump set, but only the scope's own clumps can fail.
pub struct ClumpCheck<'a> {
    scope: &'a str,
    own: &'a ClumpSet,
    inherited: Vec<&'a ClumpSet>,
    required: &'a BTreeSet<String>,
    groups: Option<&'a BTreeMap<String, BTreeSet<String>>>,
}

struct Successes {
    and: BTreeSet<String>,
    or: BTreeSet<String>,
    xor: BTreeSet<String>,
}

impl<'a> ClumpCheck<'a> {
    /// Check `own` clumps and `required` names for the scope labelled `scope`
    pub fn new(scope: &'a str, own: &'a ClumpSet, required: &'a BTreeSet<String>) -> Self {
        Self {
            scope,
            own,
            inherited: Vec::new(),
            required,
            groups: None,
        }
    }

    /// Let satisfied ancestor clumps excuse failures here
    pub fn inherit(mut self, ancestors: &[&'a ClumpSet]) -> Self {
        self.inherited.extend_from_slice(ancestors);
        self
    }

    /// Nested-scope mode: group names in a success set also excuse every
    /// member of that group
    pub fn with_groups(mut self, groups: &'a BTreeMap<String, BTreeSet<String>>) -> Self {
        self.groups = Some(groups);
        self
    }

    /// Evaluate against the set of supplied names
    pub fn run(&self, parsed: &BTreeSet<String>) -> CliResult<()> {
        let elim = self.successes(parsed);

        for (clump, received) in self.own.failures(ClumpKind::And, parsed, self.required) {
            let not_exempt: BTreeSet<String> = clump
                .members()
                .difference(&received)
                .filter(|n| !elim.or.contains(*n) && !elim.xor.contains(*n))
                .cloned()
                .collect();
            trace!(scope = self.scope, key = %clump.key(), ?not_exempt, "AND clump failed");
            if !not_exempt.is_empty() {
                let message = format!(
                    "Expected all of the following flags/arguments/commands: {}\n(Got {})",
                    self.display_names(clump.members()),
                    self.display_names_or_none(&received)
                );
                return Err(self.failure(clump, received, not_exempt, parsed, &elim, message));
            }
        }

        for (clump, received) in self.own.failures(ClumpKind::Or, parsed, self.required) {
            let not_exempt: BTreeSet<String> = clump
                .members()
                .difference(&received)
                .filter(|n| !elim.xor.contains(*n))
                .cloned()
                .collect();
            trace!(scope = self.scope, key = %clump.key(), ?not_exempt, "OR clump failed");
            if !not_exempt.is_empty() {
                let message = format!(
                    "Expected at least one of the following flags/arguments/commands: {}\n(Got none)",
                    self.display_names(clump.members())
                );
                return Err(self.failure(clump, received, not_exempt, parsed, &elim, message));
            }
        }

        for (clump, not_received) in self.own.failures(ClumpKind::Xor, parsed, self.required) {
            let given: BTreeSet<String> =
                clump.members().difference(&not_received).cloned().collect();
            trace!(scope = self.scope, key = %clump.key(), ?given, "XOR clump failed");
            if given.is_empty() {
                // Only reachable when a member is required: exactly one is demanded
                let not_exempt = clump.members().intersection(self.required).cloned().collect();
                let message = format!(
                    "Expected exactly one of the following flags/arguments/commands: {}\n(Got none)",
                    self.display_names(clump.members())
                );
                return Err(self.failure(clump, not_received, not_exempt, parsed, &elim, message));
            }
            let not_exempt: BTreeSet<String> = given
                .iter()
                .filter(|n| !elim.and.contains(*n))
                .cloned()
                .collect();
            if not_exempt.len() > 1 {
                let message = format!(
                    "Expected no more than one of the following flags/arguments/commands: {}\n(Got {})",
                    self.display_names(clump.members()),
                    self.display_names(&given)
                );
                return Err(self.failure(clump, not_received, not_exempt, parsed, &elim, message));
            }
        }

        if !self.required.is_subset(parsed) {
            return Err(CliError::Requirement {
                expected: self.required.clone(),
                got: self.required.intersection(parsed).cloned().collect(),
            });
        }

        trace!(scope = self.scope, "clumps satisfied");
        Ok(())
    }

    fn successes(&self, parsed: &BTreeSet<String>) -> Successes {
        let collect = |kind: ClumpKind| -> BTreeSet<String> {
            let mut names: BTreeSet<String> = std::iter::once(self.own)
                .chain(self.inherited.iter().copied())
                .flat_map(|set| set.successes(kind, parsed, self.required))
                .collect();
            if let Some(groups) = self.groups {
                let expanded: Vec<String> = names
                    .iter()
                    .filter_map(|n| groups.get(n))
                    .flat_map(|members| members.iter().cloned())
                    .collect();
                names.extend(expanded);
            }
            names
        };
        Successes {
            and: collect(ClumpKind::And),
            or: collect(ClumpKind::Or),
            xor: collect(ClumpKind::Xor),
        }
    }

    fn failure(
        &self,
        clump: &Clump,
        eliminating: BTreeSet<String>,
        not_exempt: BTreeSet<String>,
        parsed: &BTreeSet<String>,
        elim: &Successes,
        message: String,
    ) -> CliError {
        CliError::clump(ClumpFailure {
            kind: clump.kind(),
            key: clump.key().to_string(),
            scope: self.scope.to_string(),
            members: clump.members().clone(),
            eliminating,
            not_exempt,
            parsed: parsed.clone(),
            and_successes: elim.and.clone(),
            or_successes: elim.or.clone(),
            xor_successes: elim.xor.clone(),
            message,
        })
    }

    /// Quote names; groups render as the bracketed list of their members
    fn display_names(&self, names: &BTreeSet<String>) -> String {
        names
            .iter()
            .map(|n| match self.groups.and_then(|g| g.get(n)) {
                Some(members) => format!("[{}]", crate::error::quoted(members)),
                None => format!("'{}'", n),
            })
            .collect::<Vec<_>>()
            .join(", ")
    }

    fn display_names_or_none(&self, names: &BTreeSet<String>) -> String {
        if names.is_empty() {
            "none".to_string()
        } else {
            self.display_names(names)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clump::ClumpKey;

    fn names(items: &[&str]) -> BTreeSet<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    fn clumps(entries: &[(ClumpKind, &str, &[&str])]) -> ClumpSet {
        let mut set = ClumpSet::new();
        for (kind, key, members) in entries {
            for m in *members {
                set.add(*kind, ClumpKey::from(*key), *m);
            }
        }
        set
    }

    #[test]
    fn test_and_all_or_nothing() {
        let set = clumps(&[(ClumpKind::And, "0", &["a", "b"])]);
        let required = BTreeSet::new();
        let check = ClumpCheck::new("<root>", &set, &required);
        assert!(check.run(&names(&[])).is_ok());
        assert!(check.run(&names(&["a", "b"])).is_ok());
        let err = check.run(&names(&["a"])).unwrap_err();
        let failure = err.clump_failure().unwrap();
        assert!(matches!(err, CliError::And(_)));
        assert_eq!(failure.eliminating, names(&["a"]));
        assert_eq!(failure.not_exempt, names(&["b"]));
        assert_eq!(
            err.to_string(),
            "Expected all of the following flags/arguments/commands: 'a', 'b'\n(Got 'a')"
        );
    }

    #[test]
    fn test_or_at_least_one() {
        let set = clumps(&[(ClumpKind::Or, "0", &["a", "b"])]);
        let required = BTreeSet::new();
        let check = ClumpCheck::new("<root>", &set, &required);
        assert!(matches!(check.run(&names(&[])), Err(CliError::Or(_))));
        assert!(check.run(&names(&["a"])).is_ok());
        assert!(check.run(&names(&["a", "b"])).is_ok());
    }

    #[test]
    fn test_xor_at_most_one() {
        let set = clumps(&[(ClumpKind::Xor, "0", &["a", "b"])]);
        let required = BTreeSet::new();
        let check = ClumpCheck::new("<root>", &set, &required);
        assert!(check.run(&names(&[])).is_ok());
        assert!(check.run(&names(&["b"])).is_ok());
        let err = check.run(&names(&["a", "b"])).unwrap_err();
        assert!(matches!(err, CliError::Xor(_)));
        assert_eq!(err.clump_failure().unwrap().not_exempt, names(&["a", "b"]));
    }

    #[test]
    fn test_xor_required_member_demands_exactly_one() {
        let set = clumps(&[(ClumpKind::Xor, "0", &["a", "b"])]);
        let required = names(&["a"]);
        let check = ClumpCheck::new("<root>", &set, &required);
        assert!(matches!(check.run(&names(&[])), Err(CliError::Xor(_))));
        assert!(matches!(check.run(&names(&["a", "b"])), Err(CliError::Xor(_))));
        assert!(check.run(&names(&["a"])).is_ok());
        // the XOR clump is satisfied by `b`, but `a` itself is still required
        assert!(matches!(
            check.run(&names(&["b"])),
            Err(CliError::Requirement { .. })
        ));
    }

    #[test]
    fn test_and_member_exempted_by_satisfied_or() {
        // either give `a`, or give `b` and `c` together
        let set = clumps(&[
            (ClumpKind::And, "pair", &["b", "c"]),
            (ClumpKind::Or, "any", &["a", "c"]),
        ]);
        let required = BTreeSet::new();
        let check = ClumpCheck::new("<root>", &set, &required);
        // `b` given without `c`, but `c` sits in the satisfied OR clump
        assert!(check.run(&names(&["a", "b"])).is_ok());
        assert!(matches!(check.run(&names(&["b"])), Err(CliError::And(_))));
    }

    #[test]
    fn test_and_member_exempted_by_satisfied_xor() {
        let set = clumps(&[
            (ClumpKind::And, "0", &["a", "b"]),
            (ClumpKind::Xor, "0", &["b", "c"]),
        ]);
        let required = BTreeSet::new();
        let check = ClumpCheck::new("<root>", &set, &required);
        assert!(check.run(&names(&["a", "c"])).is_ok());
    }

    #[test]
    fn test_xor_member_exempted_by_satisfied_and() {
        let set = clumps(&[
            (ClumpKind::And, "0", &["a", "b"]),
            (ClumpKind::Xor, "0", &["a", "b", "c"]),
        ]);
        let required = BTreeSet::new();
        let check = ClumpCheck::new("<root>", &set, &required);
        assert!(check.run(&names(&["a", "b"])).is_ok());
        assert!(matches!(check.run(&names(&["a", "c"])), Err(CliError::And(_))));
    }

    #[test]
    fn test_inherited_successes_excuse_failures() {
        let own = clumps(&[(ClumpKind::And, "0", &["x", "y"])]);
        let parent = clumps(&[(ClumpKind::Or, "0", &["y", "z"])]);
        let required = BTreeSet::new();
        let alone = ClumpCheck::new("grp", &own, &required);
        assert!(alone.run(&names(&["x", "z"])).is_err());
        let nested = ClumpCheck::new("grp", &own, &required).inherit(&[&parent]);
        assert!(nested.run(&names(&["x", "z"])).is_ok());
    }

    #[test]
    fn test_group_names_expand_successes() {
        let own = clumps(&[
            (ClumpKind::Xor, "0", &["grp", "other"]),
            (ClumpKind::Or, "0", &["member"]),
        ]);
        let groups: BTreeMap<String, BTreeSet<String>> =
            [("grp".to_string(), names(&["member"]))].into_iter().collect();
        let required = BTreeSet::new();
        // XOR satisfied by `other`, which excuses every member of `grp` for OR
        let flat = ClumpCheck::new("<root>", &own, &required);
        assert!(matches!(flat.run(&names(&["other"])), Err(CliError::Or(_))));
        let nested = ClumpCheck::new("<root>", &own, &required).with_groups(&groups);
        assert!(nested.run(&names(&["other"])).is_ok());
    }

    #[test]
    fn test_group_rendered_as_member_list() {
        let own = clumps(&[(ClumpKind::Xor, "0", &["grp", "other"])]);
        let groups: BTreeMap<String, BTreeSet<String>> =
            [("grp".to_string(), names(&["member", "more"]))].into_iter().collect();
        let required = BTreeSet::new();
        let err = ClumpCheck::new("<root>", &own, &required)
            .with_groups(&groups)
            .run(&names(&["grp", "other"]))
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "Expected no more than one of the following flags/arguments/commands: ['member', 'more'], 'other'\n(Got ['member', 'more'], 'other')"
        );
    }
}
