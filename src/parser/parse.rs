//! Dispatch, constraint enforcement and result assembly

use super::tokenizer::{Split, UnknownFlag};
use super::{Parser, HELP};
use crate::clump::{ClumpCheck, ClumpSet};
use crate::entity::Entity;
use crate::error::{CliError, CliResult, ParseFailure};
use crate::value::{Namespace, Value};
use std::collections::{BTreeMap, BTreeSet, HashMap};
use tracing::debug;

/// Per-call parsing options
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ParseOptions {
    /// Reject unknown flags and wrong positional counts
    pub strict: bool,
    /// Let subcommands hand unknown flags up to their parents
    pub propagate_unknowns: bool,
    /// Override the parser's `systemexit` setting for this call
    pub systemexit: Option<bool>,
}

impl ParseOptions {
    /// Lenient parse, exit behaviour taken from the parser
    pub fn new() -> Self {
        Self::default()
    }

    /// Set strict mode
    pub fn strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }

    /// Set unknown-flag propagation
    pub fn propagate_unknowns(mut self, propagate: bool) -> Self {
        self.propagate_unknowns = propagate;
        self
    }

    /// Override process-exit behaviour
    pub fn systemexit(mut self, systemexit: bool) -> Self {
        self.systemexit = Some(systemexit);
        self
    }
}

/// Where in the command tree a parse is running
struct Frame<'a> {
    path: Vec<String>,
    ancestors: Vec<&'a ClumpSet>,
}

/// Per-parse entity state, keyed by canonical name; each entity starts
/// from a fresh copy of its template and keeps it across invocations
#[derive(Default)]
struct States {
    by_entity: HashMap<String, Namespace>,
}

impl States {
    fn invoke(&mut self, entity: &Entity, raw: &[String]) -> CliResult<Value> {
        let state = self
            .by_entity
            .entry(entity.identifier().to_string())
            .or_insert_with(|| entity.fresh_state());
        entity.invoke(state, raw)
    }
}

impl Parser {
    /// Parse `args` and return the namespace, never exiting the process
    pub fn try_parse<I, S>(&self, args: I, options: ParseOptions) -> CliResult<Namespace>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Ok(self.try_parse_located(args, options)?)
    }

    /// [`try_parse`](Self::try_parse), keeping the subcommand path of the
    /// parser that failed
    pub fn try_parse_located<I, S>(
        &self,
        args: I,
        options: ParseOptions,
    ) -> Result<Namespace, ParseFailure>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let tokens: Vec<String> = args.into_iter().map(Into::into).collect();
        let frame = Frame {
            path: Vec::new(),
            ancestors: Vec::new(),
        };
        let (namespace, unresolved) = self.parse_level(&tokens, &options, &frame)?;
        if options.strict && !unresolved.is_empty() {
            let shown = unresolved.into_iter().map(|f| f.shown).collect();
            return Err(ParseFailure::new(frame.path, CliError::UnknownFlag(shown)));
        }
        Ok(namespace)
    }

    /// Split `line` with shell quoting rules, then [`try_parse`](Self::try_parse)
    pub fn try_parse_str(&self, line: &str, options: ParseOptions) -> CliResult<Namespace> {
        self.try_parse(lex(line)?, options)
    }

    /// Parse `args`; in CLI mode errors and help requests print to the
    /// terminal and end the process
    pub fn parse<I, S>(&self, args: I, options: ParseOptions) -> CliResult<Namespace>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let result = self.try_parse_located(args, options);
        self.settle(result, options)
    }

    /// [`parse`](Self::parse) for a single shell-quoted string
    pub fn parse_str(&self, line: &str, options: ParseOptions) -> CliResult<Namespace> {
        let result = lex(line)
            .map_err(|err| ParseFailure::new(Vec::new(), err))
            .and_then(|tokens| self.try_parse_located(tokens, options));
        self.settle(result, options)
    }

    /// [`parse`](Self::parse) the process arguments, skipping argv[0]
    pub fn parse_env(&self, options: ParseOptions) -> CliResult<Namespace> {
        self.parse(std::env::args().skip(1), options)
    }

    fn settle(
        &self,
        result: Result<Namespace, ParseFailure>,
        options: ParseOptions,
    ) -> CliResult<Namespace> {
        let exit = options.systemexit.unwrap_or(self.settings.systemexit);
        match result {
            Ok(namespace) => Ok(namespace),
            Err(failure) if exit => self.exit_with(&failure),
            Err(failure) => Err(failure.error),
        }
    }

    fn parse_level(
        &self,
        tokens: &[String],
        options: &ParseOptions,
        frame: &Frame<'_>,
    ) -> Result<(Namespace, Vec<UnknownFlag>), ParseFailure> {
        let here = |err: CliError| ParseFailure::new(frame.path.clone(), err);
        // The top level has no parent to hand unknown flags to
        let propagate = options.propagate_unknowns && !frame.ancestors.is_empty();
        let split = self.split(tokens);
        debug!(command = ?self.name, tokens = tokens.len(), "Parsing");

        let mut states = States::default();
        let mut parsed = self
            .record(&split, options, frame, propagate, &mut states)
            .map_err(here)?;

        let mut unresolved = if propagate { split.unknown } else { Vec::new() };

        if let Some((name, start)) = &split.command {
            let command = self
                .commands
                .get(name)
                .ok_or_else(|| here(CliError::UnknownEntity(name.clone())))?;
            let mut path = frame.path.clone();
            path.push(name.clone());
            let mut ancestors = frame.ancestors.clone();
            ancestors.push(self.scope.clumps());
            let child = Frame { path, ancestors };

            let (nested, leftover) = command.parse_level(&tokens[*start..], options, &child)?;
            parsed.insert(name.clone(), nested);

            for flag in leftover {
                match self.resolve_flag(&flag.name) {
                    Some(id) => {
                        let value = self.invoke_flag(&id, &flag.args, &mut states).map_err(here)?;
                        parsed.insert(id, value);
                    }
                    None => unresolved.push(flag),
                }
            }
        }

        let names: BTreeSet<String> = parsed.keys().map(String::from).collect();
        self.enforce(&names, &frame.ancestors).map_err(here)?;

        let namespace = self.assemble(parsed).map_err(here)?;
        Ok((namespace, unresolved))
    }

    /// Help and strict checks, then every flag and positional of this level
    fn record(
        &self,
        split: &Split,
        options: &ParseOptions,
        frame: &Frame<'_>,
        propagate: bool,
        states: &mut States,
    ) -> CliResult<Namespace> {
        if self.builtin_help {
            if let Some((_, raw)) = split.flags.iter().find(|(id, _)| id == HELP) {
                return Err(CliError::HelpRequested {
                    command_path: frame.path.clone(),
                    topic: raw.first().cloned(),
                });
            }
        }
        if options.strict {
            self.check_strict(split, propagate)?;
        }

        let mut parsed = Namespace::new();
        for (id, raw) in &split.flags {
            let value = self.invoke_flag(id, raw, states)?;
            parsed.insert(id.clone(), value);
        }

        for (slot, token) in self.assign_slots(&split.positionals) {
            let entity = self
                .get_arg(slot)
                .ok_or_else(|| CliError::UnknownEntity(slot.to_string()))?;
            let value = states.invoke(entity, std::slice::from_ref(token))?;
            parsed.insert(slot.to_string(), value);
        }
        Ok(parsed)
    }

    fn invoke_flag(&self, id: &str, raw: &[String], states: &mut States) -> CliResult<Value> {
        let entity = self
            .flags
            .get(id)
            .ok_or_else(|| CliError::UnknownEntity(id.to_string()))?;
        states.invoke(entity, raw)
    }

    /// Pair positionals with slots; a consuming last slot takes the overflow
    fn assign_slots<'s>(&'s self, positionals: &'s [String]) -> Vec<(&'s str, &'s String)> {
        let overflow = self.last_arg_consumes && positionals.len() > self.slots.len();
        match self.slots.last() {
            Some(last) if overflow => positionals
                .iter()
                .enumerate()
                .map(|(i, token)| (self.slots.get(i).unwrap_or(last).as_str(), token))
                .collect(),
            _ => self
                .slots
                .iter()
                .map(String::as_str)
                .zip(positionals)
                .collect(),
        }
    }

    /// Run clump checks for this level and every group it touched
    fn enforce(&self, parsed: &BTreeSet<String>, ancestors: &[&ClumpSet]) -> CliResult<()> {
        let mut present = parsed.clone();
        for group in &self.groups {
            if group.touched(parsed) {
                present.insert(group.name().to_string());
            }
        }
        let members: BTreeMap<String, BTreeSet<String>> = self
            .groups
            .iter()
            .map(|g| (g.name().to_string(), g.scope().members().clone()))
            .collect();

        ClumpCheck::new(self.scope.label(), self.scope.clumps(), self.scope.required())
            .inherit(ancestors)
            .with_groups(&members)
            .run(&present)?;

        let chain: Vec<&ClumpSet> = std::iter::once(self.scope.clumps())
            .chain(ancestors.iter().copied())
            .collect();
        for group in self.groups.iter().filter(|g| present.contains(g.name())) {
            let scope = group.scope();
            ClumpCheck::new(scope.label(), scope.clumps(), scope.required())
                .inherit(&chain)
                .run(parsed)?;
        }
        Ok(())
    }

    /// Defaults first (parser, then groups), supplied values on top
    fn assemble(&self, parsed: Namespace) -> CliResult<Namespace> {
        let mut out = self.scope.defaults().clone();
        for group in &self.groups {
            out.merge(group.scope().defaults().clone());
        }
        out.merge(parsed);

        let expected: BTreeSet<String> = self
            .scope
            .required()
            .iter()
            .filter(|name| !self.groups.iter().any(|g| g.name() == name.as_str()))
            .cloned()
            .collect();
        if expected.iter().any(|name| !out.contains(name)) {
            let got = expected.iter().filter(|n| out.contains(n)).cloned().collect();
            return Err(CliError::Requirement { expected, got });
        }
        Ok(out)
    }
}

fn lex(line: &str) -> CliResult<Vec<String>> {
    shlex::split(line).ok_or_else(|| CliError::Lex(line.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::{ArgSpec, FlagSpec, SpecBuilder};
    use crate::parser::ParserSettings;

    fn options() -> ParseOptions {
        ParseOptions::new().systemexit(false)
    }

    #[test]
    fn test_assign_slots_with_consumer() {
        let mut p = Parser::new(ParserSettings::default()).unwrap();
        p.arg(ArgSpec::new("first"))
            .unwrap()
            .arg(ArgSpec::new("rest").consume_rest())
            .unwrap();
        let positionals: Vec<String> = ["a", "b", "c"].iter().map(|s| s.to_string()).collect();
        let slots: Vec<&str> = p
            .assign_slots(&positionals)
            .into_iter()
            .map(|(slot, _)| slot)
            .collect();
        assert_eq!(slots, vec!["first", "rest", "rest"]);
    }

    #[test]
    fn test_help_requested() {
        let p = Parser::new(ParserSettings::default()).unwrap();
        let err = p.try_parse(["-h", "thing"], options()).unwrap_err();
        match err {
            CliError::HelpRequested {
                command_path,
                topic,
            } => {
                assert!(command_path.is_empty());
                assert_eq!(topic.as_deref(), Some("thing"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_lex_failure() {
        let p = Parser::new(ParserSettings::default()).unwrap();
        let err = p.try_parse_str("unterminated 'quote", options()).unwrap_err();
        assert!(matches!(err, CliError::Lex(_)));
    }

    #[test]
    fn test_defaults_fill_absent() {
        let mut p = Parser::new(ParserSettings::default()).unwrap();
        p.flag(FlagSpec::new("level").default_value(0)).unwrap();
        let ns = p.try_parse(Vec::<String>::new(), options()).unwrap();
        assert_eq!(ns.get("level"), Some(&Value::Int(0)));
    }
}
