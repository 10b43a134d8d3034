//! Parser: registration tables, lookups and edits
//!
//! A [`Parser`] owns the flags, positionals, subcommands and groups of one
//! command level. Subcommands are full parsers of their own, nested in the
//! parent's command table, so the tree is walked by ordinary ownership.

mod group;
mod parse;
mod tokenizer;

pub use group::GroupScope;
pub use parse::ParseOptions;

use crate::clump::Clumps;
use crate::entity::{ArgSpec, CommandSpec, Entity, FlagSpec, Param, Repeat, Short, SpecBuilder};
use crate::error::{CliError, CliResult};
use crate::help::{HelpRenderer, PlainHelp};
use crate::scope::{validate_group_name, Group, GroupHandle, GroupSpec, Scope};
use crate::value::{Namespace, Value};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::debug;

/// Canonical name of the built-in help flag
pub const HELP: &str = "help";

const ROOT_LABEL: &str = "<root>";

/// Parser-wide settings, inherited by subcommands
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ParserSettings {
    /// Description shown at the top of the help screen
    pub desc: String,
    /// Short-flag prefix; doubled for long flags
    pub flag_prefix: String,
    /// Print usage and exit the process on error
    pub systemexit: bool,
    /// Do not register the built-in help flag
    pub no_help: bool,
    /// Program name for usage lines (defaults to argv[0])
    pub prog: Option<String>,
}

impl Default for ParserSettings {
    fn default() -> Self {
        Self {
            desc: String::new(),
            flag_prefix: "-".to_string(),
            systemexit: true,
            no_help: false,
            prog: None,
        }
    }
}

impl ParserSettings {
    /// Set the description
    pub fn desc(mut self, desc: impl Into<String>) -> Self {
        self.desc = desc.into();
        self
    }

    /// Set the flag prefix
    pub fn flag_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.flag_prefix = prefix.into();
        self
    }

    /// Set whether errors terminate the process
    pub fn systemexit(mut self, systemexit: bool) -> Self {
        self.systemexit = systemexit;
        self
    }

    /// Skip the built-in help flag
    pub fn no_help(mut self, no_help: bool) -> Self {
        self.no_help = no_help;
        self
    }

    /// Set the program name
    pub fn prog(mut self, prog: impl Into<String>) -> Self {
        self.prog = Some(prog.into());
        self
    }

    /// Prefix of long flags
    pub fn long_prefix(&self) -> String {
        self.flag_prefix.repeat(2)
    }
}

/// Where an entity is registered
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Target {
    Root,
    Group(usize),
}

/// One command level: flags, positionals, subcommands and groups
#[derive(Debug, Clone)]
pub struct Parser {
    name: Option<String>,
    path: Vec<String>,
    settings: ParserSettings,
    scope: Scope,
    flags: BTreeMap<String, Entity>,
    args: Vec<Entity>,
    slots: Vec<String>,
    last_arg_consumes: bool,
    commands: BTreeMap<String, Parser>,
    groups: Vec<Group>,
    builtin_help: bool,
    renderer: Arc<dyn HelpRenderer>,
}

impl Parser {
    /// Create a top-level parser
    pub fn new(settings: ParserSettings) -> CliResult<Self> {
        if settings.flag_prefix.is_empty() {
            return Err(CliError::config("Flag prefix cannot be empty"));
        }
        let no_help = settings.no_help;
        let mut parser = Self {
            name: None,
            path: Vec::new(),
            settings,
            scope: Scope::new(ROOT_LABEL),
            flags: BTreeMap::new(),
            args: Vec::new(),
            slots: Vec::new(),
            last_arg_consumes: false,
            commands: BTreeMap::new(),
            groups: Vec::new(),
            builtin_help: false,
            renderer: Arc::new(PlainHelp),
        };
        if !no_help {
            let help = FlagSpec::new(HELP)
                .param(Param::new("name").default_value(Value::None))
                .help("Show this help screen, or the help of the named flag/argument/command");
            parser.register_flag(help, Target::Root)?;
            parser.builtin_help = true;
        }
        Ok(parser)
    }

    /// Replace the help renderer (inherited by subcommands created afterwards)
    pub fn with_renderer(mut self, renderer: impl HelpRenderer + 'static) -> Self {
        self.renderer = Arc::new(renderer);
        self
    }

    /// Command name, `None` at the top level
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// Subcommands leading from the top-level parser to this one
    pub fn command_path(&self) -> &[String] {
        &self.path
    }

    /// Settings in effect
    pub fn settings(&self) -> &ParserSettings {
        &self.settings
    }

    /// Top-level bookkeeping: aliases, clumps, required names, defaults
    pub fn scope(&self) -> &Scope {
        &self.scope
    }

    /// Registered flags, in name order
    pub fn flags(&self) -> impl Iterator<Item = &Entity> {
        self.flags.values()
    }

    /// Registered positionals, in slot order
    pub fn args(&self) -> &[Entity] {
        &self.args
    }

    /// Subcommands, in name order
    pub fn commands(&self) -> impl Iterator<Item = (&str, &Parser)> {
        self.commands.iter().map(|(name, cmd)| (name.as_str(), cmd))
    }

    /// Attached groups, in attachment order
    pub fn groups(&self) -> &[Group] {
        &self.groups
    }

    pub(crate) fn renderer(&self) -> &dyn HelpRenderer {
        self.renderer.as_ref()
    }

    // ---- registration ----

    /// Register a flag at the top level
    pub fn flag(&mut self, spec: FlagSpec) -> CliResult<&mut Self> {
        self.register_flag(spec, Target::Root)?;
        Ok(self)
    }

    /// Register a positional at the top level
    pub fn arg(&mut self, spec: ArgSpec) -> CliResult<&mut Self> {
        self.register_arg(spec, Target::Root)?;
        Ok(self)
    }

    /// Register a subcommand and return its parser
    pub fn command(&mut self, spec: CommandSpec) -> CliResult<&mut Parser> {
        self.register_command(spec, None, Target::Root)
    }

    /// Mount an already-built parser as a subcommand
    pub fn attach_command(&mut self, spec: CommandSpec, parser: Parser) -> CliResult<&mut Parser> {
        self.register_command(spec, Some(parser), Target::Root)
    }

    /// Attach a named group with its own clumps
    pub fn attach_group(&mut self, name: &str, spec: GroupSpec) -> CliResult<GroupHandle> {
        validate_group_name(name)?;
        if self.is_taken(name) {
            return Err(CliError::config(format!("Name '{}' is already in use", name)));
        }
        self.scope.join(name, &spec.clumps);
        if spec.required {
            self.scope.require(name);
        }
        self.groups.push(Group::new(name));
        debug!(group = name, "Attached group");
        Ok(GroupHandle::new(name))
    }

    /// Registration proxy for a group
    pub fn group(&mut self, handle: impl AsRef<str>) -> CliResult<GroupScope<'_>> {
        let name = handle.as_ref();
        let index = self
            .groups
            .iter()
            .position(|g| g.name() == name)
            .ok_or_else(|| CliError::UnknownEntity(name.to_string()))?;
        Ok(GroupScope::new(self, index))
    }

    /// Add an existing flag, positional, command or group to top-level clumps
    pub fn clump(&mut self, name: &str, clumps: Clumps) -> CliResult<&mut Self> {
        let canonical = self
            .resolve(name)
            .ok_or_else(|| CliError::UnknownEntity(name.to_string()))?;
        self.scope.join(&canonical, &clumps);
        Ok(self)
    }

    fn is_taken(&self, name: &str) -> bool {
        self.scope.owns(name)
            || self
                .groups
                .iter()
                .any(|g| g.name() == name || g.scope().owns(name))
    }

    fn scope_for(&mut self, target: Target) -> &mut Scope {
        match target {
            Target::Group(index) => self.groups[index].scope_mut(),
            Target::Root => &mut self.scope,
        }
    }

    fn claim(&self, names: &[String]) -> CliResult<()> {
        match names.iter().find(|n| self.is_taken(n)) {
            Some(taken) => Err(CliError::config(format!(
                "Name '{}' is already in use",
                taken
            ))),
            None => Ok(()),
        }
    }

    /// Record constraints in the target scope; group requirements also apply parser-wide
    fn admit(
        &mut self,
        target: Target,
        canonical: &str,
        aliases: &[String],
        clumps: &Clumps,
        required: bool,
        default: Option<Value>,
    ) {
        let scope = self.scope_for(target);
        scope.admit(canonical, clumps, required, default);
        for alias in aliases {
            scope.alias(alias.clone(), canonical);
        }
        if required && target != Target::Root {
            self.scope.require(canonical);
        }
    }

    pub(crate) fn register_flag(&mut self, spec: FlagSpec, target: Target) -> CliResult<()> {
        let FlagSpec {
            entity: spec,
            short,
            aliases,
            separator,
        } = spec;
        let id = spec.name.clone();
        if id.is_empty() {
            return Err(CliError::config("Flag name cannot be empty"));
        }

        let display = id.replace('_', &separator.to_string());
        let mut names = vec![id.clone()];
        for name in std::iter::once(display.clone()).chain(aliases) {
            if !names.contains(&name) {
                names.push(name);
            }
        }
        self.claim(&names)?;

        let short = match short {
            Short::Disabled => None,
            Short::Char(c) => {
                let s = c.to_string();
                if self.is_taken(&s) {
                    return Err(CliError::config(format!(
                        "Short flag '{}' is already in use",
                        c
                    )));
                }
                Some(c)
            }
            Short::Auto => display
                .chars()
                .filter(|c| c.is_alphanumeric())
                .find(|c| !self.is_taken(&c.to_string())),
        };
        if let Some(c) = short {
            let s = c.to_string();
            if !names.contains(&s) {
                names.push(s);
            }
        }

        let clumps = spec.clumps.clone();
        let required = spec.required;
        let default = spec.default.clone();
        self.admit(target, &id, &names, &clumps, required, default);
        debug!(flag = %id, ?short, ?target, "Registered flag");
        self.flags.insert(id.clone(), Entity::flag(spec, display, short));
        Ok(())
    }

    pub(crate) fn register_arg(&mut self, spec: ArgSpec, target: Target) -> CliResult<()> {
        let ArgSpec {
            entity: spec,
            repeat,
        } = spec;
        let id = spec.name.clone();
        if id.is_empty() {
            return Err(CliError::config("Argument name cannot be empty"));
        }
        if self.last_arg_consumes {
            let consumer = self.slots.last().cloned().unwrap_or_default();
            return Err(CliError::config(format!(
                "Argument '{}' cannot follow '{}', which consumes all remaining positionals",
                id, consumer
            )));
        }
        self.claim(std::slice::from_ref(&id))?;

        match repeat {
            Repeat::Times(0) => {
                return Err(CliError::config(format!(
                    "Argument '{}' must occupy at least one slot",
                    id
                )))
            }
            Repeat::Times(n) => self.slots.extend(std::iter::repeat(id.clone()).take(n)),
            Repeat::Consume => {
                self.slots.push(id.clone());
                self.last_arg_consumes = true;
            }
        }

        let clumps = spec.clumps.clone();
        let required = spec.required;
        let default = spec.default.clone();
        self.admit(target, &id, &[], &clumps, required, default);
        debug!(arg = %id, ?repeat, ?target, "Registered argument");
        self.args.push(Entity::arg(spec, repeat));
        Ok(())
    }

    pub(crate) fn register_command(
        &mut self,
        spec: CommandSpec,
        parser: Option<Parser>,
        target: Target,
    ) -> CliResult<&mut Parser> {
        let name = spec.name.clone();
        if name.is_empty() {
            return Err(CliError::config("Command name cannot be empty"));
        }
        let mut names = vec![name.clone()];
        let invoked = spec.separator.map(|sep| name.replace('_', &sep.to_string()));
        for alias in invoked.into_iter().chain(spec.aliases.iter().cloned()) {
            if !names.contains(&alias) {
                names.push(alias);
            }
        }
        self.claim(&names)?;

        let mut child = match parser {
            Some(parser) => parser,
            None => Parser::new(ParserSettings {
                desc: String::new(),
                ..self.settings.clone()
            })?
            .with_shared_renderer(self.renderer.clone()),
        };
        child.name = Some(name.clone());
        let mut path = self.path.clone();
        path.push(name.clone());
        child.relocate(path, self.settings.prog.clone());
        child.scope.relabel(&name);
        if !spec.desc.is_empty() {
            child.settings.desc = spec.desc.clone();
        }

        self.admit(target, &name, &names, &spec.clumps, spec.required, None);
        debug!(command = %name, ?target, "Registered command");
        Ok(self.commands.entry(name).or_insert(child))
    }

    /// Move a subtree under `path`, taking the program name of its new root
    fn relocate(&mut self, path: Vec<String>, prog: Option<String>) {
        for (name, command) in self.commands.iter_mut() {
            let mut nested = path.clone();
            nested.push(name.clone());
            command.relocate(nested, prog.clone());
        }
        self.path = path;
        self.settings.prog = prog;
    }

    fn with_shared_renderer(mut self, renderer: Arc<dyn HelpRenderer>) -> Self {
        self.renderer = renderer;
        self
    }

    // ---- lookups ----

    /// Canonical name for `name`, or `name` itself if no alias matches
    pub fn dealias(&self, name: &str) -> String {
        self.scope
            .dealias(name)
            .or_else(|| self.groups.iter().find_map(|g| g.scope().dealias(name)))
            .unwrap_or(name)
            .to_string()
    }

    /// Canonical name of an existing flag, positional, command or group
    fn resolve(&self, name: &str) -> Option<String> {
        if self.groups.iter().any(|g| g.name() == name) {
            return Some(name.to_string());
        }
        let canonical = self.dealias(name);
        let exists = self.flags.contains_key(&canonical)
            || self.commands.contains_key(&canonical)
            || self.args.iter().any(|a| a.identifier() == canonical);
        exists.then_some(canonical)
    }

    /// Flag by name or alias
    pub fn get_flag(&self, name: &str) -> Option<&Entity> {
        self.flags.get(&self.dealias(name))
    }

    /// Positional by name
    pub fn get_arg(&self, name: &str) -> Option<&Entity> {
        let canonical = self.dealias(name);
        self.args.iter().find(|a| a.identifier() == canonical)
    }

    /// Flag or positional by name or alias
    pub fn get(&self, name: &str) -> Option<&Entity> {
        self.get_flag(name).or_else(|| self.get_arg(name))
    }

    /// Subcommand by name or alias
    pub fn get_command(&self, name: &str) -> Option<&Parser> {
        self.commands.get(&self.dealias(name))
    }

    /// Mutable subcommand by name or alias
    pub fn command_mut(&mut self, name: &str) -> Option<&mut Parser> {
        let canonical = self.dealias(name);
        self.commands.get_mut(&canonical)
    }

    /// Whether a flag with this name or alias exists
    pub fn has_flag(&self, name: &str) -> bool {
        self.get_flag(name).is_some()
    }

    /// Whether a positional with this name exists
    pub fn has_arg(&self, name: &str) -> bool {
        self.get_arg(name).is_some()
    }

    /// Whether a subcommand with this name or alias exists
    pub fn has_command(&self, name: &str) -> bool {
        self.get_command(name).is_some()
    }

    /// Whether any of `names` is a known flag, positional or command
    pub fn has_any<I, S>(&self, names: I) -> bool
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        names.into_iter().any(|n| self.resolve(n.as_ref()).is_some())
    }

    /// Follow a subcommand path from this parser
    pub fn find_command(&self, path: &[String]) -> Option<&Parser> {
        path.iter()
            .try_fold(self, |parser, name| parser.get_command(name))
    }

    /// Number of positional slots that have no default
    pub(crate) fn mandatory_slots(&self) -> usize {
        self.slots
            .iter()
            .filter(|id| !self.has_default(id))
            .count()
    }

    fn has_default(&self, id: &str) -> bool {
        self.scope.defaults().contains(id)
            || self.groups.iter().any(|g| g.scope().defaults().contains(id))
    }

    // ---- edits ----

    /// Unregister a flag, positional or command, scrubbing it from every
    /// alias table, clump and requirement
    pub fn remove(&mut self, name: &str) -> CliResult<&mut Self> {
        let canonical = self.dealias(name);
        if self.flags.remove(&canonical).is_some() {
            if canonical == HELP {
                self.builtin_help = false;
            }
        } else if let Some(pos) = self.args.iter().position(|a| a.identifier() == canonical) {
            self.args.remove(pos);
            self.slots.retain(|slot| slot != &canonical);
            self.last_arg_consumes = self
                .args
                .last()
                .map_or(false, |a| a.repeat() == Repeat::Consume);
        } else if self.commands.remove(&canonical).is_none() {
            return Err(CliError::UnknownEntity(name.to_string()));
        }

        self.scope.forget(&canonical);
        for group in &mut self.groups {
            group.scope_mut().forget(&canonical);
        }
        debug!(entity = %canonical, "Removed entity");
        Ok(self)
    }

    /// Fallback values, including those of groups and (nested) subcommands
    pub fn defaults(&self) -> Namespace {
        let mut out = self.scope.defaults().clone();
        for group in &self.groups {
            out.merge(group.scope().defaults().clone());
        }
        for (name, cmd) in &self.commands {
            let nested = cmd.defaults();
            if !nested.is_empty() {
                out.insert(name.clone(), nested);
            }
        }
        out
    }

    /// Replace the fallback values of existing flags or positionals
    pub fn set_defaults<I, K, V>(&mut self, defaults: I) -> CliResult<&mut Self>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<Value>,
    {
        for (name, value) in defaults {
            let canonical = self.dealias(name.as_ref());
            if self.get(&canonical).is_none() {
                return Err(CliError::UnknownEntity(name.as_ref().to_string()));
            }
            let target = self
                .groups
                .iter()
                .position(|g| g.scope().members().contains(&canonical))
                .map_or(Target::Root, Target::Group);
            self.scope_for(target).set_default(&canonical, value.into());
        }
        Ok(self)
    }
}
