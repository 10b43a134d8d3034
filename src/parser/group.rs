//! Registration proxy for a group
//!
//! Entities registered through a [`GroupScope`] live in the parser's tables
//! (so the tokenizer sees them) while their aliases, clumps and defaults are
//! recorded in the group's own scope.

use super::{Parser, Target};
use crate::clump::Clumps;
use crate::entity::{ArgSpec, CommandSpec, FlagSpec};
use crate::error::{CliError, CliResult};
use crate::scope::Group;

/// Mutable view of one group of a parser
#[derive(Debug)]
pub struct GroupScope<'p> {
    parser: &'p mut Parser,
    index: usize,
}

impl<'p> GroupScope<'p> {
    pub(super) fn new(parser: &'p mut Parser, index: usize) -> Self {
        Self { parser, index }
    }

    /// The group being edited
    pub fn group(&self) -> &Group {
        &self.parser.groups[self.index]
    }

    /// Group name
    pub fn name(&self) -> &str {
        self.group().name()
    }

    /// Register a flag in this group
    pub fn flag(&mut self, spec: FlagSpec) -> CliResult<&mut Self> {
        self.parser.register_flag(spec, Target::Group(self.index))?;
        Ok(self)
    }

    /// Register a positional in this group
    pub fn arg(&mut self, spec: ArgSpec) -> CliResult<&mut Self> {
        self.parser.register_arg(spec, Target::Group(self.index))?;
        Ok(self)
    }

    /// Register a subcommand in this group and return its parser
    pub fn command(&mut self, spec: CommandSpec) -> CliResult<&mut Parser> {
        self.parser
            .register_command(spec, None, Target::Group(self.index))
    }

    /// Add an existing entity of the parser to this group's clumps
    pub fn clump(&mut self, name: &str, clumps: Clumps) -> CliResult<&mut Self> {
        let canonical = self
            .parser
            .resolve(name)
            .ok_or_else(|| CliError::UnknownEntity(name.to_string()))?;
        self.parser.groups[self.index]
            .scope_mut()
            .join(&canonical, &clumps);
        Ok(self)
    }
}
