//! Flags and positional arguments
//!
//! An [`Entity`] is the built form of a [`FlagSpec`] or [`ArgSpec`]: its
//! parameters, callback and state template are fixed at registration, and
//! [`Entity::invoke`] turns the raw tokens routed to it into a [`Value`].

pub mod convert;
pub mod spec;

pub use convert::{Converter, Handler};
pub use spec::{ArgSpec, CommandSpec, EntitySpec, FlagSpec, Param, Repeat, Short, SpecBuilder};

use crate::error::{CliError, CliResult};
use crate::value::{Namespace, Value};
use std::fmt;
use tracing::trace;

/// Whether an entity is matched by prefix or by position
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityKind {
    /// Matched by `--name`, `-n` or an alias
    Flag,
    /// Matched by position
    Arg,
}

/// How many raw tokens an entity consumes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Arity {
    /// Up to this many (fewer when trailing params have defaults)
    AtMost(usize),
    /// As many as are available
    Unbounded,
}

impl Arity {
    /// Upper bound on tokens taken from the input
    pub fn max_tokens(&self) -> usize {
        match self {
            Self::AtMost(n) => *n,
            Self::Unbounded => usize::MAX,
        }
    }
}

/// A registered flag or positional
#[derive(Clone)]
pub struct Entity {
    kind: EntityKind,
    identifier: String,
    display: String,
    short: Option<char>,
    params: Vec<Param>,
    variadic: Option<Param>,
    handler: Option<Handler>,
    state: Option<Namespace>,
    help: String,
    repeat: Repeat,
}

impl Entity {
    pub(crate) fn flag(spec: EntitySpec, display: String, short: Option<char>) -> Self {
        Self::build(EntityKind::Flag, spec, display, short, Repeat::Times(1))
    }

    pub(crate) fn arg(mut spec: EntitySpec, repeat: Repeat) -> Self {
        // A positional always takes its slot's token
        if spec.params.is_empty() && spec.variadic.is_none() {
            spec.params.push(Param::new(spec.name.clone()));
        }
        let display = spec.name.clone();
        Self::build(EntityKind::Arg, spec, display, None, repeat)
    }

    fn build(
        kind: EntityKind,
        spec: EntitySpec,
        display: String,
        short: Option<char>,
        repeat: Repeat,
    ) -> Self {
        Self {
            kind,
            identifier: spec.name,
            display,
            short,
            params: spec.params,
            variadic: spec.variadic,
            handler: spec.handler,
            state: spec.state,
            help: spec.help,
            repeat,
        }
    }

    /// Flag or positional
    pub fn kind(&self) -> EntityKind {
        self.kind
    }

    /// Canonical name, used as the namespace key
    pub fn identifier(&self) -> &str {
        &self.identifier
    }

    /// Long form shown to users (`oh-hi` for `oh_hi`)
    pub fn display_name(&self) -> &str {
        &self.display
    }

    /// One-letter alias, if any
    pub fn short(&self) -> Option<char> {
        self.short
    }

    /// Declared fixed parameters
    pub fn params(&self) -> &[Param] {
        &self.params
    }

    /// Declared variadic tail
    pub fn variadic(&self) -> Option<&Param> {
        self.variadic.as_ref()
    }

    /// Full help text
    pub fn help(&self) -> &str {
        &self.help
    }

    /// First line of the help text
    pub fn brief(&self) -> &str {
        self.help.lines().next().unwrap_or("").trim()
    }

    /// Slot count for positionals
    pub fn repeat(&self) -> Repeat {
        self.repeat
    }

    /// Maximum raw tokens this entity consumes
    pub fn arity(&self) -> Arity {
        if self.variadic.is_some() {
            Arity::Unbounded
        } else {
            Arity::AtMost(self.params.len())
        }
    }

    /// Fewest tokens accepted: everything up to the last parameter without a default
    fn min_tokens(&self) -> usize {
        self.params
            .iter()
            .rposition(|p| !p.is_optional())
            .map_or(0, |i| i + 1)
    }

    fn expected(&self) -> String {
        let min = self.min_tokens();
        match self.arity() {
            Arity::Unbounded => format!("at least {}", min),
            Arity::AtMost(max) if max == min => max.to_string(),
            Arity::AtMost(max) => format!("{} to {}", min, max),
        }
    }

    fn mismatch(&self, got: usize) -> CliError {
        CliError::ArityMismatch {
            entity: self.identifier.clone(),
            expected: self.expected(),
            got,
        }
    }

    /// Fresh copy of the state template
    pub(crate) fn fresh_state(&self) -> Namespace {
        self.state.clone().unwrap_or_default()
    }

    /// Convert `raw` and run the handler against `state`
    pub fn invoke(&self, state: &mut Namespace, raw: &[String]) -> CliResult<Value> {
        let too_many = self.variadic.is_none() && raw.len() > self.params.len();
        if too_many || raw.len() < self.min_tokens() {
            return Err(self.mismatch(raw.len()));
        }

        let mut args = Vec::with_capacity(raw.len().max(self.params.len()));
        for (i, param) in self.params.iter().enumerate() {
            let arg = match raw.get(i) {
                Some(token) => param.apply(token)?,
                None => param
                    .default
                    .clone()
                    .ok_or_else(|| self.mismatch(raw.len()))?,
            };
            args.push(arg);
        }
        if let Some(tail) = &self.variadic {
            for token in raw.iter().skip(self.params.len()) {
                args.push(tail.apply(token)?);
            }
        }

        trace!(entity = %self.identifier, args = args.len(), "Invoking entity");
        match &self.handler {
            Some(handler) => Ok(handler(state, args)?),
            None => Ok(convert::identity(args)),
        }
    }
}

impl fmt::Debug for Entity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Entity")
            .field("kind", &self.kind)
            .field("identifier", &self.identifier)
            .field("short", &self.short)
            .field("params", &self.params)
            .field("variadic", &self.variadic)
            .field("state", &self.state)
            .field("repeat", &self.repeat)
            .finish_non_exhaustive()
    }
}
