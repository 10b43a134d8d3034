//! Registration specs
//!
//! Entities are declared with explicit builder structs rather than inferred
//! from a callback signature: the caller states each parameter, an optional
//! variadic tail, defaults and requirements, and passes the callback as a
//! plain closure.

use super::convert::{self, Converter, Handler};
use crate::clump::{ClumpKey, Clumps};
use crate::error::ConversionError;
use crate::value::{Namespace, Value};
use std::fmt;

/// One declared parameter of an entity's callback
#[derive(Clone)]
pub struct Param {
    pub(crate) name: String,
    pub(crate) convert: Option<Converter>,
    pub(crate) default: Option<Value>,
}

impl Param {
    /// A parameter that receives the raw string
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            convert: None,
            default: None,
        }
    }

    /// A parameter converted with `convert`
    pub fn typed(name: impl Into<String>, convert: Converter) -> Self {
        Self::new(name).convert(convert)
    }

    /// Set the conversion callback
    pub fn convert(mut self, convert: Converter) -> Self {
        self.convert = Some(convert);
        self
    }

    /// Value used when no token is supplied for this position
    pub fn default_value(mut self, value: impl Into<Value>) -> Self {
        self.default = Some(value.into());
        self
    }

    /// Parameter name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Whether the parameter can be left out
    pub fn is_optional(&self) -> bool {
        self.default.is_some()
    }

    pub(crate) fn apply(&self, raw: &str) -> Result<Value, ConversionError> {
        match &self.convert {
            Some(convert) => convert(raw),
            None => Ok(Value::from(raw)),
        }
    }
}

impl fmt::Debug for Param {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Param")
            .field("name", &self.name)
            .field("converted", &self.convert.is_some())
            .field("default", &self.default)
            .finish()
    }
}

/// Fields shared by flag and positional declarations
#[derive(Clone, Default)]
pub struct EntitySpec {
    pub(crate) name: String,
    pub(crate) params: Vec<Param>,
    pub(crate) variadic: Option<Param>,
    pub(crate) handler: Option<Handler>,
    pub(crate) state: Option<Namespace>,
    pub(crate) help: String,
    pub(crate) default: Option<Value>,
    pub(crate) required: bool,
    pub(crate) clumps: Clumps,
}

impl EntitySpec {
    fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }
}

impl fmt::Debug for EntitySpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EntitySpec")
            .field("name", &self.name)
            .field("params", &self.params)
            .field("variadic", &self.variadic)
            .field("state", &self.state)
            .field("default", &self.default)
            .field("required", &self.required)
            .field("clumps", &self.clumps)
            .finish_non_exhaustive()
    }
}

/// Builder methods common to [`FlagSpec`] and [`ArgSpec`]
pub trait SpecBuilder: Sized {
    /// The shared spec being built
    fn spec_mut(&mut self) -> &mut EntitySpec;

    /// Append a fixed parameter
    fn param(mut self, param: Param) -> Self {
        self.spec_mut().params.push(param);
        self
    }

    /// Set the variadic tail (makes the arity unbounded)
    fn variadic(mut self, param: Param) -> Self {
        self.spec_mut().variadic = Some(param);
        self
    }

    /// Callback producing the recorded value
    fn handler<F>(mut self, f: F) -> Self
    where
        F: Fn(&mut Namespace, Vec<Value>) -> Result<Value, ConversionError> + Send + Sync + 'static,
    {
        self.spec_mut().handler = Some(convert::handler(f));
        self
    }

    /// Per-parse state template handed to the handler; each parse starts
    /// from a fresh copy
    fn state<I, K, V>(mut self, initial: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<Value>,
    {
        self.spec_mut().state = Some(initial.into_iter().collect());
        self
    }

    /// Help text; the first line is used as the brief
    fn help(mut self, text: impl Into<String>) -> Self {
        self.spec_mut().help = text.into();
        self
    }

    /// Value recorded when the entity is never supplied
    fn default_value(mut self, value: impl Into<Value>) -> Self {
        self.spec_mut().default = Some(value.into());
        self
    }

    /// Whether absence is always an error
    fn required(mut self, required: bool) -> Self {
        self.spec_mut().required = required;
        self
    }

    /// Join clumps in the scope the entity is registered in
    fn clumps(mut self, clumps: Clumps) -> Self {
        self.spec_mut().clumps = clumps;
        self
    }

    /// Join an AND clump
    fn and(mut self, key: impl Into<ClumpKey>) -> Self {
        let spec = self.spec_mut();
        spec.clumps = std::mem::take(&mut spec.clumps).and(key);
        self
    }

    /// Join an OR clump
    fn or(mut self, key: impl Into<ClumpKey>) -> Self {
        let spec = self.spec_mut();
        spec.clumps = std::mem::take(&mut spec.clumps).or(key);
        self
    }

    /// Join an XOR clump
    fn xor(mut self, key: impl Into<ClumpKey>) -> Self {
        let spec = self.spec_mut();
        spec.clumps = std::mem::take(&mut spec.clumps).xor(key);
        self
    }
}

/// How a flag's one-letter alias is chosen
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Short {
    /// First alphanumeric character of the name not already taken
    #[default]
    Auto,
    /// No short alias
    Disabled,
    /// This exact character
    Char(char),
}

/// Declaration of a flag (`--name`, `-n`)
#[derive(Debug, Clone)]
pub struct FlagSpec {
    pub(crate) entity: EntitySpec,
    pub(crate) short: Short,
    pub(crate) aliases: Vec<String>,
    pub(crate) separator: char,
}

impl FlagSpec {
    /// Flag whose canonical name is `name`; underscores become `-` in the long form
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            entity: EntitySpec::named(name),
            short: Short::Auto,
            aliases: Vec::new(),
            separator: '-',
        }
    }

    /// Use this short alias
    pub fn short(mut self, short: char) -> Self {
        self.short = Short::Char(short);
        self
    }

    /// Do not generate a short alias
    pub fn no_short(mut self) -> Self {
        self.short = Short::Disabled;
        self
    }

    /// Extra long-form alias
    pub fn alias(mut self, alias: impl Into<String>) -> Self {
        self.aliases.push(alias.into());
        self
    }

    /// Character replacing underscores in the long form
    pub fn separator(mut self, separator: char) -> Self {
        self.separator = separator;
        self
    }
}

impl SpecBuilder for FlagSpec {
    fn spec_mut(&mut self) -> &mut EntitySpec {
        &mut self.entity
    }
}

/// How many consecutive positional slots an argument occupies
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Repeat {
    /// Exactly this many slots
    Times(usize),
    /// One slot plus every leftover positional
    Consume,
}

/// Declaration of a positional argument
#[derive(Debug, Clone)]
pub struct ArgSpec {
    pub(crate) entity: EntitySpec,
    pub(crate) repeat: Repeat,
}

impl ArgSpec {
    /// Positional filling one slot
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            entity: EntitySpec::named(name),
            repeat: Repeat::Times(1),
        }
    }

    /// Occupy `n` consecutive slots, invoking the handler once per slot
    pub fn repeat(mut self, n: usize) -> Self {
        self.repeat = Repeat::Times(n);
        self
    }

    /// Consume every remaining positional
    pub fn consume_rest(mut self) -> Self {
        self.repeat = Repeat::Consume;
        self
    }
}

impl SpecBuilder for ArgSpec {
    fn spec_mut(&mut self) -> &mut EntitySpec {
        &mut self.entity
    }
}

/// Declaration of a subcommand
#[derive(Debug, Clone, Default)]
pub struct CommandSpec {
    pub(crate) name: String,
    pub(crate) desc: String,
    pub(crate) aliases: Vec<String>,
    pub(crate) required: bool,
    pub(crate) clumps: Clumps,
    pub(crate) separator: Option<char>,
}

impl CommandSpec {
    /// Subcommand invoked as `name`
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Short description
    pub fn desc(mut self, desc: impl Into<String>) -> Self {
        self.desc = desc.into();
        self
    }

    /// Alternative name
    pub fn alias(mut self, alias: impl Into<String>) -> Self {
        self.aliases.push(alias.into());
        self
    }

    /// Whether the subcommand must be given
    pub fn required(mut self, required: bool) -> Self {
        self.required = required;
        self
    }

    /// Join clumps of the parent scope as a whole
    pub fn clumps(mut self, clumps: Clumps) -> Self {
        self.clumps = clumps;
        self
    }

    /// Join an AND clump of the parent
    pub fn and(mut self, key: impl Into<ClumpKey>) -> Self {
        self.clumps = std::mem::take(&mut self.clumps).and(key);
        self
    }

    /// Join an OR clump of the parent
    pub fn or(mut self, key: impl Into<ClumpKey>) -> Self {
        self.clumps = std::mem::take(&mut self.clumps).or(key);
        self
    }

    /// Join an XOR clump of the parent
    pub fn xor(mut self, key: impl Into<ClumpKey>) -> Self {
        self.clumps = std::mem::take(&mut self.clumps).xor(key);
        self
    }

    /// Replace underscores in the invoked name with this character
    pub fn separator(mut self, separator: char) -> Self {
        self.separator = Some(separator);
        self
    }
}
