//! Definition file schema
//!
//! Mirrors the builder API: flags, positionals, groups and subcommands with
//! their parameters, defaults and clump memberships. Values are written in
//! their native TOML/JSON types.

use crate::clump::{ClumpKey, Clumps};
use crate::parser::ParserSettings;
use crate::value::Value;
use serde::{Deserialize, Serialize};

/// Root of a parser definition
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ParserConfig {
    /// Parser-wide settings
    #[serde(default)]
    pub parser: ParserSettings,

    /// Top-level flags
    #[serde(default)]
    pub flags: Vec<FlagConfig>,

    /// Top-level positionals, in slot order
    #[serde(default)]
    pub args: Vec<ArgConfig>,

    /// Groups attached to the top level
    #[serde(default)]
    pub groups: Vec<GroupConfig>,

    /// Subcommands
    #[serde(default)]
    pub commands: Vec<CommandConfig>,

    /// Clump memberships added after registration (`[[clump]]`)
    #[serde(default, rename = "clump")]
    pub extra_clumps: Vec<ClumpConfig>,
}

/// A clump key: integers and strings are both accepted
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum KeyConfig {
    /// Numeric key, `and = 0`
    Int(i64),
    /// Named key, `and = "blah"`
    Name(String),
}

impl From<&KeyConfig> for ClumpKey {
    fn from(key: &KeyConfig) -> Self {
        match key {
            KeyConfig::Int(i) => ClumpKey::from(i.to_string()),
            KeyConfig::Name(name) => ClumpKey::from(name.as_str()),
        }
    }
}

/// `and` / `or` / `xor` memberships
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClumpKeys {
    /// AND clump key
    #[serde(default)]
    pub and: Option<KeyConfig>,
    /// OR clump key
    #[serde(default)]
    pub or: Option<KeyConfig>,
    /// XOR clump key
    #[serde(default)]
    pub xor: Option<KeyConfig>,
}

impl ClumpKeys {
    /// Builder form
    pub fn to_clumps(&self) -> Clumps {
        let mut clumps = Clumps::new();
        if let Some(key) = &self.and {
            clumps = clumps.and(ClumpKey::from(key));
        }
        if let Some(key) = &self.or {
            clumps = clumps.or(ClumpKey::from(key));
        }
        if let Some(key) = &self.xor {
            clumps = clumps.xor(ClumpKey::from(key));
        }
        clumps
    }
}

/// One callback parameter
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParamConfig {
    /// Parameter name
    pub name: String,

    /// Built-in converter: str, int, float, bool, auto
    #[serde(rename = "type", default)]
    pub param_type: Option<String>,

    /// Value used when the token is missing
    #[serde(default)]
    pub default: Option<Value>,
}

/// What an entity records when invoked
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    /// Converted argument(s), or `true` for a switch
    #[default]
    Store,
    /// Number of times given in this parse
    Count,
    /// List of every value given in this parse
    Append,
}

/// Fields shared by flags and positionals
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EntityConfig {
    /// Canonical name
    pub name: String,

    /// Help text
    #[serde(default)]
    pub help: Option<String>,

    /// Fixed parameters
    #[serde(default)]
    pub params: Vec<ParamConfig>,

    /// Variadic tail
    #[serde(default)]
    pub variadic: Option<ParamConfig>,

    /// Value recorded when never supplied
    #[serde(default)]
    pub default: Option<Value>,

    /// Whether absence is an error
    #[serde(default)]
    pub required: bool,

    /// Built-in handler
    #[serde(default)]
    pub action: Action,

    /// Clump memberships
    #[serde(flatten)]
    pub clumps: ClumpKeys,
}

/// Flag definition
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FlagConfig {
    /// Shared entity fields
    #[serde(flatten)]
    pub entity: EntityConfig,

    /// Explicit short alias
    #[serde(default)]
    pub short: Option<char>,

    /// Suppress the automatic short alias
    #[serde(default)]
    pub no_short: bool,

    /// Extra long aliases
    #[serde(default)]
    pub aliases: Vec<String>,

    /// Underscore replacement in the long form
    #[serde(default)]
    pub separator: Option<char>,
}

/// Slot count of a positional: a number, or `"..."` to consume the rest
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RepeatConfig {
    /// Fixed number of slots
    Times(usize),
    /// `"..."`
    Rest(String),
}

impl Default for RepeatConfig {
    fn default() -> Self {
        Self::Times(1)
    }
}

/// Positional definition
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArgConfig {
    /// Shared entity fields
    #[serde(flatten)]
    pub entity: EntityConfig,

    /// Slot count
    #[serde(default)]
    pub repeat: RepeatConfig,
}

/// Group definition
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GroupConfig {
    /// Group name
    pub name: String,

    /// At least one member must be supplied
    #[serde(default)]
    pub required: bool,

    /// Clumps of the parent the group joins
    #[serde(flatten)]
    pub clumps: ClumpKeys,

    /// Flags registered in the group
    #[serde(default)]
    pub flags: Vec<FlagConfig>,

    /// Positionals registered in the group
    #[serde(default)]
    pub args: Vec<ArgConfig>,

    /// Subcommands registered in the group
    #[serde(default)]
    pub commands: Vec<CommandConfig>,
}

/// Subcommand definition
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommandConfig {
    /// Command name
    pub name: String,

    /// Description
    #[serde(default)]
    pub desc: Option<String>,

    /// Alternative names
    #[serde(default)]
    pub aliases: Vec<String>,

    /// Whether the command must be given
    #[serde(default)]
    pub required: bool,

    /// Clumps of the parent the command joins
    #[serde(flatten)]
    pub clumps: ClumpKeys,

    /// Flags of the command
    #[serde(default)]
    pub flags: Vec<FlagConfig>,

    /// Positionals of the command
    #[serde(default)]
    pub args: Vec<ArgConfig>,

    /// Groups of the command
    #[serde(default)]
    pub groups: Vec<GroupConfig>,

    /// Nested subcommands
    #[serde(default)]
    pub commands: Vec<CommandConfig>,

    /// Clump memberships added after registration (`[[commands.clump]]`)
    #[serde(default, rename = "clump")]
    pub extra_clumps: Vec<ClumpConfig>,
}

/// Clump membership for an already-defined name
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClumpConfig {
    /// Flag, positional, command or group to add
    pub member: String,

    /// Group whose clumps are joined; the parser's own when absent
    #[serde(default)]
    pub scope: Option<String>,

    /// Keys to join
    #[serde(flatten)]
    pub keys: ClumpKeys,
}
