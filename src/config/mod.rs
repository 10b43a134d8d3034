//! Declarative parser definitions
//!
//! A whole parser tree can be described in TOML (or JSON) and built with
//! [`ParserConfig::build`]:
//!
//! ```toml
//! [parser]
//! desc = "Convert a file"
//!
//! [[args]]
//! name = "infile"
//! required = true
//!
//! [[groups]]
//! name = "grp_0"
//! xor = 0
//!
//! [[groups.flags]]
//! name = "header"
//! short = "t"
//! params = [{ name = "text", default = "" }]
//! ```
//!
//! Definitions describe parsers only; they are not a source of argument values.

mod builder;
pub mod schema;

pub use schema::{
    Action, ArgConfig, ClumpConfig, ClumpKeys, CommandConfig, EntityConfig, FlagConfig,
    GroupConfig, KeyConfig, ParamConfig, ParserConfig, RepeatConfig,
};

use crate::error::{CliError, CliResult};
use std::path::Path;

impl ParserConfig {
    /// Parse a TOML definition
    pub fn from_toml_str(content: &str) -> CliResult<Self> {
        Ok(toml::from_str(content)?)
    }

    /// Parse a JSON definition
    pub fn from_json_str(content: &str) -> CliResult<Self> {
        Ok(serde_json::from_str(content)?)
    }

    /// Load a TOML definition file
    pub fn from_toml_file(path: impl AsRef<Path>) -> CliResult<Self> {
        let content = std::fs::read_to_string(path.as_ref())?;
        Self::from_toml_str(&content)
    }

    /// Load a JSON definition file
    pub fn from_json_file(path: impl AsRef<Path>) -> CliResult<Self> {
        let content = std::fs::read_to_string(path.as_ref())?;
        Self::from_json_str(&content)
    }

    /// Load a definition file, picking the format from the extension
    /// (TOML, then JSON, for anything else)
    pub fn from_file(path: impl AsRef<Path>) -> CliResult<Self> {
        let path = path.as_ref();
        match path.extension().and_then(|s| s.to_str()) {
            Some("toml") => Self::from_toml_file(path),
            Some("json") => Self::from_json_file(path),
            _ => {
                let content = std::fs::read_to_string(path)?;
                Self::from_toml_str(&content).or_else(|toml_err| {
                    Self::from_json_str(&content).map_err(|_| toml_err)
                })
            }
        }
    }
}

impl std::str::FromStr for ParserConfig {
    type Err = CliError;

    fn from_str(s: &str) -> CliResult<Self> {
        Self::from_toml_str(s)
    }
}
