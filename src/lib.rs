//! argclump - command-line parsing with declarative constraint clumps
//!
//! Flags, positionals and subcommands are registered on a [`Parser`] and
//! grouped into *clumps* that state how they may be combined:
//!
//! - **AND** - all members or none
//! - **OR** - at least one member
//! - **XOR** - at most one member (exactly one if a member is required)
//!
//! A failing clump is excused when the members it complains about belong to
//! a clump of another kind that was satisfied, so a flag can sit in an AND
//! clump with its companions and an XOR clump against a rival at once.
//! Groups bundle entities into a sub-namespace that joins the parent's clumps
//! as a unit while keeping clumps of its own.
//!
//! # Features
//!
//! - **`config`** (default) - build parsers from TOML/JSON definitions
//!
//! # Example
//!
//! ```
//! use argclump::{ArgSpec, Clumps, FlagSpec, GroupSpec, ParseOptions, Parser, ParserSettings, SpecBuilder};
//!
//! let mut cli = Parser::new(ParserSettings::default().systemexit(false))?;
//! cli.arg(ArgSpec::new("name"))?;
//! let sc = cli.attach_group("sc", GroupSpec::new().clumps(Clumps::new().xor(0)))?;
//! cli.group(&sc)?
//!     .flag(FlagSpec::new("scream").short('S').param(argclump::Param::new("text")).and("blah"))?
//!     .flag(FlagSpec::new("quiet").and("blah"))?;
//!
//! let ns = cli.try_parse_str("foo -S hi --quiet", ParseOptions::new())?;
//! assert_eq!(ns["scream"].as_str(), Some("hi"));
//!
//! // scream without quiet breaks the AND clump
//! assert!(cli.try_parse_str("foo -S hi", ParseOptions::new()).is_err());
//! # Ok::<(), argclump::CliError>(())
//! ```

#![warn(missing_docs)]

pub mod clump;
pub mod entity;
pub mod error;
pub mod help;
pub mod parser;
pub mod scope;
pub mod value;

/// Declarative definitions (enabled with the `config` feature)
#[cfg(feature = "config")]
pub mod config;

pub use clump::{Clump, ClumpCheck, ClumpKey, ClumpKind, ClumpSet, Clumps};
pub use entity::{
    convert, ArgSpec, Arity, CommandSpec, Converter, Entity, EntityKind, EntitySpec, FlagSpec,
    Handler, Param, Repeat, Short, SpecBuilder,
};
pub use error::{CliError, CliResult, ClumpFailure, ConversionError, ParseFailure};
pub use help::{HelpRenderer, PlainHelp};
pub use parser::{GroupScope, ParseOptions, Parser, ParserSettings, HELP};
pub use scope::{Group, GroupHandle, GroupSpec, Scope};
pub use value::{Namespace, Value};

#[cfg(feature = "config")]
pub use config::ParserConfig;
