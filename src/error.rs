//! Error types for registration and parsing

use crate::clump::ClumpKind;
use std::collections::BTreeSet;
use std::fmt;
use thiserror::Error;

/// Result type for parser operations
pub type CliResult<T> = Result<T, CliError>;

/// Raised by a conversion callback or handler that rejects a raw token.
///
/// The message is caller-authored and is surfaced verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct ConversionError {
    message: String,
}

impl ConversionError {
    /// Create a conversion error with the given message
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    /// The caller-authored message
    pub fn message(&self) -> &str {
        &self.message
    }
}

/// Detail payload of an AND/OR/XOR violation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClumpFailure {
    /// Which kind of clump failed
    pub kind: ClumpKind,
    /// Key of the failing clump
    pub key: String,
    /// Label of the scope whose clump failed (`<root>`, command or group name)
    pub scope: String,
    /// Full membership of the failing clump
    pub members: BTreeSet<String>,
    /// Members that were given (AND/OR) or correctly absent (XOR)
    pub eliminating: BTreeSet<String>,
    /// Members that no other satisfied clump excused
    pub not_exempt: BTreeSet<String>,
    /// Names that were actually supplied at this scope
    pub parsed: BTreeSet<String>,
    /// Names excused by satisfied AND clumps
    pub and_successes: BTreeSet<String>,
    /// Names excused by satisfied OR clumps
    pub or_successes: BTreeSet<String>,
    /// Names excused by satisfied XOR clumps
    pub xor_successes: BTreeSet<String>,
    /// Human-readable diagnostic
    pub message: String,
}

impl fmt::Display for ClumpFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

/// Errors that can occur while building a parser or parsing input
#[derive(Debug, Error)]
pub enum CliError {
    /// Invalid parser definition (empty prefix, name collision, bad group name)
    #[error("Configuration error: {0}")]
    Config(String),

    /// A conversion callback rejected a token
    #[error(transparent)]
    Conversion(#[from] ConversionError),

    /// An AND clump was only partially supplied
    #[error("{0}")]
    And(Box<ClumpFailure>),

    /// An OR clump had none of its members supplied
    #[error("{0}")]
    Or(Box<ClumpFailure>),

    /// An XOR clump had more than one (or, with a required member, zero) members supplied
    #[error("{0}")]
    Xor(Box<ClumpFailure>),

    /// A required entity or group was never supplied
    #[error("Expected the following required arguments: {}\nGot {}", quoted(.expected), quoted_or_none(.got))]
    Requirement {
        /// Every required name in the scope
        expected: BTreeSet<String>,
        /// Required names that were supplied
        got: BTreeSet<String>,
    },

    /// Strict mode: more positionals than registered slots
    #[error("Too many positional arguments (expected {expected}, got {got})")]
    TooManyArguments {
        /// Registered positional slots
        expected: usize,
        /// Positionals supplied
        got: usize,
    },

    /// Strict mode: fewer positionals than the slots lacking a default
    #[error("Too few positional arguments (expected at least {expected}, got {got})")]
    TooFewArguments {
        /// Slots that have no default value
        expected: usize,
        /// Positionals supplied
        got: usize,
    },

    /// Strict mode: excess positional where only a subcommand is accepted
    #[error("Expected a command: {}\nTry `--help <command name>` for specific detail", quoted(.commands))]
    ExpectedCommand {
        /// Available command names
        commands: BTreeSet<String>,
    },

    /// Strict mode: flags that no scope recognised
    #[error("Unknown flag(s): {}", backticked(.0))]
    UnknownFlag(Vec<String>),

    /// An entity was invoked with a token count its parameters cannot take
    #[error("{entity}: expected {expected} argument(s), got {got}")]
    ArityMismatch {
        /// Canonical name of the entity
        entity: String,
        /// Description of the accepted count
        expected: String,
        /// Tokens actually passed
        got: usize,
    },

    /// No entity with this name exists
    #[error("No such entity: {0}")]
    UnknownEntity(String),

    /// The built-in help flag was supplied
    #[error("help requested")]
    HelpRequested {
        /// Subcommand path of the parser that saw the flag
        command_path: Vec<String>,
        /// Entity name passed to the help flag, if any
        topic: Option<String>,
    },

    /// Single-string input could not be split into tokens
    #[error("Could not split input: {0}")]
    Lex(String),

    /// IO errors while loading definitions
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Malformed JSON definition
    #[error("Failed to parse JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// Malformed TOML definition
    #[cfg(feature = "config")]
    #[error("Failed to parse TOML: {0}")]
    Toml(#[from] toml::de::Error),
}

impl CliError {
    /// Create a config error with context
    pub fn config<S: Into<String>>(msg: S) -> Self {
        Self::Config(msg.into())
    }

    /// Wrap a clump failure in the variant matching its kind
    pub fn clump(failure: ClumpFailure) -> Self {
        match failure.kind {
            ClumpKind::And => Self::And(Box::new(failure)),
            ClumpKind::Or => Self::Or(Box::new(failure)),
            ClumpKind::Xor => Self::Xor(Box::new(failure)),
        }
    }

    /// Detail payload if this is a clump violation
    pub fn clump_failure(&self) -> Option<&ClumpFailure> {
        match self {
            Self::And(f) | Self::Or(f) | Self::Xor(f) => Some(f),
            _ => None,
        }
    }

    /// Whether this error comes from constraint checking rather than tokenizing
    pub fn is_constraint_violation(&self) -> bool {
        matches!(
            self,
            Self::And(_) | Self::Or(_) | Self::Xor(_) | Self::Requirement { .. }
        )
    }

    /// Process exit status used in CLI mode
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::HelpRequested { .. } => 0,
            _ => 2,
        }
    }
}

pub(crate) fn quoted<'a, I>(names: I) -> String
where
    I: IntoIterator<Item = &'a String>,
{
    names
        .into_iter()
        .map(|n| format!("'{}'", n))
        .collect::<Vec<_>>()
        .join(", ")
}

fn backticked(flags: &[String]) -> String {
    flags
        .iter()
        .map(|f| format!("`{}'", f))
        .collect::<Vec<_>>()
        .join(" ")
}

/// A parse error together with the subcommand that raised it
#[derive(Debug, Error)]
#[error("{error}")]
pub struct ParseFailure {
    /// Subcommands walked to reach the failing parser; empty at the top level
    pub command_path: Vec<String>,
    /// The error itself
    pub error: CliError,
}

impl ParseFailure {
    /// Attribute `error` to the parser at `command_path`
    pub fn new(command_path: Vec<String>, error: CliError) -> Self {
        Self {
            command_path,
            error,
        }
    }
}

impl From<ParseFailure> for CliError {
    fn from(failure: ParseFailure) -> Self {
        failure.error
    }
}

fn quoted_or_none<'a, I>(names: I) -> String
where
    I: IntoIterator<Item = &'a String>,
{
    let joined = quoted(names);
    if joined.is_empty() {
        "none".to_string()
    } else {
        joined
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_conversion_error_is_verbatim() {
        let err: CliError = ConversionError::new("invalid literal for int: 'what'").into();
        assert_eq!(err.to_string(), "invalid literal for int: 'what'");
    }

    #[test]
    fn test_requirement_message() {
        let err = CliError::Requirement {
            expected: ["infile".to_string()].into_iter().collect(),
            got: BTreeSet::new(),
        };
        assert_eq!(
            err.to_string(),
            "Expected the following required arguments: 'infile'\nGot none"
        );
        assert!(err.is_constraint_violation());
    }

    #[test]
    fn test_unknown_flag_message() {
        let err = CliError::UnknownFlag(vec!["-x".to_string(), "--ecks".to_string()]);
        assert!(err.to_string().starts_with("Unknown flag"));
        assert_eq!(err.exit_code(), 2);
    }

    #[test]
    fn test_help_exit_code() {
        let err = CliError::HelpRequested {
            command_path: vec![],
            topic: None,
        };
        assert_eq!(err.exit_code(), 0);
    }
}
