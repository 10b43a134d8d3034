//! Splitting raw tokens into flags, positionals and a subcommand

use super::Parser;
use crate::error::{CliError, CliResult};
use tracing::trace;

const END_OF_FLAGS: &str = "--";

/// A flag no scope of this parser recognised
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct UnknownFlag {
    /// As written by the user, for diagnostics
    pub shown: String,
    /// Name with the prefix stripped
    pub name: String,
    /// Inline `=value` argument, if any
    pub args: Vec<String>,
}

/// Result of one pass over the input
#[derive(Debug, Default)]
pub(crate) struct Split {
    /// `(canonical name, raw tokens)` in input order
    pub flags: Vec<(String, Vec<String>)>,
    pub positionals: Vec<String>,
    /// Canonical subcommand name and the index its input starts at
    pub command: Option<(String, usize)>,
    pub unknown: Vec<UnknownFlag>,
    pub too_many: bool,
}

impl Parser {
    fn looks_like_flag(&self, token: &str, long: &str) -> bool {
        token.starts_with(self.settings.flag_prefix.as_str())
            && token != self.settings.flag_prefix
            && token != long
    }

    /// Canonical name of a flag known to this parser
    pub(crate) fn resolve_flag(&self, name: &str) -> Option<String> {
        let canonical = self.dealias(name);
        self.flags.contains_key(&canonical).then_some(canonical)
    }

    fn resolve_command(&self, token: &str) -> Option<String> {
        let canonical = self.dealias(token);
        self.commands.contains_key(&canonical).then_some(canonical)
    }

    /// How many of the following tokens a flag may take: at most its
    /// arity, stopping at the next flag-like token or `--`
    fn window(&self, rest: &[String], name: &str) -> usize {
        let arity = self
            .flags
            .get(name)
            .map_or(0, |flag| flag.arity().max_tokens());
        let stop = rest
            .iter()
            .position(|t| t.starts_with(self.settings.flag_prefix.as_str()) || t == END_OF_FLAGS)
            .unwrap_or(rest.len());
        arity.min(stop)
    }

    pub(crate) fn split(&self, input: &[String]) -> Split {
        let prefix = self.settings.flag_prefix.as_str();
        let long = self.settings.long_prefix();
        let mut out = Split::default();
        let mut skip = 0;
        let mut allow_flags = true;

        for (idx, token) in input.iter().enumerate() {
            if skip > 0 {
                skip -= 1;
                continue;
            }
            if allow_flags && token == END_OF_FLAGS {
                allow_flags = false;
                continue;
            }

            if !allow_flags || !self.looks_like_flag(token, &long) {
                if let Some(command) = self.resolve_command(token) {
                    // Everything to the right belongs to the subcommand
                    trace!(command = %command, at = idx, "Subcommand found");
                    out.command = Some((command, idx + 1));
                    break;
                }
                out.positionals.push(token.clone());
                if !self.last_arg_consumes && out.positionals.len() > self.slots.len() {
                    out.too_many = true;
                }
                continue;
            }

            let rest = &input[idx + 1..];
            trace!(token = %token, "Flag token");

            if let Some((head, arg)) = token.split_once('=') {
                let name = head.trim_start_matches(prefix);
                let args = if arg.is_empty() {
                    Vec::new()
                } else {
                    vec![arg.to_string()]
                };
                match self.resolve_flag(name) {
                    Some(id) => out.flags.push((id, args)),
                    None => out.unknown.push(UnknownFlag {
                        shown: head.to_string(),
                        name: name.to_string(),
                        args,
                    }),
                }
                continue;
            }

            if let Some(name) = token.strip_prefix(long.as_str()) {
                match self.resolve_flag(name) {
                    Some(id) => {
                        skip = self.window(rest, &id);
                        out.flags.push((id, rest[..skip].to_vec()));
                    }
                    None => out.unknown.push(UnknownFlag {
                        shown: token.clone(),
                        name: name.to_string(),
                        args: Vec::new(),
                    }),
                }
                continue;
            }

            // Short cluster: only the last letter may take arguments
            let cluster = &token[prefix.len()..];
            let count = cluster.chars().count();
            for (i, letter) in cluster.chars().enumerate() {
                let name = letter.to_string();
                match self.resolve_flag(&name) {
                    Some(id) if i + 1 == count => {
                        skip = self.window(rest, &id);
                        out.flags.push((id, rest[..skip].to_vec()));
                    }
                    Some(id) => out.flags.push((id, Vec::new())),
                    None => out.unknown.push(UnknownFlag {
                        shown: format!("{}{}", prefix, name),
                        name,
                        args: Vec::new(),
                    }),
                }
            }
        }

        trace!(
            flags = out.flags.len(),
            positionals = out.positionals.len(),
            command = ?out.command,
            unknown = out.unknown.len(),
            "Split input"
        );
        out
    }

    /// Strict-mode count and name checks: unknown flags, then too many
    /// positionals, then too few
    pub(crate) fn check_strict(&self, split: &Split, propagate: bool) -> CliResult<()> {
        if !propagate && !split.unknown.is_empty() {
            return Err(CliError::UnknownFlag(
                split.unknown.iter().map(|f| f.shown.clone()).collect(),
            ));
        }
        if split.too_many {
            if !self.commands.is_empty() && self.slots.is_empty() {
                return Err(CliError::ExpectedCommand {
                    commands: self.commands.keys().cloned().collect(),
                });
            }
            return Err(CliError::TooManyArguments {
                expected: self.slots.len(),
                got: split.positionals.len(),
            });
        }
        let mandatory = self.mandatory_slots();
        if split.command.is_none() && split.positionals.len() < mandatory {
            return Err(CliError::TooFewArguments {
                expected: mandatory,
                got: split.positionals.len(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::{ArgSpec, CommandSpec, FlagSpec, Param, SpecBuilder};
    use crate::parser::ParserSettings;

    fn tokens(line: &str) -> Vec<String> {
        line.split_whitespace().map(String::from).collect()
    }

    fn parser() -> Parser {
        let mut p = Parser::new(ParserSettings::default()).unwrap();
        p.flag(FlagSpec::new("text").short('t').param(Param::new("text")))
            .unwrap()
            .flag(FlagSpec::new("verbose").short('v'))
            .unwrap()
            .arg(ArgSpec::new("first"))
            .unwrap()
            .command(CommandSpec::new("run"))
            .unwrap();
        p
    }

    #[test]
    fn test_long_flag_takes_window() {
        let split = parser().split(&tokens("--text hello world"));
        assert_eq!(split.flags, vec![("text".to_string(), vec!["hello".to_string()])]);
        assert_eq!(split.positionals, vec!["world".to_string()]);
    }

    #[test]
    fn test_window_stops_at_flag() {
        let split = parser().split(&tokens("--text -v"));
        assert_eq!(split.flags[0], ("text".to_string(), vec![]));
        assert_eq!(split.flags[1], ("verbose".to_string(), vec![]));
    }

    #[test]
    fn test_cluster_last_letter_consumes() {
        let split = parser().split(&tokens("-vt hi"));
        assert_eq!(
            split.flags,
            vec![
                ("verbose".to_string(), vec![]),
                ("text".to_string(), vec!["hi".to_string()]),
            ]
        );
    }

    #[test]
    fn test_inline_value() {
        let split = parser().split(&tokens("-t=10 --text="));
        assert_eq!(split.flags[0], ("text".to_string(), vec!["10".to_string()]));
        assert_eq!(split.flags[1], ("text".to_string(), vec![]));
    }

    #[test]
    fn test_end_of_flags() {
        let split = parser().split(&tokens("-- --text"));
        assert!(split.flags.is_empty());
        assert_eq!(split.positionals, vec!["--text".to_string()]);
    }

    #[test]
    fn test_command_takes_rest() {
        let split = parser().split(&tokens("one run -v"));
        assert_eq!(split.command, Some(("run".to_string(), 2)));
        assert!(split.flags.is_empty());
    }

    #[test]
    fn test_unknown_flags_collected() {
        let p = parser();
        let split = p.split(&tokens("-x --ecks -a=aaa"));
        let shown: Vec<_> = split.unknown.iter().map(|f| f.shown.as_str()).collect();
        assert_eq!(shown, vec!["-x", "--ecks", "-a"]);
        assert!(matches!(
            p.check_strict(&split, false),
            Err(CliError::UnknownFlag(_))
        ));
    }

    #[test]
    fn test_strict_counts() {
        let p = parser();
        let split = p.split(&tokens("one two"));
        assert!(split.too_many);
        assert!(matches!(
            p.check_strict(&split, false),
            Err(CliError::TooManyArguments { expected: 1, got: 2 })
        ));
        let split = p.split(&[]);
        assert!(matches!(
            p.check_strict(&split, false),
            Err(CliError::TooFewArguments { expected: 1, got: 0 })
        ));
    }
}
