//! Help screens, usage lines and CLI-mode error reporting

use crate::entity::{Entity, Param, Repeat};
use crate::error::{CliError, ParseFailure};
use crate::parser::Parser;
use colored::*;
use std::fmt;
use unicode_width::UnicodeWidthStr;

/// Renders usage and help text for a parser
pub trait HelpRenderer: fmt::Debug + Send + Sync {
    /// One-line usage for the parser reached by `path`
    fn usage(&self, parser: &Parser, path: &[String]) -> String;

    /// Full help screen for the parser reached by `path`
    fn help(&self, parser: &Parser, path: &[String]) -> String;

    /// Help for a single flag, positional or subcommand of `parser`
    fn entity_help(&self, parser: &Parser, name: &str) -> Option<String>;
}

/// Plain-text renderer with bold section headings
#[derive(Debug, Clone, Copy, Default)]
pub struct PlainHelp;

fn param_label(param: &Param) -> String {
    let name = param.name().to_uppercase();
    if param.is_optional() {
        format!("[{}]", name)
    } else {
        name
    }
}

/// `TEXT [N] REST...`
fn params_label(entity: &Entity) -> String {
    entity
        .params()
        .iter()
        .map(param_label)
        .chain(
            entity
                .variadic()
                .map(|tail| format!("{}...", tail.name().to_uppercase())),
        )
        .collect::<Vec<_>>()
        .join(" ")
}

/// `[-S | --scream TEXT]`
fn flag_usage(parser: &Parser, flag: &Entity) -> String {
    let prefix = &parser.settings().flag_prefix;
    let long = format!("{}{}", parser.settings().long_prefix(), flag.display_name());
    let forms = match flag.short() {
        Some(short) => format!("{}{} | {}", prefix, short, long),
        None => long,
    };
    let params = params_label(flag);
    if params.is_empty() {
        format!("[{}]", forms)
    } else {
        format!("[{} {}]", forms, params)
    }
}

/// `name(1)` or `rest(...)`
fn arg_usage(arg: &Entity) -> String {
    match arg.repeat() {
        Repeat::Times(n) => format!("{}({})", arg.identifier(), n),
        Repeat::Consume => format!("{}(...)", arg.identifier()),
    }
}

/// Left column padded by display width, so wide characters line up
fn table(rows: &[(String, String)]) -> String {
    let width = rows
        .iter()
        .map(|(left, _)| UnicodeWidthStr::width(left.as_str()))
        .max()
        .unwrap_or(0);
    rows.iter()
        .map(|(left, right)| {
            let pad = width - UnicodeWidthStr::width(left.as_str());
            format!("  {}{}  {}", left, " ".repeat(pad), right)
                .trim_end()
                .to_string()
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn prog_name(parser: &Parser) -> String {
    parser.settings().prog.clone().unwrap_or_else(|| {
        std::env::args()
            .next()
            .as_deref()
            .and_then(|arg0| std::path::Path::new(arg0).file_name())
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| "prog".to_string())
    })
}

impl HelpRenderer for PlainHelp {
    fn usage(&self, parser: &Parser, path: &[String]) -> String {
        let mut parts = vec![prog_name(parser)];
        parts.extend(parser.command_path().iter().cloned());
        parts.extend(path.iter().cloned());
        if let Some(target) = parser.find_command(path) {
            parts.extend(target.flags().map(|flag| flag_usage(target, flag)));
            parts.extend(target.args().iter().map(arg_usage));
            if target.commands().next().is_some() {
                parts.push("<command>".to_string());
            }
        }
        parts.join(" ")
    }

    fn help(&self, parser: &Parser, path: &[String]) -> String {
        let mut out = Vec::new();
        let target = match parser.find_command(path) {
            Some(target) => target,
            None => return self.usage(parser, path),
        };

        if !target.settings().desc.is_empty() {
            out.push(target.settings().desc.clone());
        }
        out.push(format!("{} {}", "usage:".bold(), self.usage(parser, path)));

        let commands: Vec<(String, String)> = target
            .commands()
            .map(|(name, cmd)| (name.to_string(), cmd.settings().desc.clone()))
            .collect();
        if !commands.is_empty() {
            out.push(format!("{}\n{}", "commands:".bold(), table(&commands)));
        }

        let args: Vec<(String, String)> = target
            .args()
            .iter()
            .map(|arg| (arg.identifier().to_string(), arg.brief().to_string()))
            .collect();
        if !args.is_empty() {
            out.push(format!("{}\n{}", "arguments:".bold(), table(&args)));
        }

        let prefix = &target.settings().flag_prefix;
        let long = target.settings().long_prefix();
        let flags: Vec<(String, String)> = target
            .flags()
            .map(|flag| {
                let mut left = match flag.short() {
                    Some(short) => format!("{}{}, ", prefix, short),
                    None => String::new(),
                };
                left.push_str(&long);
                left.push_str(flag.display_name());
                let params = params_label(flag);
                if !params.is_empty() {
                    left.push(' ');
                    left.push_str(&params);
                }
                (left, flag.brief().to_string())
            })
            .collect();
        if !flags.is_empty() {
            out.push(format!("{}\n{}", "flags:".bold(), table(&flags)));
        }

        out.join("\n\n")
    }

    fn entity_help(&self, parser: &Parser, name: &str) -> Option<String> {
        if let Some(cmd) = parser.get_command(name) {
            let canonical = cmd.name().unwrap_or(name);
            let desc = &cmd.settings().desc;
            return Some(if desc.is_empty() {
                canonical.to_string()
            } else {
                format!("{}: {}", canonical, desc)
            });
        }
        let entity = parser.get(name)?;
        let usage = match entity.kind() {
            crate::entity::EntityKind::Flag => flag_usage(parser, entity),
            crate::entity::EntityKind::Arg => arg_usage(entity),
        };
        if entity.help().is_empty() {
            Some(usage)
        } else {
            Some(format!("{}\n\n{}", usage, entity.help()))
        }
    }
}

impl Parser {
    /// One-line usage of this parser
    pub fn usage(&self) -> String {
        self.renderer().usage(self, &[])
    }

    /// Full help screen of this parser
    pub fn format_help(&self) -> String {
        self.renderer().help(self, &[])
    }

    /// Help for one flag, positional or subcommand
    pub fn entity_help(&self, name: &str) -> Option<String> {
        self.renderer().entity_help(self, name)
    }

    /// Text printed for `err` in CLI mode
    pub fn render_error(&self, err: &CliError) -> String {
        match err {
            CliError::HelpRequested {
                command_path,
                topic: None,
            } => self.renderer().help(self, command_path),
            CliError::HelpRequested {
                command_path,
                topic: Some(topic),
            } => {
                let target = self.find_command(command_path).unwrap_or(self);
                target
                    .entity_help(topic)
                    .unwrap_or_else(|| format!("No flag, argument or command named '{}'", topic))
            }
            other => format!("{}\n{} {}", self.usage(), "error:".red().bold(), other),
        }
    }

    /// Text printed for `failure` in CLI mode, with the usage line of the
    /// subcommand that failed
    pub fn render_failure(&self, failure: &ParseFailure) -> String {
        match &failure.error {
            err @ CliError::HelpRequested { .. } => self.render_error(err),
            other => format!(
                "{}\n{} {}",
                self.renderer().usage(self, &failure.command_path),
                "error:".red().bold(),
                other
            ),
        }
    }

    /// Print `failure` and end the process with its exit code
    pub(crate) fn exit_with(&self, failure: &ParseFailure) -> ! {
        match &failure.error {
            err @ CliError::HelpRequested { .. } => println!("{}", self.render_error(err)),
            other => {
                println!("{}", self.renderer().usage(self, &failure.command_path));
                eprintln!("{} {}", "error:".red().bold(), other);
            }
        }
        std::process::exit(failure.error.exit_code())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::{ArgSpec, CommandSpec, FlagSpec, Param, SpecBuilder};
    use crate::parser::ParserSettings;

    fn parser() -> Parser {
        let mut p = Parser::new(ParserSettings::default().prog("prog").desc("Test program")).unwrap();
        p.flag(
            FlagSpec::new("scream")
                .short('S')
                .param(Param::new("text"))
                .help("Uppercase the text\nLonger explanation"),
        )
        .unwrap()
        .arg(ArgSpec::new("name").help("Who to greet"))
        .unwrap()
        .arg(ArgSpec::new("rest").consume_rest())
        .unwrap()
        .command(CommandSpec::new("preview").desc("Show a preview"))
        .unwrap();
        p
    }

    #[test]
    fn test_usage_line() {
        let usage = parser().usage();
        assert!(usage.starts_with("prog "));
        assert!(usage.contains("[-S | --scream TEXT]"));
        assert!(usage.contains("[-h | --help [NAME]]"));
        assert!(usage.contains("name(1) rest(...)"));
    }

    #[test]
    fn test_help_screen_sections() {
        let help = parser().format_help();
        assert!(help.starts_with("Test program"));
        assert!(help.contains("preview  Show a preview"));
        assert!(help.contains("Who to greet"));
        assert!(help.contains("Uppercase the text"));
        assert!(!help.contains("Longer explanation"));
    }

    #[test]
    fn test_entity_help() {
        let p = parser();
        let text = p.entity_help("S").unwrap();
        assert!(text.contains("Longer explanation"));
        assert_eq!(p.entity_help("preview").unwrap(), "preview: Show a preview");
        assert!(p.entity_help("missing").is_none());
    }

    #[test]
    fn test_render_help_request() {
        let p = parser();
        let err = CliError::HelpRequested {
            command_path: vec![],
            topic: Some("nothing".to_string()),
        };
        assert_eq!(
            p.render_error(&err),
            "No flag, argument or command named 'nothing'"
        );
    }

    #[test]
    fn test_command_usage_carries_path() {
        let p = parser();
        let preview = p.get_command("preview").unwrap();
        assert_eq!(preview.command_path(), ["preview".to_string()]);
        assert!(preview.usage().starts_with("prog preview "));
    }

    #[test]
    fn test_render_failure_uses_failing_command() {
        let p = parser();
        let failure = ParseFailure::new(
            vec!["preview".to_string()],
            CliError::UnknownFlag(vec!["--nope".to_string()]),
        );
        let text = p.render_failure(&failure);
        assert!(text.starts_with("prog preview "));
        assert!(!text.contains("--scream"));
        assert!(text.contains("Unknown flag(s): `--nope'"));
    }

    #[test]
    fn test_table_pads_by_display_width() {
        let rows = vec![
            ("日本".to_string(), "wide".to_string()),
            ("abcd".to_string(), "narrow".to_string()),
        ];
        let text = table(&rows);
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "  日本  wide");
        assert_eq!(lines[1], "  abcd  narrow");
    }
}
