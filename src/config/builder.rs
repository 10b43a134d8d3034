//! Definition → [`Parser`]

use super::schema::{
    Action, ArgConfig, ClumpConfig, CommandConfig, EntityConfig, FlagConfig, GroupConfig,
    ParamConfig, ParserConfig, RepeatConfig,
};
use crate::entity::{convert, ArgSpec, CommandSpec, FlagSpec, Param, SpecBuilder};
use crate::error::{CliError, CliResult};
use crate::parser::{GroupScope, Parser};
use crate::scope::GroupSpec;
use crate::value::Value;
use tracing::debug;

/// Anything flags, positionals and commands can be registered on
trait Registrar {
    fn add_flag(&mut self, spec: FlagSpec) -> CliResult<()>;
    fn add_arg(&mut self, spec: ArgSpec) -> CliResult<()>;
    fn add_command(&mut self, spec: CommandSpec) -> CliResult<&mut Parser>;
}

impl Registrar for Parser {
    fn add_flag(&mut self, spec: FlagSpec) -> CliResult<()> {
        self.flag(spec).map(|_| ())
    }

    fn add_arg(&mut self, spec: ArgSpec) -> CliResult<()> {
        self.arg(spec).map(|_| ())
    }

    fn add_command(&mut self, spec: CommandSpec) -> CliResult<&mut Parser> {
        self.command(spec)
    }
}

impl Registrar for GroupScope<'_> {
    fn add_flag(&mut self, spec: FlagSpec) -> CliResult<()> {
        self.flag(spec).map(|_| ())
    }

    fn add_arg(&mut self, spec: ArgSpec) -> CliResult<()> {
        self.arg(spec).map(|_| ())
    }

    fn add_command(&mut self, spec: CommandSpec) -> CliResult<&mut Parser> {
        self.command(spec)
    }
}

impl ParserConfig {
    /// Build the parser tree this definition describes
    pub fn build(&self) -> CliResult<Parser> {
        let mut parser = Parser::new(self.parser.clone())?;
        populate(
            &mut parser,
            &self.flags,
            &self.args,
            &self.groups,
            &self.commands,
            &self.extra_clumps,
        )?;
        debug!(
            flags = self.flags.len(),
            args = self.args.len(),
            commands = self.commands.len(),
            "Built parser from definition"
        );
        Ok(parser)
    }
}

fn populate(
    parser: &mut Parser,
    flags: &[FlagConfig],
    args: &[ArgConfig],
    groups: &[GroupConfig],
    commands: &[CommandConfig],
    clumps: &[ClumpConfig],
) -> CliResult<()> {
    register(parser, flags, args, commands)?;

    for group in groups {
        let spec = GroupSpec::new()
            .required(group.required)
            .clumps(group.clumps.to_clumps());
        let handle = parser.attach_group(&group.name, spec)?;
        let mut scope = parser.group(&handle)?;
        register(&mut scope, &group.flags, &group.args, &group.commands)?;
    }

    for clump in clumps {
        let keys = clump.keys.to_clumps();
        match &clump.scope {
            Some(group) => {
                parser.group(group)?.clump(&clump.member, keys)?;
            }
            None => {
                parser.clump(&clump.member, keys)?;
            }
        }
    }
    Ok(())
}

fn register<R: Registrar>(
    target: &mut R,
    flags: &[FlagConfig],
    args: &[ArgConfig],
    commands: &[CommandConfig],
) -> CliResult<()> {
    for flag in flags {
        target.add_flag(flag_spec(flag)?)?;
    }
    for arg in args {
        target.add_arg(arg_spec(arg)?)?;
    }
    for command in commands {
        let child = target.add_command(command_spec(command))?;
        populate(
            child,
            &command.flags,
            &command.args,
            &command.groups,
            &command.commands,
            &command.extra_clumps,
        )?;
    }
    Ok(())
}

fn param(config: &ParamConfig) -> CliResult<Param> {
    let mut param = Param::new(config.name.clone());
    if let Some(type_name) = &config.param_type {
        let convert = convert::by_name(type_name).ok_or_else(|| {
            CliError::config(format!(
                "Unknown type '{}' for parameter '{}'",
                type_name, config.name
            ))
        })?;
        param = param.convert(convert);
    }
    if let Some(default) = &config.default {
        param = param.default_value(default.clone());
    }
    Ok(param)
}

fn apply_entity<B: SpecBuilder>(mut spec: B, config: &EntityConfig) -> CliResult<B> {
    for p in &config.params {
        spec = spec.param(param(p)?);
    }
    if let Some(tail) = &config.variadic {
        spec = spec.variadic(param(tail)?);
    }
    if let Some(help) = &config.help {
        spec = spec.help(help.clone());
    }
    if let Some(default) = &config.default {
        spec = spec.default_value(default.clone());
    }
    spec = match config.action {
        Action::Store => spec,
        Action::Count => spec.state([("count", 0)]).handler(convert::counter),
        Action::Append => spec
            .state([("items", Value::List(Vec::new()))])
            .handler(convert::accumulate),
    };
    Ok(spec
        .required(config.required)
        .clumps(config.clumps.to_clumps()))
}

fn flag_spec(config: &FlagConfig) -> CliResult<FlagSpec> {
    let mut spec = FlagSpec::new(config.entity.name.clone());
    if let Some(short) = config.short {
        spec = spec.short(short);
    } else if config.no_short {
        spec = spec.no_short();
    }
    for alias in &config.aliases {
        spec = spec.alias(alias.clone());
    }
    if let Some(separator) = config.separator {
        spec = spec.separator(separator);
    }
    apply_entity(spec, &config.entity)
}

fn arg_spec(config: &ArgConfig) -> CliResult<ArgSpec> {
    let spec = ArgSpec::new(config.entity.name.clone());
    let spec = match &config.repeat {
        RepeatConfig::Times(n) => spec.repeat(*n),
        RepeatConfig::Rest(marker) if marker == "..." => spec.consume_rest(),
        RepeatConfig::Rest(other) => {
            return Err(CliError::config(format!(
                "Invalid repeat '{}' for argument '{}' (expected a number or \"...\")",
                other, config.entity.name
            )))
        }
    };
    apply_entity(spec, &config.entity)
}

fn command_spec(config: &CommandConfig) -> CommandSpec {
    let mut spec = CommandSpec::new(config.name.clone())
        .required(config.required)
        .clumps(config.clumps.to_clumps());
    if let Some(desc) = &config.desc {
        spec = spec.desc(desc.clone());
    }
    for alias in &config.aliases {
        spec = spec.alias(alias.clone());
    }
    spec
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::ParseOptions;

    fn build(toml: &str) -> CliResult<Parser> {
        let config: ParserConfig = toml::from_str(toml).unwrap();
        config.build()
    }

    #[test]
    fn test_build_flags_and_args() {
        let parser = build(
            r#"
            [parser]
            systemexit = false

            [[flags]]
            name = "verbose"
            action = "count"

            [[args]]
            name = "number"
            params = [{ name = "number", type = "int" }]
            "#,
        )
        .unwrap();
        assert!(parser.has_flag("v"));
        let ns = parser.try_parse(["-vvv", "7"], ParseOptions::new()).unwrap();
        assert_eq!(ns.get("verbose"), Some(&Value::Int(3)));
        assert_eq!(ns.get("number"), Some(&Value::Int(7)));
    }

    #[test]
    fn test_unknown_type_rejected() {
        let err = build(
            r#"
            [[flags]]
            name = "x"
            params = [{ name = "x", type = "complex" }]
            "#,
        )
        .unwrap_err();
        assert!(matches!(err, CliError::Config(_)));
    }

    #[test]
    fn test_bad_repeat_rejected() {
        let err = build(
            r#"
            [[args]]
            name = "rest"
            repeat = "all"
            "#,
        )
        .unwrap_err();
        assert!(err.to_string().contains("Invalid repeat"));
    }

    #[test]
    fn test_late_clump_requires_known_member() {
        let err = build(
            r#"
            [[clump]]
            member = "ghost"
            and = 0
            "#,
        )
        .unwrap_err();
        assert!(matches!(err, CliError::UnknownEntity(_)));
    }
}
