//! Subcommands joining their parent's clumps, and help for them

use argclump::{
    convert, ArgSpec, CliError, Clumps, CommandSpec, FlagSpec, GroupSpec, Namespace, Param,
    ParseFailure, ParseOptions, Parser, ParserSettings, SpecBuilder, Value,
};

fn parser() -> Parser {
    let mut cli = Parser::new(
        ParserSettings::default()
            .systemexit(false)
            .prog("shout")
            .desc("Say things loudly, or count"),
    )
    .unwrap();
    let sc = cli
        .attach_group("sc", GroupSpec::new().clumps(Clumps::new().xor(0)))
        .unwrap();

    cli.arg(ArgSpec::new("name")).unwrap();

    cli.group(&sc)
        .unwrap()
        .flag(
            FlagSpec::new("scream")
                .short('S')
                .param(Param::new("text"))
                .and("blah")
                .help("Shout the given text"),
        )
        .unwrap()
        .flag(
            FlagSpec::new("verbosity")
                .state([("count", 0)])
                .handler(convert::counter)
                .and("blah"),
        )
        .unwrap();

    cli.command(CommandSpec::new("int").desc("Take an integer").xor(0))
        .unwrap()
        .arg(ArgSpec::new("integer").param(Param::typed("integer", convert::int())))
        .unwrap();
    cli
}

fn parse(cli: &Parser, line: &str) -> Result<Namespace, CliError> {
    cli.try_parse_str(line, ParseOptions::new())
}

#[test]
fn test_plain_positional() {
    let cli = parser();
    let done = parse(&cli, "test").unwrap();
    assert_eq!(done["name"], Value::from("test"));
    assert!(!done.contains("int"));
}

#[test]
fn test_command_position_matters() {
    let cli = parser();
    let before = parse(&cli, "test int 1").unwrap();
    let after = parse(&cli, "int 1 test").unwrap();

    let int_of = |ns: &Namespace| {
        ns["int"]
            .as_namespace()
            .and_then(|sub| sub.get("integer"))
            .cloned()
    };
    assert_eq!(int_of(&before), Some(Value::Int(1)));
    assert_eq!(int_of(&before), int_of(&after));
    assert!(!after.contains("name"));
    assert_ne!(before, after);
}

#[test]
fn test_command_excludes_group() {
    let cli = parser();
    for infix in ["-S nothin", "-v", "-S nothin -v"] {
        let err = parse(&cli, &format!("test {} int 1", infix)).unwrap_err();
        assert!(matches!(err, CliError::Xor(_)), "{}: {:?}", infix, err);
    }
}

#[test]
fn test_missing_flag_argument() {
    let cli = parser();
    let err = parse(&cli, "test -S").unwrap_err();
    match err {
        CliError::ArityMismatch { entity, got, .. } => {
            assert_eq!(entity, "scream");
            assert_eq!(got, 0);
        }
        other => panic!("expected an arity mismatch, got {:?}", other),
    }
}

#[test]
fn test_command_conversion_error() {
    let cli = parser();
    let err = parse(&cli, "test int what").unwrap_err();
    assert!(matches!(err, CliError::Conversion(_)));
    assert!(err.to_string().contains("what"));
}

#[test]
fn test_command_alias() {
    let mut cli = parser();
    cli.command(CommandSpec::new("float").alias("f"))
        .unwrap()
        .arg(ArgSpec::new("number").param(Param::typed("number", convert::float())))
        .unwrap();

    let done = parse(&cli, "f 2.5").unwrap();
    let sub = done["float"].as_namespace().unwrap();
    assert_eq!(sub["number"], Value::Float(2.5));
}

#[test]
fn test_help_flag_requested() {
    let cli = parser();
    let err = parse(&cli, "--help").unwrap_err();
    match err {
        CliError::HelpRequested {
            command_path,
            topic,
        } => {
            assert!(command_path.is_empty());
            assert_eq!(topic, None);
        }
        other => panic!("expected help, got {:?}", other),
    }
    assert_eq!(
        CliError::HelpRequested {
            command_path: Vec::new(),
            topic: None
        }
        .exit_code(),
        0
    );
}

#[test]
fn test_help_for_command_and_topic() {
    let cli = parser();
    match parse(&cli, "int -h").unwrap_err() {
        CliError::HelpRequested { command_path, .. } => {
            assert_eq!(command_path, vec!["int".to_string()]);
        }
        other => panic!("expected help, got {:?}", other),
    }
    match parse(&cli, "--help scream").unwrap_err() {
        CliError::HelpRequested { topic, .. } => {
            assert_eq!(topic.as_deref(), Some("scream"));
        }
        other => panic!("expected help, got {:?}", other),
    }
}

#[test]
fn test_help_screen() {
    colored::control::set_override(false);
    let cli = parser();
    let help = cli.format_help();
    assert!(help.contains("Say things loudly, or count"));
    assert!(help.contains("usage:"));
    assert!(help.contains("commands:"));
    assert!(help.contains("int"));
    assert!(help.contains("Shout the given text"));

    let usage = cli.usage();
    assert!(usage.starts_with("shout"));
    assert!(usage.contains("[-S | --scream TEXT]"));
    assert!(usage.contains("name(1)"));
    assert!(usage.ends_with("<command>"));

    assert!(cli.entity_help("scream").is_some());
    assert!(cli.entity_help("nothing").is_none());
}

#[test]
fn test_failure_names_failing_command() {
    colored::control::set_override(false);
    let cli = parser();
    let failure: ParseFailure = cli
        .try_parse_located(["test", "int", "what"], ParseOptions::new())
        .unwrap_err();
    assert_eq!(failure.command_path, vec!["int".to_string()]);
    assert!(matches!(failure.error, CliError::Conversion(_)));

    let text = cli.render_failure(&failure);
    let usage = text.lines().next().unwrap();
    assert!(usage.starts_with("shout int "), "{}", usage);
    assert!(usage.contains("integer(1)"));
    assert!(!usage.contains("--scream"));
    assert!(text.contains("error:"));
}

#[test]
fn test_failure_at_top_level() {
    colored::control::set_override(false);
    let cli = parser();
    let failure = cli
        .try_parse_located(["test", "-S"], ParseOptions::new())
        .unwrap_err();
    assert!(failure.command_path.is_empty());
    let text = cli.render_failure(&failure);
    assert!(text.starts_with("shout "));
    assert!(text.contains("[-S | --scream TEXT]"));
}

#[test]
fn test_attached_command_paths() {
    let mut remote = Parser::new(ParserSettings::default().prog("remote")).unwrap();
    remote
        .command(CommandSpec::new("add"))
        .unwrap()
        .arg(ArgSpec::new("url"))
        .unwrap();

    let mut cli = Parser::new(ParserSettings::default().systemexit(false).prog("vcs")).unwrap();
    cli.attach_command(CommandSpec::new("remote"), remote).unwrap();

    let add = cli
        .find_command(&["remote".to_string(), "add".to_string()])
        .unwrap();
    assert_eq!(add.command_path(), ["remote".to_string(), "add".to_string()]);
    assert!(add.usage().starts_with("vcs remote add "));

    let failure = cli
        .try_parse_located(["remote", "add"], ParseOptions::new().strict(true))
        .unwrap_err();
    assert_eq!(failure.command_path, vec!["remote".to_string(), "add".to_string()]);
    assert!(cli.render_failure(&failure).starts_with("vcs remote add "));
}
