//! AND/OR/XOR clumps across a group and the top level

use argclump::{
    convert, ArgSpec, CliError, Clumps, FlagSpec, GroupSpec, ParseOptions, Parser,
    ParserSettings, Param, SpecBuilder, Value,
};

fn parser() -> Parser {
    let mut cli = Parser::new(ParserSettings::default().systemexit(false)).unwrap();
    let sc = cli
        .attach_group("sc", GroupSpec::new().clumps(Clumps::new().xor(0)))
        .unwrap();

    cli.arg(ArgSpec::new("name").help("Positionals are filled in registration order"))
        .unwrap();

    cli.group(&sc)
        .unwrap()
        .flag(
            FlagSpec::new("scream")
                .short('S')
                .param(Param::new("text"))
                .and("blah")
                .handler(|_, args| {
                    Ok(Value::from(
                        args[0].as_str().unwrap_or_default().to_uppercase(),
                    ))
                }),
        )
        .unwrap()
        .flag(
            FlagSpec::new("verbosity")
                .state([("count", 0)])
                .and("blah")
                .handler(|state, _| {
                    let count = state.get("count").and_then(Value::as_int).unwrap_or(0);
                    if count < 10 {
                        state.insert("count", count + 1);
                    }
                    Ok(state["count"].clone())
                }),
        )
        .unwrap();

    cli.flag(
        FlagSpec::new("addition")
            .alias("add")
            .xor(0)
            .param(Param::typed("a", convert::int()).default_value(4))
            .variadic(Param::typed("b", convert::int()))
            .handler(|_, args| Ok(Value::from(args.iter().filter_map(Value::as_int).sum::<i64>()))),
    )
    .unwrap();
    cli
}

fn parse(cli: &Parser, line: &str) -> Result<argclump::Namespace, CliError> {
    cli.try_parse_str(line, ParseOptions::new())
}

#[test]
fn test_group_and_clump_satisfied() {
    let cli = parser();
    let done = parse(&cli, r#"foo -S "test test" -vvvv"#).unwrap();
    assert_eq!(done["name"], Value::from("foo"));
    assert_eq!(done["scream"], Value::from("TEST TEST"));
    assert_eq!(done["verbosity"], Value::Int(4));
}

#[test]
fn test_variadic_flag() {
    let cli = parser();
    let done = parse(&cli, "bar -a 1 2 9").unwrap();
    assert_eq!(done["name"], Value::from("bar"));
    assert_eq!(done["addition"], Value::Int(12));
}

#[test]
fn test_variadic_flag_uses_param_default() {
    let cli = parser();
    let done = parse(&cli, "bar --addition").unwrap();
    assert_eq!(done["addition"], Value::Int(4));
}

#[test]
fn test_and_failure() {
    let cli = parser();
    let err = parse(&cli, "foo -v").unwrap_err();
    assert!(matches!(err, CliError::And(_)));

    let failure = err.clump_failure().unwrap();
    assert_eq!(failure.scope, "sc");
    assert_eq!(failure.key, "blah");
    assert!(failure.not_exempt.contains("scream"));
    assert!(failure.message.starts_with("Expected all of the following"));
}

#[test]
fn test_xor_failure() {
    let cli = parser();
    let err = parse(&cli, r#"foo --add 1 2 -S "ahh" -v"#).unwrap_err();
    assert!(matches!(err, CliError::Xor(_)));
    assert!(err.is_constraint_violation());
    assert_eq!(err.exit_code(), 2);
}

#[test]
fn test_namespaces_stateless() {
    let cli = parser();
    let first = parse(&cli, "foo -S a -vvvv").unwrap();
    let second = parse(&cli, "foo -vvvv -S a").unwrap();
    assert_eq!(first["verbosity"], Value::Int(4));
    assert_eq!(first["verbosity"], second["verbosity"]);
}

#[test]
fn test_state_capped_by_handler() {
    let cli = parser();
    let done = parse(&cli, "foo -S a -vvvvvvvvvvvv").unwrap();
    assert_eq!(done["verbosity"], Value::Int(10));
}

#[test]
fn test_namespace_accessors() {
    let cli = parser();
    let done = parse(&cli, "foo -S aaa -v").unwrap();
    assert!(!done.is_empty());
    assert_eq!(done.get("verbosity"), Some(&done["verbosity"]));
    assert_eq!(done.keys().collect::<Vec<_>>(), vec!["name", "scream", "verbosity"]);
    assert_eq!(
        done.pretty(", ", "="),
        "name=foo, scream=AAA, verbosity=1"
    );
}
