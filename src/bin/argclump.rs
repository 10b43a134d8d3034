//! `argclump` - parse arguments against a parser definition file
//!
//! ```text
//! argclump cli.toml -- foo -S "test test" -vvvv
//! ```
//!
//! Prints the resulting namespace as JSON, or the usual usage/error text
//! (exit status 2) when the arguments violate the definition.

use anyhow::{Context, Result};
use argclump::{
    convert, ArgSpec, Clumps, FlagSpec, Namespace, Param, ParseOptions, Parser, ParserConfig,
    ParserSettings, SpecBuilder, Value,
};
use tracing::{debug, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

fn setup_logging(level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn cli() -> Result<Parser> {
    let mut cli = Parser::new(
        ParserSettings::default()
            .prog("argclump")
            .desc("Parse arguments against a TOML/JSON parser definition"),
    )?;
    cli.arg(ArgSpec::new("definition").required(true).help("Definition file (.toml or .json)"))?
        .arg(
            ArgSpec::new("input")
                .consume_rest()
                .state([("items", Value::List(Vec::new()))])
                .handler(convert::accumulate)
                .default_value(Value::List(Vec::new()))
                .help("Arguments to parse; put them after `--`"),
        )?
        .flag(FlagSpec::new("strict").help("Reject unknown flags and wrong positional counts"))?
        .flag(
            FlagSpec::new("propagate_unknowns")
                .short('p')
                .help("Let subcommands hand unknown flags to their parents"),
        )?
        .flag(FlagSpec::new("plain").help("Print `name: value` lines instead of JSON"))?
        .flag(
            FlagSpec::new("usage")
                .short('u')
                .help("Print the defined parser's help screen instead of parsing"),
        )?
        .flag(
            FlagSpec::new("log_level")
                .short('l')
                .param(Param::new("level"))
                .default_value("warn")
                .help("Log filter used when RUST_LOG is unset"),
        )?;
    // Showing the defined parser's help and parsing input are alternatives
    cli.clump("usage", Clumps::new().xor(0))?
        .clump("input", Clumps::new().xor(0))?;
    Ok(cli)
}

fn main() -> Result<()> {
    let cli = cli()?;
    let opts = cli.parse_env(ParseOptions::new().strict(true))?;

    let level = opts
        .get("log_level")
        .and_then(Value::as_str)
        .unwrap_or("warn");
    setup_logging(level);

    let path = opts
        .get("definition")
        .and_then(Value::as_str)
        .context("missing definition path")?;
    let definition = ParserConfig::from_file(path)
        .with_context(|| format!("Failed to load definition from {}", path))?;
    let parser = definition
        .build()
        .with_context(|| format!("Invalid definition in {}", path))?;
    info!(definition = path, "Loaded parser definition");

    if opts.contains("usage") {
        println!("{}", parser.format_help());
        return Ok(());
    }

    let input: Vec<String> = opts
        .get("input")
        .and_then(Value::as_list)
        .unwrap_or(&[])
        .iter()
        .map(ToString::to_string)
        .collect();
    debug!(tokens = input.len(), "Parsing input");

    let options = ParseOptions::new()
        .strict(opts.contains("strict"))
        .propagate_unknowns(opts.contains("propagate_unknowns"))
        .systemexit(true);
    let ns: Namespace = parser.parse(input, options)?;

    if opts.contains("plain") {
        println!("{}", ns.pretty("\n", ": "));
    } else {
        println!("{}", serde_json::to_string_pretty(&ns)?);
    }
    Ok(())
}
