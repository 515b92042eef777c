//! msgexpr - evaluate an expression or predicate against a message

use anyhow::{bail, Context, Result};
use clap::Parser as ClapParser;
use msgexpr::expression::{parse_numeric, Value, ValueType};
use msgexpr::{LanguageConfig, Message, MessageContext, SimpleLanguage};
use std::path::PathBuf;

/// msgexpr - evaluate message expressions and predicates
#[derive(ClapParser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Expression text, e.g. "Hello ${header.name}" or "${header.age} >= 18"
    expression: String,

    /// Compile as a predicate and print true or false
    #[arg(short, long)]
    predicate: bool,

    /// JSON file with body, headers, properties and variables
    #[arg(short, long)]
    message: Option<PathBuf>,

    /// Message body (overrides the file's body)
    #[arg(short, long)]
    body: Option<String>,

    /// Header as name=value; numbers and booleans are typed
    #[arg(short = 'H', long = "header")]
    headers: Vec<String>,

    /// Exchange property as name=value
    #[arg(short = 'P', long = "property")]
    properties: Vec<String>,

    /// Treat backslashes in the expression literally
    #[arg(long)]
    no_escape: bool,

    /// Target type for expression results (string, integer, boolean, ...)
    #[arg(short, long)]
    r#type: Option<String>,

    /// Enable debug logging
    #[arg(short, long)]
    debug: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();

    let log_level = if args.debug { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(log_level)).init();

    let message = match &args.message {
        Some(path) => Message::load(path)?,
        None => Message::default(),
    };
    let mut context = MessageContext::new(message);
    if let Some(body) = &args.body {
        context = context.with_body(body.as_str());
    }
    for entry in &args.headers {
        let (name, value) = parse_assignment(entry).context("Invalid --header")?;
        context = context.with_header(name, value);
    }
    for entry in &args.properties {
        let (name, value) = parse_assignment(entry).context("Invalid --property")?;
        context = context.with_property(name, value);
    }

    let config = LanguageConfig::default().with_escape(!args.no_escape);
    let language = SimpleLanguage::new(config);
    language.start();

    if args.predicate {
        let predicate = language
            .compile_predicate(&args.expression)
            .context("Failed to compile predicate")?;
        let matched = predicate
            .matches(&context)
            .context("Failed to evaluate predicate")?;
        println!("{}", matched);
    } else {
        let target = match &args.r#type {
            Some(name) => ValueType::from_name(name)
                .with_context(|| format!("Unknown type '{}'", name))?,
            None => ValueType::Any,
        };
        let expression = language
            .compile_expression(&args.expression)
            .context("Failed to compile expression")?;
        let value = expression
            .evaluate(&context, target)
            .context("Failed to evaluate expression")?;
        println!("{}", value);
    }

    language.stop();
    Ok(())
}

/// Split `name=value`, typing the value like a bare predicate literal.
fn parse_assignment(entry: &str) -> Result<(String, Value)> {
    let Some((name, raw)) = entry.split_once('=') else {
        bail!("expected name=value, got '{}'", entry);
    };
    let name = name.trim();
    if name.is_empty() {
        bail!("empty name in '{}'", entry);
    }

    let value = match raw {
        "true" => Value::Boolean(true),
        "false" => Value::Boolean(false),
        _ => parse_numeric(raw).unwrap_or_else(|| Value::string(raw)),
    };
    Ok((name.to_string(), value))
}
