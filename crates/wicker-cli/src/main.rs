use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use serde::Serialize;
use std::path::PathBuf;
use wicker_beans::{BeanDefinition, DefinitionRegistry};
use wicker_env::Environment;
use wicker_xml::{read_file, Problem, ReadSummary};

#[derive(Parser)]
#[command(name = "wicker", version, about = "Wicker CLI (lint and inspect bean definition documents)")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Parse a definition document and report problems
    Lint(ReadArgs),
    /// Parse a definition document and print the resulting registry
    Dump(ReadArgs),
}

#[derive(Args)]
struct ReadArgs {
    /// Path to a bean definition XML document
    file: PathBuf,
    /// Active profiles (repeatable, comma separated)
    #[arg(long = "profile", value_delimiter = ',')]
    profiles: Vec<String>,
    /// Environment properties for placeholder resolution (KEY=VALUE)
    #[arg(long = "set", value_name = "KEY=VALUE")]
    properties: Vec<String>,
    /// Emit JSON suitable for CI
    #[arg(long)]
    json: bool,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();
    let exit_code = match run(cli) {
        Ok(code) => code,
        Err(err) => {
            eprintln!("{err:#}");
            2
        }
    };

    std::process::exit(exit_code);
}

fn run(cli: Cli) -> Result<i32> {
    match cli.command {
        Command::Lint(args) => {
            let environment = build_environment(&args)?;
            let mut registry = DefinitionRegistry::new();
            let summary = read_file(&args.file, &mut registry, &environment);
            print_lint(&summary, args.json)?;
            Ok(if summary.problems.is_empty() { 0 } else { 1 })
        }
        Command::Dump(args) => {
            let environment = build_environment(&args)?;
            let mut registry = DefinitionRegistry::new();
            let summary = read_file(&args.file, &mut registry, &environment);
            print_dump(&registry, &summary, args.json)?;
            Ok(if summary.problems.is_empty() { 0 } else { 1 })
        }
    }
}

fn build_environment(args: &ReadArgs) -> Result<Environment> {
    let mut environment = Environment::new();
    environment.set_active_profiles(args.profiles.iter().cloned());
    for property in &args.properties {
        let Some((key, value)) = property.split_once('=') else {
            bail!("--set expects KEY=VALUE, got '{property}'");
        };
        environment.set_property(key, value);
    }
    Ok(environment)
}

#[derive(Serialize)]
struct LintReport<'a> {
    registered: usize,
    problems: &'a [Problem],
}

fn print_lint(summary: &ReadSummary, json: bool) -> Result<()> {
    if json {
        let report = LintReport {
            registered: summary.registered,
            problems: &summary.problems,
        };
        println!("{}", serde_json::to_string_pretty(&report).context("serializing lint report")?);
        return Ok(());
    }

    for problem in &summary.problems {
        eprintln!("{problem}");
    }
    println!(
        "registered {} definition(s), {} problem(s)",
        summary.registered,
        summary.problems.len()
    );
    Ok(())
}

#[derive(Serialize)]
struct DumpReport<'a> {
    definitions: Vec<DumpedDefinition<'a>>,
    problems: &'a [Problem],
}

#[derive(Serialize)]
struct DumpedDefinition<'a> {
    name: &'a str,
    aliases: Vec<&'a str>,
    definition: &'a BeanDefinition,
}

fn print_dump(registry: &DefinitionRegistry, summary: &ReadSummary, json: bool) -> Result<()> {
    let definitions: Vec<DumpedDefinition<'_>> = registry
        .definition_names()
        .filter_map(|name| {
            registry.definition(name).map(|definition| DumpedDefinition {
                name,
                aliases: registry.aliases_for(name),
                definition,
            })
        })
        .collect();

    if json {
        let report = DumpReport {
            definitions,
            problems: &summary.problems,
        };
        println!("{}", serde_json::to_string_pretty(&report).context("serializing dump report")?);
        return Ok(());
    }

    for entry in &definitions {
        let class = entry
            .definition
            .class_name
            .as_deref()
            .unwrap_or("<no class>");
        if entry.aliases.is_empty() {
            println!("{} ({class})", entry.name);
        } else {
            println!("{} ({class}) aliases: {}", entry.name, entry.aliases.join(", "));
        }
    }
    for problem in &summary.problems {
        eprintln!("{problem}");
    }
    Ok(())
}
