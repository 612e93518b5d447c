// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use std::env;
use std::path::Path;

use anyhow::{bail, Context, Result};
use cim_pipeline::config::load_and_validate_config;
use cim_pipeline::engine::{ExecutionPlan, Orchestrator, RunInputs, StrategyFactory};
use cim_pipeline::observability::messages::validation::ConfigLoaded;
use cim_pipeline::observability::messages::StructuredLog;
use cim_pipeline::services::load_service_fixtures;
use tracing_subscriber::EnvFilter;

const USAGE: &str = "\
Usage: cim-pipeline <config.yaml> <command> [options]

Commands:
  run <feature,...> [--parallel]    Resolve dependencies and compute features
  pipeline <name>                   Run a predefined pipeline
  explicit <feature[.method],...>   Run the given steps in order, no resolution
  describe <feature>                Print a feature definition
  list                              List features and pipelines

Options:
  --inputs <file.json>     JSON object of run inputs (buildings, project_id, ...)
  --services <file.json>   In-memory service fixtures

Example:
  cim-pipeline configs/features.yaml pipeline complete_chain \\
      --inputs fixtures/inputs.json --services fixtures/services.json";

enum Command {
    Run { features: Vec<String>, parallel: bool },
    Pipeline(String),
    Explicit(ExecutionPlan),
    Describe(String),
    List,
}

struct Args {
    config: String,
    command: Command,
    inputs: Option<String>,
    services: Option<String>,
}

fn parse_args(args: &[String]) -> Result<Args> {
    let mut positional = Vec::new();
    let mut inputs = None;
    let mut services = None;
    let mut parallel = false;

    let mut iter = args.iter();
    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "--inputs" => inputs = Some(iter.next().context("--inputs needs a file")?.clone()),
            "--services" => {
                services = Some(iter.next().context("--services needs a file")?.clone())
            }
            "--parallel" => parallel = true,
            _ => positional.push(arg.clone()),
        }
    }

    let mut positional = positional.into_iter();
    let (Some(config), Some(command)) = (positional.next(), positional.next()) else {
        bail!("missing arguments\n\n{}", USAGE);
    };
    let argument = positional.next();
    let require = |what: &str| argument.clone().with_context(|| format!("{} expects {}", command, what));

    let command = match command.as_str() {
        "run" => Command::Run {
            features: require("a comma-separated feature list")?
                .split(',')
                .map(str::trim)
                .filter(|f| !f.is_empty())
                .map(str::to_string)
                .collect(),
            parallel,
        },
        "pipeline" => Command::Pipeline(require("a pipeline name")?),
        "explicit" => Command::Explicit(ExecutionPlan::parse(&require("a step list")?)),
        "describe" => Command::Describe(require("a feature name")?),
        "list" => Command::List,
        other => bail!("unknown command '{}'\n\n{}", other, USAGE),
    };

    Ok(Args {
        config,
        command,
        inputs,
        services,
    })
}

fn read_inputs(path: Option<&str>) -> Result<RunInputs> {
    let Some(path) = path else {
        return Ok(RunInputs::new());
    };
    let content =
        std::fs::read_to_string(path).with_context(|| format!("failed to read inputs '{}'", path))?;
    serde_json::from_str(&content)
        .with_context(|| format!("inputs '{}' must be a JSON object", path))
}

fn print_json<T: serde::Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let raw: Vec<String> = env::args().skip(1).collect();
    if raw.is_empty() || raw.iter().any(|a| a == "--help" || a == "-h") {
        eprintln!("{}", USAGE);
        return Ok(());
    }
    let args = parse_args(&raw)?;

    let config = load_and_validate_config(Path::new(&args.config))?;
    ConfigLoaded {
        path: &args.config,
        feature_count: config.features.len(),
        pipeline_count: config.pipelines.len(),
    }
    .log();

    let mut orchestrator = Orchestrator::from_config(&config, StrategyFactory::with_builtin())?;
    if let Some(path) = &args.services {
        orchestrator = orchestrator.with_services(load_service_fixtures(path)?);
    }
    let inputs = read_inputs(args.inputs.as_deref())?;

    let report = match args.command {
        Command::Run { features, parallel } => orchestrator.run(features.as_slice(), inputs, parallel).await?,
        Command::Pipeline(name) => orchestrator.run_pipeline(&name, inputs).await?,
        Command::Explicit(plan) => orchestrator.run_explicit(&plan, inputs).await?,
        Command::Describe(feature) => return print_json(orchestrator.describe_feature(&feature)?),
        Command::List => {
            let registry = orchestrator.registry();
            return print_json(&serde_json::json!({
                "features": registry.list_features(),
                "services": registry.list_services(),
                "pipelines": registry.list_pipelines(),
            }));
        }
    };

    print_json(&report)?;
    if !report.success {
        std::process::exit(2);
    }
    Ok(())
}
