//! Run one DAA monitoring cycle over a traffic scenario and print the bands.
//!
//! Usage:
//!   cargo run -p daa-cli --bin daa-bands -- --scenario head-on
//!   cargo run -p daa-cli --bin daa-bands -- --config daa.txt --scenario traffic.json --json

use anyhow::Context;
use chrono::Utc;
use clap::Parser;
use daa_cli::{Scenario, BUILTIN_SCENARIOS};
use daa_core::{DaaConfig, DaaEngine, Diagnostics};
use std::path::PathBuf;
use tracing_subscriber::prelude::*;
use tracing_subscriber::EnvFilter;

/// Compute detect-and-avoid bands for one traffic snapshot
#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Args {
    /// Threshold configuration (parameter file, or .json)
    #[arg(long, env = "DAA_CONFIG")]
    config: Option<PathBuf>,

    /// Built-in scenario name or path to a scenario JSON file
    #[arg(long, default_value = "head-on")]
    scenario: String,

    /// Print the report as JSON
    #[arg(long)]
    json: bool,

    /// Emit logs as JSON lines
    #[arg(long, env = "DAA_LOG_JSON")]
    log_json: bool,

    /// Per-intruder and per-level trace events
    #[arg(long)]
    verbose: bool,

    /// Print the effective configuration and exit
    #[arg(long)]
    dump_config: bool,
}

fn init_tracing(json: bool) -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new("daa_core=info,daa_cli=info,daa_bands=info"))?;
    let registry = tracing_subscriber::registry().with(filter);
    if json {
        registry
            .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
    }
    Ok(())
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    init_tracing(args.log_json)?;

    let config = match &args.config {
        Some(path) => DaaConfig::load(path)
            .with_context(|| format!("Failed to load configuration {}", path.display()))?,
        None => DaaConfig::default(),
    };

    if args.dump_config {
        print!("{}", config.to_params());
        return Ok(());
    }

    let scenario = Scenario::resolve(&args.scenario).with_context(|| {
        format!(
            "Unknown scenario '{}' (built-in: {})",
            args.scenario,
            BUILTIN_SCENARIOS.join(", ")
        )
    })?;
    let frame = scenario
        .frame()
        .with_context(|| format!("Scenario '{}' is not a valid traffic frame", scenario.name))?;

    let diagnostics = Diagnostics::new("daa-bands", args.verbose);
    let mut engine = DaaEngine::new(config, diagnostics).context("Invalid DAA configuration")?;
    tracing::info!(
        "Running scenario '{}' with {} intruder(s)",
        scenario.name,
        frame.intruders().len()
    );
    let report = engine.run_cycle(&frame);
    let generated_at = Utc::now();

    if args.json {
        let out = serde_json::json!({
            "generated_at": generated_at,
            "scenario": scenario.name,
            "report": report,
        });
        println!("{}", serde_json::to_string_pretty(&out)?);
    } else {
        println!(
            "DAA bands for '{}' at {}",
            scenario.name,
            generated_at.format("%Y-%m-%d %H:%M:%S UTC")
        );
        print!("{report}");
    }
    Ok(())
}
