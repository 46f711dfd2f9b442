//! Top-level application orchestration.
//!
//! `src/main.rs` is intentionally tiny; this module is the "real main" that:
//! - parses CLI arguments and sets up logging
//! - loads or generates the dataset
//! - runs the fit + selection pipeline
//! - prints the summary

use clap::Parser;

use crate::cli::{Command, CurveKind, DemoArgs, FitArgs, SearchArgs};
use crate::data::{RiskCurve, SampleSpec, generate_sample};
use crate::domain::{FitConfig, FunctionShape, SignPattern};
use crate::error::AppError;

pub mod pipeline;
pub mod stop;

/// Entry point for the `deathcurve` binary.
pub fn run() -> Result<(), AppError> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let argv = rewrite_args(std::env::args().collect());
    let cli = crate::cli::Cli::parse_from(argv);

    match cli.command {
        Command::Fit(args) => handle_fit(args),
        Command::Demo(args) => handle_demo(args),
    }
}

fn handle_fit(args: FitArgs) -> Result<(), AppError> {
    let config = fit_config_from_args(&args.search)?;
    let ingest = crate::io::ingest::load_observations(&args.csv)?;
    for err in &ingest.row_errors {
        log::warn!("Skipped line {}: {}", err.line, err.message);
    }
    log::info!(
        "Read {} rows from '{}', using {}",
        ingest.rows_read,
        args.csv.display(),
        ingest.rows_used
    );

    let run = pipeline::run_fit(
        &ingest.dataset,
        &config,
        &args.search.stop_file,
        args.search.export.as_deref(),
    )?;
    println!("{}", crate::report::format_run_summary(&run.stats, &run.selection));
    Ok(())
}

fn handle_demo(args: DemoArgs) -> Result<(), AppError> {
    let config = fit_config_from_args(&args.search)?;
    let curve = match args.curve {
        CurveKind::Logistic => RiskCurve::Logistic {
            midpoint: args.midpoint,
            scale: args.scale,
        },
        CurveKind::Step => RiskCurve::Step {
            threshold: args.midpoint,
        },
        CurveKind::Constant => RiskCurve::Constant { rate: args.rate },
    };
    let spec = SampleSpec {
        count: args.count,
        age_min: 0.0,
        age_max: args.age_max,
        curve,
        seed: args.seed,
    };
    let dataset = generate_sample(&spec)?;

    let run = pipeline::run_fit(
        &dataset,
        &config,
        &args.search.stop_file,
        args.search.export.as_deref(),
    )?;
    println!("{}", crate::report::format_run_summary(&run.stats, &run.selection));
    Ok(())
}

pub fn fit_config_from_args(args: &SearchArgs) -> Result<FitConfig, AppError> {
    let shapes = if args.shapes.is_empty() {
        FunctionShape::ALL.to_vec()
    } else {
        FitConfig::shapes_from_ids(&args.shapes)?
    };
    let config = FitConfig {
        shapes,
        sign_pattern: SignPattern::from_bits(args.signs),
        sweep_signs: args.sweep_signs,
        polynomial_order: args.order,
        max_precision: args.max_precision,
        stagnation_limit: args.stagnation_limit,
        max_steps: args.max_steps,
        reference_age: args.reference_age,
        threads: args.threads,
        ..FitConfig::default()
    };
    config.validate()?;
    Ok(config)
}

/// Rewrite argv so a bare invocation does something useful.
///
/// Rules:
/// - `deathcurve`                      -> `deathcurve demo`
/// - `deathcurve --order 3 ...`        -> `deathcurve demo --order 3 ...`
/// - `deathcurve cases.csv ...`        -> `deathcurve fit cases.csv ...`
/// - `deathcurve --help/--version/-h`  -> unchanged
fn rewrite_args(mut argv: Vec<String>) -> Vec<String> {
    let Some(arg1) = argv.get(1).cloned() else {
        argv.push("demo".to_string());
        return argv;
    };

    let is_top_level_help_or_version =
        matches!(arg1.as_str(), "-h" | "--help" | "-V" | "--version" | "help");
    let is_subcommand = matches!(arg1.as_str(), "fit" | "demo");
    if is_top_level_help_or_version || is_subcommand {
        return argv;
    }

    let inserted = if arg1.starts_with('-') { "demo" } else { "fit" };
    argv.insert(1, inserted.to_string());
    argv
}
