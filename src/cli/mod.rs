//! Command-line parsing for the mortality curve fitter.
//!
//! The goal of this module is to keep **argument parsing** separate from the
//! fitting code; `app::fit_config_from_args` turns the parsed flags into a
//! `FitConfig`.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

/// Default path of the stop file that cancels a running fit.
pub const DEFAULT_STOP_FILE: &str = "deathcurve.stop";

/// Top-level CLI.
#[derive(Debug, Parser)]
#[command(
    name = "deathcurve",
    version,
    about = "Age-adjusted mortality risk curves by maximum likelihood"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

/// CLI subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Fit mortality curves to a CSV with `age` and `outcome` columns.
    Fit(FitArgs),
    /// Fit mortality curves to a synthetic sample with a known risk curve.
    Demo(DemoArgs),
}

#[derive(Debug, Args, Clone)]
pub struct FitArgs {
    /// Input CSV (`age`, `outcome` with 1 = death, 0 = other).
    #[arg(value_name = "CSV")]
    pub csv: PathBuf,

    #[command(flatten)]
    pub search: SearchArgs,
}

/// True risk curve of a synthetic sample.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum CurveKind {
    Logistic,
    Step,
    Constant,
}

#[derive(Debug, Args, Clone)]
pub struct DemoArgs {
    /// Number of synthetic subjects.
    #[arg(short = 'n', long, default_value_t = 400)]
    pub count: usize,

    /// Random seed for sample generation.
    #[arg(long, default_value_t = 42)]
    pub seed: u64,

    /// Shape of the true risk curve.
    #[arg(long, value_enum, default_value_t = CurveKind::Logistic)]
    pub curve: CurveKind,

    /// Age at which the true risk reaches 50% (logistic) or jumps to 100% (step).
    #[arg(long, default_value_t = 60.0)]
    pub midpoint: f64,

    /// Logistic scale in years.
    #[arg(long, default_value_t = 8.0)]
    pub scale: f64,

    /// Risk at every age for the constant curve.
    #[arg(long, default_value_t = 0.1)]
    pub rate: f64,

    /// Oldest generated age.
    #[arg(long, default_value_t = 100.0)]
    pub age_max: f64,

    #[command(flatten)]
    pub search: SearchArgs,
}

/// Options shared by every subcommand that runs a fit.
#[derive(Debug, Args, Clone)]
pub struct SearchArgs {
    /// Function shape ids to fit (0-9, comma separated). Defaults to all.
    #[arg(
        long,
        value_delimiter = ',',
        value_parser = clap::value_parser!(u8).range(0..=9)
    )]
    pub shapes: Vec<u8>,

    /// Starting sign mask (bit k set = coefficient b_k negative), e.g. 5 or 0b101.
    #[arg(long, default_value = "0", value_parser = parse_sign_mask)]
    pub signs: u8,

    /// Sweep sign patterns from the starting mask instead of using it alone.
    #[arg(long)]
    pub sweep_signs: bool,

    /// Polynomial order (2-7); floor-and-ceiling shapes use at most 5.
    #[arg(long, default_value_t = 7)]
    pub order: usize,

    /// Finest precision level (step 10^-p in exponent space).
    #[arg(long, default_value_t = 4)]
    pub max_precision: u32,

    /// Identical consecutive moves tolerated before coarsening the precision.
    #[arg(long, default_value_t = 25)]
    pub stagnation_limit: usize,

    /// Step budget for each (shape, sign pattern) search.
    #[arg(long, default_value_t = 100_000)]
    pub max_steps: usize,

    /// Age at which insignificant coefficients are pruned.
    #[arg(long, default_value_t = 100.0)]
    pub reference_age: f64,

    /// Worker threads (defaults to one per CPU).
    #[arg(long)]
    pub threads: Option<usize>,

    /// Creating this file stops the fit and reports partial results.
    #[arg(long, default_value = DEFAULT_STOP_FILE)]
    pub stop_file: PathBuf,

    /// Export the run (settings, fits, best curve grid) to JSON.
    #[arg(long)]
    pub export: Option<PathBuf>,
}

fn parse_sign_mask(s: &str) -> Result<u8, String> {
    let parsed = match s.strip_prefix("0b") {
        Some(bits) => u8::from_str_radix(bits, 2),
        None => s.parse::<u8>(),
    };
    parsed.map_err(|e| format!("invalid sign mask '{s}': {e}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sign_masks_accept_decimal_and_binary() {
        assert_eq!(parse_sign_mask("5"), Ok(5));
        assert_eq!(parse_sign_mask("0b101"), Ok(5));
        assert!(parse_sign_mask("0b2").is_err());
        assert!(parse_sign_mask("256").is_err());
    }

    #[test]
    fn fit_arguments_parse() {
        let cli = Cli::try_parse_from([
            "deathcurve",
            "fit",
            "cases.csv",
            "--shapes",
            "2,0,3",
            "--signs",
            "0b11",
            "--sweep-signs",
            "--order",
            "3",
            "--threads",
            "2",
        ])
        .unwrap();
        let Command::Fit(args) = cli.command else {
            panic!("expected fit");
        };
        assert_eq!(args.csv, PathBuf::from("cases.csv"));
        assert_eq!(args.search.shapes, vec![2, 0, 3]);
        assert_eq!(args.search.signs, 3);
        assert!(args.search.sweep_signs);
        assert_eq!(args.search.order, 3);
        assert_eq!(args.search.threads, Some(2));
        assert_eq!(args.search.stop_file, PathBuf::from(DEFAULT_STOP_FILE));
    }

    #[test]
    fn out_of_range_shape_is_rejected() {
        assert!(Cli::try_parse_from(["deathcurve", "demo", "--shapes", "10"]).is_err());
    }
}
