//! Formatted terminal output.
//!
//! Formatting lives in one place so the fitting code stays free of
//! presentation concerns.

use crate::domain::{DatasetStats, FitResult};
use crate::fit::FitSelection;

/// Format the full run summary (dataset stats + per-shape fits + chosen shape).
pub fn format_run_summary(stats: &DatasetStats, selection: &FitSelection) -> String {
    let mut out = String::new();

    out.push_str("=== deathcurve - mortality risk curve fit ===\n");
    out.push_str(&format!(
        "Subjects: n={} | deaths={} ({:.2}%) | age=[{:.2}, {:.2}]\n",
        stats.n,
        stats.deaths,
        stats.death_rate * 100.0,
        stats.age_min,
        stats.age_max
    ));
    if selection.cancelled {
        out.push_str("Run was CANCELLED: results below are partial.\n");
    }

    out.push_str("\nFunction fits:\n");
    for fit in &selection.fits {
        out.push_str(&format_fit(fit));
    }

    out.push_str(&format!(
        "\nChosen: [{}] {}\n",
        selection.best.shape.id(),
        selection.best.shape.display_name()
    ));
    out.push_str(&format!("  log-likelihood: {:.16}\n", selection.best.log_likelihood));
    if let Some(second) = &selection.second_best {
        out.push_str(&format!(
            "Second best (the chosen function may not rise monotonically with age): [{}] {}\n",
            second.shape.id(),
            second.shape.display_name()
        ));
        out.push_str(&format!("  log-likelihood: {:.16}\n", second.log_likelihood));
    }

    out
}

fn format_fit(fit: &FitResult) -> String {
    let mut out = String::new();
    out.push_str(&format!("\n[{}] {}", fit.shape.id(), fit.shape.display_name()));
    if fit.is_partial() {
        out.push_str(&format!(" (partial: {:?})", fit.status));
    }
    out.push('\n');
    out.push_str(&format!("  log-likelihood: {:.16}\n", fit.log_likelihood));
    out.push_str(&format!(
        "  degree={} | signs={:08b} | steps={}\n",
        fit.degree,
        fit.signs.bits(),
        fit.steps
    ));
    let coefficients: Vec<String> = fit.coefficients.iter().map(|c| format!("{c:e}")).collect();
    out.push_str(&format!("  coefficients: {}\n", coefficients.join(" ")));
    let exponents: Vec<String> = fit.exponents.iter().map(|e| format!("{e:.4}")).collect();
    out.push_str(&format!("  exponents:    {}\n", exponents.join(" ")));
    out
}
