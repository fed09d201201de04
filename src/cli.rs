//! Command handler for the diffcov CLI.
//!
//! `cmd_diff_coverage` returns its output as a `String` together with the
//! gate result, making it easy to test without capturing stdout or exiting.

use std::fmt::Write;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::ValueEnum;

use crate::coverage::load_coverage;
use crate::diff::added_lines;
use crate::evaluate::evaluate_coverage;
use crate::filter::SourceFilter;
use crate::model::TotalCoverage;
use crate::report::{paint, DiffCoverageReport, ReportFormatter, SummaryFormatter, TextFormatter};
use crate::threshold::Thresholds;

/// Report styles accepted by `--report`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum ReportKind {
    Text,
    TextSummary,
}

/// Everything besides the two inputs that shapes a run.
#[derive(Debug, Clone)]
pub struct DiffCoverageOptions {
    /// Directory the coverage report's paths are made relative to.
    pub root: PathBuf,
    pub reports: Vec<ReportKind>,
    pub thresholds: Thresholds,
    /// Skip the threshold gate entirely.
    pub ignore: bool,
    pub colorize: bool,
}

impl Default for DiffCoverageOptions {
    fn default() -> Self {
        Self {
            root: PathBuf::from("."),
            reports: vec![ReportKind::TextSummary],
            thresholds: Thresholds::default(),
            ignore: false,
            colorize: false,
        }
    }
}

/// Rendered output and whether the run passed the gate.
#[derive(Debug)]
pub struct Outcome {
    pub output: String,
    pub passed: bool,
}

/// Measure `diff_text` against `coverage_json`, render the requested
/// reports and apply the threshold gate.
pub fn cmd_diff_coverage(
    diff_text: &str,
    coverage_json: &str,
    options: &DiffCoverageOptions,
) -> Result<Outcome> {
    let filter = SourceFilter::new();
    let added = added_lines(diff_text, &filter);
    let coverage = load_coverage(coverage_json, &options.root)
        .with_context(|| format!("Failed to load coverage relative to {}", options.root.display()))?;
    let evaluated = evaluate_coverage(&coverage, &added);
    log::debug!(
        "{} changed source file(s), {} with coverage",
        added.len(),
        evaluated.len()
    );

    let mut out = String::new();
    let colorize = options.colorize;

    if evaluated.is_empty() {
        writeln!(out, "{}", paint(100.0, "No new js or ts files added", colorize)).unwrap();
        return Ok(Outcome {
            output: out,
            passed: true,
        });
    }

    let totals = TotalCoverage::from_evaluated(&evaluated);
    let report = DiffCoverageReport {
        files: &evaluated,
        totals: &totals,
    };

    let mut formatters: Vec<Box<dyn ReportFormatter>> = Vec::new();
    if options.reports.contains(&ReportKind::Text) {
        formatters.push(Box::new(TextFormatter { colorize }));
    }
    if options.reports.contains(&ReportKind::TextSummary) {
        formatters.push(Box::new(SummaryFormatter { colorize }));
    }
    for formatter in &formatters {
        out.push_str(&report.format(formatter.as_ref()));
    }

    if options.ignore {
        writeln!(out, "{}", paint(100.0, "Threshold checks disabled", colorize)).unwrap();
        return Ok(Outcome {
            output: out,
            passed: true,
        });
    }

    let verdict = options.thresholds.check(&totals);
    let passed = verdict.passed();
    let grade = if passed { 100.0 } else { 0.0 };
    writeln!(out, "{}", paint(grade, &verdict.to_string(), colorize)).unwrap();

    Ok(Outcome {
        output: out,
        passed,
    })
}
