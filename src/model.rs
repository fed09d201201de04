//! Results of measuring a diff against a coverage report: per-file
//! changed-line coverage and the totals derived from it.

use indexmap::IndexMap;

/// Round to two decimal places by shifting the decimal point in the
/// number's shortest textual form, so `1.005` becomes `1.01` rather than
/// falling victim to its binary representation.
#[must_use]
pub fn round2(value: f64) -> f64 {
    if !value.is_finite() {
        return value;
    }
    let shifted: f64 = format!("{value}e2").parse().unwrap_or(value * 100.0);
    let rounded = shifted.round();
    format!("{rounded}e-2").parse().unwrap_or(rounded / 100.0)
}

/// Coverage percentage (0–100, two decimals). Nothing to cover counts as
/// fully covered.
#[must_use]
pub fn percentage(covered: u64, total: u64) -> f64 {
    if total == 0 {
        100.0
    } else {
        round2(covered as f64 / total as f64 * 100.0)
    }
}

/// Statement or branch coverage of the added lines of one file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChangedLineCoverage {
    pub n_covered: u64,
    pub n_uncovered: u64,
    /// Added lines that are tracked and covered, in diff order.
    pub covered_lines: Vec<u32>,
    /// Added lines that are tracked and NOT covered, in diff order.
    pub uncovered_lines: Vec<u32>,
}

impl ChangedLineCoverage {
    #[must_use]
    pub fn total(&self) -> u64 {
        self.n_covered + self.n_uncovered
    }

    #[must_use]
    pub fn percentage(&self) -> f64 {
        percentage(self.n_covered, self.total())
    }
}

/// Everything measured for one changed file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EvaluatedFileCoverage {
    /// Lines added by the diff.
    pub lines: Vec<u32>,
    pub stmt: ChangedLineCoverage,
    pub branch: ChangedLineCoverage,
}

/// Path → evaluated coverage, in diff order. Files the coverage report
/// knows nothing about are absent.
pub type EvaluatedCoverage = IndexMap<String, EvaluatedFileCoverage>;

/// Totals across every evaluated file.
#[derive(Debug, Clone, PartialEq)]
pub struct TotalCoverage {
    pub total_covered_stmt: u64,
    pub total_stmt: u64,
    pub total_stmt_percentage: f64,
    pub total_covered_branch: u64,
    pub total_branch: u64,
    pub total_branch_percentage: f64,
}

impl TotalCoverage {
    #[must_use]
    pub fn from_evaluated(evaluated: &EvaluatedCoverage) -> Self {
        let mut total_covered_stmt = 0;
        let mut total_stmt = 0;
        let mut total_covered_branch = 0;
        let mut total_branch = 0;

        for file in evaluated.values() {
            total_covered_stmt += file.stmt.n_covered;
            total_stmt += file.stmt.total();
            total_covered_branch += file.branch.n_covered;
            total_branch += file.branch.total();
        }

        Self {
            total_covered_stmt,
            total_stmt,
            total_stmt_percentage: percentage(total_covered_stmt, total_stmt),
            total_covered_branch,
            total_branch,
            total_branch_percentage: percentage(total_covered_branch, total_branch),
        }
    }
}
