//! Minimum coverage percentages and the pass/fail verdict against them.

use std::fmt;

use crate::error::{DiffCovError, Result};
use crate::model::TotalCoverage;

pub const DEFAULT_STMT_THRESHOLD: f64 = 80.0;
pub const DEFAULT_BRANCH_THRESHOLD: f64 = 0.0;

/// Parse a threshold percentage, rejecting non-numbers and values outside
/// `0..=100`. `kind` names the option in error messages.
pub fn parse_percentage(kind: &str, raw: &str) -> Result<f64> {
    let value: f64 = raw
        .trim()
        .parse()
        .ok()
        .filter(|v: &f64| !v.is_nan())
        .ok_or_else(|| DiffCovError::InvalidArgument(format!("{kind}: must pass in a number")))?;
    if !(0.0..=100.0).contains(&value) {
        return Err(DiffCovError::InvalidArgument(format!(
            "{kind}: percentage must be between 0-100"
        )));
    }
    Ok(value)
}

/// clap value parser for `--stmt`.
pub fn parse_stmt_threshold(raw: &str) -> Result<f64> {
    parse_percentage("stmt", raw)
}

/// clap value parser for `--branch`.
pub fn parse_branch_threshold(raw: &str) -> Result<f64> {
    parse_percentage("branch", raw)
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Thresholds {
    pub stmt: f64,
    pub branch: f64,
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            stmt: DEFAULT_STMT_THRESHOLD,
            branch: DEFAULT_BRANCH_THRESHOLD,
        }
    }
}

impl Thresholds {
    /// Check totals against the thresholds. Statements are checked first.
    #[must_use]
    pub fn check(&self, totals: &TotalCoverage) -> Verdict {
        if totals.total_stmt_percentage < self.stmt {
            Verdict::StmtFailed {
                actual: totals.total_stmt_percentage,
                minimum: self.stmt,
            }
        } else if totals.total_branch_percentage < self.branch {
            Verdict::BranchFailed {
                actual: totals.total_branch_percentage,
                minimum: self.branch,
            }
        } else {
            Verdict::Pass(*self)
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Verdict {
    Pass(Thresholds),
    StmtFailed { actual: f64, minimum: f64 },
    BranchFailed { actual: f64, minimum: f64 },
}

impl Verdict {
    #[must_use]
    pub fn passed(&self) -> bool {
        matches!(self, Verdict::Pass(_))
    }
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Verdict::Pass(t) => write!(
                f,
                "Threshold checks pass: Stmt Threshold {}% - Branch Threshold {}%",
                t.stmt, t.branch
            ),
            Verdict::StmtFailed { actual, minimum } => write!(
                f,
                "Failed statement percentage threshold check: {actual}% of minimum {minimum}%"
            ),
            Verdict::BranchFailed { actual, minimum } => write!(
                f,
                "Failed branch percentage threshold check: {actual}% of minimum {minimum}%"
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn totals(stmt: f64, branch: f64) -> TotalCoverage {
        TotalCoverage {
            total_covered_stmt: 0,
            total_stmt: 0,
            total_stmt_percentage: stmt,
            total_covered_branch: 0,
            total_branch: 0,
            total_branch_percentage: branch,
        }
    }

    #[test]
    fn test_parse_percentage() {
        assert_eq!(parse_percentage("stmt", "80").unwrap(), 80.0);
        assert_eq!(parse_percentage("stmt", "0").unwrap(), 0.0);
        assert_eq!(parse_percentage("stmt", "100").unwrap(), 100.0);
        assert_eq!(parse_percentage("branch", "12.5").unwrap(), 12.5);
    }

    #[test]
    fn test_parse_percentage_rejects_non_numbers() {
        let err = parse_percentage("stmt", "lots").unwrap_err();
        assert_eq!(err.to_string(), "stmt: must pass in a number");
        assert!(parse_percentage("stmt", "NaN").is_err());
    }

    #[test]
    fn test_parse_percentage_rejects_out_of_range() {
        let err = parse_percentage("branch", "101").unwrap_err();
        assert_eq!(err.to_string(), "branch: percentage must be between 0-100");
        assert!(parse_percentage("branch", "-1").is_err());
        assert!(parse_percentage("branch", "inf").is_err());
    }

    #[test]
    fn test_check_pass() {
        let verdict = Thresholds::default().check(&totals(80.0, 0.0));
        assert!(verdict.passed());
        assert_eq!(
            verdict.to_string(),
            "Threshold checks pass: Stmt Threshold 80% - Branch Threshold 0%"
        );
    }

    #[test]
    fn test_check_stmt_first() {
        let thresholds = Thresholds {
            stmt: 50.0,
            branch: 50.0,
        };
        let verdict = thresholds.check(&totals(33.33, 10.0));
        assert_eq!(
            verdict,
            Verdict::StmtFailed {
                actual: 33.33,
                minimum: 50.0
            }
        );
        assert_eq!(
            verdict.to_string(),
            "Failed statement percentage threshold check: 33.33% of minimum 50%"
        );
    }

    #[test]
    fn test_check_branch_reports_branch_percentage() {
        let thresholds = Thresholds {
            stmt: 50.0,
            branch: 50.0,
        };
        let verdict = thresholds.check(&totals(100.0, 25.5));
        assert!(!verdict.passed());
        assert_eq!(
            verdict.to_string(),
            "Failed branch percentage threshold check: 25.5% of minimum 50%"
        );
    }
}
