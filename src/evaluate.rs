//! Measures added lines against statement and branch coverage.
//!
//! Each coverage record spans a range of lines. Records are expanded line by
//! line into a [`LineCoverageSets`] state machine, visiting them in the
//! order the report lists them, and the result is then intersected with the
//! lines the diff added.

use std::ops::RangeInclusive;

use indexmap::IndexMap;

use crate::coverage::{CoverageReport, FileCoverage};
use crate::diff::AddedLines;
use crate::model::{ChangedLineCoverage, EvaluatedCoverage, EvaluatedFileCoverage};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineState {
    Covered,
    Uncovered,
}

/// Per-line classification for one file and one coverage kind.
///
/// Transition rule: a covered record marks a line `Covered` unless it is
/// already `Uncovered`; an uncovered record always marks it `Uncovered`,
/// revoking an earlier `Covered`. A line therefore only ends up covered if
/// every record touching it is covered.
#[derive(Debug, Clone, Default)]
pub struct LineCoverageSets {
    lines: IndexMap<u32, LineState>,
}

impl LineCoverageSets {
    pub fn mark(&mut self, line: u32, covered: bool) {
        let next = match (covered, self.lines.get(&line)) {
            (true, Some(LineState::Uncovered)) | (false, _) => LineState::Uncovered,
            (true, _) => LineState::Covered,
        };
        self.lines.insert(line, next);
    }

    pub fn mark_range(&mut self, lines: RangeInclusive<u32>, covered: bool) {
        for line in lines {
            self.mark(line, covered);
        }
    }

    /// Like [`mark_range`](Self::mark_range) but stops at `last`, the
    /// highest line that will be intersected.
    pub fn mark_range_until(&mut self, lines: RangeInclusive<u32>, last: u32, covered: bool) {
        let (start, end) = lines.into_inner();
        self.mark_range(start..=end.min(last), covered);
    }

    #[must_use]
    pub fn state(&self, line: u32) -> Option<LineState> {
        self.lines.get(&line).copied()
    }

    /// Classify `changed_lines` in their given order. Lines no record
    /// touches are counted in neither bucket.
    #[must_use]
    pub fn intersect(&self, changed_lines: &[u32]) -> ChangedLineCoverage {
        let mut result = ChangedLineCoverage::default();
        for &line in changed_lines {
            match self.state(line) {
                Some(LineState::Covered) => {
                    result.covered_lines.push(line);
                    result.n_covered += 1;
                }
                Some(LineState::Uncovered) => {
                    result.uncovered_lines.push(line);
                    result.n_uncovered += 1;
                }
                None => {}
            }
        }
        result
    }
}

/// A statement is covered when it ran at least once.
fn statement_is_covered(hits: u64) -> bool {
    hits > 0
}

/// A branch is covered only when every arm ran at least once.
fn branch_is_covered(arms: &[u64]) -> bool {
    let total = arms.iter().fold(0u64, |acc, &n| acc.saturating_add(n));
    total >= arms.len() as u64 && !arms.contains(&0)
}

/// Statement coverage of `changed_lines` in one file.
#[must_use]
pub fn statement_coverage(file: &FileCoverage, changed_lines: &[u32]) -> ChangedLineCoverage {
    let mut sets = LineCoverageSets::default();
    let last = changed_lines.iter().copied().max().unwrap_or(0);
    for (id, &hits) in &file.s {
        let Some(location) = file.statement_map.get(id) else {
            log::warn!("statement {id} has no entry in statementMap, skipping");
            continue;
        };
        sets.mark_range_until(location.lines(), last, statement_is_covered(hits));
    }
    sets.intersect(changed_lines)
}

/// Branch coverage of `changed_lines` in one file.
#[must_use]
pub fn branch_coverage(file: &FileCoverage, changed_lines: &[u32]) -> ChangedLineCoverage {
    let mut sets = LineCoverageSets::default();
    let last = changed_lines.iter().copied().max().unwrap_or(0);
    for (id, arms) in &file.b {
        let Some(mapping) = file.branch_map.get(id) else {
            log::warn!("branch {id} has no entry in branchMap, skipping");
            continue;
        };
        sets.mark_range_until(mapping.loc.lines(), last, branch_is_covered(arms));
    }
    sets.intersect(changed_lines)
}

/// Evaluate every changed file the coverage report knows about.
///
/// Files missing from the report (new files, stale coverage runs) are
/// skipped and contribute nothing to the totals.
#[must_use]
pub fn evaluate_coverage(report: &CoverageReport, added: &AddedLines) -> EvaluatedCoverage {
    let mut evaluated = EvaluatedCoverage::new();
    for (path, lines) in added {
        let Some(file) = report.get(path) else {
            log::debug!("no coverage recorded for {path}");
            continue;
        };
        evaluated.insert(
            path.clone(),
            EvaluatedFileCoverage {
                lines: lines.clone(),
                stmt: statement_coverage(file, lines),
                branch: branch_coverage(file, lines),
            },
        );
    }
    evaluated
}
