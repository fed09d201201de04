//! Output formatting for diff coverage results.

use std::fmt::Write;

use colored::{ColoredString, Colorize};
use comfy_table::{presets, Cell, Color, Table};

use crate::model::{EvaluatedCoverage, TotalCoverage};

/// Widest the uncovered-branch column may grow before it is cut short.
const BRANCH_LINES_WIDTH: usize = 150;

/// Evaluated coverage plus its totals, ready to be formatted.
pub struct DiffCoverageReport<'a> {
    pub files: &'a EvaluatedCoverage,
    pub totals: &'a TotalCoverage,
}

impl DiffCoverageReport<'_> {
    /// Format using a specific formatter.
    #[must_use]
    pub fn format(&self, formatter: &dyn ReportFormatter) -> String {
        formatter.format(self)
    }
}

/// Trait for formatting diff coverage reports.
pub trait ReportFormatter {
    /// Format the report to a string.
    fn format(&self, report: &DiffCoverageReport) -> String;
}

/// Traffic-light color for a percentage: ≥80 green, ≥50 yellow, else red.
fn grade(percentage: f64) -> Color {
    if percentage >= 80.0 {
        Color::Green
    } else if percentage >= 50.0 {
        Color::Yellow
    } else {
        Color::Red
    }
}

/// Paint `msg` in the color `percentage` earns, if colors are on.
#[must_use]
pub fn paint(percentage: f64, msg: &str, colorize: bool) -> String {
    if !colorize {
        return msg.to_string();
    }
    let painted: ColoredString = match grade(percentage) {
        Color::Green => msg.green(),
        Color::Yellow => msg.yellow(),
        _ => msg.red(),
    };
    painted.to_string()
}

/// Comma-joined line list, e.g. "11,12".
#[must_use]
pub fn join_lines(lines: &[u32]) -> String {
    lines
        .iter()
        .map(u32::to_string)
        .collect::<Vec<_>>()
        .join(",")
}

fn truncate(text: String, width: usize) -> String {
    if text.chars().count() <= width {
        return text;
    }
    let mut cut: String = text.chars().take(width.saturating_sub(1)).collect();
    cut.push('…');
    cut
}

fn percentage_cell(percentage: f64) -> Cell {
    Cell::new(format!("{percentage}%")).fg(grade(percentage))
}

/// Per-file table (`--report text`).
pub struct TextFormatter {
    pub colorize: bool,
}

impl ReportFormatter for TextFormatter {
    fn format(&self, report: &DiffCoverageReport) -> String {
        let mut table = Table::new();
        table.load_preset(presets::UTF8_FULL_CONDENSED);
        if self.colorize {
            table.enforce_styling();
        } else {
            table.force_no_tty();
        }

        table.set_header(vec![
            "File",
            "% Stmt",
            "% Branch",
            "Uncovered Line #s",
            "Uncovered Branch Line #s",
            "Lines Changed",
        ]);
        table.add_row(vec![
            Cell::new("All changed files"),
            percentage_cell(report.totals.total_stmt_percentage),
            percentage_cell(report.totals.total_branch_percentage),
            Cell::new(""),
            Cell::new(""),
            Cell::new(""),
        ]);

        for (path, file) in report.files {
            table.add_row(vec![
                Cell::new(format!("    {path}")),
                percentage_cell(file.stmt.percentage()),
                percentage_cell(file.branch.percentage()),
                Cell::new(join_lines(&file.stmt.uncovered_lines)),
                Cell::new(truncate(
                    join_lines(&file.branch.uncovered_lines),
                    BRANCH_LINES_WIDTH,
                )),
                Cell::new(join_lines(&file.lines)),
            ]);
        }

        format!("{table}\n")
    }
}

/// Totals only (`--report text-summary`).
pub struct SummaryFormatter {
    pub colorize: bool,
}

impl ReportFormatter for SummaryFormatter {
    fn format(&self, report: &DiffCoverageReport) -> String {
        let t = report.totals;
        let mut out = String::new();
        writeln!(
            out,
            "=============================== Diff Coverage summary ==============================="
        )
        .unwrap();
        let stmt = format!(
            "Statements   : {}% ( {}/{} )",
            t.total_stmt_percentage, t.total_covered_stmt, t.total_stmt
        );
        writeln!(out, "{}", paint(t.total_stmt_percentage, &stmt, self.colorize)).unwrap();
        let branch = format!(
            "Branches     : {}% ( {}/{} )",
            t.total_branch_percentage, t.total_covered_branch, t.total_branch
        );
        writeln!(
            out,
            "{}",
            paint(t.total_branch_percentage, &branch, self.colorize)
        )
        .unwrap();
        writeln!(
            out,
            "====================================================================================="
        )
        .unwrap();
        out
    }
}
