use std::io::IsTerminal;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Parser;
use colored::Colorize;

use diffcov::cli::{self, DiffCoverageOptions, ReportKind};
use diffcov::coverage::read_coverage_file;
use diffcov::diff::{DiffFile, DiffSource, StdinDiff};
use diffcov::threshold::{parse_branch_threshold, parse_stmt_threshold, Thresholds};

/// diffcov: statement and branch coverage of the lines a diff adds.
#[derive(Parser)]
#[command(name = "diffcov", version, about)]
struct Cli {
    /// Diff file to compare code coverage to ("-" reads stdin).
    #[arg(short, long)]
    diff: PathBuf,

    /// Istanbul full JSON coverage report to use against the diff.
    #[arg(short, long, default_value = "./coverage/coverage-final.json")]
    coverage: PathBuf,

    /// Root directory the coverage report paths are relative to
    /// (default: current directory).
    #[arg(short, long)]
    path: Option<PathBuf>,

    /// Type of report; may be given more than once.
    #[arg(short, long, value_enum, num_args = 1.., default_value = "text-summary")]
    report: Vec<ReportKind>,

    /// Percentage threshold for statement coverage.
    #[arg(short, long, default_value = "80", value_parser = parse_stmt_threshold)]
    stmt: f64,

    /// Percentage threshold for branch coverage.
    #[arg(short, long, default_value = "0", value_parser = parse_branch_threshold)]
    branch: f64,

    /// Ignore threshold checks.
    #[arg(short, long)]
    ignore: bool,
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let args = Cli::parse();
    match run(args) {
        Ok(true) => {}
        Ok(false) => std::process::exit(1),
        Err(e) => {
            eprintln!("{}", format!("Error: {e:#}").red());
            std::process::exit(2);
        }
    }
}

fn run(args: Cli) -> Result<bool> {
    let diff_text = if args.diff == Path::new("-") {
        StdinDiff.fetch_diff()?
    } else {
        DiffFile { path: args.diff }.fetch_diff()?
    };
    let coverage_json = read_coverage_file(&args.coverage)?;

    let root = match args.path {
        Some(path) => std::path::absolute(&path)
            .with_context(|| format!("Failed to resolve {}", path.display()))?,
        None => std::env::current_dir().context("Failed to read current directory")?,
    };

    let options = DiffCoverageOptions {
        root,
        reports: args.report,
        thresholds: Thresholds {
            stmt: args.stmt,
            branch: args.branch,
        },
        ignore: args.ignore,
        colorize: std::io::stdout().is_terminal() && std::env::var_os("NO_COLOR").is_none(),
    };

    let outcome = cli::cmd_diff_coverage(&diff_text, &coverage_json, &options)?;
    print!("{}", outcome.output);
    Ok(outcome.passed)
}
