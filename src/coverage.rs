/// Loader for Istanbul / NYC `coverage-final.json` reports.
///
/// Reference: https://github.com/istanbuljs/istanbuljs
///
/// The format is a JSON object keyed by file path. Each value contains:
///   - `statementMap`: `{ "0": { "start": { "line": 1, "column": 0 }, "end": { "line": 1, "column": 30 } }, ... }`
///   - `s`:            `{ "0": 5, "1": 0, ... }`  hit counts per statement
///   - `branchMap`:    `{ "0": { "loc": ..., "type": "if", "locations": [...] }, ... }`
///   - `b`:            `{ "0": [5, 0], ... }`  hit counts per branch arm
///
/// Every map keeps the order of the report, because evaluation visits
/// records in that order. Other keys (`fnMap`, `f`, `hash`, ...) are ignored.
use std::ops::RangeInclusive;
use std::path::{Component, Path, PathBuf};

use indexmap::IndexMap;
use serde::Deserialize;

use crate::error::{DiffCovError, Result};

/// A `{ "line": N }` position; columns are irrelevant here.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct Position {
    pub line: u32,
}

/// A `{ start, end }` source span.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct Location {
    pub start: Position,
    pub end: Position,
}

impl Location {
    pub fn new(start: u32, end: u32) -> Self {
        Self {
            start: Position { line: start },
            end: Position { line: end },
        }
    }

    /// Every line the span touches, inclusive.
    #[must_use]
    pub fn lines(&self) -> RangeInclusive<u32> {
        self.start.line..=self.end.line
    }
}

/// A `branchMap` entry, reduced to the span of the whole decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(try_from = "RawBranch")]
pub struct BranchMapping {
    pub loc: Location,
}

/// `branchMap` entry as written by the various Istanbul versions. Older
/// reports carry only `line` and `locations`; implicit `else` arms have
/// empty `{}` positions.
#[derive(Deserialize)]
struct RawBranch {
    loc: Option<Location>,
    #[serde(default)]
    locations: Vec<LooseLocation>,
    line: Option<u32>,
}

#[derive(Default, Deserialize)]
struct LooseLocation {
    #[serde(default)]
    start: LoosePosition,
    #[serde(default)]
    end: LoosePosition,
}

#[derive(Default, Deserialize)]
struct LoosePosition {
    line: Option<u32>,
}

impl TryFrom<RawBranch> for BranchMapping {
    type Error = String;

    fn try_from(raw: RawBranch) -> std::result::Result<Self, Self::Error> {
        if let Some(loc) = raw.loc {
            return Ok(Self { loc });
        }

        let starts = raw.locations.iter().filter_map(|l| l.start.line);
        let ends = raw.locations.iter().filter_map(|l| l.end.line.or(l.start.line));
        if let (Some(start), Some(end)) = (starts.min(), ends.max()) {
            return Ok(Self {
                loc: Location::new(start, end),
            });
        }

        match raw.line {
            Some(line) => Ok(Self {
                loc: Location::new(line, line),
            }),
            None => Err("branch entry has no `loc`, `locations` or `line`".to_string()),
        }
    }
}

/// Coverage facts for one source file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct FileCoverage {
    #[serde(rename = "statementMap", default)]
    pub statement_map: IndexMap<String, Location>,
    /// Statement id → hit count.
    #[serde(default)]
    pub s: IndexMap<String, u64>,
    #[serde(rename = "branchMap", default)]
    pub branch_map: IndexMap<String, BranchMapping>,
    /// Branch id → hit count per arm.
    #[serde(default)]
    pub b: IndexMap<String, Vec<u64>>,
}

/// A loaded report, keyed by path relative to the project root.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CoverageReport {
    files: IndexMap<String, FileCoverage>,
}

impl CoverageReport {
    #[must_use]
    pub fn get(&self, path: &str) -> Option<&FileCoverage> {
        self.files.get(path)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.files.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    pub fn paths(&self) -> impl Iterator<Item = &str> {
        self.files.keys().map(String::as_str)
    }
}

impl FromIterator<(String, FileCoverage)> for CoverageReport {
    fn from_iter<I: IntoIterator<Item = (String, FileCoverage)>>(iter: I) -> Self {
        Self {
            files: iter.into_iter().collect(),
        }
    }
}

/// Read a report from disk without parsing it.
pub fn read_coverage_file(path: &Path) -> Result<String> {
    if !path.exists() {
        return Err(DiffCovError::InputNotFound {
            what: "coverage",
            path: path.to_path_buf(),
        });
    }
    Ok(std::fs::read_to_string(path)?)
}

/// Parse an Istanbul JSON report and re-key it relative to `root`.
///
/// Fails with [`DiffCovError::Integrity`] when a key does not contain its
/// own root-relative form, which happens when `root` is not an ancestor of
/// the paths the coverage tool recorded.
pub fn load_coverage(json: &str, root: &Path) -> Result<CoverageReport> {
    let raw: IndexMap<String, FileCoverage> = serde_json::from_str(json)?;
    log::debug!("coverage report has {} file(s)", raw.len());

    // A relative root is taken from the current directory.
    let root = &std::path::absolute(root)?;

    let mut files = IndexMap::with_capacity(raw.len());
    for (key, file) in raw {
        let relative = relative_key(&key, root);
        if !key.contains(&relative) {
            return Err(DiffCovError::Integrity {
                key,
                root: root.to_path_buf(),
            });
        }
        files.insert(relative, file);
    }
    Ok(CoverageReport { files })
}

/// Path of `key` relative to `root`. Relative keys are taken to be relative
/// to `root` already.
fn relative_key(key: &str, root: &Path) -> String {
    let root = normalize(root);
    let absolute = normalize(&root.join(key));
    match pathdiff::diff_paths(&absolute, &root) {
        Some(relative) => relative.to_string_lossy().into_owned(),
        None => key.to_string(),
    }
}

/// Lexically resolve `.` and `..` components.
fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                if matches!(out.components().next_back(), Some(Component::Normal(_))) {
                    out.pop();
                } else {
                    out.push(component);
                }
            }
            other => out.push(other),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    const EXAMPLE: &str = include_str!("../tests/fixtures/coverage-example.json");

    #[test]
    fn test_load_relative_to_root() {
        let report = load_coverage(EXAMPLE, Path::new("/dev")).unwrap();
        assert_eq!(report.paths().collect::<Vec<_>>(), vec!["dummy/dummyUtil.js"]);

        let file = report.get("dummy/dummyUtil.js").unwrap();
        assert_eq!(file.statement_map.len(), file.s.len());
        assert_eq!(file.statement_map["2"], Location::new(9, 11));
        assert_eq!(file.b["3"], vec![3, 0]);
    }

    #[test]
    fn test_trailing_slash_root() {
        let report = load_coverage(EXAMPLE, Path::new("/dev/")).unwrap();
        assert!(report.get("dummy/dummyUtil.js").is_some());
    }

    #[test]
    fn test_bad_root_is_integrity_error() {
        let err = load_coverage(EXAMPLE, Path::new("/buster")).unwrap_err();
        assert!(matches!(err, DiffCovError::Integrity { .. }), "{err}");
    }

    #[test]
    fn test_malformed_report() {
        let err = load_coverage("{ not json", Path::new("/")).unwrap_err();
        assert!(matches!(err, DiffCovError::MalformedReport(_)));

        let err = load_coverage("", Path::new("/")).unwrap_err();
        assert!(matches!(err, DiffCovError::MalformedReport(_)));
    }

    #[test]
    fn test_relative_keys() {
        let json = r#"{ "src/app.js": { "statementMap": {}, "s": {}, "branchMap": {}, "b": {} } }"#;
        let report = load_coverage(json, Path::new("/repo")).unwrap();
        assert!(report.get("src/app.js").is_some());
    }

    #[test]
    fn test_keeps_report_order() {
        let json = r#"{
            "/repo/src/app.js": {
                "statementMap": {
                    "0": { "start": { "line": 1 }, "end": { "line": 1 } },
                    "10": { "start": { "line": 2 }, "end": { "line": 2 } },
                    "2": { "start": { "line": 3 }, "end": { "line": 3 } }
                },
                "s": { "0": 1, "10": 0, "2": 4 }
            }
        }"#;
        let report = load_coverage(json, Path::new("/repo")).unwrap();
        let file = report.get("src/app.js").unwrap();
        let ids: Vec<_> = file.s.keys().cloned().collect();
        assert_eq!(ids, vec!["0", "10", "2"]);
        assert!(file.branch_map.is_empty());
    }

    #[test]
    fn test_branch_without_loc_uses_locations() {
        let json = r#"{
            "/repo/a.js": {
                "branchMap": {
                    "0": {
                        "line": 4,
                        "type": "if",
                        "locations": [
                            { "start": { "line": 4, "column": 2 }, "end": { "line": 6, "column": 3 } },
                            { "start": {}, "end": {} }
                        ]
                    },
                    "1": { "line": 9, "type": "if", "locations": [] }
                },
                "b": { "0": [1, 0], "1": [2, 2] }
            }
        }"#;
        let report = load_coverage(json, Path::new("/repo")).unwrap();
        let file = report.get("a.js").unwrap();
        assert_eq!(file.branch_map["0"].loc, Location::new(4, 6));
        assert_eq!(file.branch_map["1"].loc, Location::new(9, 9));
    }

    #[test]
    fn test_branch_without_any_position_is_malformed() {
        let json = r#"{ "/repo/a.js": { "branchMap": { "0": { "type": "if" } }, "b": { "0": [1] } } }"#;
        let err = load_coverage(json, Path::new("/repo")).unwrap_err();
        assert!(matches!(err, DiffCovError::MalformedReport(_)));
    }

    #[test]
    fn test_relative_root_resolves_against_current_dir() {
        let cwd = std::env::current_dir().unwrap();
        let key = cwd.join("sub/src/a.js");
        let json = format!(
            r#"{{ {}: {{ "statementMap": {{}}, "s": {{}} }} }}"#,
            serde_json::to_string(&key.to_string_lossy()).unwrap()
        );

        let report = load_coverage(&json, Path::new(".")).unwrap();
        assert_eq!(report.paths().collect::<Vec<_>>(), vec!["sub/src/a.js"]);

        let report = load_coverage(&json, Path::new("sub")).unwrap();
        assert_eq!(report.paths().collect::<Vec<_>>(), vec!["src/a.js"]);

        let report = load_coverage(&json, Path::new("./sub/")).unwrap();
        assert_eq!(report.paths().collect::<Vec<_>>(), vec!["src/a.js"]);
    }

    #[test]
    fn test_normalize() {
        assert_eq!(normalize(Path::new("/a/./b/../c")), PathBuf::from("/a/c"));
        assert_eq!(normalize(Path::new("../x")), PathBuf::from("../x"));
    }
}
