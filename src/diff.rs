/// Parse a unified diff into files, hunks and change records, and extract
/// the lines each source file gains. This is the input side of "diff
/// coverage": only lines added by the diff are measured.
///
/// Also provides a [`DiffSource`] trait that abstracts over the ways a diff
/// reaches us (a file on disk, stdin).
use std::path::PathBuf;

use indexmap::IndexMap;

use crate::error::{DiffCovError, Result};
use crate::filter::SourceFilter;

/// Destination path → added line numbers, in the order the diff lists them.
pub type AddedLines = IndexMap<String, Vec<u32>>;

// ---------------------------------------------------------------------------
// Diff sources
// ---------------------------------------------------------------------------

/// A source for obtaining a unified diff.
pub trait DiffSource {
    /// Fetch the diff text.
    fn fetch_diff(&self) -> Result<String>;
}

/// Diff read from a file on disk.
pub struct DiffFile {
    pub path: PathBuf,
}

impl DiffSource for DiffFile {
    fn fetch_diff(&self) -> Result<String> {
        if !self.path.exists() {
            return Err(DiffCovError::InputNotFound {
                what: "diff",
                path: self.path.clone(),
            });
        }
        Ok(std::fs::read_to_string(&self.path)?)
    }
}

/// Diff from stdin.
pub struct StdinDiff;

impl DiffSource for StdinDiff {
    fn fetch_diff(&self) -> Result<String> {
        Ok(std::io::read_to_string(std::io::stdin())?)
    }
}

// ---------------------------------------------------------------------------
// Diff model
// ---------------------------------------------------------------------------

/// One line-level record inside a hunk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Change {
    /// Line present only in the new file, at new-file line `ln`.
    Add { ln: u32 },
    /// Line present only in the old file, at old-file line `ln`.
    Delete { ln: u32 },
    /// Unchanged context line.
    Normal { ln_old: u32, ln_new: u32 },
}

/// A `@@ -old_start,old_lines +new_start,new_lines @@` block.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Hunk {
    pub old_start: u32,
    pub old_lines: u32,
    pub new_start: u32,
    pub new_lines: u32,
    pub changes: Vec<Change>,
}

/// The diff of a single file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FileDiff {
    /// Source path (`/dev/null` for created files).
    pub from: String,
    /// Destination path (`/dev/null` for deleted files).
    pub to: String,
    pub hunks: Vec<Hunk>,
}

impl FileDiff {
    /// New-file line numbers of every addition, across all hunks.
    pub fn added_lines(&self) -> impl Iterator<Item = u32> + '_ {
        self.hunks
            .iter()
            .flat_map(|hunk| hunk.changes.iter())
            .filter_map(|change| match change {
                Change::Add { ln } => Some(*ln),
                _ => None,
            })
    }
}

// ---------------------------------------------------------------------------
// Diff parsing
// ---------------------------------------------------------------------------

/// Extract the lines added to every measured source file.
///
/// Files rejected by `filter`, and files whose hunks add nothing, are left
/// out of the result entirely.
pub fn added_lines(diff_text: &str, filter: &SourceFilter) -> AddedLines {
    let files = parse_unified_diff(diff_text);
    log::debug!("diff touches {} file(s)", files.len());

    let mut result = AddedLines::new();
    for file in &files {
        if !filter.matches(&file.to) {
            log::debug!("ignoring {}", file.to);
            continue;
        }
        for ln in file.added_lines() {
            result.entry(file.to.clone()).or_default().push(ln);
        }
    }
    result
}

/// Remaining line budget of the hunk being read.
#[derive(Default)]
struct HunkCursor {
    old_ln: u32,
    new_ln: u32,
    old_left: u32,
    new_left: u32,
}

impl HunkCursor {
    fn is_open(&self) -> bool {
        self.old_left > 0 || self.new_left > 0
    }

    fn advance_old(&mut self) {
        self.old_ln = self.old_ln.saturating_add(1);
        self.old_left = self.old_left.saturating_sub(1);
    }

    fn advance_new(&mut self) {
        self.new_ln = self.new_ln.saturating_add(1);
        self.new_left = self.new_left.saturating_sub(1);
    }
}

/// Parse a unified diff (e.g., `git diff`) into per-file hunks.
///
/// The parser is lenient: lines it does not understand (index lines, mode
/// changes, binary markers, malformed hunk headers) are skipped. Hunk
/// bodies are consumed by count, so a removed line reading `--- foo` is
/// still a deletion rather than a new file header.
pub fn parse_unified_diff(diff_text: &str) -> Vec<FileDiff> {
    let mut files: Vec<FileDiff> = Vec::new();
    let mut current: Option<FileDiff> = None;
    let mut cursor = HunkCursor::default();

    for line in diff_text.lines() {
        if cursor.is_open() {
            if let Some(hunk) = current.as_mut().and_then(|f| f.hunks.last_mut()) {
                match line.as_bytes().first() {
                    Some(b'+') => {
                        hunk.changes.push(Change::Add { ln: cursor.new_ln });
                        cursor.advance_new();
                        continue;
                    }
                    Some(b'-') => {
                        hunk.changes.push(Change::Delete { ln: cursor.old_ln });
                        cursor.advance_old();
                        continue;
                    }
                    // Some tools strip the leading space from blank context lines.
                    Some(b' ') | None => {
                        hunk.changes.push(Change::Normal {
                            ln_old: cursor.old_ln,
                            ln_new: cursor.new_ln,
                        });
                        cursor.advance_old();
                        cursor.advance_new();
                        continue;
                    }
                    // "\ No newline at end of file"
                    Some(b'\\') => continue,
                    // Hunk ended early; treat this line as a header.
                    _ => cursor = HunkCursor::default(),
                }
            } else {
                cursor = HunkCursor::default();
            }
        }

        if let Some(rest) = line.strip_prefix("diff --git ") {
            if let Some(file) = current.take() {
                files.push(file);
            }
            let (from, to) = split_git_header(rest);
            current = Some(FileDiff {
                from,
                to,
                hunks: Vec::new(),
            });
        } else if let Some(rest) = line.strip_prefix("--- ") {
            // Plain (non-git) diffs start each file with the "---" header.
            let starts_new_file = current.as_ref().map_or(true, |f| !f.hunks.is_empty());
            if starts_new_file {
                if let Some(file) = current.take() {
                    files.push(file);
                }
                current = Some(FileDiff::default());
            }
            if let Some(file) = current.as_mut() {
                file.from = clean_path(rest);
            }
        } else if let Some(rest) = line.strip_prefix("+++ ") {
            current.get_or_insert_with(FileDiff::default).to = clean_path(rest);
        } else if line.starts_with("@@ ") {
            let Some((old_start, old_lines, new_start, new_lines)) = parse_hunk_header(line)
            else {
                log::debug!("skipping malformed hunk header: {line}");
                continue;
            };
            let file = current.get_or_insert_with(FileDiff::default);
            file.hunks.push(Hunk {
                old_start,
                old_lines,
                new_start,
                new_lines,
                changes: Vec::new(),
            });
            cursor = HunkCursor {
                old_ln: old_start,
                new_ln: new_start,
                old_left: old_lines,
                new_left: new_lines,
            };
        }
    }

    if let Some(file) = current.take() {
        files.push(file);
    }
    files
}

/// Split the `a/old b/new` part of a `diff --git` line.
fn split_git_header(rest: &str) -> (String, String) {
    match rest.rfind(" b/") {
        Some(idx) => (clean_path(&rest[..idx]), clean_path(&rest[idx + 1..])),
        None => (String::new(), String::new()),
    }
}

/// Strip quoting, trailing timestamps and the `a/` / `b/` VCS prefixes.
fn clean_path(raw: &str) -> String {
    let raw = raw.split('\t').next().unwrap_or(raw);
    let raw = raw.trim_matches('"');
    if raw == "/dev/null" {
        return raw.to_string();
    }
    raw.strip_prefix("b/")
        .or_else(|| raw.strip_prefix("a/"))
        .unwrap_or(raw)
        .to_string()
}

/// Parse `(old_start, old_lines, new_start, new_lines)` from a hunk header
/// like "@@ -10,5 +20,8 @@". Omitted counts default to 1.
fn parse_hunk_header(line: &str) -> Option<(u32, u32, u32, u32)> {
    let after_at = line.strip_prefix("@@ ")?;
    let mut parts = after_at.split(' ');
    let (old_start, old_lines) = parse_range(parts.next()?.strip_prefix('-')?)?;
    let (new_start, new_lines) = parse_range(parts.next()?.strip_prefix('+')?)?;
    Some((old_start, old_lines, new_start, new_lines))
}

fn parse_range(range: &str) -> Option<(u32, u32)> {
    match range.split_once(',') {
        Some((start, count)) => Some((start.parse().ok()?, count.parse().ok()?)),
        None => Some((range.parse().ok()?, 1)),
    }
}
