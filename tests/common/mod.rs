#![allow(dead_code)]

use std::path::{Path, PathBuf};

use tempfile::TempDir;

/// Path of a file under `tests/fixtures`.
pub fn fixture_path(name: &str) -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("tests/fixtures")
        .join(name)
}

/// Contents of a file under `tests/fixtures`.
pub fn fixture(name: &str) -> String {
    std::fs::read_to_string(fixture_path(name)).unwrap()
}

/// Write a diff and a coverage report into a fresh temporary directory,
/// returning the dir handle and both paths.
/// The caller must hold onto `TempDir` to keep the temp directory alive.
pub fn write_inputs(diff: &str, coverage: &str) -> (TempDir, PathBuf, PathBuf) {
    let dir = tempfile::tempdir().unwrap();
    let diff_path = dir.path().join("change.diff");
    let coverage_path = dir.path().join("coverage-final.json");
    std::fs::write(&diff_path, diff).unwrap();
    std::fs::write(&coverage_path, coverage).unwrap();
    (dir, diff_path, coverage_path)
}
