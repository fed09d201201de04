//! Decides which files in a diff are source files worth measuring.
//!
//! A path qualifies when it ends in `.js` or `.ts` and is neither a test
//! file (`test*.js`, `test*.ts`) nor a spec file (`*spec.js`, `*spec.ts`).
//! Matching is case-sensitive and anchored at the end of the path only, so
//! `src/latest.js` is treated as a test file just like `testUtil.js`.

use std::sync::LazyLock;

use regex::Regex;

static SOURCE_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\.[jt]s$").unwrap());
static TEST_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"test[A-Za-z0-9]*\.[jt]s$").unwrap());
static SPEC_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"spec\.[jt]s$").unwrap());

/// Path filter over the shared precompiled patterns.
#[derive(Debug, Clone, Copy)]
pub struct SourceFilter {
    include: &'static Regex,
    exclude: [&'static Regex; 2],
}

impl SourceFilter {
    pub fn new() -> Self {
        Self {
            include: &*SOURCE_RE,
            exclude: [&*TEST_RE, &*SPEC_RE],
        }
    }

    /// Returns true if `path` should be measured.
    #[must_use]
    pub fn matches(&self, path: &str) -> bool {
        self.include.is_match(path) && !self.exclude.iter().any(|re| re.is_match(path))
    }
}

impl Default for SourceFilter {
    fn default() -> Self {
        Self::new()
    }
}
