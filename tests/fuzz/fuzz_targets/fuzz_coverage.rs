#![no_main]
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    // Loading and evaluating must not panic on any report.
    if let Ok(s) = std::str::from_utf8(data) {
        if let Ok(report) = diffcov::coverage::load_coverage(s, std::path::Path::new("/")) {
            let mut added = diffcov::diff::AddedLines::new();
            for path in report.paths() {
                added.insert(path.to_string(), (1..=64).collect());
            }
            let _ = diffcov::evaluate::evaluate_coverage(&report, &added);
        }
    }
});
