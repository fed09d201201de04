#![no_main]
use libfuzzer_sys::fuzz_target;

use diffcov::filter::SourceFilter;

fuzz_target!(|data: &[u8]| {
    // Diff parser must not panic on any input.
    if let Ok(s) = std::str::from_utf8(data) {
        let _ = diffcov::diff::added_lines(s, &SourceFilter::new());
    }
});
