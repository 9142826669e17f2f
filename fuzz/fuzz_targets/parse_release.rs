#![no_main]

use depchron_core::ingest::parse_release_row;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let Ok(text) = std::str::from_utf8(data) else {
        return;
    };
    let (coordinate, timestamp) = text.split_once(',').unwrap_or((text, ""));
    if let Ok(record) = parse_release_row(coordinate, timestamp) {
        assert!(!record.release.version.is_empty());
        assert_eq!(record.artifact.as_str().matches(':').count(), 1);
    }
});
