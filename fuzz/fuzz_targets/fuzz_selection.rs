#![no_main]

use libfuzzer_sys::fuzz_target;

use efiscen_export::export::parse_selection;

fuzz_target!(|data: &[u8]| {
    if let Ok(content) = std::str::from_utf8(data) {
        let tables = parse_selection(content);
        assert!(tables.len() <= 10);
    }
});
