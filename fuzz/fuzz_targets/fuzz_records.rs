#![no_main]

use libfuzzer_sys::fuzz_target;
use obs2nc::records::parse_records;

fuzz_target!(|data: &[u8]| {
    if let Ok(text) = std::str::from_utf8(data) {
        let _ = parse_records(text);
    }
});
