#![no_main]

use libfuzzer_sys::fuzz_target;
use skilltime::skill_string::parse_skill_string;

fuzz_target!(|data: &[u8]| {
    if let Ok(input) = std::str::from_utf8(data) {
        // Must not panic regardless of input
        let _ = parse_skill_string(input);
    }
});
