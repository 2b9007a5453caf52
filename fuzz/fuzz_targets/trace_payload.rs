#![no_main]

use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    // Any byte string must yield a result or an error, never a panic
    let _ = tracelens::Analyzer::default().analyze_slice(data);
});
