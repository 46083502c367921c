#![no_main]

use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    // The runtime bridge accepts arbitrary strings from an untrusted
    // embedded game; anything unparseable or out of range must be dropped
    // without panicking.
    if let Ok(s) = std::str::from_utf8(data) {
        if let Some(message) = parlor_client::bridge::parse_runtime_message(s) {
            let score = message.score();
            assert!(score.is_finite() && score >= 0.0);
        }
    }
});
