#![no_main]

use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    // Round-trip any input that happens to decode as a client intent; the
    // re-encoded form must decode back to the same message.
    if let Ok(msg) = serde_json::from_slice::<parlor_client::protocol::ClientMessage>(data) {
        if let Ok(encoded) = serde_json::to_string(&msg) {
            let decoded: parlor_client::protocol::ClientMessage =
                serde_json::from_str(&encoded).expect("re-encoded intent decodes");
            assert_eq!(decoded, msg);
        }
    }
});
