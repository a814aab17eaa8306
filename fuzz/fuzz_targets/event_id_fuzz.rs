//! Fuzz test for textual event id parsing
//!
//! Run with: cargo +nightly fuzz run event_id_fuzz -- -max_total_time=60

#![no_main]

use chainread_core::EventId;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if let Ok(input) = std::str::from_utf8(data) {
        // Parsing returns Ok or Err, never panics
        if let Ok(id) = EventId::parse(input) {
            // Accepted ids print back in canonical lowercase form
            let text = id.to_string();
            assert_eq!(text, input.to_ascii_lowercase());
            assert_eq!(EventId::parse(&text).ok(), Some(id));
        }
    }

    // Raw bytes are accepted exactly when they have the right length
    assert_eq!(
        EventId::from_slice(data).is_ok(),
        data.len() == chainread_core::EVENT_ID_LEN
    );
});
