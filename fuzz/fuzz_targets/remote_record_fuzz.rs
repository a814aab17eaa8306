//! Fuzz test for decoding records read from the shared cache
//!
//! Anything stored in Redis may be corrupt or written by another version.
//! Decoding must reject it cleanly, never panic.
//!
//! Run with: cargo +nightly fuzz run remote_record_fuzz -- -max_total_time=60

#![no_main]

use chainread_core::EventId;
use chainread_storage::cache::codec;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if let Ok(input) = std::str::from_utf8(data) {
        let id = EventId::from_bytes([0x5a; chainread_core::EVENT_ID_LEN]);
        if let Ok(event) = codec::decode(id, input) {
            // Decoded events keep the requested id and re-encode losslessly
            assert_eq!(event.id, id);
            let reencoded = codec::encode(&event).expect("decoded events encode");
            assert_eq!(codec::decode(id, &reencoded).ok(), Some(event));
        }
    }
});
