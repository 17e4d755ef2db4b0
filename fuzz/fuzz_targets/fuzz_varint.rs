//! Fuzz testing for the varint decoder.
//!
//! Decoding must never panic on arbitrary bytes, and every decoded value
//! must survive an encode/decode round trip. The decoder accepts
//! non-canonical encodings (leading zero groups), so the re-encoding may be
//! shorter than the input, never longer.

#![no_main]

use libfuzzer_sys::fuzz_target;

use packdb::encoding::{decode_varint, encode_varint};

fuzz_target!(|data: &[u8]| {
    if let Ok((value, consumed)) = decode_varint(data) {
        let mut reencoded = Vec::new();
        let written = encode_varint(value, &mut reencoded);
        assert!(written <= consumed);
        assert_eq!(decode_varint(&reencoded).unwrap(), (value, written));
    }
});
