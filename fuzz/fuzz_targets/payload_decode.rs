//! Fuzz target for payload normalization.
//!
//! Feeds arbitrary bytes to the PNG container walker and zlib inflater,
//! checking for panics, crashes, or hangs.

#![no_main]

use libfuzzer_sys::fuzz_target;
use valetudo_render::payload::decode;

fuzz_target!(|data: &[u8]| {
    if data.len() > 10 * 1024 * 1024 {
        return;
    }

    let _ = decode(data);
});
