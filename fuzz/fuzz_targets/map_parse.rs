//! Fuzz target for map document parsing.

#![no_main]

use libfuzzer_sys::fuzz_target;
use valetudo_render::map::{parse, MapIndex};

fuzz_target!(|data: &[u8]| {
    if data.len() > 10 * 1024 * 1024 {
        return;
    }

    if let Ok(document) = parse(data) {
        let index = MapIndex::new(&document);
        let _ = index.segments().len();
    }
});
