//! Fuzz target for the draw path at scale 1.
//!
//! Maps larger than 2048x2048 cells are skipped to stay under the fuzzer's
//! memory limit.

#![no_main]

use libfuzzer_sys::fuzz_target;
use valetudo_render::map::parse;
use valetudo_render::render::robot_bounds;
use valetudo_render::{RenderSettings, Renderer};

const MAX_CELLS: i64 = 2048 * 2048;

fuzz_target!(|data: &[u8]| {
    if data.len() > 1024 * 1024 {
        return;
    }
    let Ok(document) = parse(data) else {
        return;
    };
    let Ok(bounds) = robot_bounds(&document, None) else {
        return;
    };
    if bounds.width().saturating_mul(bounds.height()) > MAX_CELLS {
        return;
    }

    let settings = RenderSettings {
        scale: 1,
        ..RenderSettings::default()
    };
    if let Ok(renderer) = Renderer::new(settings) {
        let _ = renderer.draw_document(&document);
    }
});
