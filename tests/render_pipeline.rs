use image::{Rgba, RgbaImage};
use proptest::prelude::*;
use valetudo_render::config::Palette;
use valetudo_render::map::Bounds;
use valetudo_render::render::{upscale, ImagePoint, ImageSize};
use valetudo_render::{render, RenderError, RenderSettings, Renderer, Rotation};

mod common;
mod proptest_helpers;
use common::{APARTMENT, FLOOR_3X3};
use proptest_helpers::{map_png, zlib};

fn settings(scale: u32, rotation: Rotation) -> RenderSettings {
    RenderSettings {
        scale,
        rotation,
        ..RenderSettings::default()
    }
}

fn without_entities(json: &str) -> String {
    let mut value: serde_json::Value = serde_json::from_str(json).expect("fixture json");
    value["entities"] = serde_json::Value::Array(Vec::new());
    value.to_string()
}

#[test]
fn floor_block_is_solid_for_every_payload_shape() {
    let renderer = Renderer::new(settings(1, Rotation::None)).expect("renderer");
    let floor = Palette::default().floor;
    for payload in [
        FLOOR_3X3.as_bytes().to_vec(),
        zlib(FLOOR_3X3.as_bytes()),
        map_png(FLOOR_3X3.as_bytes()),
    ] {
        let drawn = renderer.draw(&payload).expect("draw");
        assert_eq!(drawn.image.dimensions(), (3, 3));
        assert!(drawn.image.pixels().all(|p| *p == floor));
    }
}

#[test]
fn apartment_output_size_and_calibration() {
    let result = render(APARTMENT.as_bytes(), settings(4, Rotation::None)).expect("render");

    // Walls span x 9..=30 and y 9..=14.
    assert_eq!(result.robot_bounds, Bounds::from_xyxy(9, 9, 30, 14));
    assert_eq!(result.image_size, ImageSize { width: 88, height: 24 });
    assert_eq!(result.image.dimensions(), (88, 24));

    let [a, b, c] = result.calibration;
    assert_eq!((a.vacuum.x, a.vacuum.y), (45, 45));
    assert_eq!(a.map, ImagePoint { x: 0.0, y: 0.0 });
    assert_eq!((b.vacuum.x, b.vacuum.y), (150, 45));
    assert_eq!(b.map, ImagePoint { x: 84.0, y: 0.0 });
    assert_eq!((c.vacuum.x, c.vacuum.y), (150, 70));
    assert_eq!(c.map, ImagePoint { x: 84.0, y: 20.0 });

    let decoded = image::load_from_memory(&result.encoded_image)
        .expect("valid png")
        .to_rgba8();
    assert_eq!(decoded, result.image);
}

#[test]
fn quarter_turn_swaps_size_and_moves_calibration() {
    let result = render(APARTMENT.as_bytes(), settings(4, Rotation::Quarter)).expect("render");
    assert_eq!(result.image_size, ImageSize { width: 24, height: 88 });

    // (x, y) -> (W - y, x) on the 6 x 22 unscaled canvas, then times 4.
    let [a, b, c] = result.calibration;
    assert_eq!(a.map, ImagePoint { x: 24.0, y: 0.0 });
    assert_eq!(b.map, ImagePoint { x: 24.0, y: 84.0 });
    assert_eq!(c.map, ImagePoint { x: 4.0, y: 84.0 });
}

#[test]
fn rooms_get_distinct_palette_colors() {
    let drawn = Renderer::new(settings(1, Rotation::None))
        .expect("renderer")
        .draw(without_entities(APARTMENT).as_bytes())
        .expect("draw");
    let palette = Palette::default().segments;
    // Kitchen cell (12, 11) and hall cell (25, 11), relative to (9, 9).
    let kitchen = *drawn.image.get_pixel(3, 2);
    let hall = *drawn.image.get_pixel(16, 2);
    assert_ne!(kitchen, hall);
    assert!(palette.contains(&kitchen));
    assert!(palette.contains(&hall));
    assert_eq!(*drawn.image.get_pixel(0, 0), Palette::default().wall);
}

#[test]
fn entities_are_drawn_over_layers() {
    let renderer = Renderer::new(settings(4, Rotation::None)).expect("renderer");
    let with = renderer.draw(APARTMENT.as_bytes()).expect("draw");
    let without = renderer
        .draw(without_entities(APARTMENT).as_bytes())
        .expect("draw");
    assert_eq!(with.image.dimensions(), without.image.dimensions());

    let changed = with
        .image
        .pixels()
        .zip(without.image.pixels())
        .filter(|(a, b)| a != b)
        .count();
    assert!(changed > 0);
    // Entities never change the calibration.
    assert_eq!(with.calibration, without.calibration);
}

#[test]
fn no_go_corner_order_does_not_matter() {
    let ordered = APARTMENT.to_string();
    let shuffled = ordered.replace(
        "[130, 50, 145, 50, 145, 60, 130, 60]",
        "[145, 60, 130, 50, 130, 60, 145, 50]",
    );
    assert_ne!(ordered, shuffled);

    let renderer = Renderer::new(settings(4, Rotation::None)).expect("renderer");
    let a = renderer.draw(ordered.as_bytes()).expect("draw");
    let b = renderer.draw(shuffled.as_bytes()).expect("draw");
    assert_eq!(a.image, b.image);
}

#[test]
fn empty_map_is_an_error() {
    let result = render(
        br#"{"pixelSize":5,"layers":[],"entities":[]}"#,
        RenderSettings::default(),
    );
    assert!(matches!(result, Err(RenderError::EmptyMap)));
}

#[test]
fn garbage_payload_is_a_parse_error() {
    let result = render(b"not a map", RenderSettings::default());
    assert!(matches!(result, Err(RenderError::Parse(_))));
}

#[test]
fn corrupt_zlib_payload_is_a_decode_error() {
    let result = render(&[0x78, 0x9c, 0xff, 0xff, 0xff], RenderSettings::default());
    assert!(matches!(result, Err(RenderError::Decode(_))));
}

#[test]
fn extreme_coordinates_are_rejected_without_panicking() {
    let renderer = Renderer::new(settings(1, Rotation::None)).expect("renderer");
    let documents = [
        // Span end runs past i64::MAX.
        r#"{"pixelSize":5,"entities":[],"layers":[
            {"type":"floor","compressedPixels":[9223372036854775807,0,2]}]}"#,
        // Adjacency margins run past i64::MIN.
        r#"{"pixelSize":5,"entities":[],"layers":[
            {"type":"segment","metaData":{"segmentId":"1"},"compressedPixels":[-9223372036854775807,0,1]},
            {"type":"segment","metaData":{"segmentId":"2"},"compressedPixels":[-9223372036854775807,1,1]}]}"#,
        // Calibration corners overflow when scaled to vacuum units.
        r#"{"pixelSize":5,"entities":[],"layers":[
            {"type":"floor","compressedPixels":[4000000000000000000,4000000000000000000,1]}]}"#,
    ];
    for json in documents {
        assert!(matches!(
            renderer.render(json.as_bytes()),
            Err(RenderError::InvalidBounds { .. })
        ));
    }
}

fn arb_image() -> impl Strategy<Value = RgbaImage> {
    (1u32..12, 1u32..12).prop_flat_map(|(w, h)| {
        prop::collection::vec(any::<[u8; 4]>(), (w * h) as usize).prop_map(move |pixels| {
            RgbaImage::from_fn(w, h, |x, y| Rgba(pixels[(y * w + x) as usize]))
        })
    })
}

proptest! {
    #![proptest_config(proptest_helpers::proptest_config())]

    #[test]
    fn upscale_replicates_blocks(src in arb_image(), factor in 1u32..7) {
        let out = upscale(&src, factor).expect("upscale");
        prop_assert_eq!(out.dimensions(), (src.width() * factor, src.height() * factor));
        for (x, y, pixel) in out.enumerate_pixels() {
            prop_assert_eq!(pixel, src.get_pixel(x / factor, y / factor));
        }
    }
}
