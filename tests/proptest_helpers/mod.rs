#![allow(dead_code)]

use std::io::Write;

use flate2::write::ZlibEncoder;
use flate2::Compression;
use proptest::prelude::*;
use proptest::strategy::BoxedStrategy;
use proptest::test_runner::{Config as ProptestConfig, FileFailurePersistence};

use valetudo_render::payload::{MAP_CHUNK_KEYWORD, PNG_SIGNATURE};

pub fn proptest_config() -> ProptestConfig {
    let cases = std::env::var("PROPTEST_CASES")
        .ok()
        .and_then(|v| v.parse::<u32>().ok())
        .unwrap_or(64);

    let mut config = ProptestConfig::with_failure_persistence(FileFailurePersistence::WithSource(
        "proptest-regressions",
    ));
    config.cases = cases;
    config.max_shrink_iters = 1024;
    config
}

pub fn zlib(data: &[u8]) -> Vec<u8> {
    let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(data).expect("compress");
    encoder.finish().expect("finish zlib stream")
}

/// A PNG chunk with a zeroed checksum (the decoder does not verify it).
pub fn png_chunk(kind: &[u8; 4], body: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(body.len() + 12);
    out.extend_from_slice(&(body.len() as u32).to_be_bytes());
    out.extend_from_slice(kind);
    out.extend_from_slice(body);
    out.extend_from_slice(&[0, 0, 0, 0]);
    out
}

pub fn ztxt_chunk(keyword: &[u8], text: &[u8]) -> Vec<u8> {
    let mut body = keyword.to_vec();
    body.push(0);
    body.push(0);
    body.extend_from_slice(text);
    png_chunk(b"zTXt", &body)
}

/// Signature, IHDR, the given chunks, and optionally IEND.
pub fn png_container(chunks: &[Vec<u8>], terminated: bool) -> Vec<u8> {
    let mut out = PNG_SIGNATURE.to_vec();
    out.extend(png_chunk(b"IHDR", &[0; 13]));
    for chunk in chunks {
        out.extend_from_slice(chunk);
    }
    if terminated {
        out.extend(png_chunk(b"IEND", &[]));
    }
    out
}

/// A synthetic container carrying `document` zlib-compressed in a
/// `ValetudoMap` chunk.
pub fn map_png(document: &[u8]) -> Vec<u8> {
    png_container(
        &[
            ztxt_chunk(b"Software", b"test"),
            ztxt_chunk(MAP_CHUNK_KEYWORD, &zlib(document)),
        ],
        true,
    )
}

/// Arbitrary document-like bytes. Never starts with the PNG signature or
/// the zlib header, so plain decoding passes them through.
pub fn arb_document_bytes() -> BoxedStrategy<Vec<u8>> {
    prop::collection::vec(any::<u8>(), 0..512)
        .prop_map(|mut bytes| {
            if let Some(first) = bytes.first_mut() {
                if *first == 0x78 || *first == 0x89 {
                    *first = b'{';
                }
            }
            bytes
        })
        .boxed()
}

/// Axis-aligned rooms on an 8-cell lattice: `(id, min_x, min_y, max_x, max_y)`.
/// Rooms in different lattice cells are at least 3 cells apart; rooms drawn
/// into the same lattice cell overlap.
pub fn arb_rooms(max_rooms: usize) -> BoxedStrategy<Vec<(String, i64, i64, i64, i64)>> {
    prop::collection::vec((0i64..20, 0i64..20, 1i64..6, 1i64..6), 1..=max_rooms)
        .prop_map(|cells| {
            cells
                .into_iter()
                .enumerate()
                .map(|(i, (gx, gy, w, h))| {
                    let (x, y) = (gx * 8, gy * 8);
                    ((i + 1).to_string(), x, y, x + w, y + h)
                })
                .collect()
        })
        .boxed()
}

/// Map JSON with one segment layer per room, each carrying dimensions.
pub fn segments_document(rooms: &[(String, i64, i64, i64, i64)], pixel_size: i64) -> String {
    let layers: Vec<String> = rooms
        .iter()
        .map(|(id, x0, y0, x1, y1)| {
            format!(
                r#"{{"type":"segment","metaData":{{"segmentId":"{id}"}},
                    "dimensions":{{"x":{{"min":{x0},"max":{x1}}},"y":{{"min":{y0},"max":{y1}}}}},
                    "compressedPixels":[{x0},{y0},{run}]}}"#,
                run = x1 - x0 + 1
            )
        })
        .collect();
    format!(
        r#"{{"pixelSize":{pixel_size},"entities":[],"layers":[{}]}}"#,
        layers.join(",")
    )
}
