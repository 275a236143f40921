//! Payload decoding.
//!
//! Valetudo publishes its map in one of three shapes:
//! - plain JSON,
//! - zlib-compressed JSON,
//! - a PNG whose `zTXt` chunk with keyword `ValetudoMap` carries the
//!   (zlib-compressed) JSON.
//!
//! [`decode`] normalizes any of them into plain document bytes. Container
//! extraction always runs before decompression: compression wraps the
//! extracted document, never the container.

use std::io::Read;

use flate2::read::ZlibDecoder;
use tracing::debug;

use crate::error::DecodeError;

/// The fixed 8-byte PNG file signature.
pub const PNG_SIGNATURE: [u8; 8] = [0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A];

/// First byte of a zlib stream using a 32K window.
pub const ZLIB_HEADER: u8 = 0x78;

/// Keyword of the text chunk that carries the map.
pub const MAP_CHUNK_KEYWORD: &[u8] = b"ValetudoMap";

/// PNG limits text chunk keywords to 79 bytes.
const MAX_KEYWORD_LEN: usize = 79;

/// Normalizes a raw payload into map document bytes.
///
/// # Errors
/// - [`DecodeError::TruncatedContainer`] if a PNG ends (or a chunk overruns
///   the input) before `IEND`.
/// - [`DecodeError::MapChunkNotFound`] if a complete PNG has no
///   `ValetudoMap` chunk.
/// - [`DecodeError::DecompressionFailed`] if a zlib stream is corrupt.
pub fn decode(raw: &[u8]) -> Result<Vec<u8>, DecodeError> {
    let mut working = raw;

    if is_png(working) {
        working = extract_map_chunk(working)?;
        debug!(bytes = working.len(), "extracted ValetudoMap chunk from PNG");
    }

    if is_compressed(working) {
        let inflated = inflate(working)?;
        debug!(
            compressed = working.len(),
            inflated = inflated.len(),
            "inflated map payload"
        );
        return Ok(inflated);
    }

    Ok(working.to_vec())
}

/// Returns true if `data` starts with the PNG signature.
pub fn is_png(data: &[u8]) -> bool {
    data.starts_with(&PNG_SIGNATURE)
}

/// Returns true if `data` starts with the zlib header byte.
pub fn is_compressed(data: &[u8]) -> bool {
    data.first() == Some(&ZLIB_HEADER)
}

/// Walks the PNG chunk sequence and returns the payload of the
/// `ValetudoMap` zTXt chunk (after the keyword terminator and the
/// compression method byte). Checksums are not verified.
fn extract_map_chunk(data: &[u8]) -> Result<&[u8], DecodeError> {
    let mut rest = &data[PNG_SIGNATURE.len()..];

    loop {
        let (length, tail) = take_u32(rest).ok_or(DecodeError::TruncatedContainer)?;
        let (kind, tail) = take(tail, 4).ok_or(DecodeError::TruncatedContainer)?;

        if kind == b"IEND" {
            return Err(DecodeError::MapChunkNotFound);
        }

        let length = usize::try_from(length).map_err(|_| DecodeError::TruncatedContainer)?;
        let (body, tail) = take(tail, length).ok_or(DecodeError::TruncatedContainer)?;
        let (_crc, tail) = take(tail, 4).ok_or(DecodeError::TruncatedContainer)?;
        rest = tail;

        if kind == b"zTXt" {
            if let Some(text) = map_chunk_text(body) {
                return Ok(text);
            }
        }
    }
}

/// Returns the text after `keyword\0<method>` if the keyword matches.
fn map_chunk_text(body: &[u8]) -> Option<&[u8]> {
    let search = &body[..body.len().min(MAX_KEYWORD_LEN + 1)];
    let nul = search.iter().position(|&b| b == 0)?;
    if &body[..nul] != MAP_CHUNK_KEYWORD {
        return None;
    }
    // Skip the terminator and the compression method byte.
    body.get(nul + 2..)
}

fn take(data: &[u8], n: usize) -> Option<(&[u8], &[u8])> {
    (data.len() >= n).then(|| data.split_at(n))
}

fn take_u32(data: &[u8]) -> Option<(u32, &[u8])> {
    let (head, tail) = take(data, 4)?;
    let bytes: [u8; 4] = head.try_into().ok()?;
    Some((u32::from_be_bytes(bytes), tail))
}

fn inflate(data: &[u8]) -> Result<Vec<u8>, DecodeError> {
    let mut out = Vec::with_capacity(data.len() * 4);
    ZlibDecoder::new(data)
        .read_to_end(&mut out)
        .map_err(DecodeError::DecompressionFailed)?;
    Ok(out)
}
