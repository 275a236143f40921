use std::path::PathBuf;
use thiserror::Error;

/// Failures while normalizing a raw payload into map document bytes.
#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("PNG container ended before an IEND chunk was found")]
    TruncatedContainer,

    #[error("PNG container has no ValetudoMap zTXt chunk")]
    MapChunkNotFound,

    #[error("Failed to inflate map payload: {0}")]
    DecompressionFailed(#[source] std::io::Error),
}

/// Failures while interpreting document bytes as a map.
#[derive(Debug, Error)]
pub enum ParseError {
    #[error("Invalid map document: {0}")]
    InvalidDocument(String),
}

impl From<serde_json::Error> for ParseError {
    fn from(err: serde_json::Error) -> Self {
        ParseError::InvalidDocument(err.to_string())
    }
}

/// Failure while encoding the final canvas.
#[derive(Debug, Error)]
#[error("Failed to encode PNG: {0}")]
pub struct EncodeError(#[from] pub image::ImageError);

/// Failures while loading or validating configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// The main error type for rendering operations.
#[derive(Debug, Error)]
pub enum RenderError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Decode(#[from] DecodeError),

    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error(transparent)]
    Encode(#[from] EncodeError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("Map has no layers and no static limits; cannot derive bounds")]
    EmptyMap,

    #[error("Invalid robot bounds ({min_x}, {min_y})..({max_x}, {max_y}): inverted or outside the representable range")]
    InvalidBounds {
        min_x: i64,
        min_y: i64,
        max_x: i64,
        max_y: i64,
    },

    #[error("Canvas of {width}x{height} at scale {scale} is too large")]
    CanvasTooLarge { width: u32, height: u32, scale: u32 },

    #[error("Failed to load sprite {path}: {source}")]
    Sprite {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    #[error("Failed to write metadata JSON to {path}: {source}")]
    MetadataWrite {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}
