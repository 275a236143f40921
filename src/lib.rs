//! valetudo-render: calibrated PNG rendering of Valetudo robot maps.
//!
//! A Valetudo map arrives as plain JSON, zlib-compressed JSON, or a PNG
//! carrying the JSON in a `ValetudoMap` text chunk. This crate recovers the
//! document, composites its floor, wall and room layers, draws paths, walls,
//! no-go areas and the robot on top, and returns an encoded PNG together
//! with three calibration points that map vacuum coordinates to image
//! pixels.
//!
//! # Modules
//!
//! - [`payload`]: Payload normalization (container extraction, inflate)
//! - [`map`]: Map document model and kind index
//! - [`render`]: Rendering pipeline ([`Renderer`], [`RenderResult`])
//! - [`config`]: YAML configuration and validated [`RenderSettings`]
//! - [`error`]: Error types
//!
//! # Example
//!
//! ```
//! use valetudo_render::{RenderSettings, Renderer};
//!
//! let payload = br#"{
//!     "pixelSize": 5,
//!     "layers": [{"type": "floor", "compressedPixels": [0, 0, 3, 0, 1, 3, 0, 2, 3]}],
//!     "entities": []
//! }"#;
//! let renderer = Renderer::new(RenderSettings { scale: 2, ..RenderSettings::default() })?;
//! let result = renderer.render(payload)?;
//! assert_eq!((result.image_size.width, result.image_size.height), (6, 6));
//! # Ok::<(), valetudo_render::RenderError>(())
//! ```

pub mod config;
pub mod error;
pub mod map;
pub mod payload;
pub mod render;

use std::collections::BTreeMap;
use std::fs;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};

pub use config::{AppConfig, LogFormat, RenderSettings};
pub use error::RenderError;
pub use render::{Compression, RenderResult, Renderer, Rotation};

/// Renders one payload with `settings`.
///
/// Builds a fresh [`Renderer`]; keep one around instead when rendering
/// repeatedly so the sprite cache is reused.
pub fn render(payload: &[u8], settings: RenderSettings) -> Result<RenderResult, RenderError> {
    Renderer::new(settings)?.render(payload)
}

/// The valetudo-render CLI application.
#[derive(Parser)]
#[command(name = "valetudo-render")]
#[command(version, author, about)]
#[command(propagate_version = true)]
struct Cli {
    /// Configuration file (YAML). Defaults to $VALETUDO_RENDER_CONFIG, then ./config.yml.
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

/// Available subcommands.
#[derive(Subcommand)]
enum Commands {
    /// Render a map payload to a calibrated PNG.
    Render(RenderArgs),
    /// Decode a payload into plain map JSON.
    Decode(DecodeArgs),
    /// Print a summary of a map payload.
    Inspect(InspectArgs),
}

/// Arguments for the render subcommand.
#[derive(clap::Args)]
struct RenderArgs {
    /// Map payload: JSON, zlib-compressed JSON, or PNG with a ValetudoMap chunk.
    input: PathBuf,

    /// Output PNG path.
    #[arg(short, long, default_value = "map.png")]
    output: PathBuf,

    /// Write calibration metadata JSON to this path.
    #[arg(long)]
    meta: Option<PathBuf>,

    /// Output pixels per map cell (overrides map.scale).
    #[arg(long, value_parser = clap::value_parser!(u32).range(1..=i64::from(config::MAX_SCALE)))]
    scale: Option<u32>,

    /// Clockwise quarter turns (overrides map.rotate).
    #[arg(long, value_enum)]
    rotate: Option<Rotation>,

    /// PNG compression (overrides map.png_compression).
    #[arg(long, value_enum)]
    compression: Option<Compression>,
}

/// Arguments for the decode subcommand.
#[derive(clap::Args)]
struct DecodeArgs {
    /// Map payload to decode.
    input: PathBuf,

    /// Output path (defaults to stdout).
    #[arg(short, long)]
    output: Option<PathBuf>,
}

/// Arguments for the inspect subcommand.
#[derive(clap::Args)]
struct InspectArgs {
    /// Map payload to inspect.
    input: PathBuf,
}

/// Run the valetudo-render CLI.
///
/// This is the main entry point for the CLI, called from `main.rs`.
pub fn run() -> Result<(), RenderError> {
    let cli = Cli::parse();

    let Some(command) = cli.command else {
        // No subcommand: just print a help hint and exit successfully
        println!("valetudo-render {}", env!("CARGO_PKG_VERSION"));
        println!();
        println!("Render Valetudo robot vacuum maps into calibrated PNG floor plans.");
        println!();
        println!("Run 'valetudo-render --help' for usage information.");
        return Ok(());
    };

    let config = AppConfig::discover(cli.config.as_deref())?;
    init_logging(&config.log_level, config.log_type);

    match command {
        Commands::Render(args) => run_render(args, config),
        Commands::Decode(args) => run_decode(args),
        Commands::Inspect(args) => run_inspect(args, config),
    }
}

/// Installs the global tracing subscriber. `RUST_LOG` wins over `level`
/// when set. Output goes to stderr.
pub fn init_logging(level: &str, format: LogFormat) {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(level))
        .unwrap_or_else(|_| EnvFilter::new("info"));
    let subscriber = fmt().with_env_filter(filter).with_writer(io::stderr);
    // A second call keeps the subscriber that is already installed.
    let _ = match format {
        LogFormat::Text => subscriber.try_init(),
        LogFormat::Json => subscriber.json().try_init(),
    };
}

/// Execute the render subcommand.
fn run_render(args: RenderArgs, config: AppConfig) -> Result<(), RenderError> {
    let mut map_config = config.map;
    if let Some(scale) = args.scale {
        map_config.scale = f64::from(scale);
    }
    let mut settings = map_config.settings()?;
    if let Some(rotation) = args.rotate {
        settings.rotation = rotation;
    }
    if let Some(compression) = args.compression {
        settings.compression = compression;
    }

    let payload = fs::read(&args.input)?;
    let result = render(&payload, settings)?;
    fs::write(&args.output, &result.encoded_image)?;

    if let Some(path) = &args.meta {
        write_metadata(path, &result)?;
    }

    info!(
        draw_ms = result.draw_time.as_millis() as u64,
        encode_ms = result.encode_time.as_millis() as u64,
        bytes = result.encoded_image.len(),
        width = result.image_size.width,
        height = result.image_size.height,
        output = %args.output.display(),
        "Image rendered"
    );
    Ok(())
}

fn write_metadata(path: &Path, result: &RenderResult) -> Result<(), RenderError> {
    let file = fs::File::create(path)?;
    let mut writer = BufWriter::new(file);
    serde_json::to_writer_pretty(&mut writer, &result.metadata()).map_err(|source| {
        RenderError::MetadataWrite {
            path: path.to_path_buf(),
            source,
        }
    })?;
    writer.write_all(b"\n")?;
    writer.flush()?;
    Ok(())
}

/// Execute the decode subcommand.
fn run_decode(args: DecodeArgs) -> Result<(), RenderError> {
    let document = payload::decode(&fs::read(&args.input)?)?;
    match &args.output {
        Some(path) => fs::write(path, &document)?,
        None => {
            let mut stdout = io::stdout().lock();
            stdout.write_all(&document)?;
            stdout.flush()?;
        }
    }
    Ok(())
}

/// Execute the inspect subcommand.
fn run_inspect(args: InspectArgs, config: AppConfig) -> Result<(), RenderError> {
    let settings = config.map.settings()?;
    let document = map::parse(&payload::decode(&fs::read(&args.input)?)?)?;
    let index = map::MapIndex::new(&document);

    println!("Pixel size: {}", document.pixel_size);

    let mut layers: BTreeMap<&str, usize> = BTreeMap::new();
    for layer in &document.layers {
        *layers.entry(layer.kind.name()).or_default() += 1;
    }
    println!("Layers: {}", format_counts(&layers));

    let mut entities: BTreeMap<&str, usize> = BTreeMap::new();
    for entity in &document.entities {
        *entities.entry(entity.type_name()).or_default() += 1;
    }
    println!("Entities: {}", format_counts(&entities));

    match render::robot_bounds(&document, settings.static_limits.as_ref()) {
        Ok(bounds) => println!(
            "Robot bounds: ({}, {})..({}, {}), {}x{} cells",
            bounds.min.x,
            bounds.min.y,
            bounds.max.x,
            bounds.max.y,
            bounds.width(),
            bounds.height()
        ),
        Err(err) => println!("Robot bounds: unavailable ({})", err),
    }

    let threshold = settings.adjacency_threshold.unwrap_or(document.pixel_size);
    let colors = render::assign_colors(index.segments(), threshold, &settings.palette.segments);
    if !colors.is_empty() {
        println!("Segments:");
        for layer in index.segments() {
            let Some(id) = layer.segment_id() else {
                continue;
            };
            let name = layer.meta_data.name.as_deref().unwrap_or("-");
            if let Some(image::Rgba([r, g, b, a])) = colors.get(id) {
                println!("  {:<6} {:<20} #{:02x}{:02x}{:02x}{:02x}", id, name, r, g, b, a);
            }
        }
    }
    Ok(())
}

fn format_counts(counts: &BTreeMap<&str, usize>) -> String {
    if counts.is_empty() {
        return "none".to_string();
    }
    counts
        .iter()
        .map(|(kind, n)| format!("{}={}", kind, n))
        .collect::<Vec<_>>()
        .join(", ")
}
