//! Configuration loading and validation.
//!
//! The configuration file is YAML. Only the `map` section and the logging
//! keys are read; any other sections (transport, HTTP) are ignored so a
//! full deployment config can be pointed at directly.
//!
//! A loaded [`AppConfig`] is validated into an immutable [`RenderSettings`]
//! through [`MapConfig::settings`]; the renderer only ever sees the
//! validated form.

use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use image::Rgba;
use serde::Deserialize;

use crate::error::ConfigError;
use crate::map::{Bounds, Vacuum};
use crate::render::{Compression, Rotation};

/// File looked up in the working directory when no path is given.
pub const DEFAULT_CONFIG_FILE: &str = "config.yml";

/// Environment variable that overrides the config path.
pub const CONFIG_ENV: &str = "VALETUDO_RENDER_CONFIG";

/// Root of the configuration file.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    #[serde(default = "AppConfig::default_log_level", alias = "logLevel")]
    pub log_level: String,

    #[serde(default, alias = "logType")]
    pub log_type: LogFormat,

    #[serde(default)]
    pub map: MapConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            log_level: Self::default_log_level(),
            log_type: LogFormat::default(),
            map: MapConfig::default(),
        }
    }
}

impl AppConfig {
    fn default_log_level() -> String {
        "info".to_string()
    }

    /// Loads configuration from an explicit path.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_yaml_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Parses configuration from a YAML string.
    pub fn from_yaml_str(content: &str) -> Result<Self, serde_yaml::Error> {
        serde_yaml::from_str(content)
    }

    /// Resolves the configuration: an explicit path wins, then
    /// `VALETUDO_RENDER_CONFIG`, then `./config.yml` if it exists, and
    /// finally the built-in defaults.
    pub fn discover(explicit: Option<&Path>) -> Result<Self, ConfigError> {
        if let Some(path) = explicit {
            return Self::from_file(path);
        }
        if let Some(path) = env::var_os(CONFIG_ENV) {
            return Self::from_file(PathBuf::from(path));
        }
        let default_path = Path::new(DEFAULT_CONFIG_FILE);
        if default_path.exists() {
            Self::from_file(default_path)
        } else {
            Ok(Self::default())
        }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

/// The `map` section.
#[derive(Debug, Clone, Deserialize)]
pub struct MapConfig {
    /// Output pixels per grid cell. Fractions are truncated.
    #[serde(default = "MapConfig::default_scale")]
    pub scale: f64,

    /// 0 fastest, 1 smallest, 2 balanced, 3 none.
    #[serde(default = "MapConfig::default_png_compression")]
    pub png_compression: u8,

    /// Quarter turns clockwise.
    #[serde(default)]
    pub rotate: u8,

    #[serde(default)]
    pub custom_limits: CustomLimits,

    /// Bounding-box margin (grid cells) under which two segments count as
    /// neighbours. Defaults to the document pixel size.
    #[serde(default)]
    pub segment_adjacency_threshold: Option<i64>,

    #[serde(default)]
    pub colors: ColorConfig,

    /// PNG replacing the built-in robot sprite.
    #[serde(default)]
    pub robot_sprite: Option<PathBuf>,

    /// PNG replacing the built-in charger sprite.
    #[serde(default)]
    pub charger_sprite: Option<PathBuf>,
}

impl MapConfig {
    fn default_scale() -> f64 {
        4.0
    }

    fn default_png_compression() -> u8 {
        2
    }

    /// Validates the section into render settings.
    ///
    /// # Errors
    /// Returns [`ConfigError::Invalid`] for a scale below 1, an unknown
    /// compression level or rotation, or a malformed color.
    pub fn settings(&self) -> Result<RenderSettings, ConfigError> {
        if !self.scale.is_finite() || self.scale < 1.0 {
            return Err(ConfigError::Invalid(format!(
                "map.scale must be at least 1, got {}",
                self.scale
            )));
        }
        if self.scale > f64::from(MAX_SCALE) {
            return Err(ConfigError::Invalid(format!(
                "map.scale must be at most {}, got {}",
                MAX_SCALE, self.scale
            )));
        }
        let compression = Compression::from_level(self.png_compression).ok_or_else(|| {
            ConfigError::Invalid(format!(
                "map.png_compression must be 0..=3, got {}",
                self.png_compression
            ))
        })?;
        let rotation = Rotation::from_quarter_turns(self.rotate).ok_or_else(|| {
            ConfigError::Invalid(format!("map.rotate must be 0..=3, got {}", self.rotate))
        })?;
        if let Some(threshold) = self.segment_adjacency_threshold {
            if threshold < 0 {
                return Err(ConfigError::Invalid(format!(
                    "map.segment_adjacency_threshold must not be negative, got {}",
                    threshold
                )));
            }
        }

        Ok(RenderSettings {
            scale: self.scale as u32,
            compression,
            rotation,
            static_limits: self.custom_limits.bounds(),
            palette: self.colors.palette()?,
            adjacency_threshold: self.segment_adjacency_threshold,
            robot_sprite: self.robot_sprite.clone(),
            charger_sprite: self.charger_sprite.clone(),
        })
    }
}

impl Default for MapConfig {
    fn default() -> Self {
        Self {
            scale: Self::default_scale(),
            png_compression: Self::default_png_compression(),
            rotate: 0,
            custom_limits: CustomLimits::default(),
            segment_adjacency_threshold: None,
            colors: ColorConfig::default(),
            robot_sprite: None,
            charger_sprite: None,
        }
    }
}

/// Largest accepted output scale.
pub const MAX_SCALE: u32 = 64;

/// Fixed crop in vacuum units. All zero means disabled.
#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct CustomLimits {
    #[serde(default)]
    pub start_x: i64,
    #[serde(default)]
    pub start_y: i64,
    #[serde(default)]
    pub end_x: i64,
    #[serde(default)]
    pub end_y: i64,
}

impl CustomLimits {
    pub fn is_enabled(&self) -> bool {
        self.start_x != 0 || self.start_y != 0 || self.end_x != 0 || self.end_y != 0
    }

    pub fn bounds(&self) -> Option<Bounds<Vacuum>> {
        self.is_enabled()
            .then(|| Bounds::from_xyxy(self.start_x, self.start_y, self.end_x, self.end_y))
    }
}

/// Colors as `#rrggbb` or `#rrggbbaa` strings.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ColorConfig {
    #[serde(default)]
    pub floor: Option<String>,
    /// Wall layers.
    #[serde(default)]
    pub obstacle: Option<String>,
    #[serde(default)]
    pub path: Option<String>,
    #[serde(default)]
    pub no_go_area: Option<String>,
    #[serde(default)]
    pub virtual_wall: Option<String>,
    #[serde(default)]
    pub segments: Vec<String>,
}

impl ColorConfig {
    /// Resolves the configured colors, filling in defaults.
    ///
    /// A segment palette with fewer than four entries is replaced by the
    /// default palette.
    pub fn palette(&self) -> Result<Palette, ConfigError> {
        let defaults = Palette::default();
        let pick = |value: &Option<String>, fallback: Rgba<u8>| match value {
            Some(hex) => parse_hex_color(hex),
            None => Ok(fallback),
        };

        let segments = if self.segments.len() < MIN_SEGMENT_COLORS {
            defaults.segments.clone()
        } else {
            self.segments
                .iter()
                .map(|hex| parse_hex_color(hex))
                .collect::<Result<Vec<_>, _>>()?
        };

        Ok(Palette {
            floor: pick(&self.floor, defaults.floor)?,
            wall: pick(&self.obstacle, defaults.wall)?,
            path: pick(&self.path, defaults.path)?,
            no_go_area: pick(&self.no_go_area, defaults.no_go_area)?,
            virtual_wall: pick(&self.virtual_wall, defaults.virtual_wall)?,
            segments,
        })
    }
}

/// Minimum length of a configured segment palette.
pub const MIN_SEGMENT_COLORS: usize = 4;

/// Resolved fill colors.
#[derive(Debug, Clone, PartialEq)]
pub struct Palette {
    pub floor: Rgba<u8>,
    pub wall: Rgba<u8>,
    pub path: Rgba<u8>,
    pub no_go_area: Rgba<u8>,
    pub virtual_wall: Rgba<u8>,
    /// At least [`MIN_SEGMENT_COLORS`] entries.
    pub segments: Vec<Rgba<u8>>,
}

impl Default for Palette {
    fn default() -> Self {
        Self {
            floor: Rgba([0x00, 0x76, 0xFF, 0xFF]),
            wall: Rgba([0x5D, 0x5D, 0x5D, 0xFF]),
            path: Rgba([0xFF, 0xFF, 0xFF, 0xFF]),
            no_go_area: Rgba([0xFF, 0x00, 0x00, 0x4A]),
            virtual_wall: Rgba([0xFF, 0x00, 0x00, 0xBF]),
            segments: vec![
                Rgba([0x19, 0xA1, 0xA1, 0xFF]),
                Rgba([0x7A, 0xC0, 0x37, 0xFF]),
                Rgba([0xFF, 0x9B, 0x57, 0xFF]),
                Rgba([0xF7, 0xC8, 0x41, 0xFF]),
            ],
        }
    }
}

/// Validated settings consumed by the renderer.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderSettings {
    /// Output pixels per grid cell, at least 1.
    pub scale: u32,
    pub compression: Compression,
    pub rotation: Rotation,
    /// Fixed crop in vacuum units, replacing the computed bounds.
    pub static_limits: Option<Bounds<Vacuum>>,
    pub palette: Palette,
    pub adjacency_threshold: Option<i64>,
    pub robot_sprite: Option<PathBuf>,
    pub charger_sprite: Option<PathBuf>,
}

impl Default for RenderSettings {
    fn default() -> Self {
        Self {
            scale: 4,
            compression: Compression::default(),
            rotation: Rotation::default(),
            static_limits: None,
            palette: Palette::default(),
            adjacency_threshold: None,
            robot_sprite: None,
            charger_sprite: None,
        }
    }
}

/// Parses `#rrggbb` or `#rrggbbaa` (the leading `#` is optional).
pub fn parse_hex_color(hex: &str) -> Result<Rgba<u8>, ConfigError> {
    let digits = hex.trim().trim_start_matches('#');
    let invalid = || ConfigError::Invalid(format!("invalid color '{}' (expected #rrggbb[aa])", hex));

    if !(digits.len() == 6 || digits.len() == 8) || !digits.is_ascii() {
        return Err(invalid());
    }
    let channel = |i: usize| u8::from_str_radix(&digits[i..i + 2], 16).map_err(|_| invalid());
    let alpha = if digits.len() == 8 { channel(6)? } else { 0xFF };
    Ok(Rgba([channel(0)?, channel(2)?, channel(4)?, alpha]))
}
