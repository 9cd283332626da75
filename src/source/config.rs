//! Source configuration and parameter validation.
//!
//! All validation happens up front: an unsupported width/height/format
//! combination never reaches the acquisition loop, and nothing here
//! touches hardware.

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::str::FromStr;
use thiserror::Error;

/// Frame sizes the camera driver supports.
pub const SUPPORTED_RESOLUTIONS: [(u32, u32); 2] = [(640, 480), (320, 240)];

/// Pixel format of the frames the camera produces.
///
/// Both formats are raw packed 24-bit; they differ only in channel order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PixelFormat {
    /// Packed RGB, 3 bytes per pixel.
    Rgb,
    /// Packed BGR, 3 bytes per pixel.
    #[default]
    Bgr,
}

impl PixelFormat {
    /// The name the configuration surface and frame records use.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Rgb => "rgb",
            Self::Bgr => "bgr",
        }
    }

    /// Bytes per pixel for this format.
    #[inline]
    pub fn bytes_per_pixel(self) -> usize {
        3
    }
}

impl FromStr for PixelFormat {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, ConfigError> {
        match s {
            "rgb" => Ok(Self::Rgb),
            "bgr" => Ok(Self::Bgr),
            other => Err(ConfigError::UnsupportedFormat(other.to_string())),
        }
    }
}

/// Validated camera configuration, immutable once streaming starts.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SourceConfig {
    /// Frame width in pixels.
    pub width: u32,
    /// Frame height in pixels.
    pub height: u32,
    /// Pixel format of produced frames.
    pub format: PixelFormat,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            width: 640,
            height: 480,
            format: PixelFormat::Bgr,
        }
    }
}

impl SourceConfig {
    /// Builds a configuration from a table of named parameters.
    ///
    /// `width`, `height`, and `format` are each optional; omitted keys take
    /// the defaults (640, 480, `bgr`). Values of the wrong type fail with
    /// [`ConfigError::InvalidParameter`] naming the offending field, and
    /// validated values outside the supported set fail with the matching
    /// rejection error.
    pub fn from_params(params: &toml::value::Table) -> Result<Self, ConfigError> {
        let defaults = Self::default();

        let width = match params.get("width") {
            Some(value) => int_param("width", value)?,
            None => i64::from(defaults.width),
        };
        let height = match params.get("height") {
            Some(value) => int_param("height", value)?,
            None => i64::from(defaults.height),
        };
        if !is_supported_resolution(width, height) {
            return Err(ConfigError::UnsupportedResolution { width, height });
        }

        let format = match params.get("format") {
            Some(value) => value
                .as_str()
                .ok_or(ConfigError::InvalidParameter {
                    field: "format",
                    expected: "a string",
                })?
                .parse()?,
            None => defaults.format,
        };

        Ok(Self {
            // Casts cannot lose information: only the supported presets
            // survive validation.
            width: width as u32,
            height: height as u32,
            format,
        })
    }

    /// Loads and validates a configuration from a TOML file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path.as_ref())
            .map_err(|e| ConfigError::FileRead(e.to_string()))?;
        let config: SourceConfig =
            toml::from_str(&content).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Checks an already-built configuration against the supported presets.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !is_supported_resolution(i64::from(self.width), i64::from(self.height)) {
            return Err(ConfigError::UnsupportedResolution {
                width: i64::from(self.width),
                height: i64::from(self.height),
            });
        }
        Ok(())
    }

    /// Frame size in bytes a well-behaved driver reports for this
    /// configuration.
    pub fn frame_bytes(&self) -> usize {
        (self.width as usize) * (self.height as usize) * self.format.bytes_per_pixel()
    }
}

fn is_supported_resolution(width: i64, height: i64) -> bool {
    SUPPORTED_RESOLUTIONS
        .iter()
        .any(|&(w, h)| width == i64::from(w) && height == i64::from(h))
}

fn int_param(field: &'static str, value: &toml::Value) -> Result<i64, ConfigError> {
    value.as_integer().ok_or(ConfigError::InvalidParameter {
        field,
        expected: "an integer",
    })
}

/// Configuration validation errors.
#[derive(Debug, Clone, Error)]
pub enum ConfigError {
    /// A parameter had the wrong type.
    #[error("{field} parameter must be {expected}")]
    InvalidParameter {
        /// Name of the offending parameter.
        field: &'static str,
        /// Type the parameter must have.
        expected: &'static str,
    },
    /// The width/height pair is not a supported preset.
    #[error("unsupported frame size: {width}x{height}")]
    UnsupportedResolution {
        /// Rejected width, as given.
        width: i64,
        /// Rejected height, as given.
        height: i64,
    },
    /// The format string names no supported pixel format.
    #[error("unsupported format: {0}")]
    UnsupportedFormat(String),
    /// A configuration file could not be read.
    #[error("failed to read config file: {0}")]
    FileRead(String),
    /// A configuration file could not be parsed.
    #[error("failed to parse config file: {0}")]
    Parse(String),
}
