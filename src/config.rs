//! Configuration types for background removal and upload operations

use crate::error::{Result, StoreError};
use image::ImageFormat;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Side length of each corner patch sampled for the background estimate
pub const DEFAULT_SAMPLE_SIZE: u32 = 10;

/// Color distance at or below which a pixel becomes fully transparent
pub const DEFAULT_THRESHOLD: f64 = 60.0;

/// Width of the distance band over which alpha ramps from 0 to 255
pub const DEFAULT_FEATHER: f64 = 20.0;

/// Largest upload accepted without downscaling (2 MiB)
pub const DEFAULT_MAX_UPLOAD_BYTES: u64 = 2 * 1024 * 1024;

/// Output image format options
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OutputFormat {
    /// PNG with alpha channel transparency
    Png,
    /// JPEG (no transparency, alpha is dropped)
    Jpeg,
    /// WebP with alpha channel transparency
    WebP,
    /// TIFF with alpha channel transparency and lossless compression
    Tiff,
    /// Raw RGBA8 pixel data (4 bytes per pixel)
    Rgba8,
}

impl Default for OutputFormat {
    fn default() -> Self {
        Self::Png
    }
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Png => write!(f, "png"),
            Self::Jpeg => write!(f, "jpeg"),
            Self::WebP => write!(f, "webp"),
            Self::Tiff => write!(f, "tiff"),
            Self::Rgba8 => write!(f, "rgba8"),
        }
    }
}

/// Configuration for background removal operations
///
/// The defaults reproduce the storefront's admin dashboard output exactly:
/// 10px corner patches, a hard threshold of 60 and a feather band of 20.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RemovalConfig {
    /// Corner patch side length in pixels
    pub sample_size: u32,

    /// Hard transparency threshold (Euclidean RGB distance)
    pub threshold: f64,

    /// Feather band width above the threshold
    pub feather: f64,

    /// Output format
    pub output_format: OutputFormat,

    /// JPEG quality (0-100, only used for JPEG output)
    pub jpeg_quality: u8,

    /// WebP quality (0-100, only used for WebP output)
    pub webp_quality: u8,

    /// Enable debug mode (additional logging)
    pub debug: bool,

    /// Optional format hint for byte and reader based processing
    #[serde(skip)]
    pub format_hint: Option<ImageFormat>,
}

impl Default for RemovalConfig {
    fn default() -> Self {
        Self {
            sample_size: DEFAULT_SAMPLE_SIZE,
            threshold: DEFAULT_THRESHOLD,
            feather: DEFAULT_FEATHER,
            output_format: OutputFormat::default(),
            jpeg_quality: 90,
            webp_quality: 85,
            debug: false,
            format_hint: None,
        }
    }
}

impl RemovalConfig {
    /// Create a new configuration builder for fluent API construction
    ///
    /// # Examples
    ///
    /// ```rust
    /// use designs4u::{OutputFormat, RemovalConfig};
    ///
    /// let config = RemovalConfig::builder()
    ///     .threshold(45.0)
    ///     .output_format(OutputFormat::WebP)
    ///     .build()
    ///     .unwrap();
    /// assert_eq!(config.feather, 20.0);
    /// ```
    #[must_use]
    pub fn builder() -> RemovalConfigBuilder {
        RemovalConfigBuilder::default()
    }

    /// Load a configuration from a JSON file and validate it
    ///
    /// Missing fields fall back to their defaults.
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path_ref = path.as_ref();
        let raw = std::fs::read_to_string(path_ref)
            .map_err(|e| StoreError::file_io_error("read config file", path_ref, &e))?;
        let partial: PartialRemovalConfig = serde_json::from_str(&raw).map_err(|e| {
            StoreError::invalid_config(format!(
                "Failed to parse config '{}': {}",
                path_ref.display(),
                e
            ))
        })?;
        let config = partial.into_config();
        config.validate()?;
        Ok(config)
    }

    /// Validate all configuration parameters
    ///
    /// # Validation Rules
    ///
    /// - JPEG and WebP quality: 0-100 (inclusive)
    /// - Sample size: at least 1 pixel
    /// - Threshold and feather: finite and non-negative
    ///
    /// # Examples
    ///
    /// ```rust
    /// use designs4u::RemovalConfig;
    ///
    /// let mut config = RemovalConfig::default();
    /// assert!(config.validate().is_ok());
    ///
    /// config.feather = f64::NAN;
    /// assert!(config.validate().is_err());
    /// ```
    pub fn validate(&self) -> Result<()> {
        if self.jpeg_quality > 100 {
            return Err(StoreError::config_value_error(
                "JPEG quality",
                self.jpeg_quality,
                "0-100",
                Some(90),
            ));
        }

        if self.webp_quality > 100 {
            return Err(StoreError::config_value_error(
                "WebP quality",
                self.webp_quality,
                "0-100",
                Some(85),
            ));
        }

        if self.sample_size == 0 {
            return Err(StoreError::config_value_error(
                "sample size",
                self.sample_size,
                ">= 1",
                Some(DEFAULT_SAMPLE_SIZE),
            ));
        }

        if !self.threshold.is_finite() || self.threshold < 0.0 {
            return Err(StoreError::config_value_error(
                "threshold",
                self.threshold,
                "finite, >= 0",
                Some(DEFAULT_THRESHOLD),
            ));
        }

        if !self.feather.is_finite() || self.feather < 0.0 {
            return Err(StoreError::config_value_error(
                "feather",
                self.feather,
                "finite, >= 0",
                Some(DEFAULT_FEATHER),
            ));
        }

        Ok(())
    }

    /// Quality value that applies to the configured output format
    #[must_use]
    pub fn output_quality(&self) -> u8 {
        match self.output_format {
            OutputFormat::Jpeg => self.jpeg_quality,
            OutputFormat::WebP => self.webp_quality,
            OutputFormat::Png | OutputFormat::Tiff | OutputFormat::Rgba8 => 100,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
struct PartialRemovalConfig {
    sample_size: Option<u32>,
    threshold: Option<f64>,
    feather: Option<f64>,
    output_format: Option<OutputFormat>,
    jpeg_quality: Option<u8>,
    webp_quality: Option<u8>,
    debug: Option<bool>,
}

impl PartialRemovalConfig {
    fn into_config(self) -> RemovalConfig {
        let defaults = RemovalConfig::default();
        RemovalConfig {
            sample_size: self.sample_size.unwrap_or(defaults.sample_size),
            threshold: self.threshold.unwrap_or(defaults.threshold),
            feather: self.feather.unwrap_or(defaults.feather),
            output_format: self.output_format.unwrap_or(defaults.output_format),
            jpeg_quality: self.jpeg_quality.unwrap_or(defaults.jpeg_quality),
            webp_quality: self.webp_quality.unwrap_or(defaults.webp_quality),
            debug: self.debug.unwrap_or(defaults.debug),
            format_hint: None,
        }
    }
}

/// Builder for `RemovalConfig`
#[derive(Debug, Default)]
pub struct RemovalConfigBuilder {
    config: RemovalConfig,
}

impl RemovalConfigBuilder {
    /// Set corner patch side length
    #[must_use]
    pub fn sample_size(mut self, sample_size: u32) -> Self {
        self.config.sample_size = sample_size;
        self
    }

    /// Set hard transparency threshold
    #[must_use]
    pub fn threshold(mut self, threshold: f64) -> Self {
        self.config.threshold = threshold;
        self
    }

    /// Set feather band width
    #[must_use]
    pub fn feather(mut self, feather: f64) -> Self {
        self.config.feather = feather;
        self
    }

    /// Set output format
    #[must_use]
    pub fn output_format(mut self, format: OutputFormat) -> Self {
        self.config.output_format = format;
        self
    }

    /// Set JPEG quality
    #[must_use]
    pub fn jpeg_quality(mut self, quality: u8) -> Self {
        self.config.jpeg_quality = quality.min(100);
        self
    }

    /// Set WebP quality
    #[must_use]
    pub fn webp_quality(mut self, quality: u8) -> Self {
        self.config.webp_quality = quality.min(100);
        self
    }

    /// Enable debug mode
    #[must_use]
    pub fn debug(mut self, debug: bool) -> Self {
        self.config.debug = debug;
        self
    }

    /// Set the format hint for byte and reader based processing
    #[must_use]
    pub fn format_hint(mut self, format: Option<ImageFormat>) -> Self {
        self.config.format_hint = format;
        self
    }

    /// Build and validate the configuration
    ///
    /// Quality values above 100 are clamped by the setters; threshold,
    /// feather and sample size are rejected rather than clamped.
    pub fn build(self) -> Result<RemovalConfig> {
        let config = self.config;
        config.validate()?;
        Ok(config)
    }
}

/// Configuration for preparing images before they reach object storage
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UploadConfig {
    /// Payloads larger than this are downscaled before upload
    pub max_upload_bytes: u64,

    /// Format used when a payload has to be re-encoded
    pub format: OutputFormat,

    /// Encoder quality for lossy formats (0-100)
    pub quality: u8,
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
            format: OutputFormat::WebP,
            quality: 85,
        }
    }
}

impl UploadConfig {
    /// Create an upload config with a limit expressed in megabytes
    #[must_use]
    pub fn with_max_megabytes(megabytes: f64) -> Self {
        let bytes = (megabytes.max(0.0) * 1024.0 * 1024.0) as u64;
        Self {
            max_upload_bytes: bytes,
            ..Self::default()
        }
    }

    /// Validate upload parameters
    pub fn validate(&self) -> Result<()> {
        if self.max_upload_bytes == 0 {
            return Err(StoreError::config_value_error(
                "max upload bytes",
                self.max_upload_bytes,
                ">= 1",
                Some(DEFAULT_MAX_UPLOAD_BYTES),
            ));
        }

        if self.quality > 100 {
            return Err(StoreError::config_value_error(
                "upload quality",
                self.quality,
                "0-100",
                Some(85),
            ));
        }

        if self.format == OutputFormat::Rgba8 {
            return Err(StoreError::unsupported_format(
                "raw RGBA8 cannot be uploaded as an image file",
            ));
        }

        Ok(())
    }
}
