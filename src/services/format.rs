//! Output format handling service
//!
//! Encoding and format metadata live here so the processor and the upload
//! path share one implementation.

use crate::{
    config::OutputFormat,
    error::{Result, StoreError},
};
use image::{codecs::jpeg::JpegEncoder, DynamicImage, ImageFormat};
use std::io::Cursor;

/// Service for handling output format conversions
pub struct OutputFormatHandler;

impl OutputFormatHandler {
    /// Encode an image into the given output format
    ///
    /// `quality` applies to JPEG only; the image crate's WebP encoder is
    /// lossless. JPEG output drops the alpha channel.
    ///
    /// # Examples
    /// ```rust
    /// use designs4u::{config::OutputFormat, services::OutputFormatHandler};
    /// use image::DynamicImage;
    ///
    /// let image = DynamicImage::new_rgba8(8, 8);
    /// let png = OutputFormatHandler::encode(&image, OutputFormat::Png, 100)?;
    /// assert!(png.starts_with(&[0x89, b'P', b'N', b'G']));
    /// # Ok::<(), Box<dyn std::error::Error>>(())
    /// ```
    pub fn encode(image: &DynamicImage, format: OutputFormat, quality: u8) -> Result<Vec<u8>> {
        let mut cursor = Cursor::new(Vec::new());
        match format {
            OutputFormat::Png => {
                image.write_to(&mut cursor, ImageFormat::Png)?;
            },
            OutputFormat::Jpeg => {
                let rgb_image = image.to_rgb8();
                let mut encoder = JpegEncoder::new_with_quality(&mut cursor, quality.min(100));
                encoder.encode_image(&rgb_image)?;
            },
            OutputFormat::WebP => {
                let rgba = DynamicImage::ImageRgba8(image.to_rgba8());
                rgba.write_to(&mut cursor, ImageFormat::WebP).map_err(|e| {
                    StoreError::processing_stage_error(
                        "format conversion",
                        &format!("WebP encoding failed: {}", e),
                        Some("enable the `webp-support` feature for WebP output"),
                    )
                })?;
            },
            OutputFormat::Tiff => {
                let rgba = DynamicImage::ImageRgba8(image.to_rgba8());
                rgba.write_to(&mut cursor, ImageFormat::Tiff)?;
            },
            OutputFormat::Rgba8 => return Ok(image.to_rgba8().into_raw()),
        }
        Ok(cursor.into_inner())
    }

    /// Get the appropriate file extension for a given output format
    ///
    /// # Examples
    /// ```rust
    /// use designs4u::{config::OutputFormat, services::OutputFormatHandler};
    ///
    /// assert_eq!(OutputFormatHandler::get_extension(OutputFormat::Png), "png");
    /// assert_eq!(OutputFormatHandler::get_extension(OutputFormat::Jpeg), "jpg");
    /// ```
    #[must_use]
    pub fn get_extension(format: OutputFormat) -> &'static str {
        match format {
            OutputFormat::Png => "png",
            OutputFormat::Jpeg => "jpg",
            OutputFormat::WebP => "webp",
            OutputFormat::Tiff => "tiff",
            OutputFormat::Rgba8 => "raw",
        }
    }

    /// MIME type handed to object storage
    #[must_use]
    pub fn content_type(format: OutputFormat) -> &'static str {
        match format {
            OutputFormat::Png => "image/png",
            OutputFormat::Jpeg => "image/jpeg",
            OutputFormat::WebP => "image/webp",
            OutputFormat::Tiff => "image/tiff",
            OutputFormat::Rgba8 => "application/octet-stream",
        }
    }

    /// Resolve an output format from a file extension (case-insensitive)
    #[must_use]
    pub fn from_extension(extension: &str) -> Option<OutputFormat> {
        match extension.to_ascii_lowercase().as_str() {
            "png" => Some(OutputFormat::Png),
            "jpg" | "jpeg" => Some(OutputFormat::Jpeg),
            "webp" => Some(OutputFormat::WebP),
            "tif" | "tiff" => Some(OutputFormat::Tiff),
            "raw" | "rgba" => Some(OutputFormat::Rgba8),
            _ => None,
        }
    }

    /// Check if a format supports transparency (alpha channel)
    #[must_use]
    pub fn supports_transparency(format: OutputFormat) -> bool {
        match format {
            OutputFormat::Png | OutputFormat::WebP | OutputFormat::Tiff | OutputFormat::Rgba8 => {
                true
            },
            OutputFormat::Jpeg => false,
        }
    }

    /// Warn when a format would flatten the cutout onto a solid background
    pub fn validate_for_background_removal(format: OutputFormat) {
        if !Self::supports_transparency(format) {
            log::warn!(
                "Output format {:?} does not support transparency. Background removal results will appear with a solid background.",
                format
            );
        }
    }
}
