//! Core types for background removal operations

use crate::{
    config::OutputFormat,
    error::Result,
    image_processing::BackgroundColor,
    services::{ImageIOService, OutputFormatHandler},
};
use image::{DynamicImage, GenericImageView};
use log::info;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Result of a background removal operation
#[derive(Debug, Clone)]
pub struct RemovalResult {
    /// The processed image with background removed (RGBA8)
    pub image: DynamicImage,

    /// Background color the classification was made against
    pub background: Option<BackgroundColor>,

    /// Per-class pixel counts
    pub statistics: AlphaStatistics,

    /// Original image dimensions
    pub original_dimensions: (u32, u32),

    /// Processing metadata
    pub metadata: ProcessingMetadata,

    /// Original input path (for logging purposes)
    pub input_path: Option<String>,
}

impl RemovalResult {
    /// Create a new removal result
    #[must_use]
    pub fn new(
        image: DynamicImage,
        background: Option<BackgroundColor>,
        statistics: AlphaStatistics,
        metadata: ProcessingMetadata,
    ) -> Self {
        let original_dimensions = image.dimensions();
        Self {
            image,
            background,
            statistics,
            original_dimensions,
            metadata,
            input_path: None,
        }
    }

    /// Attach the input path this result was produced from
    #[must_use]
    pub fn with_input_path<S: Into<String>>(mut self, input_path: S) -> Self {
        self.input_path = Some(input_path.into());
        self
    }

    /// Save the result as PNG with alpha channel
    pub fn save_png<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        self.save(path, OutputFormat::Png, 100)
    }

    /// Save in the specified format and record the encoding time
    pub fn save<P: AsRef<Path>>(&self, path: P, format: OutputFormat, quality: u8) -> Result<()> {
        ImageIOService::save_image(&self.image, path, format, quality)
    }

    /// Save and update `metadata.timings.image_encode_ms`
    pub fn save_timed<P: AsRef<Path>>(
        &mut self,
        path: P,
        format: OutputFormat,
        quality: u8,
    ) -> Result<()> {
        let path_str = path.as_ref().display().to_string();
        let encode_start = instant::Instant::now();
        self.save(path, format, quality)?;
        let encode_ms = encode_start.elapsed().as_millis() as u64;

        self.metadata.timings.image_encode_ms = Some(encode_ms);
        self.metadata.timings.total_ms += encode_ms;
        self.metadata.output_format = format.to_string();

        let input_path = self.input_path.as_deref().unwrap_or("input");
        info!(
            "Processed: {} -> {} in {:.2}s",
            input_path,
            path_str,
            self.metadata.timings.total_ms as f64 / 1000.0
        );

        Ok(())
    }

    /// Get the image as raw RGBA bytes
    #[must_use]
    pub fn to_rgba_bytes(&self) -> Vec<u8> {
        self.image.to_rgba8().into_raw()
    }

    /// Get the image as encoded bytes in the specified format
    pub fn to_bytes(&self, format: OutputFormat, quality: u8) -> Result<Vec<u8>> {
        OutputFormatHandler::encode(&self.image, format, quality)
    }

    /// Get image dimensions
    #[must_use]
    pub fn dimensions(&self) -> (u32, u32) {
        self.image.dimensions()
    }

    /// Get detailed timing breakdown
    #[must_use]
    pub fn timings(&self) -> &ProcessingTimings {
        &self.metadata.timings
    }

    /// Get timing summary for display
    #[must_use]
    pub fn timing_summary(&self) -> String {
        let t = &self.metadata.timings;
        let breakdown = t.breakdown_percentages();

        let mut summary = format!(
            "Total: {}ms | Decode: {}ms ({:.1}%) | Estimate: {}ms ({:.1}%) | Feather: {}ms ({:.1}%)",
            t.total_ms,
            t.image_decode_ms,
            breakdown.decode_pct,
            t.estimation_ms,
            breakdown.estimation_pct,
            t.feathering_ms,
            breakdown.feathering_pct
        );

        if let Some(encode_ms) = t.image_encode_ms {
            summary.push_str(&format!(
                " | Encode: {}ms ({:.1}%)",
                encode_ms, breakdown.encode_pct
            ));
        }

        summary
    }
}

/// Pixel counts per classification band
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AlphaStatistics {
    pub total_pixels: u64,
    /// Pixels at or below the threshold (alpha 0)
    pub transparent_pixels: u64,
    /// Pixels inside the feather band
    pub feathered_pixels: u64,
    /// Pixels beyond the feather band, alpha left as-is
    pub untouched_pixels: u64,
}

impl AlphaStatistics {
    #[must_use]
    pub fn empty(total_pixels: u64) -> Self {
        Self {
            total_pixels,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn transparent_ratio(&self) -> f64 {
        if self.total_pixels == 0 {
            0.0
        } else {
            self.transparent_pixels as f64 / self.total_pixels as f64
        }
    }
}

/// Detailed timing breakdown for background removal processing
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProcessingTimings {
    /// Image loading and decoding
    pub image_decode_ms: u64,

    /// Corner sampling
    pub estimation_ms: u64,

    /// Per-pixel classification and alpha writes
    pub feathering_ms: u64,

    /// Final image encoding (if saved)
    pub image_encode_ms: Option<u64>,

    /// Total end-to-end processing time
    pub total_ms: u64,
}

impl ProcessingTimings {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Get breakdown percentages
    #[must_use]
    pub fn breakdown_percentages(&self) -> TimingBreakdown {
        if self.total_ms == 0 {
            return TimingBreakdown::default();
        }

        let total = self.total_ms as f64;
        TimingBreakdown {
            decode_pct: (self.image_decode_ms as f64 / total) * 100.0,
            estimation_pct: (self.estimation_ms as f64 / total) * 100.0,
            feathering_pct: (self.feathering_ms as f64 / total) * 100.0,
            encode_pct: (self.image_encode_ms.unwrap_or(0) as f64 / total) * 100.0,
        }
    }
}

/// Percentage breakdown of timing phases
#[derive(Debug, Clone, Default)]
pub struct TimingBreakdown {
    pub decode_pct: f64,
    pub estimation_pct: f64,
    pub feathering_pct: f64,
    pub encode_pct: f64,
}

/// Metadata about the processing operation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProcessingMetadata {
    /// Detailed timing breakdown
    pub timings: ProcessingTimings,

    /// Input image format
    pub input_format: String,

    /// Output image format
    pub output_format: String,

    pub sample_size: u32,
    pub threshold: f64,
    pub feather: f64,
}

impl ProcessingMetadata {
    /// Create new processing metadata for the given parameters
    #[must_use]
    pub fn new(sample_size: u32, threshold: f64, feather: f64) -> Self {
        Self {
            timings: ProcessingTimings::new(),
            input_format: "unknown".to_string(),
            output_format: "png".to_string(),
            sample_size,
            threshold,
            feather,
        }
    }
}
