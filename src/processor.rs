//! Background removal processor
//!
//! `BackgroundRemovalProcessor` ties the pixel transform to its image
//! sources: files, encoded bytes, remote URLs, async readers and raw RGBA
//! buffers. Both the library entry points and the CLI go through it so
//! failures map onto the same load/access split everywhere.

use crate::{
    config::RemovalConfig,
    error::{Result, StoreError},
    image_processing::{apply_background_alpha, estimate_background, RemovalParams},
    services::{ImageIOService, ProcessingStage, ProgressTracker},
    types::{AlphaStatistics, ProcessingMetadata, ProcessingTimings, RemovalResult},
};
use image::{DynamicImage, ImageFormat, RgbaImage};
use instant::Instant;
use log::{debug, info};
use std::path::{Path, PathBuf};
use tracing::{info as trace_info, instrument, span, Level};

/// Where an image to process comes from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImageSource {
    /// Local file
    Path(PathBuf),
    /// Remote `http(s)` URL
    Url(String),
    /// Encoded image bytes (PNG, JPEG, WebP, ...)
    Bytes(Vec<u8>),
    /// Decoded RGBA8 pixels, row-major
    Raw {
        width: u32,
        height: u32,
        pixels: Vec<u8>,
    },
}

impl ImageSource {
    /// Interpret a command-line style input as a URL or a file path
    ///
    /// ```rust
    /// use designs4u::ImageSource;
    ///
    /// assert!(matches!(ImageSource::parse("https://cdn.example.com/a.png"), ImageSource::Url(_)));
    /// assert!(matches!(ImageSource::parse("shirt.jpg"), ImageSource::Path(_)));
    /// ```
    #[must_use]
    pub fn parse(input: &str) -> Self {
        let lower = input.to_ascii_lowercase();
        if lower.starts_with("http://") || lower.starts_with("https://") {
            Self::Url(input.to_string())
        } else {
            Self::Path(PathBuf::from(input))
        }
    }

    /// Short label used in logs and result metadata
    #[must_use]
    pub fn describe(&self) -> String {
        match self {
            Self::Path(path) => path.display().to_string(),
            Self::Url(url) => url.clone(),
            Self::Bytes(bytes) => format!("<{} bytes>", bytes.len()),
            Self::Raw { width, height, .. } => format!("<raw {}x{}>", width, height),
        }
    }
}

/// Processor applying the corner-sampled background removal
pub struct BackgroundRemovalProcessor {
    config: RemovalConfig,
    progress_tracker: Option<ProgressTracker>,
}

impl BackgroundRemovalProcessor {
    /// Create a processor after validating `config`
    pub fn new(config: RemovalConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            progress_tracker: None,
        })
    }

    /// Create a processor that reports stages to `tracker`
    pub fn with_progress(config: RemovalConfig, tracker: ProgressTracker) -> Result<Self> {
        let mut processor = Self::new(config)?;
        processor.progress_tracker = Some(tracker);
        Ok(processor)
    }

    #[must_use]
    pub fn config(&self) -> &RemovalConfig {
        &self.config
    }

    fn report(&mut self, stage: ProcessingStage) {
        if let Some(ref mut tracker) = self.progress_tracker {
            tracker.report_stage(stage);
        }
    }

    fn report_failure<T>(&self, result: Result<T>) -> Result<T> {
        if let (Err(e), Some(tracker)) = (&result, &self.progress_tracker) {
            tracker.report_error(&e.to_string());
        }
        result
    }

    /// Remove the background from a decoded image
    pub fn process_image(&mut self, image: &DynamicImage) -> Result<RemovalResult> {
        self.process_timed(image, 0, Instant::now())
    }

    #[instrument(
        skip(self, image, total_start),
        fields(dimensions = %format!("{}x{}", image.width(), image.height()))
    )]
    fn process_timed(
        &mut self,
        image: &DynamicImage,
        decode_ms: u64,
        total_start: Instant,
    ) -> Result<RemovalResult> {
        let params = RemovalParams::from(&self.config);
        let rgba = image.to_rgba8();
        let mut timings = ProcessingTimings {
            image_decode_ms: decode_ms,
            ..ProcessingTimings::default()
        };

        self.report(ProcessingStage::BackgroundEstimation);
        let estimation_start = Instant::now();
        let background = {
            let _span = span!(
                Level::DEBUG,
                "background_estimation",
                sample_size = params.sample_size
            )
            .entered();
            estimate_background(&rgba, params.sample_size)
        };
        timings.estimation_ms = estimation_start.elapsed().as_millis() as u64;

        self.report(ProcessingStage::AlphaFeathering);
        let feathering_start = Instant::now();
        let (output, statistics) = match background {
            Some(ref bg) => {
                let _span = span!(
                    Level::DEBUG,
                    "feathering",
                    threshold = params.threshold,
                    feather = params.feather
                )
                .entered();
                apply_background_alpha(&rgba, bg, params.threshold, params.feather)
            },
            None => {
                debug!("Image has no pixels, returning it unchanged");
                (rgba, AlphaStatistics::empty(0))
            },
        };
        timings.feathering_ms = feathering_start.elapsed().as_millis() as u64;

        if self.config.debug {
            if let Some(ref bg) = background {
                info!("Estimated background {}", bg);
            }
            info!(
                "Alpha classes: {} transparent, {} feathered, {} untouched",
                statistics.transparent_pixels,
                statistics.feathered_pixels,
                statistics.untouched_pixels
            );
        }

        self.report(ProcessingStage::Finalizing);
        timings.total_ms = total_start.elapsed().as_millis() as u64;

        let mut metadata = ProcessingMetadata::new(params.sample_size, params.threshold, params.feather);
        metadata.output_format = self.config.output_format.to_string();
        if let Some(format) = self.config.format_hint {
            metadata.input_format = format_name(format);
        }
        metadata.timings = timings.clone();

        trace_info!(
            transparent = statistics.transparent_pixels,
            feathered = statistics.feathered_pixels,
            total_ms = timings.total_ms,
            "Background removal finished"
        );

        if let Some(ref mut tracker) = self.progress_tracker {
            tracker.report_stage(ProcessingStage::Completed);
            tracker.report_completion(timings);
        }

        Ok(RemovalResult::new(
            DynamicImage::ImageRgba8(output),
            background,
            statistics,
            metadata,
        ))
    }

    /// Decode encoded image bytes and remove the background
    ///
    /// Undecodable or empty input is a [`StoreError::Load`].
    pub fn process_bytes(&mut self, image_bytes: &[u8]) -> Result<RemovalResult> {
        let total_start = Instant::now();
        self.report(ProcessingStage::ImageLoading);

        let decoded = ImageIOService::load_from_bytes(image_bytes, self.config.format_hint);
        let image = self.report_failure(decoded)?;
        let decode_ms = total_start.elapsed().as_millis() as u64;

        let mut result = self.process_timed(&image, decode_ms, total_start)?;
        if self.config.format_hint.is_none() {
            if let Ok(format) = image::guess_format(image_bytes) {
                result.metadata.input_format = format_name(format);
            }
        }
        Ok(result)
    }

    /// Load a file and remove the background
    pub fn process_file<P: AsRef<Path>>(&mut self, input_path: P) -> Result<RemovalResult> {
        let input_path_ref = input_path.as_ref();
        let total_start = Instant::now();
        self.report(ProcessingStage::ImageLoading);

        let loaded = ImageIOService::load_image(input_path_ref);
        let image = self.report_failure(loaded)?;
        let decode_ms = total_start.elapsed().as_millis() as u64;

        let mut result = self
            .process_timed(&image, decode_ms, total_start)?
            .with_input_path(input_path_ref.display().to_string());
        if let Some(ext) = input_path_ref.extension().and_then(|e| e.to_str()) {
            result.metadata.input_format = ext.to_ascii_lowercase();
        }
        Ok(result)
    }

    /// Remove the background from a raw RGBA8 buffer
    ///
    /// A buffer whose length does not equal `width * height * 4` cannot be
    /// read as pixels and is a [`StoreError::Access`].
    pub fn process_rgba_buffer(
        &mut self,
        width: u32,
        height: u32,
        pixels: Vec<u8>,
    ) -> Result<RemovalResult> {
        let total_start = Instant::now();
        self.report(ProcessingStage::ImageLoading);

        let len = pixels.len();
        let buffer = RgbaImage::from_raw(width, height, pixels).ok_or_else(|| {
            StoreError::access(format!(
                "Pixel buffer of {} bytes cannot be read as {}x{} RGBA8",
                len, width, height
            ))
        });
        let buffer = self.report_failure(buffer)?;

        let mut result =
            self.process_timed(&DynamicImage::ImageRgba8(buffer), 0, total_start)?;
        result.metadata.input_format = "rgba8".to_string();
        Ok(result)
    }

    /// Read an async stream to the end and process its bytes
    pub async fn process_reader<R: tokio::io::AsyncRead + Unpin>(
        &mut self,
        mut reader: R,
    ) -> Result<RemovalResult> {
        use tokio::io::AsyncReadExt;

        let mut buffer = Vec::new();
        let read = AsyncReadExt::read_to_end(&mut reader, &mut buffer)
            .await
            .map_err(|e| StoreError::load(format!("Failed to read from stream: {}", e)));
        self.report_failure(read)?;

        self.process_bytes(&buffer)
    }

    /// Process any [`ImageSource`]
    ///
    /// Remote sources are downloaded first; a host refusing access
    /// (401/403) surfaces as [`StoreError::Access`].
    pub async fn process_source(&mut self, source: &ImageSource) -> Result<RemovalResult> {
        debug!("Processing source {}", source.describe());
        match source {
            ImageSource::Path(path) => self.process_file(path),
            ImageSource::Url(url) => {
                self.report(ProcessingStage::ImageLoading);
                let fetched = ImageIOService::fetch_remote(url).await;
                let bytes = self.report_failure(fetched)?;
                Ok(self.process_bytes(&bytes)?.with_input_path(url.clone()))
            },
            ImageSource::Bytes(bytes) => self.process_bytes(bytes),
            ImageSource::Raw {
                width,
                height,
                pixels,
            } => self.process_rgba_buffer(*width, *height, pixels.clone()),
        }
    }
}

fn format_name(format: ImageFormat) -> String {
    format
        .extensions_str()
        .first()
        .map_or_else(|| format!("{:?}", format).to_lowercase(), |ext| (*ext).to_string())
}
