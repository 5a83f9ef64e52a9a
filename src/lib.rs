#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::uninlined_format_args)]
#![allow(clippy::module_name_repetitions)]

//! # Designs4U storefront core
//!
//! The two pieces of real logic behind the Designs4U / POVA Agency
//! storefronts, plus the boundaries they touch:
//!
//! - **Background removal** for product photos: the background color is
//!   sampled from the four image corners and every pixel close to it is
//!   made transparent, with a short linear feather band at the edge.
//! - **Cart aggregation**: lines merged by title and size, lenient price
//!   parsing (Arabic-Indic digits included), a total that is never `NaN`,
//!   and a checkout message handed to a messaging deep link.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use designs4u::{remove_background_from_url, RemovalConfig};
//!
//! # async fn example() -> anyhow::Result<()> {
//! let config = RemovalConfig::default();
//! let result = remove_background_from_url("https://cdn.example.com/shirt.jpg", &config).await?;
//! result.save_png("shirt_bg_removed.png")?;
//! # Ok(())
//! # }
//! ```
//!
//! ### Feature Flags
//!
//! - `cli` (default): the `designs4u` binary, progress bars and subscriber setup
//! - `webp-support` (default): WebP encoding for uploads and output
//! - `tracing-json`, `tracing-files`: extra log sinks for the CLI
//!
//! Library-only usage:
//!
//! ```toml
//! [dependencies]
//! designs4u = { version = "0.1", default-features = false, features = ["webp-support"] }
//! ```

pub mod cart;
#[cfg(feature = "cli")]
pub mod cli;
pub mod config;
pub mod error;
pub mod image_processing;
pub mod processor;
pub mod services;
#[cfg(feature = "cli")]
pub mod tracing_config;
pub mod types;

use tokio::io::AsyncRead;

pub use cart::{Cart, CartItemCandidate, CartLine, CheckoutConfig, CheckoutLink, LineId};
pub use config::{OutputFormat, RemovalConfig, RemovalConfigBuilder, UploadConfig};
pub use error::{Result, StoreError};
pub use image_processing::{BackgroundColor, RemovalParams};
pub use processor::{BackgroundRemovalProcessor, ImageSource};
pub use services::{
    ConsoleProgressReporter, ImageIOService, LocalObjectStore, NoOpProgressReporter,
    ObjectStore, OutputFormatHandler, ProcessingStage, ProgressReporter, ProgressTracker,
    ProgressUpdate,
};
pub use types::{AlphaStatistics, ProcessingMetadata, ProcessingTimings, RemovalResult};

#[cfg(feature = "cli")]
pub use tracing_config::{
    events, init_cli_tracing, spans, TracingConfig, TracingFormat, TracingOutput,
};

/// Remove the background from encoded image bytes
///
/// # Examples
/// ```rust,no_run
/// use designs4u::{remove_background_from_bytes, OutputFormat, RemovalConfig};
///
/// # fn example(upload: Vec<u8>) -> anyhow::Result<()> {
/// let result = remove_background_from_bytes(&upload, &RemovalConfig::default())?;
/// let png = result.to_bytes(OutputFormat::Png, 100)?;
/// # Ok(())
/// # }
/// ```
pub fn remove_background_from_bytes(
    image_bytes: &[u8],
    config: &RemovalConfig,
) -> Result<RemovalResult> {
    BackgroundRemovalProcessor::new(config.clone())?.process_bytes(image_bytes)
}

/// Remove the background from an already decoded image
pub fn remove_background_from_image(
    image: &image::DynamicImage,
    config: &RemovalConfig,
) -> Result<RemovalResult> {
    BackgroundRemovalProcessor::new(config.clone())?.process_image(image)
}

/// Read an async stream to the end and remove the background
///
/// ```rust,no_run
/// use designs4u::{remove_background_from_reader, RemovalConfig};
/// use tokio::fs::File;
///
/// # async fn example() -> anyhow::Result<()> {
/// let file = File::open("product.jpg").await?;
/// let result = remove_background_from_reader(file, &RemovalConfig::default()).await?;
/// result.save_png("product.png")?;
/// # Ok(())
/// # }
/// ```
pub async fn remove_background_from_reader<R: AsyncRead + Unpin>(
    reader: R,
    config: &RemovalConfig,
) -> Result<RemovalResult> {
    BackgroundRemovalProcessor::new(config.clone())?
        .process_reader(reader)
        .await
}

/// Download a remote image and remove its background
///
/// A host that refuses access (401/403) yields [`StoreError::Access`];
/// any other download or decode failure is a [`StoreError::Load`].
pub async fn remove_background_from_url(url: &str, config: &RemovalConfig) -> Result<RemovalResult> {
    BackgroundRemovalProcessor::new(config.clone())?
        .process_source(&ImageSource::Url(url.to_string()))
        .await
}
