//! Image I/O operations service
//!
//! This module separates file and network I/O from the pixel transform,
//! and maps every way a source can fail onto the load/access split.

use crate::{
    config::OutputFormat,
    error::{Result, StoreError},
    services::OutputFormatHandler,
};
use image::{DynamicImage, ImageFormat};
use reqwest::StatusCode;
use std::path::Path;

/// Service for handling image input/output operations
pub struct ImageIOService;

impl ImageIOService {
    /// Load an image from a file path
    ///
    /// Extension-based detection is tried first, then content sniffing.
    /// A missing or undecodable file is a [`StoreError::Load`].
    ///
    /// # Examples
    /// ```rust,no_run
    /// use designs4u::services::ImageIOService;
    ///
    /// let image = ImageIOService::load_image("product.jpg")?;
    /// # Ok::<(), Box<dyn std::error::Error>>(())
    /// ```
    pub fn load_image<P: AsRef<Path>>(path: P) -> Result<DynamicImage> {
        let path_ref = path.as_ref();

        if !path_ref.exists() {
            return Err(StoreError::load(format!(
                "Image file '{}' does not exist",
                path_ref.display()
            )));
        }

        match image::open(path_ref) {
            Ok(img) => Ok(img),
            Err(e) => {
                log::debug!(
                    "Extension-based loading failed for {}: {}. Attempting content-based detection.",
                    path_ref.display(),
                    e
                );

                let data = std::fs::read(path_ref)
                    .map_err(|io_err| StoreError::file_io_error("read image data", path_ref, &io_err))?;

                image::load_from_memory(&data).map_err(|content_err| {
                    StoreError::image_load_error(path_ref, &content_err)
                })
            },
        }
    }

    /// Decode an image from memory, optionally forcing a format
    pub fn load_from_bytes(bytes: &[u8], format_hint: Option<ImageFormat>) -> Result<DynamicImage> {
        if bytes.is_empty() {
            return Err(StoreError::load("Image data is empty"));
        }

        let decoded = match format_hint {
            Some(format) => image::load_from_memory_with_format(bytes, format),
            None => image::load_from_memory(bytes),
        };

        decoded.map_err(|e| {
            StoreError::load(format!(
                "Failed to decode image from {} bytes: {}",
                bytes.len(),
                e
            ))
        })
    }

    /// Download the raw bytes of a remote image
    ///
    /// A 401 or 403 means the host refuses pixel-level reads and surfaces
    /// as [`StoreError::Access`]; every other failure is a load error.
    pub async fn fetch_remote(url: &str) -> Result<Vec<u8>> {
        log::debug!("Fetching remote image {}", url);

        let response = reqwest::get(url)
            .await
            .map_err(|e| StoreError::load(format!("Failed to fetch '{}': {}", url, e)))?;

        let status = response.status();
        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            return Err(StoreError::access(format!(
                "Host denied pixel access to '{}' ({})",
                url, status
            )));
        }
        if !status.is_success() {
            return Err(StoreError::load(format!(
                "Fetching '{}' returned {}",
                url, status
            )));
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| StoreError::load(format!("Failed to read body of '{}': {}", url, e)))?;

        Ok(bytes.to_vec())
    }

    /// Save an image to a file with the specified format
    ///
    /// Parent directories are created as needed.
    pub fn save_image<P: AsRef<Path>>(
        image: &DynamicImage,
        path: P,
        format: OutputFormat,
        quality: u8,
    ) -> Result<()> {
        let path_ref = path.as_ref();

        if let Some(parent) = path_ref.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).map_err(|e| {
                    StoreError::file_io_error("create output directory", parent, &e)
                })?;
            }
        }

        let bytes = OutputFormatHandler::encode(image, format, quality)?;
        std::fs::write(path_ref, bytes)
            .map_err(|e| StoreError::file_io_error("write image", path_ref, &e))?;

        log::debug!("Saved {} image to {}", format, path_ref.display());
        Ok(())
    }
}
