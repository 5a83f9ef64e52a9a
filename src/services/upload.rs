//! Upload and storage boundary
//!
//! Catalog images and cutouts leave the crate through an [`ObjectStore`].
//! Oversized payloads are downscaled once before upload; names follow the
//! storefront bucket layout (`{millis}_{random}.{ext}` for uploads and
//! `{millis}_bg_removed.png` for cutouts).

use crate::{
    config::{OutputFormat, UploadConfig},
    error::{Result, StoreError},
    services::{ImageIOService, OutputFormatHandler},
    types::RemovalResult,
};
use async_trait::async_trait;
use image::{imageops::FilterType, GenericImageView, ImageFormat};
use std::path::PathBuf;

/// Object storage that hands back a public URL for every stored object
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Store `bytes` under `name` and return the public URL
    async fn upload(&self, name: &str, bytes: Vec<u8>, content_type: &str) -> Result<String>;
}

/// Object store backed by a local directory
///
/// Objects land in `{root}/{bucket}/{name}` and are addressed as
/// `{public_base_url}/{bucket}/{name}`.
#[derive(Debug, Clone)]
pub struct LocalObjectStore {
    root: PathBuf,
    bucket: String,
    public_base_url: String,
}

impl LocalObjectStore {
    #[must_use]
    pub fn new<P: Into<PathBuf>, S: Into<String>, U: Into<String>>(
        root: P,
        bucket: S,
        public_base_url: U,
    ) -> Self {
        Self {
            root: root.into(),
            bucket: bucket.into(),
            public_base_url: public_base_url.into(),
        }
    }

    /// Directory objects are written into
    #[must_use]
    pub fn bucket_dir(&self) -> PathBuf {
        self.root.join(&self.bucket)
    }

    /// Public URL an object named `name` is served from
    #[must_use]
    pub fn public_url(&self, name: &str) -> String {
        format!(
            "{}/{}/{}",
            self.public_base_url.trim_end_matches('/'),
            self.bucket,
            name
        )
    }
}

#[async_trait]
impl ObjectStore for LocalObjectStore {
    async fn upload(&self, name: &str, bytes: Vec<u8>, content_type: &str) -> Result<String> {
        if name.is_empty() || name.contains(['/', '\\']) || name == "." || name == ".." {
            return Err(StoreError::upload(format!("Invalid object name '{}'", name)));
        }

        let dir = self.bucket_dir();
        tokio::fs::create_dir_all(&dir)
            .await
            .map_err(|e| StoreError::upload(format!("Failed to create '{}': {}", dir.display(), e)))?;

        let path = dir.join(name);
        let size = bytes.len();
        tokio::fs::write(&path, bytes)
            .await
            .map_err(|e| StoreError::upload(format!("Failed to write '{}': {}", path.display(), e)))?;

        log::debug!("Stored {} ({} bytes, {})", path.display(), size, content_type);
        Ok(self.public_url(name))
    }
}

fn unix_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

/// Unique object name for an uploaded catalog image
#[must_use]
pub fn generate_upload_name(extension: &str) -> String {
    let random = uuid::Uuid::new_v4().simple().to_string();
    format!(
        "{}_{}.{}",
        unix_millis(),
        &random[..8],
        extension.trim_start_matches('.')
    )
}

/// Object name for a background-removed cutout
#[must_use]
pub fn background_removed_name() -> String {
    format!("{}_bg_removed.png", unix_millis())
}

/// Payload ready to hand to an [`ObjectStore`]
#[derive(Debug, Clone)]
pub struct PreparedUpload {
    pub bytes: Vec<u8>,
    pub content_type: String,
    /// File extension matching `bytes`
    pub extension: String,
    /// Whether the image was downscaled and re-encoded
    pub resized: bool,
    /// Dimensions after preparation, when the payload was decoded
    pub dimensions: Option<(u32, u32)>,
}

/// Content type and extension of an image payload; anything else is refused
fn sniff_format(bytes: &[u8]) -> Result<(&'static str, &'static str)> {
    match image::guess_format(bytes) {
        Ok(ImageFormat::Png) => Ok(("image/png", "png")),
        Ok(ImageFormat::Jpeg) => Ok(("image/jpeg", "jpg")),
        Ok(ImageFormat::WebP) => Ok(("image/webp", "webp")),
        Ok(ImageFormat::Tiff) => Ok(("image/tiff", "tiff")),
        Ok(ImageFormat::Gif) => Ok(("image/gif", "gif")),
        Ok(other) => Err(StoreError::unsupported_format(format!(
            "{:?} is not accepted for catalog uploads",
            other
        ))),
        Err(_) => Err(StoreError::unsupported_format(
            "upload payload is not a recognized image",
        )),
    }
}

/// Target dimensions when shrinking an image of `byte_len` bytes to `max_bytes`
///
/// Both sides are divided by `sqrt(byte_len / max_bytes)`, floored and kept
/// at one pixel or more.
#[must_use]
pub fn downscaled_dimensions(width: u32, height: u32, byte_len: u64, max_bytes: u64) -> (u32, u32) {
    if max_bytes == 0 || byte_len <= max_bytes {
        return (width, height);
    }
    let ratio = (byte_len as f64 / max_bytes as f64).sqrt();
    let scale = |side: u32| ((f64::from(side) / ratio).floor() as u32).max(1);
    (scale(width), scale(height))
}

/// Shrink an image so its encoded size fits under the upload limit
///
/// Payloads already within the limit pass through untouched as long as
/// they sniff as an image. Larger ones
/// are resized once by the square root of the size ratio and re-encoded in
/// the configured format; if that still exceeds the limit the result is
/// kept and a warning is logged.
pub fn prepare_for_upload(bytes: &[u8], config: &UploadConfig) -> Result<PreparedUpload> {
    config.validate()?;
    let byte_len = bytes.len() as u64;

    if byte_len <= config.max_upload_bytes {
        let (content_type, extension) = sniff_format(bytes)?;
        return Ok(PreparedUpload {
            bytes: bytes.to_vec(),
            content_type: content_type.to_string(),
            extension: extension.to_string(),
            resized: false,
            dimensions: None,
        });
    }

    let image = ImageIOService::load_from_bytes(bytes, None)?;
    let (width, height) = image.dimensions();
    let (new_width, new_height) =
        downscaled_dimensions(width, height, byte_len, config.max_upload_bytes);

    log::info!(
        "Resizing {}x{} upload ({} bytes) to {}x{}",
        width,
        height,
        byte_len,
        new_width,
        new_height
    );

    let resized = image.resize_exact(new_width, new_height, FilterType::Triangle);
    let encoded = OutputFormatHandler::encode(&resized, config.format, config.quality)?;

    if encoded.len() as u64 > config.max_upload_bytes {
        log::warn!(
            "Resized upload is still {} bytes, above the {} byte limit",
            encoded.len(),
            config.max_upload_bytes
        );
    }

    Ok(PreparedUpload {
        bytes: encoded,
        content_type: OutputFormatHandler::content_type(config.format).to_string(),
        extension: OutputFormatHandler::get_extension(config.format).to_string(),
        resized: true,
        dimensions: Some((new_width, new_height)),
    })
}

/// Prepare and upload a catalog image under a fresh name
pub async fn upload_image(
    store: &dyn ObjectStore,
    bytes: &[u8],
    config: &UploadConfig,
) -> Result<String> {
    let prepared = prepare_for_upload(bytes, config)?;
    let name = generate_upload_name(&prepared.extension);
    store
        .upload(&name, prepared.bytes, &prepared.content_type)
        .await
}

/// Upload a cutout as PNG under a `_bg_removed` name
pub async fn upload_removal_result(
    store: &dyn ObjectStore,
    result: &RemovalResult,
) -> Result<String> {
    let bytes = result.to_bytes(OutputFormat::Png, 100)?;
    let name = background_removed_name();
    store
        .upload(&name, bytes, OutputFormatHandler::content_type(OutputFormat::Png))
        .await
}
