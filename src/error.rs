//! Error types for storefront core operations

use thiserror::Error;

/// Result type alias for storefront core operations
pub type Result<T> = std::result::Result<T, StoreError>;

/// Error types for background removal, upload and checkout operations
///
/// Cart mutations never produce an error; malformed prices are coerced
/// to zero instead (see [`crate::cart::PriceStatus`]).
#[derive(Error, Debug)]
pub enum StoreError {
    /// Input/output errors (permission denied, disk full, etc.)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Image encoding errors
    #[error("Image processing error: {0}")]
    Image(#[from] image::ImageError),

    /// Source image could not be read or decoded
    #[error("Load error: {0}")]
    Load(String),

    /// Source image was reachable but its pixel data was not readable
    #[error("Access error: {0}")]
    Access(String),

    /// Invalid configuration or parameters
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Unsupported file format
    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),

    /// Object storage rejected or failed an upload
    #[error("Upload error: {0}")]
    Upload(String),

    /// Processing errors
    #[error("Processing error: {0}")]
    Processing(String),

    /// Checkout was requested with no lines in the cart
    #[error("Cart is empty")]
    EmptyCart,
}

impl StoreError {
    /// Create a new load error
    pub fn load<S: Into<String>>(msg: S) -> Self {
        Self::Load(msg.into())
    }

    /// Create a new pixel access error
    pub fn access<S: Into<String>>(msg: S) -> Self {
        Self::Access(msg.into())
    }

    /// Create a new invalid configuration error
    pub fn invalid_config<S: Into<String>>(msg: S) -> Self {
        Self::InvalidConfig(msg.into())
    }

    /// Create a new unsupported format error
    pub fn unsupported_format<S: Into<String>>(format: S) -> Self {
        Self::UnsupportedFormat(format.into())
    }

    /// Create a new upload error
    pub fn upload<S: Into<String>>(msg: S) -> Self {
        Self::Upload(msg.into())
    }

    /// Whether this error belongs to the load/access family a caller must
    /// answer by reverting optimistic UI state
    #[must_use]
    pub fn is_source_failure(&self) -> bool {
        matches!(self, Self::Load(_) | Self::Access(_))
    }

    /// Create file I/O error with operation context
    pub fn file_io_error<P: AsRef<std::path::Path>>(
        operation: &str,
        path: P,
        error: &std::io::Error,
    ) -> Self {
        let path_display = path.as_ref().display();
        Self::Io(std::io::Error::new(
            error.kind(),
            format!("Failed to {} '{}': {}", operation, path_display, error),
        ))
    }

    /// Create image loading error with format context
    pub fn image_load_error<P: AsRef<std::path::Path>>(path: P, error: &image::ImageError) -> Self {
        let path_display = path.as_ref().display();
        let extension = path
            .as_ref()
            .extension()
            .and_then(|s| s.to_str())
            .unwrap_or("unknown");

        Self::Load(format!(
            "Failed to load image '{}' (format: {}): {}. Supported formats: PNG, JPEG, WebP, TIFF",
            path_display, extension, error
        ))
    }

    /// Create configuration error with valid ranges
    pub fn config_value_error<T: std::fmt::Display>(
        parameter: &str,
        value: T,
        valid_range: &str,
        recommended: Option<T>,
    ) -> Self {
        let recommendation = match recommended {
            Some(rec) => format!(" Recommended: {}", rec),
            None => String::new(),
        };

        Self::InvalidConfig(format!(
            "Invalid {}: {} (valid range: {}).{}",
            parameter, value, valid_range, recommendation
        ))
    }

    /// Create processing error with stage context
    pub fn processing_stage_error(stage: &str, details: &str, input_info: Option<&str>) -> Self {
        let input_context = match input_info {
            Some(info) => format!(" (input: {})", info),
            None => String::new(),
        };

        Self::Processing(format!(
            "Processing failed at stage '{}'{}: {}",
            stage, input_context, details
        ))
    }
}
