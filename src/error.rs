//! Error types for the thumbnail-watermark crate.

/// Errors that can occur while building thumbnails and applying watermarks.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A watermark was requested but no watermark asset is configured.
    #[error("trying to apply a watermark, however no watermark asset is configured")]
    WatermarkNotConfigured,

    /// The configuration failed validation.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// The configuration file could not be parsed.
    #[error("failed to parse configuration: {0}")]
    ConfigParse(#[from] serde_yaml::Error),

    /// A geometry specification could not be parsed.
    #[error("invalid geometry: {0}")]
    InvalidGeometry(String),

    /// A watermark position specification could not be parsed.
    #[error("invalid watermark position: {0}")]
    InvalidPosition(String),

    /// An opacity outside of `0.0..=1.0` was supplied.
    #[error("opacity {0} is outside of 0.0..=1.0")]
    InvalidOpacity(f32),

    /// An unknown or malformed per-call option.
    #[error("invalid option: {0}")]
    InvalidOption(String),

    /// An I/O error occurred while reading or writing files.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The image format is not supported.
    #[error("unsupported image format: {0}")]
    UnsupportedFormat(String),

    /// An error occurred during image processing (load, save, encode).
    #[error("image processing error: {0}")]
    Image(#[from] image::ImageError),
}

/// A specialized `Result` type for this crate.
pub type Result<T> = std::result::Result<T, Error>;
