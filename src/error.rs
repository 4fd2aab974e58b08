//! Error types for the classic-bg-removal crate.

/// Errors that can occur while removing a background.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The image has a zero width or height.
    #[error("invalid image dimensions {width}x{height}")]
    InvalidDimensions {
        /// Image width in pixels.
        width: u32,
        /// Image height in pixels.
        height: u32,
    },

    /// The pixel buffer length does not match `width * height * 4`.
    #[error("pixel buffer holds {actual} bytes, expected {expected} for {width}x{height} RGBA")]
    BufferSizeMismatch {
        /// Image width in pixels.
        width: u32,
        /// Image height in pixels.
        height: u32,
        /// Required buffer length in bytes.
        expected: usize,
        /// Actual buffer length in bytes.
        actual: usize,
    },

    /// A removal option is out of range.
    #[error("invalid option `{name}`: {reason}")]
    InvalidOption {
        /// Option name.
        name: &'static str,
        /// Why the value was rejected.
        reason: String,
    },

    /// The source image could not be decoded into pixels.
    #[error("failed to decode image: {0}")]
    Decode(image::ImageError),

    /// A pixel buffer could not back an image surface.
    #[error("image surface unavailable: {0}")]
    Surface(String),

    /// The input file exceeds the accepted size.
    #[error("file is {size} bytes, limit is {limit} bytes")]
    FileTooLarge {
        /// File size in bytes.
        size: u64,
        /// Maximum accepted size in bytes.
        limit: u64,
    },

    /// An I/O error occurred while reading or writing files.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The image format is not supported.
    #[error("unsupported image format: {0}")]
    UnsupportedFormat(String),

    /// An error occurred while encoding or saving an image.
    #[error("image processing error: {0}")]
    Image(#[from] image::ImageError),
}

/// A specialized `Result` type for this crate.
pub type Result<T> = std::result::Result<T, Error>;
