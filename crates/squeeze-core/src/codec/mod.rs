mod webp;

pub use webp::WebpLosslessCodec;

use std::fs::File;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CodecError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),

    #[error("Unsupported pixel format: {0:?}")]
    UnsupportedPixelFormat(image::ColorType),
}

/// Lossless single-frame encoder the conversion worker delegates to.
pub trait Codec: Send + Sync {
    /// Canonical lowercase extension of the target format, without the dot.
    fn extension(&self) -> &str;

    /// Re-encode `source` into `destination` without losing pixel data.
    /// Returns only after the destination has been written and synced.
    fn encode_lossless(&self, source: File, destination: &mut File) -> Result<(), CodecError>;
}
