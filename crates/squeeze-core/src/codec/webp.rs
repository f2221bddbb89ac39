use super::{Codec, CodecError};
use image::codecs::webp::WebPEncoder;
use image::{ColorType, ImageReader};
use std::fs::File;
use std::io::{BufReader, Write};

/// Lossless WebP via the `image` crate.
#[derive(Debug, Default, Clone, Copy)]
pub struct WebpLosslessCodec;

impl Codec for WebpLosslessCodec {
    fn extension(&self) -> &str {
        "webp"
    }

    fn encode_lossless(&self, source: File, destination: &mut File) -> Result<(), CodecError> {
        let img = ImageReader::new(BufReader::new(source))
            .with_guessed_format()?
            .decode()?;

        // The encoder only takes 8-bit layouts; anything wider would be truncated.
        let color = img.color();
        if !matches!(
            color,
            ColorType::L8 | ColorType::La8 | ColorType::Rgb8 | ColorType::Rgba8
        ) {
            return Err(CodecError::UnsupportedPixelFormat(color));
        }

        let mut encoded = Vec::new();
        img.write_with_encoder(WebPEncoder::new_lossless(&mut encoded))?;

        destination.write_all(&encoded)?;
        destination.sync_all()?;
        Ok(())
    }
}
