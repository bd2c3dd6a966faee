use ::image::{ColorType, DynamicImage};
use sparkle_core::PixelFormat;

use super::{AssetDecoder, DecodeContext};
use crate::error::DecodeFailure;
use crate::kind::{AssetKind, AssetMetadata};
use crate::payload::NormalizedPayload;

/// PNG, JPEG, BMP and TGA via the `image` crate.
///
/// 8-bit images keep their channel count; anything wider is converted to
/// 8-bit RGBA.
pub struct ImageDecoder;

impl AssetDecoder for ImageDecoder {
    fn kind(&self) -> AssetKind {
        AssetKind::Image
    }

    fn extensions(&self) -> &[&str] {
        &["png", "jpg", "jpeg", "bmp", "tga"]
    }

    fn decode(&self, ctx: DecodeContext<'_>) -> Result<NormalizedPayload, DecodeFailure> {
        let format = ::image::ImageFormat::from_extension(ctx.extension)
            .ok_or_else(|| DecodeFailure::new(format!("unsupported image extension .{}", ctx.extension)))?;
        let image = ::image::load_from_memory_with_format(ctx.bytes, format)
            .map_err(|e| DecodeFailure::with_source("invalid image data", e))?;
        Ok(normalize(image))
    }
}

fn normalize(image: DynamicImage) -> NormalizedPayload {
    let (width, height) = (image.width(), image.height());
    let (format, bytes) = match image.color() {
        ColorType::L8 => (PixelFormat::R8, image.into_luma8().into_raw()),
        ColorType::La8 => (PixelFormat::Rg8, image.into_luma_alpha8().into_raw()),
        ColorType::Rgb8 => (PixelFormat::Rgb8, image.into_rgb8().into_raw()),
        _ => (PixelFormat::Rgba8, image.into_rgba8().into_raw()),
    };
    NormalizedPayload::new(
        AssetMetadata::Image {
            width,
            height,
            format,
        },
        bytes,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use ::image::{ImageBuffer, Luma, Rgba};
    use std::io::Cursor;
    use std::path::Path;

    fn encode<P>(image: ImageBuffer<P, Vec<P::Subpixel>>) -> Vec<u8>
    where
        P: ::image::Pixel + ::image::PixelWithColorType,
        [P::Subpixel]: ::image::EncodableLayout,
    {
        let mut out = Cursor::new(Vec::new());
        image.write_to(&mut out, ::image::ImageFormat::Png).unwrap();
        out.into_inner()
    }

    fn decode(bytes: &[u8]) -> Result<NormalizedPayload, DecodeFailure> {
        ImageDecoder.decode(DecodeContext {
            path: Path::new("test.png"),
            bytes,
            extension: "png",
            declared_kind: AssetKind::Image,
        })
    }

    #[test]
    fn test_rgba_png_keeps_four_channels() {
        let png = encode(ImageBuffer::from_pixel(64, 64, Rgba([10u8, 20, 30, 255])));
        let payload = decode(&png).unwrap();

        assert_eq!(
            payload.metadata,
            AssetMetadata::Image {
                width: 64,
                height: 64,
                format: PixelFormat::Rgba8
            }
        );
        assert_eq!(payload.bytes.len(), 64 * 64 * 4);
        assert_eq!(&payload.bytes[..4], &[10, 20, 30, 255]);
    }

    #[test]
    fn test_gray_png_is_single_channel() {
        let png = encode(ImageBuffer::from_pixel(3, 2, Luma([200u8])));
        let payload = decode(&png).unwrap();

        assert_eq!(payload.bytes, vec![200; 6]);
        assert!(matches!(
            payload.metadata,
            AssetMetadata::Image {
                format: PixelFormat::R8,
                ..
            }
        ));
    }

    #[test]
    fn test_garbage_is_a_decode_failure() {
        let err = decode(b"definitely not a png").unwrap_err();
        assert_eq!(err.message(), "invalid image data");
    }
}
