//! Codec adapter
//!
//! Decodes JPEG, PNG, GIF, WebP (and BMP, which re-encodes as the lossy default)
//! into a [`RasterImage`], and encodes rasters back into bytes for a family.

use super::{ImageError, ImageResult};
use bytes::Bytes;
use image::codecs::gif::GifEncoder;
use image::codecs::jpeg::JpegEncoder;
use image::{DynamicImage, ExtendedColorType, Frame, GenericImageView, ImageFormat};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::io::Cursor;

/// Output encoding families.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImageFamily {
    Jpeg,
    Png,
    Gif,
    Webp,
}

impl ImageFamily {
    /// Family used for unrecognized sources and names
    pub const DEFAULT: ImageFamily = ImageFamily::Jpeg;

    pub fn from_format(format: ImageFormat) -> Self {
        match format {
            ImageFormat::Jpeg => ImageFamily::Jpeg,
            ImageFormat::Png => ImageFamily::Png,
            ImageFormat::Gif => ImageFamily::Gif,
            ImageFormat::WebP => ImageFamily::Webp,
            _ => Self::DEFAULT,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ImageFamily::Jpeg => "jpeg",
            ImageFamily::Png => "png",
            ImageFamily::Gif => "gif",
            ImageFamily::Webp => "webp",
        }
    }

    pub fn extension(&self) -> &'static str {
        match self {
            ImageFamily::Jpeg => "jpg",
            other => other.as_str(),
        }
    }

    pub fn content_type(&self) -> &'static str {
        match self {
            ImageFamily::Jpeg => "image/jpeg",
            ImageFamily::Png => "image/png",
            ImageFamily::Gif => "image/gif",
            ImageFamily::Webp => "image/webp",
        }
    }

    /// Whether the encoder honours a quality parameter (and so a size budget).
    pub fn supports_quality(&self) -> bool {
        matches!(self, ImageFamily::Jpeg | ImageFamily::Webp)
    }
}

impl fmt::Display for ImageFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Decoded pixels plus the family the bytes were detected as.
#[derive(Clone, Debug)]
pub struct RasterImage {
    image: DynamicImage,
    source_family: ImageFamily,
}

impl RasterImage {
    pub fn new(image: DynamicImage, source_family: ImageFamily) -> Self {
        Self {
            image,
            source_family,
        }
    }

    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }

    pub fn dimensions(&self) -> (u32, u32) {
        self.image.dimensions()
    }

    pub fn source_family(&self) -> ImageFamily {
        self.source_family
    }

    pub fn as_dynamic(&self) -> &DynamicImage {
        &self.image
    }
}

/// Decode an image byte stream, detecting its family from the content.
pub fn decode(data: &[u8]) -> ImageResult<RasterImage> {
    if data.is_empty() {
        return Err(ImageError::Decode("empty input".to_string()));
    }

    let format = image::guess_format(data).map_err(|e| ImageError::Decode(e.to_string()))?;
    let image = image::load_from_memory_with_format(data, format)
        .map_err(|e| ImageError::Decode(e.to_string()))?;

    Ok(RasterImage::new(image, ImageFamily::from_format(format)))
}

/// Encode a raster. `quality` (clamped to 1..=100) is ignored by PNG and GIF.
pub fn encode(raster: &RasterImage, family: ImageFamily, quality: u8) -> ImageResult<Bytes> {
    let quality = quality.clamp(1, 100);
    let image = raster.as_dynamic();
    let (width, height) = image.dimensions();
    let encode_err = |message: String| ImageError::Encode { family, message };

    let mut buf = Vec::new();
    match family {
        ImageFamily::Jpeg => {
            let rgb = image.to_rgb8();
            JpegEncoder::new_with_quality(&mut buf, quality)
                .encode(rgb.as_raw(), width, height, ExtendedColorType::Rgb8)
                .map_err(|e| encode_err(e.to_string()))?;
        }
        ImageFamily::Png => {
            image
                .write_to(&mut Cursor::new(&mut buf), ImageFormat::Png)
                .map_err(|e| encode_err(e.to_string()))?;
        }
        ImageFamily::Gif => {
            let mut encoder = GifEncoder::new(&mut buf);
            encoder
                .encode_frame(Frame::new(image.to_rgba8()))
                .map_err(|e| encode_err(e.to_string()))?;
        }
        ImageFamily::Webp => {
            let mut config = webp::WebPConfig::new()
                .map_err(|_| encode_err("failed to create WebPConfig".to_string()))?;
            config.quality = f32::from(quality);

            let encoded = if image.color().has_alpha() {
                let rgba = image.to_rgba8();
                webp::Encoder::from_rgba(rgba.as_raw(), width, height).encode_advanced(&config)
            } else {
                let rgb = image.to_rgb8();
                webp::Encoder::from_rgb(rgb.as_raw(), width, height).encode_advanced(&config)
            };
            let memory = encoded.map_err(|e| encode_err(format!("WebP encode failed: {e:?}")))?;

            buf.extend_from_slice(&memory);
        }
    }

    Ok(Bytes::from(buf))
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgb, RgbImage, Rgba, RgbaImage};

    fn gradient(width: u32, height: u32) -> RasterImage {
        let img = RgbImage::from_fn(width, height, |x, y| {
            Rgb([(x * 255 / width) as u8, (y * 255 / height) as u8, 128])
        });
        RasterImage::new(DynamicImage::ImageRgb8(img), ImageFamily::Png)
    }

    #[test]
    fn test_family_from_format_falls_back_to_default() {
        assert_eq!(ImageFamily::from_format(ImageFormat::Png), ImageFamily::Png);
        assert_eq!(ImageFamily::from_format(ImageFormat::Bmp), ImageFamily::DEFAULT);
    }

    #[test]
    fn test_family_metadata() {
        assert_eq!(ImageFamily::Jpeg.extension(), "jpg");
        assert_eq!(ImageFamily::Jpeg.as_str(), "jpeg");
        assert_eq!(ImageFamily::Webp.content_type(), "image/webp");
        assert!(ImageFamily::Webp.supports_quality());
        assert!(!ImageFamily::Png.supports_quality());
        assert!(!ImageFamily::Gif.supports_quality());
    }

    #[test]
    fn test_decode_rejects_garbage() {
        assert!(matches!(decode(b""), Err(ImageError::Decode(_))));
        assert!(matches!(
            decode(b"definitely not an image"),
            Err(ImageError::Decode(_))
        ));
    }

    #[test]
    fn test_encode_then_decode_detects_each_family() {
        let raster = gradient(32, 24);
        for family in [
            ImageFamily::Jpeg,
            ImageFamily::Png,
            ImageFamily::Gif,
            ImageFamily::Webp,
        ] {
            let bytes = encode(&raster, family, 80).unwrap();
            let decoded = decode(&bytes).unwrap();
            assert_eq!(decoded.source_family(), family);
            assert_eq!(decoded.dimensions(), (32, 24));
        }
    }

    #[test]
    fn test_png_ignores_quality() {
        let raster = gradient(40, 40);
        let low = encode(&raster, ImageFamily::Png, 5).unwrap();
        let high = encode(&raster, ImageFamily::Png, 100).unwrap();
        assert_eq!(low, high);
    }

    #[test]
    fn test_jpeg_quality_changes_output() {
        let raster = gradient(64, 64);
        let low = encode(&raster, ImageFamily::Jpeg, 10).unwrap();
        let high = encode(&raster, ImageFamily::Jpeg, 95).unwrap();
        assert!(low.len() < high.len());
    }

    #[test]
    fn test_jpeg_drops_alpha() {
        let img = RgbaImage::from_pixel(8, 8, Rgba([10, 20, 30, 0]));
        let raster = RasterImage::new(DynamicImage::ImageRgba8(img), ImageFamily::Png);
        let bytes = encode(&raster, ImageFamily::Jpeg, 90).unwrap();
        assert_eq!(decode(&bytes).unwrap().source_family(), ImageFamily::Jpeg);
    }

    #[test]
    fn test_bmp_source_maps_to_default_family() {
        let raster = gradient(10, 10);
        let mut bmp = Vec::new();
        raster
            .as_dynamic()
            .write_to(&mut Cursor::new(&mut bmp), ImageFormat::Bmp)
            .unwrap();

        let decoded = decode(&bmp).unwrap();
        assert_eq!(decoded.source_family(), ImageFamily::DEFAULT);
    }
}
