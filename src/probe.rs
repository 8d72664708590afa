//! Image header decoding.
//!
//! Only the header is read: the format is sniffed from the leading magic
//! bytes and the dimensions come from the decoder's header parse, so a
//! full pixel decode never happens.

use std::io::Cursor;

use image::{ImageError, ImageFormat, ImageReader};

/// Attributes decoded from an image header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageInfo {
    pub width: u32,
    pub height: u32,
    /// Short upper-case format tag, e.g. `PNG` or `JPEG`.
    pub format: Option<String>,
}

/// Decode width, height and format from the bytes of an image.
pub fn probe(data: &[u8]) -> Result<ImageInfo, ImageError> {
    let reader = ImageReader::new(Cursor::new(data)).with_guessed_format()?;
    let format = reader.format().map(format_tag);
    let (width, height) = reader.into_dimensions()?;
    Ok(ImageInfo {
        width,
        height,
        format,
    })
}

/// Upper-case tag stored in the `type` attribute.
pub fn format_tag(format: ImageFormat) -> String {
    match format {
        ImageFormat::Png => "PNG".to_string(),
        ImageFormat::Jpeg => "JPEG".to_string(),
        ImageFormat::Gif => "GIF".to_string(),
        ImageFormat::WebP => "WEBP".to_string(),
        ImageFormat::Bmp => "BMP".to_string(),
        ImageFormat::Tiff => "TIFF".to_string(),
        ImageFormat::Ico => "ICO".to_string(),
        other => format!("{other:?}").to_uppercase(),
    }
}

/// Encode a solid `width`x`height` image in `format` for tests.
#[cfg(test)]
pub(crate) fn encode_test_image(width: u32, height: u32, format: ImageFormat) -> Vec<u8> {
    let img = image::RgbImage::from_pixel(width, height, image::Rgb([200, 30, 90]));
    let mut buf = Cursor::new(Vec::new());
    image::DynamicImage::ImageRgb8(img)
        .write_to(&mut buf, format)
        .expect("encode test image");
    buf.into_inner()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_probe_png() {
        let data = encode_test_image(37, 11, ImageFormat::Png);
        let info = probe(&data).unwrap();
        assert_eq!(
            info,
            ImageInfo {
                width: 37,
                height: 11,
                format: Some("PNG".to_string()),
            }
        );
    }

    #[test]
    fn test_probe_jpeg() {
        let data = encode_test_image(64, 48, ImageFormat::Jpeg);
        let info = probe(&data).unwrap();
        assert_eq!((info.width, info.height), (64, 48));
        assert_eq!(info.format.as_deref(), Some("JPEG"));
    }

    #[test]
    fn test_probe_bmp() {
        let data = encode_test_image(3, 5, ImageFormat::Bmp);
        let info = probe(&data).unwrap();
        assert_eq!((info.width, info.height), (3, 5));
        assert_eq!(info.format.as_deref(), Some("BMP"));
    }

    #[test]
    fn test_probe_rejects_non_image() {
        assert!(probe(b"definitely not an image").is_err());
        assert!(probe(&[]).is_err());
    }

    #[test]
    fn test_probe_rejects_truncated_png() {
        let data = encode_test_image(8, 8, ImageFormat::Png);
        assert!(probe(&data[..12]).is_err());
    }
}
