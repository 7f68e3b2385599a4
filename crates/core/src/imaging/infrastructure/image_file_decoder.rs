use std::path::Path;

use crate::imaging::domain::image_decoder::{ImageDecoder, ImageIoError};
use crate::shared::pixel_buffer::PixelBuffer;

/// Decodes image files with the `image` crate.
///
/// The format is sniffed from the file content, falling back to the
/// extension. Images with an alpha channel become RGBA8, everything else
/// RGB8, so higher bit depths and grayscale are normalised here and never
/// reach the detection code.
pub struct ImageFileDecoder;

impl ImageFileDecoder {
    pub fn new() -> Self {
        Self
    }
}

impl Default for ImageFileDecoder {
    fn default() -> Self {
        Self::new()
    }
}

impl ImageDecoder for ImageFileDecoder {
    fn decode(&self, path: &Path) -> Result<PixelBuffer, ImageIoError> {
        let source_len = std::fs::metadata(path)?.len();
        let img = image::ImageReader::open(path)?
            .with_guessed_format()?
            .decode()?;

        let buffer = if img.color().has_alpha() {
            let rgba = img.into_rgba8();
            let (width, height) = rgba.dimensions();
            PixelBuffer::new(rgba.into_raw(), width, height, 4)?
        } else {
            let rgb = img.into_rgb8();
            let (width, height) = rgb.dimensions();
            PixelBuffer::new(rgb.into_raw(), width, height, 3)?
        };

        Ok(buffer.with_source(path, source_len))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn write_rgba_png(dir: &Path, name: &str, width: u32, height: u32) -> PathBuf {
        let path = dir.join(name);
        let mut img = image::RgbaImage::new(width, height);
        img.put_pixel(1, 2, image::Rgba([10, 20, 30, 128]));
        img.save(&path).unwrap();
        path
    }

    #[test]
    fn test_decode_rgba_png() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_rgba_png(dir.path(), "sprite.png", 6, 4);
        let buffer = ImageFileDecoder::new().decode(&path).unwrap();
        assert_eq!(buffer.width(), 6);
        assert_eq!(buffer.height(), 4);
        assert_eq!(buffer.channels(), 4);
        assert_eq!(buffer.pixel(1, 2), Some(&[10, 20, 30, 128][..]));
        assert_eq!(buffer.alpha(0, 0), Some(0));
    }

    #[test]
    fn test_decode_records_source() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_rgba_png(dir.path(), "sprite.png", 3, 3);
        let on_disk = std::fs::metadata(&path).unwrap().len();
        let buffer = ImageFileDecoder::new().decode(&path).unwrap();
        assert_eq!(buffer.path(), Some(path.as_path()));
        assert_eq!(buffer.source_len(), on_disk);
        assert_eq!(buffer.extension().as_deref(), Some("png"));
    }

    #[test]
    fn test_decode_rgb_jpeg_has_three_channels() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("photo.jpg");
        image::RgbImage::from_pixel(8, 8, image::Rgb([200, 100, 50]))
            .save(&path)
            .unwrap();
        let buffer = ImageFileDecoder::new().decode(&path).unwrap();
        assert_eq!(buffer.channels(), 3);
        assert!(!buffer.has_alpha());
    }

    #[test]
    fn test_decode_gray_alpha_is_widened_to_rgba() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("mask.png");
        let mut img = image::GrayAlphaImage::new(2, 2);
        img.put_pixel(1, 1, image::LumaA([90, 255]));
        img.save(&path).unwrap();
        let buffer = ImageFileDecoder::new().decode(&path).unwrap();
        assert_eq!(buffer.channels(), 4);
        assert_eq!(buffer.pixel(1, 1), Some(&[90, 90, 90, 255][..]));
    }

    #[test]
    fn test_decode_corrupt_file_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.png");
        std::fs::write(&path, b"definitely not a png").unwrap();
        assert!(ImageFileDecoder::new().decode(&path).is_err());
    }

    #[test]
    fn test_decode_missing_file_is_error() {
        assert!(ImageFileDecoder::new()
            .decode(Path::new("/nonexistent/sprite.png"))
            .is_err());
    }
}
