use std::path::Path;

use image::{ColorType, ImageFormat};

use crate::imaging::domain::image_decoder::ImageIoError;
use crate::imaging::domain::image_encoder::ImageEncoder;
use crate::shared::pixel_buffer::PixelBuffer;

/// Writes pixel buffers with the `image` crate, choosing the format from the
/// target path's extension.
///
/// Formats without alpha support (JPEG) get the alpha channel dropped.
pub struct ImageFileEncoder;

impl ImageFileEncoder {
    pub fn new() -> Self {
        Self
    }
}

impl Default for ImageFileEncoder {
    fn default() -> Self {
        Self::new()
    }
}

impl ImageEncoder for ImageFileEncoder {
    fn encode(&self, buffer: &PixelBuffer, path: &Path) -> Result<u64, ImageIoError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let format = ImageFormat::from_path(path)?;
        let (width, height) = (buffer.width(), buffer.height());

        if buffer.has_alpha() && format == ImageFormat::Jpeg {
            let rgb = strip_alpha(buffer.data());
            image::save_buffer_with_format(path, &rgb, width, height, ColorType::Rgb8, format)?;
        } else {
            let color = if buffer.has_alpha() {
                ColorType::Rgba8
            } else {
                ColorType::Rgb8
            };
            image::save_buffer_with_format(path, buffer.data(), width, height, color, format)?;
        }

        Ok(std::fs::metadata(path)?.len())
    }
}

fn strip_alpha(rgba: &[u8]) -> Vec<u8> {
    let mut rgb = Vec::with_capacity(rgba.len() / 4 * 3);
    for px in rgba.chunks_exact(4) {
        rgb.extend_from_slice(&px[..3]);
    }
    rgb
}
