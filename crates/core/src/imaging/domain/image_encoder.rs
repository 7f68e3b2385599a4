use std::path::Path;

use crate::imaging::domain::image_decoder::ImageIoError;
use crate::shared::pixel_buffer::PixelBuffer;

/// Writes a pixel buffer to an image file, replacing any existing file.
pub trait ImageEncoder: Send + Sync {
    /// Returns the number of bytes written.
    fn encode(&self, buffer: &PixelBuffer, path: &Path) -> Result<u64, ImageIoError>;
}
