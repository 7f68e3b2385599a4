use std::path::Path;

use crate::shared::pixel_buffer::PixelBuffer;

/// Boxed error for I/O adapters; `Send` so it can leave a worker thread.
pub type ImageIoError = Box<dyn std::error::Error + Send + Sync>;

/// Reads an image file into a [`PixelBuffer`].
///
/// Implementations normalise to 8-bit samples and report 3 or 4 channels.
/// Shared by all decode workers, hence `Sync`.
pub trait ImageDecoder: Send + Sync {
    fn decode(&self, path: &Path) -> Result<PixelBuffer, ImageIoError>;
}
