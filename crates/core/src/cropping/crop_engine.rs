use thiserror::Error;

use crate::shared::pixel_buffer::{BufferError, PixelBuffer};
use crate::shared::rect::Rect;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum CropError {
    #[error("crop target ({target}) exceeds source bounds {width}x{height}")]
    OutOfBounds {
        target: Rect,
        width: u32,
        height: u32,
    },
    #[error("crop target ({0}) has no area")]
    EmptyTarget(Rect),
    #[error(transparent)]
    Buffer(#[from] BufferError),
}

/// Copies a rectangular window out of a pixel buffer.
///
/// The target's origin is read from the source image; its extent becomes the
/// new image's dimensions. Targets that do not fit inside the source are a
/// logic error upstream and are rejected rather than clamped.
pub struct CropEngine;

impl CropEngine {
    pub fn new() -> Self {
        Self
    }

    /// Verifies that `target` lies fully inside a `width × height` image.
    pub fn check_bounds(&self, width: u32, height: u32, target: &Rect) -> Result<(), CropError> {
        if target.is_empty() {
            return Err(CropError::EmptyTarget(*target));
        }
        if !Rect::full(width, height).contains(target) {
            return Err(CropError::OutOfBounds {
                target: *target,
                width,
                height,
            });
        }
        Ok(())
    }

    /// True when a `width × height` image already has the target's extent,
    /// i.e. it was cropped to `target` before.
    pub fn is_at_target(&self, width: u32, height: u32, target: &Rect) -> bool {
        !target.is_empty() && target.width() as u32 == width && target.height() as u32 == height
    }

    /// Crops `buffer` to `target`, consuming it.
    ///
    /// One contiguous slice copy per destination row. A buffer that already
    /// has the target's extent is handed back untouched, so cropping twice
    /// with the same target leaves the first result as is.
    pub fn crop(&self, buffer: PixelBuffer, target: &Rect) -> Result<PixelBuffer, CropError> {
        if self.is_at_target(buffer.width(), buffer.height(), target) {
            return Ok(buffer);
        }
        self.check_bounds(buffer.width(), buffer.height(), target)?;

        let channels = buffer.channels();
        let src_stride = buffer.stride();
        let row_len = target.width() as usize * channels as usize;
        let x_offset = target.x() as usize * channels as usize;
        let rows = target.height() as usize;

        let mut out = Vec::with_capacity(row_len * rows);
        let src = buffer.data();
        for row in 0..rows {
            let start = (target.y() as usize + row) * src_stride + x_offset;
            out.extend_from_slice(&src[start..start + row_len]);
        }

        let (_, path, source_len) = buffer.into_parts();
        let cropped = PixelBuffer::new(
            out,
            target.width() as u32,
            target.height() as u32,
            channels,
        )?;

        Ok(match path {
            Some(path) => cropped.with_source(path, source_len),
            None => cropped,
        })
    }
}

impl Default for CropEngine {
    fn default() -> Self {
        Self::new()
    }
}
