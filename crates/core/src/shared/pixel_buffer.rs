use std::cell::OnceCell;
use std::path::{Path, PathBuf};

use ndarray::ArrayView3;
use thiserror::Error;

use crate::shared::rect::Rect;

/// Index of the alpha sample within an RGBA pixel.
pub const ALPHA_CHANNEL: usize = 3;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum BufferError {
    #[error("pixel data is {actual} bytes, expected {expected} for the given dimensions")]
    LengthMismatch { expected: usize, actual: usize },
    #[error("unsupported channel count {0}, expected 3 (RGB) or 4 (RGBA)")]
    UnsupportedChannels(u8),
    #[error("image dimensions must be non-zero, got {width}x{height}")]
    ZeroDimensions { width: u32, height: u32 },
}

/// One decoded image: channel-interleaved 8-bit samples in row-major order.
///
/// Not `Clone`. Each buffer is owned by exactly one batch slot and moves
/// onward by value.
#[derive(Debug)]
pub struct PixelBuffer {
    data: Vec<u8>,
    width: u32,
    height: u32,
    channels: u8,
    path: Option<PathBuf>,
    source_len: u64,
    region_bounds: OnceCell<Rect>,
}

impl PixelBuffer {
    pub fn new(data: Vec<u8>, width: u32, height: u32, channels: u8) -> Result<Self, BufferError> {
        if width == 0 || height == 0 {
            return Err(BufferError::ZeroDimensions { width, height });
        }
        if channels != 3 && channels != 4 {
            return Err(BufferError::UnsupportedChannels(channels));
        }
        let expected = (width as usize) * (height as usize) * (channels as usize);
        if data.len() != expected {
            return Err(BufferError::LengthMismatch {
                expected,
                actual: data.len(),
            });
        }
        Ok(Self {
            data,
            width,
            height,
            channels,
            path: None,
            source_len: 0,
            region_bounds: OnceCell::new(),
        })
    }

    /// Attaches the originating file and its size on disk.
    pub fn with_source(mut self, path: impl Into<PathBuf>, source_len: u64) -> Self {
        self.path = Some(path.into());
        self.source_len = source_len;
        self
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn channels(&self) -> u8 {
        self.channels
    }

    pub fn has_alpha(&self) -> bool {
        self.channels >= 4
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Lower-cased file extension of the source path, if any.
    pub fn extension(&self) -> Option<String> {
        self.path
            .as_deref()
            .and_then(|p| p.extension())
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase())
    }

    pub fn source_len(&self) -> u64 {
        self.source_len
    }

    pub fn full_rect(&self) -> Rect {
        Rect::full(self.width, self.height)
    }

    /// Bytes of one row.
    pub fn stride(&self) -> usize {
        self.width as usize * self.channels as usize
    }

    /// Channel samples of the pixel at `(x, y)`, or `None` when out of bounds.
    pub fn pixel(&self, x: u32, y: u32) -> Option<&[u8]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let c = self.channels as usize;
        let start = (y as usize * self.width as usize + x as usize) * c;
        Some(&self.data[start..start + c])
    }

    /// Alpha of the pixel at `(x, y)`. Buffers without an alpha channel
    /// report every pixel as fully opaque.
    pub fn alpha(&self, x: u32, y: u32) -> Option<u8> {
        let px = self.pixel(x, y)?;
        Some(if self.has_alpha() {
            px[ALPHA_CHANNEL]
        } else {
            u8::MAX
        })
    }

    pub fn as_ndarray(&self) -> ArrayView3<'_, u8> {
        ArrayView3::from_shape(self.shape(), &self.data)
            .expect("PixelBuffer data length must match dimensions")
    }

    /// Returns the memoized connected-region bounds, computing them once.
    pub(crate) fn region_bounds_or_init(&self, compute: impl FnOnce() -> Rect) -> Rect {
        *self.region_bounds.get_or_init(compute)
    }

    pub(crate) fn into_parts(self) -> (Vec<u8>, Option<PathBuf>, u64) {
        (self.data, self.path, self.source_len)
    }

    fn shape(&self) -> (usize, usize, usize) {
        (
            self.height as usize,
            self.width as usize,
            self.channels as usize,
        )
    }
}

impl PartialEq for PixelBuffer {
    /// Pixel equality: dimensions, channels and samples. Source metadata and
    /// memoized detection state are ignored.
    fn eq(&self, other: &Self) -> bool {
        self.width == other.width
            && self.height == other.height
            && self.channels == other.channels
            && self.data == other.data
    }
}
