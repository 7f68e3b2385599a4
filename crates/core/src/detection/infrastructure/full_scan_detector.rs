use ndarray::Axis;

use crate::detection::domain::bounds_detector::BoundsDetector;
use crate::shared::pixel_buffer::{PixelBuffer, ALPHA_CHANNEL};
use crate::shared::rect::Rect;

/// Bounding box of every pixel with non-zero alpha.
///
/// Visits each pixel exactly once and keeps no state between calls, so it is
/// safe to run on many images concurrently. Images without any opaque pixel
/// (and images without an alpha channel) yield the full-image rect, which
/// always gives the aggregator something usable.
pub struct FullScanDetector;

impl FullScanDetector {
    pub fn new() -> Self {
        Self
    }
}

impl Default for FullScanDetector {
    fn default() -> Self {
        Self::new()
    }
}

impl BoundsDetector for FullScanDetector {
    fn detect(&self, buffer: &PixelBuffer) -> Rect {
        if !buffer.has_alpha() {
            return buffer.full_rect();
        }

        let pixels = buffer.as_ndarray();
        let alpha = pixels.index_axis(Axis(2), ALPHA_CHANNEL);

        let mut min_x = usize::MAX;
        let mut min_y = usize::MAX;
        let mut max_x = 0usize;
        let mut max_y = 0usize;
        let mut found = false;

        for ((row, col), &a) in alpha.indexed_iter() {
            if a > 0 {
                found = true;
                min_x = min_x.min(col);
                max_x = max_x.max(col);
                min_y = min_y.min(row);
                max_y = max_y.max(row);
            }
        }

        if !found {
            log::debug!(
                "No opaque pixels in {}, using full extent",
                describe(buffer)
            );
            return buffer.full_rect();
        }

        Rect::from_inclusive_corners(min_x as i32, min_y as i32, max_x as i32, max_y as i32)
    }
}

fn describe(buffer: &PixelBuffer) -> String {
    buffer
        .path()
        .map(|p| p.display().to_string())
        .unwrap_or_else(|| format!("{}x{} buffer", buffer.width(), buffer.height()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn rgba_with_opaque(width: u32, height: u32, opaque: &[(u32, u32)]) -> PixelBuffer {
        let mut data = vec![0u8; (width * height * 4) as usize];
        for &(x, y) in opaque {
            let idx = ((y * width + x) * 4) as usize;
            data[idx..idx + 4].copy_from_slice(&[255, 255, 255, 255]);
        }
        PixelBuffer::new(data, width, height, 4).unwrap()
    }

    #[test]
    fn test_single_pixel() {
        let buffer = rgba_with_opaque(10, 10, &[(4, 6)]);
        assert_eq!(FullScanDetector::new().detect(&buffer), Rect::new(4, 6, 1, 1));
    }

    #[test]
    fn test_envelope_of_scattered_pixels() {
        let buffer = rgba_with_opaque(20, 20, &[(3, 10), (15, 2), (7, 17)]);
        assert_eq!(
            FullScanDetector::new().detect(&buffer),
            Rect::new(3, 2, 13, 16)
        );
    }

    #[test]
    fn test_fully_transparent_yields_full_extent() {
        let buffer = rgba_with_opaque(12, 8, &[]);
        assert_eq!(FullScanDetector::new().detect(&buffer), Rect::new(0, 0, 12, 8));
    }

    #[test]
    fn test_rgb_buffer_is_fully_opaque() {
        let buffer = PixelBuffer::new(vec![0u8; 5 * 4 * 3], 5, 4, 3).unwrap();
        assert_eq!(FullScanDetector::new().detect(&buffer), Rect::new(0, 0, 5, 4));
    }

    #[test]
    fn test_faint_alpha_counts_as_opaque() {
        let mut data = vec![0u8; 4 * 4 * 4];
        data[(2 * 4 + 1) * 4 + 3] = 1; // x=1, y=2, alpha=1
        let buffer = PixelBuffer::new(data, 4, 4, 4).unwrap();
        assert_eq!(FullScanDetector::new().detect(&buffer), Rect::new(1, 2, 1, 1));
    }

    #[test]
    fn test_color_without_alpha_is_transparent() {
        let mut data = vec![0u8; 4 * 4 * 4];
        data[0..3].copy_from_slice(&[255, 255, 255]); // alpha stays 0
        data[(3 * 4 + 3) * 4 + 3] = 200;
        let buffer = PixelBuffer::new(data, 4, 4, 4).unwrap();
        assert_eq!(FullScanDetector::new().detect(&buffer), Rect::new(3, 3, 1, 1));
    }

    #[rstest]
    #[case::top_left((0, 0))]
    #[case::top_right((9, 0))]
    #[case::bottom_left((0, 6))]
    #[case::bottom_right((9, 6))]
    fn test_corner_pixels(#[case] at: (u32, u32)) {
        let buffer = rgba_with_opaque(10, 7, &[at]);
        assert_eq!(
            FullScanDetector::new().detect(&buffer),
            Rect::new(at.0 as i32, at.1 as i32, 1, 1)
        );
    }
}
