use std::collections::VecDeque;

use ndarray::{Array2, ArrayView2, Axis};

use crate::detection::domain::bounds_detector::BoundsDetector;
use crate::shared::pixel_buffer::{PixelBuffer, ALPHA_CHANNEL};
use crate::shared::rect::Rect;

/// Up, down, left, right as (row, col) deltas.
const NEIGHBOURS: [(isize, isize); 4] = [(-1, 0), (1, 0), (0, -1), (0, 1)];

/// Bounding box of the connected opaque region that contains the first
/// opaque pixel in raster order.
///
/// Disjoint islands beyond the seed's region are ignored. A fully transparent
/// image yields an empty rect at the origin. The result is memoized on the
/// buffer, so repeated detection is O(1).
pub struct FloodFillDetector;

impl FloodFillDetector {
    pub fn new() -> Self {
        Self
    }
}

impl Default for FloodFillDetector {
    fn default() -> Self {
        Self::new()
    }
}

impl BoundsDetector for FloodFillDetector {
    fn detect(&self, buffer: &PixelBuffer) -> Rect {
        buffer.region_bounds_or_init(|| seed_region_bounds(buffer))
    }
}

fn seed_region_bounds(buffer: &PixelBuffer) -> Rect {
    if !buffer.has_alpha() {
        return buffer.full_rect();
    }

    let pixels = buffer.as_ndarray();
    let alpha = pixels.index_axis(Axis(2), ALPHA_CHANNEL);

    let Some(seed) = find_seed(&alpha) else {
        return Rect::default();
    };

    let (height, width) = alpha.dim();
    let mut visited = Array2::<bool>::from_elem((height, width), false);
    let mut queue = VecDeque::new();
    visited[seed] = true;
    queue.push_back(seed);

    let (mut min_x, mut max_x) = (seed.1, seed.1);
    let (mut min_y, mut max_y) = (seed.0, seed.0);

    while let Some((row, col)) = queue.pop_front() {
        min_x = min_x.min(col);
        max_x = max_x.max(col);
        min_y = min_y.min(row);
        max_y = max_y.max(row);

        for (dr, dc) in NEIGHBOURS {
            let r = row as isize + dr;
            let c = col as isize + dc;
            if r < 0 || c < 0 || r >= height as isize || c >= width as isize {
                continue;
            }
            let next = (r as usize, c as usize);
            if !visited[next] && alpha[next] > 0 {
                visited[next] = true;
                queue.push_back(next);
            }
        }
    }

    Rect::from_inclusive_corners(min_x as i32, min_y as i32, max_x as i32, max_y as i32)
}

/// First opaque pixel in row-major order, as (row, col).
fn find_seed(alpha: &ArrayView2<'_, u8>) -> Option<(usize, usize)> {
    alpha
        .indexed_iter()
        .find(|(_, a)| **a > 0)
        .map(|(idx, _)| idx)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rgba_with_opaque(width: u32, height: u32, opaque: &[(u32, u32)]) -> PixelBuffer {
        let mut data = vec![0u8; (width * height * 4) as usize];
        for &(x, y) in opaque {
            data[((y * width + x) * 4 + 3) as usize] = 255;
        }
        PixelBuffer::new(data, width, height, 4).unwrap()
    }

    fn filled_block(x0: u32, y0: u32, w: u32, h: u32) -> Vec<(u32, u32)> {
        (y0..y0 + h)
            .flat_map(|y| (x0..x0 + w).map(move |x| (x, y)))
            .collect()
    }

    #[test]
    fn test_single_block() {
        let buffer = rgba_with_opaque(16, 16, &filled_block(4, 5, 6, 3));
        assert_eq!(FloodFillDetector::new().detect(&buffer), Rect::new(4, 5, 6, 3));
    }

    #[test]
    fn test_fully_transparent_yields_empty_rect() {
        let buffer = rgba_with_opaque(8, 8, &[]);
        let rect = FloodFillDetector::new().detect(&buffer);
        assert_eq!(rect, Rect::new(0, 0, 0, 0));
        assert!(rect.is_empty());
    }

    #[test]
    fn test_only_seed_island_is_measured() {
        // Island A at rows 1-2 comes first in raster order; island B is
        // further down and must be ignored.
        let mut opaque = filled_block(6, 1, 3, 2);
        opaque.extend(filled_block(0, 10, 4, 4));
        let buffer = rgba_with_opaque(16, 16, &opaque);
        assert_eq!(FloodFillDetector::new().detect(&buffer), Rect::new(6, 1, 3, 2));
    }

    #[test]
    fn test_diagonal_neighbours_are_not_connected() {
        let buffer = rgba_with_opaque(4, 4, &[(0, 0), (1, 1), (2, 2)]);
        assert_eq!(FloodFillDetector::new().detect(&buffer), Rect::new(0, 0, 1, 1));
    }

    #[test]
    fn test_follows_concave_shape() {
        // U shape: the traversal must walk down, across and back up.
        let mut opaque = filled_block(1, 1, 1, 5);
        opaque.extend(filled_block(1, 5, 5, 1));
        opaque.extend(filled_block(5, 1, 1, 5));
        let buffer = rgba_with_opaque(8, 8, &opaque);
        assert_eq!(FloodFillDetector::new().detect(&buffer), Rect::new(1, 1, 5, 5));
    }

    #[test]
    fn test_seed_region_extends_left_of_seed() {
        // Seed is (5,0); the region turns down and extends left past it.
        let mut opaque = vec![(5, 0)];
        opaque.extend(filled_block(1, 1, 5, 1));
        let buffer = rgba_with_opaque(8, 4, &opaque);
        assert_eq!(FloodFillDetector::new().detect(&buffer), Rect::new(1, 0, 5, 2));
    }

    #[test]
    fn test_rgb_buffer_is_one_region() {
        let buffer = PixelBuffer::new(vec![9u8; 6 * 3 * 3], 6, 3, 3).unwrap();
        assert_eq!(FloodFillDetector::new().detect(&buffer), Rect::new(0, 0, 6, 3));
    }

    #[test]
    fn test_result_is_memoized_on_buffer() {
        let buffer = rgba_with_opaque(8, 8, &filled_block(2, 2, 2, 2));
        let detector = FloodFillDetector::new();
        let first = detector.detect(&buffer);
        let second = FloodFillDetector::new().detect(&buffer);
        assert_eq!(first, second);
        assert_eq!(buffer.region_bounds_or_init(|| Rect::new(7, 7, 1, 1)), first);
    }
}
