use crate::detection::domain::bounds_detector::{BoundsDetector, DetectionAlgorithm};
use crate::shared::pixel_buffer::PixelBuffer;
use crate::shared::rect::Rect;

use super::flood_fill_detector::FloodFillDetector;
use super::full_scan_detector::FullScanDetector;

/// Creates the detector for the selected algorithm.
pub fn create_detector(algorithm: DetectionAlgorithm) -> Box<dyn BoundsDetector> {
    log::debug!("Using {algorithm} bounds detection");
    match algorithm {
        DetectionAlgorithm::FullScan => Box::new(FullScanDetector::new()),
        DetectionAlgorithm::FloodFill => Box::new(FloodFillDetector::new()),
    }
}

/// One-shot detection without holding on to a detector.
pub fn detect(buffer: &PixelBuffer, algorithm: DetectionAlgorithm) -> Rect {
    match algorithm {
        DetectionAlgorithm::FullScan => FullScanDetector::new().detect(buffer),
        DetectionAlgorithm::FloodFill => FloodFillDetector::new().detect(buffer),
    }
}
