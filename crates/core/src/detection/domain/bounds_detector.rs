use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::shared::pixel_buffer::PixelBuffer;
use crate::shared::rect::Rect;

/// Domain interface for locating the opaque content of an image.
///
/// Detectors are stateless with respect to the batch, so one instance is
/// shared by every worker thread.
pub trait BoundsDetector: Send + Sync {
    fn detect(&self, buffer: &PixelBuffer) -> Rect;
}

/// Bounding-box algorithm selection.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DetectionAlgorithm {
    /// Envelope of every opaque pixel. A fully transparent image yields
    /// the full-image rect.
    #[default]
    FullScan,
    /// Envelope of the 4-connected region containing the first opaque pixel
    /// in raster order. A fully transparent image yields an empty rect.
    FloodFill,
}

impl DetectionAlgorithm {
    pub const ALL: &[DetectionAlgorithm] =
        &[DetectionAlgorithm::FullScan, DetectionAlgorithm::FloodFill];
}

impl std::fmt::Display for DetectionAlgorithm {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DetectionAlgorithm::FullScan => write!(f, "full-scan"),
            DetectionAlgorithm::FloodFill => write!(f, "flood-fill"),
        }
    }
}

impl FromStr for DetectionAlgorithm {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "full-scan" => Ok(DetectionAlgorithm::FullScan),
            "flood-fill" => Ok(DetectionAlgorithm::FloodFill),
            other => Err(format!(
                "Detection algorithm must be 'full-scan' or 'flood-fill', got '{other}'"
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("full-scan", DetectionAlgorithm::FullScan)]
    #[case("flood-fill", DetectionAlgorithm::FloodFill)]
    fn test_parse_round_trips_display(#[case] text: &str, #[case] expected: DetectionAlgorithm) {
        let parsed: DetectionAlgorithm = text.parse().unwrap();
        assert_eq!(parsed, expected);
        assert_eq!(parsed.to_string(), text);
    }

    #[test]
    fn test_parse_rejects_unknown() {
        let err = "scanline".parse::<DetectionAlgorithm>().unwrap_err();
        assert!(err.contains("scanline"));
    }

    #[test]
    fn test_default_is_full_scan() {
        assert_eq!(DetectionAlgorithm::default(), DetectionAlgorithm::FullScan);
    }
}
