pub mod detector_factory;
pub mod flood_fill_detector;
pub mod full_scan_detector;
