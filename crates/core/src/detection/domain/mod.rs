pub mod bounds_detector;
