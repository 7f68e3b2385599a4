pub mod batch_coordinator;
pub mod batch_report;
pub mod progress_tracker;
pub mod trim_batch_use_case;
