use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Instant;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::aggregation::rect_aggregator::{aggregate_target, AggregationPolicy};
use crate::compression::domain::compressor::{CompressError, CompressionFormat, Compressor};
use crate::cropping::crop_engine::{CropEngine, CropError};
use crate::detection::domain::bounds_detector::{BoundsDetector, DetectionAlgorithm};
use crate::detection::infrastructure::detector_factory::create_detector;
use crate::imaging::domain::image_decoder::ImageDecoder;
use crate::imaging::domain::image_encoder::ImageEncoder;
use crate::pipeline::batch_coordinator::BatchCoordinator;
use crate::pipeline::batch_report::{
    BatchReport, FailureKind, ItemFailure, ItemOutcome, ItemReport, StageTiming,
};
use crate::pipeline::progress_tracker::{ProgressSink, ProgressTracker};
use crate::shared::pixel_buffer::PixelBuffer;
use crate::shared::rect::Rect;

/// What happens to the files once the target rect is known.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum BatchMode {
    /// Decode, detect and aggregate only. Nothing is written.
    DryRun,
    /// Crop every image to the target and write it back in place.
    #[default]
    Crop,
    /// Crop, then losslessly re-compress each written file.
    CropAndCompress,
}

impl BatchMode {
    pub const ALL: &[BatchMode] = &[BatchMode::DryRun, BatchMode::Crop, BatchMode::CropAndCompress];

    pub fn writes_files(self) -> bool {
        self != BatchMode::DryRun
    }
}

impl std::fmt::Display for BatchMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BatchMode::DryRun => write!(f, "dry-run"),
            BatchMode::Crop => write!(f, "crop"),
            BatchMode::CropAndCompress => write!(f, "crop-and-compress"),
        }
    }
}

impl FromStr for BatchMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "dry-run" => Ok(BatchMode::DryRun),
            "crop" => Ok(BatchMode::Crop),
            "crop-and-compress" => Ok(BatchMode::CropAndCompress),
            other => Err(format!(
                "Batch mode must be 'dry-run', 'crop' or 'crop-and-compress', got '{other}'"
            )),
        }
    }
}

/// Settings for one batch run.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrimConfig {
    pub mode: BatchMode,
    pub algorithm: DetectionAlgorithm,
    pub policy: AggregationPolicy,
    /// Round the target to even origin and extent.
    pub even: bool,
    /// Worker thread override; `None` uses every available core.
    pub workers: Option<usize>,
}

impl TrimConfig {
    pub fn with_mode(mut self, mode: BatchMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn with_algorithm(mut self, algorithm: DetectionAlgorithm) -> Self {
        self.algorithm = algorithm;
        self
    }

    pub fn with_policy(mut self, policy: AggregationPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn with_even(mut self, even: bool) -> Self {
        self.even = even;
        self
    }

    pub fn with_workers(mut self, workers: Option<usize>) -> Self {
        self.workers = workers;
        self
    }
}

/// Errors that stop a batch as a whole. Per-image problems are recorded in
/// the report instead.
#[derive(Error, Debug)]
pub enum BatchError {
    #[error("no images to process")]
    EmptyBatch,
    #[error("target ({target}) does not fit {path} ({width}x{height})")]
    BoundsViolation {
        path: PathBuf,
        target: Rect,
        width: u32,
        height: u32,
    },
    #[error(transparent)]
    Crop(#[from] CropError),
}

/// Per-path working slot. Owned by exactly one worker during each pass.
struct BatchItem {
    path: PathBuf,
    buffer: Option<PixelBuffer>,
    bounds: Option<Rect>,
    outcome: ItemOutcome,
    bytes_before: u64,
    bytes_after: Option<u64>,
}

impl BatchItem {
    fn new(path: PathBuf) -> Self {
        Self {
            path,
            buffer: None,
            bounds: None,
            outcome: ItemOutcome::Unchanged,
            bytes_before: 0,
            bytes_after: None,
        }
    }

    fn is_live(&self) -> bool {
        !self.outcome.is_failed()
    }

    fn record(&mut self, result: Result<(), ItemFailure>) -> Result<(), ItemFailure> {
        if let Err(failure) = &result {
            self.outcome = ItemOutcome::Failed(failure.clone());
            self.buffer = None;
        }
        result
    }

    fn into_report(self) -> ItemReport {
        ItemReport {
            path: self.path,
            outcome: self.outcome,
            bounds: self.bounds,
            bytes_before: self.bytes_before,
            bytes_after: self.bytes_after,
        }
    }
}

/// Batch trimming pipeline: decode + detect → aggregate → crop → compress.
///
/// Decoding, cropping and compression each run as one parallel pass over
/// the batch; aggregation runs on the calling thread between them so every
/// worker only ever borrows the finished target.
pub struct TrimBatchUseCase {
    decoder: Box<dyn ImageDecoder>,
    encoder: Box<dyn ImageEncoder>,
    compressor: Box<dyn Compressor>,
    detector: Box<dyn BoundsDetector>,
    crop_engine: CropEngine,
    coordinator: BatchCoordinator,
    config: TrimConfig,
    progress_sink: Option<ProgressSink>,
}

impl TrimBatchUseCase {
    pub fn new(
        decoder: Box<dyn ImageDecoder>,
        encoder: Box<dyn ImageEncoder>,
        compressor: Box<dyn Compressor>,
        config: TrimConfig,
    ) -> Self {
        Self {
            decoder,
            encoder,
            compressor,
            detector: create_detector(config.algorithm),
            crop_engine: CropEngine::new(),
            coordinator: BatchCoordinator::new().with_workers(config.workers),
            config,
            progress_sink: None,
        }
    }

    pub fn with_progress_sink(mut self, sink: ProgressSink) -> Self {
        self.progress_sink = Some(sink);
        self
    }

    /// Processes every path and reports per-image outcomes.
    ///
    /// Decode, encode and compression failures are recorded per image and
    /// the batch carries on. The target is checked against every decoded
    /// image before anything is written, so a violation leaves all files
    /// untouched.
    pub fn execute(&self, paths: &[PathBuf]) -> Result<BatchReport, BatchError> {
        if paths.is_empty() {
            return Err(BatchError::EmptyBatch);
        }

        let started = Instant::now();
        let mut stages = Vec::new();
        let mut items: Vec<BatchItem> = paths.iter().cloned().map(BatchItem::new).collect();

        log::info!(
            "Trimming {} images ({}, {} detection, {} policy{})",
            items.len(),
            self.config.mode,
            self.config.algorithm,
            self.config.policy,
            if self.config.even { ", even parity" } else { "" }
        );

        self.run_pass("decode", &mut items, &mut stages, |item| self.decode_item(item));

        let stage_start = Instant::now();
        let target = aggregate_target(
            items.iter().filter_map(|i| i.bounds.as_ref()),
            self.config.policy,
            self.config.even,
        );
        stages.push(timing("aggregate", stage_start));

        match target {
            Some(target) => {
                log::info!("Batch target ({} policy): {target}", self.config.policy);
                self.check_target(&items, &target)?;

                if self.config.mode.writes_files() {
                    self.run_pass("crop", &mut items, &mut stages, |item| {
                        self.crop_item(item, &target)
                    });
                }
            }
            None => log::warn!("No image has usable bounds, skipping crop"),
        }

        for item in &mut items {
            item.buffer = None;
        }

        if self.config.mode == BatchMode::CropAndCompress && target.is_some() {
            self.run_pass("compress", &mut items, &mut stages, |item| {
                self.compress_item(item)
            });
        }

        let report = BatchReport {
            config: self.config.clone(),
            target,
            items: items.into_iter().map(BatchItem::into_report).collect(),
            stages,
            elapsed_ms: started.elapsed().as_secs_f64() * 1000.0,
        };
        log::info!(
            "Batch finished: {} succeeded, {} failed",
            report.succeeded(),
            report.failed()
        );
        Ok(report)
    }

    fn run_pass<F>(
        &self,
        stage: &str,
        items: &mut [BatchItem],
        stages: &mut Vec<StageTiming>,
        operation: F,
    ) where
        F: Fn(&mut BatchItem) -> Result<(), ItemFailure> + Sync,
    {
        let stage_start = Instant::now();
        let progress = ProgressTracker::new(stage, items.len(), self.progress_sink.clone());
        log::info!("Starting {stage} pass");

        let results = self.coordinator.run_parallel(
            items,
            |_, item: &mut BatchItem| {
                if !item.is_live() {
                    return Ok(());
                }
                let result = operation(item);
                item.record(result)
            },
            &progress,
        );

        let failed = results.iter().filter(|r| r.is_err()).count();
        if failed > 0 {
            log::warn!("{stage} pass: {failed} of {} images failed", items.len());
        }
        stages.push(timing(stage, stage_start));
    }

    fn decode_item(&self, item: &mut BatchItem) -> Result<(), ItemFailure> {
        let buffer = self
            .decoder
            .decode(&item.path)
            .map_err(|e| ItemFailure::new(FailureKind::Decode, e.to_string()))?;

        let bounds = self.detector.detect(&buffer);
        log::debug!("{}: bounds {bounds}", item.path.display());

        item.bytes_before = buffer.source_len();
        item.bounds = Some(bounds);
        item.buffer = Some(buffer);
        Ok(())
    }

    fn check_target(&self, items: &[BatchItem], target: &Rect) -> Result<(), BatchError> {
        for item in items {
            let Some(buffer) = &item.buffer else {
                continue;
            };
            if self
                .crop_engine
                .is_at_target(buffer.width(), buffer.height(), target)
            {
                continue;
            }
            match self
                .crop_engine
                .check_bounds(buffer.width(), buffer.height(), target)
            {
                Ok(()) => {}
                Err(CropError::OutOfBounds {
                    target,
                    width,
                    height,
                }) => {
                    return Err(BatchError::BoundsViolation {
                        path: item.path.clone(),
                        target,
                        width,
                        height,
                    })
                }
                Err(e) => return Err(e.into()),
            }
        }
        Ok(())
    }

    fn crop_item(&self, item: &mut BatchItem, target: &Rect) -> Result<(), ItemFailure> {
        let Some(buffer) = item.buffer.take() else {
            return Ok(());
        };

        if self
            .crop_engine
            .is_at_target(buffer.width(), buffer.height(), target)
        {
            log::debug!("{}: already at target, skipping", item.path.display());
            return Ok(());
        }

        let cropped = self
            .crop_engine
            .crop(buffer, target)
            .map_err(|e| ItemFailure::new(FailureKind::Crop, e.to_string()))?;
        let written = self
            .encoder
            .encode(&cropped, &item.path)
            .map_err(|e| ItemFailure::new(FailureKind::Encode, e.to_string()))?;

        item.bytes_after = Some(written);
        item.outcome = ItemOutcome::Processed;
        Ok(())
    }

    fn compress_item(&self, item: &mut BatchItem) -> Result<(), ItemFailure> {
        let size = CompressionFormat::from_path(&item.path)
            .and_then(|format| self.compressor.compress(&item.path, format))
            .map_err(|e| compress_failure(&item.path, e))?;

        item.bytes_after = Some(size);
        item.outcome = ItemOutcome::Processed;
        Ok(())
    }
}

fn compress_failure(path: &Path, err: CompressError) -> ItemFailure {
    match err {
        CompressError::UnsupportedFormat(format) => ItemFailure::new(
            FailureKind::UnsupportedFormat,
            format!("cannot compress {} ({format})", path.display()),
        ),
        other => ItemFailure::new(FailureKind::Compress, other.to_string()),
    }
}

fn timing(stage: &str, since: Instant) -> StageTiming {
    StageTiming {
        stage: stage.to_string(),
        duration_ms: since.elapsed().as_secs_f64() * 1000.0,
    }
}
