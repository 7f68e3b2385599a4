use std::collections::BTreeMap;
use std::path::PathBuf;

use serde::Serialize;

use crate::pipeline::trim_batch_use_case::{BatchMode, TrimConfig};
use crate::shared::rect::Rect;

/// Which per-item step failed.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum FailureKind {
    Decode,
    Crop,
    Encode,
    Compress,
    UnsupportedFormat,
}

impl std::fmt::Display for FailureKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FailureKind::Decode => write!(f, "decode"),
            FailureKind::Crop => write!(f, "crop"),
            FailureKind::Encode => write!(f, "encode"),
            FailureKind::Compress => write!(f, "compress"),
            FailureKind::UnsupportedFormat => write!(f, "unsupported format"),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ItemFailure {
    pub kind: FailureKind,
    pub message: String,
}

impl ItemFailure {
    pub fn new(kind: FailureKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

impl std::fmt::Display for ItemFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} failed: {}", self.kind, self.message)
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "kebab-case")]
pub enum ItemOutcome {
    /// Cropped (and compressed, if requested) and written back.
    Processed,
    /// Decoded fine but left untouched on disk.
    Unchanged,
    Failed(ItemFailure),
}

impl ItemOutcome {
    pub fn is_failed(&self) -> bool {
        matches!(self, ItemOutcome::Failed(_))
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ItemReport {
    pub path: PathBuf,
    pub outcome: ItemOutcome,
    pub bounds: Option<Rect>,
    pub bytes_before: u64,
    pub bytes_after: Option<u64>,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct StageTiming {
    pub stage: String,
    pub duration_ms: f64,
}

/// Outcome of one `TrimBatchUseCase::execute` run.
#[derive(Clone, Debug, Serialize)]
pub struct BatchReport {
    pub config: TrimConfig,
    pub target: Option<Rect>,
    pub items: Vec<ItemReport>,
    pub stages: Vec<StageTiming>,
    pub elapsed_ms: f64,
}

impl BatchReport {
    pub fn total(&self) -> usize {
        self.items.len()
    }

    pub fn failed(&self) -> usize {
        self.items.iter().filter(|i| i.outcome.is_failed()).count()
    }

    pub fn succeeded(&self) -> usize {
        self.total() - self.failed()
    }

    pub fn processed(&self) -> usize {
        self.items
            .iter()
            .filter(|i| i.outcome == ItemOutcome::Processed)
            .count()
    }

    pub fn has_failures(&self) -> bool {
        self.items.iter().any(|i| i.outcome.is_failed())
    }

    /// Failed items grouped by the step that failed.
    pub fn failures_by_kind(&self) -> BTreeMap<FailureKind, Vec<&ItemReport>> {
        let mut groups: BTreeMap<FailureKind, Vec<&ItemReport>> = BTreeMap::new();
        for item in &self.items {
            if let ItemOutcome::Failed(failure) = &item.outcome {
                groups.entry(failure.kind).or_default().push(item);
            }
        }
        groups
    }

    pub fn stage_ms(&self, stage: &str) -> Option<f64> {
        self.stages
            .iter()
            .find(|s| s.stage == stage)
            .map(|s| s.duration_ms)
    }

    /// `bytes_after / bytes_before` over items that went through every pass.
    ///
    /// Only reported when the compression pass ran. Failed items are left
    /// out even when an earlier pass already wrote them.
    pub fn size_ratio(&self) -> Option<f64> {
        if self.config.mode != BatchMode::CropAndCompress {
            return None;
        }
        let (before, after) = self
            .items
            .iter()
            .filter(|i| !i.outcome.is_failed())
            .filter_map(|i| i.bytes_after.map(|after| (i.bytes_before, after)))
            .fold((0u64, 0u64), |(b, a), (ib, ia)| (b + ib, a + ia));
        if before == 0 {
            return None;
        }
        Some(after as f64 / before as f64)
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    pub fn summary_string(&self) -> String {
        let total = self.total();
        let mut lines = Vec::new();

        lines.push(format!(
            "Batch summary ({total} images, {:.1}s total, {} mode):",
            self.elapsed_ms / 1000.0,
            self.config.mode
        ));
        lines.push(format!(
            "  Succeeded: {}  Failed: {}",
            self.succeeded(),
            self.failed()
        ));

        match &self.target {
            Some(target) => lines.push(format!(
                "  Target ({} / {}): {target}",
                self.config.algorithm, self.config.policy
            )),
            None => lines.push("  Target: none (nothing to crop)".to_string()),
        }

        for timing in &self.stages {
            let avg_ms = if total == 0 {
                0.0
            } else {
                timing.duration_ms / total as f64
            };
            let pct = if self.elapsed_ms > 0.0 {
                timing.duration_ms / self.elapsed_ms * 100.0
            } else {
                0.0
            };
            lines.push(format!(
                "  {:12}: avg {avg_ms:6.1}ms  total {:7.0}ms  ({pct:4.1}%)",
                timing.stage, timing.duration_ms
            ));
        }

        if total > 0 && self.elapsed_ms > 0.0 {
            let ips = total as f64 / (self.elapsed_ms / 1000.0);
            lines.push(format!("  Throughput: {ips:.1} images/s"));
        }

        if let Some(ratio) = self.size_ratio() {
            lines.push(format!("  Size ratio: {ratio:.3}"));
        }

        for (kind, items) in self.failures_by_kind() {
            lines.push(format!("  {kind} failures ({}):", items.len()));
            for item in items {
                if let ItemOutcome::Failed(failure) = &item.outcome {
                    lines.push(format!("    {}: {}", item.path.display(), failure.message));
                }
            }
        }

        lines.join("\n")
    }
}
