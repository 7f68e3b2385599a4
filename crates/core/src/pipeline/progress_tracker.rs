use std::sync::{Arc, Mutex};

/// Receives `(stage, current, total)` after every tick.
///
/// Invoked outside the tracker's lock, so a slow sink (terminal rendering)
/// never blocks the counter for other workers.
pub type ProgressSink = Arc<dyn Fn(&str, usize, usize) + Send + Sync>;

/// Thread-safe completion counter for one pass over a batch.
pub struct ProgressTracker {
    stage: String,
    total: usize,
    current: Mutex<usize>,
    sink: Option<ProgressSink>,
}

impl ProgressTracker {
    pub fn new(stage: impl Into<String>, total: usize, sink: Option<ProgressSink>) -> Self {
        Self {
            stage: stage.into(),
            total,
            current: Mutex::new(0),
            sink,
        }
    }

    /// Tracker without a sink, for passes nobody is watching.
    pub fn silent(stage: impl Into<String>, total: usize) -> Self {
        Self::new(stage, total, None)
    }

    /// Marks one item done and returns the new count.
    ///
    /// Ticks past `total` saturate at `total`.
    pub fn tick(&self) -> usize {
        let current = {
            let mut guard = self.current.lock().unwrap_or_else(|e| e.into_inner());
            if *guard < self.total {
                *guard += 1;
            }
            *guard
        };
        if let Some(sink) = &self.sink {
            sink(&self.stage, current, self.total);
        }
        current
    }

    pub fn current(&self) -> usize {
        *self.current.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn total(&self) -> usize {
        self.total
    }

    pub fn stage(&self) -> &str {
        &self.stage
    }

    /// Completed fraction in `[0, 1]`. An empty pass counts as complete.
    pub fn fraction(&self) -> f64 {
        if self.total == 0 {
            return 1.0;
        }
        self.current() as f64 / self.total as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn recording_sink() -> (ProgressSink, Arc<Mutex<Vec<(String, usize, usize)>>>) {
        let calls = Arc::new(Mutex::new(Vec::new()));
        let recorder = calls.clone();
        let sink: ProgressSink = Arc::new(move |stage: &str, current: usize, total: usize| {
            recorder
                .lock()
                .unwrap()
                .push((stage.to_string(), current, total));
        });
        (sink, calls)
    }

    #[test]
    fn test_tick_increments_and_notifies() {
        let (sink, calls) = recording_sink();
        let tracker = ProgressTracker::new("crop", 3, Some(sink));
        assert_eq!(tracker.tick(), 1);
        assert_eq!(tracker.tick(), 2);

        let calls = calls.lock().unwrap();
        assert_eq!(
            *calls,
            vec![("crop".to_string(), 1, 3), ("crop".to_string(), 2, 3)]
        );
    }

    #[test]
    fn test_tick_saturates_at_total() {
        let tracker = ProgressTracker::silent("decode", 2);
        tracker.tick();
        tracker.tick();
        assert_eq!(tracker.tick(), 2);
        assert_eq!(tracker.current(), 2);
    }

    #[test]
    fn test_fraction() {
        let tracker = ProgressTracker::silent("decode", 4);
        assert_relative_eq!(tracker.fraction(), 0.0);
        tracker.tick();
        assert_relative_eq!(tracker.fraction(), 0.25);
        assert_relative_eq!(ProgressTracker::silent("x", 0).fraction(), 1.0);
    }

    #[test]
    fn test_concurrent_ticks_are_all_counted() {
        let (sink, calls) = recording_sink();
        let tracker = ProgressTracker::new("compress", 400, Some(sink));
        std::thread::scope(|s| {
            for _ in 0..4 {
                s.spawn(|| {
                    for _ in 0..100 {
                        tracker.tick();
                    }
                });
            }
        });
        assert_eq!(tracker.current(), 400);

        let calls = calls.lock().unwrap();
        assert_eq!(calls.len(), 400);
        let mut seen: Vec<usize> = calls.iter().map(|(_, c, _)| *c).collect();
        seen.sort_unstable();
        assert_eq!(seen, (1..=400).collect::<Vec<_>>());
    }

    #[test]
    fn test_sink_may_read_tracker_without_deadlock() {
        let tracker = Arc::new(Mutex::new(None::<Arc<ProgressTracker>>));
        let observed = Arc::new(Mutex::new(Vec::new()));
        let (slot, out) = (tracker.clone(), observed.clone());
        let sink: ProgressSink = Arc::new(move |_: &str, _: usize, _: usize| {
            if let Some(t) = slot.lock().unwrap().as_ref() {
                out.lock().unwrap().push(t.current());
            }
        });
        let shared = Arc::new(ProgressTracker::new("crop", 2, Some(sink)));
        *tracker.lock().unwrap() = Some(shared.clone());
        shared.tick();
        shared.tick();
        assert_eq!(*observed.lock().unwrap(), vec![1, 2]);
    }
}
