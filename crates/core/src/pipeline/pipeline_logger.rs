use std::collections::{BTreeMap, HashMap};
use std::time::Instant;

/// Cross-cutting logger for batch orchestration events.
///
/// Decouples use cases from specific output mechanisms (stdout, log crate)
/// so each caller can observe batch behavior without changing the
/// orchestration code.
pub trait PipelineLogger: Send {
    /// Report item-level progress.
    fn progress(&mut self, current: usize, total: usize);

    /// Record how long a named stage took for one image.
    fn timing(&mut self, stage: &str, duration_ms: f64);

    /// Count one finished item under `status` (e.g. `cropped`, `failed`).
    fn outcome(&mut self, status: &str);

    /// Log a human-readable status message.
    fn info(&mut self, message: &str);

    /// Emit an end-of-batch summary. Default: no-op.
    fn summary(&self) {}
}

/// Silent logger that discards all events.
///
/// Used for single-image runs and by tests where logger output is
/// irrelevant.
pub struct NullPipelineLogger;

impl PipelineLogger for NullPipelineLogger {
    fn progress(&mut self, _current: usize, _total: usize) {}
    fn timing(&mut self, _stage: &str, _duration_ms: f64) {}
    fn outcome(&mut self, _status: &str) {}
    fn info(&mut self, _message: &str) {}
}

/// CLI-oriented logger that tracks per-stage timing and outcome counts,
/// and provides a summary report when the batch completes.
///
/// Progress output is throttled to every `throttle_items` images
/// to keep large batches readable.
pub struct StdoutPipelineLogger {
    throttle_items: usize,
    timings: HashMap<String, Vec<f64>>,
    outcomes: BTreeMap<String, usize>,
    start_time: Instant,
    total_items: usize,
    messages: Vec<String>,
}

impl StdoutPipelineLogger {
    pub fn new(throttle_items: usize) -> Self {
        Self {
            throttle_items: throttle_items.max(1),
            timings: HashMap::new(),
            outcomes: BTreeMap::new(),
            start_time: Instant::now(),
            total_items: 0,
            messages: Vec::new(),
        }
    }

    /// Returns the formatted summary string, or `None` if no data recorded.
    pub fn summary_string(&self) -> Option<String> {
        if self.timings.is_empty() && self.outcomes.is_empty() {
            return None;
        }

        let elapsed_ms = self.start_time.elapsed().as_secs_f64() * 1000.0;
        let items = self.total_items;
        let mut lines = Vec::new();

        lines.push(format!(
            "Batch summary ({items} images, {:.1}s total):",
            elapsed_ms / 1000.0
        ));

        if !self.outcomes.is_empty() {
            let counts: Vec<String> = self
                .outcomes
                .iter()
                .map(|(status, n)| format!("{status} {n}"))
                .collect();
            lines.push(format!("  Outcomes: {}", counts.join(", ")));
        }

        let mut stages: Vec<_> = self.timings.keys().collect();
        stages.sort();
        for stage in stages {
            let durations = &self.timings[stage];
            let total_ms: f64 = durations.iter().sum();
            let avg_ms = if durations.is_empty() {
                0.0
            } else {
                total_ms / durations.len() as f64
            };
            lines.push(format!(
                "  {stage:8}: avg {avg_ms:7.1}ms  total {total_ms:8.0}ms"
            ));
        }

        if items > 0 && elapsed_ms > 0.0 {
            let rate = items as f64 / (elapsed_ms / 1000.0);
            lines.push(format!("  Throughput: {rate:.2} images/s"));
        }

        Some(lines.join("\n"))
    }

    /// Returns the timing data for a given stage.
    pub fn timings_for(&self, stage: &str) -> Option<&[f64]> {
        self.timings.get(stage).map(|v| v.as_slice())
    }

    /// Number of items recorded under `status`.
    pub fn outcome_count(&self, status: &str) -> usize {
        self.outcomes.get(status).copied().unwrap_or(0)
    }
}

impl Default for StdoutPipelineLogger {
    fn default() -> Self {
        Self::new(10)
    }
}

impl PipelineLogger for StdoutPipelineLogger {
    fn progress(&mut self, current: usize, total: usize) {
        self.total_items = total;
        if total > 0 && (current % self.throttle_items == 0 || current == total) {
            let pct = current as f64 / total as f64 * 100.0;
            log::info!("Processing: {current}/{total} images ({pct:.1}%)");
        }
    }

    fn timing(&mut self, stage: &str, duration_ms: f64) {
        self.timings
            .entry(stage.to_string())
            .or_default()
            .push(duration_ms);
    }

    fn outcome(&mut self, status: &str) {
        *self.outcomes.entry(status.to_string()).or_default() += 1;
    }

    fn info(&mut self, message: &str) {
        self.messages.push(message.to_string());
        log::info!("{message}");
    }

    fn summary(&self) {
        if let Some(text) = self.summary_string() {
            log::info!("\n\n{text}");
        }
    }
}
