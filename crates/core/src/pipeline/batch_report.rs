use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use super::batch_executor::{BatchJob, ItemResult};

/// Terminal state of one batch item.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ItemStatus {
    /// Output written.
    Cropped,
    /// Dry run: geometry computed, nothing written.
    Planned,
    /// Deliberately skipped (no subject).
    Skipped,
    /// Decode, detector or write failure.
    Failed,
}

impl ItemStatus {
    pub fn of(result: &ItemResult) -> Self {
        match result {
            Ok(outcome) if outcome.written.is_some() => Self::Cropped,
            Ok(_) => Self::Planned,
            Err(e) if e.is_skip() => Self::Skipped,
            Err(_) => Self::Failed,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Cropped => "cropped",
            Self::Planned => "planned",
            Self::Skipped => "skipped",
            Self::Failed => "failed",
        }
    }
}

/// Per-item line of a [`BatchReport`].
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ItemReport {
    pub input: PathBuf,
    pub status: ItemStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output: Option<PathBuf>,
    /// Machine-readable reason code for skipped and failed items.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    /// Final crop rectangle `[x1, y1, x2, y2]`; absent for full-image fallback.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub crop_box: Option<[i32; 4]>,
}

impl ItemReport {
    pub fn from_result(input: &Path, result: &ItemResult) -> Self {
        let status = ItemStatus::of(result);
        match result {
            Ok(outcome) => Self {
                input: input.to_path_buf(),
                status,
                output: outcome.written.clone(),
                code: None,
                reason: None,
                crop_box: outcome.plan.crop_box().map(|b| {
                    let (x1, y1, x2, y2) = b.as_tuple();
                    [x1, y1, x2, y2]
                }),
            },
            Err(e) => Self {
                input: input.to_path_buf(),
                status,
                output: None,
                code: Some(e.code().to_string()),
                reason: Some(e.to_string()),
                crop_box: None,
            },
        }
    }
}

/// Which images succeeded, which were skipped and which failed.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct BatchReport {
    pub cropped: usize,
    pub planned: usize,
    pub skipped: usize,
    pub failed: usize,
    pub items: Vec<ItemReport>,
}

impl BatchReport {
    /// Pairs each job with its result; both slices are in input order.
    pub fn from_results(jobs: &[BatchJob], results: &[ItemResult]) -> Self {
        let mut report = Self::default();
        for (job, result) in jobs.iter().zip(results) {
            let item = ItemReport::from_result(&job.input, result);
            match item.status {
                ItemStatus::Cropped => report.cropped += 1,
                ItemStatus::Planned => report.planned += 1,
                ItemStatus::Skipped => report.skipped += 1,
                ItemStatus::Failed => report.failed += 1,
            }
            report.items.push(item);
        }
        report
    }

    pub fn total(&self) -> usize {
        self.items.len()
    }

    /// `true` when there was at least one item and none of them succeeded
    /// or were deliberately skipped.
    pub fn all_failed(&self) -> bool {
        self.total() > 0 && self.failed == self.total()
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }

    /// Writes the report as pretty JSON, creating parent directories.
    pub fn write_json(&self, path: &Path) -> Result<(), Box<dyn std::error::Error>> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, self.to_json()?)?;
        Ok(())
    }
}
