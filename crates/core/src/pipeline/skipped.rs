use std::path::PathBuf;

use thiserror::Error;

/// Why an image produced no output.
///
/// `NoSubjectDetected` is a deliberate skip; every other variant is a
/// per-image failure. Neither kind is fatal to a run.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum Skipped {
    #[error("no subject detected")]
    NoSubjectDetected,
    #[error("failed to decode {path}: {reason}")]
    DecodeFailed { path: PathBuf, reason: String },
    #[error("detector failed: {0}")]
    DetectorFailed(String),
    #[error("failed to write {path}: {reason}")]
    WriteFailed { path: PathBuf, reason: String },
    #[error("worker thread panicked before finishing this image")]
    WorkerPanicked,
}

impl Skipped {
    /// `true` for deliberate skips, `false` for failures.
    pub fn is_skip(&self) -> bool {
        matches!(self, Self::NoSubjectDetected)
    }

    /// Stable machine-readable reason code.
    pub fn code(&self) -> &'static str {
        match self {
            Self::NoSubjectDetected => "no_subject_detected",
            Self::DecodeFailed { .. } => "decode_failed",
            Self::DetectorFailed(_) => "detector_failed",
            Self::WriteFailed { .. } => "write_failed",
            Self::WorkerPanicked => "worker_panicked",
        }
    }
}
