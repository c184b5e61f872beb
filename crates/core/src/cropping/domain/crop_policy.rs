use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::detection::domain::subject_selector::{SelectionPolicy, DEFAULT_CONFIDENCE_THRESHOLD};

pub const DEFAULT_PADDING_RATIO: f64 = 0.20;
/// Width over height (3:4).
pub const DEFAULT_TARGET_ASPECT: f64 = 3.0 / 4.0;
pub const DEFAULT_UPPER_FRACTION: f64 = 0.70;
pub const DEFAULT_LOWER_SHIFT_FRACTION: f64 = 0.30;
pub const DEFAULT_BORDER_TOLERANCE: u8 = 5;
pub const DEFAULT_OUTPUT_WIDTH: u32 = 750;
pub const DEFAULT_OUTPUT_HEIGHT: u32 = 900;

#[derive(Error, Debug)]
pub enum PolicyError {
    #[error("invalid crop policy: {0}")]
    Invalid(String),
    #[error("failed to read policy file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse policy file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// What happens to an image in which no subject qualifies.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NoSubjectFallback {
    /// Record the image as skipped and produce no output.
    #[default]
    Skip,
    /// Resize the whole image to the canonical size, bypassing padding,
    /// focus, aspect correction and border trimming.
    FullImage,
}

impl std::str::FromStr for NoSubjectFallback {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "skip" => Ok(Self::Skip),
            "full-image" | "full_image" => Ok(Self::FullImage),
            other => Err(format!(
                "Fallback must be 'skip' or 'full-image', got '{other}'"
            )),
        }
    }
}

/// Read-only configuration for one run of the crop engine.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CropPolicy {
    /// Fraction of box height added as margin on every side.
    pub padding_ratio: f64,
    /// Final crop width over height.
    pub target_aspect: f64,
    /// Fraction of padded box height kept from the top in `upper` focus.
    pub upper_fraction: f64,
    /// Fraction of padded box height shifted downward in `lower` focus.
    pub lower_shift_fraction: f64,
    /// Luminance difference from the corner color treated as background.
    pub border_tolerance: u8,
    pub output_width: u32,
    pub output_height: u32,
    /// Fraction trimmed from every edge before the final fit.
    pub bleed: f64,
    pub confidence_threshold: f64,
    pub selection: SelectionPolicy,
    pub fallback: NoSubjectFallback,
}

impl Default for CropPolicy {
    fn default() -> Self {
        Self {
            padding_ratio: DEFAULT_PADDING_RATIO,
            target_aspect: DEFAULT_TARGET_ASPECT,
            upper_fraction: DEFAULT_UPPER_FRACTION,
            lower_shift_fraction: DEFAULT_LOWER_SHIFT_FRACTION,
            border_tolerance: DEFAULT_BORDER_TOLERANCE,
            output_width: DEFAULT_OUTPUT_WIDTH,
            output_height: DEFAULT_OUTPUT_HEIGHT,
            bleed: 0.0,
            confidence_threshold: DEFAULT_CONFIDENCE_THRESHOLD,
            selection: SelectionPolicy::default(),
            fallback: NoSubjectFallback::default(),
        }
    }
}

impl CropPolicy {
    /// Platform config location: `<config_dir>/SubjectCrop/policy.json`.
    pub fn config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|d| d.join("SubjectCrop").join("policy.json"))
    }

    /// Loads and validates a policy from a JSON file. Missing fields take
    /// their defaults.
    pub fn load(path: &Path) -> Result<Self, PolicyError> {
        let json = fs::read_to_string(path).map_err(|e| PolicyError::Read {
            path: path.to_path_buf(),
            source: e,
        })?;
        let policy: Self = serde_json::from_str(&json).map_err(|e| PolicyError::Parse {
            path: path.to_path_buf(),
            source: e,
        })?;
        policy.validate()?;
        Ok(policy)
    }

    /// Explicit path if given, else the platform config file if it exists,
    /// else defaults.
    pub fn resolve(explicit: Option<&Path>) -> Result<Self, PolicyError> {
        if let Some(path) = explicit {
            return Self::load(path);
        }
        match Self::config_path() {
            Some(path) if path.exists() => {
                log::info!("Loading crop policy from {}", path.display());
                Self::load(&path)
            }
            _ => Ok(Self::default()),
        }
    }

    pub fn validate(&self) -> Result<(), PolicyError> {
        if !(0.0..=1.0).contains(&self.padding_ratio) {
            return Err(invalid(format!(
                "padding_ratio must be between 0.0 and 1.0, got {}",
                self.padding_ratio
            )));
        }
        if !(self.target_aspect.is_finite() && self.target_aspect > 0.0) {
            return Err(invalid(format!(
                "target_aspect must be positive, got {}",
                self.target_aspect
            )));
        }
        if !(self.upper_fraction > 0.0 && self.upper_fraction <= 1.0) {
            return Err(invalid(format!(
                "upper_fraction must be in (0.0, 1.0], got {}",
                self.upper_fraction
            )));
        }
        if !(self.lower_shift_fraction > 0.0 && self.lower_shift_fraction <= 1.0) {
            return Err(invalid(format!(
                "lower_shift_fraction must be in (0.0, 1.0], got {}",
                self.lower_shift_fraction
            )));
        }
        if self.output_width == 0 || self.output_height == 0 {
            return Err(invalid(format!(
                "output size must be non-zero, got {}x{}",
                self.output_width, self.output_height
            )));
        }
        if !(0.0..0.5).contains(&self.bleed) {
            return Err(invalid(format!(
                "bleed must be in [0.0, 0.5), got {}",
                self.bleed
            )));
        }
        if !(0.0..=1.0).contains(&self.confidence_threshold) {
            return Err(invalid(format!(
                "confidence_threshold must be between 0.0 and 1.0, got {}",
                self.confidence_threshold
            )));
        }
        Ok(())
    }
}

fn invalid(message: String) -> PolicyError {
    PolicyError::Invalid(message)
}

/// Rounds half away from zero to the nearest integer pixel.
pub(crate) fn round_px(value: f64) -> i32 {
    value.round() as i32
}
