use serde::{Deserialize, Serialize};

/// Stylistic vertical bias applied to the padded subject box.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FocusMode {
    /// Whole subject, no vertical bias.
    #[default]
    Full,
    /// Keeps the torso-and-above fraction of the box.
    Upper,
    /// Shifts the window downward while keeping the head in frame.
    Lower,
}

impl FocusMode {
    pub const ALL: &[FocusMode] = &[FocusMode::Full, FocusMode::Upper, FocusMode::Lower];
}

impl std::str::FromStr for FocusMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "full" => Ok(Self::Full),
            "upper" => Ok(Self::Upper),
            "lower" => Ok(Self::Lower),
            other => Err(format!(
                "Focus must be one of: full, upper, lower, got '{other}'"
            )),
        }
    }
}

impl std::fmt::Display for FocusMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FocusMode::Full => write!(f, "full"),
            FocusMode::Upper => write!(f, "upper"),
            FocusMode::Lower => write!(f, "lower"),
        }
    }
}
