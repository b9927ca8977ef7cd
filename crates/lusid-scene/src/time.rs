//! Time units — alias resolution and conversion to seconds
//!
//! Scene frames carry timestamps in the scene's declared unit. Consumers that
//! need wall-clock time (the transcoder, duration queries) convert through
//! [`TimeUnit::to_seconds`]. Unit/sample-rate consistency is only checked here,
//! never when a scene is constructed.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{SceneError, SceneResult};

/// Canonical time unit of a scene
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimeUnit {
    #[default]
    Seconds,
    Milliseconds,
    Samples,
}

impl TimeUnit {
    /// Canonical string written to JSON
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Seconds => "seconds",
            Self::Milliseconds => "milliseconds",
            Self::Samples => "samples",
        }
    }

    /// Convert a timestamp in this unit to seconds.
    ///
    /// `samples` requires a positive sample rate; any other unit ignores it.
    pub fn to_seconds(&self, value: f64, sample_rate: Option<u32>) -> SceneResult<f64> {
        match self {
            Self::Seconds => Ok(value),
            Self::Milliseconds => Ok(value * 0.001),
            Self::Samples => match sample_rate {
                Some(rate) if rate > 0 => Ok(value / f64::from(rate)),
                _ => Err(SceneError::TimeConversion {
                    value,
                    unit: *self,
                    reason: "sampleRate required when timeUnit is 'samples'",
                }),
            },
        }
    }
}

impl fmt::Display for TimeUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TimeUnit {
    type Err = SceneError;

    /// Resolve the alias table, ignoring case and surrounding whitespace
    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "seconds" | "s" => Ok(Self::Seconds),
            "samples" | "samp" => Ok(Self::Samples),
            "milliseconds" | "ms" => Ok(Self::Milliseconds),
            _ => Err(SceneError::UnknownTimeUnit(raw.to_string())),
        }
    }
}

/// Convert `value` expressed in `unit` to seconds
pub fn time_to_seconds(value: f64, unit: TimeUnit, sample_rate: Option<u32>) -> SceneResult<f64> {
    unit.to_seconds(value, sample_rate)
}

/// Round to 6 decimal places (microsecond / micro-unit precision used on output)
pub fn round6(value: f64) -> f64 {
    (value * 1_000_000.0).round() / 1_000_000.0
}
