//! Argument types shared by the selection commands.

use std::fmt;
use std::str::FromStr;

use crate::cli::output;
use crate::color::{Color, MAX_DISTANCE};
use crate::error::HuewallError;

/// Maximum accepted color distance. Positive; larger values are clamped to
/// [`MAX_DISTANCE`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Threshold(f64);

impl Threshold {
    #[must_use]
    pub const fn get(self) -> f64 { self.0 }
}

impl FromStr for Threshold {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let value: f64 =
            s.trim().parse().map_err(|_| format!("Invalid threshold '{s}'. Expected a number."))?;
        if !value.is_finite() || value <= 0.0 {
            return Err(format!("Threshold must be positive, got '{s}'."));
        }
        if value > MAX_DISTANCE {
            tracing::warn!(threshold = value, max = MAX_DISTANCE, "threshold clamped to maximum distance");
        }
        Ok(Self(value.min(MAX_DISTANCE)))
    }
}

impl fmt::Display for Threshold {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { write!(f, "{:.2}", self.0) }
}

/// Resolves the random flag and the optional color into a scoring target.
///
/// Returns `None` for random selection. Random wins over a given color.
///
/// # Errors
///
/// Returns an error when neither a color nor the random flag is given.
pub fn resolve_target(random: bool, color: Option<Color>) -> Result<Option<Color>, HuewallError> {
    match (random, color) {
        (true, Some(_)) => {
            tracing::debug!("ignoring color in random mode");
            output::warn(
                "Randomness flag and color are both specified. Randomness flag has higher priority.",
            );
            Ok(None)
        }
        (true, None) => Ok(None),
        (false, Some(color)) => Ok(Some(color)),
        (false, None) => Err(HuewallError::InvalidArguments(
            "Color is not specified. Give it as 'rrggbb' or '#rrggbb', or pass --random."
                .to_string(),
        )),
    }
}
