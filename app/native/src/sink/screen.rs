//! Screen resolution used to filter search results and name the images dir.

use std::fmt;
use std::process::Command;
use std::str::FromStr;

use crate::platform::command::resolve_binary;

/// Screen dimensions in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScreenSize {
    pub width: u32,
    pub height: u32,
}

impl ScreenSize {
    /// Used when the resolution is neither configured nor detectable.
    pub const FALLBACK: Self = Self { width: 2560, height: 1440 };

    #[must_use]
    pub const fn new(width: u32, height: u32) -> Self { Self { width, height } }
}

impl fmt::Display for ScreenSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

impl FromStr for ScreenSize {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || format!("invalid resolution '{s}', expected WIDTHxHEIGHT");
        let (width, height) = s.trim().split_once('x').ok_or_else(invalid)?;
        let width: u32 = width.parse().map_err(|_| invalid())?;
        let height: u32 = height.parse().map_err(|_| invalid())?;
        if width == 0 || height == 0 {
            return Err(invalid());
        }
        Ok(Self { width, height })
    }
}

/// Extracts the `dimensions:` value from `xdpyinfo` output.
#[must_use]
pub fn parse_xdpyinfo(output: &str) -> Option<ScreenSize> {
    output
        .lines()
        .find_map(|line| line.trim_start().strip_prefix("dimensions:"))
        .and_then(|rest| rest.split_whitespace().next())
        .and_then(|value| value.parse().ok())
}

/// Asks the X server for the screen size.
#[must_use]
pub fn detect() -> Option<ScreenSize> {
    let program = resolve_binary("xdpyinfo")
        .inspect_err(|err| tracing::debug!(error = %err, "xdpyinfo not available"))
        .ok()?;
    let output = Command::new(program)
        .output()
        .inspect_err(|err| tracing::warn!(error = %err, "failed to run xdpyinfo"))
        .ok()?;
    if !output.status.success() {
        tracing::warn!(status = %output.status, "xdpyinfo failed");
        return None;
    }
    parse_xdpyinfo(&String::from_utf8_lossy(&output.stdout))
}

/// Configured size if any, else the detected one, else [`ScreenSize::FALLBACK`].
#[must_use]
pub fn resolve(configured: Option<ScreenSize>) -> ScreenSize {
    configured.or_else(detect).unwrap_or_else(|| {
        tracing::info!(fallback = %ScreenSize::FALLBACK, "could not detect screen size");
        ScreenSize::FALLBACK
    })
}
