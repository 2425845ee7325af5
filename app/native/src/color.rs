//! Color math used to rank candidate images.
//!
//! Provides the [`Color`] value type, the average color of a decoded pixel
//! buffer, and the 4-channel Euclidean distance used as the match metric.

use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

use image::RgbaImage;
use regex::Regex;
use serde::Serialize;

/// Largest possible distance between two colors: `sqrt(4 * 255²)`.
pub const MAX_DISTANCE: f64 = 510.0;

/// Accepted target color syntax: `rrggbb` or `#rrggbb`.
static COLOR_RGX: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new("^#?[0-9a-fA-F]{6}$").ok());

/// A non-premultiplied RGBA color with 8 bits per channel.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Color {
    #[must_use]
    pub const fn new(r: u8, g: u8, b: u8, a: u8) -> Self { Self { r, g, b, a } }

    /// Creates a fully opaque color.
    #[must_use]
    pub const fn opaque(r: u8, g: u8, b: u8) -> Self { Self::new(r, g, b, 0xff) }

    /// Formats the color as `#rrggbb`, appending `aa` only when not opaque.
    #[must_use]
    pub fn to_hex(self) -> String {
        let mut hex = format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b);
        if self.a != 0xff {
            hex.push_str(&format!("{:02x}", self.a));
        }
        hex
    }

    /// Euclidean distance to `other` over the (R, G, B, A) tuple.
    #[must_use]
    pub fn distance(self, other: Self) -> f64 { distance(self, other) }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(&self.to_hex()) }
}

/// Error returned when a target color string cannot be parsed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ColorParseError {
    /// The string is empty.
    Empty,
    /// The string does not match `rrggbb` or `#rrggbb`.
    Format(String),
}

impl fmt::Display for ColorParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Empty => write!(f, "color is not specified"),
            Self::Format(s) => {
                write!(f, "color '{s}' is in wrong format, expected 'rrggbb' or '#rrggbb'")
            }
        }
    }
}

impl std::error::Error for ColorParseError {}

impl FromStr for Color {
    type Err = ColorParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() {
            return Err(ColorParseError::Empty);
        }

        let matches = COLOR_RGX.as_ref().is_some_and(|rgx| rgx.is_match(s));
        if !matches {
            return Err(ColorParseError::Format(s.to_string()));
        }

        let hex = s.strip_prefix('#').unwrap_or(s);
        let channel = |range: std::ops::Range<usize>| {
            u8::from_str_radix(&hex[range], 16).map_err(|_| ColorParseError::Format(s.to_string()))
        };

        Ok(Self::opaque(channel(0..2)?, channel(2..4)?, channel(4..6)?))
    }
}

/// Euclidean distance between two colors over all four channels.
///
/// Symmetric, zero only for identical colors, at most [`MAX_DISTANCE`].
#[must_use]
pub fn distance(a: Color, b: Color) -> f64 {
    let d = |x: u8, y: u8| {
        let diff = f64::from(x) - f64::from(y);
        diff * diff
    };
    (d(a.r, b.r) + d(a.g, b.g) + d(a.b, b.b) + d(a.a, b.a)).sqrt()
}

/// Arithmetic mean of every channel across all pixels, truncated to `u8`.
///
/// An image without pixels averages to transparent black.
#[must_use]
#[allow(clippy::cast_possible_truncation)]
pub fn average_color(pixels: &RgbaImage) -> Color {
    let count = u64::from(pixels.width()) * u64::from(pixels.height());
    if count == 0 {
        return Color::default();
    }

    let mut sums = [0u64; 4];
    for pixel in pixels.pixels() {
        for (sum, channel) in sums.iter_mut().zip(pixel.0) {
            *sum += u64::from(channel);
        }
    }

    // Each mean is bounded by 255, so the narrowing is lossless.
    let mean = |sum: u64| (sum / count) as u8;
    Color::new(mean(sums[0]), mean(sums[1]), mean(sums[2]), mean(sums[3]))
}
