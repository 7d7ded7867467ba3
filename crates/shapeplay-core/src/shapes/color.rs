//! RGB colors and hex conversion.

use peniko::Color;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Color conversion errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ColorError {
    #[error("Expected 6 hex digits, got {0:?}")]
    Length(String),
    #[error("Invalid hex digit in {0:?}")]
    Digit(String),
}

/// An opaque RGB triple.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    pub const fn blue() -> Self {
        Self::new(0, 0, 255)
    }

    pub const fn green() -> Self {
        Self::new(0, 255, 0)
    }

    /// Format as lowercase `#rrggbb`.
    pub fn to_hex(self) -> String {
        rgb_to_hex(self)
    }
}

impl From<Rgb> for Color {
    fn from(rgb: Rgb) -> Self {
        Color::from_rgba8(rgb.r, rgb.g, rgb.b, 255)
    }
}

impl From<(u8, u8, u8)> for Rgb {
    fn from((r, g, b): (u8, u8, u8)) -> Self {
        Self::new(r, g, b)
    }
}

/// Parse `#rrggbb` (the `#` is optional, digits are case-insensitive).
pub fn hex_to_rgb(hex: &str) -> Result<Rgb, ColorError> {
    let digits = hex.strip_prefix('#').unwrap_or(hex);
    if digits.len() != 6 {
        return Err(ColorError::Length(hex.to_string()));
    }
    // from_str_radix tolerates a leading '+', so check digits up front
    if !digits.bytes().all(|b| b.is_ascii_hexdigit()) {
        return Err(ColorError::Digit(hex.to_string()));
    }
    let channel = |i: usize| {
        u8::from_str_radix(&digits[i..i + 2], 16).map_err(|_| ColorError::Digit(hex.to_string()))
    };
    Ok(Rgb::new(channel(0)?, channel(2)?, channel(4)?))
}

/// Format a color as lowercase `#rrggbb`.
pub fn rgb_to_hex(rgb: Rgb) -> String {
    format!("#{:02x}{:02x}{:02x}", rgb.r, rgb.g, rgb.b)
}

/// Shape color as assigned by the user or a script.
///
/// Hex strings are accepted as-is and normalized to a triple on first draw.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ShapeColor {
    Rgb(Rgb),
    Hex(String),
}

impl ShapeColor {
    /// Resolve to a triple without modifying the stored value.
    pub fn resolve(&self) -> Result<Rgb, ColorError> {
        match self {
            ShapeColor::Rgb(rgb) => Ok(*rgb),
            ShapeColor::Hex(hex) => hex_to_rgb(hex),
        }
    }

    /// Replace a hex string with its triple. The stored value is left
    /// untouched on failure.
    pub fn normalize(&mut self) -> Result<Rgb, ColorError> {
        let rgb = self.resolve()?;
        *self = ShapeColor::Rgb(rgb);
        Ok(rgb)
    }

    pub fn is_normalized(&self) -> bool {
        matches!(self, ShapeColor::Rgb(_))
    }
}

impl From<Rgb> for ShapeColor {
    fn from(rgb: Rgb) -> Self {
        ShapeColor::Rgb(rgb)
    }
}
