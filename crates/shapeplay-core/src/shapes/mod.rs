//! Shape definitions for placed scene entities.

mod color;

pub use color::{hex_to_rgb, rgb_to_hex, ColorError, Rgb, ShapeColor};

use kurbo::{BezPath, Circle, Point, Rect, Shape as KurboShape, Size, Vec2};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Default font size for text shapes.
pub const DEFAULT_FONT_SIZE: u32 = 32;
/// Default content for text shapes.
pub const DEFAULT_TEXT: &str = "New Text";

/// Returned when a string does not name a shape kind.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Expected one of square/circle/text, got {0:?}")]
pub struct UnknownShapeKind(pub String);

/// The kind of a shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum ShapeKind {
    #[default]
    Square,
    Circle,
    Text,
}

impl ShapeKind {
    /// Lowercase name as exposed to scripts and the property editor.
    pub fn as_str(self) -> &'static str {
        match self {
            ShapeKind::Square => "square",
            ShapeKind::Circle => "circle",
            ShapeKind::Text => "text",
        }
    }

    pub fn all() -> &'static [ShapeKind] {
        &[ShapeKind::Square, ShapeKind::Circle, ShapeKind::Text]
    }
}

impl fmt::Display for ShapeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ShapeKind {
    type Err = UnknownShapeKind;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        ShapeKind::all()
            .iter()
            .copied()
            .find(|kind| kind.as_str().eq_ignore_ascii_case(trimmed))
            .ok_or_else(|| UnknownShapeKind(s.to_string()))
    }
}

/// Geometric and visual attributes of one placed entity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Shape {
    pub kind: ShapeKind,
    /// Top-left corner.
    pub position: Point,
    pub size: Size,
    pub color: ShapeColor,
    /// Only meaningful for text shapes.
    pub text: String,
    /// Only meaningful for text shapes.
    pub font_size: u32,
}

impl Shape {
    /// Create a new shape.
    pub fn new(kind: ShapeKind, position: Point, size: Size, color: impl Into<ShapeColor>) -> Self {
        Self {
            kind,
            position,
            size,
            color: color.into(),
            text: DEFAULT_TEXT.to_string(),
            font_size: DEFAULT_FONT_SIZE,
        }
    }

    /// Circle radius. Always derived from the width, never stored.
    pub fn radius(&self) -> f64 {
        self.size.width / 2.0
    }

    /// Center of a circle (top-left plus radius on both axes).
    pub fn circle_center(&self) -> Point {
        let r = self.radius();
        Point::new(self.position.x + r, self.position.y + r)
    }

    /// Axis-aligned bounding box in scene coordinates.
    pub fn bounds(&self) -> Rect {
        Rect::from_origin_size(self.position, self.size)
    }

    /// Check if a point lies inside the bounding box (edges included).
    pub fn contains(&self, point: Point) -> bool {
        let b = self.bounds();
        point.x >= b.x0 && point.x <= b.x1 && point.y >= b.y0 && point.y <= b.y1
    }

    /// Move by a delta. No clamping is applied.
    pub fn translate(&mut self, delta: Vec2) {
        self.position += delta;
    }

    /// Normalize the stored color, see [`ShapeColor::normalize`].
    pub fn normalize_color(&mut self) -> Result<Rgb, ColorError> {
        self.color.normalize()
    }

    /// Outline path for rendering.
    pub fn to_path(&self) -> BezPath {
        match self.kind {
            ShapeKind::Circle => Circle::new(self.circle_center(), self.radius()).to_path(0.1),
            ShapeKind::Square | ShapeKind::Text => self.bounds().to_path(0.1),
        }
    }
}
