//! Property editor boundary: a read-only view of one object and parsed edits.

use crate::shapes::{hex_to_rgb, ColorError, Shape, ShapeColor, ShapeKind, UnknownShapeKind};
use kurbo::{Point, Size};
use std::fmt;
use thiserror::Error;

/// Title of the alert raised for rejected input.
pub const INPUT_ERROR_TITLE: &str = "Input Error";

/// Errors raised at the property editing boundary.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EditError {
    #[error("Properties can only be edited in edit mode")]
    Playing,
    #[error("No object selected")]
    NoSelection,
    #[error("Invalid value for {field}: {value:?}")]
    InvalidNumber { field: &'static str, value: String },
    #[error("Font size must be at least 1, got {0}")]
    FontSize(String),
    #[error(transparent)]
    Color(#[from] ColorError),
    #[error(transparent)]
    Kind(#[from] UnknownShapeKind),
}

/// Size as shown in the editor: circles are edited by radius.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Extent {
    Size(Size),
    Radius(f64),
}

/// Snapshot of the editable fields of one object.
#[derive(Debug, Clone, PartialEq)]
pub struct PropertyView {
    pub kind: ShapeKind,
    pub position: Point,
    pub extent: Extent,
    /// Text and font size, for text objects only.
    pub text: Option<(String, u32)>,
    pub color: String,
    pub has_script: bool,
}

impl PropertyView {
    pub fn of(shape: &Shape, script: &str) -> Self {
        let extent = match shape.kind {
            ShapeKind::Circle => Extent::Radius(shape.radius()),
            ShapeKind::Square | ShapeKind::Text => Extent::Size(shape.size),
        };
        let text = (shape.kind == ShapeKind::Text).then(|| (shape.text.clone(), shape.font_size));
        let color = match &shape.color {
            ShapeColor::Rgb(rgb) => rgb.to_hex(),
            ShapeColor::Hex(hex) => hex.clone(),
        };
        Self {
            kind: shape.kind,
            position: shape.position,
            extent,
            text,
            color,
            has_script: !script.trim().is_empty(),
        }
    }

    /// Label/value pairs in display order.
    pub fn rows(&self) -> Vec<(&'static str, String)> {
        let mut rows = vec![
            ("Shape", self.kind.to_string()),
            ("Position", format!("{}, {}", self.position.x, self.position.y)),
        ];
        match self.extent {
            Extent::Size(size) => rows.push(("Size", format!("{}, {}", size.width, size.height))),
            Extent::Radius(r) => rows.push(("Radius", r.to_string())),
        }
        if let Some((text, font_size)) = &self.text {
            rows.push(("Font Size", font_size.to_string()));
            rows.push(("Text", text.clone()));
        }
        rows.push(("Color", self.color.clone()));
        rows.push(("Script", if self.has_script { "Edit Script" } else { "Add Script" }.to_string()));
        rows
    }
}

impl fmt::Display for PropertyView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (label, value) in self.rows() {
            writeln!(f, "{label}: {value}")?;
        }
        Ok(())
    }
}

/// A single field update with the raw strings the user typed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PropertyEdit {
    Position(String, String),
    Size(String, String),
    Color(String),
    FontSize(String),
    Text(String),
    Kind(String),
}

impl PropertyEdit {
    /// Parse and apply the edit. On error the shape is left untouched.
    pub fn apply(&self, shape: &mut Shape) -> Result<(), EditError> {
        match self {
            PropertyEdit::Position(x, y) => {
                shape.position = Point::new(parse_number("x", x)?, parse_number("y", y)?);
            }
            PropertyEdit::Size(w, h) => {
                shape.size = Size::new(parse_number("width", w)?, parse_number("height", h)?);
            }
            PropertyEdit::Color(hex) => {
                shape.color = ShapeColor::Rgb(hex_to_rgb(hex)?);
            }
            PropertyEdit::FontSize(n) => {
                let size = n
                    .trim()
                    .parse::<u32>()
                    .ok()
                    .filter(|&size| size >= 1)
                    .ok_or_else(|| EditError::FontSize(n.clone()))?;
                shape.font_size = size;
            }
            PropertyEdit::Text(text) => shape.text = text.clone(),
            PropertyEdit::Kind(kind) => shape.kind = kind.parse()?,
        }
        Ok(())
    }
}

fn parse_number(field: &'static str, value: &str) -> Result<f64, EditError> {
    value
        .trim()
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
        .ok_or_else(|| EditError::InvalidNumber {
            field,
            value: value.to_string(),
        })
}
