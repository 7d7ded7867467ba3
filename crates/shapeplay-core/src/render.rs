//! Renderer collaborator.
//!
//! The runtime only ever hands a renderer the shape fields; selection and
//! script state never reach it.

use crate::shapes::{Rgb, Shape, ShapeColor, ShapeKind};
use kurbo::{BezPath, Point};
use peniko::Color;
use thiserror::Error;

/// Renderer errors.
#[derive(Debug, Error)]
pub enum RenderError {
    #[error("Shape color is not normalized: {0:?}")]
    UnresolvedColor(ShapeColor),
    #[error("Render failed: {0}")]
    RenderFailed(String),
}

/// Result type for renderer operations.
pub type RenderResult<T> = Result<T, RenderError>;

/// Draws shapes onto some surface.
pub trait Renderer {
    /// Called once per tick before any `draw`.
    fn begin_frame(&mut self) {}

    /// Draw one shape. The runtime normalizes the color first.
    fn draw(&mut self, shape: &Shape) -> RenderResult<()>;
}

/// What a draw command paints.
#[derive(Debug, Clone, PartialEq)]
pub enum DrawContent {
    /// Filled outline.
    Fill,
    /// A run of text anchored at the shape's top-left corner.
    Text {
        text: String,
        font_size: u32,
        origin: Point,
    },
}

/// One recorded draw call.
#[derive(Debug, Clone)]
pub struct DrawCommand {
    pub kind: ShapeKind,
    pub path: BezPath,
    pub color: Rgb,
    pub content: DrawContent,
}

impl DrawCommand {
    pub fn paint(&self) -> Color {
        self.color.into()
    }
}

/// Renderer that records draw calls into a list, one frame at a time.
#[derive(Debug, Clone, Default)]
pub struct DisplayList {
    commands: Vec<DrawCommand>,
    frames: u64,
}

impl DisplayList {
    pub fn new() -> Self {
        Self::default()
    }

    /// Commands recorded since the last `begin_frame`.
    pub fn commands(&self) -> &[DrawCommand] {
        &self.commands
    }

    /// Number of frames started.
    pub fn frames(&self) -> u64 {
        self.frames
    }
}

impl Renderer for DisplayList {
    fn begin_frame(&mut self) {
        self.commands.clear();
        self.frames += 1;
    }

    fn draw(&mut self, shape: &Shape) -> RenderResult<()> {
        let ShapeColor::Rgb(color) = &shape.color else {
            return Err(RenderError::UnresolvedColor(shape.color.clone()));
        };
        let content = match shape.kind {
            ShapeKind::Text => DrawContent::Text {
                text: shape.text.clone(),
                font_size: shape.font_size,
                origin: shape.position,
            },
            ShapeKind::Square | ShapeKind::Circle => DrawContent::Fill,
        };
        self.commands.push(DrawCommand {
            kind: shape.kind,
            path: shape.to_path(),
            color: *color,
            content,
        });
        Ok(())
    }
}
