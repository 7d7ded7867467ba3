//! Runtime configuration.

use crate::shapes::{Rgb, ShapeKind};
use kurbo::{Point, Size, Vec2};
use std::time::Duration;

/// Default frame rate of the render tick.
pub const DEFAULT_TICK_RATE_HZ: u32 = 60;
/// Default offset applied to pasted objects.
pub const DEFAULT_PASTE_OFFSET: Vec2 = Vec2::new(5.0, 5.0);

/// Sandbox limits for script execution.
///
/// `max_operations` is the only bound on execution time: a script that
/// exceeds it fails with a runtime error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScriptLimits {
    pub max_operations: u64,
    pub max_call_levels: usize,
    pub max_expr_depth: usize,
    pub max_string_size: usize,
    pub max_array_size: usize,
    pub max_map_size: usize,
}

impl Default for ScriptLimits {
    fn default() -> Self {
        Self {
            max_operations: 500_000,
            max_call_levels: 64,
            max_expr_depth: 64,
            max_string_size: 10_000,
            max_array_size: 1_000,
            max_map_size: 500,
        }
    }
}

/// Geometry and color used by the "add object" command for one kind.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ShapePreset {
    pub size: Size,
    pub color: Rgb,
    /// Added to the pointer position to get the top-left corner.
    pub anchor_offset: Vec2,
}

impl ShapePreset {
    pub fn for_kind(kind: ShapeKind) -> Self {
        match kind {
            ShapeKind::Square => Self {
                size: Size::new(50.0, 50.0),
                color: Rgb::blue(),
                anchor_offset: Vec2::new(-25.0, -25.0),
            },
            ShapeKind::Circle => Self {
                size: Size::new(50.0, 50.0),
                color: Rgb::green(),
                anchor_offset: Vec2::ZERO,
            },
            ShapeKind::Text => Self {
                size: Size::new(100.0, 25.0),
                color: Rgb::green(),
                anchor_offset: Vec2::ZERO,
            },
        }
    }

    pub fn origin(&self, pointer: Point) -> Point {
        pointer + self.anchor_offset
    }
}

/// Scene runtime configuration.
#[derive(Debug, Clone)]
pub struct RuntimeConfig {
    pub tick_rate_hz: u32,
    pub paste_offset: Vec2,
    pub square: ShapePreset,
    pub circle: ShapePreset,
    pub text: ShapePreset,
    pub script_limits: ScriptLimits,
    /// Call each script's `on_tick(dt)` every tick while playing.
    pub tick_hook: bool,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            tick_rate_hz: DEFAULT_TICK_RATE_HZ,
            paste_offset: DEFAULT_PASTE_OFFSET,
            square: ShapePreset::for_kind(ShapeKind::Square),
            circle: ShapePreset::for_kind(ShapeKind::Circle),
            text: ShapePreset::for_kind(ShapeKind::Text),
            script_limits: ScriptLimits::default(),
            tick_hook: false,
        }
    }
}

impl RuntimeConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_tick_hook(mut self, enabled: bool) -> Self {
        self.tick_hook = enabled;
        self
    }

    pub fn with_tick_rate(mut self, hz: u32) -> Self {
        self.tick_rate_hz = hz.max(1);
        self
    }

    pub fn with_paste_offset(mut self, offset: Vec2) -> Self {
        self.paste_offset = offset;
        self
    }

    pub fn with_script_limits(mut self, limits: ScriptLimits) -> Self {
        self.script_limits = limits;
        self
    }

    pub fn preset(&self, kind: ShapeKind) -> &ShapePreset {
        match kind {
            ShapeKind::Square => &self.square,
            ShapeKind::Circle => &self.circle,
            ShapeKind::Text => &self.text,
        }
    }

    /// Time between ticks.
    pub fn tick_interval(&self) -> Duration {
        Duration::from_secs_f64(1.0 / f64::from(self.tick_rate_hz.max(1)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = RuntimeConfig::default();
        assert_eq!(config.tick_rate_hz, 60);
        assert!(!config.tick_hook);
        assert_eq!(config.preset(ShapeKind::Square).origin(Point::new(100.0, 100.0)), Point::new(75.0, 75.0));
        assert_eq!(config.preset(ShapeKind::Text).size, Size::new(100.0, 25.0));
    }

    #[test]
    fn test_tick_interval() {
        let config = RuntimeConfig::new().with_tick_rate(50);
        assert_eq!(config.tick_interval(), Duration::from_millis(20));
        assert_eq!(RuntimeConfig::new().with_tick_rate(0).tick_rate_hz, 1);
    }
}
