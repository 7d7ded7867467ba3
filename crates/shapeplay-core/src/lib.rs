//! Shapeplay Core Library
//!
//! Scene objects, selection, transforms and the Edit/Play runtime with its
//! sandboxed script bridge. No windowing or rendering backend.

pub mod clipboard;
pub mod config;
pub mod console;
pub mod input;
pub mod object;
pub mod properties;
pub mod render;
pub mod runtime;
pub mod script;
pub mod selection;
pub mod shapes;
pub mod transform;

pub use clipboard::ClipboardBuffer;
pub use config::{RuntimeConfig, ScriptLimits, ShapePreset};
pub use console::{Console, LogConsole, MemoryConsole};
pub use input::{Command, Modifiers, MouseButton, PointerEvent};
pub use object::{ObjectId, SceneObject};
pub use properties::{EditError, PropertyEdit, PropertyView};
pub use render::{DisplayList, DrawCommand, RenderError, Renderer};
pub use runtime::{Mode, RuntimeError, SceneEvent, SceneRuntime};
pub use script::{ScriptBridge, ScriptError, ScriptLocation, ScriptPhase};
pub use selection::SelectionModel;
pub use shapes::{hex_to_rgb, rgb_to_hex, ColorError, Rgb, Shape, ShapeColor, ShapeKind};
pub use transform::TransformController;
