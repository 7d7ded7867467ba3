//! Scene objects: a shape plus its script, selection flag and identity.

use crate::shapes::{Shape, ShapeColor, ShapeKind};
use kurbo::{Point, Size};
use serde_json::Value;
use std::collections::BTreeMap;
use uuid::Uuid;

/// Unique identifier for scene objects.
pub type ObjectId = Uuid;

/// An identity-bearing wrapper around a [`Shape`].
///
/// `Clone` keeps the identity (used for play snapshots); [`SceneObject::copy`]
/// mints a new one.
#[derive(Debug, Clone, PartialEq)]
pub struct SceneObject {
    id: ObjectId,
    pub shape: Shape,
    /// Script source, run when the scene enters play mode.
    pub script: String,
    /// Only ever changed through [`crate::selection::SelectionModel`].
    pub(crate) selected: bool,
    /// Fields added by scripts. Opaque to the rest of the runtime.
    pub extras: BTreeMap<String, Value>,
}

impl SceneObject {
    /// Wrap an existing shape.
    pub fn new(shape: Shape) -> Self {
        Self {
            id: Uuid::new_v4(),
            shape,
            script: String::new(),
            selected: false,
            extras: BTreeMap::new(),
        }
    }

    /// Factory for a fresh object of the given kind.
    pub fn new_shape(kind: ShapeKind, position: Point, size: Size, color: impl Into<ShapeColor>) -> Self {
        Self::new(Shape::new(kind, position, size, color))
    }

    /// Builder-style script assignment.
    pub fn with_script(mut self, script: impl Into<String>) -> Self {
        self.script = script.into();
        self
    }

    pub fn id(&self) -> ObjectId {
        self.id
    }

    pub fn is_selected(&self) -> bool {
        self.selected
    }

    /// Duplicate with identical fields, a fresh identity and no selection.
    pub fn copy(&self) -> Self {
        Self {
            id: Uuid::new_v4(),
            shape: self.shape.clone(),
            script: self.script.clone(),
            selected: false,
            extras: self.extras.clone(),
        }
    }

    /// Compare everything except identity and selection.
    pub fn same_fields(&self, other: &SceneObject) -> bool {
        self.shape == other.shape && self.script == other.script && self.extras == other.extras
    }

    pub fn hit_test(&self, point: Point) -> bool {
        self.shape.contains(point)
    }
}

/// Check two object lists for field-wise equality, in order.
pub fn same_scene(a: &[SceneObject], b: &[SceneObject]) -> bool {
    a.len() == b.len() && a.iter().zip(b).all(|(x, y)| x.same_fields(y))
}
