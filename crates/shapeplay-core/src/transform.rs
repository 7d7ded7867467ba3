//! Pointer-drag translation of the current selection.

use crate::object::SceneObject;
use crate::selection::SelectionModel;
use kurbo::{Point, Vec2};

/// Turns consecutive pointer samples into position deltas.
#[derive(Debug, Clone, Default)]
pub struct TransformController {
    last_pointer: Option<Point>,
}

impl TransformController {
    pub fn new() -> Self {
        Self::default()
    }

    /// Anchor a drag at the pointer-press position.
    pub fn begin(&mut self, at: Point) {
        self.last_pointer = Some(at);
    }

    /// Continue a drag.
    ///
    /// Applies the delta since the previous sample to every selected object,
    /// in selection order, and returns it. Does nothing (and keeps the anchor)
    /// when no drag is active or the selection is empty.
    pub fn drag_to(&mut self, at: Point, selection: &SelectionModel, objects: &mut [SceneObject]) -> Option<Vec2> {
        let last = self.last_pointer?;
        if selection.is_empty() {
            return None;
        }
        let delta = at - last;
        for &id in selection.ids() {
            if let Some(obj) = objects.iter_mut().find(|obj| obj.id() == id) {
                obj.shape.translate(delta);
            }
        }
        self.last_pointer = Some(at);
        Some(delta)
    }

    /// End the drag (button released or no longer held).
    pub fn release(&mut self) {
        self.last_pointer = None;
    }

    pub fn is_dragging(&self) -> bool {
        self.last_pointer.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shapes::{Rgb, ShapeKind};
    use kurbo::Size;

    fn scene() -> Vec<SceneObject> {
        [(0.0, 0.0), (100.0, 0.0), (200.0, 0.0)]
            .into_iter()
            .map(|(x, y)| SceneObject::new_shape(ShapeKind::Square, Point::new(x, y), Size::new(50.0, 50.0), Rgb::blue()))
            .collect()
    }

    #[test]
    fn test_drag_moves_selected_only() {
        let mut objects = scene();
        let mut selection = SelectionModel::new();
        let ids = [objects[0].id(), objects[2].id()];
        selection.extend(&mut objects, &ids);

        let mut transform = TransformController::new();
        transform.begin(Point::new(10.0, 10.0));
        let delta = transform.drag_to(Point::new(15.0, 7.0), &selection, &mut objects);

        assert_eq!(delta, Some(Vec2::new(5.0, -3.0)));
        assert_eq!(objects[0].shape.position, Point::new(5.0, -3.0));
        assert_eq!(objects[1].shape.position, Point::new(100.0, 0.0));
        assert_eq!(objects[2].shape.position, Point::new(205.0, -3.0));
    }

    #[test]
    fn test_consecutive_samples() {
        let mut objects = scene();
        let mut selection = SelectionModel::new();
        let id = objects[1].id();
        selection.select_only(&mut objects, id);

        let mut transform = TransformController::new();
        transform.begin(Point::ZERO);
        transform.drag_to(Point::new(1.0, 1.0), &selection, &mut objects);
        transform.drag_to(Point::new(4.0, -1.0), &selection, &mut objects);

        assert_eq!(objects[1].shape.position, Point::new(104.0, -1.0));
    }

    #[test]
    fn test_no_clamping() {
        let mut objects = scene();
        let mut selection = SelectionModel::new();
        let id = objects[0].id();
        selection.select_only(&mut objects, id);

        let mut transform = TransformController::new();
        transform.begin(Point::ZERO);
        transform.drag_to(Point::new(-5000.0, -5000.0), &selection, &mut objects);
        assert_eq!(objects[0].shape.position, Point::new(-5000.0, -5000.0));
    }

    #[test]
    fn test_release_stops_drag() {
        let mut objects = scene();
        let mut selection = SelectionModel::new();
        let id = objects[0].id();
        selection.select_only(&mut objects, id);

        let mut transform = TransformController::new();
        transform.begin(Point::ZERO);
        transform.release();
        assert!(!transform.is_dragging());
        assert_eq!(transform.drag_to(Point::new(9.0, 9.0), &selection, &mut objects), None);
        assert_eq!(objects[0].shape.position, Point::ZERO);
    }

    #[test]
    fn test_empty_selection() {
        let mut objects = scene();
        let selection = SelectionModel::new();
        let mut transform = TransformController::new();
        transform.begin(Point::ZERO);
        assert_eq!(transform.drag_to(Point::new(9.0, 9.0), &selection, &mut objects), None);
        assert!(transform.is_dragging());
    }
}
