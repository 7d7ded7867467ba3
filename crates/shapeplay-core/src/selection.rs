//! Selection tracking.
//!
//! The ordered id list and each object's `selected` flag are only ever
//! changed together, here.

use crate::object::{ObjectId, SceneObject};

/// Ordered set of selected objects (insertion order is kept so the
/// "first selected" object is well defined).
#[derive(Debug, Clone, Default)]
pub struct SelectionModel {
    selected: Vec<ObjectId>,
}

fn find_mut(objects: &mut [SceneObject], id: ObjectId) -> Option<&mut SceneObject> {
    objects.iter_mut().find(|obj| obj.id() == id)
}

impl SelectionModel {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the selection with a single object.
    /// Returns false (and leaves the selection empty) if `id` is not in `objects`.
    pub fn select_only(&mut self, objects: &mut [SceneObject], id: ObjectId) -> bool {
        self.clear(objects);
        match find_mut(objects, id) {
            Some(obj) => {
                obj.selected = true;
                self.selected.push(id);
                true
            }
            None => false,
        }
    }

    /// Add the object if absent, remove it if present.
    /// Returns whether the object is selected afterwards.
    pub fn toggle(&mut self, objects: &mut [SceneObject], id: ObjectId) -> bool {
        let Some(obj) = find_mut(objects, id) else {
            return false;
        };
        if let Some(pos) = self.selected.iter().position(|&s| s == id) {
            self.selected.remove(pos);
            obj.selected = false;
            false
        } else {
            self.selected.push(id);
            obj.selected = true;
            true
        }
    }

    /// Add several objects, keeping the given order. Unknown ids are skipped.
    pub fn extend(&mut self, objects: &mut [SceneObject], ids: &[ObjectId]) {
        for &id in ids {
            if self.selected.contains(&id) {
                continue;
            }
            if let Some(obj) = find_mut(objects, id) {
                obj.selected = true;
                self.selected.push(id);
            }
        }
    }

    /// Deselect everything.
    pub fn clear(&mut self, objects: &mut [SceneObject]) {
        for id in self.selected.drain(..) {
            if let Some(obj) = find_mut(objects, id) {
                obj.selected = false;
            }
        }
    }

    /// Drop ids without touching any object. Used once the objects
    /// themselves have been removed from the scene.
    pub(crate) fn forget_all(&mut self) {
        self.selected.clear();
    }

    pub fn ids(&self) -> &[ObjectId] {
        &self.selected
    }

    pub fn first(&self) -> Option<ObjectId> {
        self.selected.first().copied()
    }

    pub fn contains(&self, id: ObjectId) -> bool {
        self.selected.contains(&id)
    }

    pub fn len(&self) -> usize {
        self.selected.len()
    }

    pub fn is_empty(&self) -> bool {
        self.selected.is_empty()
    }

    /// Check that flags and membership agree for every object.
    pub fn is_consistent(&self, objects: &[SceneObject]) -> bool {
        objects.iter().all(|obj| obj.is_selected() == self.contains(obj.id()))
            && self.selected.iter().all(|&id| objects.iter().any(|obj| obj.id() == id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shapes::{Rgb, ShapeKind};
    use kurbo::{Point, Size};

    fn scene(n: usize) -> Vec<SceneObject> {
        (0..n)
            .map(|i| {
                SceneObject::new_shape(
                    ShapeKind::Square,
                    Point::new(i as f64 * 100.0, 0.0),
                    Size::new(50.0, 50.0),
                    Rgb::blue(),
                )
            })
            .collect()
    }

    #[test]
    fn test_select_only() {
        let mut objects = scene(3);
        let mut selection = SelectionModel::new();
        let (a, b) = (objects[0].id(), objects[1].id());

        assert!(selection.select_only(&mut objects, a));
        assert!(selection.select_only(&mut objects, b));
        assert_eq!(selection.ids(), &[b]);
        assert!(!objects[0].is_selected());
        assert!(objects[1].is_selected());
        assert!(selection.is_consistent(&objects));
    }

    #[test]
    fn test_shift_toggle() {
        let mut objects = scene(2);
        let mut selection = SelectionModel::new();
        let (a, b) = (objects[0].id(), objects[1].id());

        selection.select_only(&mut objects, a);
        assert!(selection.toggle(&mut objects, b));
        assert_eq!(selection.ids(), &[a, b]);
        assert!(selection.is_consistent(&objects));

        assert!(!selection.toggle(&mut objects, a));
        assert_eq!(selection.ids(), &[b]);
        assert!(!objects[0].is_selected());
        assert!(selection.is_consistent(&objects));
    }

    #[test]
    fn test_clear() {
        let mut objects = scene(3);
        let mut selection = SelectionModel::new();
        let ids: Vec<_> = objects.iter().map(SceneObject::id).collect();

        selection.extend(&mut objects, &ids);
        assert_eq!(selection.len(), 3);
        assert_eq!(selection.first(), Some(ids[0]));

        selection.clear(&mut objects);
        assert!(selection.is_empty());
        assert!(objects.iter().all(|obj| !obj.is_selected()));
        assert!(selection.is_consistent(&objects));
    }

    #[test]
    fn test_unknown_id() {
        let mut objects = scene(1);
        let mut selection = SelectionModel::new();
        let stranger = SceneObject::new_shape(ShapeKind::Circle, Point::ZERO, Size::new(1.0, 1.0), Rgb::green());

        assert!(!selection.select_only(&mut objects, stranger.id()));
        assert!(!selection.toggle(&mut objects, stranger.id()));
        assert!(selection.is_empty());
        assert!(selection.is_consistent(&objects));
    }
}
