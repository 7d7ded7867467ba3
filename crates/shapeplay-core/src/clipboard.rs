//! Copy/paste buffer.

use crate::object::SceneObject;
use kurbo::Vec2;

/// Holds independent copies of objects. Never aliases anything in the scene:
/// objects go in through [`SceneObject::copy`] and come out the same way.
#[derive(Debug, Clone, Default)]
pub struct ClipboardBuffer {
    copies: Vec<SceneObject>,
}

impl ClipboardBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the buffer with copies of `objects`.
    pub fn store<'a>(&mut self, objects: impl IntoIterator<Item = &'a SceneObject>) {
        self.copies = objects.into_iter().map(SceneObject::copy).collect();
    }

    /// Shift the buffered objects by `offset` and hand out fresh copies.
    ///
    /// The buffer keeps the shifted contents, so pasting again cascades.
    pub fn paste(&mut self, offset: Vec2) -> Vec<SceneObject> {
        self.copies
            .iter_mut()
            .map(|obj| {
                obj.shape.translate(offset);
                obj.copy()
            })
            .collect()
    }

    pub fn len(&self) -> usize {
        self.copies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.copies.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &SceneObject> {
        self.copies.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shapes::{Rgb, ShapeKind};
    use kurbo::{Point, Size};

    fn square() -> SceneObject {
        SceneObject::new_shape(ShapeKind::Square, Point::new(10.0, 10.0), Size::new(50.0, 50.0), Rgb::blue())
    }

    #[test]
    fn test_store_copies() {
        let source = square();
        let mut clipboard = ClipboardBuffer::new();
        clipboard.store([&source]);

        let stored = clipboard.iter().next().unwrap();
        assert_ne!(stored.id(), source.id());
        assert!(stored.same_fields(&source));
    }

    #[test]
    fn test_paste_offsets_and_cascades() {
        let source = square();
        let mut clipboard = ClipboardBuffer::new();
        clipboard.store([&source]);

        let first = clipboard.paste(Vec2::new(5.0, 5.0));
        let second = clipboard.paste(Vec2::new(5.0, 5.0));

        assert_eq!(first[0].shape.position, Point::new(15.0, 15.0));
        assert_eq!(second[0].shape.position, Point::new(20.0, 20.0));
        assert_ne!(first[0].id(), second[0].id());
        assert_eq!(source.shape.position, Point::new(10.0, 10.0));
    }

    #[test]
    fn test_pasted_objects_are_independent() {
        let mut clipboard = ClipboardBuffer::new();
        clipboard.store([&square()]);
        let mut pasted = clipboard.paste(Vec2::ZERO);
        pasted[0].shape.translate(Vec2::new(100.0, 0.0));

        assert_eq!(clipboard.iter().next().unwrap().shape.position, Point::new(10.0, 10.0));
    }
}
