//! Single-slot widget clipboard.

use studio_core::model::Widget;

#[derive(Debug, Clone, Default)]
pub struct Clipboard {
    slot: Option<Widget>,
}

impl Clipboard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a full snapshot, replacing whatever was held.
    pub fn copy(&mut self, widget: &Widget) {
        self.slot = Some(widget.clone());
    }

    pub fn is_empty(&self) -> bool {
        self.slot.is_none()
    }

    pub fn peek(&self) -> Option<&Widget> {
        self.slot.as_ref()
    }

    /// A clone of the held widget with a fresh id, offset on both axes.
    /// The held snapshot is unchanged, so pasting repeatedly yields clones
    /// at the same position.
    pub fn paste(&self, offset: f32) -> Option<Widget> {
        self.slot.as_ref().map(|held| {
            let mut clone = held.duplicate();
            clone.geometry = clone.geometry.translated(offset, offset);
            clone
        })
    }

    pub fn clear(&mut self) {
        self.slot = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use studio_core::model::{Geometry, WidgetKind};

    #[test]
    fn paste_offsets_and_reissues_id() {
        let mut clipboard = Clipboard::new();
        assert!(clipboard.paste(20.0).is_none());

        let source = Widget::new(WidgetKind::Slider).with_geometry(Geometry::new(10.0, 15.0, 200.0, 40.0));
        clipboard.copy(&source);
        let pasted = clipboard.paste(20.0).unwrap();
        assert_ne!(pasted.id, source.id);
        assert_eq!(pasted.geometry, Geometry::new(30.0, 35.0, 200.0, 40.0));
        assert_eq!(pasted.kind, WidgetKind::Slider);

        let again = clipboard.paste(20.0).unwrap();
        assert_ne!(again.id, pasted.id);
        assert_eq!(again.geometry, pasted.geometry);
    }
}
