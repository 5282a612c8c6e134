//! Context menu for a single widget.

use smallvec::SmallVec;
use studio_core::id::WidgetId;
use studio_core::model::{Widget, WidgetKind};

/// Something the user can pick from the menu.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MenuAction {
    Copy,
    Paste,
    Duplicate,
    Delete,
    /// Save the target's whole section as a template under this name.
    /// The menu offers the section name; hosts may substitute their own.
    SaveTemplate(String),
    ChangeType(WidgetKind),
    MoveToSection(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MenuItem {
    pub label: String,
    pub action: MenuAction,
}

impl MenuItem {
    fn new(label: impl Into<String>, action: MenuAction) -> Self {
        Self {
            label: label.into(),
            action,
        }
    }
}

/// An open menu, anchored at the pointer position of the secondary click.
#[derive(Debug, Clone, PartialEq)]
pub struct ContextMenu {
    pub target: WidgetId,
    pub x: f32,
    pub y: f32,
    pub items: SmallVec<[MenuItem; 8]>,
    /// Type-change entries, one per kind other than the current one.
    pub retype: SmallVec<[MenuItem; 4]>,
    /// Section-move entries, one per other known section.
    pub sections: Vec<MenuItem>,
}

impl ContextMenu {
    pub fn for_widget(widget: &Widget, x: f32, y: f32, can_paste: bool, sections: &[String]) -> Self {
        let mut items: SmallVec<[MenuItem; 8]> = SmallVec::new();
        items.push(MenuItem::new("Copy", MenuAction::Copy));
        if can_paste {
            items.push(MenuItem::new("Paste", MenuAction::Paste));
        }
        items.push(MenuItem::new("Duplicate", MenuAction::Duplicate));
        items.push(MenuItem::new("Delete", MenuAction::Delete));
        items.push(MenuItem::new(
            format!("Save section \"{}\" as template", widget.section),
            MenuAction::SaveTemplate(widget.section.clone()),
        ));

        let retype = WidgetKind::ALL
            .iter()
            .filter(|kind| **kind != widget.kind)
            .map(|kind| MenuItem::new(format!("Change to {}", kind.title()), MenuAction::ChangeType(*kind)))
            .collect();

        let sections = sections
            .iter()
            .filter(|s| **s != widget.section)
            .map(|s| MenuItem::new(format!("Move to {s}"), MenuAction::MoveToSection(s.clone())))
            .collect();

        Self {
            target: widget.id,
            x,
            y,
            items,
            retype,
            sections,
        }
    }

    /// Every entry, flattened in display order.
    pub fn entries(&self) -> impl Iterator<Item = &MenuItem> + '_ {
        self.items.iter().chain(&self.retype).chain(&self.sections)
    }

    pub fn offers(&self, action: &MenuAction) -> bool {
        self.entries().any(|item| item.action == *action)
    }
}
