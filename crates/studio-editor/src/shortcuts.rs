//! Keyboard shortcut mapping.
//!
//! Maps key + modifier combos to semantic `ShortcutAction`s. Uses
//! platform-aware modifier detection: ⌘ on macOS and Ctrl elsewhere both
//! count as the command key.

use crate::input::Modifiers;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShortcutAction {
    Copy,
    Paste,
    Duplicate,
    Undo,
    Redo,
    Delete,
    /// Close the context menu, or clear the selection when none is open.
    Dismiss,
    ToggleSnap,
}

pub struct ShortcutMap;

impl ShortcutMap {
    /// Resolve a key event to an action. `key` is the `KeyboardEvent.key`
    /// value. Returns `None` if the combo has no binding.
    pub fn resolve(key: &str, modifiers: &Modifiers) -> Option<ShortcutAction> {
        let cmd = modifiers.command();

        if cmd && modifiers.shift {
            return match key {
                "z" | "Z" => Some(ShortcutAction::Redo),
                _ => None,
            };
        }

        if cmd {
            return match key {
                "c" | "C" => Some(ShortcutAction::Copy),
                "v" | "V" => Some(ShortcutAction::Paste),
                "d" | "D" => Some(ShortcutAction::Duplicate),
                "z" | "Z" => Some(ShortcutAction::Undo),
                "y" | "Y" => Some(ShortcutAction::Redo),
                _ => None,
            };
        }

        match key {
            "Delete" | "Backspace" => Some(ShortcutAction::Delete),
            "Escape" => Some(ShortcutAction::Dismiss),
            "g" | "G" if !modifiers.alt => Some(ShortcutAction::ToggleSnap),
            _ => None,
        }
    }
}
