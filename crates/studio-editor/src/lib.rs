pub mod clipboard;
pub mod commands;
pub mod config;
pub mod engine;
pub mod input;
pub mod menu;
pub mod shortcuts;
pub mod studio;
pub mod templates;
pub mod tools;

pub use commands::CommandStack;
pub use config::EditorConfig;
pub use engine::{CanvasEngine, CanvasMutation};
pub use input::{InputEvent, Modifiers, PointerButton};
pub use menu::{ContextMenu, MenuAction, MenuItem};
pub use shortcuts::{ShortcutAction, ShortcutMap};
pub use studio::{LoadKind, LoadTicket, Studio};
pub use templates::{SectionTemplate, TemplateError, TemplateLibrary};
pub use tools::{DragOutcome, DragTool};
