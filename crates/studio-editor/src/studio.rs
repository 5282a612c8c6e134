//! Studio controller: one editable canvas and its interaction state.
//!
//! Routes normalized input to the drag tool, the context menu and the
//! shortcut map, and exposes the editing operations (clipboard, templates,
//! section moves, undo/redo, loads, exports) a host UI binds to. All state
//! is owned by the instance, so several canvases can coexist.
//!
//! Every method is synchronous and total: an operation that cannot apply
//! (nothing selected, unknown widget) reports `false`/`None` and leaves the
//! canvas unchanged.

use crate::clipboard::Clipboard;
use crate::commands::CommandStack;
use crate::config::EditorConfig;
use crate::engine::{CanvasEngine, CanvasMutation};
use crate::input::{InputEvent, PointerButton};
use crate::menu::{ContextMenu, MenuAction};
use crate::shortcuts::{ShortcutAction, ShortcutMap};
use crate::templates::{SectionTemplate, TemplateError, TemplateLibrary};
use crate::tools::{DragOutcome, DragTool};
use studio_core::builder::load_project_page;
use studio_core::error::StudioResult;
use studio_core::extract::extract;
use studio_core::id::WidgetId;
use studio_core::layout::import_layout;
use studio_core::model::*;

/// What an asynchronous load will deliver.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadKind {
    Markup,
    Project { page: usize },
    Layout,
    Background,
}

/// Handed out when a host starts reading a file; redeemed on completion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadTicket {
    pub id: u64,
    pub kind: LoadKind,
    /// Edit generation when the load started.
    generation: u64,
}

pub struct Studio {
    engine: CanvasEngine,
    commands: CommandStack,
    drag: DragTool,
    config: EditorConfig,
    selection: Option<WidgetId>,
    clipboard: Clipboard,
    templates: TemplateLibrary,
    menu: Option<ContextMenu>,
    status: String,
    /// Bumped on every committed change.
    generation: u64,
    next_ticket: u64,
}

impl Default for Studio {
    fn default() -> Self {
        Self::new(EditorConfig::default())
    }
}

impl Studio {
    pub fn new(config: EditorConfig) -> Self {
        Self {
            engine: CanvasEngine::new(),
            commands: CommandStack::new(config.undo_depth),
            drag: DragTool::new(config.snap_pitch()),
            config,
            selection: None,
            clipboard: Clipboard::new(),
            templates: TemplateLibrary::new(),
            menu: None,
            status: String::new(),
            generation: 0,
            next_ticket: 0,
        }
    }

    pub fn with_layout(config: EditorConfig, layout: Layout) -> Self {
        let mut studio = Self::new(config);
        studio.engine.restore(layout);
        studio
    }

    // ─── Accessors ───────────────────────────────────────────────────────

    pub fn engine(&self) -> &CanvasEngine {
        &self.engine
    }

    pub fn widgets(&self) -> &[Widget] {
        self.engine.widgets()
    }

    pub fn config(&self) -> &EditorConfig {
        &self.config
    }

    pub fn selection(&self) -> Option<WidgetId> {
        self.selection
    }

    pub fn selected_widget(&self) -> Option<&Widget> {
        self.selection.and_then(|id| self.engine.widget(id))
    }

    pub fn menu(&self) -> Option<&ContextMenu> {
        self.menu.as_ref()
    }

    pub fn templates(&self) -> &TemplateLibrary {
        &self.templates
    }

    /// Short human-readable line describing the last load or action.
    pub fn status(&self) -> &str {
        &self.status
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn is_dragging(&self) -> bool {
        self.drag.is_dragging()
    }

    pub fn snap_enabled(&self) -> bool {
        self.drag.snap.is_some()
    }

    pub fn can_undo(&self) -> bool {
        self.commands.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.commands.can_redo()
    }

    pub fn can_paste(&self) -> bool {
        !self.clipboard.is_empty()
    }

    fn set_status(&mut self, status: impl Into<String>) {
        self.status = status.into();
        log::info!("{}", self.status);
    }

    fn commit(&mut self, mutation: CanvasMutation, description: &str) -> bool {
        let changed = self.commands.execute(&mut self.engine, mutation, description);
        if changed {
            self.generation += 1;
        }
        changed
    }

    // ─── Input routing ───────────────────────────────────────────────────

    /// Handle one input event. Returns whether visible state changed.
    pub fn handle_event(&mut self, event: &InputEvent) -> bool {
        match event {
            InputEvent::PointerDown {
                x,
                y,
                button: PointerButton::Secondary,
                ..
            } => match self.engine.hit_test(*x, *y) {
                Some(id) => self.open_context_menu(id, *x, *y),
                None => self.select(None),
            },
            InputEvent::PointerDown {
                x,
                y,
                button: PointerButton::Primary,
                ..
            } => {
                // A press while dragging means the release was lost.
                self.finish_gesture();
                let hit = self.engine.hit_test(*x, *y);
                let selection_changed = self.select(hit);
                if let DragOutcome::Started(_) = self.drag.handle(event, &self.engine) {
                    self.commands.begin_batch(&self.engine, "Move widget");
                }
                selection_changed
            }
            InputEvent::PointerDown { .. } => false,
            InputEvent::PointerMove { .. } | InputEvent::PointerUp { .. } | InputEvent::PointerLeave => {
                match self.drag.handle(event, &self.engine) {
                    DragOutcome::Moved(mutation) => self.commit(mutation, "Move widget"),
                    DragOutcome::Ended(_) => {
                        self.commands.end_batch(&self.engine);
                        false
                    }
                    DragOutcome::Started(_) | DragOutcome::Ignored => false,
                }
            }
            InputEvent::Key { key, modifiers } => match ShortcutMap::resolve(key, modifiers) {
                Some(action) => self.dispatch_shortcut(action),
                None => false,
            },
        }
    }

    pub fn dispatch_shortcut(&mut self, action: ShortcutAction) -> bool {
        log::debug!("shortcut {action:?}");
        match action {
            ShortcutAction::Copy => self.copy_selected(),
            ShortcutAction::Paste => self.paste().is_some(),
            ShortcutAction::Duplicate => self.duplicate_selected().is_some(),
            ShortcutAction::Undo => self.undo(),
            ShortcutAction::Redo => self.redo(),
            ShortcutAction::Delete => self.delete_selected(),
            ShortcutAction::Dismiss => {
                if self.menu.is_some() {
                    self.close_menu()
                } else {
                    self.select(None)
                }
            }
            ShortcutAction::ToggleSnap => {
                self.toggle_snap();
                true
            }
        }
    }

    /// Finish any open gesture, as if the pointer had been released.
    fn finish_gesture(&mut self) {
        if self.drag.reset().is_some() {
            self.commands.end_batch(&self.engine);
        }
    }

    // ─── Selection & menu ────────────────────────────────────────────────

    /// Select a widget, or clear the selection with `None`. Changing the
    /// selection closes the context menu. Returns whether anything changed.
    pub fn select(&mut self, id: Option<WidgetId>) -> bool {
        let id = id.filter(|id| self.engine.contains(*id));
        if id == self.selection {
            return false;
        }
        self.selection = id;
        self.menu = None;
        true
    }

    pub fn open_context_menu(&mut self, id: WidgetId, x: f32, y: f32) -> bool {
        self.select(Some(id));
        let sections = self.engine.sections();
        let can_paste = self.can_paste();
        match self.engine.widget(id) {
            Some(widget) => {
                self.menu = Some(ContextMenu::for_widget(widget, x, y, can_paste, &sections));
                true
            }
            None => false,
        }
    }

    pub fn close_menu(&mut self) -> bool {
        self.menu.take().is_some()
    }

    /// Apply a menu action to the menu's target, then close the menu.
    pub fn apply_menu_action(&mut self, action: MenuAction) -> bool {
        let Some(menu) = self.menu.take() else {
            return false;
        };
        let target = menu.target;
        match action {
            MenuAction::Copy => self.copy(target),
            MenuAction::Paste => self.paste().is_some(),
            MenuAction::Duplicate => self.duplicate(target).is_some(),
            MenuAction::Delete => self.delete(target),
            MenuAction::SaveTemplate(name) => match self.save_template_from(target, &name) {
                Ok(()) => true,
                Err(e) => {
                    self.set_status(e.to_string());
                    false
                }
            },
            MenuAction::ChangeType(kind) => self.retype(target, kind),
            MenuAction::MoveToSection(section) => self.move_to_section(target, &section),
        }
    }

    // ─── Editing ─────────────────────────────────────────────────────────

    pub fn copy(&mut self, id: WidgetId) -> bool {
        match self.engine.widget(id) {
            Some(widget) => {
                self.clipboard.copy(widget);
                true
            }
            None => false,
        }
    }

    pub fn copy_selected(&mut self) -> bool {
        match self.selection {
            Some(id) => self.copy(id),
            None => false,
        }
    }

    /// Append a clone of the clipboard widget and select it.
    pub fn paste(&mut self) -> Option<WidgetId> {
        let widget = self.clipboard.paste(self.config.paste_offset)?;
        self.insert_and_select(widget, "Paste widget")
    }

    /// Append an offset clone of `id` without touching the clipboard.
    pub fn duplicate(&mut self, id: WidgetId) -> Option<WidgetId> {
        let offset = self.config.paste_offset;
        let mut clone = self.engine.widget(id)?.duplicate();
        clone.geometry = clone.geometry.translated(offset, offset);
        self.insert_and_select(clone, "Duplicate widget")
    }

    pub fn duplicate_selected(&mut self) -> Option<WidgetId> {
        let id = self.selection?;
        self.duplicate(id)
    }

    fn insert_and_select(&mut self, widget: Widget, description: &str) -> Option<WidgetId> {
        self.finish_gesture();
        let id = widget.id;
        if !self.commit(CanvasMutation::append(widget), description) {
            return None;
        }
        // The engine re-issues ids that collide; take whatever was appended.
        let id = self
            .engine
            .widgets()
            .last()
            .map_or(id, |w| w.id);
        self.select(Some(id));
        Some(id)
    }

    /// Remove one widget. Clears the selection if it was the one removed.
    pub fn delete(&mut self, id: WidgetId) -> bool {
        if self.drag.active() == Some(id) {
            self.finish_gesture();
        }
        if !self.commit(CanvasMutation::Remove { id }, "Delete widget") {
            return false;
        }
        if self.selection == Some(id) {
            self.selection = None;
        }
        if self.menu.as_ref().is_some_and(|m| m.target == id) {
            self.menu = None;
        }
        true
    }

    pub fn delete_selected(&mut self) -> bool {
        match self.selection {
            Some(id) => self.delete(id),
            None => false,
        }
    }

    pub fn retype(&mut self, id: WidgetId, kind: WidgetKind) -> bool {
        self.commit(CanvasMutation::Retype { id, kind }, "Change widget type")
    }

    pub fn move_to_section(&mut self, id: WidgetId, section: &str) -> bool {
        let moved = self.commit(
            CanvasMutation::AssignSection {
                id,
                section: section.to_string(),
            },
            "Move to section",
        );
        if moved && self.selection == Some(id) && self.engine.widget(id).is_some_and(|w| !self.engine.is_visible(w)) {
            self.selection = None;
        }
        moved
    }

    /// Store a rendered box size observed by the host. Ignored while the
    /// widget is being dragged.
    pub fn observe_resize(&mut self, id: WidgetId, w: f32, h: f32) -> bool {
        if self.drag.active() == Some(id) {
            log::trace!("resize of {id} ignored during drag");
            return false;
        }
        match self.engine.observe_resize(id, w, h) {
            Some(mutation) => self.commit(mutation, "Resize widget"),
            None => false,
        }
    }

    pub fn toggle_snap(&mut self) -> bool {
        self.drag.snap = match self.drag.snap {
            Some(_) => None,
            None => Some(self.config.grid_size.max(1.0)),
        };
        self.set_status(if self.drag.snap.is_some() {
            "Snap to grid on"
        } else {
            "Snap to grid off"
        });
        self.drag.snap.is_some()
    }

    pub fn set_canvas_size(&mut self, width: f32, height: f32) -> bool {
        self.finish_gesture();
        let before = self.engine.layout();
        self.engine.set_canvas_size(width, height);
        let after = self.engine.layout();
        let changed = self.commands.record(before, after, "Resize canvas");
        if changed {
            self.generation += 1;
        }
        changed
    }

    // ─── Sections & templates ────────────────────────────────────────────

    pub fn sections(&self) -> Vec<String> {
        self.engine.sections()
    }

    /// Show only one section (or all with `None`). A selection that falls
    /// outside the filter is cleared.
    pub fn set_section_filter(&mut self, section: Option<&str>) {
        self.finish_gesture();
        self.engine.set_section_filter(section);
        let hidden = self
            .selected_widget()
            .is_some_and(|w| !self.engine.is_visible(w));
        if hidden {
            self.select(None);
        }
        self.menu = None;
    }

    /// Save every widget sharing the selected widget's section as a template.
    pub fn save_section_template(&mut self, name: &str) -> Result<(), TemplateError> {
        let target = self
            .selection
            .ok_or_else(|| TemplateError::EmptySection(String::new()))?;
        self.save_template_from(target, name)
    }

    fn save_template_from(&mut self, target: WidgetId, name: &str) -> Result<(), TemplateError> {
        let section = self
            .engine
            .widget(target)
            .map(|w| w.section.clone())
            .ok_or_else(|| TemplateError::EmptySection(String::new()))?;
        let template = SectionTemplate::capture(name, &section, self.engine.section_widgets(&section))?;
        let count = template.widgets().len();
        let name = template.name().to_string();
        let verb = match self.templates.insert(template) {
            Some(_) => "Replaced",
            None => "Saved",
        };
        self.set_status(format!("{verb} template \"{name}\" with {count} widgets"));
        Ok(())
    }

    /// Insert a template as one undo step. Without a target section a new
    /// one is named after the template (`Row 1`, `Row 2`, ...).
    pub fn insert_template(&mut self, name: &str, target_section: Option<&str>) -> Result<Vec<WidgetId>, TemplateError> {
        let section = match target_section.map(str::trim).filter(|s| !s.is_empty()) {
            Some(section) => section.to_string(),
            None => self.generated_section_name(name),
        };
        let clones = self
            .templates
            .get(name)?
            .instantiate(&section, self.config.template_origin);

        self.finish_gesture();
        self.commands.begin_batch(&self.engine, "Insert template");
        let mut ids = Vec::with_capacity(clones.len());
        for clone in clones {
            ids.push(clone.id);
            self.commit(CanvasMutation::append(clone), "Insert template");
        }
        self.commands.end_batch(&self.engine);
        self.set_status(format!("Inserted {} widgets into \"{section}\"", ids.len()));
        Ok(ids)
    }

    fn generated_section_name(&self, template: &str) -> String {
        let sections = self.engine.sections();
        (1..)
            .map(|n| format!("{} {n}", template.trim()))
            .find(|candidate| !sections.contains(candidate))
            .unwrap_or_else(|| template.to_string())
    }

    pub fn templates_to_bytes(&self) -> Result<Vec<u8>, TemplateError> {
        self.templates.to_bytes()
    }

    /// Replace the template library from a saved blob. On error the
    /// current library is kept.
    pub fn restore_templates(&mut self, bytes: &[u8]) -> Result<usize, TemplateError> {
        self.templates = TemplateLibrary::from_bytes(bytes)?;
        Ok(self.templates.len())
    }

    // ─── Undo / redo ─────────────────────────────────────────────────────

    pub fn undo(&mut self) -> bool {
        self.finish_gesture();
        let undone = self.commands.undo(&mut self.engine);
        self.after_history_step(undone, "Undid")
    }

    pub fn redo(&mut self) -> bool {
        self.finish_gesture();
        let redone = self.commands.redo(&mut self.engine);
        self.after_history_step(redone, "Redid")
    }

    fn after_history_step(&mut self, description: Option<String>, verb: &str) -> bool {
        let Some(description) = description else {
            return false;
        };
        self.generation += 1;
        self.menu = None;
        if self.selection.is_some_and(|id| !self.engine.contains(id)) {
            self.selection = None;
        }
        self.set_status(format!("{verb}: {description}"));
        true
    }

    // ─── Loads ───────────────────────────────────────────────────────────

    /// Start an asynchronous load. Redeem the ticket with the matching
    /// `complete_*` method once the host has the data.
    pub fn begin_load(&mut self, kind: LoadKind) -> LoadTicket {
        self.next_ticket += 1;
        let ticket = LoadTicket {
            id: self.next_ticket,
            kind,
            generation: self.generation,
        };
        log::debug!("load #{} started: {:?}", ticket.id, ticket.kind);
        ticket
    }

    /// Completions always apply. One that arrives after further edits
    /// overwrites them; that is logged, not prevented.
    fn check_ticket(&self, ticket: &LoadTicket) {
        if ticket.generation != self.generation {
            log::warn!(
                "load #{} ({:?}) completed after {} newer edits; applying anyway",
                ticket.id,
                ticket.kind,
                self.generation - ticket.generation.min(self.generation)
            );
        }
    }

    /// Replace the canvas state as one undoable step.
    fn apply_load(&mut self, description: &str, load: impl FnOnce(&mut CanvasEngine)) {
        self.finish_gesture();
        let before = self.engine.layout();
        load(&mut self.engine);
        let after = self.engine.layout();
        if self.commands.record(before, after, description) {
            self.generation += 1;
        }
        self.selection = None;
        self.menu = None;
    }

    fn report(&mut self, status: LoadStatus) -> LoadStatus {
        self.set_status(status.to_string());
        status
    }

    /// Extract widgets from markup and replace the canvas with them. Markup
    /// with no tags leaves the canvas as it is.
    pub fn complete_markup_load(&mut self, ticket: LoadTicket, markup: &str) -> LoadStatus {
        self.check_ticket(&ticket);
        let widgets = extract(markup);
        if widgets.is_empty() {
            return self.report(LoadStatus::Empty);
        }
        let status = LoadStatus::from_count(widgets.len());
        self.apply_load("Load markup", |engine| engine.replace_widgets(widgets));
        self.report(status)
    }

    /// Import one page of a builder project. Replaces the canvas even when
    /// the page has no elements; unreadable input leaves it untouched.
    pub fn complete_project_load(&mut self, ticket: LoadTicket, json: &str) -> LoadStatus {
        self.check_ticket(&ticket);
        let page = match ticket.kind {
            LoadKind::Project { page } => page,
            _ => 0,
        };
        let import = load_project_page(json, page);
        if import.status.is_malformed() {
            return self.report(import.status);
        }
        let status = import.status.clone();
        self.apply_load("Import project page", |engine| {
            engine.set_canvas_size(import.canvas_width, import.canvas_height);
            engine.background_url = import.background_url.unwrap_or_default();
            engine.replace_widgets(import.widgets);
        });
        self.report(status)
    }

    /// Restore a saved layout. Unreadable input leaves the canvas untouched.
    pub fn complete_layout_load(&mut self, ticket: LoadTicket, json: &str) -> LoadStatus {
        self.check_ticket(&ticket);
        let import = import_layout(json);
        if import.status.is_malformed() {
            return self.report(import.status);
        }
        let status = import.status.clone();
        self.apply_load("Load layout", |engine| engine.restore(import.layout));
        self.report(status)
    }

    /// Set the background image reference resolved by the host.
    pub fn complete_background_load(&mut self, ticket: LoadTicket, url: &str) -> bool {
        self.check_ticket(&ticket);
        let url = url.trim().to_string();
        if url == self.engine.background_url {
            return false;
        }
        self.apply_load("Set background", |engine| engine.background_url = url);
        true
    }

    pub fn load_markup(&mut self, markup: &str) -> LoadStatus {
        let ticket = self.begin_load(LoadKind::Markup);
        self.complete_markup_load(ticket, markup)
    }

    pub fn load_project_page(&mut self, json: &str, page: usize) -> LoadStatus {
        let ticket = self.begin_load(LoadKind::Project { page });
        self.complete_project_load(ticket, json)
    }

    pub fn load_layout(&mut self, json: &str) -> LoadStatus {
        let ticket = self.begin_load(LoadKind::Layout);
        self.complete_layout_load(ticket, json)
    }

    pub fn set_frame_url(&mut self, url: &str) -> bool {
        let url = url.trim().to_string();
        if url == self.engine.frame_url {
            return false;
        }
        self.apply_load("Set frame", |engine| engine.frame_url = url);
        true
    }

    // ─── Exports ─────────────────────────────────────────────────────────

    pub fn layout(&self) -> Layout {
        self.engine.layout()
    }

    pub fn export_layout(&self) -> StudioResult<String> {
        studio_core::layout::export_layout(&self.engine.layout())
    }

    pub fn export_markup(&self) -> String {
        studio_core::emitter::export_markup(&self.engine.layout())
    }
}
