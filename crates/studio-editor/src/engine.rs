//! Canvas engine: the authoritative widget collection.
//!
//! Owns the widgets and canvas extents of one canvas instance. Every edit
//! goes through [`CanvasEngine::apply_mutation`], which is total: a mutation
//! naming a missing widget is a no-op that reports `false`.

use std::collections::HashSet;
use studio_core::id::WidgetId;
use studio_core::model::*;

/// A single edit to the widget collection.
#[derive(Debug, Clone, PartialEq)]
pub enum CanvasMutation {
    /// Set the top-left corner.
    Move { id: WidgetId, x: f32, y: f32 },
    /// Set the size. Callers clamp first (see [`CanvasEngine::observe_resize`]).
    Resize { id: WidgetId, w: f32, h: f32 },
    /// Insert a widget at `index`, or append when `None`.
    Insert {
        index: Option<usize>,
        widget: Box<Widget>,
    },
    Remove { id: WidgetId },
    Retype { id: WidgetId, kind: WidgetKind },
    AssignSection { id: WidgetId, section: String },
}

impl CanvasMutation {
    pub fn append(widget: Widget) -> Self {
        Self::Insert {
            index: None,
            widget: Box::new(widget),
        }
    }
}

pub struct CanvasEngine {
    widgets: Vec<Widget>,
    pub canvas_width: f32,
    pub canvas_height: f32,
    pub background_url: String,
    pub frame_url: String,
    /// When set, only this section is listed and hit-tested.
    section_filter: Option<String>,
}

impl Default for CanvasEngine {
    fn default() -> Self {
        Self::from_layout(Layout::default())
    }
}

impl CanvasEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_layout(layout: Layout) -> Self {
        let mut engine = Self {
            widgets: Vec::new(),
            canvas_width: DEFAULT_CANVAS_WIDTH,
            canvas_height: DEFAULT_CANVAS_HEIGHT,
            background_url: String::new(),
            frame_url: String::new(),
            section_filter: None,
        };
        engine.restore(layout);
        engine
    }

    /// Snapshot of the full canvas state.
    pub fn layout(&self) -> Layout {
        Layout {
            background_url: self.background_url.clone(),
            frame_url: self.frame_url.clone(),
            canvas_width: self.canvas_width,
            canvas_height: self.canvas_height,
            widgets: self.widgets.clone(),
        }
    }

    /// Replace the full canvas state. Duplicate ids are re-issued and
    /// extents clamped.
    pub fn restore(&mut self, layout: Layout) {
        self.background_url = layout.background_url;
        self.frame_url = layout.frame_url;
        self.set_canvas_size(layout.canvas_width, layout.canvas_height);
        self.replace_widgets(layout.widgets);
    }

    /// Replace the widget set wholesale, keeping canvas settings.
    pub fn replace_widgets(&mut self, widgets: Vec<Widget>) {
        self.widgets = widgets;
        for widget in &mut self.widgets {
            widget.geometry = widget.geometry.sanitized();
        }
        self.ensure_unique_ids();
    }

    pub fn set_canvas_size(&mut self, width: f32, height: f32) {
        self.canvas_width = clamp_canvas_extent(width, MIN_CANVAS_WIDTH, DEFAULT_CANVAS_WIDTH);
        self.canvas_height = clamp_canvas_extent(height, MIN_CANVAS_HEIGHT, DEFAULT_CANVAS_HEIGHT);
    }

    /// Re-issue ids that collide with an earlier widget. Returns how many
    /// were changed.
    pub fn ensure_unique_ids(&mut self) -> usize {
        let mut seen = HashSet::with_capacity(self.widgets.len());
        let mut reissued = 0;
        for widget in &mut self.widgets {
            if !seen.insert(widget.id) {
                let fresh = WidgetId::fresh();
                log::warn!("duplicate widget id `{}` re-issued as `{fresh}`", widget.id);
                widget.id = fresh;
                seen.insert(fresh);
                reissued += 1;
            }
        }
        reissued
    }

    // ─── Queries ─────────────────────────────────────────────────────────

    pub fn widgets(&self) -> &[Widget] {
        &self.widgets
    }

    pub fn len(&self) -> usize {
        self.widgets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.widgets.is_empty()
    }

    pub fn widget(&self, id: WidgetId) -> Option<&Widget> {
        self.widgets.iter().find(|w| w.id == id)
    }

    pub fn index_of(&self, id: WidgetId) -> Option<usize> {
        self.widgets.iter().position(|w| w.id == id)
    }

    pub fn contains(&self, id: WidgetId) -> bool {
        self.index_of(id).is_some()
    }

    pub fn section_filter(&self) -> Option<&str> {
        self.section_filter.as_deref()
    }

    /// Restrict listing and hit-testing to one section. Blank clears it.
    pub fn set_section_filter(&mut self, section: Option<&str>) {
        self.section_filter = section
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string);
    }

    pub fn is_visible(&self, widget: &Widget) -> bool {
        self.section_filter
            .as_deref()
            .is_none_or(|section| widget.section == section)
    }

    /// Widgets passing the section filter, in paint order.
    pub fn visible_widgets(&self) -> impl Iterator<Item = &Widget> + '_ {
        self.widgets.iter().filter(|w| self.is_visible(w))
    }

    /// Distinct sections in first-appearance order.
    pub fn sections(&self) -> Vec<String> {
        let mut out: Vec<String> = Vec::new();
        for widget in &self.widgets {
            if !out.contains(&widget.section) {
                out.push(widget.section.clone());
            }
        }
        out
    }

    /// Widgets of one section, in paint order.
    pub fn section_widgets<'a>(&'a self, section: &'a str) -> impl Iterator<Item = &'a Widget> + 'a {
        self.widgets.iter().filter(move |w| w.section == section)
    }

    /// Topmost visible widget under the point. Later widgets paint on top.
    pub fn hit_test(&self, x: f32, y: f32) -> Option<WidgetId> {
        self.widgets
            .iter()
            .rev()
            .find(|w| self.is_visible(w) && w.contains_point(x, y))
            .map(|w| w.id)
    }

    // ─── Mutation ────────────────────────────────────────────────────────

    /// Apply one mutation. Returns whether anything changed.
    pub fn apply_mutation(&mut self, mutation: CanvasMutation) -> bool {
        match mutation {
            CanvasMutation::Move { id, x, y } => self.update(id, |w| {
                let (x, y) = (finite_or_zero(x), finite_or_zero(y));
                let changed = w.geometry.x != x || w.geometry.y != y;
                w.move_to(x, y);
                changed
            }),
            CanvasMutation::Resize { id, w: width, h: height } => self.update(id, |w| {
                let changed = w.geometry.w != width || w.geometry.h != height;
                w.resize_to(width, height);
                w.geometry = w.geometry.sanitized();
                changed
            }),
            CanvasMutation::Insert { index, widget } => {
                let mut widget = *widget;
                if self.contains(widget.id) {
                    let fresh = WidgetId::fresh();
                    log::warn!("inserted widget id `{}` already present, using `{fresh}`", widget.id);
                    widget.id = fresh;
                }
                widget.geometry = widget.geometry.sanitized();
                let at = index.unwrap_or(self.widgets.len()).min(self.widgets.len());
                log::debug!("insert {} at {at}", widget.id);
                self.widgets.insert(at, widget);
                true
            }
            CanvasMutation::Remove { id } => match self.index_of(id) {
                Some(index) => {
                    self.widgets.remove(index);
                    log::debug!("removed {id}");
                    true
                }
                None => false,
            },
            CanvasMutation::Retype { id, kind } => self.update(id, |w| {
                let changed = w.kind != kind;
                w.retype(kind);
                changed
            }),
            CanvasMutation::AssignSection { id, section } => self.update(id, |w| {
                let before = std::mem::take(&mut w.section);
                w.assign_section(&section);
                before != w.section
            }),
        }
    }

    fn update(&mut self, id: WidgetId, f: impl FnOnce(&mut Widget) -> bool) -> bool {
        match self.widgets.iter_mut().find(|w| w.id == id) {
            Some(widget) => f(widget),
            None => {
                log::trace!("mutation for unknown widget {id} ignored");
                false
            }
        }
    }

    /// Give an inserted widget a fresh id when its id is already taken, so
    /// the mutation can be inverted by id.
    pub fn prepare(&self, mutation: CanvasMutation) -> CanvasMutation {
        match mutation {
            CanvasMutation::Insert { index, mut widget } if self.contains(widget.id) => {
                widget.id = WidgetId::fresh();
                CanvasMutation::Insert { index, widget }
            }
            other => other,
        }
    }

    /// The mutation that reverts `mutation` against the current state.
    pub fn inverse_of(&self, mutation: &CanvasMutation) -> Option<CanvasMutation> {
        match mutation {
            CanvasMutation::Move { id, .. } => self.widget(*id).map(|w| CanvasMutation::Move {
                id: *id,
                x: w.geometry.x,
                y: w.geometry.y,
            }),
            CanvasMutation::Resize { id, .. } => self.widget(*id).map(|w| CanvasMutation::Resize {
                id: *id,
                w: w.geometry.w,
                h: w.geometry.h,
            }),
            CanvasMutation::Insert { widget, .. } => {
                (!self.contains(widget.id)).then_some(CanvasMutation::Remove { id: widget.id })
            }
            CanvasMutation::Remove { id } => self.index_of(*id).map(|index| CanvasMutation::Insert {
                index: Some(index),
                widget: Box::new(self.widgets[index].clone()),
            }),
            CanvasMutation::Retype { id, .. } => self.widget(*id).map(|w| CanvasMutation::Retype {
                id: *id,
                kind: w.kind,
            }),
            CanvasMutation::AssignSection { id, .. } => {
                self.widget(*id).map(|w| CanvasMutation::AssignSection {
                    id: *id,
                    section: w.section.clone(),
                })
            }
        }
    }

    /// Clamp an observed box size to the resize minimums and the canvas.
    ///
    /// Width is bounded by the space right of the widget, height by the
    /// space below it; the minimums win when the widget sits near an edge.
    pub fn clamp_resize(&self, geometry: &Geometry, w: f32, h: f32) -> (f32, f32) {
        let max_w = (self.canvas_width - geometry.x.max(0.0)).max(RESIZE_MIN_WIDTH);
        let max_h = (self.canvas_height - geometry.y.max(0.0)).max(RESIZE_MIN_HEIGHT);
        let w = if w.is_finite() { w } else { geometry.w };
        let h = if h.is_finite() { h } else { geometry.h };
        (w.clamp(RESIZE_MIN_WIDTH, max_w), h.clamp(RESIZE_MIN_HEIGHT, max_h))
    }

    /// The resize mutation for an observed rendered box, if the clamped
    /// size differs from the stored one.
    pub fn observe_resize(&self, id: WidgetId, w: f32, h: f32) -> Option<CanvasMutation> {
        let widget = self.widget(id)?;
        let (w, h) = self.clamp_resize(&widget.geometry, w, h);
        (w != widget.geometry.w || h != widget.geometry.h)
            .then_some(CanvasMutation::Resize { id, w, h })
    }
}

fn finite_or_zero(v: f32) -> f32 {
    if v.is_finite() { v } else { 0.0 }
}
