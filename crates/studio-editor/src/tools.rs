//! Drag tool: pointer-driven widget placement.
//!
//! One state machine per gesture, `Idle → Dragging → Idle`. Pressing on a
//! widget captures the pointer offset inside it; every move places the
//! widget at `pointer − offset`, kept fully inside the canvas and optionally
//! snapped to the grid. Release or leaving the canvas ends the gesture and
//! leaves the widget where it last was.

use crate::engine::{CanvasEngine, CanvasMutation};
use crate::input::{InputEvent, PointerButton};
use studio_core::id::WidgetId;
use studio_core::model::Geometry;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DragState {
    Idle,
    Dragging {
        id: WidgetId,
        offset_x: f32,
        offset_y: f32,
    },
}

/// What a handled event did to the gesture.
#[derive(Debug, Clone, PartialEq)]
pub enum DragOutcome {
    /// Nothing to do for this tool.
    Ignored,
    Started(WidgetId),
    Moved(CanvasMutation),
    Ended(WidgetId),
}

#[derive(Debug, Clone)]
pub struct DragTool {
    state: DragState,
    /// Snap pitch, `None` when snapping is off.
    pub snap: Option<f32>,
}

impl Default for DragTool {
    fn default() -> Self {
        Self::new(None)
    }
}

impl DragTool {
    pub fn new(snap: Option<f32>) -> Self {
        Self {
            state: DragState::Idle,
            snap,
        }
    }

    pub fn state(&self) -> DragState {
        self.state
    }

    pub fn is_dragging(&self) -> bool {
        matches!(self.state, DragState::Dragging { .. })
    }

    /// The widget being dragged, if any.
    pub fn active(&self) -> Option<WidgetId> {
        match self.state {
            DragState::Dragging { id, .. } => Some(id),
            DragState::Idle => None,
        }
    }

    /// Drop any gesture without producing a move.
    pub fn reset(&mut self) -> Option<WidgetId> {
        let active = self.active();
        self.state = DragState::Idle;
        active
    }

    pub fn handle(&mut self, event: &InputEvent, engine: &CanvasEngine) -> DragOutcome {
        match (event, self.state) {
            (
                InputEvent::PointerDown {
                    x,
                    y,
                    button: PointerButton::Primary,
                    ..
                },
                _,
            ) => match engine.hit_test(*x, *y).and_then(|id| engine.widget(id)) {
                Some(widget) => {
                    self.state = DragState::Dragging {
                        id: widget.id,
                        offset_x: x - widget.geometry.x,
                        offset_y: y - widget.geometry.y,
                    };
                    log::trace!("drag start {}", widget.id);
                    DragOutcome::Started(widget.id)
                }
                None => {
                    self.state = DragState::Idle;
                    DragOutcome::Ignored
                }
            },
            (
                InputEvent::PointerMove { x, y, .. },
                DragState::Dragging {
                    id,
                    offset_x,
                    offset_y,
                },
            ) => match engine.widget(id) {
                Some(widget) => {
                    let (nx, ny) = place(
                        &widget.geometry,
                        x - offset_x,
                        y - offset_y,
                        engine.canvas_width,
                        engine.canvas_height,
                        self.snap,
                    );
                    DragOutcome::Moved(CanvasMutation::Move { id, x: nx, y: ny })
                }
                // Deleted mid-gesture.
                None => {
                    self.state = DragState::Idle;
                    DragOutcome::Ended(id)
                }
            },
            (InputEvent::PointerUp { .. } | InputEvent::PointerLeave, DragState::Dragging { id, .. }) => {
                self.state = DragState::Idle;
                log::trace!("drag end {id}");
                DragOutcome::Ended(id)
            }
            _ => DragOutcome::Ignored,
        }
    }
}

/// Clamp a proposed top-left so the box stays inside the canvas, then snap.
///
/// Snapping rounds each axis independently; a rounded value that would
/// overflow the far edge falls back to the last grid line that fits.
pub fn place(
    geometry: &Geometry,
    x: f32,
    y: f32,
    canvas_width: f32,
    canvas_height: f32,
    snap: Option<f32>,
) -> (f32, f32) {
    let max_x = (canvas_width - geometry.w).max(0.0);
    let max_y = (canvas_height - geometry.h).max(0.0);
    let x = clamp_axis(x, max_x);
    let y = clamp_axis(y, max_y);
    match snap {
        Some(g) if g > 0.0 => (snap_axis(x, max_x, g), snap_axis(y, max_y, g)),
        _ => (x, y),
    }
}

fn clamp_axis(v: f32, max: f32) -> f32 {
    if v.is_finite() { v.clamp(0.0, max) } else { 0.0 }
}

fn snap_axis(v: f32, max: f32, g: f32) -> f32 {
    let snapped = (v / g).round() * g;
    if snapped > max {
        (max / g).floor() * g
    } else {
        snapped
    }
}
