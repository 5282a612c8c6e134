//! Editor configuration.

use serde::{Deserialize, Serialize};

/// Tunables for a [`Studio`](crate::studio::Studio) instance.
///
/// Deserializes from partial JSON; absent fields keep their defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct EditorConfig {
    /// Snap pitch in pixels. Values below 1 disable snapping. Default: **10**.
    pub grid_size: f32,

    /// Quantize drag positions to the grid. Default: **true**.
    pub snap_to_grid: bool,

    /// Maximum number of undo steps kept. Default: **100**.
    pub undo_depth: usize,

    /// Offset of a pasted clone from its source, on both axes. Default: **20**.
    pub paste_offset: f32,

    /// Where an inserted template's top-left corner lands. Default: **(40, 40)**.
    pub template_origin: (f32, f32),
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            grid_size: 10.0,
            snap_to_grid: true,
            undo_depth: 100,
            paste_offset: 20.0,
            template_origin: (40.0, 40.0),
        }
    }
}

impl EditorConfig {
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Effective snap pitch, or `None` when snapping is off.
    pub fn snap_pitch(&self) -> Option<f32> {
        (self.snap_to_grid && self.grid_size.is_finite() && self.grid_size >= 1.0)
            .then_some(self.grid_size)
    }
}
