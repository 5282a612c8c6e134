//! Layout JSON: the studio's own save format.
//!
//! ```json
//! { "version": 1, "generatedAt": "1760601600", "backgroundUrl": "",
//!   "frameUrl": "", "canvasWidth": 1024, "canvasHeight": 600, "widgets": [] }
//! ```
//!
//! Import is forgiving: a bare widget array is accepted, unreadable
//! widgets are skipped and counted, and missing fields take defaults.

use crate::error::{StudioError, StudioResult};
use crate::model::*;
use serde::Serialize;
use serde_json::{Map, Value};
use std::time::{SystemTime, UNIX_EPOCH};

pub const LAYOUT_VERSION: u32 = 1;

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct LayoutDocument<'a> {
    version: u32,
    generated_at: &'a str,
    background_url: &'a str,
    frame_url: &'a str,
    canvas_width: f32,
    canvas_height: f32,
    widgets: &'a [Widget],
}

/// Serialize a layout, stamped with the current time.
pub fn export_layout(layout: &Layout) -> StudioResult<String> {
    export_layout_at(layout, &unix_timestamp())
}

/// Serialize a layout with an explicit `generatedAt` stamp.
pub fn export_layout_at(layout: &Layout, generated_at: &str) -> StudioResult<String> {
    let doc = LayoutDocument {
        version: LAYOUT_VERSION,
        generated_at,
        background_url: &layout.background_url,
        frame_url: &layout.frame_url,
        canvas_width: layout.canvas_width,
        canvas_height: layout.canvas_height,
        widgets: &layout.widgets,
    };
    Ok(serde_json::to_string_pretty(&doc)?)
}

fn unix_timestamp() -> String {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
        .to_string()
}

/// Outcome of [`import_layout`]. `layout` is usable even when malformed.
#[derive(Debug, Clone, PartialEq)]
pub struct LayoutImport {
    pub layout: Layout,
    pub status: LoadStatus,
}

/// Parse a saved layout. Never fails; see [`LayoutImport::status`].
pub fn import_layout(json: &str) -> LayoutImport {
    match parse_layout(json) {
        Ok(import) => import,
        Err(e) => {
            log::warn!("layout import failed: {e}");
            LayoutImport {
                layout: Layout::default(),
                status: LoadStatus::Malformed(e.to_string()),
            }
        }
    }
}

fn parse_layout(json: &str) -> StudioResult<LayoutImport> {
    let value: Value = serde_json::from_str(json)?;
    let empty = Map::new();
    let (header, entries) = match &value {
        Value::Array(items) => (&empty, items.as_slice()),
        Value::Object(map) => {
            let entries = match map.get("widgets") {
                Some(Value::Array(items)) => items.as_slice(),
                _ => &[],
            };
            (map, entries)
        }
        _ => return Err(StudioError::Shape { expected: "layout" }),
    };

    let mut widgets = Vec::with_capacity(entries.len());
    let mut skipped = 0;
    for (index, entry) in entries.iter().enumerate() {
        match serde_json::from_value::<Widget>(entry.clone()) {
            Ok(mut widget) => {
                widgets.push(widget);
            }
            Err(e) => {
                log::debug!("skipping widget {index}: {e}");
                skipped += 1;
            }
        }
    }

    let text = |key: &str| {
        header
            .get(key)
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string()
    };
    let extent = |key: &str| {
        header
            .get(key)
            .and_then(Value::as_f64)
            .map_or(f32::NAN, |v| v as f32)
    };

    let canvas_width = clamp_canvas_extent(extent("canvasWidth"), MIN_CANVAS_WIDTH, DEFAULT_CANVAS_WIDTH);
    let canvas_height = clamp_canvas_extent(extent("canvasHeight"), MIN_CANVAS_HEIGHT, DEFAULT_CANVAS_HEIGHT);
    for widget in &mut widgets {
        widget.geometry = widget.geometry.sanitized().fitted(canvas_width, canvas_height);
    }

    let layout = Layout {
        background_url: text("backgroundUrl"),
        frame_url: text("frameUrl"),
        canvas_width,
        canvas_height,
        widgets,
    };

    let status = if skipped > 0 {
        LoadStatus::Recovered {
            loaded: layout.widgets.len(),
            skipped,
        }
    } else {
        LoadStatus::from_count(layout.widgets.len())
    };
    log::info!("imported layout: {status}");
    Ok(LayoutImport { layout, status })
}
