//! Builder project importer.
//!
//! Converts one page of an external builder project (pages of positioned
//! elements with join wiring) into canvas widgets. Importing a page is a
//! destructive load: the caller replaces its whole widget set with the
//! result.

use crate::error::{StudioError, StudioResult};
use crate::id::WidgetId;
use crate::model::*;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// Join fields checked in order; the first that resolves wins.
const JOIN_PRIORITY: [&str; 4] = ["press", "value", "feedback", "text"];

// ─── External schema ─────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Project {
    #[serde(deserialize_with = "lenient_string")]
    pub name: String,
    pub pages: Vec<Page>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Page {
    #[serde(deserialize_with = "lenient_string")]
    pub id: String,
    #[serde(deserialize_with = "lenient_string")]
    pub name: String,
    #[serde(deserialize_with = "lenient_opt_f64")]
    pub width: Option<f64>,
    #[serde(deserialize_with = "lenient_opt_f64")]
    pub height: Option<f64>,
    pub background_image: Option<String>,
    pub elements: Vec<Element>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Element {
    #[serde(deserialize_with = "lenient_string")]
    pub id: String,
    #[serde(rename = "type", deserialize_with = "lenient_string")]
    pub kind: String,
    pub name: Option<String>,
    #[serde(deserialize_with = "lenient_f32")]
    pub x: f32,
    #[serde(deserialize_with = "lenient_f32")]
    pub y: f32,
    #[serde(deserialize_with = "lenient_f32")]
    pub width: f32,
    #[serde(deserialize_with = "lenient_f32")]
    pub height: f32,
    pub joins: Option<BTreeMap<String, JoinRef>>,
    #[serde(deserialize_with = "lenient_opt_f64")]
    pub digital_join: Option<f64>,
    #[serde(deserialize_with = "lenient_opt_f64")]
    pub analog_join: Option<f64>,
    #[serde(deserialize_with = "lenient_opt_f64")]
    pub serial_join: Option<f64>,
}

/// A `joins` map entry: a bare number or a descriptor object.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum JoinRef {
    Number(f64),
    Descriptor(JoinDescriptor),
    /// Anything else; never resolves.
    Other(Value),
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct JoinDescriptor {
    #[serde(rename = "type")]
    pub join_type: Option<String>,
    #[serde(deserialize_with = "lenient_opt_f64")]
    pub number: Option<f64>,
    pub description: Option<String>,
}

// ─── Import result ───────────────────────────────────────────────────────

/// Canvas state produced from one page.
#[derive(Debug, Clone, PartialEq)]
pub struct PageImport {
    pub widgets: Vec<Widget>,
    pub canvas_width: f32,
    pub canvas_height: f32,
    /// Carried through unresolved; asset resolution belongs to the host.
    pub background_url: Option<String>,
    pub status: LoadStatus,
}

impl PageImport {
    /// Result for input that could not be read at all.
    pub fn malformed(message: impl Into<String>) -> Self {
        Self {
            widgets: Vec::new(),
            canvas_width: DEFAULT_CANVAS_WIDTH,
            canvas_height: DEFAULT_CANVAS_HEIGHT,
            background_url: None,
            status: LoadStatus::Malformed(message.into()),
        }
    }
}

// ─── Parsing ─────────────────────────────────────────────────────────────

/// Parse a builder project. A bare page object is wrapped into a
/// one-page project.
pub fn parse_project(json: &str) -> StudioResult<Project> {
    let value: Value = serde_json::from_str(json)?;
    match &value {
        Value::Object(map) if map.contains_key("pages") => Ok(serde_json::from_value(value)?),
        Value::Object(map) if map.contains_key("elements") => {
            let page: Page = serde_json::from_value(value)?;
            Ok(Project {
                name: page.name.clone(),
                pages: vec![page],
            })
        }
        _ => Err(StudioError::Shape {
            expected: "builder project",
        }),
    }
}

impl Project {
    pub fn page(&self, index: usize) -> StudioResult<&Page> {
        self.pages.get(index).ok_or(StudioError::PageOutOfRange {
            index,
            count: self.pages.len(),
        })
    }
}

/// Parse a project and import one of its pages. Never fails: unreadable
/// input yields [`PageImport::malformed`].
pub fn load_project_page(json: &str, page_index: usize) -> PageImport {
    let imported = parse_project(json).and_then(|project| {
        let page = project.page(page_index)?;
        Ok(import_project_page(page))
    });
    imported.unwrap_or_else(|e| {
        log::warn!("builder project import failed: {e}");
        PageImport::malformed(e.to_string())
    })
}

// ─── Conversion ──────────────────────────────────────────────────────────

/// Convert one page into canvas state.
#[must_use]
pub fn import_project_page(page: &Page) -> PageImport {
    let section = match page.name.trim() {
        "" => DEFAULT_SECTION,
        name => name,
    };

    let canvas_width = clamp_canvas_extent(
        page.width.map_or(f32::NAN, |w| w as f32),
        MIN_CANVAS_WIDTH,
        DEFAULT_CANVAS_WIDTH,
    );
    let canvas_height = clamp_canvas_extent(
        page.height.map_or(f32::NAN, |h| h as f32),
        MIN_CANVAS_HEIGHT,
        DEFAULT_CANVAS_HEIGHT,
    );

    let widgets: Vec<Widget> = page
        .elements
        .iter()
        .enumerate()
        .map(|(index, element)| {
            let mut widget = widget_from_element(element, index, section);
            widget.geometry = widget.geometry.fitted(canvas_width, canvas_height);
            widget
        })
        .collect();

    log::info!(
        "imported page `{}`: {} widgets on {canvas_width}x{canvas_height}",
        page.name,
        widgets.len()
    );

    PageImport {
        status: LoadStatus::from_count(widgets.len()),
        widgets,
        canvas_width,
        canvas_height,
        background_url: page
            .background_image
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string),
    }
}

fn widget_from_element(element: &Element, index: usize, section: &str) -> Widget {
    let kind = infer_kind(&element.kind);
    let (join_type, join, direction) = derive_join(element);

    let id = match element.id.trim() {
        "" => WidgetId::with_prefix("element"),
        id => WidgetId::intern(id),
    };
    let name = element
        .name
        .as_deref()
        .map(str::trim)
        .filter(|n| !n.is_empty())
        .or_else(|| Some(element.id.trim()).filter(|id| !id.is_empty()))
        .map_or_else(|| kind.placeholder_name(index + 1), str::to_string);

    let mut widget = Widget::new(kind)
        .with_id(id)
        .with_geometry(
            Geometry::new(element.x, element.y, element.width, element.height).for_import(),
        )
        .with_join(join_type, join, direction);
    widget.name = name;
    widget.assign_section(section);
    widget
}

/// Widget kind from the element's free-form type, by keyword group.
pub fn infer_kind(element_type: &str) -> WidgetKind {
    let t = element_type.to_lowercase();
    let has = |words: &[&str]| words.iter().any(|w| t.contains(w));
    if has(&["slider", "dimmer", "volume"]) {
        WidgetKind::Slider
    } else if has(&["button", "scene"]) {
        WidgetKind::Button
    } else if has(&["image", "icon"]) {
        WidgetKind::Icon
    } else {
        WidgetKind::Label
    }
}

/// Resolve an element's join: `joins.press > value > feedback > text`, then
/// the top-level `digitalJoin > analogJoin > serialJoin`, else digital 0.
pub fn derive_join(element: &Element) -> (JoinType, u32, Direction) {
    if let Some(joins) = &element.joins {
        for key in JOIN_PRIORITY {
            let resolved = match joins.get(key) {
                Some(JoinRef::Number(n)) => {
                    join_number(*n).map(|j| (JoinType::Digital, j, Direction::Input))
                }
                Some(JoinRef::Descriptor(descriptor)) => {
                    descriptor.number.and_then(join_number).map(|j| {
                        let join_type = descriptor
                            .join_type
                            .as_deref()
                            .and_then(|t| t.parse().ok())
                            .unwrap_or_default();
                        let direction = if matches!(key, "feedback" | "text") {
                            Direction::Output
                        } else {
                            Direction::Input
                        };
                        (join_type, j, direction)
                    })
                }
                Some(JoinRef::Other(_)) | None => None,
            };
            if let Some(resolved) = resolved {
                return resolved;
            }
        }
    }

    let top_level = [
        (element.digital_join, JoinType::Digital),
        (element.analog_join, JoinType::Analog),
        (element.serial_join, JoinType::Serial),
    ];
    top_level
        .into_iter()
        .find_map(|(n, join_type)| {
            n.and_then(join_number)
                .map(|j| (join_type, j, Direction::Input))
        })
        .unwrap_or((JoinType::Digital, 0, Direction::Input))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn element(json: &str) -> Element {
        serde_json::from_str(json).expect("element json")
    }

    #[test]
    fn kind_keyword_groups() {
        assert_eq!(infer_kind("LightingDimmer"), WidgetKind::Slider);
        assert_eq!(infer_kind("SceneRecall"), WidgetKind::Button);
        assert_eq!(infer_kind("StatusIcon"), WidgetKind::Icon);
        assert_eq!(infer_kind("TextBox"), WidgetKind::Label);
        // Slider group is checked before the button group.
        assert_eq!(infer_kind("VolumeButton"), WidgetKind::Slider);
    }

    #[test]
    fn press_beats_feedback() {
        let el = element(r#"{"joins": {"feedback": {"type": "digital", "number": 9}, "press": 4}}"#);
        assert_eq!(derive_join(&el), (JoinType::Digital, 4, Direction::Input));
    }

    #[test]
    fn descriptor_supplies_type_and_output_direction() {
        let el = element(r#"{"joins": {"text": {"type": "serial", "number": 31, "description": "title"}}}"#);
        assert_eq!(derive_join(&el), (JoinType::Serial, 31, Direction::Output));

        let el = element(r#"{"joins": {"value": {"type": "analog", "number": "12"}}}"#);
        assert_eq!(derive_join(&el), (JoinType::Analog, 12, Direction::Input));
    }

    #[test]
    fn unresolvable_entries_fall_through() {
        let el = element(r#"{"joins": {"press": {"description": "no number"}, "value": "x"}, "analogJoin": 7}"#);
        assert_eq!(derive_join(&el), (JoinType::Analog, 7, Direction::Input));
    }

    #[test]
    fn no_join_is_unassigned_digital() {
        assert_eq!(derive_join(&Element::default()), (JoinType::Digital, 0, Direction::Input));
    }

    #[test]
    fn page_sets_section_canvas_and_clamps() {
        let page: Page = serde_json::from_str(
            r#"{"id": "p1", "name": "Living Room", "width": 200, "height": 900,
                "backgroundImage": "assets/bg.png",
                "elements": [{"id": "e1", "type": "button", "x": 5, "y": 6, "width": 10, "height": 10}]}"#,
        )
        .unwrap();
        let import = import_project_page(&page);
        assert_eq!(import.canvas_width, MIN_CANVAS_WIDTH);
        assert_eq!(import.canvas_height, 900.0);
        assert_eq!(import.background_url.as_deref(), Some("assets/bg.png"));
        let w = &import.widgets[0];
        assert_eq!(w.section, "Living Room");
        assert_eq!(w.name, "e1");
        assert_eq!(w.geometry, Geometry::new(5.0, 6.0, IMPORT_MIN_WIDTH, IMPORT_MIN_HEIGHT));
    }

    #[test]
    fn off_page_elements_are_pulled_onto_the_canvas() {
        let page: Page = serde_json::from_str(
            r#"{"name": "Den", "width": 400, "height": 300, "elements": [
                {"id": "far", "type": "button", "x": -40, "y": 5000, "width": 9000, "height": 50}]}"#,
        )
        .unwrap();
        let import = import_project_page(&page);
        assert_eq!(import.widgets[0].geometry, Geometry::new(0.0, 250.0, 400.0, 50.0));
    }

    #[test]
    fn empty_page_is_distinguishable() {
        let import = load_project_page(r#"{"name": "P", "pages": [{"name": "Empty"}]}"#, 0);
        assert!(import.widgets.is_empty());
        assert_eq!(import.status, LoadStatus::Empty);
    }

    #[test]
    fn bad_input_is_malformed_not_fatal() {
        assert!(load_project_page("{not json", 0).status.is_malformed());
        assert!(load_project_page("[1, 2]", 0).status.is_malformed());
        assert!(load_project_page(r#"{"pages": []}"#, 3).status.is_malformed());
    }

    #[test]
    fn bare_page_is_accepted() {
        let project = parse_project(r#"{"name": "Solo", "elements": []}"#).unwrap();
        assert_eq!(project.pages.len(), 1);
        assert_eq!(project.name, "Solo");
    }
}
