//! Canonical widget model for the studio canvas.
//!
//! Every importer (markup extractor, builder project importer, layout JSON)
//! produces `Widget`s, and every exporter consumes them. A widget is a flat
//! record: a closed kind, geometry in canvas pixels, a single join wiring,
//! optional database-tool metadata and free-form style overrides.
//!
//! Deserialization is lenient: missing fields take defaults, unknown
//! keywords fall back to the default variant, and numbers may arrive as
//! numeric strings.

use crate::attrs::parse_number;
use crate::error::StudioError;
use crate::id::WidgetId;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;

// ─── Constants ───────────────────────────────────────────────────────────

/// Minimum size enforced on every imported widget.
pub const IMPORT_MIN_WIDTH: f32 = 60.0;
pub const IMPORT_MIN_HEIGHT: f32 = 40.0;

/// Minimum size enforced when a resize is captured from the canvas.
pub const RESIZE_MIN_WIDTH: f32 = 80.0;
pub const RESIZE_MIN_HEIGHT: f32 = 60.0;

pub const DEFAULT_WIDGET_WIDTH: f32 = 160.0;
pub const DEFAULT_WIDGET_HEIGHT: f32 = 56.0;

pub const DEFAULT_CANVAS_WIDTH: f32 = 1024.0;
pub const DEFAULT_CANVAS_HEIGHT: f32 = 600.0;
pub const MIN_CANVAS_WIDTH: f32 = 320.0;
pub const MIN_CANVAS_HEIGHT: f32 = 240.0;

pub const DEFAULT_SECTION: &str = "default";

// ─── Keyword enums ───────────────────────────────────────────────────────

/// The closed set of widget kinds the canvas knows how to place.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum WidgetKind {
    Button,
    #[default]
    Label,
    Slider,
    Icon,
}

impl WidgetKind {
    pub const ALL: [WidgetKind; 4] = [Self::Button, Self::Label, Self::Slider, Self::Icon];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Button => "button",
            Self::Label => "label",
            Self::Slider => "slider",
            Self::Icon => "icon",
        }
    }

    /// Capitalized name used for generated placeholders (`Button 3`).
    pub fn title(&self) -> &'static str {
        match self {
            Self::Button => "Button",
            Self::Label => "Label",
            Self::Slider => "Slider",
            Self::Icon => "Icon",
        }
    }

    pub fn placeholder_name(&self, n: usize) -> String {
        format!("{} {n}", self.title())
    }
}

impl FromStr for WidgetKind {
    type Err = StudioError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "button" => Ok(Self::Button),
            "label" => Ok(Self::Label),
            "slider" => Ok(Self::Slider),
            "icon" => Ok(Self::Icon),
            _ => Err(StudioError::UnknownKeyword {
                kind: "widget type",
                value: s.to_string(),
            }),
        }
    }
}

/// Signal class of a join.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum JoinType {
    #[default]
    Digital,
    Analog,
    Serial,
}

impl JoinType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Digital => "digital",
            Self::Analog => "analog",
            Self::Serial => "serial",
        }
    }
}

impl FromStr for JoinType {
    type Err = StudioError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "digital" => Ok(Self::Digital),
            "analog" => Ok(Self::Analog),
            "serial" => Ok(Self::Serial),
            _ => Err(StudioError::UnknownKeyword {
                kind: "join type",
                value: s.to_string(),
            }),
        }
    }
}

/// Whether the widget sends (`Input`) or displays (`Output`) the join value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    #[default]
    Input,
    Output,
}

impl Direction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Input => "input",
            Self::Output => "output",
        }
    }
}

impl FromStr for Direction {
    type Err = StudioError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "input" => Ok(Self::Input),
            "output" => Ok(Self::Output),
            _ => Err(StudioError::UnknownKeyword {
                kind: "direction",
                value: s.to_string(),
            }),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DbMode {
    #[default]
    Read,
    Write,
    Readwrite,
}

impl DbMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Read => "read",
            Self::Write => "write",
            Self::Readwrite => "readwrite",
        }
    }
}

impl FromStr for DbMode {
    type Err = StudioError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "read" => Ok(Self::Read),
            "write" => Ok(Self::Write),
            "readwrite" | "read-write" | "read_write" => Ok(Self::Readwrite),
            _ => Err(StudioError::UnknownKeyword {
                kind: "database mode",
                value: s.to_string(),
            }),
        }
    }
}

// ─── Geometry ────────────────────────────────────────────────────────────

/// Top-left position and size in canvas pixels.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Geometry {
    #[serde(deserialize_with = "lenient_f32")]
    pub x: f32,
    #[serde(deserialize_with = "lenient_f32")]
    pub y: f32,
    #[serde(deserialize_with = "lenient_f32")]
    pub w: f32,
    #[serde(deserialize_with = "lenient_f32")]
    pub h: f32,
}

impl Default for Geometry {
    fn default() -> Self {
        Self {
            x: 0.0,
            y: 0.0,
            w: DEFAULT_WIDGET_WIDTH,
            h: DEFAULT_WIDGET_HEIGHT,
        }
    }
}

impl Geometry {
    pub const fn new(x: f32, y: f32, w: f32, h: f32) -> Self {
        Self { x, y, w, h }
    }

    /// Replace non-finite components (position with 0, size with the
    /// default) and raise negative components to 0.
    pub fn sanitized(self) -> Self {
        let finite_or = |v: f32, fallback: f32| if v.is_finite() { v.max(0.0) } else { fallback };
        Self {
            x: finite_or(self.x, 0.0),
            y: finite_or(self.y, 0.0),
            w: finite_or(self.w, DEFAULT_WIDGET_WIDTH),
            h: finite_or(self.h, DEFAULT_WIDGET_HEIGHT),
        }
    }

    /// Shrink to the canvas, then pull the box back inside it.
    pub fn fitted(self, canvas_width: f32, canvas_height: f32) -> Self {
        let w = self.w.min(canvas_width);
        let h = self.h.min(canvas_height);
        Self {
            x: self.x.min(canvas_width - w).max(0.0),
            y: self.y.min(canvas_height - h).max(0.0),
            w,
            h,
        }
    }

    /// Raise width/height to at least the given minimums.
    pub fn with_min_size(self, min_w: f32, min_h: f32) -> Self {
        Self {
            w: self.w.max(min_w),
            h: self.h.max(min_h),
            ..self
        }
    }

    /// Sanitize and apply the import minimums.
    pub fn for_import(self) -> Self {
        self.sanitized()
            .with_min_size(IMPORT_MIN_WIDTH, IMPORT_MIN_HEIGHT)
    }

    pub fn translated(self, dx: f32, dy: f32) -> Self {
        Self {
            x: self.x + dx,
            y: self.y + dy,
            ..self
        }
    }

    pub fn right(&self) -> f32 {
        self.x + self.w
    }

    pub fn bottom(&self) -> f32 {
        self.y + self.h
    }

    pub fn contains(&self, px: f32, py: f32) -> bool {
        px >= self.x && px <= self.right() && py >= self.y && py <= self.bottom()
    }
}

// ─── Database tool metadata ──────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct DatabaseBinding {
    #[serde(deserialize_with = "lenient_bool")]
    pub is_database_tool: bool,
    #[serde(deserialize_with = "lenient_string")]
    pub db_entity: String,
    #[serde(deserialize_with = "lenient_string")]
    pub db_field: String,
    #[serde(deserialize_with = "lenient_keyword")]
    pub db_mode: DbMode,
}

// ─── Style overrides ─────────────────────────────────────────────────────

/// Visual overrides. An empty string means "inherit".
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct WidgetStyle {
    #[serde(deserialize_with = "lenient_string")]
    pub background_color: String,
    #[serde(deserialize_with = "lenient_string")]
    pub color: String,
    #[serde(deserialize_with = "lenient_string")]
    pub border_radius: String,
    #[serde(deserialize_with = "lenient_string")]
    pub border: String,
    #[serde(deserialize_with = "lenient_string")]
    pub font_size: String,
    #[serde(deserialize_with = "lenient_string")]
    pub font_weight: String,
    #[serde(deserialize_with = "lenient_string")]
    pub text_align: String,
    #[serde(deserialize_with = "lenient_string")]
    pub opacity: String,
}

impl WidgetStyle {
    /// Style property names, camelCase, in emission order.
    pub const KEYS: [&'static str; 8] = [
        "backgroundColor",
        "color",
        "borderRadius",
        "border",
        "fontSize",
        "fontWeight",
        "textAlign",
        "opacity",
    ];

    pub fn get(&self, key: &str) -> Option<&str> {
        let value = match key {
            "backgroundColor" => &self.background_color,
            "color" => &self.color,
            "borderRadius" => &self.border_radius,
            "border" => &self.border,
            "fontSize" => &self.font_size,
            "fontWeight" => &self.font_weight,
            "textAlign" => &self.text_align,
            "opacity" => &self.opacity,
            _ => return None,
        };
        Some(value.as_str())
    }

    /// Set a property by its camelCase name. Unknown names are ignored.
    pub fn set(&mut self, key: &str, value: impl Into<String>) {
        let slot = match key {
            "backgroundColor" => &mut self.background_color,
            "color" => &mut self.color,
            "borderRadius" => &mut self.border_radius,
            "border" => &mut self.border,
            "fontSize" => &mut self.font_size,
            "fontWeight" => &mut self.font_weight,
            "textAlign" => &mut self.text_align,
            "opacity" => &mut self.opacity,
            _ => return,
        };
        *slot = value.into();
    }

    /// Non-empty overrides in emission order.
    pub fn overrides(&self) -> impl Iterator<Item = (&'static str, &str)> + '_ {
        Self::KEYS
            .iter()
            .filter_map(|key| self.get(key).map(|v| (*key, v)))
            .filter(|(_, v)| !v.is_empty())
    }

    pub fn is_empty(&self) -> bool {
        self.overrides().next().is_none()
    }
}

// ─── Widget ──────────────────────────────────────────────────────────────

/// The canonical unit placed on the canvas.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Widget {
    #[serde(deserialize_with = "lenient_id")]
    pub id: WidgetId,
    #[serde(rename = "type", deserialize_with = "lenient_keyword")]
    pub kind: WidgetKind,
    #[serde(deserialize_with = "lenient_string")]
    pub name: String,
    #[serde(deserialize_with = "lenient_section")]
    pub section: String,
    #[serde(flatten)]
    pub geometry: Geometry,
    #[serde(deserialize_with = "lenient_keyword")]
    pub join_type: JoinType,
    #[serde(deserialize_with = "lenient_join")]
    pub join: u32,
    #[serde(deserialize_with = "lenient_keyword")]
    pub direction: Direction,
    #[serde(flatten)]
    pub database: DatabaseBinding,
    #[serde(flatten)]
    pub style: WidgetStyle,
    #[serde(deserialize_with = "lenient_string")]
    pub text_content: String,
}

impl Default for Widget {
    fn default() -> Self {
        Self::new(WidgetKind::default())
    }
}

impl Widget {
    /// A fresh widget of the given kind with default geometry and wiring.
    pub fn new(kind: WidgetKind) -> Self {
        Self {
            id: WidgetId::fresh(),
            kind,
            name: kind.title().to_string(),
            section: DEFAULT_SECTION.to_string(),
            geometry: Geometry::default(),
            join_type: JoinType::default(),
            join: 0,
            direction: Direction::default(),
            database: DatabaseBinding::default(),
            style: WidgetStyle::default(),
            text_content: String::new(),
        }
    }

    pub fn with_id(mut self, id: WidgetId) -> Self {
        self.id = id;
        self
    }

    pub fn with_geometry(mut self, geometry: Geometry) -> Self {
        self.geometry = geometry;
        self
    }

    pub fn with_join(mut self, join_type: JoinType, join: u32, direction: Direction) -> Self {
        self.join_type = join_type;
        self.join = join;
        self.direction = direction;
        self
    }

    pub fn move_to(&mut self, x: f32, y: f32) {
        self.geometry.x = x;
        self.geometry.y = y;
    }

    pub fn resize_to(&mut self, w: f32, h: f32) {
        self.geometry.w = w;
        self.geometry.h = h;
    }

    /// Clone with a fresh id. Everything else, section included, is kept.
    pub fn duplicate(&self) -> Self {
        Self {
            id: WidgetId::fresh(),
            ..self.clone()
        }
    }

    pub fn retype(&mut self, kind: WidgetKind) {
        self.kind = kind;
    }

    /// Reassign to a section. Sections are exclusive, so this overwrites.
    pub fn assign_section(&mut self, section: &str) {
        let section = section.trim();
        self.section = if section.is_empty() {
            DEFAULT_SECTION.to_string()
        } else {
            section.to_string()
        };
    }

    pub fn contains_point(&self, x: f32, y: f32) -> bool {
        self.geometry.contains(x, y)
    }

    /// Text shown inside the widget: its literal content, else its name.
    pub fn display_text(&self) -> &str {
        if self.text_content.is_empty() {
            &self.name
        } else {
            &self.text_content
        }
    }
}

// ─── Layout (serializable canvas state) ─────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
pub struct Layout {
    pub background_url: String,
    pub frame_url: String,
    pub canvas_width: f32,
    pub canvas_height: f32,
    pub widgets: Vec<Widget>,
}

impl Default for Layout {
    fn default() -> Self {
        Self {
            background_url: String::new(),
            frame_url: String::new(),
            canvas_width: DEFAULT_CANVAS_WIDTH,
            canvas_height: DEFAULT_CANVAS_HEIGHT,
            widgets: Vec::new(),
        }
    }
}

impl Layout {
    pub fn with_widgets(widgets: Vec<Widget>) -> Self {
        Self {
            widgets,
            ..Self::default()
        }
    }
}

/// Clamp a canvas extent: non-finite falls back to `default`, then `min` applies.
pub fn clamp_canvas_extent(value: f32, min: f32, default: f32) -> f32 {
    if value.is_finite() { value.max(min) } else { default.max(min) }
}

// ─── Load status ─────────────────────────────────────────────────────────

/// Outcome of an import. Never an error: malformed input degrades to
/// defaults and is reported here.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadStatus {
    Loaded(usize),
    /// Input parsed fine but contained nothing to place.
    Empty,
    /// Some entries could not be read and were skipped.
    Recovered { loaded: usize, skipped: usize },
    Malformed(String),
}

impl LoadStatus {
    pub fn from_count(count: usize) -> Self {
        if count == 0 { Self::Empty } else { Self::Loaded(count) }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, Self::Empty)
    }

    pub fn is_malformed(&self) -> bool {
        matches!(self, Self::Malformed(_))
    }
}

impl fmt::Display for LoadStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Loaded(1) => f.write_str("Loaded 1 widget"),
            Self::Loaded(n) => write!(f, "Loaded {n} widgets"),
            Self::Empty => f.write_str("No widgets found"),
            Self::Recovered { loaded, skipped } => {
                write!(f, "Loaded {loaded} widgets, skipped {skipped} unreadable")
            }
            Self::Malformed(msg) => write!(f, "Could not read input: {msg}"),
        }
    }
}

// ─── Lenient deserializers ───────────────────────────────────────────────

pub(crate) fn lenient_keyword<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: FromStr + Default,
{
    let value = Value::deserialize(deserializer)?;
    Ok(value
        .as_str()
        .and_then(|s| s.parse().ok())
        .unwrap_or_default())
}

pub(crate) fn lenient_f32<'de, D: Deserializer<'de>>(deserializer: D) -> Result<f32, D::Error> {
    let value = Value::deserialize(deserializer)?;
    let n = match value {
        Value::Number(n) => n.as_f64().map(|v| v as f32),
        Value::String(s) => parse_number(&s),
        _ => None,
    };
    Ok(n.filter(|v| v.is_finite()).unwrap_or(0.0))
}

/// Optional number; absent, non-numeric and non-finite values become `None`.
pub(crate) fn lenient_opt_f64<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<Option<f64>, D::Error> {
    let value = Value::deserialize(deserializer)?;
    let n = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => parse_number(&s).map(f64::from),
        _ => None,
    };
    Ok(n.filter(|v| v.is_finite()))
}

pub(crate) fn lenient_join<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u32, D::Error> {
    let value = Value::deserialize(deserializer)?;
    let n = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => parse_number(&s).map(f64::from),
        _ => None,
    };
    Ok(n.and_then(join_number).unwrap_or(0))
}

/// Convert a numeric join to `u32`; negative or non-finite values are rejected.
pub fn join_number(n: f64) -> Option<u32> {
    (n.is_finite() && n >= 0.0 && n <= f64::from(u32::MAX)).then(|| n as u32)
}

pub(crate) fn lenient_string<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    let value = Value::deserialize(deserializer)?;
    Ok(match value {
        Value::String(s) => s,
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        _ => String::new(),
    })
}

pub(crate) fn lenient_section<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    let s = lenient_string(deserializer)?;
    Ok(if s.trim().is_empty() {
        DEFAULT_SECTION.to_string()
    } else {
        s
    })
}

pub(crate) fn lenient_bool<'de, D: Deserializer<'de>>(deserializer: D) -> Result<bool, D::Error> {
    let value = Value::deserialize(deserializer)?;
    Ok(match value {
        Value::Bool(b) => b,
        Value::Number(n) => n.as_f64().is_some_and(|v| v != 0.0),
        Value::String(s) => matches!(s.trim().to_ascii_lowercase().as_str(), "true" | "1" | "yes"),
        _ => false,
    })
}

pub(crate) fn lenient_id<'de, D: Deserializer<'de>>(deserializer: D) -> Result<WidgetId, D::Error> {
    let s = lenient_string(deserializer)?;
    Ok(if s.trim().is_empty() {
        WidgetId::fresh()
    } else {
        WidgetId::intern(&s)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn keywords_parse_case_insensitively() {
        assert_eq!("Slider".parse::<WidgetKind>().unwrap(), WidgetKind::Slider);
        assert_eq!(" ANALOG ".parse::<JoinType>().unwrap(), JoinType::Analog);
        assert_eq!("read-write".parse::<DbMode>().unwrap(), DbMode::Readwrite);
        assert!("knob".parse::<WidgetKind>().is_err());
    }

    #[test]
    fn widget_serializes_flat_camel_case() {
        let mut w = Widget::new(WidgetKind::Button).with_id(WidgetId::intern("pwr"));
        w.style.background_color = "#222".into();
        let json = serde_json::to_value(&w).unwrap();
        assert_eq!(json["id"], "pwr");
        assert_eq!(json["type"], "button");
        assert_eq!(json["joinType"], "digital");
        assert_eq!(json["backgroundColor"], "#222");
        assert_eq!(json["isDatabaseTool"], false);
        assert_eq!(json["w"], 160.0);
    }

    #[test]
    fn partial_widget_takes_defaults() {
        let w: Widget = serde_json::from_str(r#"{"id":"a","type":"knob","x":"12","join":-4}"#).unwrap();
        assert_eq!(w.id.as_str(), "a");
        assert_eq!(w.kind, WidgetKind::Label);
        assert_eq!(w.geometry.x, 12.0);
        assert_eq!(w.geometry.w, DEFAULT_WIDGET_WIDTH);
        assert_eq!(w.join, 0);
        assert_eq!(w.section, DEFAULT_SECTION);
        assert_eq!(w.style.color, "");
    }

    #[test]
    fn geometry_sanitizes_non_finite() {
        let g = Geometry::new(f32::NAN, 5.0, f32::INFINITY, 10.0).for_import();
        assert_eq!(g, Geometry::new(0.0, 5.0, DEFAULT_WIDGET_WIDTH, IMPORT_MIN_HEIGHT));
    }

    #[test]
    fn negative_geometry_is_raised_to_zero() {
        let g = Geometry::new(-50.0, -30.0, -10.0, 80.0).for_import();
        assert_eq!(g, Geometry::new(0.0, 0.0, IMPORT_MIN_WIDTH, 80.0));
    }

    #[test]
    fn fitted_keeps_box_on_canvas() {
        let g = Geometry::new(0.0, 5000.0, 9000.0, 50.0).fitted(400.0, 300.0);
        assert_eq!(g, Geometry::new(0.0, 250.0, 400.0, 50.0));

        let inside = Geometry::new(10.0, 20.0, 100.0, 50.0);
        assert_eq!(inside.fitted(400.0, 300.0), inside);
    }

    #[test]
    fn duplicate_gets_fresh_id() {
        let w = Widget::new(WidgetKind::Icon);
        let copy = w.duplicate();
        assert_ne!(w.id, copy.id);
        assert_eq!(w.geometry, copy.geometry);
        assert_eq!(w.kind, copy.kind);
    }

    #[test]
    fn assign_section_overwrites_and_defaults_blank() {
        let mut w = Widget::new(WidgetKind::Label);
        w.assign_section("Lights");
        assert_eq!(w.section, "Lights");
        w.assign_section("  ");
        assert_eq!(w.section, DEFAULT_SECTION);
    }

    #[test]
    fn style_overrides_skip_unset() {
        let mut style = WidgetStyle::default();
        assert!(style.is_empty());
        style.set("fontSize", "14");
        style.set("bogus", "1");
        let overrides: Vec<_> = style.overrides().collect();
        assert_eq!(overrides, vec![("fontSize", "14")]);
    }

    #[test]
    fn status_messages() {
        assert_eq!(LoadStatus::from_count(0), LoadStatus::Empty);
        assert_eq!(LoadStatus::from_count(3).to_string(), "Loaded 3 widgets");
        assert_eq!(LoadStatus::Empty.to_string(), "No widgets found");
    }
}
