//! Markup extractor: loosely structured tag/attribute markup → widgets.
//!
//! This is a best-effort heuristic scanner, not a grammar. It finds tag
//! openings, tokenizes their attributes and resolves each field with a fixed
//! precedence: inline style > explicit attribute > deterministic fallback.
//! Callers should depend on [`extract`] and those precedence rules only.

use crate::attrs::{Attributes, StyleBlock, decode_entities};
use crate::id::WidgetId;
use crate::model::*;
use winnow::error::{ContextError, ErrMode};
use winnow::prelude::*;
use winnow::token::{take_till, take_while};

/// Fallback placement for widgets without resolvable position: an
/// 8-column grid starting at (20, 20) with a 28px pitch.
pub const CASCADE_ORIGIN: f32 = 20.0;
pub const CASCADE_PITCH: f32 = 28.0;
pub const CASCADE_COLUMNS: usize = 8;

/// Elements that never have text content, with or without `/>`.
const VOID_ELEMENTS: &[&str] = &["img", "input", "br", "hr", "meta", "link", "source", "area"];

const ICON_TAGS: &[&str] = &["img", "image", "svg", "icon", "picture"];
const SLIDER_KEYWORDS: &[&str] = &["slider", "dimmer", "volume"];

/// Join attributes in priority order; the first numeric, non-negative one wins.
const JOIN_KEYS: &[&str] = &["data-join", "join", "digitalJoin", "analogJoin", "serialJoin"];

/// One tag opening found in the markup.
#[derive(Debug, Clone)]
pub struct TagMatch<'a> {
    pub name: &'a str,
    pub attrs: Attributes<'a>,
    pub self_closing: bool,
    /// Raw text run between this tag's `>` and the next `<`.
    pub trailing_text: &'a str,
}

impl TagMatch<'_> {
    /// Trimmed, entity-decoded text run; always empty for void/self-closing tags.
    pub fn text_content(&self) -> String {
        if self.self_closing {
            return String::new();
        }
        decode_entities(self.trailing_text.trim()).into_owned()
    }
}

/// Extract widgets from markup, one per tag opening, in document order.
///
/// An empty result is a valid "nothing found" outcome, not a failure.
#[must_use]
pub fn extract(markup: &str) -> Vec<Widget> {
    let tags = scan_tags(markup);
    let mut cascade = 0usize;
    let widgets: Vec<Widget> = tags
        .iter()
        .enumerate()
        .map(|(index, tag)| widget_from_tag(tag, index, &mut cascade))
        .collect();
    log::debug!(
        "extracted {} widgets ({} cascaded) from {} bytes of markup",
        widgets.len(),
        cascade,
        markup.len()
    );
    widgets
}

/// Find every tag opening, skipping closing tags, comments and declarations.
pub fn scan_tags(markup: &str) -> Vec<TagMatch<'_>> {
    let mut tags = Vec::new();
    let mut rest = markup;

    while let Some(pos) = rest.find('<') {
        rest = &rest[pos..];

        if let Some(after) = rest.strip_prefix("<!--") {
            rest = after.find("-->").map_or("", |end| &after[end + 3..]);
            continue;
        }
        if rest.starts_with("</") || rest.starts_with("<!") || rest.starts_with("<?") {
            rest = rest.find('>').map_or("", move |end| &rest[end + 1..]);
            continue;
        }

        let checkpoint = rest;
        match open_tag.parse_next(&mut rest) {
            Ok((name, attrs, explicit_close)) => {
                let is_void = VOID_ELEMENTS.contains(&name.to_ascii_lowercase().as_str());
                let trailing_text = if explicit_close || is_void {
                    ""
                } else {
                    take_till::<_, _, ContextError>(0.., '<')
                        .parse_peek(rest)
                        .map(|(_, text)| text)
                        .unwrap_or("")
                };
                tags.push(TagMatch {
                    name,
                    attrs,
                    self_closing: explicit_close || is_void,
                    trailing_text,
                });
            }
            Err(_) => {
                log::trace!("skipping stray '<' at byte {}", markup.len() - checkpoint.len());
                rest = &checkpoint[1..];
            }
        }
    }

    tags
}

/// `<Name attrs>` or `<Name attrs />`. Returns whether the tag self-closes.
fn open_tag<'a>(input: &mut &'a str) -> ModalResult<(&'a str, Attributes<'a>, bool)> {
    let _ = '<'.parse_next(input)?;
    let name = take_while(1.., |c: char| {
        c.is_alphanumeric() || matches!(c, '-' | '_' | '.' | ':')
    })
    .verify(|s: &str| s.starts_with(|c: char| c.is_alphabetic()))
    .parse_next(input)?;
    let attrs = Attributes::scan(input);
    *input = input.trim_start();
    if let Some(after) = input.strip_prefix("/>") {
        *input = after;
        Ok((name, attrs, true))
    } else if let Some(after) = input.strip_prefix('>') {
        *input = after;
        Ok((name, attrs, false))
    } else {
        Err(ErrMode::Backtrack(ContextError::new()))
    }
}

fn widget_from_tag(tag: &TagMatch<'_>, index: usize, cascade: &mut usize) -> Widget {
    let attrs = &tag.attrs;
    let style = attrs.style();

    let kind = resolve_kind(tag.name, attrs);
    let (join_type, join, direction) = resolve_join(attrs);
    let text_content = tag.text_content();

    let id = attrs
        .get_non_empty(&["id"])
        .map(|id| WidgetId::intern(&id))
        .unwrap_or_else(|| WidgetId::with_prefix(&format!("widget_{index}")));

    let name = attrs
        .get_non_empty(&["data-name", "name", "aria-label"])
        .or_else(|| (!text_content.is_empty()).then(|| text_content.clone()))
        .unwrap_or_else(|| kind.placeholder_name(index + 1));

    let section = attrs
        .get_non_empty(&["data-section", "section"])
        .unwrap_or_else(|| DEFAULT_SECTION.to_string());

    Widget {
        id,
        kind,
        name,
        section,
        geometry: resolve_geometry(attrs, &style, cascade),
        join_type,
        join,
        direction,
        database: resolve_database(attrs),
        style: resolve_style(&style),
        text_content,
    }
}

/// Position of the `slot`-th widget that needed a fallback position.
pub fn cascade_position(slot: usize) -> (f32, f32) {
    let col = (slot % CASCADE_COLUMNS) as f32;
    let row = (slot / CASCADE_COLUMNS) as f32;
    (
        CASCADE_ORIGIN + col * CASCADE_PITCH,
        CASCADE_ORIGIN + row * CASCADE_PITCH,
    )
}

fn resolve_geometry(attrs: &Attributes<'_>, style: &StyleBlock, cascade: &mut usize) -> Geometry {
    let x = style
        .number("left")
        .or_else(|| attrs.number_any(&["x", "left", "data-x"]));
    let y = style
        .number("top")
        .or_else(|| attrs.number_any(&["y", "top", "data-y"]));
    let w = style
        .number("width")
        .or_else(|| attrs.number_any(&["width", "w", "data-w"]));
    let h = style
        .number("height")
        .or_else(|| attrs.number_any(&["height", "h", "data-h"]));

    let (fallback_x, fallback_y) = if x.is_none() || y.is_none() {
        let slot = *cascade;
        *cascade += 1;
        cascade_position(slot)
    } else {
        (0.0, 0.0)
    };

    Geometry::new(
        x.unwrap_or(fallback_x),
        y.unwrap_or(fallback_y),
        w.unwrap_or(DEFAULT_WIDGET_WIDTH),
        h.unwrap_or(DEFAULT_WIDGET_HEIGHT),
    )
    .for_import()
}

fn resolve_kind(tag: &str, attrs: &Attributes<'_>) -> WidgetKind {
    if let Some(kind) = attrs
        .get("data-widget-type")
        .and_then(|s| s.parse::<WidgetKind>().ok())
    {
        return kind;
    }

    let tag = tag.to_ascii_lowercase();
    let raw = attrs.raw().to_ascii_lowercase();
    let input_type = attrs.get("type").map(|t| t.trim().to_ascii_lowercase());

    if tag.contains("button") || raw.contains("button") {
        WidgetKind::Button
    } else if ICON_TAGS.contains(&tag.as_str()) || tag.contains("icon") || tag.contains("image") {
        WidgetKind::Icon
    } else if input_type.as_deref() == Some("range")
        || SLIDER_KEYWORDS
            .iter()
            .any(|k| tag.contains(k) || raw.contains(k))
    {
        WidgetKind::Slider
    } else {
        WidgetKind::Label
    }
}

fn resolve_join(attrs: &Attributes<'_>) -> (JoinType, u32, Direction) {
    let join = JOIN_KEYS
        .iter()
        .find_map(|key| attrs.number_f64(key).and_then(join_number))
        .unwrap_or(0);

    let join_type = attrs
        .get_any(&["data-join-type", "joinType"])
        .and_then(|s| s.parse::<JoinType>().ok())
        .unwrap_or_else(|| {
            if attrs.has("analogJoin") {
                JoinType::Analog
            } else if attrs.has("serialJoin") {
                JoinType::Serial
            } else {
                JoinType::Digital
            }
        });

    let direction = attrs
        .get_any(&["data-direction", "direction"])
        .and_then(|s| s.parse::<Direction>().ok())
        .unwrap_or_default();

    (join_type, join, direction)
}

fn resolve_database(attrs: &Attributes<'_>) -> DatabaseBinding {
    let db_entity = attrs
        .get_non_empty(&["data-db-entity", "dbEntity"])
        .unwrap_or_default();
    let db_field = attrs
        .get_non_empty(&["data-db-field", "dbField"])
        .unwrap_or_default();
    let db_mode = attrs
        .get_any(&["data-db-mode", "dbMode"])
        .and_then(|s| s.parse::<DbMode>().ok())
        .unwrap_or_default();
    let marker = attrs.flag("data-db-tool") || attrs.flag("isDatabaseTool");

    DatabaseBinding {
        is_database_tool: marker || !db_entity.is_empty() || !db_field.is_empty(),
        db_entity,
        db_field,
        db_mode,
    }
}

fn resolve_style(style: &StyleBlock) -> WidgetStyle {
    let mut out = WidgetStyle::default();
    if let Some(bg) = style
        .text("background")
        .or_else(|| style.text("backgroundColor"))
    {
        out.background_color = bg.to_string();
    }
    for key in &WidgetStyle::KEYS[1..] {
        if let Some(value) = style.text(key) {
            out.set(key, value);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn single(markup: &str) -> Widget {
        let widgets = extract(markup);
        assert_eq!(widgets.len(), 1, "expected one widget from {markup}");
        widgets.into_iter().next().unwrap()
    }

    #[test]
    fn inline_style_geometry_is_verbatim() {
        let w = single(r#"<div style={{ left: 120, top: 80, width: 200, height: 72 }} />"#);
        assert_eq!(w.geometry, Geometry::new(120.0, 80.0, 200.0, 72.0));
    }

    #[test]
    fn style_beats_attributes() {
        let w = single(r#"<div x="5" y="6" width="300" style={{ left: 10, top: 11 }} />"#);
        assert_eq!(w.geometry.x, 10.0);
        assert_eq!(w.geometry.y, 11.0);
        assert_eq!(w.geometry.w, 300.0);
    }

    #[test]
    fn explicit_join_metadata() {
        let w = single(r#"<button data-join="1201" data-join-type="digital" data-direction="input">Go</button>"#);
        assert_eq!(w.join, 1201);
        assert_eq!(w.join_type, JoinType::Digital);
        assert_eq!(w.direction, Direction::Input);
        assert_eq!(w.kind, WidgetKind::Button);
    }

    #[test]
    fn range_input_infers_analog_slider() {
        let w = single(r#"<input type="range" data-join="2301" analogJoin={2301} />"#);
        assert_eq!(w.kind, WidgetKind::Slider);
        assert_eq!(w.join_type, JoinType::Analog);
        assert_eq!(w.join, 2301);
    }

    #[test]
    fn large_join_survives_extraction() {
        assert_eq!(single(r#"<div data-join="16777217" />"#).join, 16_777_217);
    }

    #[test]
    fn negative_position_is_raised_to_origin() {
        let w = single(r#"<div style={{ left: -50, top: -30, width: 200, height: 72 }} />"#);
        assert_eq!(w.geometry, Geometry::new(0.0, 0.0, 200.0, 72.0));
    }

    #[test]
    fn join_priority_skips_non_numeric() {
        let w = single(r#"<Label join="abc" serialJoin={42} />"#);
        assert_eq!(w.join, 42);
        assert_eq!(w.join_type, JoinType::Serial);
    }

    #[test]
    fn database_tool_metadata() {
        let w = single(
            r#"<span data-db-tool data-db-entity="rooms" data-db-field="status" data-db-mode="readwrite">Room</span>"#,
        );
        assert!(w.database.is_database_tool);
        assert_eq!(w.database.db_entity, "rooms");
        assert_eq!(w.database.db_field, "status");
        assert_eq!(w.database.db_mode, DbMode::Readwrite);

        let w = single(r#"<span data-db-field="level" />"#);
        assert!(w.database.is_database_tool);
    }

    #[test]
    fn text_content_rules() {
        let w = single(r#"<span data-join="5">Hello World</span>"#);
        assert_eq!(w.text_content, "Hello World");
        assert_eq!(w.name, "Hello World");

        let w = single(r#"<span data-join="5" />Trailing"#);
        assert_eq!(w.text_content, "");

        let w = single(r#"<img src="a.png">caption"#);
        assert_eq!(w.text_content, "");
        assert_eq!(w.kind, WidgetKind::Icon);
    }

    #[test]
    fn bare_tag_uses_full_fallback_chain() {
        let w = single("<Thing>");
        assert_eq!(w.geometry, Geometry::new(CASCADE_ORIGIN, CASCADE_ORIGIN, DEFAULT_WIDGET_WIDTH, DEFAULT_WIDGET_HEIGHT));
        assert_eq!(w.join, 0);
        assert_eq!(w.join_type, JoinType::Digital);
        assert_eq!(w.kind, WidgetKind::Label);
        assert_eq!(w.name, "Label 1");
        assert_eq!(w.section, DEFAULT_SECTION);
        assert!(w.style.is_empty());
    }

    #[test]
    fn cascade_never_collides() {
        let markup = "<a/>".repeat(20);
        let widgets = extract(&markup);
        assert_eq!(widgets.len(), 20);
        for (i, a) in widgets.iter().enumerate() {
            for b in &widgets[i + 1..] {
                assert!((a.geometry.x, a.geometry.y) != (b.geometry.x, b.geometry.y));
            }
        }
        assert_eq!((widgets[8].geometry.x, widgets[8].geometry.y), (20.0, 48.0));
    }

    #[test]
    fn closing_tags_and_comments_are_skipped() {
        let widgets = extract("<!-- <fake/> --><div>One</div>\n</div><!DOCTYPE html>< 3 <p>Two</p>");
        let texts: Vec<_> = widgets.iter().map(|w| w.text_content.as_str()).collect();
        assert_eq!(texts, vec!["One", "Two"]);
    }

    #[test]
    fn empty_input_yields_nothing() {
        assert!(extract("").is_empty());
        assert!(extract("just text, no tags").is_empty());
    }

    #[test]
    fn minimum_size_is_enforced() {
        let w = single(r#"<div style={{ width: 10, height: 5 }} />"#);
        assert_eq!((w.geometry.w, w.geometry.h), (IMPORT_MIN_WIDTH, IMPORT_MIN_HEIGHT));
    }

    #[test]
    fn style_strings_resolve_individually() {
        let w = single(
            r#"<div style={{ backgroundColor: '#111', color: 'white', fontSize: 14, borderRadius: '50%' }} />"#,
        );
        assert_eq!(w.style.background_color, "#111");
        assert_eq!(w.style.color, "white");
        assert_eq!(w.style.font_size, "14");
        assert_eq!(w.style.border_radius, "50%");

        let w = single(r#"<div style={{ background: 'red', backgroundColor: 'blue' }} />"#);
        assert_eq!(w.style.background_color, "red");
    }

    #[test]
    fn explicit_id_and_section() {
        let w = single(r#"<VolumeSlider id="vol" data-section="Audio" />"#);
        assert_eq!(w.id.as_str(), "vol");
        assert_eq!(w.section, "Audio");
        assert_eq!(w.kind, WidgetKind::Slider);
    }

    #[test]
    fn arrow_functions_do_not_end_the_tag() {
        let w = single(r#"<button onClick={() => a > b}>Tap</button>"#);
        assert_eq!(w.text_content, "Tap");
    }
}
