//! Emitter: Layout → markup snippet.
//!
//! Produces one absolutely positioned `<div>` per widget. Every field the
//! extractor understands is written as a `data-*` attribute or a style
//! entry, so `extract(export_markup(layout))` reproduces the widgets apart
//! from their ids.

use crate::attrs::encode_entities;
use crate::model::*;
use std::fmt::Write;

/// Emit every widget of `layout`, one element per line. Canvas extents are
/// not part of the markup; they travel in the layout JSON.
#[must_use]
pub fn export_markup(layout: &Layout) -> String {
    let mut out = String::with_capacity(256 * layout.widgets.len());
    for widget in &layout.widgets {
        emit_widget(&mut out, widget);
        out.push('\n');
    }
    out
}

/// Emit a single widget element without surrounding whitespace.
pub fn emit_widget(out: &mut String, widget: &Widget) {
    out.push_str("<div");
    emit_attr(out, "data-widget-type", widget.kind.as_str());
    emit_attr(out, "data-name", &widget.name);
    emit_attr(out, "data-section", &widget.section);
    emit_attr(out, "data-join-type", widget.join_type.as_str());
    emit_attr(out, "data-join", &widget.join.to_string());
    emit_attr(out, "data-direction", widget.direction.as_str());

    let db = &widget.database;
    if db.is_database_tool {
        out.push_str(" data-db-tool");
        if !db.db_entity.is_empty() {
            emit_attr(out, "data-db-entity", &db.db_entity);
        }
        if !db.db_field.is_empty() {
            emit_attr(out, "data-db-field", &db.db_field);
        }
        emit_attr(out, "data-db-mode", db.db_mode.as_str());
    }

    emit_style(out, widget);
    out.push('>');
    out.push_str(&encode_entities(widget.display_text()));
    out.push_str("</div>");
}

fn emit_attr(out: &mut String, key: &str, value: &str) {
    let _ = write!(out, " {key}=\"{}\"", encode_entities(value));
}

fn emit_style(out: &mut String, widget: &Widget) {
    let g = &widget.geometry;
    let _ = write!(
        out,
        " style={{{{ position: 'absolute', left: {}, top: {}, width: {}, height: {}",
        format_num(g.x),
        format_num(g.y),
        format_num(g.w),
        format_num(g.h)
    );
    for (key, value) in widget.style.overrides() {
        let _ = write!(out, ", {key}: \"{}\"", encode_entities(value));
    }
    out.push_str(" }}");
}

/// Whole numbers without a fraction, everything else in shortest form.
fn format_num(n: f32) -> String {
    if n == n.trunc() && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        format!("{n}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extract::extract;
    use crate::id::WidgetId;
    use pretty_assertions::assert_eq;

    #[test]
    fn number_formatting() {
        assert_eq!(format_num(120.0), "120");
        assert_eq!(format_num(-4.0), "-4");
        assert_eq!(format_num(12.5), "12.5");
        assert_eq!(format_num(0.25), "0.25");
    }

    #[test]
    fn widget_element_shape() {
        let mut w = Widget::new(WidgetKind::Button)
            .with_id(WidgetId::intern("power"))
            .with_geometry(Geometry::new(40.0, 80.0, 200.0, 72.0))
            .with_join(JoinType::Digital, 1201, Direction::Input);
        w.name = "Power".into();
        w.style.background_color = "#222".into();
        let mut out = String::new();
        emit_widget(&mut out, &w);
        assert_eq!(
            out,
            "<div data-widget-type=\"button\" data-name=\"Power\" data-section=\"default\" \
             data-join-type=\"digital\" data-join=\"1201\" data-direction=\"input\" \
             style={{ position: 'absolute', left: 40, top: 80, width: 200, height: 72, \
             backgroundColor: \"#222\" }}>Power</div>"
        );
    }

    #[test]
    fn special_characters_are_escaped() {
        let mut w = Widget::new(WidgetKind::Label);
        w.name = "A \"quoted\" name".into();
        w.text_content = "1 < 2 & 3 > 0".into();
        let markup = export_markup(&Layout::with_widgets(vec![w]));
        assert!(markup.contains("data-name=\"A &quot;quoted&quot; name\""));
        assert!(markup.contains(">1 &lt; 2 &amp; 3 &gt; 0</div>"));

        let back = extract(&markup);
        assert_eq!(back[0].name, "A \"quoted\" name");
        assert_eq!(back[0].text_content, "1 < 2 & 3 > 0");
    }

    #[test]
    fn empty_layout_emits_nothing() {
        let markup = export_markup(&Layout::default());
        assert!(markup.is_empty());
        assert!(extract(&markup).is_empty());
    }
}
