//! Integration tests: markup → widgets → markup → widgets.
//!
//! Exercises the extractor against a realistic panel file and checks that
//! emitted markup re-extracts to the same geometry, wiring and text.

use pretty_assertions::assert_eq;
use studio_core::extract::extract;
use studio_core::model::*;
use studio_core::{export_layout_at, export_markup, import_layout};

const PANEL: &str = include_str!("fixtures/living_room.tsx");

fn by_name<'a>(widgets: &'a [Widget], name: &str) -> &'a Widget {
    widgets
        .iter()
        .find(|w| w.name == name)
        .unwrap_or_else(|| panic!("no widget named {name}"))
}

/// Everything the markup round trip must preserve (ids excluded).
fn fingerprint(w: &Widget) -> (WidgetKind, String, String, Geometry, JoinType, u32, Direction, DatabaseBinding, WidgetStyle, String) {
    (
        w.kind,
        w.name.clone(),
        w.section.clone(),
        w.geometry,
        w.join_type,
        w.join,
        w.direction,
        w.database.clone(),
        w.style.clone(),
        w.display_text().to_string(),
    )
}

// ─── Extraction ──────────────────────────────────────────────────────────

#[test]
fn panel_yields_one_widget_per_tag_in_order() {
    let widgets = extract(PANEL);
    let kinds: Vec<_> = widgets.iter().map(|w| w.kind).collect();
    assert_eq!(
        kinds,
        vec![
            WidgetKind::Label,  // Panel
            WidgetKind::Button, // Button
            WidgetKind::Slider, // input range
            WidgetKind::Label,  // span
            WidgetKind::Label,  // Label
            WidgetKind::Icon,   // img
            WidgetKind::Label,  // div
        ]
    );
}

#[test]
fn panel_button_and_slider() {
    let widgets = extract(PANEL);

    let button = by_name(&widgets, "Lights On");
    assert_eq!(button.id.as_str(), "lights-on");
    assert_eq!(button.geometry, Geometry::new(40.0, 40.0, 160.0, 64.0));
    assert_eq!((button.join_type, button.join, button.direction), (JoinType::Digital, 1201, Direction::Input));
    assert_eq!(button.style.background_color, "#1e88e5");
    assert_eq!(button.text_content, "Lights On");

    let slider = by_name(&widgets, "Dimmer");
    assert_eq!((slider.join_type, slider.join), (JoinType::Analog, 2301));
    assert_eq!(slider.text_content, "");
}

#[test]
fn panel_span_label_and_fallbacks() {
    let widgets = extract(PANEL);

    let span = &widgets[3];
    assert_eq!(span.text_content, "Hello World");
    assert_eq!(span.geometry, Geometry::new(400.0, 40.0, DEFAULT_WIDGET_WIDTH, DEFAULT_WIDGET_HEIGHT));
    assert_eq!((span.join_type, span.join, span.direction), (JoinType::Serial, 5, Direction::Output));

    let status = &widgets[4];
    assert_eq!(status.section, "Status");
    assert_eq!(status.geometry.x, 400.0);
    assert_eq!(status.style.font_size, "18px");
    assert_eq!(
        status.database,
        DatabaseBinding {
            is_database_tool: true,
            db_entity: "rooms".into(),
            db_field: "status".into(),
            db_mode: DbMode::Readwrite,
        }
    );

    // Panel, img and div have no position: successive cascade slots.
    let cascaded: Vec<_> = [0, 5, 6].iter().map(|&i| (widgets[i].geometry.x, widgets[i].geometry.y)).collect();
    assert_eq!(cascaded, vec![(20.0, 20.0), (48.0, 20.0), (76.0, 20.0)]);
    assert_eq!(widgets[5].name, "Icon 6");
    assert_eq!(widgets[6].text_content, "");
}

// ─── Round trips ─────────────────────────────────────────────────────────

#[test]
fn exported_markup_reextracts_equivalently() {
    let original = extract(PANEL);
    let markup = export_markup(&Layout::with_widgets(original.clone()));
    let again = extract(&markup);

    assert_eq!(again.len(), original.len());
    for (a, b) in original.iter().zip(&again) {
        assert_eq!(fingerprint(a), fingerprint(b));
    }
}

#[test]
fn fractional_and_edited_geometry_survives_markup() {
    let mut widgets = extract(PANEL);
    widgets[1].move_to(12.5, 33.25);
    widgets[1].resize_to(180.75, 61.5);
    widgets[2].retype(WidgetKind::Button);
    widgets[2].assign_section("Lights");

    let again = extract(&export_markup(&Layout::with_widgets(widgets.clone())));
    assert_eq!(again[1].geometry, Geometry::new(12.5, 33.25, 180.75, 61.5));
    assert_eq!(again[2].kind, WidgetKind::Button);
    assert_eq!(again[2].section, "Lights");
}

#[test]
fn extracted_panel_survives_layout_json() {
    let layout = Layout {
        background_url: "assets/bg.png".into(),
        canvas_width: 1280.0,
        canvas_height: 800.0,
        ..Layout::with_widgets(extract(PANEL))
    };
    let json = export_layout_at(&layout, "1760601600").unwrap();
    let import = import_layout(&json);
    assert_eq!(import.status, LoadStatus::Loaded(7));
    assert_eq!(import.layout, layout);
}

#[test]
fn joins_past_float_precision_survive_markup() {
    let wide = Widget::new(WidgetKind::Button).with_join(JoinType::Digital, 16_777_217, Direction::Input);
    let again = extract(&export_markup(&Layout::with_widgets(vec![wide])));
    assert_eq!(again[0].join, 16_777_217);
}
