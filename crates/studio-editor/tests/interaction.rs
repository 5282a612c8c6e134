//! Integration tests: pointer, keyboard and menu interaction (studio-editor).
//!
//! Drives a `Studio` through normalized input events the way a host would,
//! checking placement, clipboard, sections and templates end to end.

use pretty_assertions::assert_eq;
use studio_core::id::WidgetId;
use studio_core::model::*;
use studio_editor::input::{InputEvent, Modifiers};
use studio_editor::menu::MenuAction;
use studio_editor::studio::{LoadKind, Studio};
use studio_editor::templates::TemplateError;

const KITCHEN: &str = include_str!("fixtures/kitchen.tsx");

const CTRL: Modifiers = Modifiers {
    ctrl: true,
    ..Modifiers::NONE
};

fn studio() -> Studio {
    let mut studio = Studio::default();
    assert_eq!(studio.load_markup(KITCHEN), LoadStatus::Loaded(3));
    studio
}

fn id(s: &str) -> WidgetId {
    WidgetId::intern(s)
}

fn position(studio: &Studio, s: &str) -> (f32, f32) {
    let g = studio.engine().widget(id(s)).unwrap().geometry;
    (g.x, g.y)
}

fn drag(studio: &mut Studio, from: (f32, f32), to: (f32, f32)) {
    studio.handle_event(&InputEvent::pointer_down(from.0, from.1));
    studio.handle_event(&InputEvent::pointer_move(to.0, to.1));
    studio.handle_event(&InputEvent::pointer_up(to.0, to.1));
}

// ─── Dragging ───────────────────────────────────────────────────────────

#[test]
fn drag_snaps_to_grid_by_default() {
    let mut s = studio();
    s.handle_event(&InputEvent::pointer_down(5.0, 5.0));
    assert!(s.is_dragging());
    assert_eq!(s.selection(), Some(id("k-light")));

    s.handle_event(&InputEvent::pointer_move(37.0, 23.0));
    assert_eq!(position(&s, "k-light"), (30.0, 20.0));

    s.handle_event(&InputEvent::pointer_move(5000.0, 5000.0));
    // 1024 - 100 = 924 rounds to 920; 600 - 50 = 550 is already on the grid.
    assert_eq!(position(&s, "k-light"), (920.0, 550.0));

    s.handle_event(&InputEvent::pointer_up(5000.0, 5000.0));
    assert!(!s.is_dragging());
}

#[test]
fn toggled_snap_places_exactly() {
    let mut s = studio();
    s.handle_event(&InputEvent::key("g", Modifiers::NONE));
    assert!(!s.snap_enabled());

    drag(&mut s, (5.0, 5.0), (38.5, 23.25));
    assert_eq!(position(&s, "k-light"), (33.5, 18.25));

    drag(&mut s, (40.0, 20.0), (-300.0, -300.0));
    assert_eq!(position(&s, "k-light"), (0.0, 0.0));
}

#[test]
fn leaving_the_canvas_keeps_the_last_position() {
    let mut s = studio();
    s.handle_event(&InputEvent::pointer_down(5.0, 5.0));
    s.handle_event(&InputEvent::pointer_move(65.0, 45.0));
    s.handle_event(&InputEvent::PointerLeave);
    s.handle_event(&InputEvent::pointer_move(300.0, 300.0));
    assert_eq!(position(&s, "k-light"), (60.0, 40.0));
}

// ─── Clipboard & deletion ───────────────────────────────────────────────

#[test]
fn copy_paste_offsets_clone_and_selects_it() {
    let mut s = studio();
    s.select(Some(id("k-fan")));
    assert!(s.handle_event(&InputEvent::key("c", CTRL)));
    assert!(s.handle_event(&InputEvent::key("v", CTRL)));

    assert_eq!(s.widgets().len(), 4);
    let pasted = s.widgets().last().unwrap().clone();
    assert_ne!(pasted.id, id("k-fan"));
    assert_eq!((pasted.geometry.x, pasted.geometry.y), (140.0, 40.0));
    assert_eq!(pasted.name, "Fan");
    assert_eq!(s.selection(), Some(pasted.id));

    // The clipboard holds the original snapshot.
    s.handle_event(&InputEvent::key("v", CTRL));
    let again = s.widgets().last().unwrap();
    assert_ne!(again.id, pasted.id);
    assert_eq!((again.geometry.x, again.geometry.y), (140.0, 40.0));
}

#[test]
fn paste_with_empty_clipboard_does_nothing() {
    let mut s = studio();
    assert!(!s.can_paste());
    assert_eq!(s.paste(), None);
    assert_eq!(s.widgets().len(), 3);
}

#[test]
fn duplicate_shortcut_leaves_clipboard_alone() {
    let mut s = studio();
    s.select(Some(id("k-light")));
    assert!(s.handle_event(&InputEvent::key("d", CTRL)));
    assert_eq!(s.widgets().len(), 4);
    assert!(!s.can_paste());
}

#[test]
fn delete_key_removes_selection() {
    let mut s = studio();
    s.select(Some(id("k-temp")));
    assert!(s.handle_event(&InputEvent::key("Delete", Modifiers::NONE)));
    assert_eq!(s.widgets().len(), 2);
    assert_eq!(s.selection(), None);
    assert!(!s.handle_event(&InputEvent::key("Backspace", Modifiers::NONE)));
}

// ─── Context menu & sections ────────────────────────────────────────────

#[test]
fn menu_moves_widget_between_sections() {
    let mut s = studio();
    s.handle_event(&InputEvent::context_click(410.0, 310.0));
    let menu = s.menu().unwrap();
    assert_eq!(menu.target, id("k-temp"));
    assert!(menu.offers(&MenuAction::MoveToSection("Lights".into())));

    assert!(s.apply_menu_action(MenuAction::MoveToSection("Lights".into())));
    assert!(s.menu().is_none());
    assert_eq!(s.sections(), vec!["Lights".to_string()]);
}

#[test]
fn context_click_on_empty_canvas_opens_nothing() {
    let mut s = studio();
    s.handle_event(&InputEvent::context_click(900.0, 100.0));
    assert!(s.menu().is_none());
    assert_eq!(s.selection(), None);
}

#[test]
fn section_filter_limits_hit_testing() {
    let mut s = studio();
    s.set_section_filter(Some("Climate"));
    s.handle_event(&InputEvent::context_click(5.0, 5.0));
    assert!(s.menu().is_none());

    s.handle_event(&InputEvent::pointer_down(410.0, 310.0));
    assert_eq!(s.selection(), Some(id("k-temp")));
    s.handle_event(&InputEvent::pointer_up(410.0, 310.0));

    s.set_section_filter(None);
    assert_eq!(s.engine().visible_widgets().count(), 3);
}

#[test]
fn observed_resize_is_clamped_to_minimum_and_canvas() {
    let mut s = studio();
    let temp = id("k-temp");
    assert!(s.observe_resize(temp, 10.0, 10.0));
    let g = s.engine().widget(temp).unwrap().geometry;
    assert_eq!((g.w, g.h), (RESIZE_MIN_WIDTH, RESIZE_MIN_HEIGHT));

    assert!(s.observe_resize(temp, 5000.0, 5000.0));
    let g = s.engine().widget(temp).unwrap().geometry;
    assert_eq!((g.w, g.h), (624.0, 300.0));

    assert!(!s.observe_resize(temp, 624.0, 300.0));
}

// ─── Templates ──────────────────────────────────────────────────────────

#[test]
fn template_inserts_into_generated_sections() {
    let mut s = studio();
    s.select(Some(id("k-light")));
    s.save_section_template("Light row").unwrap();

    let first = s.insert_template("Light row", None).unwrap();
    assert_eq!(first.len(), 2);
    let placed: Vec<_> = first
        .iter()
        .map(|i| {
            let w = s.engine().widget(*i).unwrap();
            (w.section.clone(), w.geometry.x, w.geometry.y)
        })
        .collect();
    assert_eq!(
        placed,
        vec![
            ("Light row 1".to_string(), 40.0, 40.0),
            ("Light row 1".to_string(), 160.0, 60.0),
        ]
    );

    s.insert_template("Light row", None).unwrap();
    s.insert_template("Light row", Some("Climate")).unwrap();
    assert_eq!(
        s.sections(),
        vec![
            "Lights".to_string(),
            "Climate".to_string(),
            "Light row 1".to_string(),
            "Light row 2".to_string(),
        ]
    );
    assert_eq!(s.engine().section_widgets("Climate").count(), 3);
}

#[test]
fn template_from_menu_uses_section_name() {
    let mut s = studio();
    s.handle_event(&InputEvent::context_click(130.0, 30.0));
    assert!(s.apply_menu_action(MenuAction::SaveTemplate("Lights".into())));
    assert_eq!(s.templates().get("Lights").unwrap().widgets().len(), 2);
    assert!(s.status().contains("2 widgets"));
}

#[test]
fn saving_over_a_template_is_reported() {
    let mut s = studio();
    s.select(Some(id("k-light")));
    s.save_section_template("Row").unwrap();
    assert!(s.status().starts_with("Saved"));

    s.handle_event(&InputEvent::context_click(410.0, 310.0));
    assert!(s.apply_menu_action(MenuAction::SaveTemplate("Row".into())));
    assert!(s.status().starts_with("Replaced template \"Row\""));
    assert_eq!(s.templates().len(), 1);
    assert_eq!(s.templates().get("Row").unwrap().widgets()[0].kind, WidgetKind::Slider);

    // A host-chosen name keeps both.
    s.handle_event(&InputEvent::context_click(410.0, 310.0));
    assert!(s.apply_menu_action(MenuAction::SaveTemplate("Climate row".into())));
    assert_eq!(s.templates().len(), 2);
}

#[test]
fn unknown_template_is_an_error() {
    let mut s = studio();
    assert!(matches!(s.insert_template("Nope", None), Err(TemplateError::Unknown(_))));
    assert_eq!(s.widgets().len(), 3);
}

#[test]
fn template_library_moves_between_studios() {
    let mut s = studio();
    s.select(Some(id("k-temp")));
    s.save_section_template("Climate").unwrap();
    let bytes = s.templates_to_bytes().unwrap();

    let mut other = Studio::default();
    assert_eq!(other.restore_templates(&bytes).unwrap(), 1);
    let ids = other.insert_template("Climate", Some("Hall")).unwrap();
    assert_eq!(other.engine().widget(ids[0]).unwrap().kind, WidgetKind::Slider);
}

// ─── Loads & exports ────────────────────────────────────────────────────

#[test]
fn project_page_load_sets_canvas_and_sections() {
    let json = r#"{"pages": [{"name": "Main", "width": 1280, "height": 800,
        "backgroundImage": "bg.png",
        "elements": [{"id": "p1", "type": "Button", "x": 10, "y": 10,
                      "width": 100, "height": 50, "joins": {"press": 5}}]}]}"#;
    let mut s = studio();
    assert_eq!(s.load_project_page(json, 0), LoadStatus::Loaded(1));
    assert_eq!((s.engine().canvas_width, s.engine().canvas_height), (1280.0, 800.0));
    assert_eq!(s.engine().background_url, "bg.png");
    assert_eq!(s.sections(), vec!["Main".to_string()]);

    assert!(s.load_project_page(json, 3).is_malformed());
    assert_eq!(s.widgets().len(), 1);
}

#[test]
fn late_load_overwrites_newer_edits() {
    let mut s = studio();
    let saved = s.export_layout().unwrap();
    let ticket = s.begin_load(LoadKind::Layout);

    s.select(Some(id("k-fan")));
    s.delete_selected();
    assert_eq!(s.widgets().len(), 2);

    assert_eq!(s.complete_layout_load(ticket, &saved), LoadStatus::Loaded(3));
    assert!(s.engine().contains(id("k-fan")));
}

#[test]
fn exported_markup_reloads_to_same_placement() {
    let mut s = studio();
    drag(&mut s, (5.0, 5.0), (255.0, 105.0));
    let markup = s.export_markup();

    let mut other = Studio::default();
    assert_eq!(other.load_markup(&markup), LoadStatus::Loaded(3));
    let placed = |studio: &Studio| -> Vec<(String, f32, f32, String)> {
        studio
            .widgets()
            .iter()
            .map(|w| (w.name.clone(), w.geometry.x, w.geometry.y, w.section.clone()))
            .collect()
    };
    assert_eq!(placed(&other), placed(&s));
}
