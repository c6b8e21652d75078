//! Integration tests for the page pipeline.
//!
//! Pages are built with an empty font set, so text is measured with the
//! approximate metrics: 9.6px per character at 16px, 20px per line.

use std::sync::Arc;

use marten_browser::{ClickAction, FontSet, MIN_FONT_SIZE_DELTA, Page, PageConfig, PageError};
use marten_css::{BoxKind, FontWeight, PaintCommand, StyleError};
use marten_dom::NodeId;

fn page_with(html: &str, config: PageConfig) -> Page {
    Page::with_font_set(html, config, Arc::new(FontSet::empty()))
}

fn page(html: &str) -> Page {
    page_with(html, PageConfig::default())
}

fn find_element(page: &Page, tag: &str) -> NodeId {
    let dom = page.dom();
    dom.descendants(dom.root())
        .into_iter()
        .find(|&id| dom.is_element_named(id, tag))
        .unwrap_or_else(|| panic!("no <{tag}> in tree"))
}

fn words(page: &Page) -> Vec<String> {
    let layout = page.layout();
    layout
        .pre_order()
        .into_iter()
        .filter_map(|id| match &layout.get(id)?.kind {
            BoxKind::TextRun { word, .. } => Some(word.clone()),
            _ => None,
        })
        .collect()
}

fn set_style(page: &mut Page, node: NodeId, style: &str) {
    let element = page.dom_mut().as_element_mut(node).expect("element");
    let _ = element
        .attrs
        .insert("style".to_string(), style.to_string());
}

#[test]
fn test_paragraph_with_bold_word() {
    let mut page = page("<p>Hello <b>world</b></p>");
    page.render().expect("render");

    let p = find_element(&page, "p");
    let layout = page.layout();
    // Lines belong to the paragraph's node too.
    let blocks: Vec<_> = layout
        .boxes_for_node(p)
        .into_iter()
        .filter(|&id| layout.get(id).is_some_and(|b| b.kind == BoxKind::Block))
        .collect();
    assert_eq!(blocks.len(), 1);
    let block = layout.get(blocks[0]).expect("block");
    assert_eq!(block.kind, BoxKind::Block);
    assert_eq!(block.children.len(), 1);

    let line = layout.get(block.children[0]).expect("line");
    assert!(matches!(line.kind, BoxKind::Line { .. }));
    let runs: Vec<(String, FontWeight)> = line
        .children
        .iter()
        .filter_map(|&id| match &layout.get(id)?.kind {
            BoxKind::TextRun { word, font, .. } => Some((word.clone(), font.key.weight)),
            _ => None,
        })
        .collect();
    assert_eq!(
        runs,
        vec![
            ("Hello".to_string(), FontWeight::Normal),
            ("world".to_string(), FontWeight::Bold)
        ]
    );
    assert!((page.document_height() - 56.0).abs() < 1e-3);
}

#[test]
fn test_style_elements_and_added_sheets_cascade_in_order() {
    let mut page = page("<style>p { color: red }</style><p>x</p>");
    page.render().expect("render");
    let p = find_element(&page, "p");
    assert_eq!(page.styles().get(p, "color"), Some("red"));

    page.add_stylesheet("p { color: blue }");
    page.render().expect("render");
    assert_eq!(page.styles().get(p, "color"), Some("blue"));
}

#[test]
fn test_linked_stylesheet_hrefs() {
    let page = page(
        "<link rel=\"stylesheet\" href=\"main.css\"><link rel=\"icon\" href=\"i.png\"><p>x</p>",
    );
    assert_eq!(page.linked_stylesheet_hrefs(), vec!["main.css".to_string()]);
}

#[test]
fn test_style_error_is_reported() {
    let mut page = page("<p style=\"font-size:2em\">x</p>");
    let err = page.render().unwrap_err();
    assert!(matches!(
        err,
        PageError::Style(StyleError::InvalidLength { ref value, .. }) if value == "2em"
    ));
}

#[test]
fn test_set_inner_html_rerenders() {
    let mut page = page("<div><p>old</p></div>");
    page.render().expect("render");
    assert_eq!(words(&page), vec!["old"]);

    let div = find_element(&page, "div");
    let children = page.set_inner_html(div, "<b>new</b> text");
    assert_eq!(children.len(), 2);
    page.render().expect("render");
    assert_eq!(words(&page), vec!["new", "text"]);
}

#[test]
fn test_query_selector_all() {
    let page = page("<div><p>a</p></div><p>b</p>");
    assert_eq!(page.query_selector_all("p").len(), 2);
    assert_eq!(page.query_selector_all("div p").len(), 1);
    assert!(page.query_selector_all("p {").is_empty());
}

#[test]
fn test_node_at() {
    let mut page = page("<p>Hello</p>");
    page.render().expect("render");
    let p = find_element(&page, "p");
    let text = page.dom().children(p)[0];
    assert_eq!(page.node_at(20.0, 25.0), Some(text));
    assert_eq!(page.node_at(5.0, 5.0), None);
}

#[test]
fn test_first_frame_composites_fully() {
    let mut page = page("<p>x</p>");
    let commit = page.run_animation_frame(0.0).expect("frame");
    assert!(commit.full_composite);
    assert!(!commit.needs_animation_frame);
    assert_eq!(page.compositor().layers().len(), 1);

    // Nothing changed, so nothing is rebuilt.
    let commit = page.run_animation_frame(0.0).expect("frame");
    assert!(!commit.full_composite);
}

#[test]
fn test_scroll_is_clamped_to_document() {
    let config = PageConfig {
        viewport_height: 100.0,
        ..PageConfig::default()
    };
    let html = "<p>a</p>".repeat(10);
    let mut tall = page_with(&html, config);
    let commit = tall.run_animation_frame(1000.0).expect("frame");
    assert!((commit.document_height - 236.0).abs() < 1e-3);
    assert!((commit.scroll - 136.0).abs() < 1e-3);
    assert!(tall.run_animation_frame(-5.0).expect("frame").scroll.abs() < 1e-3);

    let mut short = page("<p>a</p>");
    assert!(short.run_animation_frame(50.0).expect("frame").scroll.abs() < 1e-3);
}

#[test]
fn test_opacity_transition_uses_composited_updates() {
    let mut page = page("<div class=\"fade\" style=\"opacity:1\">x</div>");
    page.add_stylesheet(".fade { transition: opacity 160ms }");
    assert!(page.run_animation_frame(0.0).expect("frame").full_composite);

    let div = find_element(&page, "div");
    set_style(&mut page, div, "opacity:0");
    let commit = page.run_animation_frame(0.0).expect("frame");
    assert!(commit.full_composite);
    assert!(commit.needs_animation_frame);
    assert_eq!(page.styles().get(div, "opacity"), Some("0.9"));

    let mut frames = 0;
    loop {
        let commit = page.run_animation_frame(0.0).expect("frame");
        assert!(!commit.full_composite, "frame {frames} rebuilt the layers");
        frames += 1;
        if !commit.needs_animation_frame {
            break;
        }
        assert!(frames < 100, "animation never finished");
    }
    assert_eq!(frames, 9);
    assert_eq!(page.styles().get(div, "opacity"), Some("0"));

    // The draw list carries the final opacity.
    let layer = page.display_list().effects_for(div)[1];
    assert!(matches!(
        page.display_list().get(layer).expect("layer").command,
        PaintCommand::SaveLayer { opacity, .. } if opacity.abs() < 1e-6
    ));
}

#[test]
fn test_focus_repaints_with_caret() {
    let mut page = page("<div><input value=\"hi\"></div>");
    let _ = page.run_animation_frame(0.0).expect("frame");
    let input = find_element(&page, "input");
    page.focus(Some(input));
    assert_eq!(page.focused(), Some(input));

    let commit = page.run_animation_frame(0.0).expect("frame");
    assert!(commit.full_composite);
    let list = page.display_list();
    assert!(
        list.pre_order()
            .into_iter()
            .filter_map(|id| list.get(id))
            .any(|item| matches!(item.command, PaintCommand::DrawLine { .. }))
    );
}

#[test]
fn test_raster_draws_backgrounds() {
    let mut page = page("<div style=\"background-color:red\">x</div>");
    let pixmap = page.raster().expect("raster");
    assert_eq!((pixmap.width(), pixmap.height()), (1000, 56));

    let color = |x: u32, y: u32| {
        let p = pixmap.pixel(x, y).expect("in bounds").demultiply();
        (p.red(), p.green(), p.blue())
    };
    assert_eq!(color(500, 25), (255, 0, 0));
    assert_eq!(color(500, 5), (255, 255, 255));
}

#[test]
fn test_raster_viewport_is_viewport_sized() {
    let config = PageConfig {
        viewport_width: 300.0,
        viewport_height: 200.0,
        ..PageConfig::default()
    };
    let mut page = page_with("<p>a</p>", config);
    let pixmap = page.raster_viewport(0.0).expect("raster");
    assert_eq!((pixmap.width(), pixmap.height()), (300, 200));
}

#[test]
fn test_timing_report() {
    let mut page = page("<p>x</p>");
    let _ = page.run_animation_frame(0.0).expect("frame");
    let report = page.timing_report();
    assert_eq!(report.len(), 2);
    assert!(report[0].starts_with("Time in render on average:"));
    assert!(report[1].starts_with("Time in composite on average:"));
    assert!(page.timing_report().is_empty());
}

#[test]
fn test_page_config_from_json() {
    let config: PageConfig =
        serde_json::from_str("{\"viewport_width\": 500}").expect("valid config");
    assert!((config.viewport_width - 500.0).abs() < 1e-3);
    assert!((config.viewport_height - 800.0).abs() < 1e-3);
    let layout = config.to_layout_config();
    assert!((layout.hstep - 13.0).abs() < 1e-3);
}

fn value(page: &Page, node: NodeId) -> Option<String> {
    page.dom()
        .as_element(node)
        .and_then(|e| e.attrs.get("value").cloned())
}

#[test]
fn test_set_zoom_rerenders_with_larger_fonts() {
    let mut page = page("<p>Hello</p>");
    page.render().expect("render");
    assert!((page.document_height() - 56.0).abs() < 1e-3);

    page.set_zoom(4.0);
    assert!((page.zoom() - 4.0).abs() < 1e-3);
    page.render().expect("render");
    // 20px text: 25px lines.
    assert!((page.document_height() - 61.0).abs() < 1e-3);

    page.set_zoom(-50.0);
    assert!((page.zoom() - MIN_FONT_SIZE_DELTA).abs() < 1e-3);
}

#[test]
fn test_clicking_an_input_clears_and_focuses_it() {
    let mut page = page("<div><input value=\"hi\"></div>");
    let input = find_element(&page, "input");
    assert!(!page.type_text("x"), "nothing is focused yet");

    let action = page.click(20.0, 25.0).expect("click");
    assert_eq!(action, ClickAction::Focused(input));
    assert_eq!(page.focused(), Some(input));
    assert_eq!(value(&page, input).as_deref(), Some(""));

    assert!(page.type_text("ab"));
    assert!(page.type_text("c"));
    assert_eq!(value(&page, input).as_deref(), Some("abc"));

    // Clicking empty space drops focus.
    assert_eq!(page.click(500.0, 500.0).expect("click"), ClickAction::None);
    assert_eq!(page.focused(), None);
}

#[test]
fn test_typed_text_is_painted() {
    let mut page = page("<div><input></div>");
    let _ = page.click(20.0, 25.0).expect("click");
    assert!(page.type_text("go"));
    page.render().expect("render");
    let list = page.display_list();
    assert!(list.pre_order().into_iter().any(|id| matches!(
        list.get(id).map(|item| &item.command),
        Some(PaintCommand::DrawText { text, .. }) if text == "go"
    )));
}

#[test]
fn test_anchor_position_and_in_page_links() {
    let mut page = page("<p><a href=\"#target\">go</a></p><p id=\"target\">b</p>");
    page.render().expect("render");
    assert_eq!(page.anchor_position("#target"), Some((13.0, 38.0)));
    assert_eq!(page.anchor_position("target"), Some((13.0, 38.0)));
    assert_eq!(page.anchor_position("#missing"), None);

    assert_eq!(
        page.click(20.0, 25.0).expect("click"),
        ClickAction::ScrollTo(38.0)
    );
}

#[test]
fn test_links_and_buttons_report_to_the_host() {
    let mut link = page("<p><a href=\"other.html\">go</a></p>");
    assert_eq!(
        link.click(20.0, 25.0).expect("click"),
        ClickAction::Navigate("other.html".to_string())
    );

    let mut form = page("<form action=\"/submit\"><button>Go</button></form>");
    let form_node = find_element(&form, "form");
    assert_eq!(
        form.click(20.0, 25.0).expect("click"),
        ClickAction::Submit(form_node)
    );
}
