//! Integration tests for layout.
//!
//! Fonts are measured with `ApproximateFontMetrics`: every character is
//! 0.6 em wide, ascent is 0.8 em and descent 0.2 em. At the default 16px
//! that is 9.6px per character (and per space), 12.8px ascent and 3.2px
//! descent.

use marten_css::{
    BoxId, BoxKind, FontCache, FontWeight, LayoutConfig, LayoutError, LayoutTree, Rect,
    StyleState, parse_stylesheet, ua_stylesheet,
};
use marten_dom::{DomTree, NodeId};
use marten_html::parse;

const EPSILON: f32 = 1e-3;

struct Laid {
    dom: DomTree,
    styles: StyleState,
    tree: LayoutTree,
}

fn lay_out_with(html: &str, css: &str, config: &LayoutConfig) -> Laid {
    let dom = parse(html);
    let mut sheet = ua_stylesheet().clone();
    sheet.extend(&parse_stylesheet(css));
    let mut styles = StyleState::new();
    let _ = styles
        .resolve(&dom, &sheet.sorted_by_priority())
        .expect("style pass");
    let mut fonts = FontCache::default();
    let tree = LayoutTree::build(&dom, &styles, &mut fonts, config).expect("layout");
    Laid { dom, styles, tree }
}

fn lay_out(html: &str) -> Laid {
    lay_out_with(html, "", &LayoutConfig::default())
}

fn narrow(width: f32) -> LayoutConfig {
    LayoutConfig {
        viewport_width: width,
        ..LayoutConfig::default()
    }
}

fn find_element(dom: &DomTree, tag: &str) -> NodeId {
    dom.descendants(dom.root())
        .into_iter()
        .find(|&id| dom.is_element_named(id, tag))
        .unwrap_or_else(|| panic!("no <{tag}> in tree"))
}

/// Text runs in pre-order: (word, rect).
fn runs(tree: &LayoutTree) -> Vec<(String, Rect)> {
    tree.pre_order()
        .into_iter()
        .filter_map(|id| {
            let b = tree.get(id)?;
            match &b.kind {
                BoxKind::TextRun { word, .. } => Some((word.clone(), b.rect)),
                _ => None,
            }
        })
        .collect()
}

fn words(tree: &LayoutTree) -> Vec<String> {
    runs(tree).into_iter().map(|(word, _)| word).collect()
}

fn run_rect(tree: &LayoutTree, word: &str) -> Rect {
    runs(tree)
        .into_iter()
        .find(|(w, _)| w == word)
        .map(|(_, rect)| rect)
        .unwrap_or_else(|| panic!("no run {word:?}"))
}

fn assert_close(actual: f32, expected: f32) {
    assert!(
        (actual - expected).abs() < EPSILON,
        "expected {expected}, got {actual}"
    );
}

#[test]
fn test_paragraph_with_bold_word() {
    let laid = lay_out("<p>Hello <b>world</b></p>");
    let runs = runs(&laid.tree);
    assert_eq!(runs.len(), 2);

    let (hello, world) = (&runs[0], &runs[1]);
    assert_eq!(hello.0, "Hello");
    assert_eq!(world.0, "world");
    assert_close(hello.1.x, 13.0);
    assert_close(hello.1.width, 48.0);
    assert_close(world.1.x, 13.0 + 48.0 + 9.6);
    // Same line, same baseline.
    assert_close(hello.1.y, 21.2);
    assert_close(world.1.y, 21.2);

    let weights: Vec<FontWeight> = laid
        .tree
        .pre_order()
        .into_iter()
        .filter_map(|id| laid.tree.get(id)?.font().map(|f| f.key.weight))
        .collect();
    assert_eq!(weights, vec![FontWeight::Normal, FontWeight::Bold]);
}

fn line_count(laid: &Laid, tag: &str) -> usize {
    let node = find_element(&laid.dom, tag);
    let block = laid.tree.boxes_for_node(node)[0];
    laid.tree
        .children(block)
        .iter()
        .filter(|&&id| matches!(laid.tree.get(id).map(|b| &b.kind), Some(BoxKind::Line { .. })))
        .count()
}

#[test]
fn test_paragraph_opens_a_single_line() {
    let laid = lay_out("<p>Hello <b>world</b></p>");
    assert_eq!(line_count(&laid, "p"), 1);

    let laid = lay_out("<p>one<br>two</p>");
    assert_eq!(line_count(&laid, "p"), 2);
    assert!(run_rect(&laid.tree, "two").y > run_rect(&laid.tree, "one").y);
}

#[test]
fn test_document_geometry() {
    let laid = lay_out("<p>Hello <b>world</b></p>");
    let document = laid.tree.root().expect("document box");
    assert_eq!(document.kind, BoxKind::Document);
    assert_close(document.rect.x, 13.0);
    assert_close(document.rect.y, 18.0);
    assert_close(document.rect.width, 974.0);
    // One 20px line between two 18px margins.
    assert_close(laid.tree.height(), 56.0);
}

#[test]
fn test_blocks_stack_vertically() {
    let laid = lay_out("<div>a</div><div>b</div>");
    assert_close(run_rect(&laid.tree, "a").y, 21.2);
    assert_close(run_rect(&laid.tree, "b").y, 41.2);
    assert_close(laid.tree.height(), 76.0);
}

#[test]
fn test_explicit_width_and_height() {
    let laid = lay_out("<div style=\"width:100px;height:50px\">x</div>");
    let div = find_element(&laid.dom, "div");
    let block = laid.tree.boxes_for_node(div)[0];
    let rect = laid.tree.get(block).expect("block").rect;
    assert_close(rect.width, 100.0);
    assert_close(rect.height, 50.0);
    assert_close(laid.tree.height(), 86.0);
}

#[test]
fn test_unsupported_width_falls_back_to_parent() {
    let laid = lay_out("<div style=\"width:50%\">x</div>");
    let div = find_element(&laid.dom, "div");
    let block = laid.tree.boxes_for_node(div)[0];
    assert_close(laid.tree.get(block).expect("block").rect.width, 974.0);
}

#[test]
fn test_words_wrap() {
    let laid = lay_out_with("<div>aaaa bbbb cccc dddd</div>", "", &narrow(200.0));
    assert_close(run_rect(&laid.tree, "cccc").y, 21.2);
    let d = run_rect(&laid.tree, "dddd");
    assert_close(d.x, 13.0);
    assert_close(d.y, 41.2);
}

#[test]
fn test_long_word_stays_on_empty_line() {
    let laid = lay_out_with("<div>abcdefghij k</div>", "", &narrow(100.0));
    let long = run_rect(&laid.tree, "abcdefghij");
    assert_close(long.x, 13.0);
    assert_close(long.y, 21.2);
    assert_close(run_rect(&laid.tree, "k").y, 41.2);
}

#[test]
fn test_soft_hyphen_splits_word() {
    let laid = lay_out_with(
        "<div>aaaa bbbb cc ab&shy;cdef</div>",
        "",
        &narrow(200.0),
    );
    assert_eq!(words(&laid.tree), vec!["aaaa", "bbbb", "cc", "ab-", "cdef"]);
    assert_close(run_rect(&laid.tree, "ab-").y, 21.2);
    let rest = run_rect(&laid.tree, "cdef");
    assert_close(rest.x, 13.0);
    assert_close(rest.y, 41.2);
}

#[test]
fn test_soft_hyphens_are_not_displayed() {
    let laid = lay_out("<div>hy&shy;phen</div>");
    assert_eq!(words(&laid.tree), vec!["hyphen"]);
}

#[test]
fn test_pre_keeps_whitespace_and_newlines() {
    let laid = lay_out("<pre>a  b\nc</pre>");
    let runs = runs(&laid.tree);
    let tokens: Vec<&str> = runs.iter().map(|(w, _)| w.as_str()).collect();
    assert_eq!(tokens, vec!["a", " ", " ", "b", "c"]);
    let b = &runs[3].1;
    assert_close(b.x, 3.0f32.mul_add(9.6, 13.0));
    let c = &runs[4].1;
    assert_close(c.x, 13.0);
    assert!(c.y > b.y);
}

#[test]
fn test_hidden_elements_make_no_boxes() {
    let laid = lay_out("<head><title>Hidden</title></head><body>Shown</body>");
    assert_eq!(words(&laid.tree), vec!["Shown"]);
}

#[test]
fn test_list_items_are_indented() {
    let laid = lay_out("<ul><li>item</li></ul>");
    assert_close(run_rect(&laid.tree, "item").x, 13.0 + 10.0 + 9.6);
}

#[test]
fn test_title_heading_is_centered() {
    let laid = lay_out("<h1 class=\"title\">Hi</h1>");
    let rect = run_rect(&laid.tree, "Hi");
    // 32px bold: two characters are 38.4px wide.
    assert_close(rect.width, 38.4);
    assert_close(rect.x, 13.0 + (974.0 - 38.4) / 2.0);
}

#[test]
fn test_toc_heading_is_injected() {
    let laid = lay_out("<nav id=\"toc\"><a>entry</a></nav>");
    assert_eq!(
        words(&laid.tree),
        vec!["Table", "of", "Contents", "entry"]
    );
    let first = laid
        .tree
        .pre_order()
        .into_iter()
        .find_map(|id| laid.tree.get(id)?.font().cloned())
        .expect("font");
    assert_close(first.size(), 24.0);
    assert_eq!(first.key.weight, FontWeight::Bold);
    assert!(run_rect(&laid.tree, "entry").y > run_rect(&laid.tree, "Table").y);
}

#[test]
fn test_form_controls_are_atoms() {
    let laid = lay_out("<div>Name <input value=\"x\"> <button>Go</button></div>");
    // The button's text is painted, not laid out.
    assert_eq!(words(&laid.tree), vec!["Name"]);

    let input = find_element(&laid.dom, "input");
    let button = find_element(&laid.dom, "button");
    let input_box = laid.tree.input_box_for(input).expect("input atom");
    let button_box = laid.tree.input_box_for(button).expect("button atom");
    let input_rect = laid.tree.get(input_box).expect("box").rect;
    let button_rect = laid.tree.get(button_box).expect("box").rect;
    // "Name" is four characters wide, then one space.
    assert_close(input_rect.x, 13.0 + 38.4 + 9.6);
    assert_close(input_rect.width, 200.0);
    assert_close(input_rect.height, 16.0);
    assert_close(button_rect.x, input_rect.right() + 9.6);
}

#[test]
fn test_input_width_from_style() {
    let laid = lay_out("<div><input style=\"width:50px;height:30px\"></div>");
    let input = find_element(&laid.dom, "input");
    let atom = laid.tree.input_box_for(input).expect("atom");
    let rect = laid.tree.get(atom).expect("box").rect;
    assert_close(rect.width, 50.0);
    assert_close(rect.height, 30.0);
}

#[test]
fn test_zoom_scales_fonts() {
    let config = LayoutConfig {
        font_size_delta: 4.0,
        ..LayoutConfig::default()
    };
    let laid = lay_out_with("<div>Hello</div>", "", &config);
    assert_close(run_rect(&laid.tree, "Hello").width, 60.0);
}

#[test]
fn test_unstyled_document_is_an_error() {
    let dom = parse("<p>x</p>");
    let mut fonts = FontCache::default();
    let err = LayoutTree::build(
        &dom,
        &StyleState::new(),
        &mut fonts,
        &LayoutConfig::default(),
    )
    .unwrap_err();
    assert_eq!(err, LayoutError::Unstyled(dom.root()));
}

#[test]
fn test_absolute_bounds_apply_transforms() {
    let laid = lay_out("<div style=\"transform:translate(10px,20px)\">hello</div>");
    let run = laid
        .tree
        .pre_order()
        .into_iter()
        .find(|&id| matches!(laid.tree.get(id).map(|b| &b.kind), Some(BoxKind::TextRun { .. })))
        .expect("text run");
    let local = laid.tree.get(run).expect("box").rect;
    let absolute = laid.tree.absolute_bounds(run, &laid.styles);
    assert_close(absolute.x, local.x + 10.0);
    assert_close(absolute.y, local.y + 20.0);
    assert_close(absolute.width, local.width);
}

#[test]
fn test_hit_test_finds_deepest_box() {
    let laid = lay_out("<div style=\"transform:translate(10px,20px)\">hello</div>");
    let div = find_element(&laid.dom, "div");
    let text = laid.dom.children(div)[0];
    let body = find_element(&laid.dom, "body");

    assert_eq!(laid.tree.hit_test(30.0, 45.0, &laid.styles), Some(text));
    assert_eq!(laid.tree.hit_test(15.0, 25.0, &laid.styles), Some(body));
    assert_eq!(laid.tree.hit_test(5.0, 5.0, &laid.styles), None);
}

#[test]
fn test_pre_order_starts_at_document() {
    let laid = lay_out("<p>a</p>");
    let order = laid.tree.pre_order();
    assert_eq!(order[0], BoxId::ROOT);
    assert_eq!(order.len(), laid.tree.len());
}

#[test]
fn test_dump_and_display() {
    let laid = lay_out("<p>Hello</p>");
    let dump = laid.tree.dump(BoxId::ROOT).expect("dump");
    assert_eq!(dump.kind, "Document");
    let json = serde_json::to_value(&dump).expect("json");
    assert_eq!(json["kind"], "Document");
    assert!(json["children"].is_array());

    let text = laid.tree.to_string();
    assert!(text.starts_with("Document"));
    assert!(text.contains("TextRun"));
    assert!(text.contains("\"Hello\""));
}
