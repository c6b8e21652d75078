//! Integration tests for layer assignment, the draw list and updates.

use std::collections::HashMap;
use std::sync::Arc;

use marten_browser::{Compositor, DrawKind, FontSet, Page, PageConfig, PixmapCanvas};
use marten_css::{
    BlendMode, CmdId, ColorValue, DisplayList, FontCache, LayoutConfig, LayoutTree,
    PaintCommand, Painter, Rect, StyleState, Translation, ua_stylesheet,
};
use marten_dom::NodeId;
use marten_html::parse;

fn compositor() -> Compositor {
    Compositor::new(Arc::new(FontSet::empty()))
}

fn rect_cmd(list: &mut DisplayList, x: f32, y: f32, color: ColorValue) -> CmdId {
    list.add_leaf(PaintCommand::DrawRect { color }, Rect::new(x, y, 10.0, 10.0))
}

fn layer_cmd(opacity: f32) -> PaintCommand {
    PaintCommand::SaveLayer {
        opacity,
        blend: BlendMode::Normal,
        should_save: opacity < 1.0,
    }
}

fn wrap(
    list: &mut DisplayList,
    command: PaintCommand,
    node: Option<NodeId>,
    children: Vec<CmdId>,
) -> CmdId {
    list.add_effect(command, node, children)
}

fn painted(html: &str) -> DisplayList {
    let dom = parse(html);
    let mut styles = StyleState::new();
    let _ = styles
        .resolve(&dom, &ua_stylesheet().sorted_by_priority())
        .expect("style pass");
    let mut fonts = FontCache::default();
    let layout =
        LayoutTree::build(&dom, &styles, &mut fonts, &LayoutConfig::default()).expect("layout");
    Painter::new(&dom, &layout, &styles, &fonts).paint()
}

#[test]
fn test_adjacent_commands_with_same_parent_merge() {
    let mut list = DisplayList::new();
    let a = rect_cmd(&mut list, 0.0, 0.0, ColorValue::rgb(255, 0, 0));
    let b = rect_cmd(&mut list, 20.0, 0.0, ColorValue::rgb(0, 0, 255));
    let layer = wrap(&mut list, layer_cmd(0.5), Some(NodeId(1)), vec![a, b]);
    list.set_roots(vec![layer]);

    let mut compositor = compositor();
    compositor.composite(list).expect("composite");
    assert_eq!(compositor.layers().len(), 1);
    assert_eq!(compositor.layers()[0].items(), &[a, b]);
}

#[test]
fn test_overlapping_commands_with_different_parents_never_merge() {
    let mut list = DisplayList::new();
    let a = rect_cmd(&mut list, 0.0, 0.0, ColorValue::BLACK);
    let first = wrap(&mut list, layer_cmd(0.5), Some(NodeId(1)), vec![a]);
    let b = rect_cmd(&mut list, 5.0, 5.0, ColorValue::BLACK);
    let second = wrap(&mut list, layer_cmd(0.5), Some(NodeId(2)), vec![b]);
    let c = rect_cmd(&mut list, 8.0, 8.0, ColorValue::BLACK);
    let third = wrap(&mut list, layer_cmd(0.5), Some(NodeId(1)), vec![c]);
    let root = wrap(
        &mut list,
        PaintCommand::Transform { translation: None },
        None,
        vec![first, second, third],
    );
    list.set_roots(vec![root]);

    let mut compositor = compositor();
    compositor.composite(list).expect("composite");
    let layers: Vec<Vec<CmdId>> = compositor
        .layers()
        .iter()
        .map(|layer| layer.items().to_vec())
        .collect();
    assert_eq!(layers, vec![vec![a], vec![b], vec![c]]);
}

#[test]
fn test_non_overlapping_later_command_joins_earlier_layer() {
    let mut list = DisplayList::new();
    let a = rect_cmd(&mut list, 0.0, 0.0, ColorValue::BLACK);
    let b = rect_cmd(&mut list, 50.0, 0.0, ColorValue::BLACK);
    let nested = wrap(&mut list, layer_cmd(0.5), Some(NodeId(2)), vec![b]);
    let c = rect_cmd(&mut list, 100.0, 0.0, ColorValue::BLACK);
    let outer = wrap(
        &mut list,
        PaintCommand::Transform { translation: None },
        Some(NodeId(1)),
        vec![a, nested, c],
    );
    list.set_roots(vec![outer]);

    let mut compositor = compositor();
    compositor.composite(list).expect("composite");
    let layers: Vec<Vec<CmdId>> = compositor
        .layers()
        .iter()
        .map(|layer| layer.items().to_vec())
        .collect();
    assert_eq!(layers, vec![vec![a, c], vec![b]]);

    // Both layers hang off one clone of the outer effect.
    assert_eq!(compositor.draw_roots().len(), 1);
    let root_item = &compositor.draw_items()[compositor.draw_roots()[0]];
    assert!(matches!(
        root_item.kind,
        DrawKind::Effect(PaintCommand::Transform { .. })
    ));
    assert_eq!(root_item.children.len(), 2);
}

#[test]
fn test_plain_document_is_one_layer() {
    let list = painted("<p>Hello <b>world</b></p>");
    let root = list.roots()[0];
    let mut compositor = compositor();
    compositor.composite(list).expect("composite");
    assert_eq!(compositor.layers().len(), 1);
    assert_eq!(compositor.layers()[0].items(), &[root]);
    let draw_root = &compositor.draw_items()[compositor.draw_roots()[0]];
    assert_eq!(draw_root.kind, DrawKind::Layer(0));
}

#[test]
fn test_layer_bounds_are_outset() {
    let mut list = DisplayList::new();
    let a = rect_cmd(&mut list, 10.0, 10.0, ColorValue::BLACK);
    let layer = wrap(&mut list, layer_cmd(0.5), Some(NodeId(1)), vec![a]);
    list.set_roots(vec![layer]);

    let mut compositor = compositor();
    compositor.composite(list).expect("composite");
    let layer = &compositor.layers()[0];
    assert_eq!(
        layer.composited_bounds(compositor.display_list()),
        Rect::new(9.0, 9.0, 12.0, 12.0)
    );
    let surface = layer.surface().expect("rastered");
    assert_eq!((surface.width(), surface.height()), (12, 12));
    assert_eq!(layer.origin(), (9.0, 9.0));
}

#[test]
fn test_absolute_bounds_follow_transforms() {
    let mut list = DisplayList::new();
    let a = rect_cmd(&mut list, 0.0, 0.0, ColorValue::BLACK);
    let layer = wrap(&mut list, layer_cmd(0.5), Some(NodeId(1)), vec![a]);
    let moved = wrap(
        &mut list,
        PaintCommand::Transform {
            translation: Some(Translation::new(100.0, 0.0)),
        },
        Some(NodeId(1)),
        vec![layer],
    );
    list.set_roots(vec![moved]);

    let mut compositor = compositor();
    compositor.composite(list).expect("composite");
    let bounds = compositor.layers()[0].absolute_bounds(compositor.display_list());
    assert_eq!(bounds, Rect::new(100.0, 0.0, 10.0, 10.0));
}

/// A red square at 50% opacity under node 1, inside a transform owned by
/// the same node.
fn faded_square() -> DisplayList {
    let mut list = DisplayList::new();
    let a = rect_cmd(&mut list, 0.0, 0.0, ColorValue::rgb(255, 0, 0));
    let layer = wrap(&mut list, layer_cmd(0.5), Some(NodeId(1)), vec![a]);
    let transform = wrap(
        &mut list,
        PaintCommand::Transform { translation: None },
        Some(NodeId(1)),
        vec![layer],
    );
    list.set_roots(vec![transform]);
    list
}

fn pixel(compositor: &Compositor, x: u32, y: u32) -> (u8, u8, u8) {
    let mut canvas = PixmapCanvas::new(20, 20, Arc::new(FontSet::empty())).expect("canvas");
    compositor.draw(&mut canvas);
    let p = canvas
        .into_pixmap()
        .pixel(x, y)
        .expect("in bounds")
        .demultiply();
    (p.red(), p.green(), p.blue())
}

#[test]
fn test_draw_applies_layer_opacity() {
    let mut compositor = compositor();
    compositor.composite(faded_square()).expect("composite");
    let (r, g, b) = pixel(&compositor, 5, 5);
    assert_eq!(r, 255);
    assert!((120..=135).contains(&g), "green {g}");
    assert_eq!(g, b);
    assert_eq!(pixel(&compositor, 15, 15), (255, 255, 255));
}

#[test]
fn test_apply_updates_swaps_effect_parameters() {
    let mut compositor = compositor();
    compositor.composite(faded_square()).expect("composite");

    let updates = HashMap::from([(
        NodeId(1),
        vec![
            layer_cmd(0.25),
            PaintCommand::Transform {
                translation: Some(Translation::new(5.0, 0.0)),
            },
        ],
    )]);
    assert!(compositor.apply_updates(updates));
    assert_eq!(compositor.layers().len(), 1);

    // Moved right by five pixels and lighter.
    assert_eq!(pixel(&compositor, 2, 5), (255, 255, 255));
    let (_, g, _) = pixel(&compositor, 12, 5);
    assert!((185..=200).contains(&g), "green {g}");
}

#[test]
fn test_apply_updates_rejects_isolation_change() {
    let mut compositor = compositor();
    compositor.composite(faded_square()).expect("composite");
    let updates = HashMap::from([(
        NodeId(1),
        vec![layer_cmd(1.0), PaintCommand::Transform { translation: None }],
    )]);
    assert!(!compositor.apply_updates(updates));
}

#[test]
fn test_apply_updates_rejects_unknown_shape() {
    let mut compositor = compositor();
    compositor.composite(faded_square()).expect("composite");
    let updates = HashMap::from([(NodeId(1), vec![layer_cmd(0.2)])]);
    assert!(!compositor.apply_updates(updates));
    let missing = HashMap::from([(NodeId(7), vec![layer_cmd(0.2)])]);
    assert!(!compositor.apply_updates(missing));
}

#[test]
fn test_apply_updates_rejects_effect_inside_a_surface() {
    let mut list = DisplayList::new();
    let a = rect_cmd(&mut list, 0.0, 0.0, ColorValue::BLACK);
    let inner = wrap(
        &mut list,
        PaintCommand::Transform { translation: None },
        Some(NodeId(2)),
        vec![a],
    );
    let layer = wrap(&mut list, layer_cmd(0.5), Some(NodeId(1)), vec![inner]);
    list.set_roots(vec![layer]);

    let mut compositor = compositor();
    compositor.composite(list).expect("composite");
    // The inner transform was rastered into the layer's surface.
    assert_eq!(compositor.layers()[0].items(), &[inner]);
    let moved = HashMap::from([(
        NodeId(2),
        vec![PaintCommand::Transform {
            translation: Some(Translation::new(3.0, 0.0)),
        }],
    )]);
    assert!(!compositor.apply_updates(moved));
    let unchanged = HashMap::from([(
        NodeId(2),
        vec![PaintCommand::Transform { translation: None }],
    )]);
    assert!(compositor.apply_updates(unchanged));
}

/// Raster `html` through the compositor and by running its display list
/// straight into one canvas, and check the two agree everywhere.
fn assert_layers_match_direct_paint(html: &str, sample: (u32, u32)) {
    let fonts = Arc::new(FontSet::empty());
    let mut page = Page::with_font_set(html, PageConfig::default(), Arc::clone(&fonts));
    let composited = page.raster().expect("raster");

    let mut canvas =
        PixmapCanvas::new(composited.width(), composited.height(), fonts).expect("canvas");
    page.display_list().execute(&mut canvas);
    let direct = canvas.into_pixmap();

    let (x, y) = sample;
    let painted = direct.pixel(x, y).expect("in bounds").demultiply();
    assert!(painted.green() < 200, "nothing painted at ({x}, {y})");

    for (index, (a, b)) in composited.pixels().iter().zip(direct.pixels()).enumerate() {
        let channels = [
            (a.red(), b.red()),
            (a.green(), b.green()),
            (a.blue(), b.blue()),
            (a.alpha(), b.alpha()),
        ];
        assert!(
            channels.iter().all(|&(a, b)| a.abs_diff(b) <= 2),
            "pixel {index} differs: {a:?} vs {b:?}"
        );
    }
}

#[test]
fn test_translated_child_of_faded_block_is_not_cut_off() {
    assert_layers_match_direct_paint(
        "<div style=\"opacity:0.5\">\
         <div style=\"transform:translate(0px,40px);background-color:red\">x</div>\
         </div><p>a</p><p>b</p>",
        (50, 65),
    );
}

#[test]
fn test_overflowing_child_of_faded_block_is_not_cut_off() {
    assert_layers_match_direct_paint(
        "<div style=\"opacity:0.5;height:5px\">\
         <div style=\"background-color:red\">x</div>\
         </div><p>a</p>",
        (50, 32),
    );
}

#[test]
fn test_effect_rect_covers_translated_children() {
    let mut list = DisplayList::new();
    let a = rect_cmd(&mut list, 0.0, 0.0, ColorValue::BLACK);
    let moved = wrap(
        &mut list,
        PaintCommand::Transform {
            translation: Some(Translation::new(0.0, 40.0)),
        },
        Some(NodeId(1)),
        vec![a],
    );
    assert_eq!(
        list.get(moved).expect("item").rect,
        Rect::new(0.0, 40.0, 10.0, 10.0)
    );

    let b = rect_cmd(&mut list, 0.0, 0.0, ColorValue::BLACK);
    let clip = |should_clip| PaintCommand::ClipRoundedRect {
        clip: Rect::new(0.0, 0.0, 5.0, 5.0),
        radius: 0.0,
        should_clip,
    };
    let open = wrap(&mut list, clip(false), Some(NodeId(2)), vec![b]);
    assert_eq!(
        list.get(open).expect("item").rect,
        Rect::new(0.0, 0.0, 10.0, 10.0)
    );
    let c = rect_cmd(&mut list, 0.0, 0.0, ColorValue::BLACK);
    let clipped = wrap(&mut list, clip(true), Some(NodeId(3)), vec![c]);
    assert_eq!(
        list.get(clipped).expect("item").rect,
        Rect::new(0.0, 0.0, 5.0, 5.0)
    );
}
