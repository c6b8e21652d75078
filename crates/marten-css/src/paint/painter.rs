//! Painter - generates a display list from a layout tree
//!
//! Boxes are painted in tree order (back to front). Each box paints its own
//! decorations, then its children. Element blocks and input atoms then wrap
//! everything they painted in the element's visual effects:
//!
//! ```text
//! Transform(translate) > SaveLayer(opacity, blend) > ClipRoundedRect > content
//! ```

use marten_common::warning::warn_once;
use marten_dom::{DomTree, NodeId};

use crate::cascade::StyleState;
use crate::layout::{BoxId, BoxKind, FontCache, LayoutTree, Rect};
use crate::style::{BlendMode, ColorValue, StyleMap, Translation, parse_opacity, parse_px};

use super::{CmdId, DisplayList, PaintCommand};

/// Width of the text cursor drawn in a focused input.
pub const CARET_WIDTH: f32 = 1.0;

/// Painter that generates a display list from a layout tree.
pub struct Painter<'a> {
    dom: &'a DomTree,
    layout: &'a LayoutTree,
    styles: &'a StyleState,
    fonts: &'a FontCache,
    focus: Option<NodeId>,
}

impl<'a> Painter<'a> {
    /// Create a painter over one laid-out document.
    #[must_use]
    pub const fn new(
        dom: &'a DomTree,
        layout: &'a LayoutTree,
        styles: &'a StyleState,
        fonts: &'a FontCache,
    ) -> Self {
        Self {
            dom,
            layout,
            styles,
            fonts,
            focus: None,
        }
    }

    /// Draw a caret in the input atom of `node`.
    #[must_use]
    pub const fn with_focus(mut self, node: Option<NodeId>) -> Self {
        self.focus = node;
        self
    }

    /// Paint the whole layout tree.
    #[must_use]
    pub fn paint(&self) -> DisplayList {
        let mut list = DisplayList::new();
        if !self.layout.is_empty() {
            let roots = self.paint_box(BoxId::ROOT, &mut list);
            list.set_roots(roots);
        }
        list
    }

    fn style(&self, node: NodeId) -> Option<&'a StyleMap> {
        self.styles.style(node)
    }

    fn paint_box(&self, id: BoxId, list: &mut DisplayList) -> Vec<CmdId> {
        let Some(layout_box) = self.layout.get(id) else {
            return Vec::new();
        };
        match &layout_box.kind {
            BoxKind::Document | BoxKind::Line { .. } => self.paint_children(id, list),
            BoxKind::Block => self.paint_block(id, layout_box.node, layout_box.rect, list),
            BoxKind::TextRun {
                word, font, color, ..
            } => {
                let Some(color) = ColorValue::for_paint(color) else {
                    return Vec::new();
                };
                let rect = Rect::new(
                    layout_box.rect.x,
                    layout_box.rect.y,
                    layout_box.rect.width,
                    font.linespace(),
                );
                vec![list.add_leaf(
                    PaintCommand::DrawText {
                        text: word.clone(),
                        font: font.key.clone(),
                        ascent: font.ascent,
                        color,
                    },
                    rect,
                )]
            }
            BoxKind::InputAtom { .. } => self.paint_input(id, list),
        }
    }

    fn paint_children(&self, id: BoxId, list: &mut DisplayList) -> Vec<CmdId> {
        self.layout
            .children(id)
            .iter()
            .flat_map(|&child| self.paint_box(child, list))
            .collect()
    }

    fn paint_block(
        &self,
        id: BoxId,
        node: NodeId,
        rect: Rect,
        list: &mut DisplayList,
    ) -> Vec<CmdId> {
        let element = self.dom.as_element(node);
        let is_atomic = self.dom.is_element_named(node, "input")
            || self.dom.is_element_named(node, "button");
        let mut cmds = Vec::new();

        // An input's own atom paints its background.
        if !is_atomic
            && let Some(color) = self
                .style(node)
                .and_then(|s| s.get("background-color"))
                .and_then(|bg| ColorValue::for_paint(bg))
        {
            cmds.push(list.add_leaf(PaintCommand::DrawRect { color }, rect));
        }

        if let Some(element) = element {
            if element.tag_name == "nav" && element.has_attr_value("class", "links") {
                cmds.push(list.add_leaf(
                    PaintCommand::DrawRect {
                        color: ColorValue::LIGHT_GRAY,
                    },
                    rect,
                ));
            }
            if element.tag_name == "li" {
                let mid = rect.y + rect.height / 2.0;
                cmds.push(list.add_leaf(
                    PaintCommand::DrawRect {
                        color: ColorValue::BLACK,
                    },
                    Rect::from_edges(rect.x + 5.0, mid, rect.x + 10.0, mid + 5.0),
                ));
            }
        }

        cmds.extend(self.paint_children(id, list));

        if element.is_some() && !is_atomic {
            self.paint_visual_effects(node, cmds, rect, list)
        } else {
            cmds
        }
    }

    fn paint_input(&self, id: BoxId, list: &mut DisplayList) -> Vec<CmdId> {
        let Some(atom) = self.layout.get(id) else {
            return Vec::new();
        };
        let Some(font) = atom.font() else {
            return Vec::new();
        };
        let node = atom.node;
        let rect = atom.rect;
        let style = self.style(node);
        let mut cmds = Vec::new();

        if let Some(color) = style
            .and_then(|s| s.get("background-color"))
            .and_then(|bg| ColorValue::for_paint(bg))
        {
            let radius = style
                .and_then(|s| s.get("border-radius"))
                .and_then(|r| parse_px(r))
                .unwrap_or(0.0);
            cmds.push(list.add_leaf(PaintCommand::DrawRoundedRect { radius, color }, rect));
        }

        let text = self.control_text(node);
        let color = style
            .and_then(|s| s.get("color"))
            .and_then(|c| ColorValue::for_paint(c));
        if let Some(color) = color {
            let width = self.fonts.measure(&text, font);
            cmds.push(list.add_leaf(
                PaintCommand::DrawText {
                    text: text.clone(),
                    font: font.key.clone(),
                    ascent: font.ascent,
                    color,
                },
                Rect::new(rect.x, rect.y, width, font.linespace()),
            ));
        }

        if self.focus == Some(node) {
            let x = rect.x + self.fonts.measure(&text, font);
            cmds.push(list.add_leaf(
                PaintCommand::DrawLine {
                    from: (x, rect.y),
                    to: (x, rect.bottom()),
                    thickness: CARET_WIDTH,
                    color: ColorValue::BLACK,
                },
                Rect::from_edges(x, rect.y, x + CARET_WIDTH, rect.bottom()),
            ));
        }

        self.paint_visual_effects(node, cmds, rect, list)
    }

    /// Text shown in a form control: an input's `value`, or a button's single
    /// text child.
    fn control_text(&self, node: NodeId) -> String {
        let Some(element) = self.dom.as_element(node) else {
            return String::new();
        };
        match element.tag_name.as_str() {
            "input" => element.attrs.get("value").cloned().unwrap_or_default(),
            "button" => match self.dom.children(node) {
                [only] => self.dom.as_text(*only).map_or_else(
                    || {
                        warn_once("Paint", "Ignoring HTML contents inside button");
                        String::new()
                    },
                    str::to_string,
                ),
                [] => String::new(),
                _ => {
                    warn_once("Paint", "Ignoring HTML contents inside button");
                    String::new()
                }
            },
            _ => String::new(),
        }
    }

    /// Wrap `cmds` in the transform, layer and clip `node`'s style asks for.
    fn paint_visual_effects(
        &self,
        node: NodeId,
        cmds: Vec<CmdId>,
        rect: Rect,
        list: &mut DisplayList,
    ) -> Vec<CmdId> {
        let style = self.style(node);
        let get = |property: &str| style.and_then(|s| s.get(property)).map(String::as_str);

        let opacity = parse_opacity(get("opacity"));
        let blend = BlendMode::from_css(get("mix-blend-mode"));
        let should_clip = get("overflow").is_some_and(|o| o.trim() == "clip");
        let radius = if should_clip {
            get("border-radius").and_then(parse_px).unwrap_or(0.0)
        } else {
            0.0
        };
        let should_save =
            blend != BlendMode::Normal || should_clip || (opacity - 1.0).abs() > f32::EPSILON;
        let translation = Translation::from_css(get("transform"));

        let clip = list.add_effect(
            PaintCommand::ClipRoundedRect {
                clip: rect,
                radius,
                should_clip,
            },
            Some(node),
            cmds,
        );
        let layer = list.add_effect(
            PaintCommand::SaveLayer {
                opacity,
                blend,
                should_save,
            },
            Some(node),
            vec![clip],
        );
        let transform = list.add_effect(
            PaintCommand::Transform { translation },
            Some(node),
            vec![layer],
        );
        vec![transform]
    }
}
