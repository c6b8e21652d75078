//! Layout box types and layout algorithms.
//!
//! The tree has five kinds of box:
//!
//! ```text
//! Document
//! └── Block            one per element in block mode, nested
//!     └── Line         inline mode: the block's wrapped lines
//!         ├── TextRun  one word
//!         └── InputAtom
//! ```
//!
//! A block is laid out in *block mode* when any child element has
//! `display: block`; its children become stacked blocks. Otherwise it is in
//! *inline mode*: its subtree is flattened into words and input atoms that
//! flow across lines.
//!
//! Geometry is computed in the same recursive walk that builds the boxes.
//! Inline content is built first (line breaking needs only word widths) and
//! the lines are positioned afterwards, since a line's `y` depends on the
//! height of the line before it.

use std::fmt;

#[cfg(feature = "layout-trace")]
use std::cell::Cell;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use marten_common::warning::warn_once;
use marten_dom::{DomTree, NodeId};

use crate::cascade::StyleState;
use crate::style::{FontSlant, FontWeight, StyleMap, Translation, flag, font_size_px, parse_px};

use super::box_model::Rect;
use super::font::{Font, FontCache, FontKey};

#[cfg(feature = "layout-trace")]
thread_local! {
    static LAYOUT_DEPTH: Cell<usize> = const { Cell::new(0) };
}

/// Multiplier applied to ascent and descent to get line spacing.
pub const LEADING: f32 = 1.25;

/// Extra indent of the first word on a line inside a list item, before the
/// trailing space.
pub const BULLET_INDENT: f32 = 10.0;

/// Text of the heading injected into `<nav id="toc">`.
pub const TOC_HEADING: &str = "Table of Contents";

const SOFT_HYPHEN: char = '\u{ad}';

/// Geometry constants for one layout pass.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LayoutConfig {
    /// Width of the viewport.
    pub viewport_width: f32,
    /// Horizontal page margin, also the start of every line's cursor.
    pub hstep: f32,
    /// Vertical page margin.
    pub vstep: f32,
    /// Width of an `<input>` or `<button>` without a CSS width.
    pub input_width: f32,
    /// Pixels added to every font size (zoom).
    pub font_size_delta: f32,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            viewport_width: 1000.0,
            hstep: 13.0,
            vstep: 18.0,
            input_width: 200.0,
            font_size_delta: 0.0,
        }
    }
}

/// Errors that abort layout.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LayoutError {
    /// Layout reached a node the style pass never visited.
    #[error("node {0:?} has no resolved style")]
    Unstyled(NodeId),
}

/// Index of a box in a [`LayoutTree`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct BoxId(pub usize);

impl BoxId {
    /// The document box is always first.
    pub const ROOT: Self = Self(0);
}

/// What a box is, with the data only that kind carries.
#[derive(Debug, Clone, PartialEq)]
pub enum BoxKind {
    /// The root box: page margins and total height.
    Document,
    /// A block stacked vertically in its parent.
    Block,
    /// One line of inline content.
    Line {
        /// Shift children so the line's content is centered.
        centered: bool,
    },
    /// One word.
    TextRun {
        /// Displayed text, soft hyphens removed.
        word: String,
        /// Font the word is set in.
        font: Font,
        /// Raw `color` value.
        color: String,
        /// Whitespace is significant (inside `<pre>`).
        in_pre: bool,
        /// Inside a list item.
        in_bullet: bool,
    },
    /// An `<input>` or `<button>` laid out as one unbreakable box.
    InputAtom {
        /// Font of the control's text.
        font: Font,
    },
}

impl BoxKind {
    /// Short name used in dumps.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Document => "Document",
            Self::Block => "Block",
            Self::Line { .. } => "Line",
            Self::TextRun { .. } => "TextRun",
            Self::InputAtom { .. } => "InputAtom",
        }
    }
}

/// A box: its kind, its source node, its links and its geometry.
#[derive(Debug, Clone)]
pub struct LayoutBox {
    /// Kind and kind-specific data.
    pub kind: BoxKind,
    /// The node this box was generated for.
    pub node: NodeId,
    /// Enclosing box, `None` for the document.
    pub parent: Option<BoxId>,
    /// Preceding sibling, the position reference for this box.
    pub previous: Option<BoxId>,
    /// Child boxes in order.
    pub children: Vec<BoxId>,
    /// Position and size.
    pub rect: Rect,
}

impl LayoutBox {
    /// Font of a text run or input atom.
    #[must_use]
    pub const fn font(&self) -> Option<&Font> {
        match &self.kind {
            BoxKind::TextRun { font, .. } | BoxKind::InputAtom { font } => Some(font),
            _ => None,
        }
    }

    /// Whether the box is a block (or the document).
    #[must_use]
    pub const fn is_block(&self) -> bool {
        matches!(self.kind, BoxKind::Document | BoxKind::Block)
    }
}

/// Serializable snapshot of a box subtree.
#[derive(Debug, Clone, Serialize)]
pub struct BoxDump {
    /// Box kind name.
    pub kind: &'static str,
    /// Source node index.
    pub node: usize,
    /// Position and size.
    pub rect: Rect,
    /// The word, for text runs.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    /// Child boxes.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<Self>,
}

/// A laid-out box tree.
#[derive(Debug, Clone, Default)]
pub struct LayoutTree {
    boxes: Vec<LayoutBox>,
}

impl LayoutTree {
    /// Build and lay out the box tree for `dom`.
    ///
    /// # Errors
    ///
    /// Returns [`LayoutError::Unstyled`] if a node that layout visits has no
    /// style in `styles`.
    pub fn build(
        dom: &DomTree,
        styles: &StyleState,
        fonts: &mut FontCache,
        config: &LayoutConfig,
    ) -> Result<Self, LayoutError> {
        let mut builder = Builder {
            dom,
            styles,
            fonts,
            config,
            boxes: Vec::new(),
        };
        builder.layout_document()?;
        Ok(Self {
            boxes: builder.boxes,
        })
    }

    /// The document box, if layout has run.
    #[must_use]
    pub fn root(&self) -> Option<&LayoutBox> {
        self.boxes.first()
    }

    /// A box by id.
    #[must_use]
    pub fn get(&self, id: BoxId) -> Option<&LayoutBox> {
        self.boxes.get(id.0)
    }

    /// Number of boxes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.boxes.len()
    }

    /// Whether the tree has no boxes.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.boxes.is_empty()
    }

    /// Children of a box.
    #[must_use]
    pub fn children(&self, id: BoxId) -> &[BoxId] {
        self.boxes
            .get(id.0)
            .map_or(&[], |layout_box| layout_box.children.as_slice())
    }

    /// Every box id in pre-order.
    #[must_use]
    pub fn pre_order(&self) -> Vec<BoxId> {
        let mut order = Vec::with_capacity(self.boxes.len());
        if self.boxes.is_empty() {
            return order;
        }
        let mut stack = vec![BoxId::ROOT];
        while let Some(id) = stack.pop() {
            order.push(id);
            stack.extend(self.children(id).iter().rev());
        }
        order
    }

    /// Height of the whole document, margins included.
    #[must_use]
    pub fn height(&self) -> f32 {
        self.root().map_or(0.0, |document| document.rect.height)
    }

    /// Every box generated for `node`, in pre-order.
    #[must_use]
    pub fn boxes_for_node(&self, node: NodeId) -> Vec<BoxId> {
        self.pre_order()
            .into_iter()
            .filter(|id| self.boxes[id.0].node == node)
            .collect()
    }

    /// The input atom of an `<input>` or `<button>` node.
    #[must_use]
    pub fn input_box_for(&self, node: NodeId) -> Option<BoxId> {
        self.boxes
            .iter()
            .position(|b| b.node == node && matches!(b.kind, BoxKind::InputAtom { .. }))
            .map(BoxId)
    }

    /// The rectangle of a box on the page, after the `translate` transforms
    /// of the box's own node and every ancestor node.
    ///
    /// Consecutive boxes generated for the same node (a block and its lines,
    /// say) apply that node's transform once.
    #[must_use]
    pub fn absolute_bounds(&self, id: BoxId, styles: &StyleState) -> Rect {
        let Some(layout_box) = self.get(id) else {
            return Rect::default();
        };
        let mut rect = layout_box.rect;
        let mut last_node = None;
        let mut current = Some(id);
        while let Some(box_id) = current {
            let b = &self.boxes[box_id.0];
            if last_node != Some(b.node) {
                if let Some(t) = Translation::from_css(styles.get(b.node, "transform")) {
                    rect = rect.translate(t.x, t.y);
                }
                last_node = Some(b.node);
            }
            current = b.parent;
        }
        rect
    }

    /// The node under page point `(x, y)`: the source node of the last box
    /// in pre-order whose absolute bounds contain the point.
    #[must_use]
    pub fn hit_test(&self, x: f32, y: f32, styles: &StyleState) -> Option<NodeId> {
        self.pre_order()
            .into_iter()
            .rev()
            .find(|&id| self.absolute_bounds(id, styles).contains_point(x, y))
            .map(|id| self.boxes[id.0].node)
    }

    /// Snapshot of the subtree under `id`.
    #[must_use]
    pub fn dump(&self, id: BoxId) -> Option<BoxDump> {
        let b = self.get(id)?;
        let text = match &b.kind {
            BoxKind::TextRun { word, .. } => Some(word.clone()),
            _ => None,
        };
        Some(BoxDump {
            kind: b.kind.name(),
            node: b.node.0,
            rect: b.rect,
            text,
            children: b.children.iter().filter_map(|&c| self.dump(c)).collect(),
        })
    }

    fn fmt_box(&self, f: &mut fmt::Formatter<'_>, id: BoxId, depth: usize) -> fmt::Result {
        let b = &self.boxes[id.0];
        let r = b.rect;
        write!(
            f,
            "{}{} (x={}, y={}, w={}, h={})",
            "  ".repeat(depth),
            b.kind.name(),
            r.x,
            r.y,
            r.width,
            r.height
        )?;
        if let BoxKind::TextRun { word, .. } = &b.kind {
            write!(f, " {word:?}")?;
        }
        writeln!(f)?;
        for &child in &b.children {
            self.fmt_box(f, child, depth + 1)?;
        }
        Ok(())
    }
}

impl fmt::Display for LayoutTree {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.boxes.is_empty() {
            return Ok(());
        }
        self.fmt_box(f, BoxId::ROOT, 0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LayoutMode {
    Block,
    Inline,
}

/// Inline formatting state of one block in inline mode.
struct InlineFlow {
    block: BoxId,
    width: f32,
    cursor_x: f32,
    center_next: bool,
}

struct Builder<'a> {
    dom: &'a DomTree,
    styles: &'a StyleState,
    fonts: &'a mut FontCache,
    config: &'a LayoutConfig,
    boxes: Vec<LayoutBox>,
}

impl<'a> Builder<'a> {
    fn style(&self, node: NodeId) -> Result<&'a StyleMap, LayoutError> {
        self.styles.style(node).ok_or(LayoutError::Unstyled(node))
    }

    fn alloc(
        &mut self,
        kind: BoxKind,
        node: NodeId,
        parent: Option<BoxId>,
        previous: Option<BoxId>,
    ) -> BoxId {
        let id = BoxId(self.boxes.len());
        self.boxes.push(LayoutBox {
            kind,
            node,
            parent,
            previous,
            children: Vec::new(),
            rect: Rect::default(),
        });
        if let Some(parent) = parent {
            self.boxes[parent.0].children.push(id);
        }
        id
    }

    fn font_for(&mut self, node: NodeId) -> Result<Font, LayoutError> {
        let style = self.style(node)?;
        Ok(self.fonts.font_for_style(style, self.config.font_size_delta))
    }

    fn layout_document(&mut self) -> Result<(), LayoutError> {
        let root = self.dom.root();
        let _ = self.style(root)?;
        let document = self.alloc(BoxKind::Document, root, None, None);
        let width = 2.0f32.mul_add(-self.config.hstep, self.config.viewport_width);
        self.boxes[document.0].rect = Rect::new(self.config.hstep, self.config.vstep, width, 0.0);

        let child = self.alloc(BoxKind::Block, root, Some(document), None);
        self.layout_block(child)?;
        let content = self.boxes[child.0].rect.height;
        self.boxes[document.0].rect.height = 2.0f32.mul_add(self.config.vstep, content);
        self.trace(document);
        Ok(())
    }

    fn layout_mode(&self, node: NodeId) -> Result<LayoutMode, LayoutError> {
        if self.dom.as_text(node).is_some() {
            return Ok(LayoutMode::Inline);
        }
        let children = self.dom.children(node);
        if children.is_empty() {
            return Ok(if self.dom.is_element_named(node, "input") {
                LayoutMode::Inline
            } else {
                LayoutMode::Block
            });
        }
        for &child in children {
            if self.dom.as_element(child).is_some()
                && self.style(child)?.get("display").map(String::as_str) == Some("block")
            {
                return Ok(LayoutMode::Block);
            }
        }
        Ok(LayoutMode::Inline)
    }

    fn layout_block(&mut self, id: BoxId) -> Result<(), LayoutError> {
        #[cfg(feature = "layout-trace")]
        LAYOUT_DEPTH.with(|d| d.set(d.get() + 1));

        let dom = self.dom;
        let node = self.boxes[id.0].node;
        let style = self.style(node)?;
        let parent_rect = self.boxes[id.0]
            .parent
            .map_or_else(Rect::default, |p| self.boxes[p.0].rect);
        let y = self.boxes[id.0]
            .previous
            .map_or(parent_rect.y, |p| self.boxes[p.0].rect.bottom());
        let width = css_length(style, "width").unwrap_or(parent_rect.width);
        self.boxes[id.0].rect = Rect::new(parent_rect.x, y, width, 0.0);

        match self.layout_mode(node)? {
            LayoutMode::Block => {
                let mut previous = None;
                for &child in dom.children(node) {
                    if !flag(self.style(child)?, "show-contents") {
                        continue;
                    }
                    let block = self.alloc(BoxKind::Block, child, Some(id), previous);
                    self.layout_block(block)?;
                    previous = Some(block);
                }
            }
            LayoutMode::Inline => {
                let mut flow = InlineFlow {
                    block: id,
                    width,
                    cursor_x: self.config.hstep,
                    center_next: false,
                };
                self.new_line(&mut flow, false);
                self.recurse(&mut flow, node)?;
                for line in self.boxes[id.0].children.clone() {
                    self.layout_line(line);
                }
            }
        }

        let content: f32 = self.boxes[id.0]
            .children
            .iter()
            .map(|c| self.boxes[c.0].rect.height)
            .sum();
        self.boxes[id.0].rect.height = css_length(style, "height").unwrap_or(content);

        #[cfg(feature = "layout-trace")]
        LAYOUT_DEPTH.with(|d| d.set(d.get().saturating_sub(1)));
        self.trace(id);
        Ok(())
    }

    fn new_line(&mut self, flow: &mut InlineFlow, centered: bool) {
        flow.cursor_x = self.config.hstep;
        let last_line = self.boxes[flow.block.0].children.last().copied();
        let _ = self.alloc(
            BoxKind::Line { centered },
            self.boxes[flow.block.0].node,
            Some(flow.block),
            last_line,
        );
    }

    /// The line currently being filled.
    fn current_line(&self, flow: &InlineFlow) -> BoxId {
        // A flow always opens its first line before anything is added.
        self.boxes[flow.block.0]
            .children
            .last()
            .copied()
            .unwrap_or(flow.block)
    }

    fn line_is_centered(&self, line: BoxId) -> bool {
        matches!(self.boxes[line.0].kind, BoxKind::Line { centered: true })
    }

    fn recurse(&mut self, flow: &mut InlineFlow, node: NodeId) -> Result<(), LayoutError> {
        let dom = self.dom;
        let style = self.style(node)?;
        if !flag(style, "show-contents") {
            return Ok(());
        }
        if let Some(text) = dom.as_text(node) {
            let font = self.fonts.font_for_style(style, self.config.font_size_delta);
            let color = style.get("color").cloned().unwrap_or_default();
            return self.text(flow, node, text, &font, &color);
        }
        let Some(element) = dom.as_element(node) else {
            return Ok(());
        };
        match element.tag_name.as_str() {
            // The flow's own block already opened a fresh line.
            "br" | "p" if node != self.boxes[flow.block.0].node => self.new_line(flow, false),
            "h1" if element.has_attr_value("class", "title") => flow.center_next = true,
            "nav" if element.has_attr_value("id", "toc") => {
                let key = FontKey::new(
                    style.get("font-family").map_or("Times", String::as_str),
                    font_size_px(style).mul_add(1.5, self.config.font_size_delta),
                    FontWeight::Bold,
                    FontSlant::Roman,
                );
                let font = self.fonts.font(&key);
                self.text(flow, node, TOC_HEADING, &font, "black")?;
                self.new_line(flow, false);
            }
            "input" | "button" => {
                self.input(flow, node)?;
                return Ok(());
            }
            _ => {}
        }
        for &child in dom.children(node) {
            self.recurse(flow, child)?;
        }
        Ok(())
    }

    fn text(
        &mut self,
        flow: &mut InlineFlow,
        node: NodeId,
        text: &str,
        font: &Font,
        color: &str,
    ) -> Result<(), LayoutError> {
        let style = self.style(node)?;
        let in_pre = flag(style, "in-pre-tag");
        let in_bullet = flag(style, "in-bullet");

        if flow.center_next {
            let line = self.current_line(flow);
            if self.boxes[line.0].children.is_empty() {
                self.boxes[line.0].kind = BoxKind::Line { centered: true };
            } else {
                self.new_line(flow, true);
            }
            flow.center_next = false;
        }

        let add = |builder: &mut Self, flow: &mut InlineFlow, word: String| {
            let width = builder.fonts.measure(&word, font);
            let line = builder.current_line(flow);
            let previous = builder.boxes[line.0].children.last().copied();
            let _ = builder.alloc(
                BoxKind::TextRun {
                    word,
                    font: font.clone(),
                    color: color.to_string(),
                    in_pre,
                    in_bullet,
                },
                node,
                Some(line),
                previous,
            );
            flow.cursor_x += width;
            if !in_pre {
                flow.cursor_x += font.space_width;
            }
        };

        for word in split_words(text, in_pre) {
            if in_pre && word == "\n" {
                self.new_line(flow, false);
                continue;
            }
            let display = strip_soft_hyphens(word);
            let width = self.fonts.measure(&display, font);
            if flow.cursor_x + width > flow.width {
                let line = self.current_line(flow);
                let centered = self.line_is_centered(line);
                if let Some((first, rest)) = self.hyphenate(word, font, flow) {
                    add(self, flow, first);
                    self.new_line(flow, centered);
                    add(self, flow, rest);
                    continue;
                }
                if !self.boxes[line.0].children.is_empty() {
                    self.new_line(flow, centered);
                }
            }
            add(self, flow, display);
        }
        Ok(())
    }

    /// Split `word` at the last soft hyphen whose prefix, with a visible
    /// hyphen appended, still fits on the current line.
    fn hyphenate(&self, word: &str, font: &Font, flow: &InlineFlow) -> Option<(String, String)> {
        let mut best = None;
        for (pos, _) in word.match_indices(SOFT_HYPHEN) {
            let first = format!("{}-", strip_soft_hyphens(&word[..pos]));
            if flow.cursor_x + self.fonts.measure(&first, font) < flow.width {
                let rest = strip_soft_hyphens(&word[pos + SOFT_HYPHEN.len_utf8()..]);
                best = Some((first, rest));
            } else {
                break;
            }
        }
        best
    }

    fn input(&mut self, flow: &mut InlineFlow, node: NodeId) -> Result<(), LayoutError> {
        let style = self.style(node)?;
        let width = css_length(style, "width").unwrap_or(self.config.input_width);
        let font = self.font_for(node)?;
        if flow.cursor_x + width > flow.width {
            let line = self.current_line(flow);
            if !self.boxes[line.0].children.is_empty() {
                self.new_line(flow, false);
            }
        }
        let line = self.current_line(flow);
        let previous = self.boxes[line.0].children.last().copied();
        let space = font.space_width;
        let _ = self.alloc(BoxKind::InputAtom { font }, node, Some(line), previous);
        flow.cursor_x += width + space;
        Ok(())
    }

    fn layout_line(&mut self, line: BoxId) {
        let block = self.boxes[line.0].parent.unwrap_or(line);
        let block_rect = self.boxes[block.0].rect;
        let y = self.boxes[line.0]
            .previous
            .map_or(block_rect.y, |p| self.boxes[p.0].rect.bottom());
        self.boxes[line.0].rect = Rect::new(block_rect.x, y, block_rect.width, 0.0);

        let children = self.boxes[line.0].children.clone();
        if children.is_empty() {
            self.trace(line);
            return;
        }
        for &child in &children {
            self.layout_inline_box(child, block_rect.x);
        }

        let fonts: Vec<(f32, f32)> = children
            .iter()
            .filter_map(|c| self.boxes[c.0].font().map(|f| (f.ascent, f.descent)))
            .collect();
        let max_ascent = fonts.iter().map(|f| f.0).fold(0.0, f32::max);
        let max_descent = fonts.iter().map(|f| f.1).fold(0.0, f32::max);
        let baseline = LEADING.mul_add(max_ascent, y);

        let shift = match (children.first(), children.last()) {
            (Some(first), Some(last)) if self.line_is_centered(line) => {
                let first = self.boxes[first.0].rect;
                let length = self.boxes[last.0].rect.right() - first.x;
                (block_rect.width - length) / 2.0 - (first.x - block_rect.x)
            }
            _ => 0.0,
        };

        for &child in &children {
            let ascent = self.boxes[child.0].font().map_or(0.0, |f| f.ascent);
            let rect = &mut self.boxes[child.0].rect;
            rect.x += shift;
            rect.y = baseline - ascent;
            self.trace(child);
        }
        self.boxes[line.0].rect.height = LEADING * (max_ascent + max_descent);
        self.trace(line);
    }

    /// Size a text run or input atom and place it after its previous sibling.
    fn layout_inline_box(&mut self, id: BoxId, line_x: f32) {
        let previous = self.boxes[id.0].previous.map(|p| {
            let b = &self.boxes[p.0];
            (b.rect, b.font().map_or(0.0, |f| f.space_width))
        });
        let node = self.boxes[id.0].node;
        let (x, width, height) = match &self.boxes[id.0].kind {
            BoxKind::TextRun {
                word,
                font,
                in_pre,
                in_bullet,
                ..
            } => {
                let width = self.fonts.measure(word, font);
                let x = match previous {
                    Some((rect, _)) if *in_pre => rect.right(),
                    Some((rect, space)) => rect.right() + space,
                    None if *in_bullet => line_x + BULLET_INDENT + font.space_width,
                    None => line_x,
                };
                (x, width, font.linespace())
            }
            BoxKind::InputAtom { font } => {
                let style = self.styles.style(node);
                let width = style
                    .and_then(|s| css_length(s, "width"))
                    .unwrap_or(self.config.input_width);
                let height = style
                    .and_then(|s| css_length(s, "height"))
                    .unwrap_or_else(|| font.linespace());
                let x = previous.map_or(line_x, |(rect, space)| rect.right() + space);
                (x, width, height)
            }
            _ => return,
        };
        let rect = &mut self.boxes[id.0].rect;
        rect.x = x;
        rect.width = width;
        rect.height = height;
    }

    #[cfg(feature = "layout-trace")]
    fn trace(&self, id: BoxId) {
        let b = &self.boxes[id.0];
        let depth = LAYOUT_DEPTH.with(Cell::get);
        eprintln!(
            "[LAYOUT] {}{} node={} x={} y={} w={} h={}",
            "  ".repeat(depth),
            b.kind.name(),
            b.node.0,
            b.rect.x,
            b.rect.y,
            b.rect.width,
            b.rect.height
        );
    }

    #[cfg(not(feature = "layout-trace"))]
    #[allow(clippy::unused_self)]
    const fn trace(&self, _id: BoxId) {}
}

/// A `width`/`height` in pixels, or `None` for `auto`, a missing value, or a
/// value layout cannot use.
fn css_length(style: &StyleMap, property: &str) -> Option<f32> {
    let value = style.get(property)?;
    if value.trim() == "auto" {
        return None;
    }
    let px = parse_px(value);
    if px.is_none() {
        warn_once(
            "Layout",
            &format!("ignoring {property} '{value}', only px lengths are supported"),
        );
    }
    px
}

/// Words of a text node. Outside `<pre>` this is a whitespace split; inside,
/// every whitespace character is its own token.
fn split_words(text: &str, in_pre: bool) -> Vec<&str> {
    if !in_pre {
        return text.split_whitespace().collect();
    }
    let mut words = Vec::new();
    let mut start = None;
    for (i, c) in text.char_indices() {
        if c.is_whitespace() {
            if let Some(s) = start.take() {
                words.push(&text[s..i]);
            }
            words.push(&text[i..i + c.len_utf8()]);
        } else if start.is_none() {
            start = Some(i);
        }
    }
    if let Some(s) = start {
        words.push(&text[s..]);
    }
    words
}

fn strip_soft_hyphens(word: &str) -> String {
    word.chars().filter(|&c| c != SOFT_HYPHEN).collect()
}
