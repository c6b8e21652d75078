//! Display List - a tree of drawing commands
//!
//! The display list is the output of the painting phase. Drawing commands are
//! leaves; visual effects (transform, layer, clip) are interior items that
//! own the commands they apply to. Items live in an arena and refer to each
//! other by [`CmdId`].

use std::collections::HashMap;
use std::fmt;

use marten_dom::NodeId;

use crate::layout::{FontKey, Rect};
use crate::style::{BlendMode, ColorValue, Translation, format_number};

use super::Canvas;

/// Index of an item in a [`DisplayList`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CmdId(pub usize);

/// A drawing command or a visual effect.
#[derive(Debug, Clone, PartialEq)]
pub enum PaintCommand {
    /// Fill the item's rect.
    DrawRect {
        /// Fill color.
        color: ColorValue,
    },
    /// Fill the item's rect with rounded corners.
    DrawRoundedRect {
        /// Corner radius.
        radius: f32,
        /// Fill color.
        color: ColorValue,
    },
    /// Draw one run of text. The item's rect spans from the top of the
    /// ascent to the bottom of the descent.
    DrawText {
        /// The text.
        text: String,
        /// Font to draw with.
        font: FontKey,
        /// Font ascent, the distance from the rect's top to the baseline.
        ascent: f32,
        /// Text color.
        color: ColorValue,
    },
    /// Stroke a line.
    DrawLine {
        /// Start point.
        from: (f32, f32),
        /// End point.
        to: (f32, f32),
        /// Stroke width.
        thickness: f32,
        /// Stroke color.
        color: ColorValue,
    },
    /// Draw children into an isolated layer, then composite it.
    SaveLayer {
        /// Layer opacity.
        opacity: f32,
        /// How the layer combines with what is below.
        blend: BlendMode,
        /// Whether a layer is needed at all. When false the children are
        /// drawn directly.
        should_save: bool,
    },
    /// Clip children to a rounded rectangle.
    ClipRoundedRect {
        /// Clip bounds.
        clip: Rect,
        /// Corner radius.
        radius: f32,
        /// Whether to clip. When false the children are drawn directly.
        should_clip: bool,
    },
    /// Draw children moved by a translation.
    Transform {
        /// Offset, or `None` for the identity.
        translation: Option<Translation>,
    },
}

impl PaintCommand {
    /// Whether this command wraps other commands.
    #[must_use]
    pub const fn is_effect(&self) -> bool {
        matches!(
            self,
            Self::SaveLayer { .. } | Self::ClipRoundedRect { .. } | Self::Transform { .. }
        )
    }

    /// Bounds of what this effect draws, in its parent's space, given the
    /// bounds of its children in its own content space.
    #[must_use]
    pub fn effect_bounds(&self, content: Rect) -> Rect {
        match self {
            Self::ClipRoundedRect {
                clip,
                should_clip: true,
                ..
            } => content.intersection(clip),
            _ => self.map(content),
        }
    }

    /// Map a rect from this command's content space to its parent's.
    #[must_use]
    pub fn map(&self, rect: Rect) -> Rect {
        match self {
            Self::Transform {
                translation: Some(t),
            } => rect.translate(t.x, t.y),
            _ => rect,
        }
    }

    /// Apply this effect to `canvas` before its children are drawn.
    ///
    /// Returns whether a matching [`Canvas::restore`] is needed afterwards.
    /// Drawing commands draw themselves and return `false`.
    pub fn begin(&self, rect: Rect, canvas: &mut dyn Canvas) -> bool {
        match self {
            Self::DrawRect { color } => canvas.fill_rect(rect, *color),
            Self::DrawRoundedRect { radius, color } => {
                canvas.fill_rounded_rect(rect, *radius, *color);
            }
            Self::DrawText {
                text,
                font,
                ascent,
                color,
            } => canvas.draw_text(rect.x, rect.y + ascent, text, font, *color),
            Self::DrawLine {
                from,
                to,
                thickness,
                color,
            } => canvas.draw_line(*from, *to, *thickness, *color),
            Self::SaveLayer {
                opacity,
                blend,
                should_save,
            } => {
                if *should_save {
                    canvas.save_layer(*opacity, *blend);
                }
                return *should_save;
            }
            Self::ClipRoundedRect {
                clip,
                radius,
                should_clip,
            } => {
                if *should_clip {
                    canvas.save();
                    canvas.clip_rounded_rect(*clip, *radius);
                }
                return *should_clip;
            }
            Self::Transform { translation } => {
                if let Some(t) = translation {
                    canvas.save();
                    canvas.translate(t.x, t.y);
                    return true;
                }
            }
        }
        false
    }
}

impl fmt::Display for PaintCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DrawRect { color } => write!(f, "DrawRect {}", color.to_hex_string()),
            Self::DrawRoundedRect { radius, color } => write!(
                f,
                "DrawRoundedRect radius={} {}",
                format_number(*radius, 2),
                color.to_hex_string()
            ),
            Self::DrawText { text, color, .. } => {
                write!(f, "DrawText {text:?} {}", color.to_hex_string())
            }
            Self::DrawLine { .. } => write!(f, "DrawLine"),
            Self::SaveLayer {
                opacity,
                blend,
                should_save,
            } => write!(
                f,
                "SaveLayer opacity={} blend={blend} save={should_save}",
                format_number(*opacity, 3)
            ),
            Self::ClipRoundedRect {
                radius,
                should_clip,
                ..
            } => write!(
                f,
                "ClipRoundedRect radius={} clip={should_clip}",
                format_number(*radius, 2)
            ),
            Self::Transform {
                translation: Some(t),
            } => write!(f, "Transform {t}"),
            Self::Transform { translation: None } => write!(f, "Transform none"),
        }
    }
}

/// One entry of a [`DisplayList`].
#[derive(Debug, Clone)]
pub struct DisplayItem {
    /// What to draw or apply.
    pub command: PaintCommand,
    /// Bounds in the parent's coordinate space. For effects this covers
    /// everything the children draw, after the effect is applied.
    pub rect: Rect,
    /// Enclosing effect.
    pub parent: Option<CmdId>,
    /// Commands the effect applies to, in paint order.
    pub children: Vec<CmdId>,
    /// The node an effect was generated for.
    pub node: Option<NodeId>,
    /// Whether this item, or something under it, must be drawn in its own
    /// surface.
    pub needs_compositing: bool,
}

/// A forest of paint commands in paint order.
#[derive(Debug, Clone, Default)]
pub struct DisplayList {
    items: Vec<DisplayItem>,
    roots: Vec<CmdId>,
    effects: HashMap<NodeId, Vec<CmdId>>,
}

impl DisplayList {
    /// Create an empty display list.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an effect owning `children`, which must not have a parent yet.
    ///
    /// The effect's rect is computed from its children. Effects are indexed
    /// under `node` so they can be found again with [`Self::effects_for`].
    pub fn add_effect(
        &mut self,
        command: PaintCommand,
        node: Option<NodeId>,
        children: Vec<CmdId>,
    ) -> CmdId {
        let content = children
            .iter()
            .map(|c| self.items[c.0].rect)
            .fold(Rect::default(), |acc, r| acc.union(&r));
        let rect = command.effect_bounds(content);
        self.push(command, rect, node, children)
    }

    /// Add a leaf drawing command covering `rect`.
    pub fn add_leaf(&mut self, command: PaintCommand, rect: Rect) -> CmdId {
        self.push(command, rect, None, Vec::new())
    }

    fn push(
        &mut self,
        command: PaintCommand,
        rect: Rect,
        node: Option<NodeId>,
        children: Vec<CmdId>,
    ) -> CmdId {
        let id = CmdId(self.items.len());
        let child_needs = children
            .iter()
            .any(|c| self.items[c.0].needs_compositing);
        let needs_compositing = match &command {
            PaintCommand::SaveLayer { should_save, .. } => *should_save || child_needs,
            PaintCommand::ClipRoundedRect { .. } | PaintCommand::Transform { .. } => child_needs,
            _ => false,
        };
        for child in &children {
            self.items[child.0].parent = Some(id);
        }
        if command.is_effect()
            && let Some(node) = node
        {
            self.effects.entry(node).or_default().push(id);
        }
        self.items.push(DisplayItem {
            command,
            rect,
            parent: None,
            children,
            node,
            needs_compositing,
        });
        id
    }

    /// Set the top-level items.
    pub fn set_roots(&mut self, roots: Vec<CmdId>) {
        self.roots = roots;
    }

    /// Top-level items in paint order.
    #[must_use]
    pub fn roots(&self) -> &[CmdId] {
        &self.roots
    }

    /// An item by id.
    #[must_use]
    pub fn get(&self, id: CmdId) -> Option<&DisplayItem> {
        self.items.get(id.0)
    }

    /// Number of items.
    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Whether the list has no items.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Effects generated for `node`, innermost first: clip, layer,
    /// transform.
    #[must_use]
    pub fn effects_for(&self, node: NodeId) -> &[CmdId] {
        self.effects.get(&node).map_or(&[], Vec::as_slice)
    }

    /// Every item reachable from the roots, in pre-order.
    #[must_use]
    pub fn pre_order(&self) -> Vec<CmdId> {
        let mut order = Vec::with_capacity(self.items.len());
        let mut stack: Vec<CmdId> = self.roots.iter().rev().copied().collect();
        while let Some(id) = stack.pop() {
            order.push(id);
            stack.extend(self.items[id.0].children.iter().rev());
        }
        order
    }

    /// Bounds of an item on the page: its rect mapped through every
    /// enclosing transform.
    #[must_use]
    pub fn absolute_bounds(&self, id: CmdId) -> Rect {
        let Some(item) = self.get(id) else {
            return Rect::default();
        };
        let mut rect = item.rect;
        let mut current = item.parent;
        while let Some(cmd) = current {
            let item = &self.items[cmd.0];
            rect = item.command.map(rect);
            current = item.parent;
        }
        rect
    }

    /// Draw every item.
    pub fn execute(&self, canvas: &mut dyn Canvas) {
        for &root in &self.roots {
            self.execute_item(root, canvas);
        }
    }

    /// Draw one item and everything under it.
    pub fn execute_item(&self, id: CmdId, canvas: &mut dyn Canvas) {
        let Some(item) = self.get(id) else {
            return;
        };
        let restore = item.command.begin(item.rect, canvas);
        for &child in &item.children {
            self.execute_item(child, canvas);
        }
        if restore {
            canvas.restore();
        }
    }

    fn fmt_item(&self, f: &mut fmt::Formatter<'_>, id: CmdId, depth: usize) -> fmt::Result {
        let item = &self.items[id.0];
        let r = item.rect;
        writeln!(
            f,
            "{}{} [{}, {}, {}, {}]",
            "  ".repeat(depth),
            item.command,
            format_number(r.x, 2),
            format_number(r.y, 2),
            format_number(r.right(), 2),
            format_number(r.bottom(), 2)
        )?;
        for &child in &item.children {
            self.fmt_item(f, child, depth + 1)?;
        }
        Ok(())
    }
}

impl fmt::Display for DisplayList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for &root in &self.roots {
            self.fmt_item(f, root, 0)?;
        }
        Ok(())
    }
}
