//! Compositor - splits a display list into rastered layers
//!
//! Commands that need no isolation of their own but sit directly under an
//! effect that does are grouped into [`CompositedLayer`]s. Each layer is
//! rastered once into its own surface. A draw list then replays the effects
//! above every layer and draws the cached surfaces, so an animation frame
//! that only changes opacity or a translation can skip raster entirely.
//!
//! ```text
//! DisplayList ──composite──→ layers (surfaces) + draw list
//!                                 ↑                  ↑
//!                            raster once     apply_updates per frame
//! ```

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use tiny_skia::Pixmap;

use marten_css::{Canvas, CmdId, DisplayList, PaintCommand, Rect};
use marten_dom::NodeId;

use crate::renderer::{FontSet, PixmapCanvas, RasterError};

/// Commands rastered together into one surface.
///
/// Every member shares the same enclosing effect, so one set of effects
/// drawn around the surface is correct for all of them.
#[derive(Debug, Clone)]
pub struct CompositedLayer {
    items: Vec<CmdId>,
    surface: Option<Pixmap>,
    origin: (f32, f32),
}

impl CompositedLayer {
    /// A layer holding `item`.
    #[must_use]
    pub fn new(item: CmdId) -> Self {
        Self {
            items: vec![item],
            surface: None,
            origin: (0.0, 0.0),
        }
    }

    /// Member commands in paint order.
    #[must_use]
    pub fn items(&self) -> &[CmdId] {
        &self.items
    }

    /// Whether `item` has the same enclosing effect as this layer.
    #[must_use]
    pub fn can_merge(&self, list: &DisplayList, item: CmdId) -> bool {
        let parent_of = |id: CmdId| list.get(id).and_then(|i| i.parent);
        self.items
            .first()
            .is_some_and(|&first| parent_of(first) == parent_of(item))
    }

    /// Append `item`. Callers check [`Self::can_merge`] first.
    pub fn add(&mut self, item: CmdId) {
        self.items.push(item);
    }

    /// Union of the member rects in their shared local space, outset by a
    /// pixel for anti-aliasing. An effect member's rect already covers
    /// everything it draws, so nothing falls outside the surface.
    #[must_use]
    pub fn composited_bounds(&self, list: &DisplayList) -> Rect {
        self.items
            .iter()
            .filter_map(|&id| list.get(id))
            .map(|item| item.rect)
            .reduce(|a, b| a.union(&b))
            .unwrap_or_default()
            .outset(1.0)
    }

    /// Union of the members' bounds on the page.
    #[must_use]
    pub fn absolute_bounds(&self, list: &DisplayList) -> Rect {
        self.items
            .iter()
            .map(|&id| list.absolute_bounds(id))
            .reduce(|a, b| a.union(&b))
            .unwrap_or_default()
    }

    /// The rastered surface, once [`Self::raster`] has run.
    #[must_use]
    pub const fn surface(&self) -> Option<&Pixmap> {
        self.surface.as_ref()
    }

    /// Where the surface's top-left pixel sits in the layer's local space.
    #[must_use]
    pub const fn origin(&self) -> (f32, f32) {
        self.origin
    }

    /// Draw every member into a surface sized to the composited bounds.
    ///
    /// # Errors
    ///
    /// Returns [`RasterError::Surface`] if the surface cannot be allocated.
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    pub fn raster(&mut self, list: &DisplayList, fonts: &Arc<FontSet>) -> Result<(), RasterError> {
        let bounds = self.composited_bounds(list);
        let (left, top) = (bounds.x.floor(), bounds.y.floor());
        let width = (bounds.right().ceil() - left).max(1.0) as u32;
        let height = (bounds.bottom().ceil() - top).max(1.0) as u32;

        let mut canvas = PixmapCanvas::transparent(width, height, Arc::clone(fonts))?;
        canvas.translate(-left, -top);
        for &item in &self.items {
            list.execute_item(item, &mut canvas);
        }
        self.surface = Some(canvas.into_pixmap());
        self.origin = (left, top);
        Ok(())
    }
}

/// What a [`DrawItem`] does.
#[derive(Debug, Clone, PartialEq)]
pub enum DrawKind {
    /// Draw the surface of the layer at this index.
    Layer(usize),
    /// Apply an effect to the children.
    Effect(PaintCommand),
}

/// One node of the compositor's draw list.
#[derive(Debug, Clone, PartialEq)]
pub struct DrawItem {
    /// What to draw or apply.
    pub kind: DrawKind,
    /// Bounds in the enclosing effect's space.
    pub rect: Rect,
    /// Indices of the items this effect applies to.
    pub children: Vec<usize>,
}

/// Layers and the draw list for one display list.
#[derive(Debug)]
pub struct Compositor {
    fonts: Arc<FontSet>,
    list: DisplayList,
    layers: Vec<CompositedLayer>,
    draw_items: Vec<DrawItem>,
    draw_roots: Vec<usize>,
    /// Effects whose clones appear in the draw list.
    drawn_effects: HashSet<CmdId>,
    /// Latest effect parameters per node, in `effects_for` order.
    updates: HashMap<NodeId, Vec<PaintCommand>>,
}

impl Compositor {
    /// An empty compositor drawing text with `fonts`.
    #[must_use]
    pub fn new(fonts: Arc<FontSet>) -> Self {
        Self {
            fonts,
            list: DisplayList::new(),
            layers: Vec::new(),
            draw_items: Vec::new(),
            draw_roots: Vec::new(),
            drawn_effects: HashSet::new(),
            updates: HashMap::new(),
        }
    }

    /// The display list the layers were built from.
    #[must_use]
    pub const fn display_list(&self) -> &DisplayList {
        &self.list
    }

    /// The layers in paint order.
    #[must_use]
    pub fn layers(&self) -> &[CompositedLayer] {
        &self.layers
    }

    /// The draw list arena.
    #[must_use]
    pub fn draw_items(&self) -> &[DrawItem] {
        &self.draw_items
    }

    /// Top-level draw list entries in paint order.
    #[must_use]
    pub fn draw_roots(&self) -> &[usize] {
        &self.draw_roots
    }

    /// Rebuild layers, raster them, and rebuild the draw list.
    ///
    /// # Errors
    ///
    /// Returns [`RasterError::Surface`] if a layer surface cannot be
    /// allocated.
    pub fn composite(&mut self, list: DisplayList) -> Result<(), RasterError> {
        self.list = list;
        self.updates.clear();
        self.layers = assign_layers(&self.list);
        for layer in &mut self.layers {
            layer.raster(&self.list, &self.fonts)?;
        }
        self.build_draw_list();
        Ok(())
    }

    /// Swap in new parameters for effects without re-rastering.
    ///
    /// `updates` maps each changed node to its effects in the same order as
    /// [`DisplayList::effects_for`]. Returns `false`, leaving the compositor
    /// untouched, when the updates cannot be applied to the cached layers:
    /// a node's effects changed shape, an effect switched isolation on or
    /// off, or a changed effect was rastered into a surface. The caller
    /// should then run a full [`Self::composite`].
    pub fn apply_updates(&mut self, updates: HashMap<NodeId, Vec<PaintCommand>>) -> bool {
        for (node, commands) in &updates {
            let ids = self.list.effects_for(*node);
            if ids.len() != commands.len() {
                return false;
            }
            for (&id, new) in ids.iter().zip(commands) {
                let Some(old) = self.list.get(id).map(|item| &item.command) else {
                    return false;
                };
                if !same_isolation(old, new) {
                    return false;
                }
                if old != new && !self.drawn_effects.contains(&id) {
                    return false;
                }
            }
        }
        self.updates.extend(updates);
        self.build_draw_list();
        true
    }

    /// Draw every layer surface, wrapped in its effects.
    pub fn draw(&self, canvas: &mut PixmapCanvas) {
        for &root in &self.draw_roots {
            self.draw_item(root, canvas);
        }
    }

    fn draw_item(&self, index: usize, canvas: &mut PixmapCanvas) {
        let Some(item) = self.draw_items.get(index) else {
            return;
        };
        match &item.kind {
            DrawKind::Layer(layer) => {
                if let Some(layer) = self.layers.get(*layer)
                    && let Some(surface) = layer.surface()
                {
                    let (x, y) = layer.origin();
                    canvas.draw_surface(surface, x, y);
                }
            }
            DrawKind::Effect(command) => {
                let restore = command.begin(item.rect, canvas);
                for &child in &item.children {
                    self.draw_item(child, canvas);
                }
                if restore {
                    canvas.restore();
                }
            }
        }
    }

    /// The newest known parameters of effect `id`.
    fn latest(&self, id: CmdId) -> Option<PaintCommand> {
        let item = self.list.get(id)?;
        let updated = item.node.and_then(|node| {
            let position = self.list.effects_for(node).iter().position(|&e| e == id)?;
            self.updates.get(&node)?.get(position).cloned()
        });
        Some(updated.unwrap_or_else(|| item.command.clone()))
    }

    /// Wrap each layer in clones of its ancestor effects, sharing clones
    /// between layers with common ancestors.
    fn build_draw_list(&mut self) {
        let mut items: Vec<DrawItem> = Vec::new();
        let mut roots = Vec::new();
        let mut cloned: HashMap<CmdId, usize> = HashMap::new();

        for (index, layer) in self.layers.iter().enumerate() {
            let Some(&first) = layer.items().first() else {
                continue;
            };
            let bounds = layer.composited_bounds(&self.list);
            let mut current = items.len();
            items.push(DrawItem {
                kind: DrawKind::Layer(index),
                rect: bounds,
                children: Vec::new(),
            });

            let mut parent = self.list.get(first).and_then(|item| item.parent);
            while let Some(effect) = parent {
                if let Some(&existing) = cloned.get(&effect) {
                    let added = match &items[existing].kind {
                        DrawKind::Effect(command) => command.effect_bounds(items[current].rect),
                        DrawKind::Layer(_) => items[current].rect,
                    };
                    items[existing].children.push(current);
                    items[existing].rect = items[existing].rect.union(&added);
                    break;
                }
                let Some(command) = self.latest(effect) else {
                    break;
                };
                let rect = command.effect_bounds(items[current].rect);
                let clone = items.len();
                items.push(DrawItem {
                    kind: DrawKind::Effect(command),
                    rect,
                    children: vec![current],
                });
                let _ = cloned.insert(effect, clone);
                current = clone;
                parent = self.list.get(effect).and_then(|item| item.parent);
            }
            if parent.is_none() {
                roots.push(current);
            }
        }

        self.drawn_effects = cloned.into_keys().collect();
        self.draw_items = items;
        self.draw_roots = roots;
    }
}

/// Pick the commands to raster and group them into layers.
///
/// Candidates are commands that need no compositing themselves but whose
/// parent does (or that have no parent). Each candidate joins the most
/// recent layer it can merge with, unless a later layer it cannot merge
/// with overlaps it; then it opens a new layer to keep paint order.
fn assign_layers(list: &DisplayList) -> Vec<CompositedLayer> {
    let needs = |id: CmdId| list.get(id).is_some_and(|item| item.needs_compositing);
    let candidates = list.pre_order().into_iter().filter(|&id| {
        let parent = list.get(id).and_then(|item| item.parent);
        !needs(id) && parent.is_none_or(needs)
    });

    let mut layers: Vec<CompositedLayer> = Vec::new();
    for item in candidates {
        let bounds = list.absolute_bounds(item);
        let mut merged = false;
        for layer in layers.iter_mut().rev() {
            if layer.can_merge(list, item) {
                layer.add(item);
                merged = true;
                break;
            }
            if layer.absolute_bounds(list).intersects(&bounds) {
                break;
            }
        }
        if !merged {
            layers.push(CompositedLayer::new(item));
        }
    }
    layers
}

/// Whether two versions of an effect isolate (or clip) the same way.
fn same_isolation(old: &PaintCommand, new: &PaintCommand) -> bool {
    match (old, new) {
        (
            PaintCommand::SaveLayer {
                should_save: a, ..
            },
            PaintCommand::SaveLayer {
                should_save: b, ..
            },
        ) => a == b,
        (
            PaintCommand::ClipRoundedRect {
                should_clip: a, ..
            },
            PaintCommand::ClipRoundedRect {
                should_clip: b, ..
            },
        ) => a == b,
        (PaintCommand::Transform { .. }, PaintCommand::Transform { .. }) => true,
        _ => false,
    }
}
