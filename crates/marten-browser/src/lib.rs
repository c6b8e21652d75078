//! Page pipeline for the Marten renderer.
//!
//! # Scope
//!
//! This crate provides:
//! - **Page** - one document with its style sheets, dirty flags and the
//!   render pass (style → layout → paint)
//! - **Animation Frames** - transition ticks, composited updates and scroll
//!   clamping
//! - **Interaction** - zoom, text entry, clicks and in-page anchors, for a
//!   host that dispatches the events
//! - **Compositor** - layer assignment, per-layer raster and the draw list
//! - **Software Rendering** - a tiny-skia [`Canvas`](marten_css::Canvas)
//!   with fontdue text
//!
//! # Not Yet Implemented
//!
//! - Fetching linked style sheets (the host passes their text to
//!   [`Page::add_stylesheet`])
//! - Scripts and event dispatch

pub mod compositor;
pub mod font_metrics;
pub mod renderer;

pub use marten_css as css;
pub use marten_dom as dom;
pub use marten_html as html;

use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tiny_skia::Pixmap;

use marten_common::timing::PhaseTimer;
use marten_common::warning::clear_warnings;
use marten_css::{
    ANIMATABLE_PROPERTIES, Canvas, DisplayList, FontCache, LayoutConfig, LayoutError, LayoutTree,
    PaintCommand, Painter, Rule, StyleError, StyleState, Stylesheet, parse_selector,
    parse_stylesheet, ua_stylesheet,
};
use marten_dom::{DomTree, ElementData, NodeId};

pub use compositor::{CompositedLayer, Compositor, DrawItem, DrawKind};
pub use font_metrics::FontdueFontMetrics;
pub use renderer::{FontSet, PixmapCanvas, RasterError, save_png};

/// Viewport and layout settings for a [`Page`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PageConfig {
    /// Viewport width in pixels.
    pub viewport_width: f32,
    /// Viewport height in pixels.
    pub viewport_height: f32,
    /// Horizontal page margin.
    pub hstep: f32,
    /// Vertical page margin.
    pub vstep: f32,
    /// Width of an `<input>` or `<button>` without a CSS width.
    pub input_width: f32,
    /// Pixels added to every font size.
    pub font_size_delta: f32,
}

impl Default for PageConfig {
    fn default() -> Self {
        Self {
            viewport_width: 1000.0,
            viewport_height: 800.0,
            hstep: 13.0,
            vstep: 18.0,
            input_width: 200.0,
            font_size_delta: 0.0,
        }
    }
}

impl PageConfig {
    /// The layout settings for this configuration.
    #[must_use]
    pub const fn to_layout_config(&self) -> LayoutConfig {
        LayoutConfig {
            viewport_width: self.viewport_width,
            hstep: self.hstep,
            vstep: self.vstep,
            input_width: self.input_width,
            font_size_delta: self.font_size_delta,
        }
    }
}

/// Errors from a render pass or a raster.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PageError {
    /// The style pass failed.
    #[error(transparent)]
    Style(#[from] StyleError),
    /// Layout failed.
    #[error(transparent)]
    Layout(#[from] LayoutError),
    /// A raster surface could not be allocated.
    #[error(transparent)]
    Raster(#[from] RasterError),
}

/// What one animation frame produced, for the host to present.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameCommit {
    /// Scroll offset clamped to the document.
    pub scroll: f32,
    /// Total document height.
    pub document_height: f32,
    /// Whether layers were rebuilt and rastered, rather than only redrawn.
    pub full_composite: bool,
    /// Whether transitions are still running and another frame is wanted.
    pub needs_animation_frame: bool,
}

/// Smallest zoom step; fonts never shrink more than this many pixels.
pub const MIN_FONT_SIZE_DELTA: f32 = -10.0;

/// What a click on the page asks the host to do.
#[derive(Debug, Clone, PartialEq)]
pub enum ClickAction {
    /// Nothing clickable was hit.
    None,
    /// An input was cleared and focused.
    Focused(NodeId),
    /// An in-page link was followed; scroll to this page offset.
    ScrollTo(f32),
    /// A link to another document was followed.
    Navigate(String),
    /// A button was pressed inside this form.
    Submit(NodeId),
}

/// One document and everything derived from it.
///
/// The derived state is rebuilt lazily: the `set_needs_*` methods mark a
/// pass dirty and [`Page::render`] reruns the dirty passes in order. Each
/// pass marks the ones after it dirty.
#[derive(Debug)]
pub struct Page {
    config: PageConfig,
    dom: DomTree,
    author_sheets: Vec<Stylesheet>,
    styles: StyleState,
    font_set: Arc<FontSet>,
    fonts: FontCache,
    layout: LayoutTree,
    display_list: DisplayList,
    compositor: Compositor,
    focus: Option<NodeId>,
    animations_started: bool,
    needs_style: bool,
    needs_layout: bool,
    needs_paint: bool,
    needs_composite: bool,
    composited_updates: BTreeSet<NodeId>,
    render_timer: PhaseTimer,
    composite_timer: PhaseTimer,
}

impl Page {
    /// Parse `html` into a page that draws text with the system fonts.
    #[must_use]
    pub fn new(html: &str, config: PageConfig) -> Self {
        Self::with_font_set(html, config, Arc::new(FontSet::load_system()))
    }

    /// Parse `html` into a page that measures and draws text with `fonts`.
    ///
    /// An empty [`FontSet`] gives deterministic approximate metrics.
    #[must_use]
    pub fn with_font_set(html: &str, config: PageConfig, fonts: Arc<FontSet>) -> Self {
        clear_warnings();
        Self {
            config,
            dom: marten_html::parse(html),
            author_sheets: Vec::new(),
            styles: StyleState::new(),
            fonts: FontCache::new(Box::new(FontdueFontMetrics::new(Arc::clone(&fonts)))),
            compositor: Compositor::new(Arc::clone(&fonts)),
            font_set: fonts,
            layout: LayoutTree::default(),
            display_list: DisplayList::new(),
            focus: None,
            animations_started: false,
            needs_style: true,
            needs_layout: true,
            needs_paint: true,
            needs_composite: true,
            composited_updates: BTreeSet::new(),
            render_timer: PhaseTimer::new("render"),
            composite_timer: PhaseTimer::new("composite"),
        }
    }

    /// The viewport and layout settings.
    #[must_use]
    pub const fn config(&self) -> &PageConfig {
        &self.config
    }

    /// The document tree.
    #[must_use]
    pub const fn dom(&self) -> &DomTree {
        &self.dom
    }

    /// Mutable access to the document tree. Marks the page for a full
    /// render.
    pub fn dom_mut(&mut self) -> &mut DomTree {
        self.set_needs_render();
        &mut self.dom
    }

    /// Resolved styles from the last style pass.
    #[must_use]
    pub const fn styles(&self) -> &StyleState {
        &self.styles
    }

    /// The layout tree from the last layout pass.
    #[must_use]
    pub const fn layout(&self) -> &LayoutTree {
        &self.layout
    }

    /// The display list from the last paint pass.
    #[must_use]
    pub const fn display_list(&self) -> &DisplayList {
        &self.display_list
    }

    /// The compositor holding the current layers.
    #[must_use]
    pub const fn compositor(&self) -> &Compositor {
        &self.compositor
    }

    /// Add an author style sheet after the ones already added.
    pub fn add_stylesheet(&mut self, css: &str) {
        self.author_sheets.push(parse_stylesheet(css));
        self.set_needs_render();
    }

    /// `href`s of `<link rel="stylesheet">` elements, in document order.
    ///
    /// The page does no fetching; the host loads these and passes the text
    /// to [`Page::add_stylesheet`].
    #[must_use]
    pub fn linked_stylesheet_hrefs(&self) -> Vec<String> {
        self.dom
            .descendants(self.dom.root())
            .into_iter()
            .filter(|&id| self.dom.is_element_named(id, "link"))
            .filter_map(|id| self.dom.as_element(id))
            .filter(|link| link.has_attr_value("rel", "stylesheet"))
            .filter_map(|link| link.attrs.get("href").cloned())
            .collect()
    }

    /// Mark every pass dirty.
    pub fn set_needs_render(&mut self) {
        self.needs_style = true;
        self.needs_composite = true;
    }

    /// Mark layout and paint dirty.
    pub fn set_needs_layout(&mut self) {
        self.needs_layout = true;
        self.needs_composite = true;
    }

    /// Mark paint dirty.
    pub fn set_needs_paint(&mut self) {
        self.needs_paint = true;
        self.needs_composite = true;
    }

    /// Run the dirty passes in order.
    ///
    /// # Errors
    ///
    /// Returns [`PageError::Style`] if a `font-size` cannot be resolved and
    /// [`PageError::Layout`] if layout reaches an unstyled node. The flags
    /// of the failed pass stay set.
    pub fn render(&mut self) -> Result<(), PageError> {
        if !(self.needs_style || self.needs_layout || self.needs_paint) {
            return Ok(());
        }
        self.render_timer.start();
        let result = self.run_passes();
        self.render_timer.stop();
        result
    }

    fn run_passes(&mut self) -> Result<(), PageError> {
        if self.needs_style {
            let rules = self.collect_rules();
            let pass = self.styles.resolve(&self.dom, &rules)?;
            self.animations_started |= pass.animations_started > 0;
            self.needs_style = false;
            self.needs_layout = true;
        }
        if self.needs_layout {
            self.layout = LayoutTree::build(
                &self.dom,
                &self.styles,
                &mut self.fonts,
                &self.config.to_layout_config(),
            )?;
            self.needs_layout = false;
            self.needs_paint = true;
        }
        if self.needs_paint {
            self.display_list = Painter::new(&self.dom, &self.layout, &self.styles, &self.fonts)
                .with_focus(self.focus)
                .paint();
            self.needs_paint = false;
        }
        Ok(())
    }

    /// User-agent rules, then `<style>` elements in document order, then
    /// added sheets, sorted for the cascade.
    fn collect_rules(&self) -> Vec<Rule> {
        let mut sheet = ua_stylesheet().clone();
        for id in self.dom.descendants(self.dom.root()) {
            if self.dom.is_element_named(id, "style") {
                let css: String = self
                    .dom
                    .children(id)
                    .iter()
                    .filter_map(|&child| self.dom.as_text(child))
                    .collect();
                sheet.extend(&parse_stylesheet(&css));
            }
        }
        for author in &self.author_sheets {
            sheet.extend(author);
        }
        sheet.sorted_by_priority()
    }

    /// Advance animations one frame, render, and bring the layers up to
    /// date.
    ///
    /// Opacity and transform ticks only repaint and patch the compositor's
    /// draw list. Anything else, or any style or layout work, rebuilds the
    /// layers.
    ///
    /// # Errors
    ///
    /// Propagates render and raster failures.
    pub fn run_animation_frame(&mut self, scroll: f32) -> Result<FrameCommit, PageError> {
        for update in self.styles.tick_animations() {
            if ANIMATABLE_PROPERTIES.contains(&update.property.as_str()) {
                let _ = self.composited_updates.insert(update.node);
                self.needs_paint = true;
            } else {
                self.set_needs_layout();
            }
        }

        let needs_composite = self.needs_composite || self.needs_style || self.needs_layout;
        self.render()?;

        let mut full_composite = false;
        if needs_composite {
            self.composite()?;
            full_composite = true;
        } else if !self.composited_updates.is_empty() {
            let updates = self.latest_effects();
            if !self.compositor.apply_updates(updates) {
                self.composite()?;
                full_composite = true;
            }
        }
        self.composited_updates.clear();

        let document_height = self.document_height();
        let max_scroll = (document_height - self.config.viewport_height).max(0.0);
        Ok(FrameCommit {
            scroll: scroll.clamp(0.0, max_scroll),
            document_height,
            full_composite,
            needs_animation_frame: std::mem::take(&mut self.animations_started)
                || self.styles.has_animations(),
        })
    }

    /// Current effect parameters of every node with a composited update.
    fn latest_effects(&self) -> HashMap<NodeId, Vec<PaintCommand>> {
        self.composited_updates
            .iter()
            .map(|&node| {
                let commands = self
                    .display_list
                    .effects_for(node)
                    .iter()
                    .filter_map(|&id| self.display_list.get(id))
                    .map(|item| item.command.clone())
                    .collect();
                (node, commands)
            })
            .collect()
    }

    fn composite(&mut self) -> Result<(), PageError> {
        self.composite_timer.start();
        let result = self.compositor.composite(self.display_list.clone());
        self.composite_timer.stop();
        result?;
        self.needs_composite = false;
        Ok(())
    }

    /// Total height of the laid-out document, for scrollbars.
    #[must_use]
    pub fn document_height(&self) -> f32 {
        self.layout.height()
    }

    /// The innermost node whose box contains the page point `(x, y)`.
    #[must_use]
    pub fn node_at(&self, x: f32, y: f32) -> Option<NodeId> {
        self.layout.hit_test(x, y, &self.styles)
    }

    /// Elements matching `selector`, in document order. An unparseable
    /// selector matches nothing.
    #[must_use]
    pub fn query_selector_all(&self, selector: &str) -> Vec<NodeId> {
        parse_selector(selector).map_or_else(Vec::new, |s| s.select_all(&self.dom))
    }

    /// Give `node` input focus, or clear focus with `None`.
    pub fn focus(&mut self, node: Option<NodeId>) {
        if self.focus != node {
            self.focus = node;
            self.set_needs_paint();
        }
    }

    /// The focused node.
    #[must_use]
    pub const fn focused(&self) -> Option<NodeId> {
        self.focus
    }

    /// Pixels currently added to every font size.
    #[must_use]
    pub const fn zoom(&self) -> f32 {
        self.config.font_size_delta
    }

    /// Set the zoom step, clamped at [`MIN_FONT_SIZE_DELTA`], and mark the
    /// page for a full render.
    pub fn set_zoom(&mut self, delta: f32) {
        let delta = delta.max(MIN_FONT_SIZE_DELTA);
        if (delta - self.config.font_size_delta).abs() > f32::EPSILON {
            self.config.font_size_delta = delta;
            self.set_needs_render();
        }
    }

    /// Append `text` to the value of the focused input.
    ///
    /// Returns `false` when nothing is focused.
    pub fn type_text(&mut self, text: &str) -> bool {
        let Some(node) = self.focus else {
            return false;
        };
        let Some(element) = self.dom.as_element_mut(node) else {
            return false;
        };
        element.attrs.entry("value".to_string()).or_default().push_str(text);
        self.set_needs_render();
        true
    }

    /// Handle a click at the page point `(x, y)`.
    ///
    /// Focus is dropped, then the hit node and its ancestors are searched
    /// for the nearest link, input or button. A clicked input has its value
    /// cleared and takes focus.
    ///
    /// # Errors
    ///
    /// Propagates render failures.
    pub fn click(&mut self, x: f32, y: f32) -> Result<ClickAction, PageError> {
        self.render()?;
        self.focus(None);
        let Some(hit) = self.node_at(x, y) else {
            return Ok(ClickAction::None);
        };

        let chain: Vec<NodeId> = std::iter::once(hit).chain(self.dom.ancestors(hit)).collect();
        for node in chain {
            let Some(element) = self.dom.as_element(node) else {
                continue;
            };
            match element.tag_name.as_str() {
                "a" => {
                    let Some(href) = element.attrs.get("href") else {
                        continue;
                    };
                    if href.starts_with('#') {
                        return Ok(self
                            .anchor_position(href)
                            .map_or(ClickAction::None, |(_, y)| ClickAction::ScrollTo(y)));
                    }
                    return Ok(ClickAction::Navigate(href.clone()));
                }
                "input" => {
                    if let Some(input) = self.dom.as_element_mut(node) {
                        let _ = input.attrs.insert("value".to_string(), String::new());
                    }
                    self.set_needs_render();
                    self.focus(Some(node));
                    return Ok(ClickAction::Focused(node));
                }
                "button" => {
                    let form = self.dom.ancestors(node).find(|&id| {
                        self.dom
                            .as_element(id)
                            .is_some_and(|e| e.tag_name == "form" && e.attrs.contains_key("action"))
                    });
                    return Ok(form.map_or(ClickAction::None, ClickAction::Submit));
                }
                _ => {}
            }
        }
        Ok(ClickAction::None)
    }

    /// Top-left page position of the element whose `id` matches `anchor`
    /// (with or without a leading `#`), from the last layout.
    #[must_use]
    pub fn anchor_position(&self, anchor: &str) -> Option<(f32, f32)> {
        let id = anchor.strip_prefix('#').unwrap_or(anchor);
        self.layout
            .pre_order()
            .into_iter()
            .rev()
            .filter_map(|box_id| self.layout.get(box_id))
            .find(|b| self.dom.as_element(b.node).and_then(ElementData::id) == Some(id))
            .map(|b| (b.rect.x, b.rect.y))
    }

    /// Replace the children of `node` with parsed `markup`.
    pub fn set_inner_html(&mut self, node: NodeId, markup: &str) -> Vec<NodeId> {
        let children = marten_html::set_inner_html(&mut self.dom, node, markup);
        self.set_needs_render();
        children
    }

    /// Render and draw the whole document.
    ///
    /// # Errors
    ///
    /// Propagates render and raster failures.
    pub fn raster(&mut self) -> Result<Pixmap, PageError> {
        let height = self.prepare_raster()?.max(1.0);
        self.draw(height, 0.0)
    }

    /// Render and draw one viewport-sized screen at `scroll`.
    ///
    /// # Errors
    ///
    /// Propagates render and raster failures.
    pub fn raster_viewport(&mut self, scroll: f32) -> Result<Pixmap, PageError> {
        let document_height = self.prepare_raster()?;
        let max_scroll = (document_height - self.config.viewport_height).max(0.0);
        self.draw(self.config.viewport_height, scroll.clamp(0.0, max_scroll))
    }

    /// Bring every pass and the layers up to date, returning the document
    /// height.
    fn prepare_raster(&mut self) -> Result<f32, PageError> {
        if self.needs_style || self.needs_layout || self.needs_paint {
            self.needs_composite = true;
        }
        self.render()?;
        if self.needs_composite {
            self.composite()?;
        }
        Ok(self.document_height())
    }

    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    fn draw(&self, height: f32, scroll: f32) -> Result<Pixmap, PageError> {
        let width = self.config.viewport_width.max(1.0).ceil() as u32;
        let height = height.max(1.0).ceil() as u32;
        let mut canvas = PixmapCanvas::new(width, height, Arc::clone(&self.font_set))?;
        canvas.translate(0.0, -scroll);
        self.compositor.draw(&mut canvas);
        Ok(canvas.into_pixmap())
    }

    /// Average render and composite times since the last call, one line
    /// per phase that ran.
    pub fn timing_report(&mut self) -> Vec<String> {
        [self.render_timer.report(), self.composite_timer.report()]
            .into_iter()
            .flatten()
            .collect()
    }
}
