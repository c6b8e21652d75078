//! Software raster backend.
//!
//! [`PixmapCanvas`] implements the paint [`Canvas`] seam on a tiny-skia
//! pixel buffer, with glyphs rasterized by fontdue.
//!
//! ```text
//! Style → Layout → Paint → Composite → Raster
//!                                        ↓
//!                                  PixmapCanvas → Pixels
//! ```
//!
//! The canvas knows nothing about CSS, layout, or the DOM. It only executes
//! drawing calls in the order it receives them.

use std::mem;
use std::path::Path;
use std::sync::Arc;

use fontdue::{Font, FontSettings};
use image::{ImageBuffer, Rgba, RgbaImage};
use thiserror::Error;
use tiny_skia::{
    BlendMode as SkiaBlendMode, Color, FillRule, Mask, MaskType, Paint, Path as SkiaPath,
    PathBuilder, Pixmap, PixmapPaint, PremultipliedColorU8, Stroke, Transform,
};

use marten_common::warning::warn_once;
use marten_css::{BlendMode, Canvas, ColorValue, FontKey, FontSlant, FontWeight, Rect};

/// Common system font paths to search for a default (regular) font.
const FONT_SEARCH_PATHS: &[&str] = &[
    // macOS
    "/System/Library/Fonts/Helvetica.ttc",
    "/System/Library/Fonts/SFNS.ttf",
    "/Library/Fonts/Arial.ttf",
    "/System/Library/Fonts/Supplemental/Arial.ttf",
    // Linux
    "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf",
    "/usr/share/fonts/TTF/DejaVuSans.ttf",
    "/usr/share/fonts/truetype/liberation/LiberationSans-Regular.ttf",
    "/usr/share/fonts/truetype/freefont/FreeSans.ttf",
    // Windows
    "C:\\Windows\\Fonts\\arial.ttf",
    "C:\\Windows\\Fonts\\segoeui.ttf",
];

/// System font paths for bold variants.
const FONT_BOLD_SEARCH_PATHS: &[&str] = &[
    // macOS
    "/System/Library/Fonts/Supplemental/Arial Bold.ttf",
    "/Library/Fonts/Arial Bold.ttf",
    // Linux
    "/usr/share/fonts/truetype/dejavu/DejaVuSans-Bold.ttf",
    "/usr/share/fonts/TTF/DejaVuSans-Bold.ttf",
    "/usr/share/fonts/truetype/liberation/LiberationSans-Bold.ttf",
    "/usr/share/fonts/truetype/freefont/FreeSansBold.ttf",
    // Windows
    "C:\\Windows\\Fonts\\arialbd.ttf",
];

/// System font paths for italic variants.
const FONT_ITALIC_SEARCH_PATHS: &[&str] = &[
    // macOS
    "/System/Library/Fonts/Supplemental/Arial Italic.ttf",
    "/Library/Fonts/Arial Italic.ttf",
    // Linux
    "/usr/share/fonts/truetype/dejavu/DejaVuSans-Oblique.ttf",
    "/usr/share/fonts/TTF/DejaVuSans-Oblique.ttf",
    "/usr/share/fonts/truetype/liberation/LiberationSans-Italic.ttf",
    "/usr/share/fonts/truetype/freefont/FreeSansOblique.ttf",
    // Windows
    "C:\\Windows\\Fonts\\ariali.ttf",
];

/// System font paths for bold-italic variants.
const FONT_BOLD_ITALIC_SEARCH_PATHS: &[&str] = &[
    // macOS
    "/System/Library/Fonts/Supplemental/Arial Bold Italic.ttf",
    "/Library/Fonts/Arial Bold Italic.ttf",
    // Linux
    "/usr/share/fonts/truetype/dejavu/DejaVuSans-BoldOblique.ttf",
    "/usr/share/fonts/TTF/DejaVuSans-BoldOblique.ttf",
    "/usr/share/fonts/truetype/liberation/LiberationSans-BoldItalic.ttf",
    "/usr/share/fonts/truetype/freefont/FreeSansBoldOblique.ttf",
    // Windows
    "C:\\Windows\\Fonts\\arialbi.ttf",
];

/// Errors from allocating raster surfaces.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RasterError {
    /// tiny-skia refused the surface size.
    #[error("cannot allocate a {width}x{height} surface")]
    Surface {
        /// Requested width in pixels.
        width: u32,
        /// Requested height in pixels.
        height: u32,
    },
}

/// The faces text is drawn with, one per weight/slant combination.
///
/// Missing variants fall back to the closest loaded face. A set with no
/// regular face draws no text; layout then measures with approximate
/// metrics.
#[derive(Default)]
pub struct FontSet {
    regular: Option<Font>,
    bold: Option<Font>,
    italic: Option<Font>,
    bold_italic: Option<Font>,
}

impl FontSet {
    /// A set with no faces.
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    /// Load whatever system fonts can be found.
    #[must_use]
    pub fn load_system() -> Self {
        let set = Self {
            regular: load_font_from_paths(FONT_SEARCH_PATHS),
            bold: load_font_from_paths(FONT_BOLD_SEARCH_PATHS),
            italic: load_font_from_paths(FONT_ITALIC_SEARCH_PATHS),
            bold_italic: load_font_from_paths(FONT_BOLD_ITALIC_SEARCH_PATHS),
        };
        if set.regular.is_none() {
            warn_once("Fonts", "No system font found. Text will not be rendered.");
        }
        set
    }

    /// A set built from one face used for every variant.
    #[must_use]
    pub fn from_font(font: Font) -> Self {
        Self {
            regular: Some(font),
            bold: None,
            italic: None,
            bold_italic: None,
        }
    }

    /// Whether any face is loaded.
    #[must_use]
    pub const fn has_fonts(&self) -> bool {
        self.regular.is_some()
    }

    /// The best loaded face for `key`, falling back through:
    /// exact match → partial match → regular.
    #[must_use]
    pub fn select(&self, key: &FontKey) -> Option<&Font> {
        let is_bold = key.weight == FontWeight::Bold;
        let is_italic = key.slant == FontSlant::Italic;
        match (is_bold, is_italic) {
            (true, true) => self
                .bold_italic
                .as_ref()
                .or(self.bold.as_ref())
                .or(self.regular.as_ref()),
            (true, false) => self.bold.as_ref().or(self.regular.as_ref()),
            (false, true) => self.italic.as_ref().or(self.regular.as_ref()),
            (false, false) => self.regular.as_ref(),
        }
    }
}

impl std::fmt::Debug for FontSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FontSet")
            .field("regular", &self.regular.is_some())
            .field("bold", &self.bold.is_some())
            .field("italic", &self.italic.is_some())
            .field("bold_italic", &self.bold_italic.is_some())
            .finish()
    }
}

/// Try to load a font from a list of filesystem paths.
fn load_font_from_paths(paths: &[&str]) -> Option<Font> {
    paths.iter().find_map(|path| {
        let data = std::fs::read(path).ok()?;
        Font::from_bytes(data, FontSettings::default()).ok()
    })
}

/// What `restore` has to undo.
enum Saved {
    /// A plain `save`.
    State {
        transform: Transform,
        clip: Option<Mask>,
    },
    /// A `save_layer`: the surface below plus how to composite onto it.
    Layer {
        transform: Transform,
        clip: Option<Mask>,
        below: Pixmap,
        opacity: f32,
        blend: SkiaBlendMode,
    },
}

/// A [`Canvas`] drawing into a tiny-skia [`Pixmap`].
///
/// Layers are full-size offscreen pixmaps, so clip masks stay valid across
/// `save_layer`.
pub struct PixmapCanvas {
    pixmap: Pixmap,
    fonts: Arc<FontSet>,
    transform: Transform,
    clip: Option<Mask>,
    saved: Vec<Saved>,
}

impl PixmapCanvas {
    /// A canvas filled with white.
    ///
    /// # Errors
    ///
    /// Returns [`RasterError::Surface`] if the pixmap cannot be allocated.
    pub fn new(width: u32, height: u32, fonts: Arc<FontSet>) -> Result<Self, RasterError> {
        let mut canvas = Self::transparent(width, height, fonts)?;
        canvas.pixmap.fill(Color::WHITE);
        Ok(canvas)
    }

    /// A fully transparent canvas, used for composited layer surfaces.
    ///
    /// # Errors
    ///
    /// Returns [`RasterError::Surface`] if the pixmap cannot be allocated.
    pub fn transparent(width: u32, height: u32, fonts: Arc<FontSet>) -> Result<Self, RasterError> {
        let pixmap = Pixmap::new(width, height).ok_or(RasterError::Surface { width, height })?;
        Ok(Self {
            pixmap,
            fonts,
            transform: Transform::identity(),
            clip: None,
            saved: Vec::new(),
        })
    }

    /// Width in pixels.
    #[must_use]
    pub fn width(&self) -> u32 {
        self.pixmap.width()
    }

    /// Height in pixels.
    #[must_use]
    pub fn height(&self) -> u32 {
        self.pixmap.height()
    }

    /// The pixels drawn so far. Open layers are not included.
    #[must_use]
    pub const fn pixmap(&self) -> &Pixmap {
        &self.pixmap
    }

    /// Close any open layers and take the pixels.
    #[must_use]
    pub fn into_pixmap(mut self) -> Pixmap {
        while !self.saved.is_empty() {
            self.restore();
        }
        self.pixmap
    }

    /// Draw a pre-rastered surface with its top-left corner at `(x, y)` in
    /// the current coordinate space.
    pub fn draw_surface(&mut self, surface: &Pixmap, x: f32, y: f32) {
        self.pixmap.draw_pixmap(
            0,
            0,
            surface.as_ref(),
            &PixmapPaint::default(),
            self.transform.pre_translate(x, y),
            self.clip.as_ref(),
        );
    }

    fn paint_for(color: ColorValue) -> Paint<'static> {
        let mut paint = Paint::default();
        paint.set_color_rgba8(color.r, color.g, color.b, color.a);
        paint.anti_alias = true;
        paint
    }

    fn fill(&mut self, path: &SkiaPath, color: ColorValue) {
        self.pixmap.fill_path(
            path,
            &Self::paint_for(color),
            FillRule::Winding,
            self.transform,
            self.clip.as_ref(),
        );
    }

    /// Build a mask covering `path` under the current transform.
    fn mask_for(&self, path: &SkiaPath) -> Option<Mask> {
        let mut coverage = Pixmap::new(self.pixmap.width(), self.pixmap.height())?;
        let mut paint = Paint::default();
        paint.set_color_rgba8(255, 255, 255, 255);
        paint.anti_alias = true;
        coverage.fill_path(path, &paint, FillRule::Winding, self.transform, None);
        Some(Mask::from_pixmap(coverage.as_ref(), MaskType::Alpha))
    }

    fn draw_glyphs(
        &mut self,
        font: &Font,
        x: f32,
        baseline: f32,
        text: &str,
        key: &FontKey,
        color: ColorValue,
    ) {
        let size = key.size();
        let mut cursor_x = x;
        for ch in text.chars() {
            if ch.is_control() {
                continue;
            }
            let (metrics, bitmap) = font.rasterize(ch, size);
            if metrics.width > 0
                && metrics.height > 0
                && let Some(glyph) = glyph_pixmap(&bitmap, metrics.width, metrics.height, color)
            {
                let left = cursor_x + metrics.xmin as f32;
                let top = baseline - metrics.ymin as f32 - metrics.height as f32;
                self.pixmap.draw_pixmap(
                    0,
                    0,
                    glyph.as_ref(),
                    &PixmapPaint::default(),
                    self.transform.pre_translate(left.round(), top.round()),
                    self.clip.as_ref(),
                );
            }
            cursor_x += metrics.advance_width;
        }
    }
}

impl Canvas for PixmapCanvas {
    fn fill_rect(&mut self, rect: Rect, color: ColorValue) {
        if let Some(r) = to_skia_rect(rect) {
            self.fill(&PathBuilder::from_rect(r), color);
        }
    }

    fn fill_rounded_rect(&mut self, rect: Rect, radius: f32, color: ColorValue) {
        if let Some(path) = rounded_rect_path(rect, radius) {
            self.fill(&path, color);
        }
    }

    fn draw_line(&mut self, from: (f32, f32), to: (f32, f32), thickness: f32, color: ColorValue) {
        let mut pb = PathBuilder::new();
        pb.move_to(from.0, from.1);
        pb.line_to(to.0, to.1);
        if let Some(path) = pb.finish() {
            let stroke = Stroke {
                width: thickness,
                ..Stroke::default()
            };
            self.pixmap.stroke_path(
                &path,
                &Self::paint_for(color),
                &stroke,
                self.transform,
                self.clip.as_ref(),
            );
        }
    }

    fn draw_text(&mut self, x: f32, baseline: f32, text: &str, font: &FontKey, color: ColorValue) {
        let fonts = Arc::clone(&self.fonts);
        if let Some(face) = fonts.select(font) {
            self.draw_glyphs(face, x, baseline, text, font, color);
        }
    }

    fn save(&mut self) {
        self.saved.push(Saved::State {
            transform: self.transform,
            clip: self.clip.clone(),
        });
    }

    fn save_layer(&mut self, opacity: f32, blend: BlendMode) {
        let Some(layer) = Pixmap::new(self.pixmap.width(), self.pixmap.height()) else {
            // Draw straight through rather than lose the content.
            self.save();
            return;
        };
        let below = mem::replace(&mut self.pixmap, layer);
        self.saved.push(Saved::Layer {
            transform: self.transform,
            clip: self.clip.clone(),
            below,
            opacity: opacity.clamp(0.0, 1.0),
            blend: to_skia_blend(blend),
        });
    }

    fn restore(&mut self) {
        match self.saved.pop() {
            Some(Saved::State { transform, clip }) => {
                self.transform = transform;
                self.clip = clip;
            }
            Some(Saved::Layer {
                transform,
                clip,
                below,
                opacity,
                blend,
            }) => {
                let layer = mem::replace(&mut self.pixmap, below);
                self.transform = transform;
                self.clip = clip;
                let paint = PixmapPaint {
                    opacity,
                    blend_mode: blend,
                    ..PixmapPaint::default()
                };
                // Layer pixels are already in device space.
                self.pixmap.draw_pixmap(
                    0,
                    0,
                    layer.as_ref(),
                    &paint,
                    Transform::identity(),
                    self.clip.as_ref(),
                );
            }
            None => warn_once("Raster", "restore without a matching save"),
        }
    }

    fn clip_rounded_rect(&mut self, rect: Rect, radius: f32) {
        let Some(path) = rounded_rect_path(rect, radius) else {
            return;
        };
        let Some(mut mask) = self.mask_for(&path) else {
            return;
        };
        if let Some(existing) = &self.clip {
            combine_masks(&mut mask, existing);
        }
        self.clip = Some(mask);
    }

    fn translate(&mut self, dx: f32, dy: f32) {
        self.transform = self.transform.pre_translate(dx, dy);
    }
}

impl std::fmt::Debug for PixmapCanvas {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PixmapCanvas")
            .field("width", &self.pixmap.width())
            .field("height", &self.pixmap.height())
            .field("depth", &self.saved.len())
            .finish_non_exhaustive()
    }
}

fn to_skia_rect(rect: Rect) -> Option<tiny_skia::Rect> {
    tiny_skia::Rect::from_xywh(rect.x, rect.y, rect.width, rect.height)
}

fn to_skia_blend(blend: BlendMode) -> SkiaBlendMode {
    match blend {
        BlendMode::Normal => SkiaBlendMode::SourceOver,
        BlendMode::Multiply => SkiaBlendMode::Multiply,
        BlendMode::Difference => SkiaBlendMode::Difference,
        BlendMode::Screen => SkiaBlendMode::Screen,
    }
}

/// Rectangle path with every corner rounded to `radius`, clamped to half
/// the shorter side.
fn rounded_rect_path(rect: Rect, radius: f32) -> Option<SkiaPath> {
    let r = radius.min(rect.width / 2.0).min(rect.height / 2.0);
    if r <= 0.0 {
        return to_skia_rect(rect).map(PathBuilder::from_rect);
    }
    let (left, top, right, bottom) = (rect.x, rect.y, rect.right(), rect.bottom());
    let mut pb = PathBuilder::new();
    pb.move_to(left + r, top);
    pb.line_to(right - r, top);
    pb.quad_to(right, top, right, top + r);
    pb.line_to(right, bottom - r);
    pb.quad_to(right, bottom, right - r, bottom);
    pb.line_to(left + r, bottom);
    pb.quad_to(left, bottom, left, bottom - r);
    pb.line_to(left, top + r);
    pb.quad_to(left, top, left + r, top);
    pb.close();
    pb.finish()
}

/// Intersect `into` with `existing` by multiplying coverage.
#[allow(clippy::cast_possible_truncation)]
fn combine_masks(into: &mut Mask, existing: &Mask) {
    if into.width() != existing.width() || into.height() != existing.height() {
        return;
    }
    for (dst, src) in into.data_mut().iter_mut().zip(existing.data()) {
        *dst = ((u16::from(*dst) * u16::from(*src) + 127) / 255) as u8;
    }
}

/// A glyph coverage bitmap tinted with `color`.
#[allow(clippy::cast_possible_truncation)]
fn glyph_pixmap(coverage: &[u8], width: usize, height: usize, color: ColorValue) -> Option<Pixmap> {
    let mut glyph = Pixmap::new(u32::try_from(width).ok()?, u32::try_from(height).ok()?)?;
    for (pixel, &alpha) in glyph.pixels_mut().iter_mut().zip(coverage) {
        let a = (u16::from(alpha) * u16::from(color.a) / 255) as u8;
        let premultiply = |c: u8| (u16::from(c) * u16::from(a) / 255) as u8;
        if let Some(p) = PremultipliedColorU8::from_rgba(
            premultiply(color.r),
            premultiply(color.g),
            premultiply(color.b),
            a,
        ) {
            *pixel = p;
        }
    }
    Some(glyph)
}

/// Save `pixmap` as a PNG (or any format the extension names).
///
/// # Errors
///
/// Returns an error if the image cannot be saved to the given path.
pub fn save_png(pixmap: &Pixmap, path: &Path) -> anyhow::Result<()> {
    to_rgba_image(pixmap).save(path).map_err(|e| {
        anyhow::anyhow!("failed to save screenshot to '{}': {e}", path.display())
    })?;
    Ok(())
}

/// Convert premultiplied tiny-skia pixels to a straight-alpha image.
#[must_use]
pub fn to_rgba_image(pixmap: &Pixmap) -> RgbaImage {
    let mut image = ImageBuffer::new(pixmap.width(), pixmap.height());
    for (out, pixel) in image.pixels_mut().zip(pixmap.pixels()) {
        let c = pixel.demultiply();
        *out = Rgba([c.red(), c.green(), c.blue(), c.alpha()]);
    }
    image
}
