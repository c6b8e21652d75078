//! Font metrics backed by fontdue for text measurement during layout.
//!
//! Widths sum per-character advances, matching the cursor advancement in
//! [`PixmapCanvas`](crate::renderer::PixmapCanvas) so measured and drawn
//! text line up.

use std::sync::Arc;

use marten_css::{ApproximateFontMetrics, FontKey, FontMetrics};

use crate::renderer::FontSet;

/// [`FontMetrics`] over the faces of a [`FontSet`].
///
/// Uses `Font::metrics()` rather than `Font::rasterize()`, so no bitmaps are
/// generated when only measurements are needed. Keys with no loaded face
/// are measured with [`ApproximateFontMetrics`].
#[derive(Debug, Clone)]
pub struct FontdueFontMetrics {
    fonts: Arc<FontSet>,
}

impl FontdueFontMetrics {
    /// Measure with the faces in `fonts`.
    #[must_use]
    pub const fn new(fonts: Arc<FontSet>) -> Self {
        Self { fonts }
    }
}

impl FontMetrics for FontdueFontMetrics {
    fn text_width(&self, text: &str, font: &FontKey) -> f32 {
        let Some(face) = self.fonts.select(font) else {
            return ApproximateFontMetrics.text_width(text, font);
        };
        text.chars()
            .filter(|ch| !ch.is_control())
            .map(|ch| face.metrics(ch, font.size()).advance_width)
            .sum()
    }

    fn ascent(&self, font: &FontKey) -> f32 {
        self.fonts
            .select(font)
            .and_then(|face| face.horizontal_line_metrics(font.size()))
            .map_or_else(|| ApproximateFontMetrics.ascent(font), |m| m.ascent)
    }

    fn descent(&self, font: &FontKey) -> f32 {
        // fontdue reports descent below the baseline as a negative number.
        self.fonts
            .select(font)
            .and_then(|face| face.horizontal_line_metrics(font.size()))
            .map_or_else(|| ApproximateFontMetrics.descent(font), |m| -m.descent)
    }
}
