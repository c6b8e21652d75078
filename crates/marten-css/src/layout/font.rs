//! Fonts and text measurement.
//!
//! Layout never talks to a font library directly. It asks a [`FontCache`]
//! for a [`Font`] matching a style, and the cache asks its [`FontMetrics`]
//! implementation for the numbers. Tests use [`ApproximateFontMetrics`];
//! the browser crate plugs in real glyph metrics.

use std::collections::HashMap;
use std::fmt;

use serde::Serialize;

use crate::style::{FontSlant, FontWeight, StyleMap, font_size_px};

/// Identifies one face at one size.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct FontKey {
    /// Family name as declared.
    pub family: String,
    /// Size in hundredths of a pixel, so the key can be hashed.
    size_centipx: u32,
    /// Weight.
    pub weight: FontWeight,
    /// Slant.
    pub slant: FontSlant,
}

impl FontKey {
    /// Create a key. Negative sizes clamp to zero.
    #[must_use]
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    pub fn new(family: &str, size: f32, weight: FontWeight, slant: FontSlant) -> Self {
        Self {
            family: family.to_string(),
            size_centipx: (size.max(0.0) * 100.0).round() as u32,
            weight,
            slant,
        }
    }

    /// Size in pixels.
    #[must_use]
    pub fn size(&self) -> f32 {
        self.size_centipx as f32 / 100.0
    }
}

/// Source of glyph measurements.
pub trait FontMetrics {
    /// Advance width of `text` set in `font`.
    fn text_width(&self, text: &str, font: &FontKey) -> f32;

    /// Distance from the baseline to the top of the tallest glyph.
    fn ascent(&self, font: &FontKey) -> f32;

    /// Distance from the baseline to the bottom of the deepest glyph.
    fn descent(&self, font: &FontKey) -> f32;

    /// Height of one line of text without leading.
    fn linespace(&self, font: &FontKey) -> f32 {
        self.ascent(font) + self.descent(font)
    }
}

/// Fixed-ratio metrics: every character advances 0.6 em, ascent is 0.8 em
/// and descent 0.2 em.
///
/// Deterministic, so layout tests can compute expected positions by hand.
#[derive(Debug, Clone, Copy, Default)]
pub struct ApproximateFontMetrics;

impl ApproximateFontMetrics {
    /// Average advance per character, in ems.
    pub const CHAR_WIDTH_RATIO: f32 = 0.6;
    /// Ascent in ems.
    pub const ASCENT_RATIO: f32 = 0.8;
    /// Descent in ems.
    pub const DESCENT_RATIO: f32 = 0.2;
}

impl FontMetrics for ApproximateFontMetrics {
    fn text_width(&self, text: &str, font: &FontKey) -> f32 {
        text.chars().count() as f32 * font.size() * Self::CHAR_WIDTH_RATIO
    }

    fn ascent(&self, font: &FontKey) -> f32 {
        font.size() * Self::ASCENT_RATIO
    }

    fn descent(&self, font: &FontKey) -> f32 {
        font.size() * Self::DESCENT_RATIO
    }
}

/// A measured font: the key plus the numbers layout needs on every word.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Font {
    /// What this font is.
    pub key: FontKey,
    /// Baseline to top.
    pub ascent: f32,
    /// Baseline to bottom.
    pub descent: f32,
    /// Advance of one space.
    pub space_width: f32,
}

impl Font {
    /// Size in pixels.
    #[must_use]
    pub fn size(&self) -> f32 {
        self.key.size()
    }

    /// Ascent plus descent.
    #[must_use]
    pub fn linespace(&self) -> f32 {
        self.ascent + self.descent
    }
}

/// Fonts measured so far, keyed by family, size, weight and slant.
///
/// One cache lives as long as the page that owns it.
pub struct FontCache {
    metrics: Box<dyn FontMetrics>,
    fonts: HashMap<FontKey, Font>,
}

impl fmt::Debug for FontCache {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FontCache")
            .field("fonts", &self.fonts.len())
            .finish_non_exhaustive()
    }
}

impl Default for FontCache {
    fn default() -> Self {
        Self::new(Box::new(ApproximateFontMetrics))
    }
}

impl FontCache {
    /// Create an empty cache measuring with `metrics`.
    #[must_use]
    pub fn new(metrics: Box<dyn FontMetrics>) -> Self {
        Self {
            metrics,
            fonts: HashMap::new(),
        }
    }

    /// The font for `key`, measuring it on first use.
    pub fn font(&mut self, key: &FontKey) -> Font {
        if let Some(font) = self.fonts.get(key) {
            return font.clone();
        }
        let font = Font {
            key: key.clone(),
            ascent: self.metrics.ascent(key),
            descent: self.metrics.descent(key),
            space_width: self.metrics.text_width(" ", key),
        };
        let _ = self.fonts.insert(key.clone(), font.clone());
        font
    }

    /// The font a style map asks for, with `size_delta` pixels added to the
    /// declared size.
    pub fn font_for_style(&mut self, style: &StyleMap, size_delta: f32) -> Font {
        let family = style.get("font-family").map_or("Times", String::as_str);
        let weight = style
            .get("font-weight")
            .map_or(FontWeight::Normal, |w| FontWeight::from_css(w));
        let slant = style
            .get("font-style")
            .map_or(FontSlant::Roman, |s| FontSlant::from_css(s));
        let key = FontKey::new(family, font_size_px(style) + size_delta, weight, slant);
        self.font(&key)
    }

    /// Advance width of `text` in `font`.
    #[must_use]
    pub fn measure(&self, text: &str, font: &Font) -> f32 {
        self.metrics.text_width(text, &font.key)
    }

    /// Number of distinct fonts measured.
    #[must_use]
    pub fn len(&self) -> usize {
        self.fonts.len()
    }

    /// Whether nothing has been measured yet.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fonts.is_empty()
    }

    /// Forget every measured font.
    pub fn clear(&mut self) {
        self.fonts.clear();
    }
}
