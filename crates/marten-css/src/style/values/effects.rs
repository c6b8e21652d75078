//! Visual effect values: opacity, blend modes and translations.

use std::fmt;
use std::str::FromStr;

use serde::Serialize;
use strum_macros::{Display, EnumString};

use marten_common::warning::warn_once;

use super::length::format_number;

/// `mix-blend-mode` keywords.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Display, EnumString, Serialize)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum BlendMode {
    /// Source over destination.
    #[default]
    Normal,
    /// Multiply channels.
    Multiply,
    /// Absolute difference of channels.
    Difference,
    /// Inverse multiply of inverses.
    Screen,
}

impl BlendMode {
    /// Resolve a `mix-blend-mode` value; unknown keywords fall back to
    /// `normal`.
    #[must_use]
    pub fn from_css(value: Option<&str>) -> Self {
        let Some(value) = value else {
            return Self::Normal;
        };
        Self::from_str(value.trim()).unwrap_or_else(|_| {
            warn_once("Paint", &format!("unsupported mix-blend-mode '{value}'"));
            Self::Normal
        })
    }
}

/// Resolve an `opacity` value, defaulting to fully opaque.
///
/// The result is clamped to `0.0..=1.0`.
#[must_use]
pub fn parse_opacity(value: Option<&str>) -> f32 {
    let Some(value) = value else {
        return 1.0;
    };
    match value.trim().parse::<f32>() {
        Ok(opacity) if opacity.is_finite() => opacity.clamp(0.0, 1.0),
        _ => {
            warn_once("Paint", &format!("unparseable opacity '{value}'"));
            1.0
        }
    }
}

/// A 2D translation from `transform: translate(Xpx, Ypx)`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct Translation {
    /// Horizontal offset in pixels.
    pub x: f32,
    /// Vertical offset in pixels.
    pub y: f32,
}

impl Translation {
    /// Create a translation.
    #[must_use]
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    /// Parse `translate(Xpx, Ypx)`. Any other transform yields `None`.
    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        let inner = value
            .trim()
            .strip_prefix("translate(")?
            .strip_suffix(')')?;
        let (x, y) = inner.split_once(',')?;
        let axis = |part: &str| -> Option<f32> {
            let number = part.trim().strip_suffix("px")?;
            number.trim().parse::<f32>().ok().filter(|n| n.is_finite())
        };
        Some(Self::new(axis(x)?, axis(y)?))
    }

    /// Resolve a `transform` value for painting.
    ///
    /// `none` and a missing value mean no translation. Unsupported transforms
    /// are reported once and ignored.
    #[must_use]
    pub fn from_css(value: Option<&str>) -> Option<Self> {
        let value = value?.trim();
        if value == "none" {
            return None;
        }
        let parsed = Self::parse(value);
        if parsed.is_none() {
            warn_once("Paint", &format!("unsupported transform '{value}'"));
        }
        parsed
    }
}

impl fmt::Display for Translation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "translate({}px, {}px)",
            format_number(self.x, 2),
            format_number(self.y, 2)
        )
    }
}
