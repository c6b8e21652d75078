//! Font selection values.

use serde::Serialize;
use strum_macros::{Display, EnumString};

/// Resolved `font-weight`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Display, EnumString, Serialize)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum FontWeight {
    /// Regular weight.
    #[default]
    Normal,
    /// Bold weight.
    Bold,
}

impl FontWeight {
    /// `bold`, `bolder` and numeric weights of 600 and above are bold;
    /// everything else is normal.
    #[must_use]
    pub fn from_css(value: &str) -> Self {
        let value = value.trim();
        let heavy = matches!(value, "bold" | "bolder")
            || value.parse::<u16>().is_ok_and(|weight| weight >= 600);
        if heavy { Self::Bold } else { Self::Normal }
    }
}

/// Resolved `font-style`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Display, EnumString, Serialize)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum FontSlant {
    /// Upright glyphs.
    #[default]
    Roman,
    /// Slanted glyphs.
    Italic,
}

impl FontSlant {
    /// `italic` and `oblique` are italic; everything else is roman.
    #[must_use]
    pub fn from_css(value: &str) -> Self {
        match value.trim() {
            "italic" | "oblique" => Self::Italic,
            _ => Self::Roman,
        }
    }
}
