//! Resolved style maps and the value types read out of them.
//!
//! Styles are kept as raw strings, exactly as declared, in a map per node.
//! Typed views (colors, lengths, blend modes, translations) are parsed from
//! those strings where they are consumed.

use std::collections::HashMap;

pub mod values;

pub use values::{
    BlendMode, ColorValue, DEFAULT_FONT_SIZE_PX, FontSlant, FontWeight, REFRESH_INTERVAL_SECS,
    Translation, format_number, format_px, frames_for, parse_duration, parse_opacity,
    parse_percentage, parse_px, parse_transition,
};

/// Per-node map from property name to resolved value.
pub type StyleMap = HashMap<String, String>;

/// Properties copied from the parent before the cascade runs, with the value
/// used at the root.
pub const INHERITED_PROPERTIES: &[(&str, &str)] = &[
    ("show-contents", "true"),
    ("in-pre-tag", "false"),
    ("in-bullet", "false"),
    ("font-family", "Times"),
    ("font-size", "16px"),
    ("font-style", "normal"),
    ("font-weight", "normal"),
    ("color", "black"),
];

/// Whether a boolean marker property (`show-contents`, `in-pre-tag`,
/// `in-bullet`) is set.
#[must_use]
pub fn flag(style: &StyleMap, property: &str) -> bool {
    style
        .get(property)
        .is_some_and(|value| value.eq_ignore_ascii_case("true"))
}

/// The resolved font size in pixels, or the default when unset.
#[must_use]
pub fn font_size_px(style: &StyleMap) -> f32 {
    style
        .get("font-size")
        .and_then(|value| parse_px(value))
        .unwrap_or(DEFAULT_FONT_SIZE_PX)
}
