//! Lengths and number formatting.

/// Font size used when nothing else applies, in pixels.
pub const DEFAULT_FONT_SIZE_PX: f32 = 16.0;

/// Parse a pixel length such as `12px` or `0`.
///
/// Only the `px` unit is understood; `auto`, percentages and other units
/// yield `None`.
#[must_use]
pub fn parse_px(value: &str) -> Option<f32> {
    let value = value.trim();
    let number = value.strip_suffix("px").unwrap_or(value);
    if number.len() == value.len() && number != "0" {
        return None;
    }
    number.trim().parse::<f32>().ok().filter(|n| n.is_finite())
}

/// Parse a percentage such as `150%` into a fraction (`1.5`).
#[must_use]
pub fn parse_percentage(value: &str) -> Option<f32> {
    let number = value.trim().strip_suffix('%')?;
    number
        .trim()
        .parse::<f32>()
        .ok()
        .filter(|n| n.is_finite())
        .map(|n| n / 100.0)
}

/// Format a number with at most `max_decimals` digits after the point and
/// no trailing zeros.
#[must_use]
pub fn format_number(value: f32, max_decimals: usize) -> String {
    let text = format!("{value:.max_decimals$}");
    let text = if text.contains('.') {
        text.trim_end_matches('0').trim_end_matches('.').to_string()
    } else {
        text
    };
    if text == "-0" { "0".to_string() } else { text }
}

/// Format a pixel length, e.g. `24px` or `10.5px`.
#[must_use]
pub fn format_px(value: f32) -> String {
    format!("{}px", format_number(value, 2))
}
