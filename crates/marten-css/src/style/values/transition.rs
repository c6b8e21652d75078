//! `transition` declarations.

use std::collections::HashMap;

use marten_common::warning::warn_once;

/// Length of one animation frame in seconds.
pub const REFRESH_INTERVAL_SECS: f32 = 0.016;

/// Parse a duration such as `2s` or `300ms` into seconds.
#[must_use]
pub fn parse_duration(value: &str) -> Option<f32> {
    let value = value.trim();
    let (number, scale) = if let Some(ms) = value.strip_suffix("ms") {
        (ms, 0.001)
    } else {
        (value.strip_suffix('s')?, 1.0)
    };
    number
        .trim()
        .parse::<f32>()
        .ok()
        .filter(|n| n.is_finite() && *n >= 0.0)
        .map(|n| n * scale)
}

/// Number of frames an animation of `seconds` lasts: at least one.
#[must_use]
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn frames_for(seconds: f32) -> u32 {
    ((seconds / REFRESH_INTERVAL_SECS).round() as u32).max(1)
}

/// Parse `property duration, property duration, ...` into a map from
/// property name to frame count.
///
/// Entries that do not have this shape are skipped.
#[must_use]
pub fn parse_transition(value: Option<&str>) -> HashMap<String, u32> {
    let mut properties = HashMap::new();
    let Some(value) = value else {
        return properties;
    };
    for item in value.split(',') {
        let mut parts = item.split_whitespace();
        let (Some(property), Some(duration)) = (parts.next(), parts.next()) else {
            continue;
        };
        match parse_duration(duration) {
            Some(seconds) if seconds > 0.0 => {
                let _ = properties.insert(property.to_ascii_lowercase(), frames_for(seconds));
            }
            Some(_) => {}
            None => warn_once("Style", &format!("bad transition duration '{duration}'")),
        }
    }
    properties
}
