//! Typed views of raw property values.

mod color;
mod effects;
mod font;
mod length;
mod transition;

pub use color::ColorValue;
pub use effects::{BlendMode, Translation, parse_opacity};
pub use font::{FontSlant, FontWeight};
pub use length::{
    DEFAULT_FONT_SIZE_PX, format_number, format_px, parse_percentage, parse_px,
};
pub use transition::{REFRESH_INTERVAL_SECS, frames_for, parse_duration, parse_transition};
