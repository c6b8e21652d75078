//! Layout engine.
//!
//! # Module Structure
//!
//! - [`box_model`] - rectangles
//! - [`font`] - font keys, metrics and the font cache
//! - [`layout_box`] - the box tree and the block/inline layout algorithms

pub mod box_model;
pub mod font;
pub mod layout_box;

pub use box_model::Rect;
pub use font::{ApproximateFontMetrics, Font, FontCache, FontKey, FontMetrics};
pub use layout_box::{
    BULLET_INDENT, BoxDump, BoxId, BoxKind, LEADING, LayoutBox, LayoutConfig, LayoutError,
    LayoutTree, TOC_HEADING,
};
