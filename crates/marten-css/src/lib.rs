//! Style sheets, style resolution, animation, layout and paint for the Marten
//! renderer.
//!
//! # Scope
//!
//! This crate implements:
//! - **Style Sheet Parser** ([`parser`])
//!   - Rules of `selector { property: value; ... }`
//!   - Inline `style` attribute bodies
//!   - Per-declaration and per-rule error recovery
//!
//! - **Selectors** ([`selector`])
//!   - Tag, class and descendant selectors
//!   - Priorities 1 (tag), 10 (class), sum of parts (descendant)
//!
//! - **Style Resolution** ([`cascade`])
//!   - Inherited properties, cascade in priority order, inline styles
//!   - Percentage font sizes
//!   - Transitions on `opacity` and `transform`
//!
//! - **Animation** ([`animation`])
//!
//! - **Layout** ([`layout`])
//!   - Document, block, line, text run and input boxes
//!   - Line breaking and soft-hyphen hyphenation
//!
//! - **Paint** ([`paint`])
//!   - Display list with transform, layer and clip effects
//!   - The [`Canvas`] raster seam
//!
//! # Not Yet Implemented
//!
//! - Id, attribute, child and sibling selectors
//! - Lengths other than `px` (and `%` for `font-size`)
//! - Transforms other than `translate`

pub mod animation;
pub mod cascade;
pub mod layout;
pub mod paint;
pub mod parser;
pub mod selector;
pub mod style;
pub mod ua_stylesheet;

// Re-exports for convenience
pub use animation::{ANIMATABLE_PROPERTIES, Animation, AnimationKind};
pub use cascade::{AnimationUpdate, StyleError, StylePass, StyleState};
pub use layout::{
    ApproximateFontMetrics, BoxDump, BoxId, BoxKind, Font, FontCache, FontKey, FontMetrics,
    LayoutBox, LayoutConfig, LayoutError, LayoutTree, Rect,
};
pub use paint::{Canvas, CmdId, DisplayItem, DisplayList, PaintCommand, Painter};
pub use parser::{
    CSSParser, PropertyMap, Rule, Stylesheet, parse_declarations, parse_selector,
    parse_stylesheet,
};
pub use selector::Selector;
pub use style::{
    BlendMode, ColorValue, DEFAULT_FONT_SIZE_PX, FontSlant, FontWeight, StyleMap, Translation,
};
pub use ua_stylesheet::ua_stylesheet;
