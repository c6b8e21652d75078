//! Style sheet parser module.

/// Recursive-descent style sheet parser with local error recovery.
pub mod css_parser;

pub use css_parser::{
    CSSParser, CssParseError, PropertyMap, Rule, Stylesheet, parse_declarations, parse_selector,
    parse_stylesheet,
};
