//! Markup parser module for tree construction.

/// Markup parser implementation.
pub mod core;

pub use self::core::{HTMLParser, ParseIssue, ScanState, parse, print_tree};
