//! Markup parser for the Marten renderer.
//!
//! # Scope
//!
//! This crate implements:
//! - **Markup Parser** - a single-pass character scanner with a stack of open
//!   elements, implicit `html`/`head`/`body` insertion, comment and raw
//!   `<script>` handling, and a handful of character references
//! - **Serializer** - writes a subtree back out as markup
//! - **Fragments** - parse a markup fragment and splice it into an existing
//!   tree (dynamic content updates)
//!
//! The parser never fails: malformed input is absorbed by implicit-tag
//! synthesis or dropped, and the caller always gets a tree rooted at `<html>`.
//!
//! # Not Yet Implemented
//!
//! - Quoted attribute values containing whitespace
//! - Named character references beyond `lt`, `gt`, `amp`, `quot` and `shy`
//! - End-tag name matching (an end tag always closes the innermost element)

/// Fragment parsing for dynamic content.
pub mod fragment;
/// Markup parser and tree construction.
pub mod parser;
/// Markup serialization.
pub mod serializer;

pub use fragment::set_inner_html;
pub use parser::{HTMLParser, ParseIssue, ScanState, parse, print_tree};
pub use serializer::serialize;
