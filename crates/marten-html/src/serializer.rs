//! Writes a subtree back out as markup.
//!
//! Output re-parses to an equivalent tree for anything the parser itself
//! produces, apart from adjacent text nodes which merge on the way back in.

use marten_dom::{DomTree, NodeId, NodeType};

use crate::parser::core::SELF_CLOSING_TAGS;

/// Serialize the subtree rooted at `id`.
///
/// Attributes are written in sorted key order. Text is escaped so that the
/// parser's character references bring it back, except inside `<script>`
/// where it is written verbatim.
#[must_use]
pub fn serialize(tree: &DomTree, id: NodeId) -> String {
    let mut out = String::new();
    write_node(tree, id, &mut out);
    out
}

fn write_node(tree: &DomTree, id: NodeId, out: &mut String) {
    let Some(node) = tree.get(id) else {
        return;
    };
    match &node.node_type {
        NodeType::Text(text) => {
            let raw = node
                .parent
                .is_some_and(|parent| tree.is_element_named(parent, "script"));
            if raw {
                out.push_str(text);
            } else {
                escape_text(text, out);
            }
        }
        NodeType::Element(data) => {
            out.push('<');
            out.push_str(&data.tag_name);
            let mut keys: Vec<&String> = data.attrs.keys().collect();
            keys.sort();
            for key in keys {
                out.push(' ');
                out.push_str(key);
                let value = &data.attrs[key];
                if !value.is_empty() {
                    out.push_str("=\"");
                    out.push_str(value);
                    out.push('"');
                }
            }
            out.push('>');
            if SELF_CLOSING_TAGS.contains(&data.tag_name.as_str()) {
                return;
            }
            for &child in &node.children {
                write_node(tree, child, out);
            }
            out.push_str("</");
            out.push_str(&data.tag_name);
            out.push('>');
        }
    }
}

fn escape_text(text: &str, out: &mut String) {
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\u{00AD}' => out.push_str("&shy;"),
            _ => out.push(c),
        }
    }
}
