//! Dynamic content updates.

use marten_dom::{DomTree, NodeId};

use crate::parser::parse;

/// Replace the children of `element` with the nodes parsed from `markup`.
///
/// The fragment is parsed as the body of a throwaway document, so implicit
/// tags behave exactly as they would for body content. Returns the IDs of
/// the new children in document order. Their old siblings are detached but
/// stay allocated.
pub fn set_inner_html(tree: &mut DomTree, element: NodeId, markup: &str) -> Vec<NodeId> {
    let fragment = parse(&format!("<html><body>{markup}</body></html>"));
    let body = fragment
        .children(fragment.root())
        .iter()
        .copied()
        .find(|&id| fragment.is_element_named(id, "body"));

    let new_children: Vec<NodeId> = body.map_or_else(Vec::new, |body| {
        fragment
            .children(body)
            .iter()
            .map(|&child| tree.import_subtree(&fragment, child))
            .collect()
    });
    tree.replace_children(element, &new_children);
    new_children
}
