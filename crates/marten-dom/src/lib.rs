//! Document node tree for the Marten renderer.
//!
//! # Design
//!
//! The tree uses arena allocation with [`NodeId`] indices for all relationships.
//! Children are owned by position in their parent's `children` list; the
//! `parent` link is a plain index, so there are no ownership cycles and no
//! node is ever shared between two parents.
//!
//! Only two kinds of node exist: elements and text. The root of every tree
//! produced by the markup parser is the `<html>` element, which is always the
//! first node allocated (see [`NodeId::ROOT`]).

use std::collections::HashMap;

/// Map of attribute names to values for an element.
pub type AttributesMap = HashMap<String, String>;

/// A type-safe index into the node tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub usize);

impl NodeId {
    /// The root element is always at index 0.
    pub const ROOT: Self = Self(0);
}

/// A single node: its payload plus its tree links.
#[derive(Debug, Clone)]
pub struct Node {
    /// Element or text payload.
    pub node_type: NodeType,

    /// The parent element, or `None` for the root and for detached nodes.
    pub parent: Option<NodeId>,

    /// Children in document order.
    pub children: Vec<NodeId>,
}

/// The payload of a node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeType {
    /// An element with a tag name and attributes.
    Element(ElementData),
    /// A run of character data.
    Text(String),
}

/// Element-specific data.
///
/// Tag names and attribute keys are stored lowercase by the parser.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ElementData {
    /// The element's tag name (e.g. `"p"`, `"div"`).
    pub tag_name: String,
    /// The element's attributes.
    pub attrs: AttributesMap,
}

impl ElementData {
    /// Create element data with no attributes.
    #[must_use]
    pub fn new(tag_name: &str) -> Self {
        Self {
            tag_name: tag_name.to_string(),
            attrs: AttributesMap::new(),
        }
    }

    /// Returns the element's id attribute value if present.
    #[must_use]
    pub fn id(&self) -> Option<&str> {
        self.attrs.get("id").map(String::as_str)
    }

    /// Returns the raw `class` attribute value if present.
    ///
    /// Class matching compares this whole string; it is not split into tokens.
    #[must_use]
    pub fn class(&self) -> Option<&str> {
        self.attrs.get("class").map(String::as_str)
    }

    /// Whether the attribute `key` is present with exactly `value`.
    #[must_use]
    pub fn has_attr_value(&self, key: &str, value: &str) -> bool {
        self.attrs.get(key).is_some_and(|v| v == value)
    }
}

/// Arena-based node tree with O(1) node access and parent traversal.
///
/// All nodes live in one vector and refer to each other by [`NodeId`].
/// Nodes are never freed: a detached subtree simply stops being reachable
/// from the root.
#[derive(Debug, Clone, Default)]
pub struct DomTree {
    nodes: Vec<Node>,
}

impl DomTree {
    /// Create an empty tree. The first node allocated becomes the root.
    #[must_use]
    pub const fn new() -> Self {
        Self { nodes: Vec::new() }
    }

    /// Get the root node ID.
    #[must_use]
    pub const fn root(&self) -> NodeId {
        NodeId::ROOT
    }

    /// Get a node by its ID.
    #[must_use]
    pub fn get(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id.0)
    }

    /// Get a mutable reference to a node by its ID.
    pub fn get_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        self.nodes.get_mut(id.0)
    }

    /// Get the number of nodes in the arena (attached or not).
    #[must_use]
    pub const fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Check if no node has been allocated yet.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Allocate a new node and return its ID.
    /// The node is not yet attached to the tree.
    pub fn alloc(&mut self, node_type: NodeType) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(Node {
            node_type,
            parent: None,
            children: Vec::new(),
        });
        id
    }

    /// Appends `child` as the last child of `parent` and points `child` at
    /// its new parent.
    pub fn append_child(&mut self, parent: NodeId, child: NodeId) {
        self.nodes[parent.0].children.push(child);
        self.nodes[child.0].parent = Some(parent);
    }

    /// Detach `child` from `parent`. Does nothing if `child` is not a child
    /// of `parent`.
    pub fn remove_child(&mut self, parent: NodeId, child: NodeId) {
        let children = &mut self.nodes[parent.0].children;
        if let Some(pos) = children.iter().position(|&c| c == child) {
            let _ = children.remove(pos);
            self.nodes[child.0].parent = None;
        }
    }

    /// Replace all children of `parent` with `new_children`.
    ///
    /// The old children are detached. Parent links are reassigned for the
    /// new children only; nothing below them is touched.
    pub fn replace_children(&mut self, parent: NodeId, new_children: &[NodeId]) {
        let old = std::mem::take(&mut self.nodes[parent.0].children);
        for id in old {
            self.nodes[id.0].parent = None;
        }
        for &child in new_children {
            if let Some(previous) = self.nodes[child.0].parent {
                self.remove_child(previous, child);
            }
            self.append_child(parent, child);
        }
    }

    /// Deep-copy the subtree rooted at `id` in `other` into this arena.
    ///
    /// Returns the ID of the copied subtree root, which is left detached.
    pub fn import_subtree(&mut self, other: &Self, id: NodeId) -> NodeId {
        let node_type = other.nodes[id.0].node_type.clone();
        let copy = self.alloc(node_type);
        for &child in other.children(id) {
            let child_copy = self.import_subtree(other, child);
            self.append_child(copy, child_copy);
        }
        copy
    }

    /// Get the parent of a node.
    #[must_use]
    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.get(id).and_then(|n| n.parent)
    }

    /// Get all children of a node.
    #[must_use]
    pub fn children(&self, id: NodeId) -> &[NodeId] {
        self.get(id).map_or(&[], |n| n.children.as_slice())
    }

    /// Iterate over all ancestors of a node, from parent to root.
    #[must_use]
    pub fn ancestors(&self, id: NodeId) -> AncestorIterator<'_> {
        AncestorIterator {
            tree: self,
            current: self.parent(id),
        }
    }

    /// Collect `from` and all of its descendants in document (pre-)order.
    #[must_use]
    pub fn descendants(&self, from: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack = vec![from];
        while let Some(id) = stack.pop() {
            if self.get(id).is_none() {
                continue;
            }
            out.push(id);
            stack.extend(self.children(id).iter().rev());
        }
        out
    }

    /// Get element data if this node is an element.
    #[must_use]
    pub fn as_element(&self, id: NodeId) -> Option<&ElementData> {
        self.get(id).and_then(|n| match &n.node_type {
            NodeType::Element(data) => Some(data),
            NodeType::Text(_) => None,
        })
    }

    /// Get mutable element data if this node is an element.
    pub fn as_element_mut(&mut self, id: NodeId) -> Option<&mut ElementData> {
        self.get_mut(id).and_then(|n| match &mut n.node_type {
            NodeType::Element(data) => Some(data),
            NodeType::Text(_) => None,
        })
    }

    /// Get text content if this node is a text node.
    #[must_use]
    pub fn as_text(&self, id: NodeId) -> Option<&str> {
        self.get(id).and_then(|n| match &n.node_type {
            NodeType::Text(s) => Some(s.as_str()),
            NodeType::Element(_) => None,
        })
    }

    /// The tag name of `id` if it is an element.
    #[must_use]
    pub fn tag_name(&self, id: NodeId) -> Option<&str> {
        self.as_element(id).map(|e| e.tag_name.as_str())
    }

    /// Whether `id` is an element with the given tag name.
    #[must_use]
    pub fn is_element_named(&self, id: NodeId, tag: &str) -> bool {
        self.tag_name(id) == Some(tag)
    }
}

/// Iterator over ancestors of a node.
pub struct AncestorIterator<'a> {
    tree: &'a DomTree,
    current: Option<NodeId>,
}

impl Iterator for AncestorIterator<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<Self::Item> {
        let id = self.current?;
        self.current = self.tree.parent(id);
        Some(id)
    }
}
