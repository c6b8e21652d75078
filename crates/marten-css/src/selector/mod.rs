//! Selector matching.
//!
//! Three selector kinds are supported, each with a fixed cascade priority:
//!
//! | selector          | example   | priority            |
//! |-------------------|-----------|---------------------|
//! | tag               | `p`       | 1                   |
//! | class             | `.title`  | 10                  |
//! | descendant chain  | `div p`   | sum of its parts    |
//!
//! There are no id, attribute, pseudo-class or combinator selectors beyond
//! descendant.

use std::fmt;

use marten_dom::{DomTree, NodeId};

/// A parsed selector.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Selector {
    /// Matches elements with this tag name (stored lowercased).
    Tag(String),
    /// Matches elements whose `class` attribute is exactly this string.
    Class(String),
    /// The last selector matches the node itself; every earlier selector must
    /// match some ancestor, in order, walking towards the root.
    Descendant(Vec<Selector>),
}

impl Selector {
    /// Build a selector from a single selector word.
    ///
    /// A word starting with `.` is a class selector; anything else is a tag.
    #[must_use]
    pub fn from_word(word: &str) -> Self {
        word.strip_prefix('.').map_or_else(
            || Self::Tag(word.to_ascii_lowercase()),
            |class| Self::Class(class.to_string()),
        )
    }

    /// Cascade priority. Rules are applied in ascending priority order.
    #[must_use]
    pub fn priority(&self) -> u32 {
        match self {
            Self::Tag(_) => 1,
            Self::Class(_) => 10,
            Self::Descendant(chain) => chain.iter().map(Self::priority).sum(),
        }
    }

    /// Whether `node` satisfies this selector. Text nodes never match.
    #[must_use]
    pub fn matches(&self, tree: &DomTree, node: NodeId) -> bool {
        match self {
            Self::Tag(tag) => tree.tag_name(node) == Some(tag.as_str()),
            Self::Class(class) => tree
                .as_element(node)
                .and_then(|e| e.class())
                .is_some_and(|c| c == class),
            Self::Descendant(chain) => {
                let Some((last, ancestors)) = chain.split_last() else {
                    return false;
                };
                if !last.matches(tree, node) {
                    return false;
                }
                let mut pending = ancestors.iter().rev().peekable();
                for ancestor in tree.ancestors(node) {
                    let Some(selector) = pending.peek() else {
                        break;
                    };
                    if selector.matches(tree, ancestor) {
                        let _ = pending.next();
                    }
                }
                pending.peek().is_none()
            }
        }
    }

    /// Every element in the tree, in document order, matching this selector.
    #[must_use]
    pub fn select_all(&self, tree: &DomTree) -> Vec<NodeId> {
        if tree.is_empty() {
            return Vec::new();
        }
        tree.descendants(tree.root())
            .into_iter()
            .filter(|&id| self.matches(tree, id))
            .collect()
    }
}

impl fmt::Display for Selector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Tag(tag) => write!(f, "{tag}"),
            Self::Class(class) => write!(f, ".{class}"),
            Self::Descendant(chain) => {
                for (i, part) in chain.iter().enumerate() {
                    if i > 0 {
                        f.write_str(" ")?;
                    }
                    write!(f, "{part}")?;
                }
                Ok(())
            }
        }
    }
}
