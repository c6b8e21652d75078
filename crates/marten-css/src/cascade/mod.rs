//! Style resolution and transitions.
//!
//! A style pass recomputes every node's [`StyleMap`] from scratch:
//!
//! 1. copy the inherited properties from the parent (or their root defaults)
//! 2. apply every matching rule, in the order given (callers pass rules sorted
//!    by ascending priority, so later rules win)
//! 3. apply the inline `style` attribute
//! 4. resolve a percentage `font-size` against the parent's pixel size
//! 5. compare against the previous pass and start transitions
//!
//! The previous pass's map is what step 5 compares against, so a value that
//! is mid-animation restarts from wherever it had got to.

use std::collections::{BTreeMap, HashMap, HashSet};

use thiserror::Error;

use marten_common::warning::warn_once;
use marten_dom::{DomTree, NodeId};

use crate::animation::Animation;
use crate::parser::{Rule, parse_declarations};
use crate::style::{
    DEFAULT_FONT_SIZE_PX, INHERITED_PROPERTIES, StyleMap, format_px, parse_percentage, parse_px,
    parse_transition,
};

/// Errors that abort a style pass.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StyleError {
    /// A length the resolver must compute with could not be parsed.
    #[error("invalid {property} '{value}' on node {node:?}")]
    InvalidLength {
        /// The node being styled.
        node: NodeId,
        /// The property holding the bad value.
        property: String,
        /// The raw value.
        value: String,
    },
}

/// Summary of one style pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StylePass {
    /// Transitions started during the pass. Non-zero means the caller should
    /// schedule another animation frame.
    pub animations_started: usize,
}

/// A style value changed by an animation tick.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnimationUpdate {
    /// The animated node.
    pub node: NodeId,
    /// The animated property.
    pub property: String,
    /// The value now in the node's style map.
    pub value: String,
}

/// Resolved styles and running animations for every node of one document.
#[derive(Debug, Clone, Default)]
pub struct StyleState {
    styles: HashMap<NodeId, StyleMap>,
    animations: HashMap<NodeId, BTreeMap<String, Animation>>,
}

impl StyleState {
    /// An empty state: no styles, no animations.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The resolved style of `node`, if it has been styled.
    #[must_use]
    pub fn style(&self, node: NodeId) -> Option<&StyleMap> {
        self.styles.get(&node)
    }

    /// One resolved property of `node`.
    #[must_use]
    pub fn get(&self, node: NodeId, property: &str) -> Option<&str> {
        self.styles
            .get(&node)
            .and_then(|style| style.get(property))
            .map(String::as_str)
    }

    /// Every resolved style.
    #[must_use]
    pub const fn styles(&self) -> &HashMap<NodeId, StyleMap> {
        &self.styles
    }

    /// The running animation of `property` on `node`.
    #[must_use]
    pub fn animation(&self, node: NodeId, property: &str) -> Option<&Animation> {
        self.animations.get(&node).and_then(|a| a.get(property))
    }

    /// Whether any animation is still running.
    #[must_use]
    pub fn has_animations(&self) -> bool {
        self.animations.values().any(|a| !a.is_empty())
    }

    /// Drop every style and animation.
    pub fn clear(&mut self) {
        self.styles.clear();
        self.animations.clear();
    }

    /// Recompute the style of every node reachable from the root.
    ///
    /// `rules` must already be in cascade order.
    ///
    /// # Errors
    ///
    /// Returns [`StyleError::InvalidLength`] if a `font-size` cannot be
    /// resolved to pixels. The state is left with whatever the pass computed
    /// before the failure.
    pub fn resolve(&mut self, tree: &DomTree, rules: &[Rule]) -> Result<StylePass, StyleError> {
        let previous = std::mem::take(&mut self.styles);
        let mut pass = StylePass::default();
        if tree.is_empty() {
            return Ok(pass);
        }
        // Detached nodes keep no animations.
        let reachable: HashSet<NodeId> = tree.descendants(tree.root()).into_iter().collect();
        self.animations.retain(|node, _| reachable.contains(node));

        self.resolve_node(tree, tree.root(), None, rules, &previous, &mut pass)?;
        Ok(pass)
    }

    fn resolve_node(
        &mut self,
        tree: &DomTree,
        node: NodeId,
        parent: Option<NodeId>,
        rules: &[Rule],
        previous: &HashMap<NodeId, StyleMap>,
        pass: &mut StylePass,
    ) -> Result<(), StyleError> {
        let parent_style = parent.and_then(|p| self.styles.get(&p));
        let mut style = StyleMap::new();
        for &(property, default) in INHERITED_PROPERTIES {
            let value = parent_style
                .and_then(|s| s.get(property))
                .map_or(default, String::as_str);
            let _ = style.insert(property.to_string(), value.to_string());
        }
        let parent_font_size = parent_style
            .and_then(|s| s.get("font-size"))
            .and_then(|v| parse_px(v))
            .unwrap_or(DEFAULT_FONT_SIZE_PX);

        if let Some(element) = tree.as_element(node) {
            for rule in rules {
                if rule.selector.matches(tree, node) {
                    style.extend(
                        rule.declarations
                            .iter()
                            .map(|(k, v)| (k.clone(), v.clone())),
                    );
                }
            }
            if let Some(inline) = element.attrs.get("style") {
                style.extend(parse_declarations(inline));
            }
        }

        resolve_font_size(node, &mut style, parent_font_size)?;

        if let Some(old_style) = previous.get(&node) {
            pass.animations_started += self.start_transitions(node, old_style, &mut style);
        }

        let _ = self.styles.insert(node, style);
        for &child in tree.children(node) {
            self.resolve_node(tree, child, Some(node), rules, previous, pass)?;
        }
        Ok(())
    }

    /// Start an animation for every property named in both the old and the
    /// new `transition` whose value changed. Each new animation is stepped
    /// once and its first value replaces the target value in `style`.
    fn start_transitions(&mut self, node: NodeId, old: &StyleMap, style: &mut StyleMap) -> usize {
        let old_transitions = parse_transition(old.get("transition").map(String::as_str));
        if old_transitions.is_empty() {
            return 0;
        }
        let new_transitions = parse_transition(style.get("transition").map(String::as_str));

        let mut started = 0;
        for (property, &frames) in &new_transitions {
            if !old_transitions.contains_key(property) {
                continue;
            }
            let (Some(old_value), Some(new_value)) = (old.get(property), style.get(property))
            else {
                continue;
            };
            if old_value == new_value {
                continue;
            }
            let Some(mut animation) =
                Animation::for_property(property, old_value, new_value, frames)
            else {
                warn_once(
                    "Style",
                    &format!("cannot animate {property} from '{old_value}' to '{new_value}'"),
                );
                continue;
            };
            let animations = self.animations.entry(node).or_default();
            match animation.step() {
                Some(first) => {
                    let _ = style.insert(property.clone(), first);
                    let _ = animations.insert(property.clone(), animation);
                    started += 1;
                }
                None => {
                    let _ = animations.remove(property);
                }
            }
        }
        started
    }

    /// Advance every running animation by one frame.
    ///
    /// Each changed value is written into its node's style map and reported.
    /// An animation that runs out writes its exact end value and is removed.
    pub fn tick_animations(&mut self) -> Vec<AnimationUpdate> {
        let mut updates = Vec::new();
        let mut nodes: Vec<NodeId> = self.animations.keys().copied().collect();
        nodes.sort_unstable();

        for node in nodes {
            let Some(animations) = self.animations.get_mut(&node) else {
                continue;
            };
            let mut finished = Vec::new();
            for (property, animation) in animations.iter_mut() {
                let value = animation.step().unwrap_or_else(|| {
                    finished.push(property.clone());
                    animation.end_value()
                });
                if let Some(style) = self.styles.get_mut(&node) {
                    let _ = style.insert(property.clone(), value.clone());
                }
                updates.push(AnimationUpdate {
                    node,
                    property: property.clone(),
                    value,
                });
            }
            for property in finished {
                let _ = animations.remove(&property);
            }
            if animations.is_empty() {
                let _ = self.animations.remove(&node);
            }
        }
        updates
    }

    /// Overwrite one property of an already styled node.
    ///
    /// Used by hosts that change presentation without a full style pass.
    pub fn set_property(&mut self, node: NodeId, property: &str, value: &str) {
        if let Some(style) = self.styles.get_mut(&node) {
            let _ = style.insert(property.to_string(), value.to_string());
        }
    }
}

fn resolve_font_size(
    node: NodeId,
    style: &mut StyleMap,
    parent_font_size: f32,
) -> Result<(), StyleError> {
    let Some(value) = style.get("font-size") else {
        return Ok(());
    };
    let invalid = || StyleError::InvalidLength {
        node,
        property: "font-size".to_string(),
        value: value.clone(),
    };
    if !value.trim_end().ends_with('%') {
        if parse_px(value).is_none() {
            return Err(invalid());
        }
        return Ok(());
    }
    let fraction = parse_percentage(value).ok_or_else(invalid)?;
    let resolved = format_px(parent_font_size * fraction);
    let _ = style.insert("font-size".to_string(), resolved);
    Ok(())
}
