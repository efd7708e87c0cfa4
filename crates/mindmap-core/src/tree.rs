//! Mind-map tree model.
//!
//! A document is an ordered forest: a list of root [`Node`]s, each exclusively owning its
//! ordered `children`. Node ids are unique across the whole forest; moving a node is always
//! detach-then-attach, so no subtree is ever shared.
//!
//! Two layers are provided:
//!
//! - free query functions over `&[Node]` ([`find_node`], [`find_parent`], [`sibling_list`],
//!   [`visible_nodes`], ...) used by the navigation engine and by hosts that keep their own
//!   storage;
//! - [`MindMap`], an owned forest with validated mutations (insert, remove, move, update),
//!   used by the in-memory [`EditorSession`](crate::session::EditorSession).
//!
//! # Example
//!
//! ```rust
//! use mindmap_core::{DropPosition, MindMap, Node};
//!
//! let mut map = MindMap::new(vec![
//!     Node::new("root", "Project")
//!         .with_child(Node::new("a", "Design"))
//!         .with_child(Node::new("b", "Build")),
//! ])
//! .unwrap();
//!
//! map.move_node("b", "a", DropPosition::Before).unwrap();
//! let order: Vec<&str> = map.roots()[0].children.iter().map(|n| n.id.as_str()).collect();
//! assert_eq!(order, vec!["b", "a"]);
//! ```

use serde::{Deserialize, Serialize, Serializer};
use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Markdown block kind a node was derived from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MarkdownKind {
    /// `#`-style heading.
    Heading,
    /// List item.
    List,
    /// Plain paragraph.
    Paragraph,
    /// Table block; not editable as plain text.
    Table,
    /// Fenced code block.
    Code,
    /// Block quote.
    Quote,
}

/// Markdown provenance of a node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MarkdownMeta {
    /// Block kind.
    #[serde(rename = "type")]
    pub kind: MarkdownKind,
    /// Heading level (0 when not a heading).
    #[serde(default)]
    pub level: u8,
    /// List indentation level.
    #[serde(default)]
    pub indent_level: u8,
}

/// A single mind-map node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Node {
    /// Unique, stable identifier.
    pub id: String,
    /// Display text.
    #[serde(default)]
    pub text: String,
    /// Layout x coordinate.
    #[serde(default)]
    pub x: f64,
    /// Layout y coordinate.
    #[serde(default)]
    pub y: f64,
    /// Ordered, exclusively owned children.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<Node>,
    /// Whether the children are hidden.
    #[serde(default)]
    pub collapsed: bool,
    /// Markdown provenance, if the node was synced from a markdown document.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub markdown_meta: Option<MarkdownMeta>,
    /// Free-form note attached to the node.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

impl Node {
    /// Create a leaf node at the origin.
    pub fn new(id: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            text: text.into(),
            x: 0.0,
            y: 0.0,
            children: Vec::new(),
            collapsed: false,
            markdown_meta: None,
            note: None,
        }
    }

    /// Set the layout position.
    pub fn at(mut self, x: f64, y: f64) -> Self {
        self.x = x;
        self.y = y;
        self
    }

    /// Append a child.
    pub fn with_child(mut self, child: Node) -> Self {
        self.children.push(child);
        self
    }

    /// Set the collapse flag.
    pub fn with_collapsed(mut self, collapsed: bool) -> Self {
        self.collapsed = collapsed;
        self
    }

    /// Attach markdown provenance.
    pub fn with_markdown(mut self, meta: MarkdownMeta) -> Self {
        self.markdown_meta = Some(meta);
        self
    }

    /// Returns `true` if the node has any children (visible or not).
    pub fn has_children(&self) -> bool {
        !self.children.is_empty()
    }

    /// Returns `false` for node kinds that cannot be edited as a single text line (tables).
    pub fn is_text_node(&self) -> bool {
        !matches!(
            self.markdown_meta,
            Some(MarkdownMeta {
                kind: MarkdownKind::Table,
                ..
            })
        )
    }

    /// Find a node by id within this subtree (including `self`).
    pub fn find(&self, id: &str) -> Option<&Node> {
        if self.id == id {
            return Some(self);
        }
        find_node(&self.children, id)
    }

    /// Returns `true` if `id` is this node or one of its descendants.
    pub fn contains(&self, id: &str) -> bool {
        self.find(id).is_some()
    }

    /// Number of nodes in this subtree, including `self`.
    pub fn subtree_len(&self) -> usize {
        1 + self.children.iter().map(Node::subtree_len).sum::<usize>()
    }
}

/// Partial update applied through [`EditorHandlers::update_node`](crate::EditorHandlers::update_node).
///
/// `None` fields are left untouched. `note` and `markdown_meta` use a nested `Option` so an
/// update can clear them.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NodeUpdate {
    /// New text.
    pub text: Option<String>,
    /// New x coordinate.
    pub x: Option<f64>,
    /// New y coordinate.
    pub y: Option<f64>,
    /// New collapse flag.
    pub collapsed: Option<bool>,
    /// New note (`Some(None)` clears it).
    pub note: Option<Option<String>>,
    /// New markdown provenance (`Some(None)` clears it).
    pub markdown_meta: Option<Option<MarkdownMeta>>,
}

impl NodeUpdate {
    /// Update only the text.
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: Some(text.into()),
            ..Self::default()
        }
    }

    /// Update only the collapse flag.
    pub fn collapsed(collapsed: bool) -> Self {
        Self {
            collapsed: Some(collapsed),
            ..Self::default()
        }
    }

    /// Update only the position.
    pub fn position(x: f64, y: f64) -> Self {
        Self {
            x: Some(x),
            y: Some(y),
            ..Self::default()
        }
    }

    /// Set or clear the note.
    pub fn note(note: Option<String>) -> Self {
        Self {
            note: Some(note),
            ..Self::default()
        }
    }

    /// Returns `true` if the update changes nothing.
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Apply the update to `node`.
    pub fn apply_to(&self, node: &mut Node) {
        if let Some(text) = &self.text {
            node.text = text.clone();
        }
        if let Some(x) = self.x {
            node.x = x;
        }
        if let Some(y) = self.y {
            node.y = y;
        }
        if let Some(collapsed) = self.collapsed {
            node.collapsed = collapsed;
        }
        if let Some(note) = &self.note {
            node.note = note.clone();
        }
        if let Some(meta) = self.markdown_meta {
            node.markdown_meta = meta;
        }
    }
}

/// Where a moved or inserted node lands relative to its target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DropPosition {
    /// Directly before the target, as its sibling.
    Before,
    /// Directly after the target, as its sibling.
    After,
    /// As the target's last child.
    Child,
}

impl DropPosition {
    /// Wire name (`before`, `after`, `child`).
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Before => "before",
            Self::After => "after",
            Self::Child => "child",
        }
    }
}

impl fmt::Display for DropPosition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DropPosition {
    type Err = TreeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "before" => Ok(Self::Before),
            "after" => Ok(Self::After),
            "child" => Ok(Self::Child),
            other => Err(TreeError::InvalidDropPosition(other.to_string())),
        }
    }
}

/// Tree mutation errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TreeError {
    /// No node with the given id exists.
    #[error("node '{0}' not found")]
    NodeNotFound(String),
    /// A node id would appear twice in the forest.
    #[error("node id '{0}' already exists")]
    DuplicateId(String),
    /// A node cannot be moved relative to itself or one of its descendants.
    #[error("cannot move node '{node}' relative to '{target}' inside its own subtree")]
    MoveIntoSubtree {
        /// Node being moved.
        node: String,
        /// Requested target.
        target: String,
    },
    /// Unrecognized drop position name.
    #[error("invalid drop position '{0}' (expected before, after or child)")]
    InvalidDropPosition(String),
}

/// Find a node by id anywhere in the forest.
pub fn find_node<'a>(roots: &'a [Node], id: &str) -> Option<&'a Node> {
    iter_nodes(roots).find(|node| node.id == id)
}

/// Find the node whose `children` contain `id`. Returns `None` for roots and unknown ids.
pub fn find_parent<'a>(roots: &'a [Node], id: &str) -> Option<&'a Node> {
    iter_nodes(roots).find(|node| node.children.iter().any(|child| child.id == id))
}

/// The sibling list containing `id` (the roots for a root) and the node's index in it.
pub fn sibling_list<'a>(roots: &'a [Node], id: &str) -> Option<(&'a [Node], usize)> {
    if let Some(index) = roots.iter().position(|node| node.id == id) {
        return Some((roots, index));
    }
    let parent = find_parent(roots, id)?;
    let index = parent.children.iter().position(|node| node.id == id)?;
    Some((&parent.children, index))
}

/// Index of the document-level root whose subtree contains `id`.
pub fn root_index(roots: &[Node], id: &str) -> Option<usize> {
    roots.iter().position(|root| root.contains(id))
}

/// All nodes not hidden beneath a collapsed ancestor, in depth-first order.
pub fn visible_nodes(roots: &[Node]) -> Vec<&Node> {
    let mut out = Vec::new();
    let mut stack: Vec<&Node> = roots.iter().rev().collect();
    while let Some(node) = stack.pop() {
        out.push(node);
        if !node.collapsed {
            stack.extend(node.children.iter().rev());
        }
    }
    out
}

/// Depth-first, pre-order iterator over every node in the forest.
pub fn iter_nodes(roots: &[Node]) -> NodeIter<'_> {
    NodeIter {
        stack: roots.iter().rev().collect(),
    }
}

/// Iterator returned by [`iter_nodes`].
#[derive(Debug, Clone)]
pub struct NodeIter<'a> {
    stack: Vec<&'a Node>,
}

impl<'a> Iterator for NodeIter<'a> {
    type Item = &'a Node;

    fn next(&mut self) -> Option<Self::Item> {
        let node = self.stack.pop()?;
        self.stack.extend(node.children.iter().rev());
        Some(node)
    }
}

/// An owned mind-map document.
///
/// Serializes as a plain JSON array of root nodes. Deserializing goes through
/// [`MindMap::new`], so documents with duplicate ids are rejected.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(try_from = "Vec<Node>")]
pub struct MindMap {
    roots: Vec<Node>,
}

impl Serialize for MindMap {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.roots.serialize(serializer)
    }
}

impl TryFrom<Vec<Node>> for MindMap {
    type Error = TreeError;

    fn try_from(roots: Vec<Node>) -> Result<Self, Self::Error> {
        Self::new(roots)
    }
}

impl MindMap {
    /// Build a document, rejecting duplicate ids.
    pub fn new(roots: Vec<Node>) -> Result<Self, TreeError> {
        let mut seen = HashSet::new();
        for node in iter_nodes(&roots) {
            if !seen.insert(node.id.as_str()) {
                return Err(TreeError::DuplicateId(node.id.clone()));
            }
        }
        Ok(Self { roots })
    }

    /// An empty document.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Document-level roots.
    pub fn roots(&self) -> &[Node] {
        &self.roots
    }

    /// Replace the whole forest (used to restore snapshots).
    pub fn replace_roots(&mut self, roots: Vec<Node>) {
        self.roots = roots;
    }

    /// Total number of nodes.
    pub fn len(&self) -> usize {
        self.roots.iter().map(Node::subtree_len).sum()
    }

    /// Returns `true` if the document has no nodes.
    pub fn is_empty(&self) -> bool {
        self.roots.is_empty()
    }

    /// Find a node by id.
    pub fn find(&self, id: &str) -> Option<&Node> {
        find_node(&self.roots, id)
    }

    /// Find a node by id for mutation.
    pub fn find_mut(&mut self, id: &str) -> Option<&mut Node> {
        find_node_mut(&mut self.roots, id)
    }

    /// Returns `true` if a node with `id` exists.
    pub fn contains(&self, id: &str) -> bool {
        self.find(id).is_some()
    }

    /// Parent of `id`, or `None` for roots and unknown ids.
    pub fn parent_of(&self, id: &str) -> Option<&Node> {
        find_parent(&self.roots, id)
    }

    /// Append a new document-level root.
    pub fn push_root(&mut self, node: Node) -> Result<(), TreeError> {
        self.check_fresh_ids(&node)?;
        self.roots.push(node);
        Ok(())
    }

    /// Insert `node` relative to `target`.
    pub fn insert(
        &mut self,
        node: Node,
        target: &str,
        position: DropPosition,
    ) -> Result<(), TreeError> {
        if !self.contains(target) {
            return Err(TreeError::NodeNotFound(target.to_string()));
        }
        self.check_fresh_ids(&node)?;
        match attach(&mut self.roots, target, node, position) {
            None => Ok(()),
            Some(_) => Err(TreeError::NodeNotFound(target.to_string())),
        }
    }

    /// Detach and return the subtree rooted at `id`.
    pub fn remove(&mut self, id: &str) -> Option<Node> {
        detach(&mut self.roots, id)
    }

    /// Move the subtree rooted at `id` relative to `target`.
    ///
    /// Fails without touching the document if either node is missing or `target` lies inside
    /// the moved subtree.
    pub fn move_node(
        &mut self,
        id: &str,
        target: &str,
        position: DropPosition,
    ) -> Result<(), TreeError> {
        let node = self
            .find(id)
            .ok_or_else(|| TreeError::NodeNotFound(id.to_string()))?;
        if !self.contains(target) {
            return Err(TreeError::NodeNotFound(target.to_string()));
        }
        if node.contains(target) {
            return Err(TreeError::MoveIntoSubtree {
                node: id.to_string(),
                target: target.to_string(),
            });
        }

        let node = detach(&mut self.roots, id).ok_or_else(|| TreeError::NodeNotFound(id.to_string()))?;
        match attach(&mut self.roots, target, node, position) {
            None => Ok(()),
            // Unreachable after the checks above; keep the subtree rather than drop it.
            Some(node) => {
                self.roots.push(node);
                Err(TreeError::NodeNotFound(target.to_string()))
            }
        }
    }

    /// Apply a partial update to `id`.
    pub fn update(&mut self, id: &str, update: &NodeUpdate) -> Result<(), TreeError> {
        let node = self
            .find_mut(id)
            .ok_or_else(|| TreeError::NodeNotFound(id.to_string()))?;
        update.apply_to(node);
        Ok(())
    }

    fn check_fresh_ids(&self, node: &Node) -> Result<(), TreeError> {
        let mut seen = HashSet::new();
        for candidate in iter_nodes(std::slice::from_ref(node)) {
            if self.contains(&candidate.id) || !seen.insert(candidate.id.as_str()) {
                return Err(TreeError::DuplicateId(candidate.id.clone()));
            }
        }
        Ok(())
    }
}

fn find_node_mut<'a>(nodes: &'a mut [Node], id: &str) -> Option<&'a mut Node> {
    for node in nodes.iter_mut() {
        if node.id == id {
            return Some(node);
        }
        if let Some(found) = find_node_mut(&mut node.children, id) {
            return Some(found);
        }
    }
    None
}

fn detach(nodes: &mut Vec<Node>, id: &str) -> Option<Node> {
    if let Some(index) = nodes.iter().position(|node| node.id == id) {
        return Some(nodes.remove(index));
    }
    nodes
        .iter_mut()
        .find_map(|node| detach(&mut node.children, id))
}

/// Attach `node` relative to `target`; hands the node back if `target` is not in `nodes`.
fn attach(nodes: &mut Vec<Node>, target: &str, node: Node, position: DropPosition) -> Option<Node> {
    if let Some(index) = nodes.iter().position(|candidate| candidate.id == target) {
        match position {
            DropPosition::Before => nodes.insert(index, node),
            DropPosition::After => nodes.insert(index + 1, node),
            DropPosition::Child => nodes[index].children.push(node),
        }
        return None;
    }

    let mut node = node;
    for candidate in nodes.iter_mut() {
        match attach(&mut candidate.children, target, node, position) {
            None => return None,
            Some(returned) => node = returned,
        }
    }
    Some(node)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> MindMap {
        MindMap::new(vec![
            Node::new("root", "Root")
                .with_child(
                    Node::new("a", "A")
                        .with_child(Node::new("a1", "A1"))
                        .with_child(Node::new("a2", "A2")),
                )
                .with_child(Node::new("b", "B")),
            Node::new("other", "Other"),
        ])
        .unwrap()
    }

    #[test]
    fn test_queries() {
        let map = sample();
        assert_eq!(map.len(), 6);
        assert_eq!(map.parent_of("a1").map(|n| n.id.as_str()), Some("a"));
        assert!(map.parent_of("root").is_none());
        let (siblings, index) = sibling_list(map.roots(), "a2").unwrap();
        assert_eq!(siblings.len(), 2);
        assert_eq!(index, 1);
        assert_eq!(root_index(map.roots(), "a2"), Some(0));
        assert_eq!(root_index(map.roots(), "other"), Some(1));
    }

    #[test]
    fn test_duplicate_ids_rejected() {
        let err = MindMap::new(vec![Node::new("x", "1"), Node::new("x", "2")]).unwrap_err();
        assert_eq!(err, TreeError::DuplicateId("x".to_string()));

        let mut map = sample();
        let err = map
            .insert(Node::new("a1", "dup"), "b", DropPosition::Child)
            .unwrap_err();
        assert_eq!(err, TreeError::DuplicateId("a1".to_string()));
    }

    #[test]
    fn test_visible_nodes_skip_collapsed_subtrees() {
        let mut map = sample();
        map.update("a", &NodeUpdate::collapsed(true)).unwrap();
        let ids: Vec<&str> = visible_nodes(map.roots())
            .into_iter()
            .map(|n| n.id.as_str())
            .collect();
        assert_eq!(ids, vec!["root", "a", "b", "other"]);
    }

    #[test]
    fn test_move_before_after_child() {
        let mut map = sample();
        map.move_node("a2", "b", DropPosition::After).unwrap();
        let ids: Vec<&str> = map.roots()[0].children.iter().map(|n| n.id.as_str()).collect();
        assert_eq!(ids, vec!["a", "b", "a2"]);

        map.move_node("other", "a", DropPosition::Child).unwrap();
        assert_eq!(map.roots().len(), 1);
        assert_eq!(map.parent_of("other").map(|n| n.id.as_str()), Some("a"));
    }

    #[test]
    fn test_move_into_own_subtree_is_rejected_without_change() {
        let mut map = sample();
        let before = map.clone();
        let err = map.move_node("a", "a1", DropPosition::Child).unwrap_err();
        assert!(matches!(err, TreeError::MoveIntoSubtree { .. }));
        assert_eq!(map, before);
    }

    #[test]
    fn test_remove_returns_subtree() {
        let mut map = sample();
        let removed = map.remove("a").unwrap();
        assert_eq!(removed.subtree_len(), 3);
        assert!(!map.contains("a1"));
        assert!(map.remove("missing").is_none());
    }

    #[test]
    fn test_drop_position_parse() {
        assert_eq!("Child".parse::<DropPosition>().unwrap(), DropPosition::Child);
        assert!("inside".parse::<DropPosition>().is_err());
    }
}
