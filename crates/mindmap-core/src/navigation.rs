//! Tree navigation engine.
//!
//! Pure functions that compute the next node to select for a direction and a repeat count.
//!
//! - **left**: the parent; repeated `count` times, stopping at a root.
//! - **right**: the child vertically closest to the current node (first child on ties). A
//!   collapsed node with children still yields a child; the node is listed in
//!   [`NavigationOutcome::expand`] so the caller can make the target visible.
//! - **up / down**: the sibling `count` positions away, clamped to the sibling list. At a
//!   boundary, the previous / next document-level root.
//! - **spatial fallback**: if no structural target exists, the nearest visible node lying in
//!   the requested direction by more than [`SPATIAL_MIN_DISTANCE`], scored as
//!   `primary distance + SPATIAL_CROSS_AXIS_WEIGHT * cross distance`.
//!
//! Navigation never fails: `None` means "no motion".

use crate::tree::{Node, find_node, find_parent, root_index, sibling_list, visible_nodes};
use std::fmt;

/// Minimum offset along the primary axis for a spatial candidate, in layout units.
pub const SPATIAL_MIN_DISTANCE: f64 = 20.0;

/// Weight applied to the cross-axis distance when scoring spatial candidates.
pub const SPATIAL_CROSS_AXIS_WEIGHT: f64 = 0.5;

/// A navigation direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    /// Towards the parent.
    Left,
    /// Towards the children.
    Right,
    /// Previous sibling.
    Up,
    /// Next sibling.
    Down,
}

impl Direction {
    /// Lowercase name, also the name of the matching built-in command.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Left => "left",
            Self::Right => "right",
            Self::Up => "up",
            Self::Down => "down",
        }
    }

    /// Relative phrase used in status messages ("above", "to the left of", ...).
    pub fn relation(self) -> &'static str {
        match self {
            Self::Left => "to the left of",
            Self::Right => "to the right of",
            Self::Up => "above",
            Self::Down => "below",
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Tuning for the spatial fallback.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpatialConfig {
    /// Minimum primary-axis offset for a candidate.
    pub min_distance: f64,
    /// Cross-axis weight in the score.
    pub cross_axis_weight: f64,
}

impl Default for SpatialConfig {
    fn default() -> Self {
        Self {
            min_distance: SPATIAL_MIN_DISTANCE,
            cross_axis_weight: SPATIAL_CROSS_AXIS_WEIGHT,
        }
    }
}

/// Where a motion lands.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NavigationOutcome {
    /// Node to select.
    pub target: String,
    /// Collapsed nodes that must be expanded, in order, for `target` to be visible.
    pub expand: Vec<String>,
}

impl NavigationOutcome {
    fn to(target: &Node) -> Self {
        Self {
            target: target.id.clone(),
            expand: Vec::new(),
        }
    }
}

/// Compute the motion from `current` in `direction`, repeated `count` times (0 counts as 1).
///
/// # Example
///
/// ```rust
/// use mindmap_core::{Direction, Node, navigate};
///
/// let roots = vec![
///     Node::new("root", "Root")
///         .at(0.0, 50.0)
///         .with_child(Node::new("a", "A").at(200.0, 0.0))
///         .with_child(Node::new("b", "B").at(200.0, 50.0))
///         .with_child(Node::new("c", "C").at(200.0, 100.0)),
/// ];
///
/// assert_eq!(navigate(&roots, "root", Direction::Right, 1).unwrap().target, "b");
/// assert_eq!(navigate(&roots, "a", Direction::Down, 5).unwrap().target, "c");
/// assert_eq!(navigate(&roots, "c", Direction::Left, 1).unwrap().target, "root");
/// ```
pub fn navigate(
    roots: &[Node],
    current: &str,
    direction: Direction,
    count: usize,
) -> Option<NavigationOutcome> {
    navigate_with(roots, current, direction, count, &SpatialConfig::default())
}

/// [`navigate`] with explicit spatial tuning.
pub fn navigate_with(
    roots: &[Node],
    current: &str,
    direction: Direction,
    count: usize,
    config: &SpatialConfig,
) -> Option<NavigationOutcome> {
    let node = find_node(roots, current)?;
    let count = count.max(1);

    let structural = match direction {
        Direction::Left => parent_motion(roots, node, count),
        Direction::Right => child_motion(node, count),
        Direction::Up | Direction::Down => vertical_motion(roots, node, direction, count),
    };

    structural.or_else(|| {
        spatial_candidate(roots, node, direction, config).map(NavigationOutcome::to)
    })
}

fn parent_motion(roots: &[Node], node: &Node, count: usize) -> Option<NavigationOutcome> {
    let mut target = find_parent(roots, &node.id)?;
    for _ in 1..count {
        match find_parent(roots, &target.id) {
            Some(parent) => target = parent,
            None => break,
        }
    }
    Some(NavigationOutcome::to(target))
}

fn child_motion(node: &Node, count: usize) -> Option<NavigationOutcome> {
    let mut expand = Vec::new();
    let mut current = node;
    for step in 0..count {
        let Some(child) = closest_child(current) else {
            if step == 0 {
                return None;
            }
            break;
        };
        if current.collapsed {
            expand.push(current.id.clone());
        }
        current = child;
    }
    Some(NavigationOutcome {
        target: current.id.clone(),
        expand,
    })
}

/// The child with the smallest vertical distance to `node`; the first one on ties.
pub fn closest_child(node: &Node) -> Option<&Node> {
    let mut best: Option<(&Node, f64)> = None;
    for child in &node.children {
        let distance = (child.y - node.y).abs();
        match best {
            Some((_, best_distance)) if distance >= best_distance => {}
            _ => best = Some((child, distance)),
        }
    }
    best.map(|(child, _)| child)
}

fn vertical_motion(
    roots: &[Node],
    node: &Node,
    direction: Direction,
    count: usize,
) -> Option<NavigationOutcome> {
    let (siblings, index) = sibling_list(roots, &node.id)?;
    let last = siblings.len() - 1;
    let target = match direction {
        Direction::Down => index + count.min(last - index),
        _ => index - count.min(index),
    };
    if target != index {
        return Some(NavigationOutcome::to(&siblings[target]));
    }

    // At a boundary: step to the neighbouring document-level root.
    let root = root_index(roots, &node.id)?;
    let neighbour = match direction {
        Direction::Down => roots.get(root + 1),
        _ => root.checked_sub(1).and_then(|i| roots.get(i)),
    }?;
    Some(NavigationOutcome::to(neighbour))
}

fn spatial_candidate<'a>(
    roots: &'a [Node],
    node: &Node,
    direction: Direction,
    config: &SpatialConfig,
) -> Option<&'a Node> {
    let mut best: Option<(&Node, f64)> = None;
    for candidate in visible_nodes(roots) {
        if candidate.id == node.id {
            continue;
        }
        let Some(score) = spatial_score(node, candidate, direction, config) else {
            continue;
        };
        match best {
            Some((_, best_score)) if score >= best_score => {}
            _ => best = Some((candidate, score)),
        }
    }
    best.map(|(candidate, _)| candidate)
}

/// Score of `candidate` as a spatial target from `from`, or `None` if it is not in `direction`.
pub fn spatial_score(
    from: &Node,
    candidate: &Node,
    direction: Direction,
    config: &SpatialConfig,
) -> Option<f64> {
    let dx = candidate.x - from.x;
    let dy = candidate.y - from.y;
    let (primary, cross) = match direction {
        Direction::Right => (dx, dy),
        Direction::Left => (-dx, dy),
        Direction::Down => (dy, dx),
        Direction::Up => (-dy, dx),
    };
    (primary > config.min_distance).then(|| primary + config.cross_axis_weight * cross.abs())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn node(id: &str, x: f64, y: f64) -> Node {
        Node::new(id, id.to_uppercase()).at(x, y)
    }

    /// root(0,100) -> a(200,50) b(200,100) c(200,150); second root r2(0,400) -> d(200,400).
    fn forest() -> Vec<Node> {
        vec![
            node("root", 0.0, 100.0)
                .with_child(node("a", 200.0, 50.0).with_child(node("a1", 400.0, 50.0)))
                .with_child(node("b", 200.0, 100.0))
                .with_child(node("c", 200.0, 150.0)),
            node("r2", 0.0, 400.0).with_child(node("d", 200.0, 400.0)),
        ]
    }

    fn target(roots: &[Node], from: &str, direction: Direction, count: usize) -> Option<String> {
        navigate(roots, from, direction, count).map(|outcome| outcome.target)
    }

    #[test]
    fn test_left_is_parent_and_repeats() {
        let roots = forest();
        assert_eq!(target(&roots, "a1", Direction::Left, 1).as_deref(), Some("a"));
        assert_eq!(target(&roots, "a1", Direction::Left, 5).as_deref(), Some("root"));
    }

    #[test]
    fn test_left_from_root_without_spatial_candidate_is_none() {
        let roots = forest();
        assert_eq!(target(&roots, "root", Direction::Left, 1), None);
    }

    #[test]
    fn test_right_picks_vertically_closest_child() {
        let roots = forest();
        assert_eq!(target(&roots, "root", Direction::Right, 1).as_deref(), Some("b"));
        assert_eq!(target(&roots, "root", Direction::Right, 2).as_deref(), Some("b"));
    }

    #[test]
    fn test_right_tie_prefers_first_child() {
        let roots = vec![
            node("p", 0.0, 100.0)
                .with_child(node("x", 200.0, 50.0))
                .with_child(node("y", 200.0, 150.0)),
        ];
        assert_eq!(target(&roots, "p", Direction::Right, 1).as_deref(), Some("x"));
    }

    #[test]
    fn test_right_into_collapsed_node_requests_expand() {
        let mut roots = forest();
        roots[0].children[0].collapsed = true;
        let outcome = navigate(&roots, "a", Direction::Right, 1).unwrap();
        assert_eq!(outcome.target, "a1");
        assert_eq!(outcome.expand, vec!["a".to_string()]);
    }

    #[test]
    fn test_vertical_clamps_then_falls_through_to_next_root() {
        let roots = forest();
        assert_eq!(target(&roots, "a", Direction::Down, 5).as_deref(), Some("c"));
        assert_eq!(target(&roots, "c", Direction::Down, 1).as_deref(), Some("r2"));
        assert_eq!(target(&roots, "c", Direction::Up, 1).as_deref(), Some("b"));
        assert_eq!(target(&roots, "d", Direction::Up, 1).as_deref(), Some("root"));
    }

    #[test]
    fn test_vertical_at_last_root_without_candidates_is_none() {
        let roots = forest();
        assert_eq!(target(&roots, "d", Direction::Down, 1), None);
    }

    #[test]
    fn test_spatial_fallback_and_gate() {
        // Two unrelated roots side by side: only geometry relates them.
        let roots = vec![node("p", 0.0, 0.0), node("q", 100.0, 10.0), node("near", 15.0, 300.0)];
        assert_eq!(target(&roots, "p", Direction::Right, 1).as_deref(), Some("q"));
        assert_eq!(target(&roots, "q", Direction::Left, 1).as_deref(), Some("p"));

        let roots = vec![node("p", 0.0, 0.0), node("q", 15.0, 0.0)];
        assert_eq!(target(&roots, "p", Direction::Right, 1), None);
    }

    #[test]
    fn test_spatial_score_weights_cross_axis() {
        let config = SpatialConfig::default();
        let from = node("o", 0.0, 0.0);
        assert_eq!(spatial_score(&from, &node("x", 100.0, 40.0), Direction::Right, &config), Some(120.0));
        assert_eq!(spatial_score(&from, &node("x", 100.0, 40.0), Direction::Left, &config), None);

        let loose = SpatialConfig {
            min_distance: 10.0,
            ..config
        };
        assert!(spatial_score(&from, &node("x", 15.0, 0.0), Direction::Right, &loose).is_some());
    }

    #[test]
    fn test_unknown_node_is_none() {
        assert_eq!(target(&forest(), "missing", Direction::Down, 1), None);
    }
}
