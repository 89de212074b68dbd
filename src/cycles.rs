//! Cycle detection over the forward graph.
//!
//! Three-color depth-first search with an explicit stack: WHITE nodes are
//! unvisited, GRAY nodes are on the active path, BLACK nodes are finished.
//! An edge into a GRAY node closes a cycle.

use std::collections::HashMap;

use crate::graph::{Adjacency, DependencyGraph};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Color {
    White,
    Gray,
    Black,
}

/// A cycle reachable from a traversal root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CycleReport {
    /// Node the traversal started from.
    pub root: String,
    /// First cycle seen from `root`, closed: `[b, c, b]`.
    pub path: Vec<String>,
}

impl CycleReport {
    pub fn describe(&self) -> String {
        self.path.join(" → ")
    }
}

/// One report per traversal root that reaches a cycle. Roots are tried in id
/// order; nodes visited by an earlier root are not revisited.
pub fn detect_cycles(graph: &DependencyGraph) -> Vec<CycleReport> {
    let forward = graph.forward();
    let mut color: HashMap<&str, Color> = forward
        .keys()
        .map(|id| (id.as_str(), Color::White))
        .collect();

    let mut reports = Vec::new();
    for root in forward.keys() {
        if color.get(root.as_str()) != Some(&Color::White) {
            continue;
        }
        if let Some(path) = explore(forward, root, &mut color) {
            reports.push(CycleReport {
                root: root.clone(),
                path,
            });
        }
    }
    reports
}

/// Run one DFS from `root`, stopping at the first cycle it closes. Nodes on the
/// active path are marked BLACK; nodes not yet reached stay WHITE for later roots.
fn explore<'a>(
    forward: &'a Adjacency,
    root: &'a str,
    color: &mut HashMap<&'a str, Color>,
) -> Option<Vec<String>> {
    // (node, index of the next child to visit)
    let mut stack: Vec<(&'a str, usize)> = vec![(root, 0)];
    color.insert(root, Color::Gray);

    while let Some(frame) = stack.last_mut() {
        let node = frame.0;
        let children = forward.get(node).map(Vec::as_slice).unwrap_or(&[]);
        if frame.1 >= children.len() {
            color.insert(node, Color::Black);
            stack.pop();
            continue;
        }

        let child = children[frame.1].as_str();
        frame.1 += 1;
        match color.get(child).copied() {
            // Dangling reference: terminal, never part of a cycle.
            None | Some(Color::Black) => {}
            Some(Color::White) => {
                color.insert(child, Color::Gray);
                stack.push((child, 0));
            }
            Some(Color::Gray) => {
                let start = stack.iter().position(|(n, _)| *n == child).unwrap_or(0);
                let mut path: Vec<String> =
                    stack[start..].iter().map(|(n, _)| n.to_string()).collect();
                path.push(child.to_string());
                for (node, _) in &stack {
                    color.insert(*node, Color::Black);
                }
                return Some(path);
            }
        }
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collector::Node;

    fn graph(nodes: Vec<Node>) -> DependencyGraph {
        DependencyGraph::from_nodes(&nodes.into_iter().collect())
    }

    #[test]
    fn test_acyclic_graph_has_no_reports() {
        let g = graph(vec![
            Node::new("a", &["b", "c"]),
            Node::new("b", &["d"]),
            Node::new("c", &["d"]),
            Node::new("d", &[]),
        ]);
        assert!(detect_cycles(&g).is_empty());
    }

    #[test]
    fn test_two_node_cycle() {
        let g = graph(vec![Node::new("a", &["b"]), Node::new("b", &["a"])]);
        let reports = detect_cycles(&g);
        assert_eq!(reports.len(), 1);
        assert_eq!(reports[0].root, "a");
        assert_eq!(reports[0].path, vec!["a", "b", "a"]);
        assert_eq!(reports[0].describe(), "a → b → a");
    }

    #[test]
    fn test_self_loop() {
        let g = graph(vec![Node::new("solo", &["solo"])]);
        let reports = detect_cycles(&g);
        assert_eq!(reports.len(), 1);
        assert_eq!(reports[0].path, vec!["solo", "solo"]);
    }

    #[test]
    fn test_cycle_reported_once_per_root() {
        // a reaches the b <-> c cycle; the whole path is retired with it.
        let g = graph(vec![
            Node::new("a", &["b"]),
            Node::new("b", &["c"]),
            Node::new("c", &["b"]),
        ]);
        let reports = detect_cycles(&g);
        assert_eq!(reports.len(), 1);
        assert_eq!(reports[0].root, "a");
        assert_eq!(reports[0].path, vec!["b", "c", "b"]);
    }

    #[test]
    fn test_disconnected_cycle_is_found() {
        let g = graph(vec![
            Node::new("a", &[]),
            Node::new("m", &["n"]),
            Node::new("n", &["m"]),
            Node::new("z", &["a"]),
        ]);
        let reports = detect_cycles(&g);
        assert_eq!(reports.len(), 1);
        assert_eq!(reports[0].root, "m");
    }

    #[test]
    fn test_dangling_reference_neither_causes_nor_masks() {
        let g = graph(vec![Node::new("x", &["ghost"])]);
        assert!(detect_cycles(&g).is_empty());

        let g = graph(vec![
            Node::new("x", &["ghost", "y"]),
            Node::new("y", &["x"]),
        ]);
        assert_eq!(detect_cycles(&g).len(), 1);
    }

    #[test]
    fn test_finished_nodes_do_not_fake_cycles() {
        // Diamond reached twice must not be mistaken for a back edge.
        let g = graph(vec![
            Node::new("top", &["left", "right"]),
            Node::new("left", &["bottom"]),
            Node::new("right", &["bottom"]),
            Node::new("bottom", &[]),
            Node::new("other", &["bottom", "left"]),
        ]);
        assert!(detect_cycles(&g).is_empty());
    }

    #[test]
    fn test_two_separate_cycles_two_reports() {
        let g = graph(vec![
            Node::new("a", &["b"]),
            Node::new("b", &["a"]),
            Node::new("x", &["y"]),
            Node::new("y", &["x"]),
        ]);
        let roots: Vec<String> = detect_cycles(&g).into_iter().map(|r| r.root).collect();
        assert_eq!(roots, vec!["a", "x"]);
    }

    #[test]
    fn test_second_cycle_behind_same_root() {
        // a closes a -> b -> a first; x and y are left for their own traversal.
        let g = graph(vec![
            Node::new("a", &["b", "x"]),
            Node::new("b", &["a"]),
            Node::new("x", &["y"]),
            Node::new("y", &["x"]),
        ]);
        let reports = detect_cycles(&g);
        assert_eq!(reports.len(), 2);
        assert_eq!(reports[0].root, "a");
        assert_eq!(reports[0].path, vec!["a", "b", "a"]);
        assert_eq!(reports[1].root, "x");
        assert_eq!(reports[1].path, vec!["x", "y", "x"]);
    }
}
