//! Longest acyclic requires-chain per node.

use std::collections::{BTreeMap, HashSet};

use crate::graph::DependencyGraph;

pub const DEFAULT_MAX_DEPTH_WARN: usize = 3;

/// Chain length from `node`: 0 when the node is absent, has no requirements,
/// or is already on the current path; otherwise `1 + max(child depths)`.
///
/// `visited` is the path from the measuring root down to `node`. It is cloned
/// per branch, so the same node can measure differently under different
/// ancestors when a cycle is involved.
pub fn chain_depth(graph: &DependencyGraph, node: &str, visited: &HashSet<String>) -> usize {
    if visited.contains(node) || !graph.contains(node) {
        return 0;
    }
    let children = graph.requires_of(node);
    if children.is_empty() {
        return 0;
    }

    let mut path = visited.clone();
    path.insert(node.to_string());
    1 + children
        .iter()
        .map(|child| chain_depth(graph, child, &path))
        .max()
        .unwrap_or(0)
}

#[derive(Debug, Clone, Copy)]
pub struct DepthAnalyzer {
    threshold: usize,
}

impl Default for DepthAnalyzer {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_DEPTH_WARN)
    }
}

impl DepthAnalyzer {
    pub fn new(threshold: usize) -> Self {
        Self { threshold }
    }

    pub fn threshold(&self) -> usize {
        self.threshold
    }

    pub fn depth(&self, graph: &DependencyGraph, node: &str) -> usize {
        chain_depth(graph, node, &HashSet::new())
    }

    /// Depth of every known node, each measured from scratch.
    pub fn depths(&self, graph: &DependencyGraph) -> BTreeMap<String, usize> {
        graph
            .ids()
            .map(|id| (id.to_string(), self.depth(graph, id)))
            .collect()
    }

    pub fn exceeds(&self, depth: usize) -> bool {
        depth >= self.threshold
    }

    /// Nodes whose depth meets or exceeds the threshold, in id order.
    pub fn flagged(&self, graph: &DependencyGraph) -> Vec<(String, usize)> {
        self.depths(graph)
            .into_iter()
            .filter(|(_, depth)| self.exceeds(*depth))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collector::Node;

    fn graph(nodes: Vec<Node>) -> DependencyGraph {
        DependencyGraph::from_nodes(&nodes.into_iter().collect())
    }

    #[test]
    fn test_leaf_depth_is_zero() {
        let g = graph(vec![Node::new("leaf", &[])]);
        assert_eq!(DepthAnalyzer::default().depth(&g, "leaf"), 0);
        assert_eq!(DepthAnalyzer::default().depth(&g, "unknown"), 0);
    }

    #[test]
    fn test_chain_depths_and_flags() {
        let g = graph(vec![
            Node::new("a", &["b"]),
            Node::new("b", &["c"]),
            Node::new("c", &["d"]),
            Node::new("d", &[]),
        ]);
        let analyzer = DepthAnalyzer::new(3);
        let depths = analyzer.depths(&g);
        assert_eq!(depths["a"], 3);
        assert_eq!(depths["b"], 2);
        assert_eq!(depths["c"], 1);
        assert_eq!(depths["d"], 0);
        assert_eq!(analyzer.flagged(&g), vec![("a".to_string(), 3)]);
    }

    #[test]
    fn test_longest_branch_wins() {
        let g = graph(vec![
            Node::new("root", &["short", "long"]),
            Node::new("short", &[]),
            Node::new("long", &["mid"]),
            Node::new("mid", &["end"]),
            Node::new("end", &[]),
        ]);
        assert_eq!(DepthAnalyzer::default().depth(&g, "root"), 3);
    }

    #[test]
    fn test_cycle_terminates() {
        let g = graph(vec![Node::new("a", &["b"]), Node::new("b", &["a"])]);
        let analyzer = DepthAnalyzer::default();
        let depth = analyzer.depth(&g, "a");
        assert!(depth <= 2, "depth {} exceeds cycle size", depth);
        assert_eq!(depth, 2);
    }

    #[test]
    fn test_self_loop_depth() {
        let g = graph(vec![Node::new("solo", &["solo"])]);
        assert_eq!(DepthAnalyzer::default().depth(&g, "solo"), 1);
    }

    #[test]
    fn test_dangling_child_contributes_zero() {
        let g = graph(vec![Node::new("x", &["y"])]);
        assert_eq!(DepthAnalyzer::default().depth(&g, "x"), 1);
    }

    #[test]
    fn test_path_scoped_visited() {
        // c's depth depends on whether a is already on the path.
        let g = graph(vec![
            Node::new("a", &["b"]),
            Node::new("b", &["c"]),
            Node::new("c", &["a"]),
        ]);
        let mut path = HashSet::new();
        assert_eq!(chain_depth(&g, "c", &path), 3);
        path.insert("a".to_string());
        assert_eq!(chain_depth(&g, "c", &path), 1);
    }

    #[test]
    fn test_custom_threshold() {
        let g = graph(vec![Node::new("a", &["b"]), Node::new("b", &[])]);
        assert_eq!(DepthAnalyzer::new(1).flagged(&g).len(), 1);
        assert!(DepthAnalyzer::new(2).flagged(&g).is_empty());
    }
}
