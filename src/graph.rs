//! Forward (requires) and reverse (required-by) adjacency.

use std::collections::{BTreeMap, BTreeSet};

use crate::collector::NodeSet;

pub type Adjacency = BTreeMap<String, Vec<String>>;

/// The requires graph. Keys are known node ids; values may name ids that are
/// not keys (dangling references).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DependencyGraph {
    forward: Adjacency,
    deprecated: BTreeSet<String>,
}

impl DependencyGraph {
    pub fn from_nodes(nodes: &NodeSet) -> Self {
        let mut graph = Self::default();
        for node in nodes.iter() {
            graph.forward.insert(node.id.clone(), node.requires.clone());
            if node.deprecated {
                graph.deprecated.insert(node.id.clone());
            } else {
                graph.deprecated.remove(&node.id);
            }
        }
        graph
    }

    pub fn forward(&self) -> &Adjacency {
        &self.forward
    }

    /// Dependents of every id. Derived from `forward` on each call.
    pub fn reverse(&self) -> Adjacency {
        reverse_edges(&self.forward)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.forward.contains_key(id)
    }

    /// Declared requirements of `id`; empty for unknown ids.
    pub fn requires_of(&self, id: &str) -> &[String] {
        self.forward.get(id).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn is_deprecated(&self, id: &str) -> bool {
        self.deprecated.contains(id)
    }

    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.forward.keys().map(String::as_str)
    }

    pub fn edge_count(&self) -> usize {
        self.forward.values().map(Vec::len).sum()
    }

    /// Every `(from, to)` edge whose target is not a known id, in key order.
    pub fn dangling(&self) -> Vec<(&str, &str)> {
        self.forward
            .iter()
            .flat_map(|(from, requires)| {
                requires
                    .iter()
                    .filter(|to| !self.forward.contains_key(to.as_str()))
                    .map(move |to| (from.as_str(), to.as_str()))
            })
            .collect()
    }
}

/// Edge reversal: for each `a -> b`, `a` is appended to `result[b]`. Every id
/// seen as a key or a target gets an entry.
pub fn reverse_edges(forward: &Adjacency) -> Adjacency {
    let mut reverse: Adjacency = forward.keys().map(|k| (k.clone(), Vec::new())).collect();
    for (from, requires) in forward {
        for to in requires {
            reverse.entry(to.clone()).or_default().push(from.clone());
        }
    }
    reverse
}
