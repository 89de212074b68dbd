//! Subcommand entry points. Each `run` prints its report and returns an error
//! when the command should exit non-zero.

pub mod check;
pub mod lint;
pub mod reverse;
pub mod sync;
pub mod tree;

use std::path::Path;

use anyhow::Result;

use crate::collector::{Collector, Scan, PLUGINS_DIR};
use crate::error::FactoryError;
use crate::graph::DependencyGraph;

/// Scan the factory and build its graph, failing when nothing was found.
pub(crate) fn load_graph(root: &Path) -> Result<(Scan, DependencyGraph)> {
    let scan = Collector::new(root).scan();
    let nodes = scan.nodes();
    if nodes.is_empty() {
        return Err(FactoryError::NoNodes(root.join(PLUGINS_DIR)).into());
    }
    let graph = DependencyGraph::from_nodes(&nodes);
    Ok((scan, graph))
}
