use std::path::Path;

use anyhow::{bail, Result};
use tracing::debug;

use crate::config::Config;
use crate::render::{Direction, TreeRenderer};

/// Print the forward overview, or the requirements tree of a single node.
pub fn run(root: &Path, config: &Config, node: Option<&str>) -> Result<()> {
    let (_, graph) = super::load_graph(root)?;
    let renderer = TreeRenderer::new(&config.display, config.graph.max_depth_warn);

    match node {
        Some(id) => {
            if !graph.contains(id) {
                bail!("'{}' is not a known skill or agent", id);
            }
            println!("{}", renderer.render_tree(&graph, id, Direction::Forward));
        }
        None => {
            let overview = renderer.render_overview(&graph);
            debug!("{} deep chain(s) in overview", overview.deep_chains.len());
            println!("{}", overview.text);
        }
    }
    Ok(())
}
