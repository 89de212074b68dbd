use std::path::Path;

use anyhow::{bail, Result};

use crate::config::Config;
use crate::render::{ReverseLookup, TreeRenderer};

/// Print everything that transitively requires `target`.
pub fn run(root: &Path, config: &Config, target: &str) -> Result<()> {
    let (_, graph) = super::load_graph(root)?;
    let renderer = TreeRenderer::new(&config.display, config.graph.max_depth_warn);

    let (lookup, text) = renderer.render_reverse(&graph, target);
    println!("{}", text);

    if let ReverseLookup::NotFound { target, .. } = lookup {
        bail!("'{}' is not a known skill or agent", target);
    }
    Ok(())
}
