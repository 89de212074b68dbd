use std::path::Path;

use anyhow::{bail, Result};

use crate::check::check;
use crate::config::Config;
use crate::depth::DepthAnalyzer;
use crate::render::Palette;

/// Validate dependencies; any issue makes the command fail.
pub fn run(root: &Path, config: &Config) -> Result<()> {
    let (_, graph) = super::load_graph(root)?;
    let report = check(&graph, &DepthAnalyzer::new(config.graph.max_depth_warn));

    println!("{}", report.render(Palette::new(config.display.color)));

    if !report.is_clean() {
        bail!("{} dependency issue(s) found", report.len());
    }
    Ok(())
}
