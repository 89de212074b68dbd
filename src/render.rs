//! Text rendering of dependency trees.
//!
//! Output is built as strings so callers decide where it goes; the CLI prints
//! it, tests inspect it.

use std::collections::HashSet;

use colored::Colorize;

use crate::config::DisplayConfig;
use crate::depth::DepthAnalyzer;
use crate::graph::{Adjacency, DependencyGraph};

const RULE: &str = "━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━";
const BRANCH: &str = "├── ";
const LAST_BRANCH: &str = "└── ";
const PIPE: &str = "│   ";
const SPACE: &str = "    ";

pub const CIRCULAR_FORWARD: &str = "(circular — already visited)";
pub const CIRCULAR_REVERSE: &str = "(circular)";

/// ANSI styling that can be switched off as a whole.
#[derive(Debug, Clone, Copy)]
pub struct Palette {
    enabled: bool,
}

impl Palette {
    pub fn new(enabled: bool) -> Self {
        Self { enabled }
    }

    pub fn plain() -> Self {
        Self::new(false)
    }

    pub fn node(&self, text: &str) -> String {
        self.apply(text, |s| s.cyan().to_string())
    }

    pub fn ok(&self, text: &str) -> String {
        self.apply(text, |s| s.green().to_string())
    }

    pub fn warn(&self, text: &str) -> String {
        self.apply(text, |s| s.yellow().to_string())
    }

    pub fn error(&self, text: &str) -> String {
        self.apply(text, |s| s.red().to_string())
    }

    pub fn dim(&self, text: &str) -> String {
        self.apply(text, |s| s.dimmed().to_string())
    }

    pub fn bold(&self, text: &str) -> String {
        self.apply(text, |s| s.bold().to_string())
    }

    pub fn header(&self, text: &str) -> String {
        self.apply(text, |s| s.bold().blue().to_string())
    }

    fn apply(&self, text: &str, style: impl Fn(&str) -> String) -> String {
        if self.enabled {
            style(text)
        } else {
            text.to_string()
        }
    }

    /// Ruled title block used at the top of every report.
    pub fn banner(&self, title: &str) -> Vec<String> {
        vec![
            String::new(),
            self.header(RULE),
            self.header(&format!("  {}", title)),
            self.header(RULE),
            String::new(),
        ]
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// Walk requirements: what does X need.
    Forward,
    /// Walk dependents: what needs X.
    Reverse,
}

/// Whole-graph forward view.
#[derive(Debug, Clone)]
pub struct Overview {
    pub text: String,
    /// Top-level entries whose rendered subtree reached the threshold.
    pub deep_chains: Vec<(String, usize)>,
}

/// Outcome of looking up the dependents of one id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReverseLookup {
    NotFound { target: String, known: Vec<String> },
    /// Nothing requires the target.
    Safe { target: String },
    Dependents { target: String, direct: Vec<String> },
}

/// Classify `target` against the reverse graph.
pub fn reverse_lookup(graph: &DependencyGraph, target: &str) -> ReverseLookup {
    if !graph.contains(target) {
        return ReverseLookup::NotFound {
            target: target.to_string(),
            known: graph.ids().map(str::to_string).collect(),
        };
    }
    let mut direct = graph.reverse().remove(target).unwrap_or_default();
    direct.sort();
    direct.dedup();
    if direct.is_empty() {
        ReverseLookup::Safe {
            target: target.to_string(),
        }
    } else {
        ReverseLookup::Dependents {
            target: target.to_string(),
            direct,
        }
    }
}

pub struct TreeRenderer {
    palette: Palette,
    depth: DepthAnalyzer,
}

impl TreeRenderer {
    pub fn new(display: &DisplayConfig, threshold: usize) -> Self {
        Self {
            palette: Palette::new(display.color),
            depth: DepthAnalyzer::new(threshold),
        }
    }

    pub fn palette(&self) -> Palette {
        self.palette
    }

    fn label(&self, graph: &DependencyGraph, id: &str) -> String {
        if graph.is_deprecated(id) {
            format!("{} {}", self.palette.node(id), self.palette.warn("[deprecated]"))
        } else {
            self.palette.node(id)
        }
    }

    /// Tree of one node in the given direction, the root line unindented.
    pub fn render_tree(&self, graph: &DependencyGraph, root: &str, direction: Direction) -> String {
        let reverse;
        let edges = match direction {
            Direction::Forward => graph.forward(),
            Direction::Reverse => {
                reverse = graph.reverse();
                &reverse
            }
        };
        let mut writer = TreeWriter::new(self, graph, edges, direction);
        writer.lines.push(self.label(graph, root));

        let visited: HashSet<String> = [root.to_string()].into_iter().collect();
        let children = edges.get(root).map(Vec::as_slice).unwrap_or(&[]);
        for (i, child) in children.iter().enumerate() {
            writer.node(child, "", i + 1 == children.len(), &visited, 1);
        }
        writer.finish()
    }

    /// Every node with at least one requirement as a top-level entry, then
    /// the nodes with none, then the deep-chain summary.
    pub fn render_overview(&self, graph: &DependencyGraph) -> Overview {
        let p = self.palette;
        let mut lines = p.banner("Dependency tree (requires: → required skills)");
        let mut deep_chains = Vec::new();

        let with_deps: Vec<&str> = graph
            .ids()
            .filter(|id| !graph.requires_of(id).is_empty())
            .collect();
        let without_deps: Vec<&str> = graph
            .ids()
            .filter(|id| graph.requires_of(id).is_empty())
            .collect();

        if !with_deps.is_empty() {
            lines.push(p.bold(&format!("🔗 With dependencies ({})", with_deps.len())));
            let mut writer = TreeWriter::new(self, graph, graph.forward(), Direction::Forward);
            for (i, id) in with_deps.iter().enumerate() {
                let is_last = i + 1 == with_deps.len();
                let (connector, child_prefix) = branch("", is_last);
                writer
                    .lines
                    .push(format!("{}{}", connector, self.label(graph, id)));

                let visited: HashSet<String> = [id.to_string()].into_iter().collect();
                let children = graph.requires_of(id);
                let mut deepest = 0;
                for (j, child) in children.iter().enumerate() {
                    let reached =
                        writer.node(child, &child_prefix, j + 1 == children.len(), &visited, 1);
                    deepest = deepest.max(reached);
                }
                if self.depth.exceeds(deepest) {
                    deep_chains.push((id.to_string(), deepest));
                }
            }
            lines.extend(writer.lines);
            lines.push(String::new());
        }

        if !without_deps.is_empty() {
            lines.push(p.bold(&format!("🔹 No dependencies ({})", without_deps.len())));
            for id in &without_deps {
                let marker = if graph.is_deprecated(id) {
                    format!(" {}", p.warn("[deprecated]"))
                } else {
                    String::new()
                };
                lines.push(format!("  {}  {}{}", p.dim("○"), id, marker));
            }
            lines.push(String::new());
        }

        if !deep_chains.is_empty() {
            lines.push(p.warn(&p.bold(&format!(
                "⚠  Deep dependency chains (depth ≥ {}):",
                self.depth.threshold()
            ))));
            for (id, depth) in &deep_chains {
                lines.push(format!("  {} — depth {}", id, depth));
            }
            lines.push(String::new());
        }

        Overview {
            text: lines.join("\n"),
            deep_chains,
        }
    }

    /// "What breaks if I change this": transitive dependents of `target`.
    pub fn render_reverse(&self, graph: &DependencyGraph, target: &str) -> (ReverseLookup, String) {
        let p = self.palette;
        let lookup = reverse_lookup(graph, target);
        let mut lines = p.banner(&format!("Reverse lookup: what requires '{}'", target));

        match &lookup {
            ReverseLookup::NotFound { known, .. } => {
                lines.push(format!(
                    "  {}  '{}' is not a known skill or agent",
                    p.error("✗"),
                    target
                ));
                lines.push(String::new());
                lines.push(format!("  Known ids: {}", known.join(", ")));
            }
            ReverseLookup::Safe { .. } => {
                lines.push(format!("  {}", self.label(graph, target)));
                lines.push(format!("  {}  Nothing requires this node", p.ok("✓")));
                lines.push(format!("  {}", p.ok("   → safe to change or remove")));
            }
            ReverseLookup::Dependents { direct, .. } => {
                lines.push(format!("  {}", self.label(graph, target)));
                lines.push(format!("  {}  Required by:", p.warn("⚠")));
                lines.push(String::new());

                let reverse = graph.reverse();
                let mut writer = TreeWriter::new(self, graph, &reverse, Direction::Reverse);
                let visited: HashSet<String> = [target.to_string()].into_iter().collect();
                for (i, dependent) in direct.iter().enumerate() {
                    writer.node(dependent, "  ", i + 1 == direct.len(), &visited, 1);
                }
                lines.extend(writer.lines);
                lines.push(String::new());
                lines.push(format!(
                    "  {}",
                    p.error(&format!(
                        "→ Review these {} dependent(s) before changing or removing '{}'",
                        direct.len(),
                        target
                    ))
                ));
            }
        }
        lines.push(String::new());
        (lookup, lines.join("\n"))
    }
}

/// Connector for this line and the prefix for its children.
fn branch(prefix: &str, is_last: bool) -> (String, String) {
    if is_last {
        (format!("{}{}", prefix, LAST_BRANCH), format!("{}{}", prefix, SPACE))
    } else {
        (format!("{}{}", prefix, BRANCH), format!("{}{}", prefix, PIPE))
    }
}

/// Recursive line writer shared by both directions.
struct TreeWriter<'a> {
    renderer: &'a TreeRenderer,
    graph: &'a DependencyGraph,
    edges: &'a Adjacency,
    direction: Direction,
    lines: Vec<String>,
}

impl<'a> TreeWriter<'a> {
    fn new(
        renderer: &'a TreeRenderer,
        graph: &'a DependencyGraph,
        edges: &'a Adjacency,
        direction: Direction,
    ) -> Self {
        Self {
            renderer,
            graph,
            edges,
            direction,
            lines: Vec::new(),
        }
    }

    /// Write `node` at `level` and its subtree. Returns the deepest level
    /// written. A node already on `visited` is written once more with a
    /// circular marker and not descended into.
    fn node(
        &mut self,
        node: &str,
        prefix: &str,
        is_last: bool,
        visited: &HashSet<String>,
        level: usize,
    ) -> usize {
        let p = self.renderer.palette;
        let (connector, child_prefix) = branch(prefix, is_last);

        let mut line = format!("{}{}", connector, self.renderer.label(self.graph, node));
        if self.direction == Direction::Forward && self.renderer.depth.exceeds(level) {
            line.push_str(&format!(" {}", p.error(&format!("⚠ depth={}", level))));
        }
        self.lines.push(line);

        if visited.contains(node) {
            let marker = match self.direction {
                Direction::Forward => CIRCULAR_FORWARD,
                Direction::Reverse => CIRCULAR_REVERSE,
            };
            self.lines.push(format!("{}{}", child_prefix, p.dim(marker)));
            return level;
        }

        let mut path = visited.clone();
        path.insert(node.to_string());
        let edges = self.edges;
        let children = edges.get(node).map(Vec::as_slice).unwrap_or(&[]);
        let mut deepest = level;
        for (i, child) in children.iter().enumerate() {
            let reached = self.node(child, &child_prefix, i + 1 == children.len(), &path, level + 1);
            deepest = deepest.max(reached);
        }
        deepest
    }

    fn finish(self) -> String {
        self.lines.join("\n")
    }
}
