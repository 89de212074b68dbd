//! Dependency validation: dangling and deprecated references, cycles, and
//! chains at or past the depth threshold.

use std::fmt;

use crate::cycles::{detect_cycles, CycleReport};
use crate::depth::DepthAnalyzer;
use crate::graph::DependencyGraph;
use crate::lint::{LintIssue, Severity};
use crate::render::Palette;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DependencyIssue {
    /// `from` requires an id that is not in the node set.
    Dangling { from: String, to: String },
    /// `from` requires a node marked `status: deprecated`.
    DeprecatedTarget { from: String, to: String },
    Cycle(CycleReport),
    DeepChain {
        node: String,
        depth: usize,
        threshold: usize,
    },
}

impl DependencyIssue {
    pub fn severity(&self) -> Severity {
        match self {
            DependencyIssue::Dangling { .. } | DependencyIssue::Cycle(_) => Severity::Error,
            DependencyIssue::DeprecatedTarget { .. } | DependencyIssue::DeepChain { .. } => {
                Severity::Warning
            }
        }
    }

    pub fn category(&self) -> &'static str {
        match self {
            DependencyIssue::Dangling { .. } | DependencyIssue::DeprecatedTarget { .. } => {
                "requires"
            }
            DependencyIssue::Cycle(_) => "cycle",
            DependencyIssue::DeepChain { .. } => "depth",
        }
    }

    fn suggestion(&self) -> Option<String> {
        match self {
            DependencyIssue::Dangling { to, .. } => Some(format!(
                "Create the '{}' skill or remove it from requires:",
                to
            )),
            DependencyIssue::DeprecatedTarget { to, .. } => {
                Some(format!("Move off '{}' before it is removed", to))
            }
            DependencyIssue::Cycle(_) => Some("Break the loop by removing one requires: entry".to_string()),
            DependencyIssue::DeepChain { .. } => {
                Some("Run `skill-factory tree` to inspect the chain".to_string())
            }
        }
    }

    pub fn to_lint_issue(&self) -> LintIssue {
        LintIssue {
            severity: self.severity(),
            category: self.category().to_string(),
            message: self.to_string(),
            suggestion: self.suggestion(),
        }
    }
}

impl fmt::Display for DependencyIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DependencyIssue::Dangling { from, to } => {
                write!(f, "[{}] requires '{}' — no such skill or agent", from, to)
            }
            DependencyIssue::DeprecatedTarget { from, to } => {
                write!(f, "[{}] requires '{}' — depends on a deprecated skill", from, to)
            }
            DependencyIssue::Cycle(report) => write!(
                f,
                "circular requires: {} (found from {})",
                report.describe(),
                report.root
            ),
            DependencyIssue::DeepChain {
                node,
                depth,
                threshold,
            } => write!(
                f,
                "[{}] dependency chain depth {} (recommended: below {})",
                node, depth, threshold
            ),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DependencyReport {
    pub issues: Vec<DependencyIssue>,
}

impl DependencyReport {
    pub fn is_clean(&self) -> bool {
        self.issues.is_empty()
    }

    pub fn len(&self) -> usize {
        self.issues.len()
    }

    pub fn is_empty(&self) -> bool {
        self.issues.is_empty()
    }

    pub fn count(&self, severity: Severity) -> usize {
        self.issues
            .iter()
            .filter(|i| i.severity() == severity)
            .count()
    }

    pub fn render(&self, palette: Palette) -> String {
        let mut lines = palette.banner("Dependency check");
        for issue in &self.issues {
            let icon = match issue.severity() {
                Severity::Error => palette.error("✗"),
                Severity::Warning => palette.warn("⚠"),
            };
            lines.push(format!("  {}  {}", icon, issue));
        }

        if self.is_clean() {
            lines.push(format!(
                "  {}  No problematic dependencies found",
                palette.ok("✓")
            ));
        } else {
            lines.push(String::new());
            lines.push(format!(
                "  {}",
                palette.warn(&format!("Total: {} issue(s)", self.issues.len()))
            ));
        }
        lines.push(String::new());
        lines.join("\n")
    }
}

/// Validate every edge of the graph, then its cycles and chain depths.
pub fn check(graph: &DependencyGraph, depth: &DepthAnalyzer) -> DependencyReport {
    let mut issues = Vec::new();

    for (from, requires) in graph.forward() {
        for to in requires {
            if !graph.contains(to) {
                issues.push(DependencyIssue::Dangling {
                    from: from.clone(),
                    to: to.clone(),
                });
            } else if graph.is_deprecated(to) {
                issues.push(DependencyIssue::DeprecatedTarget {
                    from: from.clone(),
                    to: to.clone(),
                });
            }
        }
    }

    issues.extend(detect_cycles(graph).into_iter().map(DependencyIssue::Cycle));

    issues.extend(
        depth
            .flagged(graph)
            .into_iter()
            .map(|(node, d)| DependencyIssue::DeepChain {
                node,
                depth: d,
                threshold: depth.threshold(),
            }),
    );

    DependencyReport { issues }
}
