//! skill-factory - Dependency graph tooling for skill and agent plugins
//!
//! Scans `plugins/*/skills/*` and `plugins/*/agents/*.md`, builds the
//! `requires:` graph between them, and reports on it: forward and reverse
//! trees, cycle and chain-depth checks, a document linter, and regeneration of
//! the registry and README tables.

pub mod check;
pub mod cli;
pub mod collector;
pub mod config;
pub mod cycles;
pub mod depth;
pub mod error;
pub mod frontmatter;
pub mod graph;
pub mod lint;
pub mod plugin;
pub mod registry;
pub mod render;
