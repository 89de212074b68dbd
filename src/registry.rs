//! Regenerates the derived tables in `registry.md` and `README.md` from a scan.

use std::collections::BTreeMap;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use regex::{Captures, Regex};
use tracing::{debug, info, warn};

use crate::collector::{AssetKind, Scan};
use crate::config::RegistryConfig;
use crate::error::FactoryError;
use crate::plugin::Plugin;

const NO_VALUE: &str = "—";
const REGISTRY_DESC_LIMIT: usize = 100;
const README_DESC_LIMIT: usize = 80;

pub const REGISTRY_TABLE_HEADING: &str = "## Registry Table";
pub const STATISTICS_HEADING: &str = "## Statistics";
pub const SKILLS_HEADING: &str = "## Current Skills & Agents";
pub const TEAMS_START: &str = "<!-- TEAMS_TABLE_START -->";
pub const TEAMS_END: &str = "<!-- TEAMS_TABLE_END -->";

/// One row of the registry: a skill, or an agent that is not deprecated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegistryEntry {
    pub name: String,
    pub kind: AssetKind,
    pub plugin: String,
    pub model: String,
    pub version: String,
    pub tags: Vec<String>,
    /// `use-when` then `description` for skills, `description` for agents.
    pub description: Option<String>,
    pub file_path: String,
}

impl RegistryEntry {
    pub fn description_or_placeholder(&self) -> &str {
        self.description.as_deref().unwrap_or(NO_VALUE)
    }
}

/// Documentation gaps noticed while building the registry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncWarning {
    MissingDescription(String),
    MissingTags(String),
}

impl fmt::Display for SyncWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SyncWarning::MissingDescription(path) => {
                write!(f, "description/use-when not set: {}", path)
            }
            SyncWarning::MissingTags(path) => write!(f, "tags not set: {}", path),
        }
    }
}

/// A regenerated file and whether its content changed.
#[derive(Debug, Clone)]
pub struct FileUpdate {
    pub path: PathBuf,
    pub content: String,
    pub changed: bool,
}

#[derive(Debug, Clone, Default)]
pub struct SyncPlan {
    pub entries: Vec<RegistryEntry>,
    pub updates: Vec<FileUpdate>,
    /// Files that do not exist and were left alone.
    pub skipped: Vec<PathBuf>,
    pub warnings: Vec<SyncWarning>,
}

impl SyncPlan {
    pub fn skills(&self) -> usize {
        self.entries
            .iter()
            .filter(|e| e.kind == AssetKind::Skill)
            .count()
    }

    pub fn agents(&self) -> usize {
        self.entries
            .iter()
            .filter(|e| e.kind == AssetKind::Agent)
            .count()
    }

    /// Write every changed file.
    pub fn apply(&self) -> Result<usize> {
        let mut written = 0;
        for update in self.updates.iter().filter(|u| u.changed) {
            fs::write(&update.path, &update.content)
                .with_context(|| format!("Failed to write {}", update.path.display()))?;
            info!("Updated {}", update.path.display());
            written += 1;
        }
        Ok(written)
    }
}

pub struct RegistrySync<'a> {
    root: PathBuf,
    config: &'a RegistryConfig,
    date: String,
}

impl<'a> RegistrySync<'a> {
    pub fn new(root: &Path, config: &'a RegistryConfig) -> Self {
        Self {
            root: root.to_path_buf(),
            config,
            date: chrono::Local::now().format("%Y-%m-%d").to_string(),
        }
    }

    /// Override the "last modified" date stamped into the tables.
    pub fn with_date(mut self, date: impl Into<String>) -> Self {
        self.date = date.into();
        self
    }

    pub fn entries(&self, scan: &Scan) -> Vec<RegistryEntry> {
        let mut entries = Vec::new();
        for asset in &scan.assets {
            let meta = &asset.metadata;
            let description = match asset.kind {
                AssetKind::Skill => meta.summary().map(str::to_string),
                AssetKind::Agent => {
                    if meta.is_deprecated() {
                        debug!("Skipping deprecated agent {}", asset.id());
                        continue;
                    }
                    meta.description.clone()
                }
            };
            entries.push(RegistryEntry {
                name: asset.id().to_string(),
                kind: asset.kind,
                plugin: asset.plugin.clone(),
                model: meta
                    .model
                    .clone()
                    .unwrap_or_else(|| self.config.default_model.clone()),
                version: meta
                    .version
                    .clone()
                    .unwrap_or_else(|| self.config.default_version.clone()),
                tags: meta.tags.clone(),
                description,
                file_path: asset.relative_path(),
            });
        }
        // Skills first, then agents, each in scan order
        entries.sort_by_key(|e| e.kind);
        entries
    }

    /// Compute the new file contents without touching disk.
    pub fn plan(&self, scan: &Scan) -> Result<SyncPlan> {
        let entries = self.entries(scan);
        let mut plan = SyncPlan {
            warnings: warnings(&entries),
            ..SyncPlan::default()
        };

        let plugin_names: Vec<String> = scan.plugins.iter().map(|p| p.name.clone()).collect();

        let registry_path = self.root.join(&self.config.registry_file);
        if let Some(before) = read_existing(&registry_path)? {
            let table = build_registry_table(&entries, &self.date);
            let stats = build_statistics(&entries, &plugin_names, &self.date);
            let after = replace_registry_sections(&before, &table, &stats, &registry_path)?;
            plan.updates.push(FileUpdate {
                changed: after != before,
                path: registry_path,
                content: after,
            });
        } else {
            plan.skipped.push(registry_path);
        }

        let readme_path = self.root.join(&self.config.readme_file);
        if let Some(before) = read_existing(&readme_path)? {
            let section = build_readme_section(&entries);
            let mut after = replace_readme_section(&before, &section, &readme_path)?;
            let teams = build_teams_table(&scan.plugins, &self.config.team_execution);
            match replace_teams_table(&after, &teams)? {
                Some(updated) => after = updated,
                None => debug!("No teams markers in {}", readme_path.display()),
            }
            plan.updates.push(FileUpdate {
                changed: after != before,
                path: readme_path,
                content: after,
            });
        } else {
            plan.skipped.push(readme_path);
        }

        plan.entries = entries;
        Ok(plan)
    }
}

fn read_existing(path: &Path) -> Result<Option<String>> {
    if !path.is_file() {
        warn!("{} does not exist, skipping", path.display());
        return Ok(None);
    }
    let text = fs::read_to_string(path).map_err(|source| FactoryError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(Some(text))
}

fn warnings(entries: &[RegistryEntry]) -> Vec<SyncWarning> {
    let mut warnings = Vec::new();
    for entry in entries {
        if entry.description.is_none() {
            warnings.push(SyncWarning::MissingDescription(entry.file_path.clone()));
        }
        if entry.kind == AssetKind::Skill && entry.tags.is_empty() {
            warnings.push(SyncWarning::MissingTags(entry.file_path.clone()));
        }
    }
    warnings
}

pub fn format_tags(tags: &[String]) -> String {
    if tags.is_empty() {
        return NO_VALUE.to_string();
    }
    tags.iter()
        .map(|t| format!("`{}`", t))
        .collect::<Vec<_>>()
        .join(", ")
}

/// Escape pipes for a table cell and cap it at `limit` characters.
pub fn table_cell(text: &str, limit: usize) -> String {
    let escaped = text.replace('|', "\\|");
    if escaped.chars().count() > limit {
        let kept: String = escaped.chars().take(limit.saturating_sub(3)).collect();
        format!("{}...", kept)
    } else {
        escaped
    }
}

pub fn build_registry_table(entries: &[RegistryEntry], date: &str) -> String {
    let mut lines = vec![
        "| Name | Type | Plugin | Model | Tags | Version | Description | File Path | Last Modified |"
            .to_string(),
        "|------|------|--------|-------|------|---------|-------------|-----------|---------------|"
            .to_string(),
    ];
    for e in entries {
        lines.push(format!(
            "| {} | {} | {} | {} | {} | {} | {} | {} | {} |",
            e.name,
            e.kind,
            e.plugin,
            e.model,
            format_tags(&e.tags),
            e.version,
            table_cell(e.description_or_placeholder(), REGISTRY_DESC_LIMIT),
            e.file_path,
            date
        ));
    }
    lines.join("\n")
}

pub fn build_statistics(entries: &[RegistryEntry], plugins: &[String], date: &str) -> String {
    let mut by_plugin: BTreeMap<&str, Vec<&str>> = BTreeMap::new();
    let mut agents = Vec::new();
    for e in entries {
        match e.kind {
            AssetKind::Skill => by_plugin.entry(&e.plugin).or_default().push(&e.name),
            AssetKind::Agent => agents.push(e.name.as_str()),
        }
    }
    let skills: usize = by_plugin.values().map(Vec::len).sum();

    let mut lines = vec![
        format!("- **Total assets**: {}", entries.len()),
        format!("- **Skills**: {}", skills),
    ];
    for (plugin, names) in &by_plugin {
        lines.push(format!(
            "  - plugin/{} ({}): {}",
            plugin,
            names.len(),
            names.join(", ")
        ));
    }
    lines.push(format!("- **Agents**: {} ({})", agents.len(), agents.join(", ")));
    lines.push(format!("- **Plugins**: {} ({})", plugins.len(), plugins.join(", ")));
    lines.push("- **Hooks**: 0".to_string());
    lines.push("- **MCP Servers**: 0".to_string());
    lines.push("- **Output Styles**: 0".to_string());
    lines.push(String::new());
    lines.push(format!("*Last updated: {}*", date));
    lines.join("\n")
}

/// `## Current Skills & Agents` body: one table per plugin, then agents.
pub fn build_readme_section(entries: &[RegistryEntry]) -> String {
    let mut by_plugin: BTreeMap<&str, Vec<&RegistryEntry>> = BTreeMap::new();
    for e in entries.iter().filter(|e| e.kind == AssetKind::Skill) {
        by_plugin.entry(&e.plugin).or_default().push(e);
    }

    let mut blocks = Vec::new();
    for (plugin, skills) in &by_plugin {
        let mut lines = vec![
            format!("### {} Plugin Skills", capitalize(plugin)),
            String::new(),
            "| Skill | Model | Tags | Purpose |".to_string(),
            "|-------|-------|------|---------|".to_string(),
        ];
        for s in skills {
            lines.push(format!(
                "| `{}` | {} | {} | {} |",
                s.name,
                s.model,
                format_tags(&s.tags),
                table_cell(s.description_or_placeholder(), README_DESC_LIMIT)
            ));
        }
        blocks.push(lines.join("\n"));
    }

    let mut agents = vec![
        "### Agents".to_string(),
        String::new(),
        "| Agent | Plugin | Model | Purpose |".to_string(),
        "|-------|--------|-------|---------|".to_string(),
    ];
    for a in entries.iter().filter(|e| e.kind == AssetKind::Agent) {
        agents.push(format!(
            "| `{}` | {} | {} | {} |",
            a.name,
            a.plugin,
            a.model,
            table_cell(a.description_or_placeholder(), README_DESC_LIMIT)
        ));
    }
    blocks.push(agents.join("\n"));

    format!("{}\n\n{}", SKILLS_HEADING, blocks.join("\n\n"))
}

/// Members of each team across every plugin, teams sorted by name.
pub fn build_teams_table(plugins: &[Plugin], execution: &BTreeMap<String, String>) -> String {
    let mut teams: BTreeMap<String, Vec<String>> = BTreeMap::new();
    for plugin in plugins {
        for (team, members) in plugin.teams() {
            teams.entry(team).or_default().extend(members);
        }
    }

    let mut lines = vec![
        "| Team | Execution | Members |".to_string(),
        "|------|-----------|---------|".to_string(),
    ];
    for (team, members) in &teams {
        let style = execution.get(team).map(String::as_str).unwrap_or(NO_VALUE);
        let members = if members.is_empty() {
            NO_VALUE.to_string()
        } else {
            members.join(", ")
        };
        lines.push(format!("| `{}` | {} | {} |", team, style, members));
    }
    lines.join("\n")
}

fn section_not_found(file: &Path, section: &str) -> FactoryError {
    FactoryError::SectionNotFound {
        file: file.to_path_buf(),
        section: section.to_string(),
    }
}

/// Replace the registry table (up to the next `---` rule) and everything
/// after the statistics heading.
pub fn replace_registry_sections(
    text: &str,
    table: &str,
    stats: &str,
    file: &Path,
) -> Result<String> {
    let table_re = Regex::new(&format!(
        r"(?s)({}\n\n).*?(\n---)",
        regex::escape(REGISTRY_TABLE_HEADING)
    ))?;
    if !table_re.is_match(text) {
        return Err(section_not_found(file, REGISTRY_TABLE_HEADING).into());
    }
    let text = table_re.replace(text, |caps: &Captures| {
        format!("{}{}\n{}", &caps[1], table, &caps[2])
    });

    let stats_re = Regex::new(&format!(
        r"(?s)({}\n\n).*",
        regex::escape(STATISTICS_HEADING)
    ))?;
    if !stats_re.is_match(&text) {
        return Err(section_not_found(file, STATISTICS_HEADING).into());
    }
    let text = stats_re.replace(&text, |caps: &Captures| format!("{}{}\n", &caps[1], stats));
    Ok(text.into_owned())
}

/// Replace from the skills heading up to the next `## ` heading, or the end.
pub fn replace_readme_section(text: &str, section: &str, file: &Path) -> Result<String> {
    let start = text
        .find(SKILLS_HEADING)
        .ok_or_else(|| section_not_found(file, SKILLS_HEADING))?;
    let after_heading = start + SKILLS_HEADING.len();
    let end = text[after_heading..]
        .find("\n## ")
        .map(|offset| after_heading + offset)
        .unwrap_or(text.len());

    Ok(format!("{}{}\n{}", &text[..start], section, &text[end..]))
}

/// Replace the block between the teams markers. `None` when the markers are absent.
pub fn replace_teams_table(text: &str, table: &str) -> Result<Option<String>> {
    let re = Regex::new(&format!(
        r"(?s)({}).*?({})",
        regex::escape(TEAMS_START),
        regex::escape(TEAMS_END)
    ))?;
    if !re.is_match(text) {
        return Ok(None);
    }
    let replaced = re.replace(text, |caps: &Captures| {
        format!("{}\n{}\n{}", &caps[1], table, &caps[2])
    });
    Ok(Some(replaced.into_owned()))
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
        None => String::new(),
    }
}
