use anyhow::Result;
use regex::Regex;
use std::collections::HashSet;
use std::fmt;
use std::path::Path;

use crate::check::{check, DependencyIssue};
use crate::collector::{Collector, Scan, SKILL_FILE};
use crate::config::LintConfig;
use crate::depth::DepthAnalyzer;
use crate::frontmatter;
use crate::graph::DependencyGraph;
use crate::plugin::{dir_name, Plugin};
use crate::render::Palette;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LintIssue {
    pub severity: Severity,
    pub category: String,
    pub message: String,
    pub suggestion: Option<String>,
}

impl LintIssue {
    fn error(category: &str, message: String) -> Self {
        Self {
            severity: Severity::Error,
            category: category.to_string(),
            message,
            suggestion: None,
        }
    }

    fn warning(category: &str, message: String) -> Self {
        Self {
            severity: Severity::Warning,
            category: category.to_string(),
            message,
            suggestion: None,
        }
    }

    fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestion = Some(suggestion.into());
        self
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Severity {
    #[default]
    Error, // Must fix
    Warning, // Should fix
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Error => write!(f, "error"),
            Severity::Warning => write!(f, "warning"),
        }
    }
}

/// One titled group of results: what passed and what did not.
#[derive(Debug, Clone, Default)]
pub struct LintSection {
    pub title: String,
    pub passed: Vec<String>,
    pub issues: Vec<LintIssue>,
    /// Shown when the section produced neither passes nor issues.
    pub all_clear: Option<String>,
}

impl LintSection {
    fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Self::default()
        }
    }

    fn all_clear(mut self, note: impl Into<String>) -> Self {
        self.all_clear = Some(note.into());
        self
    }
}

#[derive(Debug, Clone, Default)]
pub struct LintReport {
    pub sections: Vec<LintSection>,
    pub strict: bool,
}

impl LintReport {
    pub fn issues(&self) -> impl Iterator<Item = &LintIssue> {
        self.sections.iter().flat_map(|s| s.issues.iter())
    }

    pub fn errors(&self) -> usize {
        self.issues()
            .filter(|i| i.severity == Severity::Error)
            .count()
    }

    pub fn warnings(&self) -> usize {
        self.issues()
            .filter(|i| i.severity == Severity::Warning)
            .count()
    }

    /// Errors, plus warnings in strict mode.
    pub fn effective_errors(&self) -> usize {
        self.errors() + if self.strict { self.warnings() } else { 0 }
    }

    pub fn passed(&self) -> bool {
        self.effective_errors() == 0
    }

    /// Sectioned report with a closing summary line
    pub fn render(&self, p: Palette) -> String {
        let mut lines = p.banner("skill-factory — lint");

        for section in &self.sections {
            lines.push(p.bold(&section.title));
            for name in &section.passed {
                lines.push(format!("  {}  {}", p.ok("✓"), name));
            }
            for issue in &section.issues {
                let icon = match issue.severity {
                    Severity::Error => p.error("✗"),
                    Severity::Warning => p.warn("⚠"),
                };
                lines.push(format!("  {}  {}", icon, issue.message));
                if let Some(suggestion) = &issue.suggestion {
                    lines.push(format!("       {}", p.dim(&format!("💡 {}", suggestion))));
                }
            }
            if section.passed.is_empty() && section.issues.is_empty() {
                if let Some(note) = &section.all_clear {
                    lines.push(format!("  {}  {}", p.ok("✓"), note));
                }
            }
            lines.push(String::new());
        }

        let rule = "━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━";
        lines.push(p.bold(rule));
        let (errors, warnings) = (self.errors(), self.warnings());
        if errors == 0 && warnings == 0 {
            lines.push(p.ok(&p.bold("  ✅  All checks passed!")));
        } else if self.effective_errors() == 0 {
            lines.push(p.warn(&p.bold(&format!(
                "  ⚠  {} warning(s), no errors",
                warnings
            ))));
        } else {
            lines.push(p.error(&p.bold(&format!(
                "  ❌  {} error(s) / {} warning(s)",
                errors, warnings
            ))));
            if self.strict && warnings > 0 {
                lines.push(p.error("  --strict: warnings are treated as errors"));
            }
        }
        lines.push(p.bold(rule));
        lines.push(String::new());
        lines.join("\n")
    }
}

/// Quality checks over a whole factory tree.
pub struct SkillLinter {
    config: LintConfig,
    depth: DepthAnalyzer,
    step_patterns: Vec<Regex>,
    file_ref: Regex,
}

impl SkillLinter {
    pub fn new(config: &LintConfig, max_depth_warn: usize) -> Result<Self> {
        // STEP_X / ## Step N / ## Scan N / ### 1. / ### A. / ## Review Checklist
        let step_patterns = [
            r"STEP_[A-Z_]+",
            r"##\s+\w+\s+\d",
            r"###\s+\d+\.",
            r"###\s+[A-Z]\.",
            r"(?i)##\s+\w+\s+Checklist",
        ]
        .iter()
        .map(|p| Regex::new(p))
        .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(Self {
            config: config.clone(),
            depth: DepthAnalyzer::new(max_depth_warn),
            step_patterns,
            file_ref: Regex::new(r"(?:Read|Glob):\s+([\w./\-*{}]+)")?,
        })
    }

    pub fn lint(&self, collector: &Collector, scan: &Scan) -> Result<LintReport> {
        let nodes = scan.nodes();
        let graph = DependencyGraph::from_nodes(&nodes);

        let skill_dirs = collector.skill_dirs();
        let mut known: HashSet<String> = skill_dirs.iter().map(|d| dir_name(d)).collect();
        known.extend(graph.ids().map(str::to_string));

        let mut sections = Vec::new();

        let mut skills = LintSection::new(format!("📦 Skills ({})", skill_dirs.len()));
        if skill_dirs.is_empty() {
            skills.issues.push(LintIssue::warning(
                "skills",
                "no skills found under plugins/*/skills/".to_string(),
            ));
        }
        for skill_dir in &skill_dirs {
            let issues = self.check_skill(collector.root(), skill_dir, &known);
            if issues.is_empty() {
                skills.passed.push(dir_name(skill_dir));
            }
            skills.issues.extend(issues);
        }
        sections.push(skills);

        let agent_files = collector.agent_files();
        let agent_names: HashSet<String> = scan.agents().map(|a| a.dir_name.clone()).collect();
        let plugin_names: Vec<String> = scan.plugins.iter().map(|p| p.name.clone()).collect();
        let skill_ref = skill_reference_pattern(&plugin_names)?;
        let mut agents = LintSection::new(format!("🤖 Agents ({})", agent_files.len()));
        if agent_files.is_empty() {
            agents.issues.push(LintIssue::warning(
                "agents",
                "no agents found under plugins/*/agents/".to_string(),
            ));
        }
        for agent_file in &agent_files {
            let issues = self.check_agent(agent_file, &known, &agent_names, skill_ref.as_ref());
            if issues.is_empty() {
                agents.passed.push(file_stem(agent_file));
            }
            agents.issues.extend(issues);
        }
        sections.push(agents);

        let mut ids = LintSection::new("🪪 Id uniqueness").all_clear("No duplicate ids");
        for collision in nodes.collisions() {
            ids.issues.push(
                LintIssue::warning(
                    "ids",
                    format!(
                        "id '{}' declared by {} and {} — the latter wins",
                        collision.id,
                        collision.replaced.display(),
                        collision.kept.display()
                    ),
                )
                .with_suggestion("Give each skill and agent a unique name"),
            );
        }
        sections.push(ids);

        let report = check(&graph, &self.depth);
        let mut cycles = LintSection::new("🔄 Circular requires").all_clear("No circular requires");
        let mut depth = LintSection::new(format!(
            "📏 Dependency chain depth (recommended: below {})",
            self.depth.threshold()
        ))
        .all_clear(format!(
            "Every chain is shorter than {}",
            self.depth.threshold()
        ));
        for issue in &report.issues {
            match issue {
                DependencyIssue::Cycle(_) => cycles.issues.push(issue.to_lint_issue()),
                DependencyIssue::DeepChain { .. } => depth.issues.push(issue.to_lint_issue()),
                // Per-skill checks already report broken references
                DependencyIssue::Dangling { .. } | DependencyIssue::DeprecatedTarget { .. } => {}
            }
        }
        sections.push(cycles);
        sections.push(depth);

        let mut teams = LintSection::new("🤝 Teams").all_clear("Every team member resolves");
        teams.issues = self.check_teams(&scan.plugins, &known);
        sections.push(teams);

        Ok(LintReport {
            sections,
            strict: self.config.strict,
        })
    }

    fn check_skill(&self, root: &Path, skill_dir: &Path, known: &HashSet<String>) -> Vec<LintIssue> {
        let mut issues = Vec::new();
        let dir = dir_name(skill_dir);
        let skill_md = skill_dir.join(SKILL_FILE);

        if !skill_md.is_file() {
            issues.push(LintIssue::error("structure", format!("[{}] SKILL.md is missing", dir)));
            return issues;
        }

        let source = Collector::metadata_source(skill_dir).unwrap_or_else(|| skill_md.clone());
        let meta = frontmatter::read(&source).into_metadata();
        let text = std::fs::read_to_string(&skill_md).unwrap_or_default();
        let body = frontmatter::body(&text);

        match meta.name.as_deref() {
            None => issues.push(LintIssue::error(
                "frontmatter",
                format!("[{}] frontmatter has no name:", dir),
            )),
            Some(name) if name != dir => issues.push(LintIssue::warning(
                "frontmatter",
                format!("[{}] name: '{}' does not match the directory name", dir, name),
            )),
            Some(_) => {}
        }

        match meta.summary() {
            None => issues.push(LintIssue::error(
                "frontmatter",
                format!("[{}] frontmatter has no description: / use-when:", dir),
            )),
            Some(summary) if summary.chars().count() < self.config.min_description_len => {
                issues.push(
                    LintIssue::warning(
                        "frontmatter",
                        format!(
                            "[{}] description/use-when is too short ({} chars)",
                            dir,
                            summary.chars().count()
                        ),
                    )
                    .with_suggestion("Short descriptions lower trigger accuracy"),
                )
            }
            Some(_) => {}
        }

        if meta.is_deprecated() {
            issues.push(LintIssue::warning(
                "status",
                format!("[{}] status: deprecated — scheduled for removal", dir),
            ));
            // Deprecated skills skip the remaining checks
            return issues;
        }

        for req in &meta.requires {
            if !known.contains(req) {
                issues.push(LintIssue::error(
                    "requires",
                    format!("[{}] requires: '{}' — no such skill under plugins/", dir, req),
                ));
            }
        }

        if body.is_empty() {
            issues.push(LintIssue::error("content", format!("[{}] SKILL.md body is empty", dir)));
            return issues;
        }

        if !self.step_patterns.iter().any(|re| re.is_match(body)) {
            issues.push(
                LintIssue::warning(
                    "content",
                    format!("[{}] no step definitions found", dir),
                )
                .with_suggestion("Use STEP_XXX, ## Step N or ## Scan N headings"),
            );
        }

        for caps in self.file_ref.captures_iter(body) {
            let reference = &caps[1];
            if reference.contains('*') || reference.contains('{') || reference.starts_with('/') {
                continue;
            }
            if self
                .config
                .runtime_path_prefixes
                .iter()
                .any(|prefix| reference.starts_with(prefix.as_str()))
            {
                continue;
            }
            if !root.join(reference).exists() {
                issues.push(LintIssue::warning(
                    "references",
                    format!("[{}] references '{}' but the file does not exist", dir, reference),
                ));
            }
        }

        issues
    }

    fn check_agent(
        &self,
        agent_file: &Path,
        known: &HashSet<String>,
        agent_names: &HashSet<String>,
        skill_ref: Option<&Regex>,
    ) -> Vec<LintIssue> {
        let mut issues = Vec::new();
        let name = file_stem(agent_file);
        let text = std::fs::read_to_string(agent_file).unwrap_or_default();
        let body = frontmatter::body(&text);

        if body.is_empty() {
            issues.push(LintIssue::error("content", format!("[agent:{}] file is empty", name)));
            return issues;
        }

        let meta = frontmatter::parse(&text).into_metadata();
        for req in &meta.requires {
            if !known.contains(req) {
                issues.push(LintIssue::error(
                    "requires",
                    format!(
                        "[agent:{}] requires: '{}' — no such skill or agent under plugins/",
                        name, req
                    ),
                ));
            }
        }

        let has_description = meta.description.is_some()
            || body
                .lines()
                .any(|line| line.starts_with("description:"));
        if !has_description {
            issues.push(
                LintIssue::warning(
                    "frontmatter",
                    format!("[agent:{}] no description: field", name),
                )
                .with_suggestion("Routing relies on the description"),
            );
        }

        if let Some(skill_ref) = skill_ref {
            let mut seen = HashSet::new();
            for caps in skill_ref.captures_iter(body) {
                let reference = caps[1].to_string();
                if reference == name || agent_names.contains(&reference) || !seen.insert(reference.clone()) {
                    continue;
                }
                if !known.contains(&reference) {
                    issues.push(LintIssue::warning(
                        "references",
                        format!(
                            "[agent:{}] `{}` is neither a skill nor an agent under plugins/",
                            name, reference
                        ),
                    ));
                }
            }
        }

        issues
    }

    fn check_teams(&self, plugins: &[Plugin], known: &HashSet<String>) -> Vec<LintIssue> {
        let mut issues = Vec::new();
        let mut known_teams: Vec<&str> = self.config.known_teams.iter().map(String::as_str).collect();
        known_teams.sort();

        for plugin in plugins {
            let manifest = match &plugin.manifest {
                Ok(Some(manifest)) => manifest,
                Ok(None) => {
                    issues.push(LintIssue::warning(
                        "teams",
                        format!("[{}] plugin.json is missing", plugin.name),
                    ));
                    continue;
                }
                Err(e) => {
                    issues.push(LintIssue::error("teams", format!("[{}] {}", plugin.name, e)));
                    continue;
                }
            };

            let Some(teams) = &manifest.teams else {
                issues.push(LintIssue::warning(
                    "teams",
                    format!(
                        "[{}] plugin.json has no teams: field — not part of any Agent Team",
                        plugin.name
                    ),
                ));
                continue;
            };

            for (team, members) in teams {
                if !known_teams.contains(&team.as_str()) {
                    issues.push(LintIssue::warning(
                        "teams",
                        format!(
                            "[{}] teams.{} — unknown team (known: {})",
                            plugin.name,
                            team,
                            known_teams.join(", ")
                        ),
                    ));
                }
                for member in members {
                    if !known.contains(member) {
                        issues.push(LintIssue::error(
                            "teams",
                            format!(
                                "[{}] teams.{}: '{}' — no such skill under plugins/",
                                plugin.name, team, member
                            ),
                        ));
                    }
                }
            }
        }

        issues
    }
}

/// `` `<plugin>-name` `` references in agent bodies. `None` without plugins.
fn skill_reference_pattern(plugin_names: &[String]) -> Result<Option<Regex>> {
    if plugin_names.is_empty() {
        return Ok(None);
    }
    let alternatives: Vec<String> = plugin_names.iter().map(|n| regex::escape(n)).collect();
    let pattern = format!(r"`((?:{})-[a-z\-]+)`", alternatives.join("|"));
    Ok(Some(Regex::new(&pattern)?))
}

fn file_stem(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default()
}
