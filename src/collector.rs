use std::collections::HashMap;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use crate::frontmatter::{self, Metadata};
use crate::plugin::{dir_name, Plugin};

pub const PLUGINS_DIR: &str = "plugins";
pub const SKILLS_DIR: &str = "skills";
pub const AGENTS_DIR: &str = "agents";
pub const METADATA_FILE: &str = "metadata.md";
pub const SKILL_FILE: &str = "SKILL.md";

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum AssetKind {
    Skill,
    Agent,
}

impl fmt::Display for AssetKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AssetKind::Skill => write!(f, "skill"),
            AssetKind::Agent => write!(f, "agent"),
        }
    }
}

/// One scanned skill or agent document.
#[derive(Debug, Clone)]
pub struct Asset {
    pub kind: AssetKind,
    pub plugin: String,
    /// Skill directory name, or agent file stem.
    pub dir_name: String,
    /// Document the metadata was read from.
    pub source: PathBuf,
    pub metadata: Metadata,
}

impl Asset {
    /// Declared name, falling back to the directory or file name.
    pub fn id(&self) -> &str {
        self.metadata.name.as_deref().unwrap_or(&self.dir_name)
    }

    pub fn source_file_name(&self) -> String {
        dir_name(&self.source)
    }

    /// Path of the asset's main document relative to the factory root.
    pub fn relative_path(&self) -> String {
        match self.kind {
            AssetKind::Skill => format!(
                "{}/{}/{}/{}/{}",
                PLUGINS_DIR, self.plugin, SKILLS_DIR, self.dir_name, SKILL_FILE
            ),
            AssetKind::Agent => format!(
                "{}/{}/{}/{}",
                PLUGINS_DIR,
                self.plugin,
                AGENTS_DIR,
                self.source_file_name()
            ),
        }
    }

    pub fn to_node(&self) -> Node {
        Node {
            id: self.id().to_string(),
            requires: self.metadata.requires.clone(),
            deprecated: self.metadata.is_deprecated(),
        }
    }
}

/// A graph vertex: one skill or agent with its declared requirements.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Node {
    pub id: String,
    pub requires: Vec<String>,
    pub deprecated: bool,
}

impl Node {
    pub fn new(id: impl Into<String>, requires: &[&str]) -> Self {
        Self {
            id: id.into(),
            requires: requires.iter().map(|r| r.to_string()).collect(),
            deprecated: false,
        }
    }

    pub fn deprecated(mut self) -> Self {
        self.deprecated = true;
        self
    }
}

/// Two documents declared the same id; the later one in scan order won.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Collision {
    pub id: String,
    pub kept: PathBuf,
    pub replaced: PathBuf,
}

/// Nodes keyed by id in scan order. Duplicate ids are last-write-wins.
#[derive(Debug, Clone, Default)]
pub struct NodeSet {
    nodes: Vec<Node>,
    index: HashMap<String, usize>,
    sources: Vec<PathBuf>,
    collisions: Vec<Collision>,
}

impl NodeSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, node: Node, source: PathBuf) {
        match self.index.get(&node.id) {
            Some(&slot) => {
                warn!(
                    "Duplicate id '{}': {} replaces {}",
                    node.id,
                    source.display(),
                    self.sources[slot].display()
                );
                self.collisions.push(Collision {
                    id: node.id.clone(),
                    kept: source.clone(),
                    replaced: std::mem::replace(&mut self.sources[slot], source),
                });
                self.nodes[slot] = node;
            }
            None => {
                self.index.insert(node.id.clone(), self.nodes.len());
                self.nodes.push(node);
                self.sources.push(source);
            }
        }
    }

    pub fn get(&self, id: &str) -> Option<&Node> {
        self.index.get(id).map(|&slot| &self.nodes[slot])
    }

    pub fn iter(&self) -> impl Iterator<Item = &Node> {
        self.nodes.iter()
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn collisions(&self) -> &[Collision] {
        &self.collisions
    }
}

impl FromIterator<Node> for NodeSet {
    fn from_iter<I: IntoIterator<Item = Node>>(iter: I) -> Self {
        let mut set = NodeSet::new();
        for node in iter {
            let source = PathBuf::from(&node.id);
            set.insert(node, source);
        }
        set
    }
}

/// Everything discovered under `<root>/plugins` in one pass.
#[derive(Debug, Default)]
pub struct Scan {
    pub plugins: Vec<Plugin>,
    pub assets: Vec<Asset>,
}

impl Scan {
    pub fn skills(&self) -> impl Iterator<Item = &Asset> {
        self.assets.iter().filter(|a| a.kind == AssetKind::Skill)
    }

    pub fn agents(&self) -> impl Iterator<Item = &Asset> {
        self.assets.iter().filter(|a| a.kind == AssetKind::Agent)
    }

    pub fn nodes(&self) -> NodeSet {
        let mut set = NodeSet::new();
        for asset in &self.assets {
            set.insert(asset.to_node(), asset.source.clone());
        }
        set
    }
}

pub struct Collector {
    root: PathBuf,
}

impl Collector {
    pub fn new(root: &Path) -> Self {
        Self {
            root: root.to_path_buf(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn plugins_dir(&self) -> PathBuf {
        self.root.join(PLUGINS_DIR)
    }

    /// `plugins/*` directories, sorted.
    pub fn plugin_dirs(&self) -> Vec<PathBuf> {
        sorted_subdirs(&self.plugins_dir())
    }

    /// `plugins/*/skills/*` directories, sorted by (plugin, skill).
    pub fn skill_dirs(&self) -> Vec<PathBuf> {
        self.plugin_dirs()
            .iter()
            .flat_map(|plugin| sorted_subdirs(&plugin.join(SKILLS_DIR)))
            .collect()
    }

    /// `plugins/*/agents/*.md` files, sorted by (plugin, file).
    pub fn agent_files(&self) -> Vec<PathBuf> {
        self.plugin_dirs()
            .iter()
            .flat_map(|plugin| agent_files_in(&plugin.join(AGENTS_DIR)))
            .collect()
    }

    /// Walk the plugin tree and read every skill and agent document.
    pub fn scan(&self) -> Scan {
        let plugins_dir = self.plugins_dir();
        if !plugins_dir.is_dir() {
            info!("No plugins directory at {}", plugins_dir.display());
            return Scan::default();
        }

        let mut scan = Scan::default();
        for plugin_dir in self.plugin_dirs() {
            let plugin = Plugin::load(&plugin_dir);

            for skill_dir in sorted_subdirs(&plugin_dir.join(SKILLS_DIR)) {
                match Self::read_skill(&plugin.name, &skill_dir) {
                    Some(asset) => scan.assets.push(asset),
                    None => debug!(
                        "Skipping {}: no {} or {}",
                        skill_dir.display(),
                        METADATA_FILE,
                        SKILL_FILE
                    ),
                }
            }

            for agent_file in agent_files_in(&plugin_dir.join(AGENTS_DIR)) {
                scan.assets.push(Self::read_agent(&plugin.name, &agent_file));
            }

            scan.plugins.push(plugin);
        }

        info!(
            "Scanned {} plugins: {} skills, {} agents",
            scan.plugins.len(),
            scan.skills().count(),
            scan.agents().count()
        );
        scan
    }

    /// Metadata source for a skill: `metadata.md` first, then `SKILL.md`.
    pub fn metadata_source(skill_dir: &Path) -> Option<PathBuf> {
        [METADATA_FILE, SKILL_FILE]
            .iter()
            .map(|file| skill_dir.join(file))
            .find(|path| path.is_file())
    }

    fn read_skill(plugin: &str, skill_dir: &Path) -> Option<Asset> {
        let source = Self::metadata_source(skill_dir)?;
        let metadata = frontmatter::read(&source).into_metadata();
        Some(Asset {
            kind: AssetKind::Skill,
            plugin: plugin.to_string(),
            dir_name: dir_name(skill_dir),
            source,
            metadata,
        })
    }

    fn read_agent(plugin: &str, agent_file: &Path) -> Asset {
        let stem = agent_file
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        Asset {
            kind: AssetKind::Agent,
            plugin: plugin.to_string(),
            dir_name: stem,
            source: agent_file.to_path_buf(),
            metadata: frontmatter::read(agent_file).into_metadata(),
        }
    }
}

fn sorted_subdirs(dir: &Path) -> Vec<PathBuf> {
    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(_) => return Vec::new(),
    };
    let mut dirs: Vec<PathBuf> = entries
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| path.is_dir())
        .collect();
    dirs.sort();
    dirs
}

fn agent_files_in(agents_dir: &Path) -> Vec<PathBuf> {
    if !agents_dir.is_dir() {
        return Vec::new();
    }
    let pattern = format!(
        "{}/*.md",
        glob::Pattern::escape(&agents_dir.to_string_lossy())
    );
    let mut files: Vec<PathBuf> = match glob::glob(&pattern) {
        Ok(paths) => paths
            .filter_map(|p| p.ok())
            .filter(|p| p.is_file())
            .collect(),
        Err(e) => {
            debug!("Bad agent glob {}: {}", pattern, e);
            Vec::new()
        }
    };
    files.sort();
    files
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn write(root: &Path, rel: &str, content: &str) {
        let path = root.join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    }

    #[test]
    fn test_missing_plugins_dir_is_empty_scan() {
        let dir = TempDir::new().unwrap();
        let scan = Collector::new(dir.path()).scan();
        assert!(scan.assets.is_empty());
        assert!(scan.nodes().is_empty());
    }

    #[test]
    fn test_metadata_md_takes_precedence() {
        let dir = TempDir::new().unwrap();
        write(
            dir.path(),
            "plugins/devops/skills/deploy/metadata.md",
            "---\nname: deploy\nrequires: [build]\n---\n",
        );
        write(
            dir.path(),
            "plugins/devops/skills/deploy/SKILL.md",
            "---\nname: deploy\nrequires: [other]\n---\n",
        );
        let scan = Collector::new(dir.path()).scan();
        assert_eq!(scan.assets.len(), 1);
        assert_eq!(scan.assets[0].source_file_name(), METADATA_FILE);
        assert_eq!(scan.assets[0].metadata.requires, vec!["build"]);
    }

    #[test]
    fn test_id_falls_back_to_dir_name() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "plugins/p/skills/unnamed/SKILL.md", "no frontmatter");
        let nodes = Collector::new(dir.path()).scan().nodes();
        let node = nodes.get("unnamed").unwrap();
        assert!(node.requires.is_empty());
        assert!(!node.deprecated);
    }

    #[test]
    fn test_skill_dir_without_documents_is_skipped() {
        let dir = TempDir::new().unwrap();
        fs::create_dir_all(dir.path().join("plugins/p/skills/empty")).unwrap();
        write(dir.path(), "plugins/p/skills/real/SKILL.md", "---\nname: real\n---\n");
        let scan = Collector::new(dir.path()).scan();
        assert_eq!(scan.assets.len(), 1);
        assert_eq!(Collector::new(dir.path()).skill_dirs().len(), 2);
    }

    #[test]
    fn test_scan_order_is_lexicographic() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "plugins/zeta/skills/a/SKILL.md", "---\nname: z-a\n---\n");
        write(dir.path(), "plugins/alpha/skills/b/SKILL.md", "---\nname: a-b\n---\n");
        write(dir.path(), "plugins/alpha/skills/a/SKILL.md", "---\nname: a-a\n---\n");
        write(dir.path(), "plugins/alpha/agents/helper.md", "---\nname: helper\n---\n");
        let scan = Collector::new(dir.path()).scan();
        let ids: Vec<&str> = scan.assets.iter().map(|a| a.id()).collect();
        assert_eq!(ids, vec!["a-a", "a-b", "helper", "z-a"]);
        assert_eq!(scan.plugins.len(), 2);
    }

    #[test]
    fn test_agents_use_file_stem() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "plugins/p/agents/reviewer.md", "# Reviewer\n");
        write(dir.path(), "plugins/p/agents/notes.txt", "ignored");
        let scan = Collector::new(dir.path()).scan();
        let agents: Vec<&Asset> = scan.agents().collect();
        assert_eq!(agents.len(), 1);
        assert_eq!(agents[0].id(), "reviewer");
        assert_eq!(agents[0].relative_path(), "plugins/p/agents/reviewer.md");
    }

    #[test]
    fn test_deprecated_flag() {
        let dir = TempDir::new().unwrap();
        write(
            dir.path(),
            "plugins/p/skills/old/SKILL.md",
            "---\nname: old\nstatus: deprecated\n---\n",
        );
        let nodes = Collector::new(dir.path()).scan().nodes();
        assert!(nodes.get("old").unwrap().deprecated);
    }

    #[test]
    fn test_collision_last_write_wins() {
        let dir = TempDir::new().unwrap();
        write(
            dir.path(),
            "plugins/a/skills/x/SKILL.md",
            "---\nname: shared\nrequires: [first]\n---\n",
        );
        write(
            dir.path(),
            "plugins/b/skills/y/SKILL.md",
            "---\nname: shared\nrequires: [second]\n---\n",
        );
        let nodes = Collector::new(dir.path()).scan().nodes();
        assert_eq!(nodes.len(), 1);
        assert_eq!(nodes.get("shared").unwrap().requires, vec!["second"]);
        assert_eq!(nodes.collisions().len(), 1);
        assert!(nodes.collisions()[0].kept.ends_with("plugins/b/skills/y/SKILL.md"));
        assert!(nodes.collisions()[0]
            .replaced
            .ends_with("plugins/a/skills/x/SKILL.md"));
    }
}
