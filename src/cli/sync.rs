use std::path::Path;

use anyhow::{bail, Result};
use tracing::info;

use crate::collector::Collector;
use crate::config::Config;
use crate::registry::RegistrySync;
use crate::render::Palette;

/// Regenerate the registry and README tables. `dry_run` reports without writing.
pub fn run(root: &Path, config: &Config, dry_run: bool) -> Result<()> {
    if !root.is_dir() {
        bail!("Factory root not found: {}", root.display());
    }
    let p = Palette::new(config.display.color);

    let scan = Collector::new(root).scan();
    let sync = RegistrySync::new(root, &config.registry);
    let plan = sync.plan(&scan)?;

    println!("🔍 Scanning {}", root.display());
    println!("   skills: {}, agents: {}", plan.skills(), plan.agents());

    for update in &plan.updates {
        let state = if update.changed { "updated" } else { "unchanged" };
        let verb = if dry_run && update.changed {
            "would be updated"
        } else {
            state
        };
        println!("  {}  {} {}", p.ok("✓"), update.path.display(), verb);
    }
    for skipped in &plan.skipped {
        println!("  {}  {} not found, skipped", p.warn("⚠"), skipped.display());
    }

    if dry_run {
        info!("Dry run: no files written");
    } else {
        let written = plan.apply()?;
        info!("Wrote {} file(s)", written);
    }

    for warning in &plan.warnings {
        println!("  {}  {}", p.warn("⚠"), warning);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    const REGISTRY: &str = "# Registry\n\n## Registry Table\n\nold\n\n---\n\n## Statistics\n\nold\n";

    fn factory() -> TempDir {
        let dir = TempDir::new().unwrap();
        let skill = dir.path().join("plugins/devops/skills/deploy");
        fs::create_dir_all(&skill).unwrap();
        fs::write(
            skill.join("SKILL.md"),
            "---\nname: deploy\ndescription: Deploys things\ntags: [ci]\n---\n",
        )
        .unwrap();
        fs::write(dir.path().join("registry.md"), REGISTRY).unwrap();
        dir
    }

    #[test]
    fn test_dry_run_leaves_files_alone() {
        let dir = factory();
        run(dir.path(), &Config::default(), true).unwrap();
        assert_eq!(
            fs::read_to_string(dir.path().join("registry.md")).unwrap(),
            REGISTRY
        );
    }

    #[test]
    fn test_sync_writes_registry() {
        let dir = factory();
        run(dir.path(), &Config::default(), false).unwrap();
        let text = fs::read_to_string(dir.path().join("registry.md")).unwrap();
        assert!(text.contains("| deploy | skill | devops | sonnet | `ci` | v1.0 | Deploys things |"));
        assert!(text.contains("- **Skills**: 1"));
    }

    #[test]
    fn test_missing_section_fails() {
        let dir = factory();
        fs::write(dir.path().join("registry.md"), "# Registry without sections\n").unwrap();
        let err = run(dir.path(), &Config::default(), false).unwrap_err();
        assert!(err.to_string().contains("## Registry Table"));
    }
}
