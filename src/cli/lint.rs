use std::path::Path;

use anyhow::{bail, Result};
use tracing::debug;

use crate::collector::Collector;
use crate::config::Config;
use crate::lint::SkillLinter;
use crate::render::Palette;

pub fn run(root: &Path, config: &Config) -> Result<()> {
    if !root.is_dir() {
        bail!("Factory root not found: {}", root.display());
    }

    let collector = Collector::new(root);
    let scan = collector.scan();
    let linter = SkillLinter::new(&config.lint, config.graph.max_depth_warn)?;
    let report = linter.lint(&collector, &scan)?;
    for issue in report.issues() {
        debug!("{} [{}] {}", issue.severity, issue.category, issue.message);
    }

    println!("{}", report.render(Palette::new(config.display.color)));

    let errors = report.effective_errors();
    if errors > 0 {
        bail!("{} lint error(s) found", errors);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_run_root_not_found() {
        let result = run(Path::new("/tmp/nonexistent-factory-root-xyz"), &Config::default());
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("not found"));
    }

    #[test]
    fn test_run_reports_errors() {
        let dir = TempDir::new().unwrap();
        let skill = dir.path().join("plugins/p/skills/broken");
        fs::create_dir_all(&skill).unwrap();
        fs::write(skill.join("SKILL.md"), "---\nrequires: [ghost]\n---\n").unwrap();
        let err = run(dir.path(), &Config::default()).unwrap_err();
        assert!(err.to_string().contains("lint error(s) found"));
    }

    #[test]
    fn test_run_strict_escalates_warnings() {
        let dir = TempDir::new().unwrap();
        let skill = dir.path().join("plugins/p/skills/tiny");
        fs::create_dir_all(&skill).unwrap();
        fs::write(
            skill.join("SKILL.md"),
            "---\nname: tiny\ndescription: short\n---\n## Step 1\n",
        )
        .unwrap();

        let mut config = Config::default();
        assert!(run(dir.path(), &config).is_ok());
        config.lint.strict = true;
        assert!(run(dir.path(), &config).is_err());
    }
}
