//! Integration tests for configuration loading
//! Tests the lookup order:
//! - Explicit --config path
//! - <root>/skill-factory.toml
//! - User config directory
//! - Built-in defaults

use anyhow::Result;
use serial_test::serial;
use skill_factory::config::{Config, CONFIG_FILE};
use std::env;
use std::fs;
use tempfile::TempDir;

/// Point the user config directory at `dir` for the duration of `f`.
fn with_config_home<T>(dir: &TempDir, f: impl FnOnce() -> T) -> T {
    let previous = env::var_os("XDG_CONFIG_HOME");
    env::set_var("XDG_CONFIG_HOME", dir.path());
    let result = f();
    match previous {
        Some(value) => env::set_var("XDG_CONFIG_HOME", value),
        None => env::remove_var("XDG_CONFIG_HOME"),
    }
    result
}

#[test]
#[serial]
fn test_defaults_when_nothing_is_configured() -> Result<()> {
    let root = TempDir::new()?;
    let home = TempDir::new()?;
    let config = with_config_home(&home, || Config::load(root.path(), None))?;
    assert_eq!(config, Config::default());
    Ok(())
}

#[test]
#[serial]
fn test_local_file_beats_user_config() -> Result<()> {
    let root = TempDir::new()?;
    let home = TempDir::new()?;
    fs::write(root.path().join(CONFIG_FILE), "[graph]\nmax_depth_warn = 4\n")?;
    fs::create_dir_all(home.path().join("skill-factory"))?;
    fs::write(
        home.path().join("skill-factory/config.toml"),
        "[graph]\nmax_depth_warn = 9\n",
    )?;

    let config = with_config_home(&home, || Config::load(root.path(), None))?;
    assert_eq!(config.graph.max_depth_warn, 4);
    Ok(())
}

#[cfg(target_os = "linux")]
#[test]
#[serial]
fn test_user_config_dir_is_used() -> Result<()> {
    let root = TempDir::new()?;
    let home = TempDir::new()?;
    fs::create_dir_all(home.path().join("skill-factory"))?;
    fs::write(
        home.path().join("skill-factory/config.toml"),
        "[display]\ncolor = false\n[registry]\ndefault_model = \"haiku\"\n",
    )?;

    let config = with_config_home(&home, || Config::load(root.path(), None))?;
    assert!(!config.display.color);
    assert_eq!(config.registry.default_model, "haiku");
    assert_eq!(config.graph.max_depth_warn, 3);
    Ok(())
}

#[cfg(target_os = "linux")]
#[test]
#[serial]
fn test_broken_user_config_falls_back_to_defaults() -> Result<()> {
    let root = TempDir::new()?;
    let home = TempDir::new()?;
    fs::create_dir_all(home.path().join("skill-factory"))?;
    fs::write(home.path().join("skill-factory/config.toml"), "not = [valid")?;

    let config = with_config_home(&home, || Config::load(root.path(), None))?;
    assert_eq!(config, Config::default());
    Ok(())
}

#[test]
#[serial]
fn test_explicit_path_wins() -> Result<()> {
    let root = TempDir::new()?;
    let other = TempDir::new()?;
    fs::write(root.path().join(CONFIG_FILE), "[lint]\nstrict = false\n")?;
    let explicit = other.path().join("custom.toml");
    fs::write(
        &explicit,
        "[lint]\nstrict = true\nknown_teams = [\"ops-team\"]\n",
    )?;

    let config = Config::load(root.path(), explicit.to_str())?;
    assert!(config.lint.strict);
    assert_eq!(config.lint.known_teams, vec!["ops-team"]);
    assert_eq!(config.lint.min_description_len, 20);
    Ok(())
}

#[test]
fn test_team_execution_override() -> Result<()> {
    let config: Config = toml::from_str(
        "[registry.team_execution]\n\"review-team\" = \"**Sequential**\"\n",
    )?;
    assert_eq!(
        config.registry.team_execution.get("review-team").map(String::as_str),
        Some("**Sequential**")
    );
    // A table replaces the default map rather than merging into it
    assert_eq!(config.registry.team_execution.len(), 1);
    Ok(())
}
