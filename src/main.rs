use std::io;
use std::path::PathBuf;

use anyhow::Result;
use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::Shell;
use tracing_subscriber::EnvFilter;

use skill_factory::cli;
use skill_factory::config::Config;

#[derive(Parser)]
#[command(name = "skill-factory", version)]
#[command(about = "Dependency graph, linter and registry sync for skill and agent plugins", long_about = None)]
struct Cli {
    /// Factory root containing plugins/
    #[arg(long, global = true, default_value = ".")]
    root: PathBuf,

    /// Path to config file (defaults to ./skill-factory.toml or ~/.config/skill-factory/config.toml)
    #[arg(long, global = true)]
    config: Option<String>,

    /// Disable ANSI colors
    #[arg(long, global = true)]
    no_color: bool,

    /// Flag dependency chains at or beyond this depth (default: from config)
    #[arg(long, global = true)]
    max_depth: Option<usize>,

    /// Verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show the dependency tree (requires: → required skills)
    Tree {
        /// Show only the requirements of this skill or agent
        #[arg(long)]
        node: Option<String>,
    },

    /// Show what requires a skill, directly or transitively
    Reverse {
        /// Skill or agent id
        id: String,
    },

    /// Report dangling, deprecated, circular and deep dependencies
    Check,

    /// Lint every skill, agent and plugin manifest
    Lint {
        /// Treat warnings as errors
        #[arg(long)]
        strict: bool,
    },

    /// Regenerate registry.md and README.md tables
    Sync {
        /// Show what would change without writing
        #[arg(long)]
        dry_run: bool,
    },

    /// Print shell completions
    Completions {
        shell: Shell,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_writer(io::stderr)
        .init();

    if let Commands::Completions { shell } = cli.command {
        clap_complete::generate(shell, &mut Cli::command(), "skill-factory", &mut io::stdout());
        return Ok(());
    }

    let mut config = Config::load(&cli.root, cli.config.as_deref())?;
    if cli.no_color {
        config.display.color = false;
    }
    if let Some(depth) = cli.max_depth {
        config.graph.max_depth_warn = depth;
    }

    match cli.command {
        Commands::Tree { node } => cli::tree::run(&cli.root, &config, node.as_deref())?,
        Commands::Reverse { id } => cli::reverse::run(&cli.root, &config, &id)?,
        Commands::Check => cli::check::run(&cli.root, &config)?,
        Commands::Lint { strict } => {
            if strict {
                config.lint.strict = true;
            }
            cli::lint::run(&cli.root, &config)?
        }
        Commands::Sync { dry_run } => cli::sync::run(&cli.root, &config, dry_run)?,
        Commands::Completions { .. } => {}
    }

    Ok(())
}
