//! CLI interface for twb-diff

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};

use crate::config::DiffConfig;
use crate::utils::Settings;

pub mod config;
pub mod diff;
pub mod files;

/// twb-diff: noise-filtered diffs of Tableau workbooks between two revisions
#[derive(Parser)]
#[command(name = "twb-diff")]
#[command(about = "Noise-filtered diffs of Tableau workbooks between two revisions", long_about = None)]
#[command(version)]
pub struct Cli {
    /// The main command to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Main command categories
#[derive(Subcommand)]
pub enum Commands {
    /// Builds the pull request diff summary
    Diff(diff::DiffCommand),
    /// Lists changed workbook files as JSON
    Files(files::FilesCommand),
    /// Configuration operations
    Config(config::ConfigCommand),
}

impl Cli {
    /// Execute the CLI command
    pub fn execute(self) -> Result<()> {
        match self.command {
            Commands::Diff(diff_cmd) => diff_cmd.execute(),
            Commands::Files(files_cmd) => files_cmd.execute(),
            Commands::Config(config_cmd) => config_cmd.execute(),
        }
    }
}

/// Loads the effective configuration from the environment and settings file.
pub(crate) fn load_config() -> Result<DiffConfig> {
    let settings = Settings::load().context("Failed to load settings")?;
    DiffConfig::from_env(&settings).context("Invalid configuration")
}
