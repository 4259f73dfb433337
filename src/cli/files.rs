//! The `files` command.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;

use crate::git::GitRepository;
use crate::pipeline::DiffPipeline;

/// Files command options.
#[derive(Parser)]
pub struct FilesCommand {
    /// Base revision (branch, tag or commit).
    #[arg(long, env = "BASE_BRANCH")]
    pub base: String,

    /// Head revision (branch, tag or commit).
    #[arg(long, env = "HEAD_BRANCH")]
    pub head: String,

    /// Path to the git repository.
    #[arg(long, default_value = ".")]
    pub repo: PathBuf,
}

impl FilesCommand {
    /// Executes the files command.
    pub fn execute(self) -> Result<()> {
        let config = super::load_config()?;
        let repo = GitRepository::open_at(&self.repo)?;
        let changes = DiffPipeline::new(repo, config).tracked_changes(&self.base, &self.head)?;

        let json = serde_json::to_string_pretty(&changes).context("Failed to serialize changes")?;
        println!("{json}");
        Ok(())
    }
}
