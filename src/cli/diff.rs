//! The `diff` command.

use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use tracing::debug;

use crate::delivery::{DeliverySink, PartsFileSink, StdoutSink};
use crate::git::GitRepository;
use crate::pipeline::{DiffPipeline, PullRequestRef};

/// Diff command options.
#[derive(Parser)]
pub struct DiffCommand {
    /// Base revision (branch, tag or commit).
    #[arg(long, env = "BASE_BRANCH")]
    pub base: String,

    /// Head revision (branch, tag or commit).
    #[arg(long, env = "HEAD_BRANCH")]
    pub head: String,

    /// Pull request number shown in every block header.
    #[arg(long, env = "PR_NUMBER", default_value = "local")]
    pub pr: String,

    /// Path to the git repository.
    #[arg(long, default_value = ".")]
    pub repo: PathBuf,

    /// Parts file to write; blocks go to stdout when omitted.
    #[arg(long, short)]
    pub output: Option<PathBuf>,
}

impl DiffCommand {
    /// Executes the diff command.
    pub fn execute(self) -> Result<()> {
        let config = super::load_config()?;
        let repo = GitRepository::open_at(&self.repo)?;
        debug!(repo = %self.repo.display(), base = %self.base, head = %self.head, "Running diff");

        let pr = PullRequestRef::new(self.pr, self.base, self.head);
        let blocks = DiffPipeline::new(repo, config).run(&pr)?;

        match self.output {
            Some(path) => PartsFileSink::new(path).deliver(&blocks),
            None => StdoutSink.deliver(&blocks),
        }
    }
}
