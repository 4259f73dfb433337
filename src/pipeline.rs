//! End-to-end processing of one pull request.
//!
//! Changed workbooks are processed one at a time, in listing order. A file
//! that cannot be read or extracted degrades to a placeholder section; only
//! failing to list changes or an unusable block budget aborts the run.

use anyhow::{Context, Result};
use tracing::{debug, info, warn};

use crate::config::DiffConfig;
use crate::content::{ArchiveExtractor, ExtractedDocument, RetryScheduler};
use crate::git::{is_tracked_workbook, ChangeKind, ChangeLister, ContentFetcher, FileChange};
use crate::pack::BlockPacker;
use crate::render::SectionRenderer;

/// Section emitted when no tracked workbook changed.
pub const NO_WORKBOOK_CHANGES: &str = "_No Tableau workbook files changed in this pull request._\n";

/// The pull request being summarized.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PullRequestRef {
    /// Pull request number or other identifier shown in the header.
    pub id: String,
    /// Base revision.
    pub base: String,
    /// Head revision.
    pub head: String,
}

impl PullRequestRef {
    /// Creates a pull request reference.
    pub fn new(id: impl Into<String>, base: impl Into<String>, head: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            base: base.into(),
            head: head.into(),
        }
    }
}

/// Returns the first line of every block.
pub fn block_header(tag: &str, id: &str) -> String {
    format!("{tag} {id}")
}

/// Returns the introduction repeated under every block header.
pub fn block_intro(id: &str) -> String {
    format!(
        "Automated Tableau diff summary for PR {id}.\n\n\
         This comment is managed by twb-diff and is rewritten on every run.\n"
    )
}

/// Returns the trailer appended to the last block.
pub fn block_trailer(tag: &str) -> String {
    format!("\n---\n_Search for `{tag}` to find every part of this summary._\n")
}

/// Runs listing, extraction, diffing, rendering and packing for a source
/// that can list changes and read revision content.
pub struct DiffPipeline<S> {
    source: S,
    config: DiffConfig,
    extractor: ArchiveExtractor,
    scheduler: RetryScheduler,
    renderer: SectionRenderer,
}

impl<S> std::fmt::Debug for DiffPipeline<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DiffPipeline")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl<S> DiffPipeline<S>
where
    S: ChangeLister + ContentFetcher,
{
    /// Creates a pipeline reading from `source`.
    pub fn new(source: S, config: DiffConfig) -> Self {
        let scheduler = RetryScheduler::new(config.retry.clone());
        Self::with_scheduler(source, config, scheduler)
    }

    /// Creates a pipeline with a custom retry scheduler.
    pub fn with_scheduler(source: S, config: DiffConfig, scheduler: RetryScheduler) -> Self {
        let renderer = SectionRenderer::new(&config);
        Self {
            source,
            config,
            extractor: ArchiveExtractor::new(),
            scheduler,
            renderer,
        }
    }

    /// Returns the configuration.
    pub fn config(&self) -> &DiffConfig {
        &self.config
    }

    /// Lists changed workbook files between `base` and `head`.
    pub fn tracked_changes(&self, base: &str, head: &str) -> Result<Vec<FileChange>> {
        let changes = self
            .source
            .changed_files(base, head)
            .with_context(|| format!("Failed to list changed files between {base} and {head}"))?;
        let total = changes.len();
        let tracked: Vec<_> = changes
            .into_iter()
            .filter(|c| is_tracked_workbook(&c.path))
            .collect();
        debug!(total, tracked = tracked.len(), "Filtered changed files");
        Ok(tracked)
    }

    /// Renders one Markdown section per changed workbook.
    ///
    /// When no workbook changed, a single fallback section is returned.
    pub fn sections(&self, pr: &PullRequestRef) -> Result<Vec<String>> {
        let changes = self.tracked_changes(&pr.base, &pr.head)?;
        if changes.is_empty() {
            info!(pr = %pr.id, "No workbook changes");
            return Ok(vec![NO_WORKBOOK_CHANGES.to_string()]);
        }

        Ok(changes
            .iter()
            .map(|change| self.render_change(change, pr))
            .collect())
    }

    /// Produces the output blocks for `pr`.
    ///
    /// The block budget is checked before any file is fetched.
    pub fn run(&self, pr: &PullRequestRef) -> Result<Vec<String>> {
        let packer = BlockPacker::new(
            &block_header(&self.config.tag, &pr.id),
            &block_intro(&pr.id),
            &block_trailer(&self.config.tag),
            self.config.max_block_bytes,
        )?;
        let sections = self.sections(pr)?;
        let blocks = packer.pack(&sections);
        info!(pr = %pr.id, sections = sections.len(), blocks = blocks.len(), "Built diff summary");
        Ok(blocks)
    }

    fn render_change(&self, change: &FileChange, pr: &PullRequestRef) -> String {
        info!(path = %change.path, kind = %change.kind, "Processing workbook");

        let old = if change.kind == ChangeKind::Added {
            ExtractedDocument::absent()
        } else {
            self.revision(change.base_path(), &pr.base)
        };
        let new = if change.kind == ChangeKind::Removed {
            ExtractedDocument::absent()
        } else {
            self.revision(&change.path, &pr.head)
        };

        self.renderer
            .render(&change.path, change.kind, &old, &new)
            .to_markdown()
    }

    fn revision(&self, path: &str, rev: &str) -> ExtractedDocument {
        match self.source.fetch(path, rev) {
            Ok(Some(bytes)) => {
                self.scheduler
                    .extract_with_retry(&self.extractor, &bytes, path, bytes.len())
            }
            Ok(None) => {
                warn!(path = %path, rev = %rev, "File not found at revision");
                ExtractedDocument::absent()
            }
            Err(e) => {
                warn!(path = %path, rev = %rev, error = %format!("{e:#}"), "Failed to fetch file");
                ExtractedDocument::absent()
            }
        }
    }
}
