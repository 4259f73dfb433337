//! Line-based unified diffs between two workbook texts.
//!
//! Both sides are normalized first, then handed to libgit2's patch engine
//! as in-memory buffers. The output is labeled with fixed placeholder
//! names; the real path travels with the rendered section instead.

use std::path::Path;

use anyhow::{Context, Result};
use git2::{DiffOptions, Patch};

use crate::diff::normalize::normalize;

/// Placeholder name for the base side of every diff.
pub const OLD_LABEL: &str = "old";

/// Placeholder name for the head side of every diff.
pub const NEW_LABEL: &str = "new";

/// Ordered unified-diff lines without terminators.
///
/// Lines start with `---`/`+++` (labels), `@@` (hunk header), ` `
/// (context), `+` (addition) or `-` (deletion). An empty result means the
/// normalized texts are identical.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DiffResult {
    lines: Vec<String>,
}

impl DiffResult {
    /// Returns true if there are no differences.
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Returns the number of diff lines.
    pub fn len(&self) -> usize {
        self.lines.len()
    }

    /// Returns the diff lines.
    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    /// Consumes the result and returns the diff lines.
    pub fn into_lines(self) -> Vec<String> {
        self.lines
    }
}

/// Computes unified diffs with a fixed amount of context.
#[derive(Debug, Clone, Copy)]
pub struct DiffGenerator {
    context_lines: u32,
}

impl Default for DiffGenerator {
    fn default() -> Self {
        Self::new(crate::config::DEFAULT_CONTEXT_LINES)
    }
}

impl DiffGenerator {
    /// Creates a generator showing `context_lines` unchanged lines around
    /// each change.
    pub fn new(context_lines: u32) -> Self {
        Self { context_lines }
    }

    /// Diffs two texts after normalizing both.
    ///
    /// Empty input on either side is zero lines, producing an all-addition
    /// or all-deletion diff.
    pub fn diff(&self, old_text: &str, new_text: &str) -> Result<DiffResult> {
        let old = normalize(old_text);
        let new = normalize(new_text);
        if old == new {
            return Ok(DiffResult::default());
        }

        let mut opts = DiffOptions::new();
        opts.context_lines(self.context_lines)
            .interhunk_lines(0)
            .minimal(true)
            .force_text(true);

        let patch = Patch::from_buffers(
            old.as_str().as_bytes(),
            Some(Path::new(OLD_LABEL)),
            new.as_str().as_bytes(),
            Some(Path::new(NEW_LABEL)),
            Some(&mut opts),
        )
        .context("Failed to compute workbook diff")?;

        if patch.num_hunks() == 0 {
            return Ok(DiffResult::default());
        }

        let mut lines = vec![format!("--- {OLD_LABEL}"), format!("+++ {NEW_LABEL}")];
        for hunk_idx in 0..patch.num_hunks() {
            let (hunk, line_count) = patch
                .hunk(hunk_idx)
                .with_context(|| format!("Failed to read diff hunk {hunk_idx}"))?;
            lines.push(format!(
                "@@ -{} +{} @@",
                format_range(hunk.old_start(), hunk.old_lines()),
                format_range(hunk.new_start(), hunk.new_lines())
            ));

            for line_idx in 0..line_count {
                let line = patch
                    .line_in_hunk(hunk_idx, line_idx)
                    .with_context(|| format!("Failed to read line {line_idx} of hunk {hunk_idx}"))?;
                // Skip end-of-file newline markers.
                let prefix = match line.origin() {
                    ' ' | '+' | '-' => line.origin(),
                    _ => continue,
                };
                let content = String::from_utf8_lossy(line.content());
                let content = content.strip_suffix('\n').unwrap_or(&content);
                lines.push(format!("{prefix}{content}"));
            }
        }

        Ok(DiffResult { lines })
    }
}

/// Formats one side of a hunk range the way `diff -u` does.
fn format_range(start: u32, count: u32) -> String {
    if count == 1 {
        start.to_string()
    } else {
        format!("{start},{count}")
    }
}
