//! Changed-file model and the collaborator traits the pipeline reads from.

use std::fmt;
use std::sync::LazyLock;

use anyhow::Result;
use globset::{GlobBuilder, GlobSet, GlobSetBuilder};
use serde::Serialize;

/// Glob patterns of files the pipeline diffs.
pub const TRACKED_PATTERNS: &[&str] = &["*.twb", "*.twbx"];

static TRACKED: LazyLock<GlobSet> = LazyLock::new(|| {
    let mut builder = GlobSetBuilder::new();
    for pattern in TRACKED_PATTERNS {
        builder.add(
            GlobBuilder::new(pattern)
                .case_insensitive(true)
                .literal_separator(false)
                .build()
                .unwrap(),
        );
    }
    builder.build().unwrap()
});

/// Returns true if `path` names a workbook the pipeline diffs.
pub fn is_tracked_workbook(path: &str) -> bool {
    TRACKED.is_match(path)
}

/// How a file changed between two revisions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ChangeKind {
    /// Present only in the head revision.
    Added,
    /// Present only in the base revision.
    Removed,
    /// Present in both revisions, possibly under a new name.
    Modified,
}

impl ChangeKind {
    /// Returns the lowercase label used in headings and JSON.
    pub fn label(self) -> &'static str {
        match self {
            Self::Added => "added",
            Self::Removed => "removed",
            Self::Modified => "modified",
        }
    }
}

impl fmt::Display for ChangeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// One changed file between two revisions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileChange {
    /// Repository-relative path, at the head revision for renames.
    pub path: String,
    /// Kind of change.
    pub kind: ChangeKind,
    /// Path at the base revision when the file was renamed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub previous_path: Option<String>,
}

impl FileChange {
    /// Creates a change record.
    pub fn new(path: impl Into<String>, kind: ChangeKind) -> Self {
        Self {
            path: path.into(),
            kind,
            previous_path: None,
        }
    }

    /// Records the base-revision path of a renamed file.
    pub fn renamed_from(mut self, previous_path: impl Into<String>) -> Self {
        self.previous_path = Some(previous_path.into());
        self
    }

    /// Returns the path to read at the base revision.
    pub fn base_path(&self) -> &str {
        self.previous_path.as_deref().unwrap_or(&self.path)
    }
}

/// Lists the files changed between two revisions.
pub trait ChangeLister {
    /// Returns the changed files in a stable order.
    fn changed_files(&self, base: &str, head: &str) -> Result<Vec<FileChange>>;
}

/// Reads file contents at a revision.
pub trait ContentFetcher {
    /// Returns the raw bytes of `path` at `rev`, or `None` when the revision
    /// does not contain the path.
    fn fetch(&self, path: &str, rev: &str) -> Result<Option<Vec<u8>>>;
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn tracks_workbook_suffixes() {
        assert!(is_tracked_workbook("Sales.twb"));
        assert!(is_tracked_workbook("dashboards/q1/Sales.twbx"));
        assert!(is_tracked_workbook("REPORT.TWB"));
        assert!(is_tracked_workbook("dir/Report.TwBx"));
    }

    #[test]
    fn ignores_other_files() {
        assert!(!is_tracked_workbook("README.md"));
        assert!(!is_tracked_workbook("Sales.twb.bak"));
        assert!(!is_tracked_workbook("Sales.tds"));
        assert!(!is_tracked_workbook("twb"));
    }

    #[test]
    fn kind_serializes_lowercase() {
        let change = FileChange::new("a.twb", ChangeKind::Modified);
        let json = serde_json::to_string(&change).unwrap();
        assert_eq!(json, r#"{"path":"a.twb","kind":"modified"}"#);
    }

    #[test]
    fn rename_keeps_base_path() {
        let change = FileChange::new("new.twb", ChangeKind::Modified).renamed_from("old.twb");
        assert_eq!(change.base_path(), "old.twb");
        assert_eq!(FileChange::new("a.twb", ChangeKind::Added).base_path(), "a.twb");
        let json = serde_json::to_string(&change).unwrap();
        assert!(json.contains(r#""previous_path":"old.twb""#));
    }

    #[test]
    fn kind_display_matches_label() {
        for kind in [ChangeKind::Added, ChangeKind::Removed, ChangeKind::Modified] {
            assert_eq!(kind.to_string(), kind.label());
        }
    }
}
