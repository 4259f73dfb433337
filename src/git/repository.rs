//! Git repository operations

use std::path::Path;

use anyhow::{Context, Result};
use git2::{Delta, DiffFindOptions, DiffOptions, ErrorCode, Repository, Tree};
use tracing::debug;

use crate::git::{ChangeKind, ChangeLister, ContentFetcher, FileChange};

/// Git repository wrapper
pub struct GitRepository {
    repo: Repository,
}

impl std::fmt::Debug for GitRepository {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GitRepository")
            .field("path", &self.repo.path())
            .finish()
    }
}

impl GitRepository {
    /// Opens the repository at `path`.
    pub fn open_at<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let repo = Repository::open(path)
            .with_context(|| format!("Not a git repository: {}", path.display()))?;
        debug!(path = %path.display(), "Opened repository");

        Ok(Self { repo })
    }

    /// Resolves a revision string (branch, tag, hash, `HEAD~1`, ...) to its tree.
    fn tree_at(&self, rev: &str) -> Result<Tree<'_>> {
        let obj = self
            .repo
            .revparse_single(rev)
            .with_context(|| format!("Failed to resolve revision: {rev}"))?;
        obj.peel_to_tree()
            .with_context(|| format!("Revision {rev} does not point to a tree"))
    }
}

impl ChangeLister for GitRepository {
    fn changed_files(&self, base: &str, head: &str) -> Result<Vec<FileChange>> {
        let base_tree = self.tree_at(base)?;
        let head_tree = self.tree_at(head)?;

        let mut opts = DiffOptions::new();
        opts.include_typechange(true);
        let mut diff = self
            .repo
            .diff_tree_to_tree(Some(&base_tree), Some(&head_tree), Some(&mut opts))
            .with_context(|| format!("Failed to diff {base}..{head}"))?;

        let mut find = DiffFindOptions::new();
        find.renames(true);
        diff.find_similar(Some(&mut find))
            .context("Failed to detect renames")?;

        let mut changes = Vec::new();
        for delta in diff.deltas() {
            let new_path = delta.new_file().path().map(path_to_string);
            let old_path = delta.old_file().path().map(path_to_string);

            let change = match delta.status() {
                Delta::Added | Delta::Copied => new_path.map(|p| FileChange::new(p, ChangeKind::Added)),
                Delta::Deleted => old_path.map(|p| FileChange::new(p, ChangeKind::Removed)),
                Delta::Modified | Delta::Typechange => {
                    new_path.map(|p| FileChange::new(p, ChangeKind::Modified))
                }
                Delta::Renamed => match (new_path, old_path) {
                    (Some(new), Some(old)) => {
                        Some(FileChange::new(new, ChangeKind::Modified).renamed_from(old))
                    }
                    (Some(new), None) => Some(FileChange::new(new, ChangeKind::Modified)),
                    _ => None,
                },
                other => {
                    debug!(status = ?other, "Skipping delta");
                    None
                }
            };
            changes.extend(change);
        }

        debug!(base = %base, head = %head, count = changes.len(), "Listed changed files");
        Ok(changes)
    }
}

impl ContentFetcher for GitRepository {
    fn fetch(&self, path: &str, rev: &str) -> Result<Option<Vec<u8>>> {
        let tree = self.tree_at(rev)?;

        let entry = match tree.get_path(Path::new(path)) {
            Ok(entry) => entry,
            Err(e) if e.code() == ErrorCode::NotFound => return Ok(None),
            Err(e) => {
                return Err(e).with_context(|| format!("Failed to look up {path} at {rev}"));
            }
        };

        let blob = self
            .repo
            .find_blob(entry.id())
            .with_context(|| format!("{path} at {rev} is not a file"))?;
        Ok(Some(blob.content().to_vec()))
    }
}

fn path_to_string(path: &Path) -> String {
    path.to_string_lossy().replace('\\', "/")
}
