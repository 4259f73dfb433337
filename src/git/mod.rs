//! Git access: changed-file listing and revision content.

pub mod changes;
pub mod repository;

pub use changes::{
    is_tracked_workbook, ChangeKind, ChangeLister, ContentFetcher, FileChange, TRACKED_PATTERNS,
};
pub use repository::GitRepository;
