//! Markdown rendering of per-file sections.

pub mod markdown;
pub mod section;

pub use section::{BodyPart, FileSection, SectionBody, SectionRenderer};

/// Number of non-blank lines shown in a section preview.
pub const PREVIEW_LINES: usize = 6;

/// Shown instead of a preview when neither revision has content.
pub const NO_PREVIEW: &str = "_(no preview available)_";

/// Body of an added or removed file whose document is absent or empty.
pub const NO_CONTENT: &str = "_(no content)_";

/// Body of a modified file whose normalized revisions are identical.
pub const NO_MEANINGFUL_CHANGES: &str = "_No meaningful changes after normalization._";

/// Body of a modified file when one revision could not be extracted.
pub const EXTRACTION_FAILED: &str = "_(could not extract content)_";

/// Body of a modified file when the diff engine failed.
pub const DIFF_FAILED: &str = "_(diff could not be computed)_";
