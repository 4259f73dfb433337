//! Noise-filtered line diffs of workbook documents.

pub mod generate;
pub mod normalize;

pub use generate::{DiffGenerator, DiffResult, NEW_LABEL, OLD_LABEL};
pub use normalize::{normalize, NormalizedText, RedactionRule, REDACTED, REDACTION_RULES};
