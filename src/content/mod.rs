//! Revision content handling: primary-document extraction and retrying.

pub mod error;
pub mod extract;
pub mod retry;

pub use error::ExtractError;
pub use extract::{ArchiveExtractor, DocumentExtractor, FileKind};
pub use retry::RetryScheduler;

/// Text of one revision's primary document, or the fact that none could
/// be obtained.
///
/// An absent document covers every recoverable failure upstream: the path
/// does not exist at that revision, the container is malformed, or
/// extraction kept coming back empty.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExtractedDocument {
    text: Option<String>,
}

impl ExtractedDocument {
    /// Creates a present document with the given text.
    pub fn present(text: impl Into<String>) -> Self {
        Self {
            text: Some(text.into()),
        }
    }

    /// Creates an absent document.
    pub const fn absent() -> Self {
        Self { text: None }
    }

    /// Returns true if extraction produced a document (possibly empty).
    pub fn is_present(&self) -> bool {
        self.text.is_some()
    }

    /// Returns true if the document is present and has at least one byte.
    pub fn has_content(&self) -> bool {
        self.text.as_deref().is_some_and(|text| !text.is_empty())
    }

    /// Returns the document text if present.
    pub fn text(&self) -> Option<&str> {
        self.text.as_deref()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn absent_document_has_no_text() {
        let doc = ExtractedDocument::absent();
        assert!(!doc.is_present());
        assert!(!doc.has_content());
        assert_eq!(doc.text(), None);
    }

    #[test]
    fn empty_present_document_has_no_content() {
        let doc = ExtractedDocument::present("");
        assert!(doc.is_present());
        assert!(!doc.has_content());
        assert_eq!(doc.text(), Some(""));
    }

    #[test]
    fn present_document_round_trips_text() {
        let doc = ExtractedDocument::present("<workbook/>");
        assert!(doc.has_content());
        assert_eq!(doc.text(), Some("<workbook/>"));
    }
}
