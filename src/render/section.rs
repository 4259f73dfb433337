//! Per-file section rendering.

use std::fmt;

use tracing::warn;

use crate::config::DiffConfig;
use crate::content::ExtractedDocument;
use crate::diff::DiffGenerator;
use crate::git::ChangeKind;
use crate::render::markdown::{clean_line, code_span, display_line, fenced};
use crate::render::{
    DIFF_FAILED, EXTRACTION_FAILED, NO_CONTENT, NO_MEANINGFUL_CHANGES, NO_PREVIEW, PREVIEW_LINES,
};

/// Fence language of body parts.
const BODY_LANG: &str = "diff";

/// Fence language of previews.
const PREVIEW_LANG: &str = "xml";

/// One fenced slice of a section body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BodyPart {
    /// 1-based part number.
    pub index: usize,
    /// Number of parts in the body.
    pub total: usize,
    /// Body lines, each already prefixed and cleaned.
    pub lines: Vec<String>,
}

/// Body of a rendered section.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SectionBody {
    /// Fixed marker text, rendered as ordinary Markdown.
    Placeholder(&'static str),
    /// One or more line-bounded, independently fenced parts.
    Parts(Vec<BodyPart>),
}

/// Rendered output for one changed file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileSection {
    /// Repository-relative path.
    pub path: String,
    /// Kind of change.
    pub kind: ChangeKind,
    /// Up to [`PREVIEW_LINES`] trimmed, non-blank lines.
    pub preview: Vec<String>,
    /// Section body.
    pub body: SectionBody,
}

impl FileSection {
    /// Returns the section heading line.
    pub fn title(&self) -> String {
        format!("### {} ({})", code_span(&self.path), self.kind)
    }

    /// Renders the section as Markdown, ending with a blank line.
    pub fn to_markdown(&self) -> String {
        let mut out = String::new();
        out.push_str(&self.title());
        out.push_str("\n\n**Preview:**\n\n");
        if self.preview.is_empty() {
            out.push_str(NO_PREVIEW);
            out.push('\n');
        } else {
            out.push_str(&fenced(PREVIEW_LANG, &self.preview));
        }
        out.push('\n');

        match &self.body {
            SectionBody::Placeholder(text) => {
                out.push_str(text);
                out.push_str("\n\n");
            }
            SectionBody::Parts(parts) => {
                let line_count: usize = parts.iter().map(|p| p.lines.len()).sum();
                out.push_str(&format!(
                    "<details>\n<summary>{} ({line_count} lines)</summary>\n\n",
                    summary_label(self.kind)
                ));
                for part in parts {
                    out.push_str(&format!("**Part {}/{}**\n\n", part.index, part.total));
                    out.push_str(&fenced(BODY_LANG, &part.lines));
                    out.push('\n');
                }
                out.push_str("</details>\n\n");
            }
        }
        out
    }
}

impl fmt::Display for FileSection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_markdown())
    }
}

fn summary_label(kind: ChangeKind) -> &'static str {
    match kind {
        ChangeKind::Added => "Added content",
        ChangeKind::Removed => "Removed content",
        ChangeKind::Modified => "Changes",
    }
}

/// Builds [`FileSection`]s from extracted revisions.
#[derive(Debug, Clone)]
pub struct SectionRenderer {
    max_lines_per_subpart: usize,
    generator: DiffGenerator,
}

impl SectionRenderer {
    /// Creates a renderer from the pipeline configuration.
    pub fn new(config: &DiffConfig) -> Self {
        Self {
            max_lines_per_subpart: config.max_lines_per_subpart.max(1),
            generator: DiffGenerator::new(config.context_lines),
        }
    }

    /// Renders one file's outcome.
    pub fn render(
        &self,
        path: &str,
        kind: ChangeKind,
        old: &ExtractedDocument,
        new: &ExtractedDocument,
    ) -> FileSection {
        let body = match kind {
            ChangeKind::Added => self.whole_document_body(new, '+'),
            ChangeKind::Removed => self.whole_document_body(old, '-'),
            ChangeKind::Modified => self.diff_body(path, old, new),
        };

        FileSection {
            path: path.to_string(),
            kind,
            preview: preview_lines(new, old),
            body,
        }
    }

    fn whole_document_body(&self, doc: &ExtractedDocument, prefix: char) -> SectionBody {
        match doc.text() {
            Some(text) if !text.is_empty() => {
                let lines = text
                    .lines()
                    .map(|line| format!("{prefix}{}", clean_line(line)))
                    .collect();
                self.split_parts(lines)
            }
            _ => SectionBody::Placeholder(NO_CONTENT),
        }
    }

    fn diff_body(&self, path: &str, old: &ExtractedDocument, new: &ExtractedDocument) -> SectionBody {
        let (Some(old_text), Some(new_text)) = (old.text(), new.text()) else {
            return SectionBody::Placeholder(EXTRACTION_FAILED);
        };

        match self.generator.diff(old_text, new_text) {
            Ok(diff) if diff.is_empty() => SectionBody::Placeholder(NO_MEANINGFUL_CHANGES),
            Ok(diff) => {
                let lines = diff.into_lines().iter().map(|l| clean_line(l)).collect();
                self.split_parts(lines)
            }
            Err(err) => {
                warn!(path = %path, error = %err, "Diff generation failed");
                SectionBody::Placeholder(DIFF_FAILED)
            }
        }
    }

    /// Splits body lines into consecutive parts of at most
    /// `max_lines_per_subpart` lines.
    fn split_parts(&self, lines: Vec<String>) -> SectionBody {
        let total = lines.len().div_ceil(self.max_lines_per_subpart).max(1);
        let parts = lines
            .chunks(self.max_lines_per_subpart)
            .enumerate()
            .map(|(i, chunk)| BodyPart {
                index: i + 1,
                total,
                lines: chunk.to_vec(),
            })
            .collect();
        SectionBody::Parts(parts)
    }
}

/// Returns the first non-blank, trimmed lines of the head revision, or of
/// the base revision when the head has no content.
fn preview_lines(new: &ExtractedDocument, old: &ExtractedDocument) -> Vec<String> {
    let source = [new, old]
        .into_iter()
        .find(|doc| doc.has_content())
        .and_then(ExtractedDocument::text)
        .unwrap_or("");

    source
        .lines()
        .map(display_line)
        .map(|line| line.trim().to_string())
        .filter(|line| !line.is_empty())
        .take(PREVIEW_LINES)
        .collect()
}
