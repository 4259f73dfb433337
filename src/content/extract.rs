//! Primary-document extraction from plain workbooks and packaged containers.
//!
//! A plain workbook (`.twb`) is its own document. A packaged workbook
//! (`.twbx`) is a zip archive bundling the workbook with extracts and
//! images; the document of interest is the largest `.twb` entry, or the
//! largest `.xml` entry when no `.twb` is present.

use std::io::{Cursor, Read};

use tracing::{debug, warn};
use zip::ZipArchive;

use crate::content::error::ExtractError;
use crate::content::ExtractedDocument;

/// Suffix of a plain workbook file.
pub const PLAIN_SUFFIX: &str = ".twb";

/// Suffix of a packaged workbook container.
pub const CONTAINER_SUFFIX: &str = ".twbx";

/// Extension of the primary document inside a container.
const PRIMARY_ENTRY_EXTENSION: &str = ".twb";

/// Extension of generic markup entries used when no primary entry exists.
const MARKUP_ENTRY_EXTENSION: &str = ".xml";

/// Prefix that identifies raw bytes as a markup document.
const XML_DECLARATION: &[u8] = b"<?xml";

/// UTF-8 byte-order mark.
const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

/// Expansion ratio above which a declared entry size is not trusted for
/// preallocation.
const MAX_PREALLOC_RATIO: usize = 16;

/// Kind of workbook file, derived from its declared name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileKind {
    /// A plain markup document.
    Plain,
    /// A compressed multi-entry container.
    Container,
}

impl FileKind {
    /// Classifies a file by suffix (case-insensitive).
    pub fn from_name(name: &str) -> Option<Self> {
        let lower = name.to_ascii_lowercase();
        if lower.ends_with(CONTAINER_SUFFIX) {
            Some(Self::Container)
        } else if lower.ends_with(PLAIN_SUFFIX) {
            Some(Self::Plain)
        } else {
            None
        }
    }
}

/// Turns raw revision bytes into the text of the document to diff.
///
/// Implementations never fail: every problem is reported as an absent
/// document.
pub trait DocumentExtractor {
    /// Extracts the primary document from `raw`, using `declared_name` to
    /// decide how the bytes are interpreted.
    fn extract(&self, raw: &[u8], declared_name: &str) -> ExtractedDocument;
}

/// Extractor for `.twb` and `.twbx` files.
#[derive(Debug, Default, Clone, Copy)]
pub struct ArchiveExtractor;

impl ArchiveExtractor {
    /// Creates a new extractor.
    pub fn new() -> Self {
        Self
    }

    /// Extracts the primary document, reporting why when it cannot.
    pub fn try_extract(&self, raw: &[u8], declared_name: &str) -> Result<String, ExtractError> {
        match FileKind::from_name(declared_name) {
            Some(FileKind::Plain) => Ok(decode_lossy(raw)),
            Some(FileKind::Container) => extract_container(raw, declared_name),
            None => Err(ExtractError::UnsupportedKind(declared_name.to_string())),
        }
    }
}

impl DocumentExtractor for ArchiveExtractor {
    fn extract(&self, raw: &[u8], declared_name: &str) -> ExtractedDocument {
        match self.try_extract(raw, declared_name) {
            Ok(text) => ExtractedDocument::present(text),
            Err(err) => {
                warn!(path = %declared_name, error = %err, "Failed to extract workbook document");
                ExtractedDocument::absent()
            }
        }
    }
}

/// Archive entry metadata used for primary-document selection.
#[derive(Debug, Clone)]
struct EntryInfo {
    index: usize,
    name: String,
    size: u64,
}

fn extract_container(raw: &[u8], declared_name: &str) -> Result<String, ExtractError> {
    let mut archive = match ZipArchive::new(Cursor::new(raw)) {
        Ok(archive) => archive,
        Err(err) => {
            if looks_like_markup(raw) {
                debug!(path = %declared_name, "Container is plain markup, using raw bytes");
                return Ok(decode_lossy(raw));
            }
            return Err(ExtractError::NotAContainer(err));
        }
    };

    let mut entries = Vec::with_capacity(archive.len());
    for index in 0..archive.len() {
        let entry = archive.by_index_raw(index)?;
        if entry.is_dir() {
            continue;
        }
        entries.push(EntryInfo {
            index,
            name: entry.name().to_string(),
            size: entry.size(),
        });
    }

    let selected = select_primary_entry(&entries).ok_or(ExtractError::NoDocumentEntry)?;
    debug!(
        path = %declared_name,
        entry = %selected.name,
        bytes = selected.size,
        "Selected primary document from container"
    );

    let mut entry = archive.by_index(selected.index)?;
    let mut bytes = Vec::with_capacity(prealloc_capacity(entry.size(), raw.len()));
    entry.read_to_end(&mut bytes)?;
    Ok(decode_lossy(&bytes))
}

/// Picks the entry to treat as the primary document.
///
/// Prefers `.twb` entries, falling back to `.xml` entries. Among the
/// candidates the largest by uncompressed size wins; ties keep the first
/// entry encountered.
fn select_primary_entry(entries: &[EntryInfo]) -> Option<&EntryInfo> {
    largest_with_extension(entries, PRIMARY_ENTRY_EXTENSION)
        .or_else(|| largest_with_extension(entries, MARKUP_ENTRY_EXTENSION))
}

fn largest_with_extension<'a>(entries: &'a [EntryInfo], extension: &str) -> Option<&'a EntryInfo> {
    let mut best: Option<&EntryInfo> = None;
    for entry in entries
        .iter()
        .filter(|e| e.name.to_ascii_lowercase().ends_with(extension))
    {
        if best.map_or(true, |current| entry.size > current.size) {
            best = Some(entry);
        }
    }
    best
}

/// Returns true if the bytes start (after an optional BOM and leading
/// whitespace) with an XML declaration.
fn looks_like_markup(raw: &[u8]) -> bool {
    let body = raw.strip_prefix(UTF8_BOM).unwrap_or(raw);
    let start = body
        .iter()
        .position(|b| !b.is_ascii_whitespace())
        .unwrap_or(body.len());
    body[start..].starts_with(XML_DECLARATION)
}

/// Returns the buffer size to reserve for an entry declaring `declared`
/// uncompressed bytes inside a container of `container_len` bytes.
fn prealloc_capacity(declared: u64, container_len: usize) -> usize {
    let cap = container_len.saturating_mul(MAX_PREALLOC_RATIO);
    usize::try_from(declared).map_or(cap, |size| size.min(cap))
}

/// Decodes UTF-8, replacing invalid sequences with U+FFFD.
fn decode_lossy(bytes: &[u8]) -> String {
    String::from_utf8_lossy(bytes).into_owned()
}
