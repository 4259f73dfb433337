//! Fenced-region scanner.
//!
//! A fenced region opens with a line made of three backticks followed by a
//! language tag (```` ```diff ````, ```` ```xml ````) and closes at the next
//! line that is exactly three backticks. An opener with no matching close
//! is not a region; its lines stay ordinary text.

pub use crate::render::markdown::FENCE;

/// Close marker emitted when a region is re-fenced.
pub const CLOSE_LINE: &str = "```\n";

/// A contiguous slice of a rendered section.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Segment<'a> {
    /// Text outside any fenced region.
    Text(&'a str),
    /// A complete fenced region.
    Fence {
        /// Opening line, including its terminator.
        open: &'a str,
        /// Lines between the markers.
        body: &'a str,
        /// Closing line, with its terminator when present.
        close: &'a str,
    },
}

impl Segment<'_> {
    /// Returns the byte length of the segment as it appears in the source.
    pub fn len(&self) -> usize {
        match self {
            Segment::Text(text) => text.len(),
            Segment::Fence { open, body, close } => open.len() + body.len() + close.len(),
        }
    }

    /// Returns true if the segment covers no bytes.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Returns true if `line` opens a fenced region.
pub fn is_open_fence(line: &str) -> bool {
    line.trim_end()
        .strip_prefix(FENCE)
        .is_some_and(|lang| !lang.trim().is_empty() && !lang.contains('`'))
}

/// Returns true if `line` closes a fenced region.
pub fn is_close_fence(line: &str) -> bool {
    line.trim_end() == FENCE
}

/// Splits `section` into text and fenced segments.
///
/// Regions are found by a non-overlapping, left-to-right scan. Concatenating
/// the segments reproduces `section` exactly.
pub fn scan(section: &str) -> Vec<Segment<'_>> {
    let mut segments = Vec::new();
    // Byte offset where the pending text segment starts.
    let mut text_start = 0;
    let mut offset = 0;
    // (open start, body start) of the region being scanned.
    let mut open: Option<(usize, usize)> = None;

    for line in section.split_inclusive('\n') {
        let start = offset;
        offset += line.len();

        match open {
            None if is_open_fence(line) && line.ends_with('\n') => {
                open = Some((start, offset));
            }
            Some((open_start, body_start)) if is_close_fence(line) => {
                if text_start < open_start {
                    segments.push(Segment::Text(&section[text_start..open_start]));
                }
                segments.push(Segment::Fence {
                    open: &section[open_start..body_start],
                    body: &section[body_start..start],
                    close: line,
                });
                text_start = offset;
                open = None;
            }
            _ => {}
        }
    }

    if text_start < section.len() {
        segments.push(Segment::Text(&section[text_start..]));
    }
    segments
}
