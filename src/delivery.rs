//! Delivery sinks for packed output blocks.
//!
//! Blocks are written in the hand-off format read by the posting step:
//! each block, a newline, then a `---COMMENT_PART_{i}---` separator line
//! with a 1-based index.

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tracing::info;

/// Accepts the ordered output blocks of one run.
pub trait DeliverySink {
    /// Delivers `blocks` in order.
    fn deliver(&mut self, blocks: &[String]) -> Result<()>;
}

/// Returns the separator line written after block `index` (1-based).
pub fn part_separator(index: usize) -> String {
    format!("---COMMENT_PART_{index}---")
}

/// Writes `blocks` to `writer` in the hand-off format.
pub fn write_parts<W: Write>(writer: &mut W, blocks: &[String]) -> io::Result<()> {
    for (i, block) in blocks.iter().enumerate() {
        writeln!(writer, "{block}")?;
        writeln!(writer, "{}", part_separator(i + 1))?;
    }
    writer.flush()
}

/// Splits hand-off text back into blocks.
pub fn read_parts(text: &str) -> Vec<String> {
    let mut blocks = Vec::new();
    let mut rest = text;
    let mut index = 1;

    loop {
        let marker = format!("\n{}\n", part_separator(index));
        let Some(pos) = rest.find(&marker) else {
            break;
        };
        blocks.push(rest[..pos].to_string());
        rest = &rest[pos + marker.len()..];
        index += 1;
    }
    blocks
}

/// Writes blocks to a parts file, replacing any previous content.
#[derive(Debug, Clone)]
pub struct PartsFileSink {
    path: PathBuf,
}

impl PartsFileSink {
    /// Creates a sink writing to `path`.
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    /// Returns the output path.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl DeliverySink for PartsFileSink {
    fn deliver(&mut self, blocks: &[String]) -> Result<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
        }

        let mut buf = Vec::new();
        write_parts(&mut buf, blocks)?;
        fs::write(&self.path, buf)
            .with_context(|| format!("Failed to write parts file: {}", self.path.display()))?;

        info!(path = %self.path.display(), blocks = blocks.len(), "Wrote output blocks");
        Ok(())
    }
}

/// Writes blocks to standard output.
#[derive(Debug, Default, Clone, Copy)]
pub struct StdoutSink;

impl DeliverySink for StdoutSink {
    fn deliver(&mut self, blocks: &[String]) -> Result<()> {
        let stdout = io::stdout();
        let mut handle = stdout.lock();
        write_parts(&mut handle, blocks).context("Failed to write blocks to stdout")
    }
}
