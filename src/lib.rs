//! # twb-diff
//!
//! Noise-filtered diffs of Tableau workbooks (`.twb`, `.twbx`) between two
//! git revisions, rendered as Markdown and packed into byte-bounded blocks
//! suitable for pull request comments.
//!
//! ## Quick Start
//!
//! ```rust
//! use twb_diff::pack::BlockPacker;
//!
//! let packer = BlockPacker::new("<!-- tag --> 1", "Summary.\n", "\n---\n", 4_096).unwrap();
//! let blocks = packer.pack(&["### `a.twb` (added)\n\n"]);
//! assert_eq!(blocks.len(), 1);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(unsafe_code)]

pub mod cli;
pub mod config;
pub mod content;
pub mod delivery;
pub mod diff;
pub mod git;
pub mod pack;
pub mod pipeline;
pub mod render;
pub mod utils;

pub use crate::cli::Cli;
pub use crate::config::DiffConfig;
pub use crate::pipeline::{DiffPipeline, PullRequestRef};

/// The current version of twb-diff.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
