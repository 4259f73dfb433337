//! Packer errors.

use thiserror::Error;

/// Errors constructing a [`BlockPacker`](super::BlockPacker).
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PackError {
    /// The block budget cannot hold the fixed text plus a minimal fragment.
    #[error(
        "Block budget of {max_bytes} bytes is too small: header and trailer take {overhead} bytes, \
         leaving {available} for content (need at least {required})"
    )]
    BudgetTooSmall {
        /// Configured block budget.
        max_bytes: usize,
        /// Bytes taken by the prefix and trailer.
        overhead: usize,
        /// Bytes left for section content.
        available: usize,
        /// Minimum content bytes required.
        required: usize,
    },
}
