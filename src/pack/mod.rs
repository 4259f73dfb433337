//! Byte-bounded packing of rendered sections into output blocks.
//!
//! Every block starts with the same prefix (header and intro) and stays
//! within the byte budget. Sections are cut into safe fragments first
//! (see [`split_section`]), then fragments are appended greedily in order.
//! The trailer is appended to the last block only, but its size is reserved
//! in every block so that whichever block ends up last can carry it.

pub mod error;
pub mod fence;
pub mod split;

use tracing::debug;

pub use error::PackError;
pub use split::{slice_utf8, split_section};

/// Minimum number of content bytes a block must leave room for.
pub const MIN_FRAGMENT_BYTES: usize = 64;

/// Packs sections into byte-bounded blocks with a shared prefix and trailer.
#[derive(Debug, Clone)]
pub struct BlockPacker {
    prefix: String,
    trailer: String,
    max_bytes: usize,
}

impl BlockPacker {
    /// Creates a packer.
    ///
    /// The prefix of every block is `header + "\n\n" + intro + "\n"`.
    ///
    /// # Errors
    ///
    /// Returns [`PackError::BudgetTooSmall`] if `max_bytes` leaves fewer than
    /// [`MIN_FRAGMENT_BYTES`] after the prefix and trailer.
    pub fn new(header: &str, intro: &str, trailer: &str, max_bytes: usize) -> Result<Self, PackError> {
        let prefix = format!("{header}\n\n{intro}\n");
        let overhead = prefix.len() + trailer.len();
        let available = max_bytes.saturating_sub(overhead);

        if available < MIN_FRAGMENT_BYTES {
            return Err(PackError::BudgetTooSmall {
                max_bytes,
                overhead,
                available,
                required: MIN_FRAGMENT_BYTES,
            });
        }

        Ok(Self {
            prefix,
            trailer: trailer.to_string(),
            max_bytes,
        })
    }

    /// Returns the text every block starts with.
    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Returns the text appended to the last block.
    pub fn trailer(&self) -> &str {
        &self.trailer
    }

    /// Returns the number of bytes one fragment may occupy.
    pub fn fragment_budget(&self) -> usize {
        self.max_bytes - self.prefix.len() - self.trailer.len()
    }

    /// Packs `sections`, in order, into blocks of at most `max_bytes` bytes.
    ///
    /// Zero sections yield a single block holding the prefix and trailer.
    pub fn pack<S: AsRef<str>>(&self, sections: &[S]) -> Vec<String> {
        let budget = self.fragment_budget();
        let mut blocks = Vec::new();
        let mut current = self.prefix.clone();

        for section in sections {
            for fragment in split_section(section.as_ref(), budget) {
                if current.len() + fragment.len() + self.trailer.len() > self.max_bytes
                    && current.len() > self.prefix.len()
                {
                    blocks.push(std::mem::replace(&mut current, self.prefix.clone()));
                }
                current.push_str(&fragment);
            }
        }

        current.push_str(&self.trailer);
        blocks.push(current);

        debug!(
            sections = sections.len(),
            blocks = blocks.len(),
            max_bytes = self.max_bytes,
            "Packed sections into blocks"
        );
        blocks
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::pack::fence::{is_close_fence, is_open_fence};

    const HEADER: &str = "<!-- tag --> 7";
    const INTRO: &str = "Intro.\n";
    const TRAILER: &str = "\n---\nfooter\n";

    // ── test helpers ────────────────────────────────────────────

    fn packer(max_bytes: usize) -> BlockPacker {
        BlockPacker::new(HEADER, INTRO, TRAILER, max_bytes).unwrap()
    }

    /// Strips the shared prefix and the trailer from every block.
    fn section_text(packer: &BlockPacker, blocks: &[String]) -> String {
        let last = blocks.len() - 1;
        blocks
            .iter()
            .enumerate()
            .map(|(i, block)| {
                let body = block.strip_prefix(packer.prefix()).unwrap();
                if i == last {
                    body.strip_suffix(packer.trailer()).unwrap().to_string()
                } else {
                    body.to_string()
                }
            })
            .collect()
    }

    /// Drops fence marker lines and line breaks, leaving only content.
    fn content_of(text: &str) -> String {
        text.split_inclusive('\n')
            .filter(|line| !is_open_fence(line) && !is_close_fence(line))
            .map(|line| line.trim_end_matches('\n'))
            .collect()
    }

    /// Returns true if every opened fence in `block` is closed in `block`.
    fn fences_balanced(block: &str) -> bool {
        let mut open = false;
        for line in block.split_inclusive('\n') {
            if !open && is_open_fence(line) && line.ends_with('\n') {
                open = true;
            } else if open && is_close_fence(line) {
                open = false;
            }
        }
        !open
    }

    // ── construction ───────────────────────────────────────────

    #[test]
    fn prefix_layout() {
        let packer = packer(1_000);
        assert_eq!(packer.prefix(), "<!-- tag --> 7\n\nIntro.\n\n");
        assert_eq!(
            packer.fragment_budget(),
            1_000 - packer.prefix().len() - TRAILER.len()
        );
    }

    #[test]
    fn rejects_budget_smaller_than_fixed_text() {
        let err = BlockPacker::new(HEADER, INTRO, TRAILER, 40).unwrap_err();
        assert!(matches!(err, PackError::BudgetTooSmall { max_bytes: 40, .. }));
        assert!(err.to_string().contains("too small"));
    }

    // ── pack ───────────────────────────────────────────────────

    #[test]
    fn zero_sections_yield_prefix_and_trailer() {
        let packer = packer(1_000);
        let sections: [&str; 0] = [];
        let blocks = packer.pack(&sections);
        assert_eq!(blocks, vec![format!("{}{TRAILER}", packer.prefix())]);
    }

    #[test]
    fn small_sections_share_one_block() {
        let packer = packer(1_000);
        let blocks = packer.pack(&["### a\n\n", "### b\n\n"]);
        assert_eq!(blocks.len(), 1);
        assert_eq!(blocks[0], format!("{}### a\n\n### b\n\n{TRAILER}", packer.prefix()));
    }

    #[test]
    fn trailer_only_on_last_block() {
        let packer = packer(200);
        let section = "line of text here\n".repeat(30);
        let blocks = packer.pack(&[section.as_str()]);

        assert!(blocks.len() > 1);
        for (i, block) in blocks.iter().enumerate() {
            assert!(block.starts_with(packer.prefix()));
            assert!(block.len() <= 200);
            assert_eq!(block.ends_with(TRAILER), i == blocks.len() - 1, "block {i}");
        }
        assert_eq!(section_text(&packer, &blocks), section);
    }

    #[test]
    fn preserves_section_order() {
        let packer = packer(150);
        let sections: Vec<String> = (0..10).map(|i| format!("section {i}\n{}\n", "x".repeat(40))).collect();
        let blocks = packer.pack(&sections);
        assert_eq!(section_text(&packer, &blocks), sections.concat());
    }

    #[test]
    fn fenced_region_is_never_split_across_blocks() {
        let packer = packer(300);
        let body: String = (0..40).map(|i| format!("+added line {i}\n")).collect();
        let section = format!("### `a.twb` (added)\n\n```diff\n{body}```\n\n");
        let blocks = packer.pack(&[section.as_str()]);

        assert!(blocks.len() > 1);
        for block in &blocks {
            assert!(block.len() <= 300);
            assert!(fences_balanced(block), "unbalanced block: {block:?}");
        }
        assert_eq!(content_of(&section_text(&packer, &blocks)), content_of(&section));
    }

    #[test]
    fn huge_single_diff_line_spans_blocks() {
        let max_bytes = 60_000;
        let packer = BlockPacker::new(
            "<!-- twb-diff-bot --> 12",
            "Automated Tableau diff summary for PR 12.\n",
            "\n---\n_Search for the tag to find these comments._\n",
            max_bytes,
        )
        .unwrap();
        let line = format!("+{}", "é".repeat(100_000));
        assert!(line.len() > 200_000);
        let section = format!("```diff\n{line}\n```\n");

        let blocks = packer.pack(&[section.as_str()]);

        assert!(blocks.len() >= 4);
        for block in &blocks {
            assert!(block.len() <= max_bytes);
            assert!(fences_balanced(block));
        }
        assert_eq!(content_of(&section_text(&packer, &blocks)), line);
    }

    #[test]
    fn placeholder_section_is_packed_as_text() {
        let packer = packer(1_000);
        let section = "### `a.twb` (modified)\n\n_No meaningful changes after normalization._\n\n";
        let blocks = packer.pack(&[section]);
        assert_eq!(section_text(&packer, &blocks), section);
    }

    // ── property tests ────────────────────────────────────────────

    mod prop {
        use super::*;
        use proptest::prelude::*;

        fn section_strategy() -> impl Strategy<Value = String> {
            let text = "[a-zé😀 ]{0,120}\n";
            let fenced = proptest::collection::vec("[+ -][a-zé😀]{0,200}", 0..30)
                .prop_map(|lines| {
                    let body: String = lines.iter().map(|l| format!("{l}\n")).collect();
                    format!("```diff\n{body}```\n")
                });
            proptest::collection::vec(prop_oneof![text.prop_map(String::from), fenced], 0..6)
                .prop_map(|parts| parts.concat())
        }

        proptest! {
            #[test]
            fn blocks_respect_budget_and_fences(
                sections in proptest::collection::vec(section_strategy(), 0..6),
                max_bytes in 120usize..600,
            ) {
                let packer = packer(max_bytes);
                let blocks = packer.pack(&sections);

                prop_assert!(!blocks.is_empty());
                for block in &blocks {
                    prop_assert!(block.len() <= max_bytes, "{} > {}", block.len(), max_bytes);
                    prop_assert!(std::str::from_utf8(block.as_bytes()).is_ok());
                    prop_assert!(block.starts_with(packer.prefix()));
                    prop_assert!(fences_balanced(block), "unbalanced block: {:?}", block);
                }
                prop_assert!(blocks.last().unwrap().ends_with(TRAILER));
            }

            #[test]
            fn content_is_preserved_in_order(
                sections in proptest::collection::vec(section_strategy(), 0..6),
                max_bytes in 120usize..600,
            ) {
                let packer = packer(max_bytes);
                let blocks = packer.pack(&sections);
                let packed = section_text(&packer, &blocks);
                prop_assert_eq!(content_of(&packed), content_of(&sections.concat()));
            }
        }
    }
}
