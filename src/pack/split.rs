//! Splitting rendered sections into byte-bounded safe fragments.

use crate::pack::fence::{scan, Segment, CLOSE_LINE};

/// Smallest fenced-body budget worth re-fencing into.
///
/// Openers too long to leave this much room are treated as text.
const MIN_FENCE_BODY_BYTES: usize = 16;

/// Splits `section` into fragments of at most `budget` bytes each.
///
/// Text is split on line boundaries. A fenced region that fits is kept
/// whole; otherwise its body is re-fenced into several complete regions
/// under the original opener. Lines longer than the available room are
/// sliced on UTF-8 boundaries.
///
/// `budget` must be at least 4 so that any code point fits.
pub fn split_section(section: &str, budget: usize) -> Vec<String> {
    let mut fragments = Vec::new();

    for segment in scan(section) {
        match segment {
            Segment::Text(text) => split_text(text, budget, &mut fragments),
            Segment::Fence { open, body, close } => {
                if segment.len() <= budget {
                    fragments.push(format!("{open}{body}{close}"));
                } else if open.len() + CLOSE_LINE.len() + MIN_FENCE_BODY_BYTES > budget {
                    split_text(&format!("{open}{body}{close}"), budget, &mut fragments);
                } else {
                    split_fence(open, body, budget, &mut fragments);
                }
            }
        }
    }

    fragments
}

/// Greedily packs whole lines into pieces of at most `budget` bytes.
fn split_text(text: &str, budget: usize, out: &mut Vec<String>) {
    let mut current = String::new();

    for line in text.split_inclusive('\n') {
        if line.len() > budget {
            flush(&mut current, out);
            out.extend(slice_utf8(line, budget).into_iter().map(str::to_string));
            continue;
        }
        if current.len() + line.len() > budget {
            flush(&mut current, out);
        }
        current.push_str(line);
    }

    flush(&mut current, out);
}

/// Re-fences `body` into complete regions of at most `budget` bytes.
fn split_fence(open: &str, body: &str, budget: usize, out: &mut Vec<String>) {
    let inner = budget - open.len() - CLOSE_LINE.len();
    let mut current = String::new();

    let emit = |lines: &str, out: &mut Vec<String>| {
        out.push(format!("{open}{lines}{CLOSE_LINE}"));
    };

    for line in body.split_inclusive('\n') {
        if line.len() > inner {
            if !current.is_empty() {
                emit(&current, out);
                current.clear();
            }
            let content = line.strip_suffix('\n').unwrap_or(line);
            for slice in slice_utf8(content, inner - 1) {
                emit(&format!("{slice}\n"), out);
            }
            continue;
        }
        if current.len() + line.len() > inner {
            emit(&current, out);
            current.clear();
        }
        current.push_str(line);
    }

    if !current.is_empty() {
        emit(&current, out);
    }
}

fn flush(current: &mut String, out: &mut Vec<String>) {
    if !current.is_empty() {
        out.push(std::mem::take(current));
    }
}

/// Slices `text` into pieces of at most `max` bytes, walking each cut back
/// to the nearest code-point boundary.
pub fn slice_utf8(text: &str, max: usize) -> Vec<&str> {
    let mut pieces = Vec::new();
    let mut rest = text;

    while rest.len() > max {
        let mut cut = max;
        while cut > 0 && !rest.is_char_boundary(cut) {
            cut -= 1;
        }
        if cut == 0 {
            // Smaller than one code point; take the whole character.
            cut = rest.chars().next().map_or(rest.len(), char::len_utf8);
        }
        let (head, tail) = rest.split_at(cut);
        pieces.push(head);
        rest = tail;
    }

    if !rest.is_empty() {
        pieces.push(rest);
    }
    pieces
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::pack::fence::{is_close_fence, is_open_fence};

    /// Drops fence marker lines and line breaks, leaving only content.
    fn content_of(text: &str) -> String {
        text.split_inclusive('\n')
            .filter(|line| !is_open_fence(line) && !is_close_fence(line))
            .map(|line| line.trim_end_matches('\n'))
            .collect()
    }

    // ── slice_utf8 ─────────────────────────────────────────────

    #[test]
    fn slice_short_text_is_untouched() {
        assert_eq!(slice_utf8("abc", 10), vec!["abc"]);
        assert!(slice_utf8("", 10).is_empty());
    }

    #[test]
    fn slice_ascii_evenly() {
        assert_eq!(slice_utf8("abcdefg", 3), vec!["abc", "def", "g"]);
    }

    #[test]
    fn slice_walks_back_to_char_boundary() {
        // 'é' is two bytes; a cut at 3 would land inside the second one.
        let pieces = slice_utf8("aéé", 4);
        assert_eq!(pieces, vec!["aé", "é"]);
    }

    #[test]
    fn slice_never_splits_wide_chars() {
        let text = "😀😀😀";
        for max in 4..12 {
            let pieces = slice_utf8(text, max);
            assert_eq!(pieces.concat(), text);
            assert!(pieces.iter().all(|p| p.len() <= max));
        }
    }

    // ── split_section ──────────────────────────────────────────

    #[test]
    fn small_section_keeps_text_and_fence_apart() {
        let section = "### a\n\n```diff\n+x\n```\n\n";
        assert_eq!(
            split_section(section, 1_000),
            vec!["### a\n\n", "```diff\n+x\n```\n", "\n"]
        );
    }

    #[test]
    fn text_splits_on_line_boundaries() {
        let section = "aaaa\nbbbb\ncccc\n";
        assert_eq!(
            split_section(section, 10),
            vec!["aaaa\nbbbb\n".to_string(), "cccc\n".to_string()]
        );
    }

    #[test]
    fn fitting_fence_stays_whole() {
        let section = "intro line\n```diff\n+a\n```\n";
        let fragments = split_section(section, 20);
        assert_eq!(fragments, vec!["intro line\n", "```diff\n+a\n```\n"]);
    }

    #[test]
    fn large_fence_is_refenced() {
        let body: String = (0..20).map(|i| format!("+line{i:02}\n")).collect();
        let section = format!("```diff\n{body}```\n");
        let fragments = split_section(&section, 40);

        assert!(fragments.len() > 1);
        for fragment in &fragments {
            assert!(fragment.len() <= 40, "{fragment:?}");
            assert!(fragment.starts_with("```diff\n"));
            assert!(fragment.ends_with("```\n"));
        }
        assert_eq!(content_of(&fragments.concat()), content_of(&section));
    }

    #[test]
    fn oversize_fenced_line_is_sliced_and_refenced() {
        let section = format!("```diff\n+{}\n```\n", "x".repeat(200));
        let fragments = split_section(&section, 50);

        for fragment in &fragments {
            assert!(fragment.len() <= 50);
            assert!(fragment.starts_with("```diff\n") && fragment.ends_with("\n```\n"));
        }
        assert_eq!(content_of(&fragments.concat()), content_of(&section));
    }

    #[test]
    fn oversize_text_line_is_sliced() {
        let section = format!("{}\nshort\n", "y".repeat(95));
        let fragments = split_section(&section, 40);
        assert!(fragments.iter().all(|f| f.len() <= 40));
        assert_eq!(fragments.concat(), section);
    }

    #[test]
    fn placeholder_only_section_is_plain_text() {
        let section = "_No meaningful changes after normalization._\n\n";
        assert_eq!(split_section(section, 1_000), vec![section.to_string()]);
    }

    #[test]
    fn huge_opener_falls_back_to_text() {
        let section = format!("```{}\nbody\n```\n", "l".repeat(60));
        let fragments = split_section(&section, 32);
        assert!(fragments.iter().all(|f| f.len() <= 32));
        assert_eq!(fragments.concat(), section);
    }
}
