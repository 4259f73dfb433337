//! Noise filtering for workbook XML before diffing.
//!
//! Tableau rewrites timestamps and regenerates identifiers on every save.
//! Lines that only carry such metadata are dropped, and identifier values
//! are masked with [`REDACTED`] so that two saves of the same workbook
//! normalize to the same text.

use std::sync::LazyLock;

use regex::Regex;

/// Token substituted for masked identifier values.
pub const REDACTED: &str = "REDACTED";

/// Patterns (matched against the trimmed line) marking a line as volatile
/// metadata that never belongs in a diff.
pub const VOLATILE_LINE_PATTERNS: &[&str] = &[
    r"(?i)^<!--\s*(?:build|saved|created|modified)\b.*-->$",
    r"(?i)^<(?:created|modified|last-modified|last-saved|creation-date|modified-date)(?:\s[^>]*)?>.*</[^>]+>$",
    r#"(?i)\b(?:created|modified|last-modified|last-saved|saved)(?:[-_](?:at|on|date|time))?\s*=\s*['"]\d{4}-\d{2}-\d{2}"#,
];

/// One ordered masking rule.
#[derive(Debug, Clone, Copy)]
pub struct RedactionRule {
    /// Short rule name used in tests and logs.
    pub name: &'static str,
    /// Regex locating the value to mask.
    pub pattern: &'static str,
    /// Replacement template (regex crate `$n` syntax).
    pub replacement: &'static str,
}

/// Masking rules, applied in order to every kept line.
pub const REDACTION_RULES: &[RedactionRule] = &[
    RedactionRule {
        name: "project-id",
        pattern: r#"(?i)(\bproject-?(?:luid|id)\s*=\s*['"])[^'"]*(['"])"#,
        replacement: "${1}REDACTED${2}",
    },
    RedactionRule {
        name: "workbook-id",
        pattern: r#"(?i)(\bworkbook-?(?:luid|id)\s*=\s*['"])[^'"]*(['"])"#,
        replacement: "${1}REDACTED${2}",
    },
    RedactionRule {
        name: "datasource-id",
        pattern: r#"(?i)(\bdata-?source-?(?:luid|id)\s*=\s*['"])[^'"]*(['"])"#,
        replacement: "${1}REDACTED${2}",
    },
    RedactionRule {
        name: "connection-id",
        pattern: r#"(?i)(\bconnection-?(?:luid|id)\s*=\s*['"])[^'"]*(['"])"#,
        replacement: "${1}REDACTED${2}",
    },
    RedactionRule {
        name: "federated-name",
        pattern: r"(\bfederated\.)[0-9a-z]{20,}",
        replacement: "${1}REDACTED",
    },
    RedactionRule {
        name: "unique-id",
        pattern: r#"(?i)(\b(?:luid|uuid|unique-id)\s*=\s*['"])[^'"]*(['"])"#,
        replacement: "${1}REDACTED${2}",
    },
    RedactionRule {
        name: "braced-guid",
        pattern: r"\{[0-9A-Fa-f]{8}-[0-9A-Fa-f]{4}-[0-9A-Fa-f]{4}-[0-9A-Fa-f]{4}-[0-9A-Fa-f]{12}\}",
        replacement: "{REDACTED}",
    },
];

struct CompiledRules {
    volatile: Vec<Regex>,
    redactions: Vec<(Regex, &'static str)>,
}

static RULES: LazyLock<CompiledRules> = LazyLock::new(|| CompiledRules {
    volatile: VOLATILE_LINE_PATTERNS
        .iter()
        .map(|p| Regex::new(p).unwrap())
        .collect(),
    redactions: REDACTION_RULES
        .iter()
        .map(|rule| (Regex::new(rule.pattern).unwrap(), rule.replacement))
        .collect(),
});

/// Workbook text with volatile lines removed and identifiers masked.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NormalizedText(String);

impl NormalizedText {
    /// Returns the text.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Iterates over the lines, without terminators.
    pub fn lines(&self) -> std::str::Lines<'_> {
        self.0.lines()
    }

    /// Returns true if no lines remain.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl std::fmt::Display for NormalizedText {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Normalizes workbook text for diffing.
///
/// Line order and the content of lines no rule touches are preserved.
/// Every kept line is terminated with `\n` (carriage returns are dropped),
/// which makes normalizing normalized text a no-op.
pub fn normalize(text: &str) -> NormalizedText {
    let rules = &*RULES;
    let mut out = String::with_capacity(text.len());

    for line in text.lines() {
        let line = line.trim_end_matches('\r');
        let trimmed = line.trim();
        if rules.volatile.iter().any(|re| re.is_match(trimmed)) {
            continue;
        }
        out.push_str(&redact_line(line, &rules.redactions));
        out.push('\n');
    }

    NormalizedText(out)
}

fn redact_line(line: &str, redactions: &[(Regex, &'static str)]) -> String {
    let mut current = line.to_string();
    for (re, replacement) in redactions {
        if re.is_match(&current) {
            current = re.replace_all(&current, *replacement).into_owned();
        }
    }
    current
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    fn rule(name: &str) -> (Regex, &'static str) {
        let rule = REDACTION_RULES.iter().find(|r| r.name == name).unwrap();
        (Regex::new(rule.pattern).unwrap(), rule.replacement)
    }

    fn apply_rule(name: &str, input: &str) -> String {
        let (re, replacement) = rule(name);
        re.replace_all(input, replacement).into_owned()
    }

    // ── rule tables ────────────────────────────────────────────

    #[test]
    fn all_patterns_compile() {
        for pattern in VOLATILE_LINE_PATTERNS {
            assert!(Regex::new(pattern).is_ok(), "bad volatile pattern {pattern}");
        }
        for rule in REDACTION_RULES {
            assert!(Regex::new(rule.pattern).is_ok(), "bad rule {}", rule.name);
            assert!(rule.replacement.contains(REDACTED), "rule {} must mask", rule.name);
        }
    }

    #[test]
    fn redaction_rule_table() {
        let cases = [
            ("project-id", "<p project-luid='abc-123' name='x'/>", "<p project-luid='REDACTED' name='x'/>"),
            ("project-id", r#"<p project-id="42"/>"#, r#"<p project-id="REDACTED"/>"#),
            ("workbook-id", "<w workbook-luid='w1'/>", "<w workbook-luid='REDACTED'/>"),
            ("datasource-id", "<d datasource-luid='d1'/>", "<d datasource-luid='REDACTED'/>"),
            ("datasource-id", "<d data-source-id='d1'/>", "<d data-source-id='REDACTED'/>"),
            ("connection-id", "<c connection-id='c9'/>", "<c connection-id='REDACTED'/>"),
            (
                "federated-name",
                "<datasource name='federated.0a1b2c3d4e5f6g7h8i9j0k1l2m3'>",
                "<datasource name='federated.REDACTED'>",
            ),
            ("unique-id", "<x uuid='u-1' />", "<x uuid='REDACTED' />"),
            (
                "braced-guid",
                "<x id='{1A2B3C4D-1111-2222-3333-444455556666}'/>",
                "<x id='{REDACTED}'/>",
            ),
        ];
        for (name, input, expected) in cases {
            assert_eq!(apply_rule(name, input), expected, "rule {name}");
        }
    }

    #[test]
    fn short_federated_suffix_is_kept() {
        assert_eq!(
            apply_rule("federated-name", "federated.abc"),
            "federated.abc"
        );
    }

    // ── normalize ──────────────────────────────────────────────

    #[test]
    fn drops_volatile_lines() {
        let text = "<workbook>\n  <!-- build 20233.23.1017.0916 -->\n  <created>2024-01-02T03:04:05</created>\n  <view created-at='2024-05-06 10:00'/>\n</workbook>";
        assert_eq!(normalize(text).as_str(), "<workbook>\n</workbook>\n");
    }

    #[test]
    fn volatile_match_is_case_insensitive() {
        let text = "a\n<MODIFIED>2024</MODIFIED>\nb";
        assert_eq!(normalize(text).as_str(), "a\nb\n");
    }

    #[test]
    fn preserves_untouched_lines_exactly() {
        let text = "  <column name='[Sales]'  datatype='real' />\n\n\t<row/>\n";
        assert_eq!(normalize(text).as_str(), text);
    }

    #[test]
    fn masks_identifiers_in_place() {
        let text = "  <repository-location project-luid='p1' workbook-luid='w2' />";
        assert_eq!(
            normalize(text).as_str(),
            "  <repository-location project-luid='REDACTED' workbook-luid='REDACTED' />\n"
        );
    }

    #[test]
    fn strips_carriage_returns() {
        assert_eq!(normalize("a\r\nb\r\r\nc").as_str(), "a\nb\nc\n");
    }

    #[test]
    fn keeps_trailing_blank_lines() {
        assert_eq!(normalize("a\n\n").as_str(), "a\n\n");
    }

    #[test]
    fn empty_input_is_empty() {
        assert!(normalize("").is_empty());
    }

    #[test]
    fn idempotent_on_sample() {
        let text = "<w project-id='1'>\n<modified>x</modified>\nfederated.abcdefghijklmnopqrstuvwxyz\n";
        let once = normalize(text);
        assert_eq!(normalize(once.as_str()), once);
    }

    // ── property tests ────────────────────────────────────────────

    mod prop {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn normalize_is_idempotent(s in "[a-z<>/='\" \\-.{}0-9\n\r\t]{0,300}") {
                let once = normalize(&s);
                let twice = normalize(once.as_str());
                prop_assert_eq!(twice, once);
            }

            #[test]
            fn normalize_never_adds_lines(s in "(?s).{0,300}") {
                prop_assert!(normalize(&s).lines().count() <= s.lines().count());
            }
        }
    }
}
