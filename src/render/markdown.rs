//! Small Markdown building blocks shared by the renderer and the packer.

/// Fence delimiter.
pub const FENCE: &str = "```";

/// Byte-order mark that Tableau sometimes leaves at the start of a line.
const BOM: char = '\u{FEFF}';

/// Returns `lines` wrapped in a fenced block tagged with `lang`.
///
/// Every line is terminated with `\n`, including the closing fence.
pub fn fenced<S: AsRef<str>>(lang: &str, lines: &[S]) -> String {
    let body_len: usize = lines.iter().map(|l| l.as_ref().len() + 1).sum();
    let mut out = String::with_capacity(body_len + lang.len() + 2 * FENCE.len() + 2);
    out.push_str(FENCE);
    out.push_str(lang);
    out.push('\n');
    for line in lines {
        out.push_str(line.as_ref());
        out.push('\n');
    }
    out.push_str(FENCE);
    out.push('\n');
    out
}

/// Strips byte-order marks and carriage returns from a body line.
pub fn clean_line(line: &str) -> String {
    line.trim_start_matches(BOM).replace('\r', "")
}

/// Prepares a raw document line for display outside a diff prefix.
///
/// Backtick runs that could close the surrounding fence are broken up.
pub fn display_line(line: &str) -> String {
    clean_line(line).replace(FENCE, "` ` `")
}

/// Escapes a path for use inside an inline code span.
pub fn code_span(text: &str) -> String {
    format!("`{}`", text.replace('`', "'"))
}
