//! LaTeX escaping for untrusted run text.
//!
//! Maps the ten LaTeX special characters to their canonical escape forms.
//! Everything else passes through unchanged.

/// Escape the ten LaTeX special characters in `text`.
///
/// `~` and `^` use the `\textasciitilde{}` / `\textasciicircum{}` text-mode
/// forms; `\` uses `\textbackslash{}`. All other special characters use a
/// plain backslash escape.
#[must_use]
pub fn escape_latex(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '\\' => out.push_str("\\textbackslash{}"),
            '%' => out.push_str("\\%"),
            '$' => out.push_str("\\$"),
            '_' => out.push_str("\\_"),
            '&' => out.push_str("\\&"),
            '#' => out.push_str("\\#"),
            '{' => out.push_str("\\{"),
            '}' => out.push_str("\\}"),
            '~' => out.push_str("\\textasciitilde{}"),
            '^' => out.push_str("\\textasciicircum{}"),
            other => out.push(other),
        }
    }
    out
}

/// The ten characters [`escape_latex`] treats specially.
pub const SPECIAL_CHARS: [char; 10] = ['\\', '%', '$', '_', '&', '#', '{', '}', '~', '^'];
