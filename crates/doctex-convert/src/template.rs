//! Injects walker output into a user-supplied LaTeX template: either
//! targeted replacement of `\title`/`\author`/`\begin{abstract}`/keywords/
//! body ranges, or a single `%%CONTENT%%` substitution.

use crate::walker::WalkOutput;
use once_cell::sync::Lazy;
use regex::Regex;

const REQUIRED_PACKAGES: [(&str, &str); 5] = [
    ("multirow", "\\usepackage{multirow}"),
    ("multicol", "\\usepackage{multicol}"),
    ("float", "\\usepackage{float}"),
    ("subcaption", "\\usepackage{subcaption}"),
    (
        "hyperref",
        "\\usepackage[colorlinks=true,linkcolor=blue,citecolor=blue,urlcolor=blue]{hyperref}",
    ),
];

static CONTENT_MARKER_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"%%CONTENT%%").unwrap());

static METADATA_LINE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)^\s*(ARTICLE TITLE|ARTICLE INFO(RMATION)?|JOURNAL:|ISSN:|ISBN:|DOI:|RECEIVED:|ACCEPTED:|PUBLISHED:|REVISED:|VOLUME:|ISSUE:|CITATION:|CORRESPONDENCE|AFFILIATION|OPEN ACCESS|\* CORRESPONDING|© \d{4}|ALL RIGHTS RESERVED|MANUSCRIPT|SUBMITTED:|ABSTRACT:?\s*$|TÓM TẮT:?\s*$|TỪ KHÓA:|KEYWORDS:\s*$|E-?MAIL:|ORCID:|HTTPS?://DOI\.ORG)",
    )
    .unwrap()
});

fn has_structured_markers(template: &str) -> bool {
    template.contains("\\maketitle") || template.contains("\\title{") || template.contains("\\begin{abstract}")
}

/// Find the balanced `{...}` argument starting at the `{` found after
/// `from`, respecting backslash-escaped braces. Returns the byte range of
/// the argument's contents (excluding the outer braces).
fn find_balanced_arg(s: &str, open_brace_idx: usize) -> Option<(usize, usize)> {
    let bytes = s.as_bytes();
    if bytes.get(open_brace_idx) != Some(&b'{') {
        return None;
    }
    let mut depth = 0i32;
    let mut i = open_brace_idx;
    let mut escaped = false;
    let content_start = open_brace_idx + 1;
    while i < bytes.len() {
        let c = bytes[i];
        if escaped {
            escaped = false;
        } else if c == b'\\' {
            escaped = true;
        } else if c == b'{' {
            depth += 1;
        } else if c == b'}' {
            depth -= 1;
            if depth == 0 {
                return Some((content_start, i));
            }
        }
        i += 1;
    }
    None
}

fn replace_command_arg(template: &str, command: &str, replacement: &str) -> String {
    let Some(cmd_idx) = template.find(command) else {
        return template.to_string();
    };
    let brace_idx = cmd_idx + command.len();
    let Some((start, end)) = find_balanced_arg(template, brace_idx) else {
        return template.to_string();
    };
    format!("{}{}{}", &template[..start], replacement, &template[end..])
}

fn replace_environment(template: &str, begin: &str, end_tag: &str, replacement: &str) -> String {
    let Some(begin_idx) = template.find(begin) else {
        return template.to_string();
    };
    let content_start = begin_idx + begin.len();
    let Some(rel_end) = template[content_start..].find(end_tag) else {
        return template.to_string();
    };
    let content_end = content_start + rel_end;
    format!(
        "{}{}{}",
        &template[..content_start],
        replacement,
        &template[content_end..]
    )
}

fn filter_metadata_prefix(body: &str) -> String {
    body.lines()
        .skip_while(|line| METADATA_LINE_RE.is_match(line.trim()))
        .collect::<Vec<_>>()
        .join("\n")
}

fn inject_packages(template: &str) -> String {
    let mut out = template.to_string();
    let insertion_point = out.find("\\begin{document}").unwrap_or(0);
    let mut additions = String::new();
    for (name, directive) in REQUIRED_PACKAGES {
        if !out.contains(&format!("{{{name}}}")) {
            additions.push_str(directive);
            additions.push('\n');
        }
    }
    if !additions.is_empty() {
        out.insert_str(insertion_point, &additions);
    }
    out
}

fn join_authors(authors: &[crate::walker::AuthorEntry]) -> String {
    authors
        .iter()
        .map(|a| a.text.clone())
        .collect::<Vec<_>>()
        .join(" \\\\ ")
}

/// Inject `output`'s region buffers into `template`, returning the final
/// LaTeX document text.
#[must_use]
pub fn inject(template: &str, output: &WalkOutput) -> String {
    let template = inject_packages(template);

    if !has_structured_markers(&template) {
        return CONTENT_MARKER_RE
            .replace(&template, |_: &regex::Captures| full_body(output))
            .into_owned();
    }

    let mut doc = template;

    doc = replace_command_arg(&doc, "\\title", output.title.trim());
    doc = replace_command_arg(&doc, "\\author", &join_authors(&output.authors));
    let abstract_fill = format!("\n{}\n", output.abstract_text.trim());
    doc = replace_environment(&doc, "\\begin{abstract}", "\\end{abstract}", &abstract_fill);

    if doc.contains("\\begin{IEEEkeywords}") {
        let keywords_fill = format!("\n{}\n", output.keywords_text.trim());
        doc = replace_environment(&doc, "\\begin{IEEEkeywords}", "\\end{IEEEkeywords}", &keywords_fill);
    } else if let Some(kw_idx) = doc.find("\\textbf{Keywords:}") {
        let line_end = doc[kw_idx..].find('\n').map(|i| kw_idx + i).unwrap_or(doc.len());
        let replacement = format!("\\textbf{{Keywords:}} {}", output.keywords_text.trim());
        doc = format!("{}{}{}", &doc[..kw_idx], replacement, &doc[line_end..]);
    }

    let body_start = [
        doc.find("\\end{IEEEkeywords}").map(|i| i + "\\end{IEEEkeywords}".len()),
        doc.find("\\end{abstract}").map(|i| i + "\\end{abstract}".len()),
        doc.find("\\maketitle").map(|i| i + "\\maketitle".len()),
    ]
    .into_iter()
    .flatten()
    .max();

    if let (Some(start), Some(end)) = (body_start, doc.find("\\end{document}")) {
        if start <= end {
            let filtered = filter_metadata_prefix(&output.body);
            doc = format!("{}\n{}\n{}", &doc[..start], filtered.trim(), &doc[end..]);
        }
    }

    if doc.contains("%%CONTENT%%") {
        doc = CONTENT_MARKER_RE
            .replace(&doc, |_: &regex::Captures| output.body.clone())
            .into_owned();
    }

    doc
}

fn full_body(output: &WalkOutput) -> String {
    let mut s = String::new();
    for part in [&output.pre_title, &output.title, &output.abstract_text, &output.keywords_text, &output.body] {
        if !part.trim().is_empty() {
            s.push_str(part);
            s.push('\n');
        }
    }
    s
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::walker::AuthorEntry;

    fn sample_output() -> WalkOutput {
        WalkOutput {
            title: "My Paper".to_string(),
            abstract_text: "An abstract.".to_string(),
            keywords_text: "alpha, beta".to_string(),
            body: "\\section{Intro}\nBody text.\n".to_string(),
            authors: vec![AuthorEntry { text: "Jane Doe".to_string() }],
            ..Default::default()
        }
    }

    #[test]
    fn unstructured_template_substitutes_marker_only() {
        let template = "\\documentclass{article}\n\\begin{document}\n%%CONTENT%%\n\\end{document}";
        let out = inject(template, &sample_output());
        assert!(out.contains("My Paper"));
        assert!(out.contains("Body text."));
    }

    #[test]
    fn structured_template_replaces_title_author_abstract() {
        let template = "\\documentclass{article}\n\\begin{document}\n\\title{OLD}\n\\author{OLD AUTHOR}\n\\maketitle\n\\begin{abstract}\nOLD ABSTRACT\n\\end{abstract}\n\\end{document}";
        let out = inject(template, &sample_output());
        assert!(out.contains("\\title{My Paper}"));
        assert!(out.contains("\\author{Jane Doe}"));
        assert!(out.contains("\\begin{abstract}\nAn abstract.\\end{abstract}"));
        assert!(out.contains("Body text."));
    }

    #[test]
    fn balanced_brace_extraction_respects_escaped_braces() {
        let template = "\\title{A \\{special\\} paper}";
        let out = replace_command_arg(template, "\\title", "New Title");
        assert_eq!(out, "\\title{New Title}");
    }

    #[test]
    fn missing_packages_are_injected_once() {
        let template = "\\documentclass{article}\n\\usepackage{multirow}\n\\begin{document}\n%%CONTENT%%\n\\end{document}";
        let out = inject(template, &sample_output());
        assert_eq!(out.matches("usepackage{multirow}").count(), 1);
        assert!(out.contains("usepackage{subcaption}"));
    }

    #[test]
    fn metadata_prefix_lines_are_filtered_from_body() {
        let body = "ISSN: 1234-5678\nDOI: 10.1/xyz\nReal body content starts here.";
        let filtered = filter_metadata_prefix(body);
        assert_eq!(filtered, "Real body content starts here.");
    }
}
