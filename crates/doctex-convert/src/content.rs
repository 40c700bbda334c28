//! Shared inline-content rendering: run formatting, hyperlinks, and math
//! substitution. Used by both the table renderer and the document walker
//! so the fixed formatting-nesting order only lives in one place.

use doctex_core::escape::escape_latex;
use doctex_core::model::{Hyperlink, Inline, Paragraph, Run};
use doctex_math::mtef::translate as translate_mtef;
use doctex_math::render::render as render_math;
use once_cell::sync::Lazy;
use regex::{Captures, Regex};

static URL_ESCAPE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"[%#]").unwrap());

/// Escape `%` and `#`, the two characters an `\href` target can't carry
/// literally.
fn escape_url(url: &str) -> String {
    URL_ESCAPE_RE
        .replace_all(url, |caps: &Captures| format!("\\{}", &caps[0]))
        .into_owned()
}

/// Escape run text and wrap it in bold/italic/colour/highlight, innermost
/// to outermost in that fixed order.
#[must_use]
pub fn format_run(run: &Run) -> String {
    let mut s = escape_latex(&run.text);
    if run.formatting.bold {
        s = format!("\\textbf{{{s}}}");
    }
    if run.formatting.italic {
        s = format!("\\textit{{{s}}}");
    }
    if let Some(color) = &run.formatting.color_rgb {
        s = format!("\\textcolor[HTML]{{{color}}}{{{s}}}");
    }
    if let Some(highlight) = &run.formatting.highlight {
        s = format!("\\colorbox{{{highlight}}}{{{s}}}");
    }
    s
}

/// `\href{url}{\textcolor{blue}{visible}}`, falling back to the URL itself
/// as the visible text when the hyperlink has no runs.
#[must_use]
pub fn render_hyperlink(h: &Hyperlink) -> String {
    let visible: String = h.runs.iter().map(format_run).collect();
    let url = escape_url(&h.url);
    if visible.trim().is_empty() {
        format!("\\href{{{url}}}{{\\textcolor{{blue}}{{{url}}}}}")
    } else {
        format!("\\href{{{url}}}{{\\textcolor{{blue}}{{{visible}}}}}")
    }
}

/// Render a paragraph's inline children (runs, hyperlinks, OMML math,
/// legacy equation objects) as a single text fragment. Images are the
/// walker's concern (figure grouping, classifier gating) and are skipped.
#[must_use]
pub fn render_inline_text(paragraph: &Paragraph) -> String {
    let mut out = String::new();
    for child in &paragraph.children {
        match child {
            Inline::Run(r) => out.push_str(&format_run(r)),
            Inline::Hyperlink(h) => out.push_str(&render_hyperlink(h)),
            Inline::Math(node) => {
                let latex = render_math(node);
                if !latex.trim().is_empty() {
                    out.push('$');
                    out.push_str(&latex);
                    out.push('$');
                }
            }
            Inline::EquationObject(eq) => {
                let latex = translate_mtef(&eq.compound_blob);
                if !latex.trim().is_empty() {
                    out.push('$');
                    out.push_str(&latex);
                    out.push('$');
                }
            }
            Inline::Image(_) => {}
        }
    }
    out
}
