//! The main forward pass over a document's block sequence: style lookup,
//! list-stack discipline, figure/caption grouping, and region filing.

use crate::semantic::{Region, SemanticClassifier};
use crate::styles::{lookup_style, StyleAction};
use crate::table::{self, TableContext};
use doctex_core::model::{Block, Document, Inline, Paragraph, Table};
use doctex_image::{classify, Classification, ImageContext};
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashSet;

const INLINE_IMAGE_MAX_EMU: i64 = 1_371_600;
const INLINE_TEXT_MIN_CHARS: usize = 20;
const CAPTION_LOOKAHEAD: usize = 5;
const HEADING_CONTENT_MAX_CHARS: usize = 80;

static FIGURE_CAPTION_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^\s*(HÌNH|HINH|FIGURE|FIG\.?|ẢNH|ANH)\s*\d*[\.:]?\s*").unwrap());
static TABLE_CAPTION_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^\s*(BẢNG|BANG|TABLE)\s*\d*[\.:]?\s*").unwrap());
static SUBCAPTION_ROW_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\s*\([a-z]\).*\([a-z]\)").unwrap());
static OUTLINE_NUMBER_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\s*(\d+(\.\d+)*\.?|CH[UƯ][OƠ]NG\s*\d+)").unwrap());

struct HeadingPattern {
    re: Regex,
    command: &'static str,
}

static HEADING_PATTERNS: Lazy<Vec<HeadingPattern>> = Lazy::new(|| {
    vec![
        HeadingPattern {
            re: Regex::new(r"^(CH[UƯ][OƠ]NG|CHAPTER)\s*(\d+|[IVXLC]+)[\.:]?\s*(.+)").unwrap(),
            command: "section",
        },
        HeadingPattern {
            re: Regex::new(r"^(\d+)\.(\d+)\.(\d+)\.?\s*(.+)").unwrap(),
            command: "subsubsection",
        },
        HeadingPattern {
            re: Regex::new(r"^(\d+)\.(\d+)\.?\s*([A-ZÀ-Ỹ].+)").unwrap(),
            command: "subsection",
        },
        HeadingPattern {
            re: Regex::new(r"^(\d+)\.\s+([A-ZÀ-Ỹ][a-zA-ZÀ-ỹ\s]{10,})").unwrap(),
            command: "section",
        },
    ]
});

/// An author or affiliation line buffered for `\maketitle` assembly.
#[derive(Debug, Clone)]
pub struct AuthorEntry {
    pub text: String,
}

/// Everything the walker produced from one document pass.
#[derive(Debug, Clone, Default)]
pub struct WalkOutput {
    pub pre_title: String,
    pub title: String,
    pub abstract_text: String,
    pub keywords_text: String,
    pub body: String,
    pub authors: Vec<AuthorEntry>,
    /// Raw image bytes extracted for figures, in emission order, paired
    /// with a caller-assigned asset filename.
    pub figure_assets: Vec<(String, Vec<u8>)>,
}

struct ListStack {
    depths: Vec<i32>,
}

impl ListStack {
    fn new() -> Self {
        Self { depths: Vec::new() }
    }

    fn reach(&mut self, num_id: i32, ilvl: u32, out: &mut String) {
        let target = ilvl as usize + 1;
        while self.depths.len() > target {
            out.push_str("\\end{itemize}\n");
            self.depths.pop();
        }
        while self.depths.len() < target {
            out.push_str("\\begin{itemize}\n");
            self.depths.push(num_id);
        }
    }

    fn close_all(&mut self, out: &mut String) {
        while self.depths.pop().is_some() {
            out.push_str("\\end{itemize}\n");
        }
    }
}

/// Walk `doc`'s block sequence and produce region-filed LaTeX fragments.
#[must_use]
pub fn walk(doc: &Document) -> WalkOutput {
    let mut out = WalkOutput::default();
    let mut classifier = SemanticClassifier::default();
    let mut list_stack = ListStack::new();
    let mut consumed: HashSet<usize> = HashSet::new();
    let mut bibliography_open_prev = false;
    let mut image_counter: u32 = 0;
    let mut table_counter: u32 = 0;
    let mut non_empty_paragraphs: usize = 0;
    let mut previously_seen_dims: Vec<(i64, i64)> = Vec::new();
    let mut pending_table_caption: Option<String> = None;
    let total_blocks = doc.blocks.len();

    for (block_index, block) in doc.blocks.iter().enumerate() {
        if consumed.contains(&block_index) {
            continue;
        }

        match block {
            Block::Table(tbl) => {
                list_stack.close_all(target_buffer(&mut out, classifier.region(), bibliography_open_prev));
                table_counter += 1;
                let caption = pending_table_caption.take();
                render_table(tbl, table_counter, &mut out, &classifier, total_blocks, caption.as_deref());
            }
            Block::Paragraph(p) => {
                let text = p.plain_text();
                let trimmed = text.trim();

                if matches!(doc.blocks.get(block_index + 1), Some(Block::Table(_)))
                    && TABLE_CAPTION_RE.is_match(trimmed)
                {
                    pending_table_caption = Some(TABLE_CAPTION_RE.replace(trimmed, "").trim().to_string());
                    consumed.insert(block_index);
                    continue;
                }

                let style_action = lookup_style(&p.style);
                if !trimmed.is_empty() {
                    non_empty_paragraphs += 1;
                }

                let region = classifier.advance(p, style_action, block_index);
                let bib_open = classifier.bibliography_open();

                if let Some(n) = p.numbering.as_ref() {
                    let buf = target_buffer(&mut out, region, bib_open);
                    list_stack.reach(n.num_id, n.ilvl, buf);
                } else {
                    let buf = target_buffer(&mut out, region, bib_open);
                    list_stack.close_all(buf);
                }

                match style_action {
                    Some(StyleAction::Drop) => {}
                    Some(StyleAction::Title) => {
                        out.title.push_str(&render_paragraph_content(p));
                        out.title.push(' ');
                    }
                    Some(StyleAction::Subtitle) => {
                        let buf = target_buffer(&mut out, region, bib_open);
                        buf.push_str(&format!("\\subtitle{{{}}}\n", render_paragraph_content(p)));
                    }
                    Some(StyleAction::AcmAuthor) => {
                        out.authors.push(AuthorEntry { text: render_paragraph_content(p) });
                    }
                    Some(StyleAction::DisplayEquation) => {
                        let math = extract_math(p);
                        let buf = target_buffer(&mut out, region, bib_open);
                        if math.trim().is_empty() {
                            buf.push_str(&format!("{}\n\n", render_paragraph_content(p)));
                        } else {
                            buf.push_str(&format!("\\begin{{equation}}\n  {math}\n\\end{{equation}}\n\n"));
                        }
                    }
                    Some(StyleAction::Bibliography) => {
                        let buf = target_buffer(&mut out, region, bib_open);
                        if !bibliography_open_prev {
                            buf.push_str("\\begin{thebibliography}{99}\n");
                        }
                        buf.push_str(&format!("\\bibitem{{ref{block_index}}} {}\n", render_paragraph_content(p)));
                    }
                    Some(StyleAction::Section(level)) => {
                        emit_heading(p, level, region, bib_open, &mut out);
                    }
                    Some(StyleAction::Abstract) => {
                        handle_default_paragraph(p, &mut out, region, bib_open);
                    }
                    None => {
                        handle_default_paragraph(p, &mut out, region, bib_open);
                    }
                }

                if bibliography_open_prev && !bib_open {
                    out.body.push_str("\\end{thebibliography}\n\n");
                }
                bibliography_open_prev = bib_open;

                handle_images(
                    p,
                    doc,
                    block_index,
                    total_blocks,
                    region,
                    bib_open,
                    classifier.region() < Region::Body,
                    non_empty_paragraphs,
                    &trimmed.to_string(),
                    &mut image_counter,
                    &mut previously_seen_dims,
                    &mut out,
                    &mut consumed,
                );
            }
        }
    }

    list_stack.close_all(&mut out.body);
    if bibliography_open_prev {
        out.body.push_str("\\end{thebibliography}\n\n");
    }
    out
}

fn target_buffer<'a>(out: &'a mut WalkOutput, region: Region, _bib_open: bool) -> &'a mut String {
    match region {
        Region::PreTitle => &mut out.pre_title,
        Region::Title => &mut out.title,
        Region::Abstract => &mut out.abstract_text,
        Region::Keywords => &mut out.keywords_text,
        Region::Body => &mut out.body,
    }
}

fn render_paragraph_content(p: &Paragraph) -> String {
    crate::content::render_inline_text(p)
}

fn extract_math(p: &Paragraph) -> String {
    for child in &p.children {
        if let Inline::Math(node) = child {
            let latex = doctex_math::render::render(node);
            if !latex.trim().is_empty() {
                return latex;
            }
        }
        if let Inline::EquationObject(eq) = child {
            let latex = doctex_math::mtef::translate(&eq.compound_blob);
            if !latex.trim().is_empty() {
                return latex;
            }
        }
    }
    String::new()
}

fn emit_heading(p: &Paragraph, level: u8, region: Region, bib_open: bool, out: &mut WalkOutput) {
    let content = render_paragraph_content(p);
    let starred = OUTLINE_NUMBER_RE.is_match(p.plain_text().trim());
    let command = match level {
        1 => "section",
        2 => "subsection",
        3 => "subsubsection",
        _ => "paragraph",
    };
    let star = if starred { "*" } else { "" };
    let buf = target_buffer(out, region, bib_open);
    buf.push_str(&format!("\\{command}{star}{{{content}}}\n\n"));
}

fn handle_default_paragraph(p: &Paragraph, out: &mut WalkOutput, region: Region, bib_open: bool) {
    let trimmed_src = p.plain_text();
    let trimmed = trimmed_src.trim();

    if (p.style.is_empty() || p.style == "Normal") && trimmed.chars().count() < HEADING_CONTENT_MAX_CHARS {
        for pat in HEADING_PATTERNS.iter() {
            if pat.re.is_match(trimmed) {
                let starred = OUTLINE_NUMBER_RE.is_match(trimmed);
                let star = if starred { "*" } else { "" };
                let buf = target_buffer(out, region, bib_open);
                buf.push_str(&format!("\\{}{star}{{{}}}\n\n", pat.command, doctex_core::escape::escape_latex(trimmed)));
                return;
            }
        }
    }

    let content = render_paragraph_content(p);
    if content.trim().is_empty() {
        return;
    }
    if region == Region::Keywords {
        let buf = target_buffer(out, region, bib_open);
        buf.push_str(&format!("\\textbf{{Keywords:}} {content}\n\n"));
        return;
    }
    let buf = target_buffer(out, region, bib_open);
    buf.push_str(&content);
    buf.push_str("\n\n");
}

#[allow(clippy::too_many_arguments)]
fn handle_images(
    p: &Paragraph,
    doc: &Document,
    block_index: usize,
    total_blocks: usize,
    region: Region,
    bib_open: bool,
    in_front_matter: bool,
    non_empty_paragraphs: usize,
    paragraph_text: &str,
    image_counter: &mut u32,
    previously_seen_dims: &mut Vec<(i64, i64)>,
    out: &mut WalkOutput,
    consumed: &mut HashSet<usize>,
) {
    let images: Vec<_> = p
        .children
        .iter()
        .filter_map(|c| if let Inline::Image(img) = c { Some(img) } else { None })
        .collect();
    if images.is_empty() {
        return;
    }

    let mut accepted = Vec::new();
    for img in &images {
        let ctx = ImageContext {
            width_emu: img.width_emu,
            height_emu: img.height_emu,
            owning_style: p.style.as_str(),
            paragraph_text,
            in_front_matter,
            paragraphs_seen: non_empty_paragraphs,
            total_blocks,
            block_index,
            previously_seen_dims,
        };
        match classify(&ctx, &img.blob) {
            Classification::Content => {
                previously_seen_dims.push((img.width_emu, img.height_emu));
                accepted.push(img);
            }
            Classification::Decorative => {}
            Classification::Undecodable => {
                tracing::warn!(block_index, "embedded image failed to decode; dropping");
            }
        }
    }
    if accepted.is_empty() {
        return;
    }

    let small_inline = accepted.len() == 1
        && accepted[0].width_emu < INLINE_IMAGE_MAX_EMU
        && accepted[0].height_emu < INLINE_IMAGE_MAX_EMU
        && paragraph_text.chars().count() >= INLINE_TEXT_MIN_CHARS;

    if small_inline {
        *image_counter += 1;
        let ext = image_extension(&accepted[0].content_type);
        let filename = format!("hinh_{}.{ext}", *image_counter);
        out.figure_assets.push((filename.clone(), accepted[0].blob.clone()));
        let buf = target_buffer(out, region, bib_open);
        buf.push_str(&format!("\\includegraphics[height=1.2em]{{{filename}}}"));
        buf.push_str("\n\n");
        return;
    }

    let mut subcaptions: Vec<String> = Vec::new();
    if accepted.len() > 1 {
        if let Some(Block::Paragraph(sibling)) = doc.blocks.get(block_index + 1) {
            let sibling_text = sibling.plain_text();
            if SUBCAPTION_ROW_RE.is_match(sibling_text.trim()) {
                subcaptions = sibling_text
                    .split('(')
                    .filter(|s| !s.trim().is_empty())
                    .map(|s| format!("({}", s.trim_end()))
                    .collect();
                consumed.insert(block_index + 1);
            }
        }
    }

    let caption = find_figure_caption(doc, block_index, consumed);

    let buf_is_body = region == Region::Body;
    let buf = target_buffer(out, region, bib_open);
    buf.push_str("\\begin{figure}[htbp]\n  \\centering\n");
    let mut last_num = *image_counter;
    for (i, img) in accepted.iter().enumerate() {
        *image_counter += 1;
        last_num = *image_counter;
        let ext = image_extension(&img.content_type);
        let filename = format!("hinh_{last_num}.{ext}");
        out.figure_assets.push((filename.clone(), img.blob.clone()));
        let width = if accepted.len() > 1 {
            format!("{:.2}", 0.9 / accepted.len() as f64)
        } else {
            "0.8".to_string()
        };
        buf.push_str(&format!(
            "  \\begin{{subfigure}}[b]{{{width}\\textwidth}}\n    \\includegraphics[width=\\textwidth]{{{filename}}}\n"
        ));
        if let Some(sub) = subcaptions.get(i) {
            buf.push_str(&format!("    \\caption{{{}}}\n", doctex_core::escape::escape_latex(sub)));
        }
        buf.push_str("  \\end{subfigure}\n");
    }
    if let Some(cap) = &caption {
        buf.push_str(&format!("  \\caption{{{}}}\n", doctex_core::escape::escape_latex(cap)));
    }
    buf.push_str(&format!("  \\label{{fig:hinh{last_num}}}\n\\end{{figure}}\n\n"));
    let _ = buf_is_body;
}

/// Map a content-type string to the LaTeX-safe asset extension, following
/// the teacher's `jpg`-if-`jpeg`-else-`png` rule.
fn image_extension(content_type: &str) -> &'static str {
    if content_type.contains("jpeg") {
        "jpg"
    } else {
        "png"
    }
}

fn find_figure_caption(doc: &Document, block_index: usize, consumed: &HashSet<usize>) -> Option<String> {
    for offset in 1..=CAPTION_LOOKAHEAD {
        let idx = block_index + offset;
        if consumed.contains(&idx) {
            continue;
        }
        match doc.blocks.get(idx) {
            Some(Block::Table(_)) => break,
            Some(Block::Paragraph(p)) => {
                if lookup_style(&p.style).map(|a| matches!(a, StyleAction::Section(_))).unwrap_or(false) {
                    break;
                }
                let text = p.plain_text();
                if FIGURE_CAPTION_RE.is_match(text.trim()) {
                    let stripped = FIGURE_CAPTION_RE.replace(text.trim(), "").into_owned();
                    return Some(stripped);
                }
            }
            None => break,
        }
    }
    None
}

fn render_table(
    tbl: &Table,
    table_number: u32,
    out: &mut WalkOutput,
    classifier: &SemanticClassifier,
    total_blocks: usize,
    caption: Option<&str>,
) {
    let position_percent = if total_blocks > 0 {
        (tbl.index as f32 / total_blocks as f32) * 100.0
    } else {
        0.0
    };
    let ctx = TableContext { position_percent, tables_seen: table_number };
    let kind = table::classify(tbl, &ctx);

    let rendered = table::render(tbl, kind, caption, table_number);
    let region = classifier.region();
    let bib_open = classifier.bibliography_open();
    let buf = target_buffer(out, region, bib_open);
    buf.push_str(&rendered);
}
