//! Table classification and rendering: seven behaviourally distinct table
//! kinds, tried in priority order, first match wins.

use crate::content::render_inline_text;
use doctex_core::escape::escape_latex;
use doctex_core::model::{Block, Cell, Row, Table, VMerge};
use doctex_math::render::render as render_math;
use once_cell::sync::Lazy;
use regex::Regex;

const METADATA_MARKERS: [&str; 4] = ["ARTICLE INFO", "ABSTRACT", "TÓM TẮT", "ARTICLE INFORMATION"];

const JOURNAL_VOCAB: [&str; 19] = [
    "ARTICLE INFORMATION",
    "ARTICLE TITLE",
    "JOURNAL:",
    "ISSN:",
    "ABSTRACT",
    "KEYWORDS:",
    "TỪ KHÓA:",
    "AUTHOR",
    "AFFILIATION",
    "CORRESPONDENCE",
    "CITATION",
    "RECEIVED:",
    "ACCEPTED:",
    "PUBLISHED:",
    "DOI:",
    "OPEN ACCESS",
    "TÓM TẮT",
    "VOLUME:",
    "ISSUE:",
];

static EQUATION_NUMBER_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\(\d+\)$").unwrap());
static CHAPTER_CELL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^(CH[UƯ][OƠ]NG|CHAPTER|PH[AẦ]N|PART|M[UỤ]C)\s*\d").unwrap());
static NUMBERED_HEADING_CELL_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\d+\.?\d*\.?\s+[A-ZÀ-Ỹ]").unwrap());
static SUBCAPTION_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\(([a-z])\)\s*(.*)$").unwrap());

/// What kind of table this is, carrying just enough to render it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TableKind {
    Metadata,
    AuthorBio,
    ArticleFrontLayout,
    EquationTable,
    TableOfContents,
    FigureCarrier,
    Default,
}

/// Walker-visible context a table's classification needs.
pub struct TableContext {
    pub position_percent: f32,
    pub tables_seen: u32,
}

#[must_use]
pub fn classify(table: &Table, ctx: &TableContext) -> TableKind {
    if is_metadata_block(table, ctx) {
        TableKind::Metadata
    } else if is_author_bio(table) {
        TableKind::AuthorBio
    } else if is_article_front_layout(table, ctx) {
        TableKind::ArticleFrontLayout
    } else if is_equation_table(table) {
        TableKind::EquationTable
    } else if is_table_of_contents(table, ctx) {
        TableKind::TableOfContents
    } else if is_figure_carrier(table) {
        TableKind::FigureCarrier
    } else {
        TableKind::Default
    }
}

fn row_text_upper(row: &Row) -> String {
    row.cells.iter().map(|c| c.plain_text().to_uppercase()).collect::<Vec<_>>().join(" ")
}

fn is_metadata_block(table: &Table, ctx: &TableContext) -> bool {
    if ctx.tables_seen > 5 {
        return false;
    }
    let header: String = table
        .rows
        .iter()
        .take(2)
        .map(row_text_upper)
        .collect::<Vec<_>>()
        .join(" ");
    METADATA_MARKERS.iter().any(|m| header.contains(m))
}

fn is_author_bio(table: &Table) -> bool {
    if table.col_count() != 2 {
        return false;
    }
    let Some(first_row) = table.rows.first() else { return false };
    if first_row.cells.len() < 2 {
        return false;
    }
    let has_image = first_row.cells.iter().any(Cell::contains_image);
    let text_len = first_row.cells[0].plain_text().len() + first_row.cells[1].plain_text().len();
    has_image && text_len > 50
}

fn is_article_front_layout(table: &Table, ctx: &TableContext) -> bool {
    if ctx.position_percent > 25.0 {
        return false;
    }
    let all_text: String = table
        .rows
        .iter()
        .take(10)
        .map(row_text_upper)
        .collect::<Vec<_>>()
        .join(" ");
    let hits = JOURNAL_VOCAB.iter().filter(|term| all_text.contains(*term)).count();
    hits >= 3
}

fn is_equation_table(table: &Table) -> bool {
    if table.col_count() != 2 || table.rows.is_empty() {
        return false;
    }
    let numbered = table
        .rows
        .iter()
        .filter(|row| {
            row.cells
                .last()
                .is_some_and(|c| EQUATION_NUMBER_RE.is_match(c.plain_text().trim()))
        })
        .count();
    (numbered as f32 / table.rows.len() as f32) >= 0.5
}

fn is_table_of_contents(table: &Table, ctx: &TableContext) -> bool {
    if table.rows.len() < 5 || ctx.position_percent > 30.0 {
        return false;
    }
    let window = &table.rows[..table.rows.len().min(5)];
    let header: String = window.iter().map(row_text_upper).collect::<Vec<_>>().join(" ");
    let has_label = header.contains("MỤC LỤC") || header.contains("TABLE OF CONTENTS");

    let scan = &table.rows[..table.rows.len().min(20)];
    let mut dot_leaders = 0u32;
    let mut trailing_page_numbers = 0u32;
    let mut chapter_structure = 0u32;
    for row in scan {
        if row.cells.is_empty() {
            continue;
        }
        let joined: String = row.cells.iter().map(Cell::plain_text).collect();
        if joined.contains(".....") || joined.contains('…') {
            dot_leaders += 1;
        }
        if row.cells.len() >= 2 {
            let last = row.cells.last().unwrap().plain_text();
            let last = last.trim();
            if !last.is_empty() && last.len() <= 4 && last.chars().all(|c| c.is_ascii_digit()) {
                trailing_page_numbers += 1;
            }
            let first = row.cells[0].plain_text().trim().to_uppercase();
            if CHAPTER_CELL_RE.is_match(&first) || NUMBERED_HEADING_CELL_RE.is_match(&first) {
                chapter_structure += 1;
            }
        }
    }
    let checked = scan.len() as f32;

    if has_label && (dot_leaders >= 3 || trailing_page_numbers >= 5) {
        return true;
    }
    dot_leaders as f32 > checked * 0.5 && trailing_page_numbers as f32 > checked * 0.5 && chapter_structure >= 3
}

fn is_figure_carrier(table: &Table) -> bool {
    let mut cells_with_image = 0u32;
    let mut cells_with_long_text = 0u32;
    let mut total = 0u32;
    for row in &table.rows {
        for cell in &row.cells {
            total += 1;
            if cell.contains_image() {
                cells_with_image += 1;
                continue;
            }
            let text = cell.plain_text();
            if text.len() > 20 {
                cells_with_long_text += 1;
            }
        }
    }
    if total == 0 || cells_with_image == 0 {
        return false;
    }
    cells_with_long_text <= 1 || (cells_with_image as f32 / total as f32) >= 0.3
}

/// Render the table per its kind. `caption` is the look-behind caption
/// text for the default data-table case (already stripped of its
/// `Table N:`/`BẢNG N:` prefix by the walker).
#[must_use]
pub fn render(table: &Table, kind: TableKind, caption: Option<&str>, table_number: u32) -> String {
    match kind {
        TableKind::Metadata => render_metadata(table),
        TableKind::AuthorBio => render_author_bio(table),
        TableKind::ArticleFrontLayout => render_article_front_layout(table),
        TableKind::EquationTable => render_equation_table(table),
        TableKind::TableOfContents | TableKind::FigureCarrier => String::new(),
        TableKind::Default => render_default(table, caption, table_number),
    }
}

fn render_cell_text(cell: &Cell) -> String {
    cell.children
        .iter()
        .filter_map(|b| match b {
            Block::Paragraph(p) => Some(render_inline_text(p)),
            Block::Table(_) => None,
        })
        .filter(|s| !s.trim().is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

fn render_metadata(table: &Table) -> String {
    let mut col1 = Vec::new();
    let mut col2 = Vec::new();
    for row in &table.rows {
        if let Some(c) = row.cells.first() {
            col1.push(render_cell_text(c));
        }
        if row.cells.len() >= 2 {
            col2.push(render_cell_text(&row.cells[1]));
        }
    }
    format!(
        "\\vspace{{0.5cm}}\n\\noindent\n\\begin{{minipage}}[t]{{0.30\\textwidth}}\n{}\n\\end{{minipage}}\n\\hfill\n\\begin{{minipage}}[t]{{0.65\\textwidth}}\n{}\n\\end{{minipage}}\n\\vspace{{0.5cm}}\n",
        col1.join("\n"),
        col2.join("\n"),
    )
}

fn render_author_bio(table: &Table) -> String {
    let mut out = String::new();
    for row in &table.rows {
        if row.cells.len() < 2 {
            continue;
        }
        let (image_cell, text_cell) = if row.cells[0].contains_image() {
            (&row.cells[0], &row.cells[1])
        } else if row.cells[1].contains_image() {
            (&row.cells[1], &row.cells[0])
        } else {
            continue;
        };
        let _ = image_cell;
        let text = render_cell_text(text_cell);
        out.push_str("\\vspace{0.3cm}\n\\noindent\n");
        out.push_str("\\begin{minipage}[t]{0.2\\textwidth}\n\\vspace{0pt}\n");
        out.push_str("% portrait image extracted separately by the walker\n");
        out.push_str("\\end{minipage}\n\\hfill\n");
        out.push_str("\\begin{minipage}[t]{0.75\\textwidth}\n\\vspace{0pt}\n");
        out.push_str(&text);
        out.push_str("\n\\end{minipage}\n\\vspace{0.3cm}\n");
    }
    out
}

fn render_article_front_layout(table: &Table) -> String {
    let mut seen = std::collections::HashSet::new();
    let mut out = String::new();
    for row in &table.rows {
        for cell in &row.cells {
            let text = cell.plain_text();
            if text.trim().len() <= 2 {
                continue;
            }
            let rendered = render_cell_text(cell);
            let trimmed = rendered.trim().to_string();
            if trimmed.is_empty() || seen.contains(&trimmed) {
                continue;
            }
            seen.insert(trimmed.clone());
            out.push_str(&rendered);
            out.push_str("\n\n");
        }
    }
    out
}

/// The left cell's math content: the first `Math`/`EquationObject` inline
/// found in its paragraphs, or its escaped plain text as a last resort.
fn translate_cell_math(cell: &Cell) -> String {
    for block in &cell.children {
        let Block::Paragraph(p) = block else { continue };
        for inline in &p.children {
            match inline {
                doctex_core::model::Inline::Math(node) => {
                    let latex = render_math(node);
                    if !latex.trim().is_empty() {
                        return latex;
                    }
                }
                doctex_core::model::Inline::EquationObject(eq) => {
                    let latex = doctex_math::mtef::translate(&eq.compound_blob);
                    if !latex.trim().is_empty() {
                        return latex;
                    }
                }
                _ => {}
            }
        }
    }
    escape_latex(cell.plain_text().trim())
}

fn render_equation_table(table: &Table) -> String {
    let mut out = String::new();
    for row in &table.rows {
        if row.cells.len() < 2 {
            continue;
        }
        let number_text = row.cells.last().unwrap().plain_text();
        let Some(caps) = EQUATION_NUMBER_RE.captures(number_text.trim()) else {
            continue;
        };
        let _ = caps;
        let number: String = number_text
            .trim()
            .trim_start_matches('(')
            .trim_end_matches(')')
            .to_string();
        let formula = translate_cell_math(&row.cells[0]);
        out.push_str("\\begin{equation}\n");
        if formula.trim().is_empty() {
            out.push_str(&format!("  \\text{{[Equation {number}]}}\n"));
        } else {
            out.push_str(&format!("  {formula}\n"));
        }
        out.push_str(&format!("  \\tag{{{number}}}\n"));
        out.push_str("\\end{equation}\n\n");
    }
    out
}

/// Subcaption labels `(a) ...`/`(b) ...` found anywhere in the table, in
/// the order encountered.
#[must_use]
pub fn find_subcaptions(table: &Table) -> Vec<String> {
    let mut out = Vec::new();
    for row in &table.rows {
        for cell in &row.cells {
            let text = cell.plain_text();
            if let Some(caps) = SUBCAPTION_RE.captures(text.trim()) {
                let label = &caps[1];
                let desc = caps[2].trim();
                if desc.is_empty() {
                    out.push(format!("({label})"));
                } else {
                    out.push(format!("({label}) {desc}"));
                }
            }
        }
    }
    out
}

fn row_column_starts(row: &Row) -> Vec<usize> {
    let mut col = 0usize;
    let mut starts = Vec::with_capacity(row.cells.len());
    for cell in &row.cells {
        starts.push(col);
        col += cell.grid_span.max(1) as usize;
    }
    starts
}

fn compute_rowspan(table: &Table, row_idx: usize, col: usize) -> usize {
    let mut rowspan = 1;
    let mut r = row_idx + 1;
    while r < table.rows.len() {
        let starts = row_column_starts(&table.rows[r]);
        let Some(idx) = starts.iter().position(|&c| c == col) else { break };
        if table.rows[r].cells[idx].vmerge == VMerge::Continue {
            rowspan += 1;
            r += 1;
        } else {
            break;
        }
    }
    rowspan
}

fn render_default(table: &Table, caption: Option<&str>, table_number: u32) -> String {
    let col_count = table.col_count().max(1);
    let cols_spec = format!("|{}|", vec!["p{2cm}"; col_count].join("|"));

    let mut out = String::new();
    out.push_str("\\begin{table}[htbp]\n  \\centering\n");
    out.push_str(&format!("  \\begin{{tabular}}{{{cols_spec}}}\n  \\hline\n"));

    for (r, row) in table.rows.iter().enumerate() {
        let starts = row_column_starts(row);
        let mut tokens: Vec<String> = Vec::new();
        for (i, cell) in row.cells.iter().enumerate() {
            let col = starts[i];
            let span = cell.grid_span.max(1) as usize;
            if cell.vmerge == VMerge::Continue {
                for _ in 0..span {
                    tokens.push(String::new());
                }
                continue;
            }
            let rowspan = compute_rowspan(table, r, col);
            let mut content = render_cell_text(cell);
            if rowspan > 1 {
                content = format!("\\multirow{{{rowspan}}}{{*}}{{{content}}}");
            }
            if span > 1 {
                let width = (2 * span).max(2);
                content = format!("\\multicolumn{{{span}}}{{|p{{{width}cm}}|}}{{{content}}}");
            }
            tokens.push(content);
        }
        tokens.truncate(col_count);
        out.push_str("    ");
        out.push_str(&tokens.join(" & "));
        out.push_str(" \\\\\n  \\hline\n");
    }

    out.push_str("  \\end{tabular}\n");
    out.push_str(&format!("  \\caption{{{}}}\n", caption.unwrap_or("")));
    out.push_str(&format!("  \\label{{tab:table{table_number}}}\n"));
    out.push_str("\\end{table}\n\n");
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use doctex_core::model::{Inline, Paragraph, Run};

    fn text_cell(text: &str, grid_span: u32, vmerge: VMerge) -> Cell {
        Cell {
            children: vec![Block::Paragraph(Paragraph {
                index: 0,
                style: "Normal".to_string(),
                numbering: None,
                alignment: doctex_core::model::Alignment::Left,
                children: vec![Inline::Run(Run {
                    text: text.to_string(),
                    formatting: Default::default(),
                })],
            })],
            grid_span,
            vmerge,
        }
    }

    #[test]
    fn classifies_metadata_block() {
        let table = Table {
            index: 0,
            rows: vec![Row {
                cells: vec![text_cell("ARTICLE INFO", 1, VMerge::None), text_cell("Abstract text", 1, VMerge::None)],
            }],
        };
        let ctx = TableContext { position_percent: 1.0, tables_seen: 0 };
        assert_eq!(classify(&table, &ctx), TableKind::Metadata);
    }

    #[test]
    fn classifies_equation_table() {
        let table = Table {
            index: 0,
            rows: vec![
                Row { cells: vec![text_cell("a/b", 1, VMerge::None), text_cell("(1)", 1, VMerge::None)] },
                Row { cells: vec![text_cell("c/d", 1, VMerge::None), text_cell("(2)", 1, VMerge::None)] },
            ],
        };
        let ctx = TableContext { position_percent: 50.0, tables_seen: 0 };
        assert_eq!(classify(&table, &ctx), TableKind::EquationTable);
    }

    #[test]
    fn merge_grid_renders_colspan_and_rowspan() {
        let table = Table {
            index: 0,
            rows: vec![
                Row { cells: vec![text_cell("Header", 2, VMerge::None)] },
                Row {
                    cells: vec![
                        text_cell("A", 1, VMerge::Restart),
                        text_cell("B", 1, VMerge::None),
                    ],
                },
                Row {
                    cells: vec![text_cell("", 1, VMerge::Continue), text_cell("D", 1, VMerge::None)],
                },
            ],
        };
        let out = render_default(&table, None, 1);
        assert!(out.contains("\\multicolumn{2}"));
        assert!(out.contains("\\multirow{2}"));
    }

    #[test]
    fn default_grid_row_token_count_matches_column_count() {
        let table = Table {
            index: 0,
            rows: vec![Row {
                cells: vec![text_cell("a", 2, VMerge::None), text_cell("b", 1, VMerge::None)],
            }],
        };
        assert_eq!(table.col_count(), 3);
        let out = render_default(&table, None, 1);
        let row_line = out.lines().find(|l| l.contains('&')).unwrap();
        // col_count is 3, but the span-2 cell is one `\multicolumn` token
        // that already consumes both of its columns, so the row has only
        // two tokens total and one ampersand.
        assert_eq!(row_line.matches('&').count(), 1);
    }

    #[test]
    fn finds_subcaptions() {
        let table = Table {
            index: 0,
            rows: vec![Row {
                cells: vec![text_cell("(a) left view", 1, VMerge::None), text_cell("(b) right view", 1, VMerge::None)],
            }],
        };
        let caps = find_subcaptions(&table);
        assert_eq!(caps, vec!["(a) left view".to_string(), "(b) right view".to_string()]);
    }
}
