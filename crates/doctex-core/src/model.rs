//! The document data model.
//!
//! A [`Document`] is an ordered sequence of [`Block`]s. Everything here is a
//! plain tagged-union data structure: XML element names are resolved once
//! at parse time (in `doctex-convert`) into these variants, never re-parsed
//! at emission time. This is a "duck-typed traversal" model, deliberately
//! simpler than dispatching on raw element names at every call site.

use doctex_math::ast::MathNode;
use std::collections::HashMap;

/// One top-level element of the document body, in source order.
#[derive(Debug, Clone, PartialEq)]
pub enum Block {
    Paragraph(Paragraph),
    Table(Table),
}

/// Named formatting run or structural style carried by a paragraph.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NumberingProps {
    pub num_id: i32,
    pub ilvl: u32,
}

/// Paragraph-level horizontal alignment (`w:jc`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Alignment {
    #[default]
    Left,
    Center,
    Right,
    Justify,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Paragraph {
    /// Stable index into the parent document's block list; used for
    /// look-ahead/look-behind (captions, figure grouping, TOC caption
    /// consumption).
    pub index: usize,
    /// Named paragraph style (e.g. `"Heading 1"`, `"Normal"`).
    pub style: String,
    pub numbering: Option<NumberingProps>,
    pub alignment: Alignment,
    pub children: Vec<Inline>,
}

impl Paragraph {
    /// Concatenated plain text of every text-bearing child, ignoring
    /// formatting — used by heuristics that only look at raw content
    /// (heading detection, abstract/keyword label matching, caption
    /// prefix stripping).
    #[must_use]
    pub fn plain_text(&self) -> String {
        let mut out = String::new();
        for child in &self.children {
            match child {
                Inline::Run(r) => out.push_str(&r.text),
                Inline::Hyperlink(h) => {
                    for r in &h.runs {
                        out.push_str(&r.text);
                    }
                }
                Inline::Math(_) | Inline::Image(_) | Inline::EquationObject(_) => {}
            }
        }
        out
    }

    /// True if every run carries bold formatting (vacuously false for a
    /// paragraph with no runs — an empty paragraph is never a title).
    #[must_use]
    pub fn all_bold(&self) -> bool {
        let mut saw_run = false;
        for child in &self.children {
            if let Inline::Run(r) = child {
                if r.text.trim().is_empty() {
                    continue;
                }
                saw_run = true;
                if !r.formatting.bold {
                    return false;
                }
            }
        }
        saw_run
    }

    /// Largest explicit font size among the paragraph's runs, in points.
    #[must_use]
    pub fn max_font_size_pt(&self) -> Option<f32> {
        self.children
            .iter()
            .filter_map(|c| match c {
                Inline::Run(r) => r.formatting.size_half_points,
                _ => None,
            })
            .max()
            .map(|hp| hp as f32 / 2.0)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Inline {
    Run(Run),
    Hyperlink(Hyperlink),
    Math(MathNode),
    Image(EmbeddedImage),
    EquationObject(EmbeddedEquationObject),
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RunFormatting {
    pub bold: bool,
    pub italic: bool,
    /// Foreground colour as an uppercase 6-hex-digit RGB string, if set.
    pub color_rgb: Option<String>,
    /// Named highlight colour (e.g. `"yellow"`), if set.
    pub highlight: Option<String>,
    /// Font size in half-points (`w:sz`'s native unit), if explicitly set.
    pub size_half_points: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Run {
    pub text: String,
    pub formatting: RunFormatting,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Hyperlink {
    /// Resolved absolute URL, after relationship-id lookup.
    pub url: String,
    pub runs: Vec<Run>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmbeddedImage {
    pub blob: Vec<u8>,
    pub content_type: String,
    pub width_emu: i64,
    pub height_emu: i64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmbeddedEquationObject {
    /// Raw bytes of the OLE compound-file object containing the
    /// `Equation Native` stream.
    pub compound_blob: Vec<u8>,
}

/// Vertical-merge state of a table cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum VMerge {
    #[default]
    None,
    Restart,
    Continue,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Cell {
    pub children: Vec<Block>,
    pub grid_span: u32,
    pub vmerge: VMerge,
}

impl Cell {
    #[must_use]
    pub fn plain_text(&self) -> String {
        let mut out = String::new();
        for block in &self.children {
            if let Block::Paragraph(p) = block {
                out.push_str(&p.plain_text());
                out.push(' ');
            }
        }
        out.trim_end().to_string()
    }

    #[must_use]
    pub fn contains_image(&self) -> bool {
        self.children.iter().any(|b| match b {
            Block::Paragraph(p) => p
                .children
                .iter()
                .any(|c| matches!(c, Inline::Image(_) | Inline::EquationObject(_))),
            Block::Table(_) => false,
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Row {
    pub cells: Vec<Cell>,
}

/// A table addressed by (row, grid-column). `grid_col` is the merge-grid
/// column index, distinct from the row's source child index.
#[derive(Debug, Clone, PartialEq)]
pub struct Table {
    pub index: usize,
    pub rows: Vec<Row>,
}

impl Table {
    #[must_use]
    pub fn col_count(&self) -> usize {
        self.rows
            .iter()
            .map(|r| r.cells.iter().map(|c| c.grid_span as usize).sum())
            .max()
            .unwrap_or(0)
    }
}

/// The whole parsed document: its block sequence, the resolved
/// relationship-id → URL/target map, and any document-level metadata the
/// walker needs.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Document {
    pub blocks: Vec<Block>,
    /// `r:id` → target (URL for hyperlinks, media part path for images).
    pub relationships: HashMap<String, String>,
}
