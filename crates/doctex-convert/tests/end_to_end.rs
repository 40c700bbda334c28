//! End-to-end scenarios against the walker, table renderer, and template
//! injector, exercising them the way `convert_document` wires them
//! together rather than through a full `.docx` container round-trip.

use doctex_core::model::{
    Alignment, Block, Cell, Document, EmbeddedEquationObject, Inline, NumberingProps, Paragraph, Row, Run,
    RunFormatting, Table, VMerge,
};
use doctex_math::ast::MathNode;
use doctex_convert::table::{self, TableContext};
use doctex_convert::template;
use doctex_convert::walker::{self, AuthorEntry, WalkOutput};

fn run(text: &str) -> Inline {
    Inline::Run(Run { text: text.to_string(), formatting: RunFormatting::default() })
}

fn paragraph(style: &str, children: Vec<Inline>) -> Paragraph {
    Paragraph { index: 0, style: style.to_string(), numbering: None, alignment: Alignment::Left, children }
}

fn list_item(text: &str, num_id: i32, ilvl: u32) -> Paragraph {
    Paragraph {
        index: 0,
        style: "ListParagraph".to_string(),
        numbering: Some(NumberingProps { num_id, ilvl }),
        alignment: Alignment::Left,
        children: vec![run(text)],
    }
}

/// Title/Abstract/Heading-1 paragraphs that walk the semantic classifier
/// all the way to `Region::Body`, so a paragraph appended after these
/// lands in `out.body` instead of `out.pre_title`.
fn body_entry_blocks() -> Vec<Block> {
    vec![
        Block::Paragraph(paragraph("Title", vec![run("My Great Paper")])),
        Block::Paragraph(paragraph("Abstract", vec![run("Some abstract text here that is long.")])),
        Block::Paragraph(paragraph("Heading 1", vec![run("Introduction")])),
    ]
}

#[test]
fn minimal_paragraph_scenario() {
    let mut blocks = body_entry_blocks();
    blocks.push(Block::Paragraph(paragraph("Normal", vec![run("Hello % world")])));
    let doc = Document { blocks, relationships: Default::default() };
    let out = walker::walk(&doc);
    assert!(out.body.ends_with("Hello \\% world\n\n"));
}

#[test]
fn heading_plus_list_scenario() {
    let mut blocks = body_entry_blocks();
    blocks.extend([
        Block::Paragraph(paragraph("Normal", vec![run("1. Introduction")])),
        Block::Paragraph(list_item("First point", 1, 0)),
        Block::Paragraph(list_item("Second point", 1, 0)),
        Block::Paragraph(paragraph("Normal", vec![run("Closing remarks follow the list.")])),
    ]);
    let doc = Document { blocks, relationships: Default::default() };
    let out = walker::walk(&doc);

    let heading_at = out.body.find("\\section*{1. Introduction}").expect("heading emitted");
    let begin_at = out.body.find("\\begin{itemize}").expect("list opened");
    let first_item_at = out.body.find("First point").expect("first item rendered");
    let second_item_at = out.body.find("Second point").expect("second item rendered");
    let end_at = out.body.find("\\end{itemize}").expect("list closed");
    let closing_at = out.body.find("Closing remarks").expect("trailing text rendered");

    assert!(heading_at < begin_at);
    assert!(begin_at < first_item_at);
    assert!(first_item_at < second_item_at);
    assert!(second_item_at < end_at);
    assert!(end_at < closing_at);
}

#[test]
fn modern_math_scenario() {
    let frac = MathNode::Frac(Box::new(MathNode::Char("a".to_string())), Box::new(MathNode::Char("b".to_string())));
    let mut blocks = body_entry_blocks();
    blocks.push(Block::Paragraph(paragraph("Normal", vec![run("X is "), Inline::Math(frac), run(" Y")])));
    let doc = Document { blocks, relationships: Default::default() };
    let out = walker::walk(&doc);
    assert!(out.body.contains("X is $\\frac{a}{b}$ Y"));
}

#[test]
fn legacy_equation_scenario() {
    let blob = build_equation_native_compound_file();
    let mut blocks = body_entry_blocks();
    blocks.push(Block::Paragraph(paragraph(
        "Normal",
        vec![Inline::EquationObject(EmbeddedEquationObject { compound_blob: blob })],
    )));
    let doc = Document { blocks, relationships: Default::default() };
    let out = walker::walk(&doc);
    assert!(out.body.contains("\\frac{a}{b}"));
}

/// Build a minimal OLE compound file with an `Equation Native` stream
/// holding one MTEF fraction record (`a` over `b`), mirroring the shape
/// `doctex_math::mtef::extract_equation_native` expects: a 4-byte LE
/// header-length prefix, that many header bytes, then the 5-byte MTEF
/// stream header, then the record stream.
fn build_equation_native_compound_file() -> Vec<u8> {
    const TAG_END: u8 = 0;
    const TAG_CHAR: u8 = 2;
    const TAG_TMPL: u8 = 3;

    let mut mtef = vec![3, 0, 0, 0, 0]; // version, platform, product, pver, subver
    mtef.push(TAG_TMPL);
    mtef.push(11); // fraction selector
    mtef.push(0); // variation, no continuation
    mtef.push(TAG_CHAR);
    mtef.push(128 + 1); // typeface 1 (Variable), biased
    mtef.extend_from_slice(&u16::from(b'a').to_le_bytes());
    mtef.push(TAG_END);
    mtef.push(TAG_CHAR);
    mtef.push(128 + 1);
    mtef.extend_from_slice(&u16::from(b'b').to_le_bytes());
    mtef.push(TAG_END);

    let mut stream = 0u32.to_le_bytes().to_vec(); // zero-length header
    stream.extend_from_slice(&mtef);

    let temp = tempfile::NamedTempFile::new().unwrap();
    {
        let file = std::fs::File::create(temp.path()).unwrap();
        let mut comp = cfb::CompoundFile::create(file).unwrap();
        let mut inner = comp.create_stream("Equation Native").unwrap();
        std::io::Write::write_all(&mut inner, &stream).unwrap();
    }
    std::fs::read(temp.path()).unwrap()
}

#[test]
fn merged_cell_table_scenario() {
    fn text_cell(text: &str, grid_span: u32, vmerge: VMerge) -> Cell {
        Cell {
            children: vec![Block::Paragraph(paragraph("Normal", vec![run(text)]))],
            grid_span,
            vmerge,
        }
    }

    let tbl = Table {
        index: 0,
        rows: vec![
            Row { cells: vec![text_cell("Merged header", 2, VMerge::None)] },
            Row {
                cells: vec![
                    text_cell("Left", 1, VMerge::Restart),
                    text_cell("Right one", 1, VMerge::None),
                ],
            },
        ],
    };

    let ctx = TableContext { position_percent: 50.0, tables_seen: 1 };
    let kind = table::classify(&tbl, &ctx);
    let rendered = table::render(&tbl, kind, None, 1);

    let row0 = rendered.lines().find(|l| l.contains("Merged header")).unwrap();
    assert!(row0.contains("\\multicolumn{2}{|p{4cm}|}{Merged header}"));
    assert!(row0.trim_end().ends_with("\\\\"));

    let row1 = rendered.lines().find(|l| l.contains("Right one")).unwrap();
    assert!(row1.contains(" & "));
    assert!(row1.trim_end().ends_with("\\\\"));

    for line in rendered.lines().filter(|l| l.contains("\\\\")) {
        let idx = rendered.find(line).unwrap();
        let after = &rendered[idx + line.len()..];
        assert!(after.trim_start().starts_with("\\hline"));
    }
}

#[test]
fn structured_template_injection_scenario() {
    let output = WalkOutput {
        title: "T".to_string(),
        abstract_text: "A".to_string(),
        authors: vec![AuthorEntry { text: "Author Name".to_string() }],
        ..Default::default()
    };
    let template_text =
        "\\documentclass{article}\n\\begin{document}\n\\title{DUMMY}\n\\begin{abstract}OLD\\end{abstract}\n\\end{document}";
    let out = template::inject(template_text, &output);
    assert!(out.contains("\\title{T}"));
    assert!(out.contains("\\begin{abstract}\nA\n\\end{abstract}"));
}
