//! Parse `word/document.xml` (plus the resolved `styles.xml` name table)
//! into the [`doctex_core::model::Document`] tree.
//!
//! Reuses `doctex_math::xmltree` as the XML parsing primitive instead of
//! standing up a second streaming parser: element/attribute names are
//! already resolved to their local (unprefixed) form there, which is all
//! this parser or the OMML translator ever dispatch on.

use crate::container::{resolve_part_path, OpcPackage};
use doctex_core::error::{DoctexError, Result};
use doctex_core::model::{
    Alignment, Block, Cell, Document, EmbeddedEquationObject, EmbeddedImage, Hyperlink, Inline,
    NumberingProps, Paragraph, Row, Run, RunFormatting, Table, VMerge,
};
use doctex_math::ast::MathNode;
use doctex_math::xmltree::{parse_fragment, XmlNode};
use std::collections::HashMap;

struct ParseCtx<'a> {
    relationships: &'a HashMap<String, String>,
    media: &'a HashMap<String, Vec<u8>>,
    embeddings: &'a HashMap<String, Vec<u8>>,
    style_names: HashMap<String, String>,
}

/// Parse the package's main document part into the block-sequence model.
pub fn parse_document(pkg: &OpcPackage) -> Result<Document> {
    let tree = parse_fragment(&pkg.document_xml)
        .ok_or_else(|| DoctexError::XmlError("word/document.xml did not parse".to_string()))?;
    let body = tree
        .child("body")
        .ok_or_else(|| DoctexError::XmlError("word/document.xml has no w:body".to_string()))?;

    let style_names = pkg
        .styles_xml
        .as_deref()
        .map(parse_style_names)
        .unwrap_or_default();

    let ctx = ParseCtx {
        relationships: &pkg.relationships,
        media: &pkg.media,
        embeddings: &pkg.embeddings,
        style_names,
    };

    let mut index = 0usize;
    let mut blocks = Vec::new();
    for child in &body.children {
        match child.tag.as_str() {
            "p" => blocks.push(Block::Paragraph(parse_paragraph(child, &ctx, &mut index))),
            "tbl" => blocks.push(Block::Table(parse_table(child, &ctx, &mut index))),
            _ => {}
        }
    }

    Ok(Document {
        blocks,
        relationships: pkg.relationships.clone(),
    })
}

/// `styleId` → display name (`<w:style w:styleId="Heading1"><w:name w:val="heading 1"/>`),
/// case-normalised to Word's own Title Case display convention (`"Heading 1"`).
fn parse_style_names(styles_xml: &str) -> HashMap<String, String> {
    let mut out = HashMap::new();
    if let Some(tree) = parse_fragment(styles_xml) {
        for style in tree.children_named("style") {
            if let (Some(id), Some(name_node)) = (style.attr("styleId"), style.child("name")) {
                if let Some(name) = name_node.attr("val") {
                    out.insert(id.to_string(), name.to_string());
                }
            }
        }
    }
    out
}

fn find_descendant<'a>(node: &'a XmlNode, tag: &str) -> Option<&'a XmlNode> {
    if node.tag == tag {
        return Some(node);
    }
    node.children.iter().find_map(|c| find_descendant(c, tag))
}

fn parse_paragraph(p: &XmlNode, ctx: &ParseCtx, index: &mut usize) -> Paragraph {
    let my_index = *index;
    *index += 1;

    let ppr = p.child("pPr");
    let style_id = ppr.and_then(|pr| pr.child("pStyle")).and_then(|s| s.attr("val"));
    let style = style_id
        .and_then(|id| ctx.style_names.get(id).cloned())
        .or_else(|| style_id.map(str::to_string))
        .unwrap_or_else(|| "Normal".to_string());

    let numbering = ppr.and_then(|pr| pr.child("numPr")).and_then(|np| {
        let num_id = np
            .child("numId")
            .and_then(|n| n.attr("val"))
            .and_then(|v| v.parse::<i32>().ok())?;
        let ilvl = np
            .child("ilvl")
            .and_then(|n| n.attr("val"))
            .and_then(|v| v.parse::<u32>().ok())
            .unwrap_or(0);
        Some(NumberingProps { num_id, ilvl })
    });

    let alignment = ppr
        .and_then(|pr| pr.child("jc"))
        .and_then(|jc| jc.attr("val"))
        .map(|v| match v {
            "center" => Alignment::Center,
            "right" | "end" => Alignment::Right,
            "both" | "distribute" => Alignment::Justify,
            _ => Alignment::Left,
        })
        .unwrap_or_default();

    let mut children = Vec::new();
    for child in &p.children {
        match child.tag.as_str() {
            "r" => children.push(parse_run_child(child, ctx)),
            "hyperlink" => children.push(parse_hyperlink(child, ctx)),
            "oMath" | "oMathPara" => children.push(Inline::Math(translate_omml_node(child))),
            _ => {}
        }
    }

    Paragraph {
        index: my_index,
        style,
        numbering,
        alignment,
        children,
    }
}

/// A `w:r` can carry plain text, a `w:drawing` (image), or a `w:object`
/// (legacy equation); these are mutually exclusive in practice.
fn parse_run_child(r: &XmlNode, ctx: &ParseCtx) -> Inline {
    if let Some(drawing) = r.child("drawing") {
        if let Some(image) = parse_image(drawing, ctx) {
            return Inline::Image(image);
        }
    }
    if let Some(object) = r.child("object") {
        if let Some(eq) = parse_equation_object(object, ctx) {
            return Inline::EquationObject(eq);
        }
    }
    Inline::Run(parse_run(r))
}

fn parse_run(r: &XmlNode) -> Run {
    let rpr = r.child("rPr");

    let bold = bool_prop(rpr, "b");
    let italic = bool_prop(rpr, "i");
    let color_rgb = rpr
        .and_then(|pr| pr.child("color"))
        .and_then(|c| c.attr("val"))
        .filter(|v| *v != "auto")
        .map(|v| v.to_uppercase());
    let highlight = rpr
        .and_then(|pr| pr.child("highlight"))
        .and_then(|h| h.attr("val"))
        .filter(|v| *v != "none")
        .map(str::to_string);
    let size_half_points = rpr
        .and_then(|pr| pr.child("sz"))
        .and_then(|s| s.attr("val"))
        .and_then(|v| v.parse::<u32>().ok());

    let mut text = String::new();
    for child in &r.children {
        match child.tag.as_str() {
            "t" => text.push_str(&child.text),
            "tab" => text.push('\t'),
            "br" | "cr" => text.push('\n'),
            _ => {}
        }
    }

    Run {
        text,
        formatting: RunFormatting {
            bold,
            italic,
            color_rgb,
            highlight,
            size_half_points,
        },
    }
}

/// An on/off run property (`w:b`, `w:i`) is true unless explicitly turned
/// off with `w:val="false"`/`"0"`.
fn bool_prop(rpr: Option<&XmlNode>, tag: &str) -> bool {
    match rpr.and_then(|pr| pr.child(tag)) {
        Some(el) => match el.attr("val") {
            Some(v) => v != "false" && v != "0",
            None => true,
        },
        None => false,
    }
}

fn parse_hyperlink(link: &XmlNode, ctx: &ParseCtx) -> Inline {
    let url = link
        .attr("id")
        .and_then(|id| ctx.relationships.get(id))
        .cloned()
        .unwrap_or_default();
    let runs = link.children_named("r").map(parse_run).collect();
    Inline::Hyperlink(Hyperlink { url, runs })
}

fn parse_image(drawing: &XmlNode, ctx: &ParseCtx) -> Option<EmbeddedImage> {
    let anchor = drawing.child("inline").or_else(|| drawing.child("anchor"))?;
    let extent = anchor.child("extent")?;
    let width_emu = extent.attr("cx")?.parse::<i64>().ok()?;
    let height_emu = extent.attr("cy")?.parse::<i64>().ok()?;

    let blip = find_descendant(anchor, "blip")?;
    let rel_id = blip.attr("embed")?;
    let target = ctx.relationships.get(rel_id)?;
    let part_path = resolve_part_path(target);
    let blob = ctx.media.get(&part_path)?.clone();
    let content_type = content_type_for(&part_path);

    Some(EmbeddedImage {
        blob,
        content_type,
        width_emu,
        height_emu,
    })
}

fn content_type_for(part_path: &str) -> String {
    let ext = part_path.rsplit('.').next().unwrap_or("").to_lowercase();
    match ext.as_str() {
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "bmp" => "image/bmp",
        "emf" => "image/x-emf",
        "wmf" => "image/x-wmf",
        _ => "application/octet-stream",
    }
    .to_string()
}

fn parse_equation_object(object: &XmlNode, ctx: &ParseCtx) -> Option<EmbeddedEquationObject> {
    let ole = find_descendant(object, "OLEObject")?;
    let rel_id = ole.attr("id")?;
    let target = ctx.relationships.get(rel_id)?;
    let part_path = resolve_part_path(target);
    let compound_blob = ctx.embeddings.get(&part_path)?.clone();
    Some(EmbeddedEquationObject { compound_blob })
}

/// Translate an already-parsed `m:oMath`/`m:oMathPara` subtree to a
/// [`MathNode`]. Equivalent to [`doctex_math::omml::translate`]'s
/// structured-then-last-resort chain, but operating directly on the parsed
/// tree instead of re-serialising it back to XML text: no
/// `ExternalMathConverter` is registered anywhere in this crate, so
/// strategy 2 of that chain would never fire here anyway.
fn translate_omml_node(node: &XmlNode) -> MathNode {
    let structured = doctex_math::omml::structured(node);
    let rendered = doctex_math::render::render(&structured);
    if !rendered.trim().is_empty() {
        return structured;
    }
    tracing::warn!("OMML subtree produced empty structured translation; using character fallback");
    let text = doctex_math::tables::unicode_to_latex_text(node.all_text().trim());
    MathNode::char(text)
}

fn parse_table(tbl: &XmlNode, ctx: &ParseCtx, index: &mut usize) -> Table {
    let my_index = *index;
    *index += 1;
    let rows = tbl.children_named("tr").map(|tr| parse_row(tr, ctx, index)).collect();
    Table {
        index: my_index,
        rows,
    }
}

fn parse_row(tr: &XmlNode, ctx: &ParseCtx, index: &mut usize) -> Row {
    Row {
        cells: tr.children_named("tc").map(|tc| parse_cell(tc, ctx, index)).collect(),
    }
}

fn parse_cell(tc: &XmlNode, ctx: &ParseCtx, index: &mut usize) -> Cell {
    let tcpr = tc.child("tcPr");
    let grid_span = tcpr
        .and_then(|pr| pr.child("gridSpan"))
        .and_then(|g| g.attr("val"))
        .and_then(|v| v.parse::<u32>().ok())
        .unwrap_or(1);
    let vmerge = tcpr
        .and_then(|pr| pr.child("vMerge"))
        .map(|v| match v.attr("val") {
            Some("restart") => VMerge::Restart,
            _ => VMerge::Continue,
        })
        .unwrap_or(VMerge::None);

    let mut children = Vec::new();
    for child in &tc.children {
        match child.tag.as_str() {
            "p" => children.push(Block::Paragraph(parse_paragraph(child, ctx, index))),
            "tbl" => children.push(Block::Table(parse_table(child, ctx, index))),
            _ => {}
        }
    }

    Cell {
        children,
        grid_span,
        vmerge,
    }
}
