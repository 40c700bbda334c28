//! OMML (Office Math Markup) → LaTeX translator.
//!
//! Three independent strategies, tried in order; the first non-empty
//! result wins:
//!
//! 1. [`structured`] — recognise the fixed OMML element vocabulary and
//!    build a [`MathNode`] tree directly.
//! 2. [`external`] — delegate to a host-provided OMML → MathML → LaTeX
//!    converter, if one is registered.
//! 3. [`last_resort`] — concatenate run text and map it through the
//!    Unicode → LaTeX character table.

use crate::ast::{AccentKind, BarKind, MatrixEnv};
use crate::ast::MathNode;
use crate::render::render;
use crate::tables::{self, ACCENT_CHAR_MAP};
use crate::xmltree::{parse_fragment, XmlNode};

/// A host-provided OMML → MathML → LaTeX pipeline.
/// The core ships no implementation — an external XSLT engine or a
/// `MathML`-to-LaTeX crate is out of scope for this translator — but the
/// fallback chain is wired to call one if the embedding application
/// registers it.
pub trait ExternalMathConverter {
    /// Returns `None`/empty string if the conversion is unavailable or
    /// failed; the fallback chain treats both identically.
    fn convert(&self, omml_xml: &str) -> Option<String>;
}

/// Translate an OMML subtree (e.g. the text of one `<m:oMath>…</m:oMath>`
/// element) to a LaTeX math string, trying each strategy in order and
/// returning the first non-empty result.
#[must_use]
pub fn translate(omml_xml: &str, external: Option<&dyn ExternalMathConverter>) -> String {
    if let Some(tree) = parse_fragment(omml_xml) {
        let node = structured(&tree);
        let rendered = render(&node);
        if !rendered.trim().is_empty() {
            return rendered;
        }
    } else {
        tracing::warn!("OMML fragment failed to parse; falling back");
    }

    if let Some(conv) = external {
        if let Some(result) = conv.convert(omml_xml) {
            if !result.trim().is_empty() {
                return result;
            }
        }
    }

    last_resort(omml_xml)
}

/// Strategy 1: structured translation over the fixed OMML vocabulary.
/// Unknown elements degrade to traversing their children.
#[must_use]
pub fn structured(node: &XmlNode) -> MathNode {
    match node.tag.as_str() {
        "oMath" | "oMathPara" => group_children(node),
        "r" => MathNode::char(run_text(node)),
        "t" => MathNode::char(node.text.clone()),
        "f" => translate_fraction(node),
        "rad" => translate_radical(node),
        "sSup" => translate_sup(node),
        "sSub" => translate_sub(node),
        "sSubSup" => translate_subsup(node),
        "nary" => translate_nary(node),
        "d" => translate_delimiter(node),
        "func" => translate_func(node),
        "limLow" | "limUpp" => translate_limit(node),
        "acc" => translate_accent(node),
        "bar" => translate_bar(node),
        "eqArr" => translate_eq_array(node),
        "m" => translate_matrix(node),
        "borderBox" => group_children(node),
        _ => group_children(node),
    }
}

fn group_children(node: &XmlNode) -> MathNode {
    if !node.children.is_empty() {
        MathNode::group(node.children.iter().map(structured).collect())
    } else {
        MathNode::char(node.text.clone())
    }
}

/// Concatenated text of every `m:t`/`w:t` descendant, in document order.
fn run_text(node: &XmlNode) -> String {
    if node.tag == "t" {
        return node.text.clone();
    }
    let mut out = String::new();
    for child in &node.children {
        out.push_str(&run_text(child));
    }
    if out.is_empty() {
        out.push_str(&node.text);
    }
    out
}

fn base_node(node: &XmlNode) -> MathNode {
    node.child("e").map_or_else(|| MathNode::char(""), structured)
}

fn translate_fraction(node: &XmlNode) -> MathNode {
    let no_bar = node
        .child("fPr")
        .and_then(|pr| pr.child("type"))
        .and_then(|t| t.attr("val"))
        .is_some_and(|v| v == "noBar" || v == "lin");
    let num = node.child("num").map_or_else(|| MathNode::char(""), structured);
    let den = node.child("den").map_or_else(|| MathNode::char(""), structured);
    if no_bar {
        // A bar-less fraction still renders with \frac in the absence of a
        // dedicated binomial primitive in the shared AST; callers that need
        // \genfrac semantics can special-case `no_bar` before rendering.
        MathNode::Frac(Box::new(num), Box::new(den))
    } else {
        MathNode::Frac(Box::new(num), Box::new(den))
    }
}

fn translate_radical(node: &XmlNode) -> MathNode {
    let radicand = node.child("e").map_or_else(|| MathNode::char(""), structured);
    let has_degree = node
        .child("radPr")
        .and_then(|pr| pr.child("degHide"))
        .and_then(|d| d.attr("val"))
        .is_none_or(|v| v == "0" || v == "false");
    let degree = if has_degree {
        node.child("deg").map(structured)
    } else {
        None
    };
    MathNode::Root(degree.map(Box::new), Box::new(radicand))
}

fn translate_sup(node: &XmlNode) -> MathNode {
    let base = base_node(node);
    let sup = node.child("sup").map_or_else(|| MathNode::char(""), structured);
    MathNode::Sup(Box::new(base), Box::new(sup))
}

fn translate_sub(node: &XmlNode) -> MathNode {
    let base = base_node(node);
    let sub = node.child("sub").map_or_else(|| MathNode::char(""), structured);
    MathNode::Sub(Box::new(base), Box::new(sub))
}

fn translate_subsup(node: &XmlNode) -> MathNode {
    let base = base_node(node);
    let sub = node.child("sub").map_or_else(|| MathNode::char(""), structured);
    let sup = node.child("sup").map_or_else(|| MathNode::char(""), structured);
    MathNode::SubSup(Box::new(base), Box::new(sub), Box::new(sup))
}

fn translate_nary(node: &XmlNode) -> MathNode {
    let symbol = node
        .child("naryPr")
        .and_then(|pr| pr.child("chr"))
        .and_then(|c| c.attr("val"))
        .and_then(|s| s.chars().next())
        .unwrap_or('∑');
    let op = tables::nary_symbol_for(symbol).to_string();
    let lower = node.child("sub").map(|n| Box::new(structured(n)));
    let upper = node.child("sup").map(|n| Box::new(structured(n)));
    let body = node.child("e").map_or_else(|| MathNode::char(""), structured);
    MathNode::Nary {
        op,
        lower,
        upper,
        body: Box::new(body),
    }
}

fn translate_delimiter(node: &XmlNode) -> MathNode {
    let open = node
        .child("dPr")
        .and_then(|pr| pr.child("begChr"))
        .and_then(|c| c.attr("val"))
        .and_then(|s| s.chars().next())
        .unwrap_or('(');
    let close = node
        .child("dPr")
        .and_then(|pr| pr.child("endChr"))
        .and_then(|c| c.attr("val"))
        .and_then(|s| s.chars().next())
        .unwrap_or(')');
    let inner = node
        .children_named("e")
        .map(structured)
        .collect::<Vec<_>>();
    let inner = if inner.len() == 1 {
        inner.into_iter().next().unwrap()
    } else {
        MathNode::Group(inner)
    };
    MathNode::Delim(open, close, Box::new(inner))
}

fn translate_func(node: &XmlNode) -> MathNode {
    let name = node
        .child("fName")
        .map(run_text)
        .unwrap_or_default()
        .trim()
        .to_string();
    let arg = node.child("e").map_or_else(|| MathNode::char(""), structured);
    MathNode::Func(name, Box::new(arg))
}

fn translate_limit(node: &XmlNode) -> MathNode {
    let base = node.child("e").map_or_else(|| MathNode::char(""), structured);
    let lim = node.child("lim").map(structured);
    match lim {
        Some(lim) if node.tag == "limUpp" => {
            MathNode::Nary {
                op: String::new(),
                lower: None,
                upper: Some(Box::new(lim)),
                body: Box::new(base),
            }
        }
        Some(lim) => MathNode::Sub(Box::new(base), Box::new(lim)),
        None => base,
    }
}

fn translate_accent(node: &XmlNode) -> MathNode {
    let base = node.child("e").map_or_else(|| MathNode::char(""), structured);
    let kind = node
        .child("accPr")
        .and_then(|pr| pr.child("chr"))
        .and_then(|c| c.attr("val"))
        .and_then(|s| s.chars().next())
        .and_then(|c| ACCENT_CHAR_MAP.get(&c).copied())
        .unwrap_or(AccentKind::Hat);
    MathNode::Accent(kind, Box::new(base))
}

fn translate_bar(node: &XmlNode) -> MathNode {
    let base = node.child("e").map_or_else(|| MathNode::char(""), structured);
    let pos = node
        .child("barPr")
        .and_then(|pr| pr.child("pos"))
        .and_then(|p| p.attr("val"))
        .unwrap_or("top");
    let kind = if pos == "bot" {
        BarKind::Under
    } else {
        BarKind::Over
    };
    MathNode::Bar(kind, Box::new(base))
}

fn translate_eq_array(node: &XmlNode) -> MathNode {
    let rows: Vec<MathNode> = node.children_named("e").map(structured).collect();
    MathNode::Group(rows)
}

fn translate_matrix(node: &XmlNode) -> MathNode {
    let mrs: Vec<&XmlNode> = node.children_named("mr").collect();
    let rows = mrs.len();
    let cols = mrs.first().map_or(0, |r| r.children_named("e").count());
    let mut cells = Vec::with_capacity(rows * cols);
    for mr in &mrs {
        for e in mr.children_named("e") {
            cells.push(structured(e));
        }
    }
    MathNode::Matrix {
        env: MatrixEnv::Plain,
        rows,
        cols,
        cells,
    }
}

/// Strategy 3: concatenate run text and map every character through the
/// Unicode → LaTeX table.
#[must_use]
pub fn last_resort(omml_xml: &str) -> String {
    let text = parse_fragment(omml_xml).map_or_else(
        || strip_tags(omml_xml),
        |tree| tree.all_text(),
    );
    tables::unicode_to_latex_text(text.trim())
}

/// Crude tag stripper used only when the fragment didn't even parse as
/// well-formed XML — the absolute last resort of the last resort.
fn strip_tags(xml: &str) -> String {
    let mut out = String::with_capacity(xml.len());
    let mut in_tag = false;
    for c in xml.chars() {
        match c {
            '<' => in_tag = true,
            '>' => in_tag = false,
            _ if !in_tag => out.push(c),
            _ => {}
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn translates_simple_fraction() {
        let xml = r#"<m:oMath><m:f><m:num><m:r><m:t>a</m:t></m:r></m:num><m:den><m:r><m:t>b</m:t></m:r></m:den></m:f></m:oMath>"#;
        let out = translate(xml, None);
        assert_eq!(out, "\\frac{a}{b}");
    }

    #[test]
    fn translates_superscript() {
        let xml = r#"<m:oMath><m:sSup><m:e><m:r><m:t>x</m:t></m:r></m:e><m:sup><m:r><m:t>2</m:t></m:r></m:sup></m:sSup></m:oMath>"#;
        let out = translate(xml, None);
        assert_eq!(out, "x^{2}");
    }

    #[test]
    fn translates_nary_sum_with_default_fallback() {
        let xml = r#"<m:oMath><m:nary><m:naryPr><m:chr m:val="&#8721;"/></m:naryPr>
            <m:sub><m:r><m:t>i=1</m:t></m:r></m:sub>
            <m:sup><m:r><m:t>n</m:t></m:r></m:sup>
            <m:e><m:r><m:t>i</m:t></m:r></m:e></m:nary></m:oMath>"#;
        let out = translate(xml, None);
        assert_eq!(out, "\\sum_{i=1}^{n}i");
    }

    #[test]
    fn falls_back_to_last_resort_on_empty_structured_result() {
        // An element with no recognised structure and no text degrades to
        // an empty Group, so the fallback chain reaches last_resort, which
        // still yields empty text here — proving the chain doesn't panic.
        let xml = "<m:unknownElem/>";
        let out = translate(xml, None);
        assert_eq!(out, "");
    }

    #[test]
    fn last_resort_maps_greek_letters() {
        let xml = "<m:oMath><m:r><m:t>πr</m:t></m:r></m:oMath>";
        // Structured translation already handles plain runs, so this also
        // exercises strategy 1 producing readable output without needing
        // the Unicode table; verify strategy 3 standalone instead.
        let _ = xml;
        let text_only = last_resort("<m:t>πr</m:t>");
        assert!(text_only.contains("\\pi"));
    }

    #[test]
    fn unknown_element_degrades_to_child_traversal() {
        let xml = r#"<m:weird><m:r><m:t>x</m:t></m:r></m:weird>"#;
        let tree = parse_fragment(xml).unwrap();
        let node = structured(&tree);
        assert_eq!(render(&node), "x");
    }
}
