//! MTEF (legacy `MathType`/Equation-Editor binary) → LaTeX translator.
//!
//! Two phases: [`extract_equation_native`] opens the OLE compound-file blob
//! and returns the raw `Equation Native` byte stream; [`decode`] parses
//! that stream into a [`MathNode`] tree. Rendering reuses
//! [`crate::render::render`], the same pure function the OMML translator
//! uses, so the balance invariant is proven once for both translators.

use crate::ast::{AccentKind, BarKind, MathNode, MatrixEnv};
use crate::tables;
use std::io::{Cursor, Read};

/// Fence characters recognised when collecting TMPL 0..9 delimiters.
const FENCE_CHARS: &[char] = &[
    '(', ')', '[', ']', '{', '}', '|', '⟨', '⟩', '⌊', '⌋', '⌈', '⌉',
];

/// Open the OLE compound-file blob and return the raw MTEF byte stream
/// from its `Equation Native` part.
///
/// # Errors
/// Returns an error message if the blob isn't a valid compound file or
/// has no `Equation Native` stream.
pub fn extract_equation_native(compound_blob: &[u8]) -> Result<Vec<u8>, String> {
    let cursor = Cursor::new(compound_blob);
    let mut comp =
        cfb::CompoundFile::open(cursor).map_err(|e| format!("not an OLE compound file: {e}"))?;
    let mut stream = comp
        .open_stream("Equation Native")
        .map_err(|e| format!("no Equation Native stream: {e}"))?;
    let mut raw = Vec::new();
    stream
        .read_to_end(&mut raw)
        .map_err(|e| format!("failed reading Equation Native: {e}"))?;

    if raw.len() < 4 {
        return Err("Equation Native stream shorter than header length field".to_string());
    }
    let header_len = u32::from_le_bytes([raw[0], raw[1], raw[2], raw[3]]) as usize;
    let start = 4 + header_len;
    if start > raw.len() {
        return Err("Equation Native header length exceeds stream size".to_string());
    }
    Ok(raw[start..].to_vec())
}

/// Decode an MTEF byte stream (already past the 4-byte header-length
/// prefix) into a [`MathNode`] tree.
///
/// # Errors
/// Returns an error message if the 5-byte MTEF header is missing.
pub fn decode(mtef_stream: &[u8]) -> Result<MathNode, String> {
    let mut cur = Cursor8::new(mtef_stream);
    // version, platform, product, product-version, sub-version
    if cur.take(5).is_none() {
        return Err("MTEF stream shorter than the 5-byte format header".to_string());
    }
    let lanes = parse_sequence(&mut cur);
    Ok(lanes_to_node(&lanes))
}

/// Decode a legacy equation compound-file blob straight to LaTeX,
/// combining extraction and decoding with the shared renderer.
#[must_use]
pub fn translate(compound_blob: &[u8]) -> String {
    match extract_equation_native(compound_blob).and_then(|s| decode(&s)) {
        Ok(node) => final_cleanup(&crate::render::render(&node)),
        Err(e) => {
            tracing::warn!("MTEF translation degraded: {e}");
            String::new()
        }
    }
}

// ---------------------------------------------------------------------
// Byte cursor
// ---------------------------------------------------------------------

struct Cursor8<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> Cursor8<'a> {
    const fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    fn read_u8(&mut self) -> Option<u8> {
        let b = *self.data.get(self.pos)?;
        self.pos += 1;
        Some(b)
    }

    fn read_u16le(&mut self) -> Option<u16> {
        let lo = u16::from(self.read_u8()?);
        let hi = u16::from(self.read_u8()?);
        Some(lo | (hi << 8))
    }

    fn take(&mut self, n: usize) -> Option<&'a [u8]> {
        if self.pos + n > self.data.len() {
            return None;
        }
        let slice = &self.data[self.pos..self.pos + n];
        self.pos += n;
        Some(slice)
    }

    fn at_end(&self) -> bool {
        self.pos >= self.data.len()
    }
}

// ---------------------------------------------------------------------
// Record tags (low nibble of the tag byte step 2)
// ---------------------------------------------------------------------

const TAG_END: u8 = 0;
const TAG_LINE: u8 = 1;
const TAG_CHAR: u8 = 2;
const TAG_TMPL: u8 = 3;
const TAG_PILE: u8 = 4;
const TAG_MATRIX: u8 = 5;
const TAG_EMBELL: u8 = 6;
const TAG_RULER: u8 = 7;
const TAG_FONT_STYLE_DEF: u8 = 8;
const TAG_SIZE: u8 = 9;
const TAG_SIZE_FULL: u8 = 10;
const TAG_SIZE_SUB: u8 = 11;
const TAG_SIZE_SUB2: u8 = 12;
const TAG_SIZE_SYM: u8 = 13;
const TAG_SIZE_SUBSYM: u8 = 14;

const fn tag_kind(byte: u8) -> u8 {
    byte & 0x0F
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Lane {
    Full,
    Sub,
    Sub2,
    Sym,
    SubSym,
}

/// One partition of a record sequence, split by size-marker records
///. Each lane may hold multiple LINEs.
#[derive(Default, Clone)]
struct LaneBuf {
    lines: Vec<Vec<MathNode>>,
}

impl LaneBuf {
    fn push(&mut self, node: MathNode) {
        if self.lines.is_empty() {
            self.lines.push(Vec::new());
        }
        self.lines.last_mut().unwrap().push(node);
    }

    fn new_line(&mut self) {
        self.lines.push(Vec::new());
    }

    fn is_empty(&self) -> bool {
        self.lines.iter().all(Vec::is_empty)
    }

    /// One [`MathNode`] per line, atoms within a line grouped together.
    fn line_nodes(&self) -> Vec<MathNode> {
        self.lines
            .iter()
            .map(|atoms| MathNode::group(atoms.clone()))
            .collect()
    }

    /// All lines flattened into a single node (used when a lane is
    /// expected to hold one expression, not several piled lines).
    fn flat_node(&self) -> MathNode {
        let all: Vec<MathNode> = self.lines.iter().flatten().cloned().collect();
        MathNode::group(all)
    }

    fn first_char(&self) -> Option<char> {
        self.lines.iter().flatten().find_map(|n| match n {
            MathNode::Char(s) => s.chars().next(),
            _ => None,
        })
    }
}

#[derive(Default)]
struct Lanes {
    full: LaneBuf,
    sub: LaneBuf,
    sub2: LaneBuf,
    sym: LaneBuf,
    subsym: LaneBuf,
}

impl Lanes {
    fn lane_mut(&mut self, l: Lane) -> &mut LaneBuf {
        match l {
            Lane::Full => &mut self.full,
            Lane::Sub => &mut self.sub,
            Lane::Sub2 => &mut self.sub2,
            Lane::Sym => &mut self.sym,
            Lane::SubSym => &mut self.subsym,
        }
    }
}

fn lanes_to_node(lanes: &Lanes) -> MathNode {
    lanes.full.flat_node()
}

/// Font style implied by a CHAR record's typeface byte (bias 128). The byte
/// values below follow the Equation-Editor typeface slot ordering (symbol,
/// variable, function, text, vector, number); any other value passes
/// through unwrapped.
#[derive(Clone, Copy, PartialEq, Eq)]
enum MtefFontStyle {
    Symbol,
    Variable,
    Function,
    Text,
    Vector,
    Number,
    Other,
}

const fn font_style_from_typeface(biased: u8) -> MtefFontStyle {
    match biased {
        0 => MtefFontStyle::Symbol,
        1 => MtefFontStyle::Variable,
        2 => MtefFontStyle::Function,
        3 => MtefFontStyle::Text,
        4 => MtefFontStyle::Vector,
        5 => MtefFontStyle::Number,
        _ => MtefFontStyle::Other,
    }
}

fn render_char(ch: char, style: MtefFontStyle) -> String {
    let mapped = tables::UNICODE_TO_LATEX
        .get(&ch)
        .map_or_else(|| ch.to_string(), |s| format!(" {s} "));
    match style {
        MtefFontStyle::Function => format!("\\mathrm{{{mapped}}}"),
        MtefFontStyle::Text => format!("\\text{{{mapped}}}"),
        MtefFontStyle::Vector => format!("\\boldsymbol{{{mapped}}}"),
        MtefFontStyle::Symbol | MtefFontStyle::Variable | MtefFontStyle::Number | MtefFontStyle::Other => mapped,
    }
}

// ---------------------------------------------------------------------
// Record sequence parsing — used for the top-level stream, PILE bodies,
// MATRIX cells, and each TMPL slot, all of which are "records up to the
// next structurally-matching END".
// ---------------------------------------------------------------------

fn parse_sequence(cur: &mut Cursor8) -> Lanes {
    let mut lanes = Lanes::default();
    let mut current = Lane::Full;
    loop {
        let Some(tag) = cur.read_u8() else { break };
        match tag_kind(tag) {
            TAG_END => break,
            TAG_LINE => lanes.lane_mut(current).new_line(),
            TAG_CHAR => {
                let Some(typeface_raw) = cur.read_u8() else {
                    break;
                };
                let typeface = typeface_raw.wrapping_sub(128);
                let Some(code) = cur.read_u16le() else {
                    break;
                };
                let ch = char::from_u32(u32::from(code)).unwrap_or('?');
                let style = font_style_from_typeface(typeface);
                lanes
                    .lane_mut(current)
                    .push(MathNode::char(render_char(ch, style)));
            }
            TAG_TMPL => {
                let node = parse_tmpl(cur);
                lanes.lane_mut(current).push(node);
            }
            TAG_PILE => {
                let node = parse_pile(cur);
                lanes.lane_mut(current).push(node);
            }
            TAG_MATRIX => {
                let node = parse_matrix(cur);
                lanes.lane_mut(current).push(node);
            }
            TAG_EMBELL | TAG_RULER | TAG_FONT_STYLE_DEF | TAG_SIZE => {
                // Skipped step 2; these records carry no
                // payload this translator needs.
            }
            TAG_SIZE_FULL => current = Lane::Full,
            TAG_SIZE_SUB => current = Lane::Sub,
            TAG_SIZE_SUB2 => current = Lane::Sub2,
            TAG_SIZE_SYM => current = Lane::Sym,
            TAG_SIZE_SUBSYM => current = Lane::SubSym,
            _ => {}
        }
        if cur.at_end() {
            break;
        }
    }
    lanes
}

fn parse_pile(cur: &mut Cursor8) -> MathNode {
    let _alignment = cur.read_u8();
    let lanes = parse_sequence(cur);
    let lines = lanes.full.line_nodes();
    if lines.len() == 1 {
        lines.into_iter().next().unwrap()
    } else {
        MathNode::Group(lines)
    }
}

fn parse_matrix(cur: &mut Cursor8) -> MathNode {
    let rows = cur.read_u8().unwrap_or(0) as usize;
    let cols = cur.read_u8().unwrap_or(0) as usize;
    for _ in 0..cols {
        cur.read_u8();
    }
    let mut cells = Vec::with_capacity(rows * cols);
    for _ in 0..(rows * cols) {
        let lanes = parse_sequence(cur);
        cells.push(lanes_to_node(&lanes));
    }
    MathNode::Matrix {
        env: MatrixEnv::Plain,
        rows,
        cols,
        cells,
    }
}

fn read_slot(cur: &mut Cursor8) -> Lanes {
    parse_sequence(cur)
}

fn strip_redundant_parens(node: MathNode) -> MathNode {
    if let MathNode::Group(children) = &node {
        if let (Some(MathNode::Char(first)), Some(MathNode::Char(last))) =
            (children.first(), children.last())
        {
            if first.trim() == "(" && last.trim() == ")" && children.len() > 2 {
                return MathNode::group(children[1..children.len() - 1].to_vec());
            }
        }
    }
    node
}

fn collect_fence_chars(lanes: &Lanes) -> (char, char) {
    let mut found = Vec::new();
    for lane in [&lanes.full, &lanes.sub, &lanes.sym] {
        for line in &lane.lines {
            for node in line {
                if let MathNode::Char(s) = node {
                    if let Some(c) = s.trim().chars().next() {
                        if FENCE_CHARS.contains(&c) {
                            found.push(c);
                        }
                    }
                }
            }
        }
    }
    let open = found.first().copied().unwrap_or('(');
    let close = found.last().copied().unwrap_or(')');
    (open, close)
}

fn matrix_env_for_fence(open: char) -> MatrixEnv {
    match open {
        '[' => MatrixEnv::Bracket,
        '{' => MatrixEnv::Brace,
        '|' => MatrixEnv::Bar,
        _ => MatrixEnv::Paren,
    }
}

/// TMPL selector 0..9: delimited group, or a matrix if the sole content
/// slot holds a perfect-square number of bare lines.
fn translate_delimited_or_matrix(slot: &Lanes) -> MathNode {
    let lines = &slot.full.lines;
    if lines.len() > 1 {
        #[allow(clippy::cast_precision_loss, clippy::cast_sign_loss, clippy::cast_possible_truncation)]
        let n = lines.len();
        let side_f = (n as f64).sqrt();
        if side_f.fract().abs() < f64::EPSILON && (side_f as usize) * (side_f as usize) == n && n > 1 {
            let side = side_f as usize;
            let cells: Vec<MathNode> = lines.iter().map(|atoms| MathNode::group(atoms.clone())).collect();
            let (open, _) = collect_fence_chars(slot);
            return MathNode::Matrix {
                env: matrix_env_for_fence(open),
                rows: side,
                cols: side,
                cells,
            };
        }
    }
    let (open, close) = collect_fence_chars(slot);
    let inner = slot.full.flat_node();
    MathNode::Delim(open, close, Box::new(inner))
}

fn default_nary_op(selector: u8) -> &'static str {
    match selector {
        15 | 24 | 21 => "\\int",
        16 | 22 => "\\sum",
        17 => "\\prod",
        18 => "\\coprod",
        19 => "\\bigcup",
        20 => "\\bigcap",
        _ => "\\sum",
    }
}

fn translate_nary(selector: u8, slot: &Lanes) -> MathNode {
    let op = slot
        .sym
        .first_char()
        .map_or_else(|| default_nary_op(selector).to_string(), |c| tables::nary_symbol_for(c).to_string());
    let body = slot.full.flat_node();
    let sub_lines = slot.sub.line_nodes();
    let lower = sub_lines.first().cloned().map(Box::new);
    let upper = sub_lines.get(1).cloned().map(Box::new);
    MathNode::Nary {
        op,
        lower,
        upper,
        body: Box::new(body),
    }
}

/// Parse one TMPL record and return the node it builds. Where the selector
/// leaves a choice open (e.g. sub/sup lane assignment for 27/28/29) we use
/// the `sub`/`sub2` lane pair consistently as (subscript, superscript).
fn parse_tmpl(cur: &mut Cursor8) -> MathNode {
    let Some(selector) = cur.read_u8() else {
        return MathNode::char("");
    };
    let Some(variation) = cur.read_u8() else {
        return MathNode::char("");
    };
    if variation & 0x80 != 0 {
        cur.read_u8(); // second variation byte
    }

    match selector {
        0..=9 => {
            let slot = read_slot(cur);
            translate_delimited_or_matrix(&slot)
        }
        10 | 13 => {
            let slot = read_slot(cur);
            let radicand = strip_redundant_parens(slot.full.flat_node());
            let index = if slot.sub.is_empty() {
                None
            } else {
                Some(Box::new(slot.sub.flat_node()))
            };
            MathNode::Root(index, Box::new(radicand))
        }
        11 => {
            let slot0 = read_slot(cur);
            if slot0.sub.is_empty() {
                let slot1 = read_slot(cur);
                MathNode::Frac(Box::new(slot0.full.flat_node()), Box::new(slot1.full.flat_node()))
            } else {
                MathNode::Frac(Box::new(slot0.full.flat_node()), Box::new(slot0.sub.flat_node()))
            }
        }
        15..=22 | 24 => {
            let slot = read_slot(cur);
            translate_nary(selector, &slot)
        }
        23 => {
            let slot = read_slot(cur);
            MathNode::Sub(Box::new(slot.full.flat_node()), Box::new(slot.sub.flat_node()))
        }
        27 => {
            let slot = read_slot(cur);
            MathNode::Sub(Box::new(slot.full.flat_node()), Box::new(slot.sub.flat_node()))
        }
        28 => {
            let slot = read_slot(cur);
            MathNode::Sup(Box::new(slot.full.flat_node()), Box::new(slot.sub2.flat_node()))
        }
        29 => {
            let slot = read_slot(cur);
            MathNode::SubSup(
                Box::new(slot.full.flat_node()),
                Box::new(slot.sub.flat_node()),
                Box::new(slot.sub2.flat_node()),
            )
        }
        31 => {
            let slot = read_slot(cur);
            MathNode::Accent(AccentKind::Vec, Box::new(slot.full.flat_node()))
        }
        32 => {
            let slot = read_slot(cur);
            MathNode::Accent(AccentKind::Tilde, Box::new(slot.full.flat_node()))
        }
        33 => {
            let slot = read_slot(cur);
            MathNode::Accent(AccentKind::Hat, Box::new(slot.full.flat_node()))
        }
        34 => {
            // Frown accent has no dedicated AST variant; render via the
            // closest primitive (overline) the shared renderer supports.
            let slot = read_slot(cur);
            MathNode::Bar(BarKind::Over, Box::new(slot.full.flat_node()))
        }
        25 | 36 => {
            let slot = read_slot(cur);
            MathNode::Bar(BarKind::Over, Box::new(slot.full.flat_node()))
        }
        26 | 37 => {
            let slot = read_slot(cur);
            MathNode::Bar(BarKind::Cancel, Box::new(slot.full.flat_node()))
        }
        12 => {
            let slot = read_slot(cur);
            MathNode::Bar(BarKind::Under, Box::new(slot.full.flat_node()))
        }
        _ => {
            let slot = read_slot(cur);
            slot.full.flat_node()
        }
    }
}

/// Final rendering pass: collapse whitespace and add
/// a thin space before differential letters preceded by a non-backslash.
#[must_use]
pub fn final_cleanup(s: &str) -> String {
    let collapsed: String = s.split_whitespace().collect::<Vec<_>>().join(" ");
    let mut out = String::with_capacity(collapsed.len());
    let chars: Vec<char> = collapsed.chars().collect();
    let mut i = 0;
    while i < chars.len() {
        let c = chars[i];
        if (c == 'd') && i + 1 < chars.len() && matches!(chars[i + 1], 'x' | 't' | 'y' | 's') {
            let prev_is_backslash = i > 0 && chars[i - 1] == '\\';
            if !prev_is_backslash {
                out.push_str("\\,");
            }
        }
        out.push(c);
        i += 1;
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn char_record(out: &mut Vec<u8>, typeface_biased: u8, code: u16) {
        out.push(TAG_CHAR);
        out.push(typeface_biased);
        out.extend_from_slice(&code.to_le_bytes());
    }

    fn stream_header(out: &mut Vec<u8>) {
        out.extend_from_slice(&[3, 0, 0, 0, 0]); // version, platform, product, pver, subver
    }

    #[test]
    fn decodes_plain_character_run() {
        let mut s = Vec::new();
        stream_header(&mut s);
        char_record(&mut s, 128 + 1, u16::from(b'x')); // typeface=1 -> Variable passthrough
        let node = decode(&s).unwrap();
        assert_eq!(crate::render::render(&node), "x");
    }

    #[test]
    fn decodes_fraction_with_two_slots() {
        let mut s = Vec::new();
        stream_header(&mut s);
        s.push(TAG_TMPL);
        s.push(11); // fraction selector
        s.push(0); // variation, no continuation
        // slot 0: numerator "a", terminated by END
        char_record(&mut s, 128 + 1, u16::from(b'a'));
        s.push(TAG_END);
        // slot 1: denominator "b", terminated by END
        char_record(&mut s, 128 + 1, u16::from(b'b'));
        s.push(TAG_END);

        let node = decode(&s).unwrap();
        let rendered = crate::render::render(&node);
        assert_eq!(rendered, "\\frac{a}{b}");
        assert!(crate::render::is_balanced(&rendered));
    }

    #[test]
    fn decodes_nary_sum_with_limits() {
        let mut s = Vec::new();
        stream_header(&mut s);
        s.push(TAG_TMPL);
        s.push(16); // sum
        s.push(0);
        // slot: full lane = "i", sub lane = two lines "i=1" then "n", sym lane operator char
        char_record(&mut s, 128 + 1, u16::from(b'i'));
        s.push(TAG_SIZE_SUB);
        char_record(&mut s, 128 + 1, u16::from('1'));
        s.push(TAG_LINE);
        char_record(&mut s, 128 + 1, u16::from('n'));
        s.push(TAG_END);

        let node = decode(&s).unwrap();
        let rendered = crate::render::render(&node);
        assert!(rendered.starts_with("\\sum_{"));
        assert!(crate::render::is_balanced(&rendered));
    }

    #[test]
    fn decodes_matrix_record() {
        let mut s = Vec::new();
        stream_header(&mut s);
        s.push(TAG_MATRIX);
        s.push(2); // rows
        s.push(2); // cols
        s.push(0); // col 0 alignment
        s.push(0); // col 1 alignment
        for ch in [b'1', b'0', b'0', b'1'] {
            char_record(&mut s, 128 + 1, u16::from(ch));
            s.push(TAG_END);
        }
        let node = decode(&s).unwrap();
        let rendered = crate::render::render(&node);
        assert!(rendered.starts_with("\\begin{matrix}"));
        assert!(crate::render::is_balanced(&rendered));
    }

    #[test]
    fn final_cleanup_inserts_thin_space_before_dx() {
        let out = final_cleanup("\\int f(x)dx");
        assert!(out.contains("\\,dx"));
    }

    #[test]
    fn final_cleanup_skips_thin_space_after_backslash() {
        // \delta should not get a spurious \, inserted before its "d".
        let out = final_cleanup("\\delta x");
        assert!(!out.contains("\\,"));
    }

    #[test]
    fn extract_equation_native_rejects_non_compound_file() {
        let err = extract_equation_native(b"not an ole file").unwrap_err();
        assert!(err.contains("not an OLE compound file"));
    }
}
