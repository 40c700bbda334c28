//! A tiny, namespace-agnostic XML element tree, used as an intermediate
//! representation between raw OMML bytes and the math AST.
//!
//! The structured OMML translator dispatches on
//! *local* element names (`f`, `rad`, `sSup`, …) regardless of the `m:`/`w:`
//! prefix bound to them, so parsing once into this shape keeps the
//! dispatch code in `omml.rs` free of namespace bookkeeping.

use quick_xml::events::Event;
use quick_xml::Reader;
use std::collections::HashMap;

#[derive(Debug, Clone, Default)]
pub struct XmlNode {
    /// Local (unprefixed) element name, e.g. `"f"` for `<m:f>`.
    pub tag: String,
    pub attrs: HashMap<String, String>,
    pub children: Vec<XmlNode>,
    /// Concatenated direct text content (from `m:t`/`w:t` descendants, in
    /// document order, ignoring intervening structural elements).
    pub text: String,
}

impl XmlNode {
    #[must_use]
    pub fn child(&self, local_name: &str) -> Option<&XmlNode> {
        self.children.iter().find(|c| c.tag == local_name)
    }

    #[must_use]
    pub fn children_named<'a>(&'a self, local_name: &'a str) -> impl Iterator<Item = &'a XmlNode> {
        self.children.iter().filter(move |c| c.tag == local_name)
    }

    /// All text in this subtree, depth-first, ignoring element boundaries —
    /// used by the OMML last-resort strategy.
    #[must_use]
    pub fn all_text(&self) -> String {
        let mut out = self.text.clone();
        for c in &self.children {
            out.push_str(&c.all_text());
        }
        out
    }

    #[must_use]
    pub fn attr(&self, key: &str) -> Option<&str> {
        self.attrs.get(key).map(String::as_str)
    }
}

fn local_name(qualified: &[u8]) -> String {
    let s = String::from_utf8_lossy(qualified);
    s.rsplit(':').next().unwrap_or(&s).to_string()
}

/// Parse a single well-formed element (and its subtree) out of an XML
/// fragment. Returns `None` if the fragment has no root element or is
/// malformed enough that quick-xml errors before a root closes.
#[must_use]
pub fn parse_fragment(xml: &str) -> Option<XmlNode> {
    let mut reader = Reader::from_str(xml);
    reader.trim_text(true);
    let mut stack: Vec<XmlNode> = Vec::new();
    let mut root: Option<XmlNode> = None;
    let mut buf = Vec::new();

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(e)) => {
                let mut node = XmlNode {
                    tag: local_name(e.name().as_ref()),
                    ..Default::default()
                };
                for attr in e.attributes().flatten() {
                    let key = local_name(attr.key.as_ref());
                    let val = String::from_utf8_lossy(&attr.value).to_string();
                    node.attrs.insert(key, val);
                }
                stack.push(node);
            }
            Ok(Event::Empty(e)) => {
                let mut node = XmlNode {
                    tag: local_name(e.name().as_ref()),
                    ..Default::default()
                };
                for attr in e.attributes().flatten() {
                    let key = local_name(attr.key.as_ref());
                    let val = String::from_utf8_lossy(&attr.value).to_string();
                    node.attrs.insert(key, val);
                }
                if let Some(parent) = stack.last_mut() {
                    parent.children.push(node);
                } else {
                    root = Some(node);
                    break;
                }
            }
            Ok(Event::Text(t)) => {
                if let Ok(text) = t.unescape() {
                    if let Some(top) = stack.last_mut() {
                        top.text.push_str(&text);
                    }
                }
            }
            Ok(Event::End(_)) => {
                if let Some(node) = stack.pop() {
                    if let Some(parent) = stack.last_mut() {
                        parent.children.push(node);
                    } else {
                        root = Some(node);
                        break;
                    }
                }
            }
            Ok(Event::Eof) => break,
            Err(_) => break,
            _ => {}
        }
        buf.clear();
    }
    root
}
