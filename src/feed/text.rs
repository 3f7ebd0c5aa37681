//! Reduces an ambiguous tree node to text.
//!
//! Most shapes reduce cleanly to a single string, but two do not: a list
//! mixing textual and non-textual siblings can resolve to several distinct
//! fragments, and a structurally irregular list falls back to a re-parsed
//! tree. Both escape hatches surface in [`Resolved`] instead of being
//! silently flattened, because the extras passthrough downstream relies on
//! seeing that ambiguity.

use std::borrow::Cow;

use quick_xml::escape::unescape;

use crate::config::ParserConfig;
use crate::tree::xml::{parse_xml, write_xml};
use crate::tree::{Node, ATTR_KEY, TEXT_KEYS};

/// Tag names whose presence in a list marks fragmented mixed-content HTML
/// that should be reassembled into a markup string rather than resolved
/// piecewise.
const HTML_CONTAINER_TAGS: [&str; 30] = [
    "a", "b", "blockquote", "br", "code", "div", "em", "figcaption", "figure", "h1", "h2", "h3",
    "h4", "h5", "h6", "hr", "i", "img", "li", "ol", "p", "pre", "small", "span", "strong", "sub",
    "sup", "table", "u", "ul",
];

/// Re-serialize/re-parse paths stop recursing past this depth and degrade
/// to an empty string instead.
const MAX_RESOLVE_DEPTH: usize = 8;

/// Outcome of text resolution.
///
/// Callers that only want a string use [`Resolved::into_text`]; callers
/// that care about ambiguous mixed content match on the variant.
#[derive(Debug, Clone, PartialEq)]
pub enum Resolved {
    /// A single scalar string (the common case).
    Text(String),
    /// Several distinct fragments from ambiguous mixed content.
    Fragments(Vec<String>),
    /// Best-effort re-parsed structure from an irregular sub-tree.
    Tree(Node),
}

impl Resolved {
    /// Flattens to a plain string: fragments concatenate in order, a
    /// fallback tree re-serializes.
    pub fn into_text(self) -> String {
        match self {
            Resolved::Text(text) => text,
            Resolved::Fragments(parts) => parts.concat(),
            Resolved::Tree(node) => finalize(&write_xml(&node)),
        }
    }
}

/// Reduces `node` to text per the resolution rules, entity-decoding and
/// trimming every scalar result.
pub fn resolve_text(node: &Node) -> Resolved {
    resolve_at(node, 0)
}

fn resolve_at(node: &Node, depth: usize) -> Resolved {
    match node {
        Node::Text(text) => Resolved::Text(finalize(text)),
        Node::Map(_) => Resolved::Text(finalize(&map_text(node, depth))),
        Node::List(elements) => resolve_list(elements, depth),
    }
}

fn resolve_list(elements: &[Node], depth: usize) -> Resolved {
    if elements.is_empty() {
        return Resolved::Text(String::new());
    }

    // Fragmented HTML body: reassemble the markup instead of resolving
    // each piece to bare text.
    if depth < MAX_RESOLVE_DEPTH
        && elements
            .iter()
            .filter_map(Node::first_key)
            .any(|key| HTML_CONTAINER_TAGS.contains(&key))
    {
        return Resolved::Text(finalize(&write_xml(&Node::List(elements.to_vec()))));
    }

    if elements.len() == 1 {
        return resolve_at(&elements[0], depth);
    }

    let textual = elements.iter().filter(|el| is_textual(el)).count();
    if textual == 0 {
        // Structurally irregular: re-serialize and re-parse attribute-aware,
        // handing the caller the best-effort structure.
        if depth >= MAX_RESOLVE_DEPTH {
            return Resolved::Text(String::new());
        }
        let xml = write_xml(&Node::List(elements.to_vec()));
        return match parse_xml(&xml, &ParserConfig::default()) {
            Ok(tree) => Resolved::Tree(tree),
            Err(_) => Resolved::Text(String::new()),
        };
    }

    // Unique non-empty values, first-occurrence order.
    let mut unique: Vec<String> = Vec::new();
    for element in elements {
        let value = resolve_at(element, depth + 1).into_text();
        if !value.is_empty() && !unique.contains(&value) {
            unique.push(value);
        }
    }

    if textual == elements.len() {
        return Resolved::Text(unique.concat());
    }
    match unique.len() {
        0 => Resolved::Text(String::new()),
        1 => Resolved::Text(unique.remove(0)),
        _ => Resolved::Fragments(unique),
    }
}

fn map_text(node: &Node, depth: usize) -> String {
    for key in TEXT_KEYS {
        if let Some(value) = node.get(key) {
            let text = resolve_at(value, depth + 1).into_text();
            if !text.is_empty() {
                return text;
            }
        }
    }
    // A lone attribute can stand in for missing text content
    // (e.g. <media:thumbnail url="…"/>).
    if let Some(Node::Map(attrs)) = node.get(ATTR_KEY) {
        if let [(_, value)] = attrs.as_slice() {
            return resolve_at(value, depth + 1).into_text();
        }
    }
    String::new()
}

fn is_textual(node: &Node) -> bool {
    match node {
        Node::Text(_) => true,
        Node::Map(_) => TEXT_KEYS.iter().any(|key| node.has(key)),
        Node::List(_) => false,
    }
}

fn finalize(raw: &str) -> String {
    let decoded = match unescape(raw) {
        Ok(Cow::Owned(s)) => s,
        Ok(Cow::Borrowed(_)) | Err(_) => raw.to_string(),
    };
    decoded.trim().to_string()
}
