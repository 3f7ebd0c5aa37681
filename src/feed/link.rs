//! Reduces a tree node (or a sibling identifier) to a canonical URL.

use url::Url;

use super::text::resolve_text;
use crate::tree::{Node, ATTR_KEY};

/// Well-formed absolute URL with an http(s) scheme.
pub fn is_valid_url(candidate: &str) -> bool {
    Url::parse(candidate)
        .map(|url| matches!(url.scheme(), "http" | "https"))
        .unwrap_or(false)
}

/// Resolves `node` to a link.
///
/// Href-style attributes win, whether direct (`href`, `@_href`), nested
/// under an attribute-map marker, or one recursion step into the marker
/// map. A list yields the first element that resolves (feeds exposing
/// alternate/self link variants keep their first link). Anything else is
/// resolved to text and kept only if it is a valid absolute URL, falling
/// back to `fallback_id` when that is one instead.
pub fn resolve_link(node: Option<&Node>, fallback_id: &str) -> Option<String> {
    match node {
        Some(node) => resolve_node(node, fallback_id),
        None => valid_or_none(fallback_id),
    }
}

fn resolve_node(node: &Node, fallback_id: &str) -> Option<String> {
    match node {
        Node::Map(_) => {
            for key in ["href", "@_href"] {
                if let Some(value) = node.get(key) {
                    return Some(resolve_text(value).into_text());
                }
            }
            if let Some(attrs) = node.get("_attributes") {
                if let Some(value) = attrs.get("href") {
                    return Some(resolve_text(value).into_text());
                }
            }
            if let Some(attrs) = node.get(ATTR_KEY) {
                return resolve_node(attrs, fallback_id);
            }
            text_or_fallback(node, fallback_id)
        }
        // First link wins; elements resolve without the fallback. When no
        // element resolves, the list as a whole falls through to the
        // text-or-fallback rule like any other node.
        Node::List(elements) => elements
            .iter()
            .find_map(|el| resolve_node(el, ""))
            .or_else(|| text_or_fallback(node, fallback_id)),
        Node::Text(_) => text_or_fallback(node, fallback_id),
    }
}

fn text_or_fallback(node: &Node, fallback_id: &str) -> Option<String> {
    let text = resolve_text(node).into_text();
    if is_valid_url(&text) {
        return Some(text);
    }
    valid_or_none(fallback_id)
}

fn valid_or_none(candidate: &str) -> Option<String> {
    if is_valid_url(candidate) {
        Some(candidate.to_string())
    } else {
        None
    }
}

/// Normalizes a resolved link: drops fragments and empty queries, and the
/// parser itself strips default ports. `None` for absent or invalid input;
/// never fails.
pub fn purify_url(link: Option<&str>) -> Option<String> {
    let mut url = Url::parse(link?).ok()?;
    if !matches!(url.scheme(), "http" | "https") {
        return None;
    }
    url.set_fragment(None);
    if url.query() == Some("") {
        url.set_query(None);
    }
    Some(url.to_string())
}
