//! Generic ordered tree and the navigation primitives built on top of it.
//!
//! The XML reader produces a deliberately loose shape: an element is a map
//! from its tag name to a list of children, attributes ride along under the
//! [`ATTR_KEY`] marker, and text content appears as a map carrying one of the
//! [`TEXT_KEYS`]. Repeated siblings are plain lists. The navigator functions
//! here are the only way the transformers look things up in that shape, so
//! all of the "is this a list of wrappers or a single mapping?" probing lives
//! in one place.

use thiserror::Error;

pub mod xml;

/// Marker key under which an element's attribute map is stored.
pub const ATTR_KEY: &str = ":@";

/// Prefix applied to attribute names inside the attribute map.
pub const ATTR_PREFIX: &str = "@_";

/// Keys that mark a mapping as plain text content rather than an element.
pub const TEXT_KEYS: [&str; 4] = ["_text", "#text", "_cdata", "$t"];

/// Navigation was attempted without a node or without a key.
///
/// This is a contract violation by the caller (a required intermediate
/// target was absent), not a "key not found" condition — lookups that find
/// nothing return `None`/empty instead.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum NavigationError {
    #[error("failed to navigate: no node given")]
    MissingNode,
    #[error("failed to navigate: no key given")]
    MissingKey,
}

/// A loosely-typed tree node.
///
/// `Map` keeps its entries in document order; both `keys_of` and the
/// full-content extras enumeration depend on that order being preserved.
#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    Text(String),
    Map(Vec<(String, Node)>),
    List(Vec<Node>),
}

impl Node {
    pub fn text(value: impl Into<String>) -> Self {
        Node::Text(value.into())
    }

    /// Direct lookup in a `Map`; `None` for other variants.
    pub fn get(&self, key: &str) -> Option<&Node> {
        match self {
            Node::Map(pairs) => pairs.iter().find(|(k, _)| k == key).map(|(_, v)| v),
            _ => None,
        }
    }

    /// Whether a `Map` directly carries `key`.
    pub fn has(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    /// First key of a `Map`, in document order.
    pub fn first_key(&self) -> Option<&str> {
        match self {
            Node::Map(pairs) => pairs.first().map(|(k, _)| k.as_str()),
            _ => None,
        }
    }

    pub fn is_empty_list(&self) -> bool {
        matches!(self, Node::List(children) if children.is_empty())
    }
}

impl From<&str> for Node {
    fn from(value: &str) -> Self {
        Node::Text(value.to_string())
    }
}

impl From<String> for Node {
    fn from(value: String) -> Self {
        Node::Text(value)
    }
}

/// Returns the value under `key` from the first list element carrying `key`,
/// or the direct lookup for a plain mapping.
///
/// If the matched value is itself an empty list, the containing element is
/// returned instead so that attribute context survives for leaf-like
/// containers such as `<link href="…"/>`.
///
/// A `None` node or empty key is a [`NavigationError`]; a key that simply
/// matches nothing is `Ok(None)`.
pub fn first_match<'a>(
    node: Option<&'a Node>,
    key: &str,
) -> Result<Option<&'a Node>, NavigationError> {
    let node = node.ok_or(NavigationError::MissingNode)?;
    if key.is_empty() {
        return Err(NavigationError::MissingKey);
    }
    match node {
        Node::List(elements) => Ok(elements.iter().find_map(|element| {
            let found = element.get(key)?;
            Some(if found.is_empty_list() { element } else { found })
        })),
        other => Ok(other.get(key)),
    }
}

/// Every match for `key` in list order, applying the same
/// empty-list-value rule as [`first_match`] per element.
///
/// A plain mapping yields its single value; no match yields an empty
/// vector, never an error.
pub fn all_matches<'a>(
    node: Option<&'a Node>,
    key: &str,
) -> Result<Vec<&'a Node>, NavigationError> {
    let node = node.ok_or(NavigationError::MissingNode)?;
    if key.is_empty() {
        return Err(NavigationError::MissingKey);
    }
    match node {
        Node::List(elements) => Ok(elements
            .iter()
            .filter_map(|element| {
                let found = element.get(key)?;
                Some(if found.is_empty_list() { element } else { found })
            })
            .collect()),
        other => Ok(other.get(key).into_iter().collect()),
    }
}

/// For a list, the first key of each element (one key per element, in
/// element order); for a mapping, all of its keys.
pub fn keys_of(node: Option<&Node>) -> Result<Vec<&str>, NavigationError> {
    let node = node.ok_or(NavigationError::MissingNode)?;
    match node {
        Node::List(elements) => Ok(elements.iter().filter_map(Node::first_key).collect()),
        Node::Map(pairs) => Ok(pairs.iter().map(|(k, _)| k.as_str()).collect()),
        Node::Text(_) => Ok(Vec::new()),
    }
}

/// True if a mapping carries `key`, or if any element of a list does.
pub fn has_key(node: &Node, key: &str) -> bool {
    match node {
        Node::List(elements) => elements.iter().any(|element| element.has(key)),
        other => other.has(key),
    }
}
