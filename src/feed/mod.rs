//! Feed normalization: one canonical schema regardless of source dialect.
//!
//! The dispatcher classifies a parsed tree as RSS or Atom and hands it to
//! the matching transformer; the transformers walk the tree through the
//! navigator and the text/link/date resolvers. Per-field extraction is
//! total — missing source data degrades to empty strings — while
//! structural problems (neither dialect matches, a required navigation
//! target is absent) fail the whole call.

mod atom;
mod date;
mod description;
mod link;
mod rss;
mod text;

pub use date::to_iso_date_string;
pub use description::build_description;
pub use link::{is_valid_url, purify_url, resolve_link};
pub use text::{resolve_text, Resolved};

use std::collections::BTreeMap;

use serde::Serialize;
use thiserror::Error;

use crate::config::{ParserConfig, ReaderConfig};
use crate::tree::xml::parse_xml;
use crate::tree::{
    all_matches, first_match, has_key, keys_of, NavigationError, Node, ATTR_KEY, TEXT_KEYS,
};

/// Errors surfaced by [`normalize`] and [`parse_and_normalize`].
///
/// These four kinds are the entire failure surface of the module; no
/// internal error type leaks past this boundary unwrapped.
#[derive(Debug, Error)]
pub enum NormalizeError {
    /// A required navigation target was absent (e.g. no `channel` under
    /// `rss`). Fatal to the current transform.
    #[error(transparent)]
    Navigation(#[from] NavigationError),

    /// The tree matches neither the RSS nor the Atom shape.
    #[error("unrecognized feed format in source: {0}")]
    UnrecognizedFormat(String),

    /// The source text is not well-formed XML.
    #[error("source is not well-formed XML: {0}")]
    MalformedSource(String),

    /// The source text is empty or whitespace-only.
    #[error("source is empty")]
    EmptySource,
}

/// Canonical feed, independent of the source dialect.
///
/// Immutable once constructed; holds no references into the source tree.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Feed {
    /// Feed identifier (Atom only).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub title: String,
    /// Canonical absolute URL, or `None` when no valid link resolves.
    pub link: Option<String>,
    pub description: String,
    pub generator: String,
    pub language: String,
    /// Feed-level timestamp as ISO-8601, or empty when absent/unparseable.
    pub published: String,
    /// Entries in source document order.
    pub entries: Vec<Entry>,
    /// Non-standard top-level fields, reduced to text. Populated only in
    /// full-content mode.
    #[serde(flatten)]
    pub extras: BTreeMap<String, String>,
}

/// Canonical entry.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Entry {
    pub title: String,
    pub link: Option<String>,
    /// ISO-8601 or raw source text, depending on configuration; empty when
    /// the source carries no timestamp.
    pub published: String,
    /// Tag-stripped, length-bounded summary.
    pub description: String,
    /// Item identifier (RSS only; may be empty).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub guid: Option<String>,
    /// Unabridged raw body. Populated only in full-content mode.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    /// Non-standard per-item fields, reduced to text. Populated only in
    /// full-content mode.
    #[serde(flatten)]
    pub extras: BTreeMap<String, String>,
}

/// True iff the tree exposes a top-level `rss` element with a `channel`
/// child.
pub fn is_rss(tree: &Node) -> bool {
    matches!(first_match(Some(tree), "rss"), Ok(Some(rss)) if has_key(rss, "channel"))
}

/// True iff the tree exposes a top-level `feed` element with at least one
/// `entry` child.
pub fn is_atom(tree: &Node) -> bool {
    matches!(first_match(Some(tree), "feed"), Ok(Some(feed)) if has_key(feed, "entry"))
}

/// Normalizes a parsed tree into the canonical schema.
pub fn normalize(tree: &Node, options: &ReaderConfig) -> Result<Feed, NormalizeError> {
    match (is_rss(tree), is_atom(tree)) {
        (true, false) => Ok(rss::transform_feed(tree, options)?),
        (false, true) => Ok(atom::transform_feed(tree, options)?),
        // Mutually exclusive in well-formed input; both or neither is a
        // structural failure.
        _ => Err(NormalizeError::UnrecognizedFormat(describe(tree))),
    }
}

/// Validates, parses, and normalizes raw XML text in one call.
pub fn parse_and_normalize(
    text: &str,
    parser: &ParserConfig,
    reader: &ReaderConfig,
) -> Result<Feed, NormalizeError> {
    if text.trim().is_empty() {
        return Err(NormalizeError::EmptySource);
    }
    let tree =
        parse_xml(text, parser).map_err(|e| NormalizeError::MalformedSource(e.to_string()))?;
    normalize(&tree, reader)
}

fn describe(tree: &Node) -> String {
    match keys_of(Some(tree)) {
        Ok(keys) if !keys.is_empty() => keys.join(", "),
        _ => "empty document".to_string(),
    }
}

/// Resolves an optional navigation result to text; absent input is the
/// empty string.
pub(crate) fn text_of(node: Option<&Node>) -> String {
    node.map(|n| resolve_text(n).into_text()).unwrap_or_default()
}

/// First non-empty candidate, or the empty string.
pub(crate) fn first_non_empty<'a>(candidates: &[&'a str]) -> &'a str {
    candidates
        .iter()
        .copied()
        .find(|value| !value.is_empty())
        .unwrap_or_default()
}

/// Deduplicates keys preserving first-occurrence order.
pub(crate) fn unique_keys(keys: Vec<&str>) -> Vec<&str> {
    let mut seen: Vec<&str> = Vec::new();
    for key in keys {
        if !seen.contains(&key) {
            seen.push(key);
        }
    }
    seen
}

/// Copies every discovered key not in the dialect's handled set into an
/// extras map, resolving each across all of its matches.
///
/// Reserved tree markers (text keys, the attribute marker) never become
/// extras. Matches that are child lists are spliced in one level so that
/// repeated tags deduplicate the same way single ones do.
pub(crate) fn collect_extras(
    node: Option<&Node>,
    keys: &[&str],
    standard: &[&str],
) -> Result<BTreeMap<String, String>, NavigationError> {
    let mut extras = BTreeMap::new();
    for key in keys {
        if standard.contains(key) || *key == ATTR_KEY || TEXT_KEYS.contains(key) {
            continue;
        }
        let mut elements: Vec<Node> = Vec::new();
        for matched in all_matches(node, key)? {
            match matched {
                Node::List(children) => elements.extend(children.iter().cloned()),
                other => elements.push(other.clone()),
            }
        }
        let value = resolve_text(&Node::List(elements)).into_text();
        extras.insert((*key).to_string(), value);
    }
    Ok(extras)
}
