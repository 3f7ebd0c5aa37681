//! Atom feed/entry mapping into the canonical schema.
//!
//! Field reference: https://validator.w3.org/feed/docs/atom.html

use std::collections::BTreeMap;

use super::date::to_iso_date_string;
use super::description::build_description;
use super::link::{purify_url, resolve_link};
use super::{collect_extras, first_non_empty, text_of, unique_keys, Entry, Feed};
use crate::config::ReaderConfig;
use crate::tree::{all_matches, first_match, keys_of, NavigationError, Node};

const STANDARD_FEED_KEYS: [&str; 8] = [
    "id",
    "title",
    "link",
    "subtitle",
    "generator",
    "language",
    "updated",
    "entry",
];

const STANDARD_ENTRY_KEYS: [&str; 8] = [
    "id",
    "title",
    "updated",
    "published",
    "link",
    "summary",
    "content",
    "encoded",
];

pub(super) fn transform_feed(tree: &Node, options: &ReaderConfig) -> Result<Feed, NavigationError> {
    let feed = first_match(Some(tree), "feed")?;
    let keys = unique_keys(keys_of(feed)?);

    let updated = text_of(first_match(feed, "updated")?);
    let entries = all_matches(feed, "entry")?;

    let entries = entries
        .iter()
        .map(|entry| transform_entry(entry, options))
        .collect::<Result<Vec<_>, _>>()?;

    let extras = if options.include_full_content {
        collect_extras(feed, &keys, &STANDARD_FEED_KEYS)?
    } else {
        BTreeMap::new()
    };

    Ok(Feed {
        id: Some(text_of(first_match(feed, "id")?)),
        title: text_of(first_match(feed, "title")?),
        link: purify_url(resolve_link(first_match(feed, "link")?, "").as_deref()),
        description: text_of(first_match(feed, "subtitle")?),
        generator: text_of(first_match(feed, "generator")?),
        language: text_of(first_match(feed, "language")?),
        published: to_iso_date_string(&updated),
        entries,
        extras,
    })
}

fn transform_entry(entry: &Node, options: &ReaderConfig) -> Result<Entry, NavigationError> {
    let entry = Some(entry);
    let keys = unique_keys(keys_of(entry)?);

    let title = text_of(first_match(entry, "title")?);
    let link_node = first_match(entry, "link")?;
    let summary = text_of(first_match(entry, "summary")?);
    let updated = text_of(first_match(entry, "updated")?);
    let published = text_of(first_match(entry, "published")?);
    let id = text_of(first_match(entry, "id")?);
    let content = text_of(first_match(entry, "content")?);
    let encoded = text_of(first_match(entry, "encoded")?);

    let candidate = first_non_empty(&[&encoded, &content, &summary]);
    let pub_date = first_non_empty(&[&updated, &published]);
    let published = if options.convert_pubdate_to_iso {
        to_iso_date_string(pub_date)
    } else {
        pub_date.to_string()
    };

    let (full_content, extras) = if options.include_full_content {
        (
            Some(candidate.to_string()),
            collect_extras(entry, &keys, &STANDARD_ENTRY_KEYS)?,
        )
    } else {
        (None, BTreeMap::new())
    };

    Ok(Entry {
        title,
        link: purify_url(resolve_link(link_node, &id).as_deref()),
        published,
        description: build_description(candidate, options.description_max_len),
        guid: None,
        content: full_content,
        extras,
    })
}
