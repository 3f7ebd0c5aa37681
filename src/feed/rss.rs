//! RSS 2.0 channel/item mapping into the canonical schema.
//!
//! Field reference: https://www.rssboard.org/rss-specification

use std::collections::BTreeMap;

use super::date::to_iso_date_string;
use super::description::build_description;
use super::link::{purify_url, resolve_link};
use super::{collect_extras, first_non_empty, text_of, unique_keys, Entry, Feed};
use crate::config::ReaderConfig;
use crate::tree::{all_matches, first_match, keys_of, NavigationError, Node};

/// Channel-level keys already mapped to canonical fields; everything else
/// is passthrough material in full-content mode.
const STANDARD_CHANNEL_KEYS: [&str; 7] = [
    "title",
    "link",
    "description",
    "generator",
    "language",
    "lastBuildDate",
    "item",
];

const STANDARD_ITEM_KEYS: [&str; 7] = [
    "title",
    "link",
    "description",
    "pubDate",
    "guid",
    "content",
    "encoded",
];

pub(super) fn transform_feed(tree: &Node, options: &ReaderConfig) -> Result<Feed, NavigationError> {
    let channel = first_match(first_match(Some(tree), "rss")?, "channel")?;
    let keys = unique_keys(keys_of(channel)?);

    let last_build_date = text_of(first_match(channel, "lastBuildDate")?);
    let items = all_matches(channel, "item")?;

    let entries = items
        .iter()
        .map(|item| transform_item(item, options))
        .collect::<Result<Vec<_>, _>>()?;

    let extras = if options.include_full_content {
        collect_extras(channel, &keys, &STANDARD_CHANNEL_KEYS)?
    } else {
        BTreeMap::new()
    };

    Ok(Feed {
        id: None,
        title: text_of(first_match(channel, "title")?),
        link: purify_url(resolve_link(first_match(channel, "link")?, "").as_deref()),
        description: text_of(first_match(channel, "description")?),
        generator: text_of(first_match(channel, "generator")?),
        language: text_of(first_match(channel, "language")?),
        published: to_iso_date_string(&last_build_date),
        entries,
        extras,
    })
}

fn transform_item(item: &Node, options: &ReaderConfig) -> Result<Entry, NavigationError> {
    let item = Some(item);
    let keys = unique_keys(keys_of(item)?);

    let title = text_of(first_match(item, "title")?);
    let link_node = first_match(item, "link")?;
    let description = text_of(first_match(item, "description")?);
    let pub_date = text_of(first_match(item, "pubDate")?);
    let guid = text_of(first_match(item, "guid")?);
    let content = text_of(first_match(item, "content")?);
    let encoded = text_of(first_match(item, "encoded")?);

    let candidate = first_non_empty(&[&encoded, &content, &description]);
    let published = if options.convert_pubdate_to_iso {
        to_iso_date_string(&pub_date)
    } else {
        pub_date
    };

    let (full_content, extras) = if options.include_full_content {
        (
            Some(candidate.to_string()),
            collect_extras(item, &keys, &STANDARD_ITEM_KEYS)?,
        )
    } else {
        (None, BTreeMap::new())
    };

    Ok(Entry {
        title,
        link: purify_url(resolve_link(link_node, &guid).as_deref()),
        published,
        description: build_description(candidate, options.description_max_len),
        guid: Some(guid),
        content: full_content,
        extras,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ParserConfig;
    use crate::tree::xml::parse_xml;

    const MINIMAL: &str = r#"<rss version="2.0"><channel>
        <title>Example</title>
        <link>http://example.com/</link>
        <item>
            <title>First</title>
            <description>A description</description>
        </item>
    </channel></rss>"#;

    fn transform(source: &str, options: &ReaderConfig) -> Feed {
        let tree = parse_xml(source, &ParserConfig::default()).unwrap();
        transform_feed(&tree, options).unwrap()
    }

    #[test]
    fn test_minimal_channel() {
        let feed = transform(MINIMAL, &ReaderConfig::default());
        assert_eq!(feed.title, "Example");
        assert_eq!(feed.link.as_deref(), Some("http://example.com/"));
        assert_eq!(feed.entries.len(), 1);
    }

    #[test]
    fn test_item_without_pubdate_degrades_to_empty() {
        let feed = transform(MINIMAL, &ReaderConfig::default());
        let entry = &feed.entries[0];
        assert_eq!(entry.published, "");
        assert!(!entry.description.is_empty());
        assert_eq!(entry.guid.as_deref(), Some(""));
    }

    #[test]
    fn test_missing_channel_is_navigation_error() {
        let tree = parse_xml(r#"<rss version="2.0"/>"#, &ParserConfig::default()).unwrap();
        assert!(transform_feed(&tree, &ReaderConfig::default()).is_err());
    }

    #[test]
    fn test_guid_serves_as_link_fallback() {
        let source = r#"<rss><channel><title>t</title><item>
            <guid>http://example.com/posts/1</guid>
            <link>not a url</link>
        </item></channel></rss>"#;
        let feed = transform(source, &ReaderConfig::default());
        assert_eq!(
            feed.entries[0].link.as_deref(),
            Some("http://example.com/posts/1")
        );
    }

    #[test]
    fn test_encoded_content_wins_over_description() {
        let source = r#"<rss><channel><title>t</title><item>
            <description>short</description>
            <content:encoded><![CDATA[<p>full body</p>]]></content:encoded>
        </item></channel></rss>"#;
        let options = ReaderConfig {
            include_full_content: true,
            ..ReaderConfig::default()
        };
        let feed = transform(source, &options);
        let entry = &feed.entries[0];
        assert_eq!(entry.content.as_deref(), Some("<p>full body</p>"));
        assert_eq!(entry.description, "full body");
    }
}
